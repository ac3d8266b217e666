//! # Punishment Executor
//!
//! Deferred kicks and bans, at most one pending per participant.
//!
//! Requests come from any thread; execution only happens from
//! [`PunishmentExecutor::execute_due`] on the tick thread. An entry is
//! removed under the lock before the host is called, so an administrative
//! cancel racing the execution either wins (nothing happens) or loses
//! (the punishment already ran), never both.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use warden_shared::ParticipantId;

use crate::check::CheckType;
use crate::config::WardenConfig;
use crate::host::{Host, HostProfile};

/// Severity of a punishment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum PunishmentKind {
    /// Disconnect.
    Kick,
    /// Disconnect and refuse reconnection.
    Ban,
}

/// A scheduled punishment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingPunishment {
    /// Kick or ban.
    pub kind: PunishmentKind,
    /// Check that caused it.
    pub check: CheckType,
    /// Tick at which it runs.
    pub due_tick: u64,
}

/// Messages and delays, swapped as a whole on reload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PunishmentSettings {
    /// Kick reason template.
    pub kick_message: String,
    /// Ticks before a kick runs.
    pub kick_delay: u64,
    /// Ban reason template.
    pub ban_message: String,
    /// Ticks before a ban runs.
    pub ban_delay: u64,
    /// `None` for permanent.
    pub ban_duration: Option<Duration>,
    /// Announce bans.
    pub broadcast: bool,
    /// Announcement template.
    pub broadcast_message: String,
}

impl PunishmentSettings {
    /// Settings from the `[kick]` and `[ban]` sections.
    #[must_use]
    pub fn from_config(config: &WardenConfig) -> Self {
        Self {
            kick_message: config.kick.message.clone(),
            kick_delay: config.kick.delay_ticks,
            ban_message: config.ban.message.clone(),
            ban_delay: config.ban.delay_ticks,
            ban_duration: config.ban_duration(),
            broadcast: config.ban.broadcast,
            broadcast_message: config.ban.broadcast_message.clone(),
        }
    }
}

/// Carries out kick and ban decisions.
#[derive(Debug)]
pub struct PunishmentExecutor {
    pending: Mutex<HashMap<ParticipantId, PendingPunishment>>,
    tick: AtomicU64,
    settings: RwLock<PunishmentSettings>,
}

impl PunishmentExecutor {
    /// Creates an executor with no pending punishments.
    #[must_use]
    pub fn new(settings: PunishmentSettings) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            tick: AtomicU64::new(0),
            settings: RwLock::new(settings),
        }
    }

    /// Replaces messages and delays. Already pending punishments keep their
    /// due tick.
    pub fn set_settings(&self, settings: PunishmentSettings) {
        *self.settings.write() = settings;
    }

    /// Is anything scheduled for `participant`?
    #[must_use]
    pub fn has_pending(&self, participant: ParticipantId) -> bool {
        self.pending.lock().contains_key(&participant)
    }

    /// The scheduled punishment, if any.
    #[must_use]
    pub fn pending(&self, participant: ParticipantId) -> Option<PendingPunishment> {
        self.pending.lock().get(&participant).copied()
    }

    /// Schedules a kick. Returns false if something is already pending.
    pub fn request_kick(&self, participant: ParticipantId, check: CheckType) -> bool {
        let due_tick = self.now() + self.settings.read().kick_delay;
        let mut pending = self.pending.lock();
        if pending.contains_key(&participant) {
            return false;
        }
        pending.insert(
            participant,
            PendingPunishment {
                kind: PunishmentKind::Kick,
                check,
                due_tick,
            },
        );
        tracing::info!(participant = %participant, check = %check, due_tick, "kick scheduled");
        true
    }

    /// Schedules a ban.
    ///
    /// A pending kick is upgraded in place and keeps its due tick. Returns
    /// false if a ban is already pending.
    pub fn request_ban(&self, participant: ParticipantId, check: CheckType) -> bool {
        let due_tick = self.now() + self.settings.read().ban_delay;
        let mut pending = self.pending.lock();
        match pending.get_mut(&participant) {
            Some(existing) if existing.kind == PunishmentKind::Ban => false,
            Some(existing) => {
                existing.kind = PunishmentKind::Ban;
                existing.check = check;
                tracing::info!(participant = %participant, check = %check, "pending kick upgraded to ban");
                true
            }
            None => {
                pending.insert(
                    participant,
                    PendingPunishment {
                        kind: PunishmentKind::Ban,
                        check,
                        due_tick,
                    },
                );
                tracing::info!(participant = %participant, check = %check, due_tick, "ban scheduled");
                true
            }
        }
    }

    /// Removes a scheduled punishment before it runs.
    pub fn cancel_pending(&self, participant: ParticipantId) -> Option<PendingPunishment> {
        let cancelled = self.pending.lock().remove(&participant);
        if let Some(punishment) = cancelled {
            tracing::info!(participant = %participant, kind = ?punishment.kind, "pending punishment cancelled");
        }
        cancelled
    }

    /// Runs everything due at `tick`. Returns what was executed.
    ///
    /// A participant who already left is a no-op: logged, not retried.
    pub fn execute_due(
        &self,
        tick: u64,
        host: &dyn Host,
        profile: &HostProfile,
    ) -> Vec<(ParticipantId, PendingPunishment)> {
        self.tick.store(tick, Ordering::Release);

        let due: Vec<(ParticipantId, PendingPunishment)> = {
            let mut pending = self.pending.lock();
            let ready: Vec<ParticipantId> = pending
                .iter()
                .filter(|(_, punishment)| punishment.due_tick <= tick)
                .map(|(participant, _)| *participant)
                .collect();
            ready
                .into_iter()
                .filter_map(|participant| {
                    pending
                        .remove(&participant)
                        .map(|punishment| (participant, punishment))
                })
                .collect()
        };
        if due.is_empty() {
            return due;
        }

        let settings = self.settings.read().clone();
        for (participant, punishment) in &due {
            self.execute(host, profile, &settings, *participant, punishment);
        }
        due
    }

    fn execute(
        &self,
        host: &dyn Host,
        profile: &HostProfile,
        settings: &PunishmentSettings,
        participant: ParticipantId,
        punishment: &PendingPunishment,
    ) {
        let check = punishment.check.display_name();
        let done = match punishment.kind {
            PunishmentKind::Kick => {
                let reason = settings.kick_message.replace("%check%", check);
                host.kick(participant, &reason)
            }
            PunishmentKind::Ban => {
                let reason = settings.ban_message.replace("%check%", check);
                let duration = settings.ban_duration.filter(|_| profile.temporary_bans);
                let banned = host.ban(participant, &reason, duration);
                if banned && settings.broadcast {
                    let announcement = settings
                        .broadcast_message
                        .replace("%player%", &participant.to_string())
                        .replace("%check%", check);
                    for online in host.online() {
                        host.send_message(online, &announcement);
                    }
                }
                banned
            }
        };

        if done {
            tracing::info!(
                participant = %participant,
                kind = ?punishment.kind,
                check = %punishment.check,
                "punishment executed"
            );
        } else {
            tracing::debug!(
                participant = %participant,
                kind = ?punishment.kind,
                "participant already gone, punishment dropped"
            );
        }
    }

    /// Drops every pending punishment.
    pub fn clear(&self) {
        self.pending.lock().clear();
    }

    fn now(&self) -> u64 {
        self.tick.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostCapabilities;
    use crate::testing::RecordingHost;

    const P: ParticipantId = ParticipantId(4);

    fn settings() -> PunishmentSettings {
        PunishmentSettings::from_config(&WardenConfig::default())
    }

    fn profile(temporary_bans: bool) -> HostProfile {
        HostProfile::negotiate(HostCapabilities {
            revision: 754,
            temporary_bans,
        })
        .unwrap()
    }

    #[test]
    fn test_at_most_one_pending() {
        let executor = PunishmentExecutor::new(settings());
        assert!(executor.request_kick(P, CheckType::Speed));
        assert!(!executor.request_kick(P, CheckType::Reach));
        assert_eq!(executor.pending(P).unwrap().check, CheckType::Speed);
    }

    #[test]
    fn test_ban_upgrades_kick_in_place() {
        let executor = PunishmentExecutor::new(settings());
        executor.request_kick(P, CheckType::Speed);
        let due = executor.pending(P).unwrap().due_tick;

        assert!(executor.request_ban(P, CheckType::KillAura));
        assert!(!executor.request_ban(P, CheckType::KillAura));
        let pending = executor.pending(P).unwrap();
        assert_eq!(pending.kind, PunishmentKind::Ban);
        assert_eq!(pending.due_tick, due);
        assert!(!executor.request_kick(P, CheckType::Speed));
    }

    #[test]
    fn test_execution_is_deferred() {
        let host = RecordingHost::default();
        host.connect(P);
        let executor = PunishmentExecutor::new(settings());
        executor.request_kick(P, CheckType::Flight);

        assert!(executor.execute_due(39, &host, &profile(true)).is_empty());
        assert!(host.kicks().is_empty());

        let executed = executor.execute_due(40, &host, &profile(true));
        assert_eq!(executed.len(), 1);
        assert_eq!(host.kicks(), vec![(P, "Kicked by Warden (Flight)".to_owned())]);
        assert!(!executor.has_pending(P));
    }

    #[test]
    fn test_cancel_before_execution() {
        let host = RecordingHost::default();
        host.connect(P);
        let executor = PunishmentExecutor::new(settings());
        executor.request_ban(P, CheckType::Reach);
        assert!(executor.cancel_pending(P).is_some());
        assert!(executor.cancel_pending(P).is_none());

        executor.execute_due(1_000, &host, &profile(true));
        assert!(host.bans().is_empty());
    }

    #[test]
    fn test_ban_duration_and_broadcast() {
        let host = RecordingHost::default();
        let watcher = ParticipantId(5);
        host.connect(P);
        host.connect(watcher);
        let executor = PunishmentExecutor::new(settings());
        executor.request_ban(P, CheckType::KillAura);
        executor.execute_due(100, &host, &profile(true));

        let bans = host.bans();
        assert_eq!(bans.len(), 1);
        assert_eq!(bans[0].duration, Some(Duration::from_secs(30 * 86_400)));
        assert_eq!(host.messages_for(watcher).len(), 1);
    }

    #[test]
    fn test_permanent_ban_without_host_support() {
        let host = RecordingHost::default();
        host.connect(P);
        let executor = PunishmentExecutor::new(settings());
        executor.request_ban(P, CheckType::KillAura);
        executor.execute_due(100, &host, &profile(false));
        assert_eq!(host.bans()[0].duration, None);
    }

    #[test]
    fn test_disconnected_participant_is_noop() {
        let host = RecordingHost::default();
        let executor = PunishmentExecutor::new(settings());
        executor.request_kick(P, CheckType::Speed);
        let executed = executor.execute_due(40, &host, &profile(true));
        assert_eq!(executed.len(), 1);
        assert!(host.kicks().is_empty());
        assert!(!executor.has_pending(P));
    }
}
