//! # Engine Context
//!
//! Everything a check needs, built once at startup and passed explicitly.
//!
//! ```text
//!            ┌─────────────── Context ───────────────┐
//! events ──► │ sessions   exemptions   violations    │ ──► punishments
//!            │ host  world  clock  scheduler  config │ ──► outbox
//!            └───────────────────────────────────────┘
//! ```

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use parking_lot::RwLock;
use warden_shared::{ParticipantId, PERMISSION_BYPASS, PERMISSION_VIOLATIONS};

use crate::check::{CheckResult, CheckType};
use crate::clock::Clock;
use crate::config::{CheckConfig, WardenConfig};
use crate::environment::Environment;
use crate::error::WardenResult;
use crate::exemption::ExemptionLedger;
use crate::host::{Host, HostProfile, WorldQuery};
use crate::punishment::{PunishmentExecutor, PunishmentSettings};
use crate::scheduler::{Scheduler, TickScheduler};
use crate::session::SessionRegistry;
use crate::violation::{ActionDecision, DecayPolicy, Notification, ViolationLedger};

/// Shared engine state.
pub struct Context {
    /// Live participant sessions.
    pub sessions: SessionRegistry,
    /// Timed and indefinite exemptions.
    pub exemptions: ExemptionLedger,
    /// Violation scores.
    pub violations: ViolationLedger,
    /// Deferred kicks and bans.
    pub punishments: PunishmentExecutor,
    scheduler: TickScheduler,
    host: Arc<dyn Host>,
    world: Arc<dyn WorldQuery>,
    clock: Arc<dyn Clock>,
    profile: HostProfile,
    config: RwLock<Arc<WardenConfig>>,
    outbox: Sender<Notification>,
    inbox: Receiver<Notification>,
}

impl Context {
    /// Negotiates host capabilities and builds the shared state.
    pub fn new(
        host: Arc<dyn Host>,
        world: Arc<dyn WorldQuery>,
        clock: Arc<dyn Clock>,
        config: WardenConfig,
    ) -> WardenResult<Self> {
        config.validate()?;
        let profile = HostProfile::negotiate(host.capabilities())?;
        let (outbox, inbox) = crossbeam_channel::bounded(config.engine.notification_capacity);

        Ok(Self {
            sessions: SessionRegistry::new(),
            exemptions: ExemptionLedger::new(Arc::clone(&clock)),
            violations: ViolationLedger::new(
                Arc::clone(&clock),
                DecayPolicy::from_config(&config.violations),
            ),
            punishments: PunishmentExecutor::new(PunishmentSettings::from_config(&config)),
            scheduler: TickScheduler::new(config.engine.tick_rate),
            host,
            world,
            clock,
            profile,
            config: RwLock::new(Arc::new(config)),
            outbox,
            inbox,
        })
    }

    /// The host server.
    #[must_use]
    pub fn host(&self) -> &dyn Host {
        self.host.as_ref()
    }

    /// Environment estimator over the host world.
    #[must_use]
    pub fn environment(&self) -> Environment<'_> {
        Environment::new(self.world.as_ref())
    }

    /// Current time in milliseconds.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.clock.now_millis()
    }

    /// Capabilities accepted at startup.
    #[must_use]
    pub const fn profile(&self) -> &HostProfile {
        &self.profile
    }

    /// Periodic task registration.
    #[must_use]
    pub fn scheduler(&self) -> &dyn Scheduler {
        &self.scheduler
    }

    /// The concrete tick scheduler, for the engine to advance.
    #[must_use]
    pub const fn tick_scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    /// Current configuration snapshot.
    #[must_use]
    pub fn config(&self) -> Arc<WardenConfig> {
        Arc::clone(&self.config.read())
    }

    /// Swaps in a validated configuration for the engine-wide settings.
    pub fn install_config(&self, config: Arc<WardenConfig>) {
        self.violations
            .set_decay(DecayPolicy::from_config(&config.violations));
        self.punishments
            .set_settings(PunishmentSettings::from_config(&config));
        *self.config.write() = config;
    }

    /// Does `participant` hold a bypass node covering `check`?
    #[must_use]
    pub fn bypasses(&self, participant: ParticipantId, check: CheckType) -> bool {
        let category = format!("{PERMISSION_BYPASS}.{}", check.category().name());
        let single = format!("{category}.{}", check.name());
        self.host.has_permission(participant, PERMISSION_BYPASS)
            || self.host.has_permission(participant, &category)
            || self.host.has_permission(participant, &single)
    }

    /// Should `check` be skipped for `participant` right now?
    pub fn should_skip(&self, participant: ParticipantId, check: CheckType) -> bool {
        self.bypasses(participant, check) || self.exemptions.is_exempt(participant, check)
    }

    /// Scores a result and acts on the decision.
    ///
    /// Notifications are queued for the tick thread; punishments are
    /// requested, never executed inline. Cancelling is left to the caller.
    pub fn escalate(
        &self,
        participant: ParticipantId,
        check: CheckType,
        config: &CheckConfig,
        result: &CheckResult,
    ) -> ActionDecision {
        let decision = self
            .violations
            .record_and_decide(participant, check, config, result);
        if !result.failed() {
            return decision;
        }

        let information = result.information();
        tracing::info!(
            participant = %participant,
            check = %check,
            level = decision.level,
            reason = result.reason(),
            info = %information,
            "violation"
        );

        if decision.notify {
            self.enqueue(Notification {
                participant,
                check,
                level: decision.level,
                information,
            });
        }
        if decision.ban {
            self.punishments.request_ban(participant, check);
        } else if decision.kick {
            self.punishments.request_kick(participant, check);
        }
        decision
    }

    fn enqueue(&self, notification: Notification) {
        match self.outbox.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                tracing::warn!(
                    participant = %dropped.participant,
                    check = %dropped.check,
                    "notification outbox full, dropping notification"
                );
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    /// Delivers queued notifications to observers who want them.
    ///
    /// Returns the number of notifications drained.
    pub fn deliver_notifications(&self) -> usize {
        let pending: Vec<Notification> = self.inbox.try_iter().collect();
        if pending.is_empty() {
            return 0;
        }

        let template = self.config().violations.notify_message.clone();
        let observers: Vec<ParticipantId> = self
            .host
            .online()
            .into_iter()
            .filter(|observer| {
                self.host.has_permission(*observer, PERMISSION_VIOLATIONS)
                    && self.violations.notifications_enabled(*observer)
            })
            .collect();

        for notification in &pending {
            let line = notification.render(&template);
            for observer in &observers {
                self.host.send_message(*observer, &line);
            }
        }
        pending.len()
    }

    /// Notifications waiting for delivery.
    #[must_use]
    pub fn queued_notifications(&self) -> usize {
        self.inbox.len()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("sessions", &self.sessions.len())
            .field("profile", &self.profile)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::testing::{GridWorld, RecordingHost};

    const P: ParticipantId = ParticipantId(1);
    const STAFF: ParticipantId = ParticipantId(2);

    fn context(config: WardenConfig) -> (Arc<RecordingHost>, Context) {
        let host = Arc::new(RecordingHost::default());
        let ctx = Context::new(
            host.clone(),
            Arc::new(GridWorld::flat(63)),
            Arc::new(ManualClock::new(0)),
            config,
        )
        .unwrap();
        ctx.violations.on_join(P);
        (host, ctx)
    }

    #[test]
    fn test_bypass_nodes() {
        let (host, ctx) = context(WardenConfig::default());
        assert!(!ctx.bypasses(P, CheckType::Speed));

        host.grant(P, "warden.bypass.moving.speed");
        assert!(ctx.bypasses(P, CheckType::Speed));
        assert!(!ctx.bypasses(P, CheckType::Flight));

        host.grant(P, "warden.bypass.combat");
        assert!(ctx.bypasses(P, CheckType::Reach));
        assert!(!ctx.bypasses(P, CheckType::FastUse));

        host.grant(P, "warden.bypass");
        assert!(ctx.bypasses(P, CheckType::FastUse));
    }

    #[test]
    fn test_notifications_reach_permitted_observers() {
        let (host, ctx) = context(WardenConfig::default());
        host.connect(P);
        host.connect(STAFF);
        host.grant(STAFF, PERMISSION_VIOLATIONS);

        let result = CheckResult::fail("far").with("distance", 5.0_f64);
        let decision = ctx.escalate(P, CheckType::Reach, &CheckConfig::DEFAULT, &result);
        assert!(decision.notify);
        assert_eq!(ctx.queued_notifications(), 1);
        assert!(host.messages().is_empty());

        assert_eq!(ctx.deliver_notifications(), 1);
        let delivered = host.messages_for(STAFF);
        assert_eq!(delivered.len(), 1);
        assert!(delivered[0].contains("Reach"));
        assert!(host.messages_for(P).is_empty());

        ctx.violations.toggle_notifications(STAFF);
        ctx.escalate(P, CheckType::Reach, &CheckConfig::DEFAULT, &result);
        ctx.deliver_notifications();
        assert_eq!(host.messages_for(STAFF).len(), 1);
    }

    #[test]
    fn test_full_outbox_drops() {
        let config = WardenConfig::from_toml_str("[engine]\nnotification-capacity = 1").unwrap();
        let (_host, ctx) = context(config);
        let result = CheckResult::fail("x");
        ctx.escalate(P, CheckType::Speed, &CheckConfig::DEFAULT, &result);
        ctx.escalate(P, CheckType::Speed, &CheckConfig::DEFAULT, &result);
        assert_eq!(ctx.queued_notifications(), 1);
        assert_eq!(ctx.violations.level(P, CheckType::Speed), 2);
    }

    #[test]
    fn test_ban_requested_over_kick() {
        let (_host, ctx) = context(WardenConfig::default());
        let config = CheckConfig {
            kick: true,
            kick_level: 1,
            ban: true,
            ban_level: 1,
            ..CheckConfig::DEFAULT
        };
        ctx.escalate(P, CheckType::KillAura, &config, &CheckResult::fail("aura"));
        let pending = ctx.punishments.pending(P).unwrap();
        assert_eq!(pending.kind, crate::punishment::PunishmentKind::Ban);
    }

    #[test]
    fn test_incompatible_host_rejected() {
        let host = Arc::new(RecordingHost::new(crate::host::HostCapabilities {
            revision: 5,
            temporary_bans: true,
        }));
        let err = Context::new(
            host,
            Arc::new(GridWorld::empty()),
            Arc::new(ManualClock::new(0)),
            WardenConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            crate::error::WardenError::IncompatibleHost { revision: 5 }
        ));
    }
}
