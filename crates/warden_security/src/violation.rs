//! # Violation Ledger
//!
//! Escalating score per (participant, check) and the decision it drives.
//!
//! ```text
//! fail ──► level += 1 ──┬─► notify  (level % notify-every == 0)
//!                       ├─► cancel  (level >= cancel-level)
//!                       ├─► kick    (level >= kick-level)
//!                       └─► ban     (level >= ban-level)
//! ```
//!
//! Every applicable action fires, not only the most severe one.
//!
//! ## Decay
//!
//! Linear and lazy: each full decay interval elapsed since a record last
//! changed removes the decay amount, saturating at zero. Applied on every
//! `record_and_decide`, passing or failing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use warden_shared::ParticipantId;

use crate::check::{CheckResult, CheckType};
use crate::clock::Clock;
use crate::config::{CheckConfig, ViolationConfig};

/// Score state for one (participant, check) pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViolationRecord {
    /// Current score.
    pub level: u32,
    /// Clock reading of the last increment or decay step.
    pub last_change: u64,
}

/// How scores shrink while a participant behaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecayPolicy {
    /// Milliseconds per decay step, 0 disables decay.
    pub interval_millis: u64,
    /// Score removed per step.
    pub amount: u32,
}

impl DecayPolicy {
    /// Never decays.
    pub const NONE: Self = Self {
        interval_millis: 0,
        amount: 0,
    };

    /// Policy from the `[violations]` section.
    #[must_use]
    pub const fn from_config(config: &ViolationConfig) -> Self {
        Self {
            interval_millis: config.decay_interval_ms,
            amount: config.decay_amount,
        }
    }

    fn apply(self, record: &mut ViolationRecord, now: u64) {
        if self.interval_millis == 0 || self.amount == 0 {
            return;
        }
        let steps = now.saturating_sub(record.last_change) / self.interval_millis;
        if steps == 0 {
            return;
        }
        let removed = u32::try_from(steps.saturating_mul(u64::from(self.amount))).unwrap_or(u32::MAX);
        record.level = record.level.saturating_sub(removed);
        record.last_change += steps * self.interval_millis;
    }
}

impl Default for DecayPolicy {
    fn default() -> Self {
        Self::from_config(&ViolationConfig::default())
    }
}

/// Actions a single evaluation calls for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActionDecision {
    /// Score after this evaluation.
    pub level: u32,
    /// Tell staff.
    pub notify: bool,
    /// Cancel the triggering action.
    pub cancel: bool,
    /// Request a kick.
    pub kick: bool,
    /// Request a ban.
    pub ban: bool,
}

impl ActionDecision {
    /// Computes the decision for a score that just increased.
    #[must_use]
    pub fn for_level(level: u32, config: &CheckConfig) -> Self {
        Self {
            level,
            notify: config.notify && config.notify_every > 0 && level % config.notify_every == 0,
            cancel: config.cancel && level >= config.cancel_level,
            kick: config.kick && level >= config.kick_level,
            ban: config.ban && level >= config.ban_level,
        }
    }
}

/// A staff notification waiting for delivery on the tick thread.
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    /// Offending participant.
    pub participant: ParticipantId,
    /// Failed check.
    pub check: CheckType,
    /// Score after the failure.
    pub level: u32,
    /// Rendered diagnostics, `name=value` pairs.
    pub information: String,
}

impl Notification {
    /// Fills in a `[violations] notify-message` template.
    #[must_use]
    pub fn render(&self, template: &str) -> String {
        template
            .replace("%player%", &self.participant.to_string())
            .replace("%check%", self.check.display_name())
            .replace("%level%", &self.level.to_string())
            .replace("%info%", &self.information)
    }
}

/// Violation scores for every connected participant.
pub struct ViolationLedger {
    records: Mutex<HashMap<ParticipantId, HashMap<CheckType, ViolationRecord>>>,
    decay: RwLock<DecayPolicy>,
    muted: Mutex<HashSet<ParticipantId>>,
    clock: Arc<dyn Clock>,
}

impl ViolationLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, decay: DecayPolicy) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            decay: RwLock::new(decay),
            muted: Mutex::new(HashSet::new()),
            clock,
        }
    }

    /// Starts tracking a participant.
    pub fn on_join(&self, participant: ParticipantId) {
        self.records.lock().insert(participant, HashMap::new());
    }

    /// Forgets a participant's scores and notification preference.
    pub fn on_leave(&self, participant: ParticipantId) {
        self.records.lock().remove(&participant);
        self.muted.lock().remove(&participant);
    }

    /// Forgets every score for one check.
    pub fn clear_check(&self, check: CheckType) {
        for scores in self.records.lock().values_mut() {
            scores.remove(&check);
        }
    }

    /// Replaces the decay policy.
    pub fn set_decay(&self, decay: DecayPolicy) {
        *self.decay.write() = decay;
    }

    /// Applies decay, scores a failure and decides what to do.
    ///
    /// Participants that are not tracked (left, or never joined) get an
    /// empty decision and no record.
    pub fn record_and_decide(
        &self,
        participant: ParticipantId,
        check: CheckType,
        config: &CheckConfig,
        result: &CheckResult,
    ) -> ActionDecision {
        let now = self.clock.now_millis();
        let decay = *self.decay.read();

        let mut records = self.records.lock();
        let Some(scores) = records.get_mut(&participant) else {
            return ActionDecision::default();
        };
        let record = scores.entry(check).or_insert(ViolationRecord {
            level: 0,
            last_change: now,
        });
        decay.apply(record, now);

        if !result.failed() {
            return ActionDecision {
                level: record.level,
                ..ActionDecision::default()
            };
        }

        record.level = record.level.saturating_add(1);
        record.last_change = now;
        ActionDecision::for_level(record.level, config)
    }

    /// Current score, zero if none.
    #[must_use]
    pub fn level(&self, participant: ParticipantId, check: CheckType) -> u32 {
        self.records
            .lock()
            .get(&participant)
            .and_then(|scores| scores.get(&check))
            .map_or(0, |record| record.level)
    }

    /// Is this participant tracked?
    #[must_use]
    pub fn is_tracked(&self, participant: ParticipantId) -> bool {
        self.records.lock().contains_key(&participant)
    }

    /// Flips whether `observer` receives notifications. Returns the new state.
    pub fn toggle_notifications(&self, observer: ParticipantId) -> bool {
        let mut muted = self.muted.lock();
        if muted.remove(&observer) {
            true
        } else {
            muted.insert(observer);
            false
        }
    }

    /// Does `observer` want notifications?
    #[must_use]
    pub fn notifications_enabled(&self, observer: ParticipantId) -> bool {
        !self.muted.lock().contains(&observer)
    }
}

impl std::fmt::Debug for ViolationLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViolationLedger")
            .field("participants", &self.records.lock().len())
            .field("decay", &*self.decay.read())
            .finish_non_exhaustive()
    }
}
