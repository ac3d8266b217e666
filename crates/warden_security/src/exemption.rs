//! # Exemption Ledger
//!
//! Suppresses checks for participants in known-safe states without touching
//! their scores.
//!
//! Two flavours:
//! - **Timed**, per (participant, check): valid while the clock is before the
//!   expiry, removed lazily the first time it is found expired.
//! - **Indefinite**, per (participant, [`ExemptionKind`]): covers a group of
//!   checks until explicitly removed.
//!
//! A zero duration means "no exemption" and clears any timed record for the
//! pair.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use warden_shared::ParticipantId;

use crate::check::{CheckCategory, CheckType};
use crate::clock::Clock;

/// Indefinite exemption reasons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExemptionKind {
    /// Position was set by the server; the next movement is not the client's.
    Teleported,
    /// Flight granted by the host (creative, admin fly).
    AllowedFlight,
    /// Riding a vehicle or mount.
    Vehicle,
}

impl ExemptionKind {
    /// Does this exemption suppress `check`?
    #[must_use]
    pub fn covers(self, check: CheckType) -> bool {
        match self {
            Self::Teleported | Self::Vehicle => check.category() == CheckCategory::Moving,
            Self::AllowedFlight => matches!(check, CheckType::Flight | CheckType::NoFall),
        }
    }
}

/// Per-participant suppression state.
pub struct ExemptionLedger {
    timed: Mutex<HashMap<(ParticipantId, CheckType), u64>>,
    kinds: Mutex<HashMap<ParticipantId, HashSet<ExemptionKind>>>,
    clock: Arc<dyn Clock>,
}

impl ExemptionLedger {
    /// Creates an empty ledger reading time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            timed: Mutex::new(HashMap::new()),
            kinds: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Exempts `participant` from `check` for `duration`.
    ///
    /// A zero duration removes any existing timed exemption for the pair.
    pub fn exempt(&self, participant: ParticipantId, check: CheckType, duration: Duration) {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        let mut timed = self.timed.lock();
        if millis == 0 {
            timed.remove(&(participant, check));
            return;
        }
        let expiry = self.clock.now_millis().saturating_add(millis);
        timed.insert((participant, check), expiry);
    }

    /// Exempts `participant` from every check for `duration`.
    pub fn exempt_all(&self, participant: ParticipantId, duration: Duration) {
        for check in CheckType::ALL {
            self.exempt(participant, check, duration);
        }
    }

    /// Adds an indefinite exemption.
    pub fn exempt_kind(&self, participant: ParticipantId, kind: ExemptionKind) {
        self.kinds.lock().entry(participant).or_default().insert(kind);
    }

    /// Removes an indefinite exemption. Returns whether it was present.
    pub fn remove_kind(&self, participant: ParticipantId, kind: ExemptionKind) -> bool {
        let mut kinds = self.kinds.lock();
        let Some(set) = kinds.get_mut(&participant) else {
            return false;
        };
        let removed = set.remove(&kind);
        if set.is_empty() {
            kinds.remove(&participant);
        }
        removed
    }

    /// Is `kind` active for `participant`?
    #[must_use]
    pub fn has_kind(&self, participant: ParticipantId, kind: ExemptionKind) -> bool {
        self.kinds
            .lock()
            .get(&participant)
            .is_some_and(|set| set.contains(&kind))
    }

    /// Should `check` be skipped for `participant`?
    ///
    /// Clears the timed record the first time it is found expired.
    pub fn is_exempt(&self, participant: ParticipantId, check: CheckType) -> bool {
        let by_kind = self
            .kinds
            .lock()
            .get(&participant)
            .is_some_and(|set| set.iter().any(|kind| kind.covers(check)));
        if by_kind {
            return true;
        }

        let mut timed = self.timed.lock();
        let Some(&expiry) = timed.get(&(participant, check)) else {
            return false;
        };
        if self.clock.now_millis() < expiry {
            return true;
        }
        timed.remove(&(participant, check));
        false
    }

    /// Is a timed record stored for the pair, expired or not?
    #[must_use]
    pub fn has_record(&self, participant: ParticipantId, check: CheckType) -> bool {
        self.timed.lock().contains_key(&(participant, check))
    }

    /// Drops everything held for a participant.
    pub fn clear(&self, participant: ParticipantId) {
        self.timed.lock().retain(|(owner, _), _| *owner != participant);
        self.kinds.lock().remove(&participant);
    }

    /// Drops every timed exemption for a check.
    pub fn clear_check(&self, check: CheckType) {
        self.timed.lock().retain(|(_, exempted), _| *exempted != check);
    }
}

impl std::fmt::Debug for ExemptionLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExemptionLedger")
            .field("timed", &self.timed.lock().len())
            .field("kinds", &self.kinds.lock().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const P: ParticipantId = ParticipantId(1);

    fn ledger() -> (Arc<ManualClock>, ExemptionLedger) {
        let clock = Arc::new(ManualClock::new(1_000));
        let ledger = ExemptionLedger::new(clock.clone());
        (clock, ledger)
    }

    #[test]
    fn test_timed_exemption_expires_and_is_removed() {
        let (clock, ledger) = ledger();
        ledger.exempt(P, CheckType::Speed, Duration::from_millis(500));

        assert!(ledger.is_exempt(P, CheckType::Speed));
        clock.advance(499);
        assert!(ledger.is_exempt(P, CheckType::Speed));
        assert!(!ledger.is_exempt(P, CheckType::Flight));

        clock.advance(1);
        assert!(ledger.has_record(P, CheckType::Speed));
        assert!(!ledger.is_exempt(P, CheckType::Speed));
        assert!(!ledger.has_record(P, CheckType::Speed));
    }

    #[test]
    fn test_zero_duration_clears() {
        let (_clock, ledger) = ledger();
        ledger.exempt(P, CheckType::Reach, Duration::ZERO);
        assert!(!ledger.is_exempt(P, CheckType::Reach));

        ledger.exempt(P, CheckType::Reach, Duration::from_secs(10));
        assert!(ledger.is_exempt(P, CheckType::Reach));
        ledger.exempt(P, CheckType::Reach, Duration::ZERO);
        assert!(!ledger.is_exempt(P, CheckType::Reach));
    }

    #[test]
    fn test_kind_covers_moving_checks_only() {
        let (clock, ledger) = ledger();
        ledger.exempt_kind(P, ExemptionKind::Teleported);
        clock.advance(1_000_000);

        assert!(ledger.is_exempt(P, CheckType::Speed));
        assert!(ledger.is_exempt(P, CheckType::NoFall));
        assert!(!ledger.is_exempt(P, CheckType::Reach));

        assert!(ledger.remove_kind(P, ExemptionKind::Teleported));
        assert!(!ledger.remove_kind(P, ExemptionKind::Teleported));
        assert!(!ledger.is_exempt(P, CheckType::Speed));
    }

    #[test]
    fn test_allowed_flight_scope() {
        assert!(ExemptionKind::AllowedFlight.covers(CheckType::Flight));
        assert!(ExemptionKind::AllowedFlight.covers(CheckType::NoFall));
        assert!(!ExemptionKind::AllowedFlight.covers(CheckType::Speed));
    }

    #[test]
    fn test_clear_participant() {
        let (_clock, ledger) = ledger();
        let other = ParticipantId(2);
        ledger.exempt_all(P, Duration::from_secs(5));
        ledger.exempt_all(other, Duration::from_secs(5));
        ledger.exempt_kind(P, ExemptionKind::Vehicle);

        ledger.clear(P);
        assert!(!ledger.is_exempt(P, CheckType::KillAura));
        assert!(!ledger.has_kind(P, ExemptionKind::Vehicle));
        assert!(ledger.is_exempt(other, CheckType::KillAura));
    }
}
