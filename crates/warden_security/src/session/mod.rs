//! # Participant Sessions
//!
//! Per-participant state with an explicit lifecycle:
//! created on join, destroyed on leave, never looked up ambiently.
//!
//! ## Threading
//!
//! ```text
//! event delivery ──► movement (Mutex, one writer per participant)
//!               └──► packets  (atomics)
//! tick thread   ──► packets.sample_and_reset / movement snapshot
//! ```
//!
//! Evaluations hold an `Arc<Session>`; one that finishes after the
//! participant left simply writes into a session nobody will read again.

pub mod combat;
pub mod movement;
pub mod packets;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use warden_shared::{ParticipantId, MAX_PARTICIPANTS};

pub use combat::CombatState;
pub use movement::MovementState;
pub use packets::{PacketCounters, PacketKind};

/// Everything the engine tracks about one connected participant.
#[derive(Debug)]
pub struct Session {
    id: ParticipantId,
    /// Movement aggregate, recomputed on each position update.
    pub movement: Mutex<MovementState>,
    /// Rate counters.
    pub packets: PacketCounters,
    /// Combat timing.
    pub combat: Mutex<CombatState>,
}

impl Session {
    /// Creates an empty session.
    #[must_use]
    pub fn new(id: ParticipantId) -> Self {
        Self {
            id,
            movement: Mutex::new(MovementState::default()),
            packets: PacketCounters::default(),
            combat: Mutex::new(CombatState::default()),
        }
    }

    /// Participant this session belongs to.
    #[must_use]
    pub const fn id(&self) -> ParticipantId {
        self.id
    }

    /// Copy of the current movement state.
    #[must_use]
    pub fn movement_snapshot(&self) -> MovementState {
        self.movement.lock().clone()
    }
}

/// Registry of live sessions keyed by participant.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<ParticipantId, Arc<Session>>>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::with_capacity(MAX_PARTICIPANTS)),
        }
    }

    /// Creates a fresh session, replacing any stale one.
    pub fn create(&self, id: ParticipantId) -> Arc<Session> {
        let session = Arc::new(Session::new(id));
        self.sessions.write().insert(id, Arc::clone(&session));
        session
    }

    /// Destroys a session.
    pub fn remove(&self, id: ParticipantId) -> Option<Arc<Session>> {
        self.sessions.write().remove(&id)
    }

    /// Looks up a live session.
    #[must_use]
    pub fn get(&self, id: ParticipantId) -> Option<Arc<Session>> {
        self.sessions.read().get(&id).cloned()
    }

    /// Is this participant connected?
    #[must_use]
    pub fn contains(&self, id: ParticipantId) -> bool {
        self.sessions.read().contains_key(&id)
    }

    /// Snapshot of all live sessions.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<Session>> {
        self.sessions.read().values().cloned().collect()
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// No live sessions?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Drops every session.
    pub fn clear(&self) {
        self.sessions.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let registry = SessionRegistry::new();
        let id = ParticipantId(7);
        assert!(registry.get(id).is_none());

        registry.create(id);
        assert!(registry.contains(id));
        assert_eq!(registry.len(), 1);

        let removed = registry.remove(id).unwrap();
        assert_eq!(removed.id(), id);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_in_flight_session_survives_removal() {
        let registry = SessionRegistry::new();
        let id = ParticipantId(1);
        let held = registry.create(id);
        registry.remove(id);

        // Late writers see a detached session, not a fault.
        held.packets.increment(PacketKind::Swing);
        assert_eq!(held.packets.count(PacketKind::Swing), 1);
        assert!(registry.get(id).is_none());
    }

    #[test]
    fn test_rejoin_gets_fresh_state() {
        let registry = SessionRegistry::new();
        let id = ParticipantId(3);
        registry.create(id).packets.increment(PacketKind::Payload);
        let fresh = registry.create(id);
        assert_eq!(fresh.packets.count(PacketKind::Payload), 0);
    }
}
