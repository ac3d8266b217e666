//! In-memory host and world implementations.
//!
//! Used by unit tests, integration tests and the `warden_sim` harness.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use parking_lot::Mutex;
use warden_shared::{BlockPos, ParticipantId};

use crate::host::{BlockInfo, Host, HostCapabilities, WorldQuery};

// ============================================================================
// GridWorld
// ============================================================================

/// Sparse block grid with an optional solid floor.
#[derive(Debug, Default)]
pub struct GridWorld {
    blocks: HashMap<BlockPos, BlockInfo>,
    /// Every block at or below this height is solid.
    floor: Option<i32>,
    /// Every query answers "not loaded".
    unloaded: bool,
}

impl GridWorld {
    /// World with no blocks at all.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// World whose blocks at `y <= floor_y` are solid.
    #[must_use]
    pub fn flat(floor_y: i32) -> Self {
        Self {
            floor: Some(floor_y),
            ..Self::default()
        }
    }

    /// World that is never loaded.
    #[must_use]
    pub fn unloaded() -> Self {
        Self {
            unloaded: true,
            ..Self::default()
        }
    }

    /// Places a block, overriding the floor.
    pub fn set(&mut self, pos: BlockPos, block: BlockInfo) {
        self.blocks.insert(pos, block);
    }
}

impl WorldQuery for GridWorld {
    fn block(&self, pos: BlockPos) -> Option<BlockInfo> {
        if self.unloaded {
            return None;
        }
        if let Some(block) = self.blocks.get(&pos) {
            return Some(*block);
        }
        match self.floor {
            Some(floor) if pos.y <= floor => Some(BlockInfo::SOLID),
            _ => Some(BlockInfo::AIR),
        }
    }
}

// ============================================================================
// RecordingHost
// ============================================================================

/// A recorded ban.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedBan {
    /// Banned participant.
    pub participant: ParticipantId,
    /// Reason shown to them.
    pub reason: String,
    /// `None` for permanent.
    pub duration: Option<Duration>,
}

/// Host that records every outward action instead of performing it.
#[derive(Debug)]
pub struct RecordingHost {
    capabilities: HostCapabilities,
    online: Mutex<Vec<ParticipantId>>,
    permissions: Mutex<HashMap<ParticipantId, HashSet<String>>>,
    messages: Mutex<Vec<(ParticipantId, String)>>,
    kicks: Mutex<Vec<(ParticipantId, String)>>,
    bans: Mutex<Vec<RecordedBan>>,
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self::new(HostCapabilities {
            revision: 754,
            temporary_bans: true,
        })
    }
}

impl RecordingHost {
    /// Creates a host reporting the given capabilities.
    #[must_use]
    pub fn new(capabilities: HostCapabilities) -> Self {
        Self {
            capabilities,
            online: Mutex::new(Vec::new()),
            permissions: Mutex::new(HashMap::new()),
            messages: Mutex::new(Vec::new()),
            kicks: Mutex::new(Vec::new()),
            bans: Mutex::new(Vec::new()),
        }
    }

    /// Marks a participant as connected.
    pub fn connect(&self, participant: ParticipantId) {
        let mut online = self.online.lock();
        if !online.contains(&participant) {
            online.push(participant);
        }
    }

    /// Marks a participant as disconnected.
    pub fn disconnect(&self, participant: ParticipantId) {
        self.online.lock().retain(|p| *p != participant);
    }

    /// Grants a permission node.
    pub fn grant(&self, participant: ParticipantId, permission: &str) {
        self.permissions
            .lock()
            .entry(participant)
            .or_default()
            .insert(permission.to_owned());
    }

    /// Messages sent so far.
    #[must_use]
    pub fn messages(&self) -> Vec<(ParticipantId, String)> {
        self.messages.lock().clone()
    }

    /// Messages sent to one participant.
    #[must_use]
    pub fn messages_for(&self, participant: ParticipantId) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .filter(|(p, _)| *p == participant)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Kicks performed so far.
    #[must_use]
    pub fn kicks(&self) -> Vec<(ParticipantId, String)> {
        self.kicks.lock().clone()
    }

    /// Bans performed so far.
    #[must_use]
    pub fn bans(&self) -> Vec<RecordedBan> {
        self.bans.lock().clone()
    }

    fn remove_online(&self, participant: ParticipantId) -> bool {
        let mut online = self.online.lock();
        let before = online.len();
        online.retain(|p| *p != participant);
        online.len() != before
    }
}

impl Host for RecordingHost {
    fn capabilities(&self) -> HostCapabilities {
        self.capabilities
    }

    fn online(&self) -> Vec<ParticipantId> {
        self.online.lock().clone()
    }

    fn has_permission(&self, participant: ParticipantId, permission: &str) -> bool {
        self.permissions
            .lock()
            .get(&participant)
            .is_some_and(|nodes| nodes.contains(permission))
    }

    fn send_message(&self, participant: ParticipantId, message: &str) {
        self.messages.lock().push((participant, message.to_owned()));
    }

    fn kick(&self, participant: ParticipantId, reason: &str) -> bool {
        if !self.remove_online(participant) {
            return false;
        }
        self.kicks.lock().push((participant, reason.to_owned()));
        true
    }

    fn ban(&self, participant: ParticipantId, reason: &str, duration: Option<Duration>) -> bool {
        if !self.remove_online(participant) {
            return false;
        }
        self.bans.lock().push(RecordedBan {
            participant,
            reason: reason.to_owned(),
            duration,
        });
        true
    }
}
