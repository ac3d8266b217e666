//! # Host Interfaces
//!
//! Traits the host server implements so the engine can read the world and
//! act on participants.
//!
//! ```text
//! Engine defines:        Host implements:
//! ┌───────────────┐      ┌───────────────┐
//! │ trait Host    │ ←─── │ impl Host     │
//! │ trait World.. │ ←─── │ impl World..  │
//! └───────────────┘      └───────────────┘
//! ```
//!
//! Capabilities are negotiated once at startup; nothing dispatches on the
//! host version after that.

use std::ops::RangeInclusive;
use std::time::Duration;

use warden_shared::{BlockPos, ParticipantId};

use crate::error::{WardenError, WardenResult};

/// Protocol revisions the engine understands.
pub const SUPPORTED_REVISIONS: RangeInclusive<u32> = 47..=754;

// ============================================================================
// WORLD
// ============================================================================

/// Classification of a single block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockInfo {
    /// Blocks movement.
    pub solid: bool,
    /// Water, lava and the like.
    pub liquid: bool,
    /// Ladders, vines.
    pub climbable: bool,
    /// Low-friction ice variants.
    pub ice: bool,
}

impl BlockInfo {
    /// Empty space.
    pub const AIR: Self = Self {
        solid: false,
        liquid: false,
        climbable: false,
        ice: false,
    };

    /// Ordinary solid block.
    pub const SOLID: Self = Self {
        solid: true,
        ..Self::AIR
    };

    /// Ice: solid and slippery.
    pub const ICE: Self = Self {
        solid: true,
        ice: true,
        ..Self::AIR
    };

    /// Liquid.
    pub const LIQUID: Self = Self {
        liquid: true,
        ..Self::AIR
    };

    /// Climbable, non-solid block.
    pub const CLIMBABLE: Self = Self {
        climbable: true,
        ..Self::AIR
    };
}

/// Read-only access to the host world.
///
/// Implementations must be side-effect free or synchronize internally; the
/// engine calls this from event-delivery threads.
pub trait WorldQuery: Send + Sync {
    /// Classification of the block at `pos`, or `None` if it is outside the
    /// world or not loaded.
    fn block(&self, pos: BlockPos) -> Option<BlockInfo>;
}

// ============================================================================
// HOST
// ============================================================================

/// What the host reports about itself during startup negotiation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HostCapabilities {
    /// Network protocol revision.
    pub revision: u32,
    /// Host can ban for a limited duration.
    pub temporary_bans: bool,
}

/// Capabilities accepted by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HostProfile {
    /// Network protocol revision.
    pub revision: u32,
    /// Bans may carry a duration.
    pub temporary_bans: bool,
}

impl HostProfile {
    /// Validates host capabilities once at startup.
    pub fn negotiate(capabilities: HostCapabilities) -> WardenResult<Self> {
        if !SUPPORTED_REVISIONS.contains(&capabilities.revision) {
            return Err(WardenError::IncompatibleHost {
                revision: capabilities.revision,
            });
        }
        if !capabilities.temporary_bans {
            tracing::warn!(
                revision = capabilities.revision,
                "host cannot issue temporary bans, all bans will be permanent"
            );
        }
        Ok(Self {
            revision: capabilities.revision,
            temporary_bans: capabilities.temporary_bans,
        })
    }
}

/// Operations the engine needs from the host server.
pub trait Host: Send + Sync {
    /// Capabilities for startup negotiation.
    fn capabilities(&self) -> HostCapabilities;

    /// Participants currently connected.
    fn online(&self) -> Vec<ParticipantId>;

    /// Does `participant` hold `permission`?
    fn has_permission(&self, participant: ParticipantId, permission: &str) -> bool;

    /// Sends a chat line to one participant.
    fn send_message(&self, participant: ParticipantId, message: &str);

    /// Disconnects a participant. Returns `false` if they were already gone.
    fn kick(&self, participant: ParticipantId, reason: &str) -> bool;

    /// Bans and disconnects a participant. `None` means permanent.
    /// Returns `false` if they were already gone.
    fn ban(&self, participant: ParticipantId, reason: &str, duration: Option<Duration>) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negotiate_accepts_supported_revision() {
        let profile = HostProfile::negotiate(HostCapabilities {
            revision: 578,
            temporary_bans: true,
        })
        .unwrap();
        assert_eq!(profile.revision, 578);
        assert!(profile.temporary_bans);
    }

    #[test]
    fn test_negotiate_rejects_unknown_revision() {
        let err = HostProfile::negotiate(HostCapabilities {
            revision: 9_000,
            temporary_bans: true,
        })
        .unwrap_err();
        assert!(matches!(err, WardenError::IncompatibleHost { revision: 9_000 }));
    }

    #[test]
    fn test_block_presets() {
        assert!(BlockInfo::ICE.solid && BlockInfo::ICE.ice);
        assert!(!BlockInfo::LIQUID.solid);
        assert_eq!(BlockInfo::default(), BlockInfo::AIR);
    }
}
