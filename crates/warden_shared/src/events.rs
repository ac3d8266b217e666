//! Inbound events from the host server.
//!
//! The host translates its own packets and callbacks into these events and
//! hands them to the engine. Everything here is plain data.

use crate::math::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a connected participant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a participant is and where they are looking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Feet position.
    pub position: Vec3,
    /// Look yaw in degrees.
    pub yaw: f32,
    /// Look pitch in degrees.
    pub pitch: f32,
}

impl Location {
    /// A location looking straight along +Z.
    #[must_use]
    pub const fn at(position: Vec3) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    /// The same position with a different look direction.
    #[must_use]
    pub const fn looking(self, yaw: f32, pitch: f32) -> Self {
        Self { yaw, pitch, ..self }
    }
}

/// A position update.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    /// Position before the move.
    pub from: Vec3,
    /// Position after the move.
    pub to: Vec3,
    /// Ground flag as claimed by the client.
    pub claimed_on_ground: bool,
    /// Participant is sprinting (host state, not derived from position).
    pub sprinting: bool,
    /// Participant is sneaking (host state, not derived from position).
    pub sneaking: bool,
    /// Look yaw in degrees.
    pub yaw: f32,
    /// Look pitch in degrees.
    pub pitch: f32,
}

impl Movement {
    /// A plain walk from `from` to `to` with the client claiming ground.
    #[must_use]
    pub const fn walk(from: Vec3, to: Vec3) -> Self {
        Self {
            from,
            to,
            claimed_on_ground: true,
            sprinting: false,
            sneaking: false,
            yaw: 0.0,
            pitch: 0.0,
        }
    }
}

/// An attack on another entity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attack {
    /// Host entity id of the target.
    pub target: u64,
    /// Target position at the time of the attack.
    pub target_position: Vec3,
}

/// Events the host delivers to the engine.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ParticipantEvent {
    /// Participant connected at the given location.
    Join(Location),
    /// Participant disconnected.
    Leave,
    /// Position update.
    Move(Movement),
    /// Participant was moved by the server (not by their own input).
    Teleport,
    /// Arm swing animation.
    Swing,
    /// Attack on an entity.
    Attack(Attack),
    /// Generic custom payload packet.
    Payload,
    /// Started consuming an item.
    ConsumeStart,
    /// Finished consuming an item.
    ConsumeFinish,
}
