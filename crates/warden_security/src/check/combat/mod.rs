//! # Combat Checks
//!
//! Evaluated on every attack, before the attack is recorded into the
//! attacker's combat state.

mod criticals;
mod kill_aura;
mod no_swing;
mod reach;

use warden_shared::Attack;

use crate::session::{CombatState, MovementState};

pub use criticals::{Criticals, CriticalsParams};
pub use kill_aura::{KillAura, KillAuraParams};
pub use no_swing::{NoSwing, NoSwingParams};
pub use reach::{Reach, ReachParams};

/// Eye height above the feet position.
pub const EYE_HEIGHT: f64 = 1.62;

/// Height of a target's body centre above its feet position.
pub const TARGET_CENTRE: f64 = 0.9;

/// Inputs for one attack evaluation.
#[derive(Clone, Copy, Debug)]
pub struct AttackContext<'a> {
    /// The attack itself.
    pub attack: &'a Attack,
    /// Attacker's movement state.
    pub movement: &'a MovementState,
    /// Attacker's combat state before this attack.
    pub combat: &'a CombatState,
    /// Clock reading of the attack.
    pub now: u64,
}
