//! Ground spoofing to avoid fall damage.

use warden_shared::ParticipantId;

use crate::check::{Check, CheckCore, CheckResult, CheckType, NoParams};
use crate::config::CheckConfig;
use crate::context::Context;
use crate::session::MovementState;
use crate::violation::ActionDecision;

/// Fails when the client claims ground contact the world does not support.
#[derive(Debug)]
pub struct NoFall {
    core: CheckCore<NoParams>,
}

impl NoFall {
    /// Creates the check with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: CheckCore::new(CheckType::NoFall, CheckConfig::DEFAULT, NoParams {}),
        }
    }

    /// Judges one aggregated movement.
    #[must_use]
    pub fn evaluate(movement: &MovementState) -> CheckResult {
        // Liquids and ladders legitimately break fall damage.
        if !movement.claimed_on_ground
            || movement.was_on_ground
            || movement.in_liquid
            || movement.climbing
        {
            return CheckResult::pass();
        }

        let fall = movement
            .ground_position
            .map_or(0.0, |ground| ground.y - movement.to.y);
        CheckResult::fail("Claimed ground contact while airborne.")
            .with("claimed", movement.claimed_on_ground)
            .with("fall", fall)
    }
}

impl Default for NoFall {
    fn default() -> Self {
        Self::new()
    }
}

impl Check for NoFall {
    crate::check::delegate_to_core!();

    fn on_movement(
        &self,
        ctx: &Context,
        participant: ParticipantId,
        movement: &MovementState,
    ) -> Option<ActionDecision> {
        self.core.run(ctx, participant, |_| Self::evaluate(movement))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_shared::Vec3;

    fn airborne(claimed: bool) -> MovementState {
        MovementState {
            claimed_on_ground: claimed,
            ground_position: Some(Vec3::new(0.0, 70.0, 0.0)),
            to: Vec3::new(0.0, 66.0, 0.0),
            ..MovementState::default()
        }
    }

    #[test]
    fn test_spoofed_ground_fails() {
        let result = NoFall::evaluate(&airborne(true));
        assert!(result.failed());
        assert_eq!(result.information(), "claimed=true, fall=4.000");
    }

    #[test]
    fn test_honest_airborne_passes() {
        assert!(!NoFall::evaluate(&airborne(false)).failed());
    }

    #[test]
    fn test_debounced_and_liquid_pass() {
        let mut state = airborne(true);
        state.was_on_ground = true;
        assert!(!NoFall::evaluate(&state).failed());

        let mut state = airborne(true);
        state.in_liquid = true;
        assert!(!NoFall::evaluate(&state).failed());
    }
}
