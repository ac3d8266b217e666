//! Horizontal speed limit.

use serde::{Deserialize, Serialize};
use warden_shared::ParticipantId;

use crate::check::{positive, Check, CheckCore, CheckParams, CheckResult, CheckType};
use crate::config::CheckConfig;
use crate::context::Context;
use crate::session::MovementState;
use crate::violation::ActionDecision;

/// `[checks.speed]` options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SpeedParams {
    /// Blocks per update while walking.
    pub base_speed: f64,
    /// Applied while sprinting.
    pub sprint_multiplier: f64,
    /// Applied once sneaking has lasted longer than `sneak_grace`.
    pub sneak_multiplier: f64,
    /// Updates of sneaking before the sneak limit applies.
    pub sneak_grace: u32,
    /// Applied on ice and for `ice_grace` updates after it.
    pub ice_multiplier: f64,
    /// Updates of ice momentum after leaving ice, airborne ones included.
    pub ice_grace: u32,
}

impl Default for SpeedParams {
    fn default() -> Self {
        Self {
            base_speed: 0.36,
            sprint_multiplier: 1.3,
            sneak_multiplier: 0.45,
            sneak_grace: 5,
            ice_multiplier: 1.8,
            ice_grace: 10,
        }
    }
}

impl CheckParams for SpeedParams {
    fn validate(&self) -> Result<(), String> {
        positive("base-speed", self.base_speed)?;
        positive("sprint-multiplier", self.sprint_multiplier)?;
        positive("sneak-multiplier", self.sneak_multiplier)?;
        positive("ice-multiplier", self.ice_multiplier)
    }
}

impl SpeedParams {
    /// Largest legitimate horizontal distance for this movement state.
    #[must_use]
    pub fn limit(&self, movement: &MovementState) -> f64 {
        let mut limit = self.base_speed;
        if movement.sprinting {
            limit *= self.sprint_multiplier;
        }
        if movement.sneaking && movement.sneak_time > self.sneak_grace {
            limit *= self.sneak_multiplier;
        }
        if movement.on_ice || movement.off_ice_time <= self.ice_grace {
            limit *= self.ice_multiplier;
        }
        limit
    }
}

/// Fails when a single update covers more ground than the limit allows.
#[derive(Debug)]
pub struct Speed {
    core: CheckCore<SpeedParams>,
}

impl Speed {
    /// Creates the check with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: CheckCore::new(CheckType::Speed, CheckConfig::DEFAULT, SpeedParams::default()),
        }
    }

    /// Judges one aggregated movement.
    #[must_use]
    pub fn evaluate(params: &SpeedParams, movement: &MovementState) -> CheckResult {
        let distance = movement.horizontal();
        let max = params.limit(movement);
        if distance <= max {
            return CheckResult::pass();
        }
        CheckResult::fail("Moved too fast.")
            .with("distance", distance)
            .with("max", max)
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self::new()
    }
}

impl Check for Speed {
    crate::check::delegate_to_core!();

    fn on_movement(
        &self,
        ctx: &Context,
        participant: ParticipantId,
        movement: &MovementState,
    ) -> Option<ActionDecision> {
        self.core
            .run(ctx, participant, |snapshot| Self::evaluate(&snapshot.params, movement))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_shared::Vec3;

    fn moved(dx: f64) -> MovementState {
        MovementState {
            from: Vec3::ZERO,
            to: Vec3::new(dx, 0.0, 0.0),
            on_ground: true,
            off_ice_time: 100,
            ..MovementState::default()
        }
    }

    #[test]
    fn test_walking_pace_passes() {
        assert!(!Speed::evaluate(&SpeedParams::default(), &moved(0.3)).failed());
    }

    #[test]
    fn test_too_fast_fails() {
        let result = Speed::evaluate(&SpeedParams::default(), &moved(0.8));
        assert!(result.failed());
        assert_eq!(result.information(), "distance=0.800, max=0.360");
    }

    #[test]
    fn test_sprint_raises_limit() {
        let mut state = moved(0.45);
        assert!(Speed::evaluate(&SpeedParams::default(), &state).failed());
        state.sprinting = true;
        assert!(!Speed::evaluate(&SpeedParams::default(), &state).failed());
    }

    #[test]
    fn test_sneak_limit_after_grace() {
        let params = SpeedParams::default();
        let mut state = moved(0.3);
        state.sneaking = true;
        state.sneak_time = params.sneak_grace;
        assert!(!Speed::evaluate(&params, &state).failed());
        state.sneak_time = params.sneak_grace + 1;
        assert!(Speed::evaluate(&params, &state).failed());
    }

    #[test]
    fn test_ice_momentum() {
        let params = SpeedParams::default();
        let mut state = moved(0.6);
        assert!(Speed::evaluate(&params, &state).failed());
        state.off_ice_time = 3;
        assert!(!Speed::evaluate(&params, &state).failed());
        state.off_ice_time = 0;
        state.on_ice = true;
        assert!(!Speed::evaluate(&params, &state).failed());
    }

    #[test]
    fn test_hovering_never_earns_ice_allowance() {
        let state = MovementState {
            from: Vec3::new(0.0, 66.0, 0.0),
            to: Vec3::new(0.6, 66.0, 0.0),
            ..MovementState::default()
        };
        let result = Speed::evaluate(&SpeedParams::default(), &state);
        assert!(result.failed());
        assert_eq!(result.information(), "distance=0.600, max=0.360");
    }
}
