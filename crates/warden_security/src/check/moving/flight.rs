//! Sustained or impossible upward motion.

use serde::{Deserialize, Serialize};
use warden_shared::ParticipantId;

use crate::check::{positive, Check, CheckCore, CheckParams, CheckResult, CheckType};
use crate::config::CheckConfig;
use crate::context::Context;
use crate::session::MovementState;
use crate::violation::ActionDecision;

/// `[checks.flight]` options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FlightParams {
    /// Airborne ascending updates allowed in a row. A jump takes about six.
    pub max_ascend_moves: u32,
    /// Largest rise allowed in a single update.
    pub max_vertical_rise: f64,
}

impl Default for FlightParams {
    fn default() -> Self {
        Self {
            max_ascend_moves: 8,
            max_vertical_rise: 0.6,
        }
    }
}

impl CheckParams for FlightParams {
    fn validate(&self) -> Result<(), String> {
        if self.max_ascend_moves == 0 {
            return Err("max-ascend-moves must be positive".to_owned());
        }
        positive("max-vertical-rise", self.max_vertical_rise)
    }
}

/// Fails on airborne ascents that outlast or outrun a jump.
#[derive(Debug)]
pub struct Flight {
    core: CheckCore<FlightParams>,
}

impl Flight {
    /// Creates the check with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: CheckCore::new(
                CheckType::Flight,
                CheckConfig::DEFAULT,
                FlightParams::default(),
            ),
        }
    }

    /// Judges one aggregated movement.
    #[must_use]
    pub fn evaluate(params: &FlightParams, movement: &MovementState) -> CheckResult {
        if movement.on_ground || movement.in_liquid || movement.climbing || !movement.ascending {
            return CheckResult::pass();
        }

        if movement.vertical > params.max_vertical_rise {
            return CheckResult::fail("Rose too far in a single move.")
                .with("rise", movement.vertical)
                .with("max", params.max_vertical_rise);
        }
        if movement.ascend_time > params.max_ascend_moves {
            return CheckResult::fail("Ascended for too long while airborne.")
                .with("ascend", movement.ascend_time)
                .with("max", params.max_ascend_moves);
        }
        CheckResult::pass()
    }
}

impl Default for Flight {
    fn default() -> Self {
        Self::new()
    }
}

impl Check for Flight {
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
