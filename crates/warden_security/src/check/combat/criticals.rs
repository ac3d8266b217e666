//! Critical hits from fake micro-falls.

use serde::{Deserialize, Serialize};
use warden_shared::ParticipantId;

use super::AttackContext;
use crate::check::{positive, Check, CheckCore, CheckParams, CheckResult, CheckType};
use crate::config::CheckConfig;
use crate::context::Context;
use crate::violation::ActionDecision;

/// `[checks.criticals]` options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CriticalsParams {
    /// Smallest descent that counts as a real fall.
    pub min_fall_distance: f64,
}

impl Default for CriticalsParams {
    fn default() -> Self {
        Self {
            min_fall_distance: 0.07,
        }
    }
}

impl CheckParams for CriticalsParams {
    fn validate(&self) -> Result<(), String> {
        positive("min-fall-distance", self.min_fall_distance)
    }
}

/// Fails on attacks made while "falling" a sliver just off the ground.
#[derive(Debug)]
pub struct Criticals {
    core: CheckCore<CriticalsParams>,
}

impl Criticals {
    /// Creates the check with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: CheckCore::new(
                CheckType::Criticals,
                CheckConfig::DEFAULT,
                CriticalsParams::default(),
            ),
        }
    }

    /// Judges one attack.
    #[must_use]
    pub fn evaluate(params: &CriticalsParams, input: &AttackContext<'_>) -> CheckResult {
        let movement = input.movement;
        if !movement.descending
            || !movement.was_on_ground
            || movement.in_liquid
            || movement.climbing
            || movement.vertical >= params.min_fall_distance
        {
            return CheckResult::pass();
        }
        CheckResult::fail("Critical hit without a real fall.")
            .with("fall", movement.vertical)
            .with("min", params.min_fall_distance)
    }
}

impl Default for Criticals {
    fn default() -> Self {
        Self::new()
    }
}

impl Check for Criticals {
    crate::check::delegate_to_core!();

    fn on_attack(
        &self,
        ctx: &Context,
        participant: ParticipantId,
        attack: &AttackContext<'_>,
    ) -> Option<ActionDecision> {
        self.core
            .run(ctx, participant, |snapshot| Self::evaluate(&snapshot.params, attack))
    }
}
