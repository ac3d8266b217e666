//! Melee reach.

use serde::{Deserialize, Serialize};
use warden_shared::ParticipantId;

use super::AttackContext;
use crate::check::{positive, Check, CheckCore, CheckParams, CheckResult, CheckType};
use crate::config::CheckConfig;
use crate::context::Context;
use crate::violation::ActionDecision;

/// `[checks.reach]` options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReachParams {
    /// Largest attacker-to-target distance, feet to feet.
    pub max_reach: f64,
}

impl Default for ReachParams {
    fn default() -> Self {
        Self { max_reach: 3.4 }
    }
}

impl CheckParams for ReachParams {
    fn validate(&self) -> Result<(), String> {
        positive("max-reach", self.max_reach)
    }
}

/// Fails on attacks from too far away.
#[derive(Debug)]
pub struct Reach {
    core: CheckCore<ReachParams>,
}

impl Reach {
    /// Creates the check with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: CheckCore::new(CheckType::Reach, CheckConfig::DEFAULT, ReachParams::default()),
        }
    }

    /// Judges one attack.
    #[must_use]
    pub fn evaluate(params: &ReachParams, input: &AttackContext<'_>) -> CheckResult {
        let distance = input.movement.to.distance(input.attack.target_position);
        if distance <= params.max_reach {
            return CheckResult::pass();
        }
        CheckResult::fail("Attacked from too far away.")
            .with("distance", distance)
            .with("max", params.max_reach)
    }
}

impl Default for Reach {
    fn default() -> Self {
        Self::new()
    }
}

impl Check for Reach {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{CombatState, MovementState};
    use warden_shared::{Attack, Vec3};

    fn judge(target: Vec3) -> CheckResult {
        let attack = Attack {
            target: 2,
            target_position: target,
        };
        let movement = MovementState::default();
        let combat = CombatState::default();
        Reach::evaluate(
            &ReachParams::default(),
            &AttackContext {
                attack: &attack,
                movement: &movement,
                combat: &combat,
                now: 0,
            },
        )
    }

    #[test]
    fn test_close_attack_passes() {
        assert!(!judge(Vec3::new(3.0, 0.0, 0.0)).failed());
    }

    #[test]
    fn test_far_attack_fails() {
        let result = judge(Vec3::new(0.0, 0.0, 6.0));
        assert!(result.failed());
        assert_eq!(result.information(), "distance=6.000, max=3.400");
    }
}
