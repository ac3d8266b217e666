//! Automated aim patterns: hitting what you are not looking at, or
//! switching targets faster than a human can.

use serde::{Deserialize, Serialize};
use warden_shared::{ParticipantId, Vec3};

use super::{AttackContext, EYE_HEIGHT, TARGET_CENTRE};
use crate::check::{positive, Check, CheckCore, CheckParams, CheckResult, CheckType};
use crate::config::CheckConfig;
use crate::context::Context;
use crate::violation::ActionDecision;

/// Targets closer than this are inside the attacker's own hitbox; any
/// look direction is plausible.
const MIN_ANGLE_DISTANCE: f64 = 0.5;

/// `[checks.kill-aura]` options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KillAuraParams {
    /// Largest angle in degrees between the look direction and the target.
    pub max_angle: f64,
    /// Shortest time between hits on two different targets.
    pub min_switch_millis: u64,
}

impl Default for KillAuraParams {
    fn default() -> Self {
        Self {
            max_angle: 60.0,
            min_switch_millis: 100,
        }
    }
}

impl CheckParams for KillAuraParams {
    fn validate(&self) -> Result<(), String> {
        positive("max-angle", self.max_angle)
    }
}

/// Fails on off-angle hits and impossibly fast target switches.
#[derive(Debug)]
pub struct KillAura {
    core: CheckCore<KillAuraParams>,
}

impl KillAura {
    /// Creates the check with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: CheckCore::new(
                CheckType::KillAura,
                CheckConfig::DEFAULT,
                KillAuraParams::default(),
            ),
        }
    }

    /// Judges one attack.
    #[must_use]
    pub fn evaluate(params: &KillAuraParams, input: &AttackContext<'_>) -> CheckResult {
        let movement = input.movement;
        let eye = movement.to.offset(0.0, EYE_HEIGHT, 0.0);
        let centre = input.attack.target_position.offset(0.0, TARGET_CENTRE, 0.0);
        let to_target = centre - eye;

        if to_target.length() > MIN_ANGLE_DISTANCE {
            let look = Vec3::from_rotation(movement.yaw, movement.pitch);
            let cos = look.dot(to_target.normalized()).clamp(-1.0, 1.0);
            let angle = cos.acos().to_degrees();
            if angle > params.max_angle {
                return CheckResult::fail("Hit a target outside the field of view.")
                    .with("angle", angle)
                    .with("max", params.max_angle);
            }
        }

        let combat = input.combat;
        if let (Some(last_target), Some(last_attack)) = (combat.last_target, combat.last_attack) {
            let gap = input.now.saturating_sub(last_attack);
            if last_target != input.attack.target && gap < params.min_switch_millis {
                return CheckResult::fail("Switched targets too quickly.")
                    .with("switch", gap)
                    .with("min", params.min_switch_millis);
            }
        }

        CheckResult::pass()
    }
}

impl Default for KillAura {
    fn default() -> Self {
        Self::new()
    }
}

impl Check for KillAura {
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
    use warden_shared::Attack;

    /// Attacker at the origin looking along +Z.
    fn judge(target: u64, target_position: Vec3, combat: CombatState, now: u64) -> CheckResult {
        let attack = Attack {
            target,
            target_position,
        };
        let movement = MovementState::default();
        KillAura::evaluate(
            &KillAuraParams::default(),
            &AttackContext {
                attack: &attack,
                movement: &movement,
                combat: &combat,
                now,
            },
        )
    }

    #[test]
    fn test_target_in_front_passes() {
        let result = judge(2, Vec3::new(0.0, 0.7, 3.0), CombatState::default(), 0);
        assert!(!result.failed());
    }

    #[test]
    fn test_target_behind_fails() {
        let result = judge(2, Vec3::new(0.0, 0.7, -3.0), CombatState::default(), 0);
        assert!(result.failed());
        assert!(result.parameter("angle").is_some());
    }

    #[test]
    fn test_fast_switch_fails() {
        let combat = CombatState {
            last_attack: Some(1_000),
            last_target: Some(2),
            ..CombatState::default()
        };
        let front = Vec3::new(0.0, 0.7, 3.0);

        let result = judge(3, front, combat, 1_050);
        assert!(result.failed());
        assert_eq!(result.information(), "switch=50, min=100");

        assert!(!judge(2, front, combat, 1_050).failed());
        assert!(!judge(3, front, combat, 1_200).failed());
    }
}
