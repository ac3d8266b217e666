//! Attacks without an arm swing.

use serde::{Deserialize, Serialize};
use warden_shared::ParticipantId;

use super::AttackContext;
use crate::check::{Check, CheckCore, CheckParams, CheckResult, CheckType};
use crate::config::CheckConfig;
use crate::context::Context;
use crate::violation::ActionDecision;

/// `[checks.no-swing]` options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NoSwingParams {
    /// Longest gap between the last swing and the attack.
    pub max_swing_delay_ms: u64,
}

impl Default for NoSwingParams {
    fn default() -> Self {
        Self {
            max_swing_delay_ms: 150,
        }
    }
}

impl CheckParams for NoSwingParams {
    fn validate(&self) -> Result<(), String> {
        if self.max_swing_delay_ms == 0 {
            return Err("max-swing-delay-ms must be positive".to_owned());
        }
        Ok(())
    }
}

/// Fails when an attack was not preceded by a recent swing.
#[derive(Debug)]
pub struct NoSwing {
    core: CheckCore<NoSwingParams>,
}

impl NoSwing {
    /// Creates the check with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: CheckCore::new(
                CheckType::NoSwing,
                CheckConfig::DEFAULT,
                NoSwingParams::default(),
            ),
        }
    }

    /// Judges one attack.
    #[must_use]
    pub fn evaluate(params: &NoSwingParams, input: &AttackContext<'_>) -> CheckResult {
        match input.combat.last_swing {
            Some(swing) => {
                let delay = input.now.saturating_sub(swing);
                if delay <= params.max_swing_delay_ms {
                    return CheckResult::pass();
                }
                CheckResult::fail("Attacked without swinging.")
                    .with("delay", delay)
                    .with("max", params.max_swing_delay_ms)
            }
            None => CheckResult::fail("Attacked without ever swinging.")
                .with("delay", "none")
                .with("max", params.max_swing_delay_ms),
        }
    }
}

impl Default for NoSwing {
    fn default() -> Self {
        Self::new()
    }
}

impl Check for NoSwing {
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

    fn judge(last_swing: Option<u64>, now: u64) -> CheckResult {
        let attack = Attack {
            target: 2,
            target_position: Vec3::ZERO,
        };
        let movement = MovementState::default();
        let combat = CombatState {
            last_swing,
            ..CombatState::default()
        };
        NoSwing::evaluate(
            &NoSwingParams::default(),
            &AttackContext {
                attack: &attack,
                movement: &movement,
                combat: &combat,
                now,
            },
        )
    }

    #[test]
    fn test_recent_swing_passes() {
        assert!(!judge(Some(1_000), 1_050).failed());
    }

    #[test]
    fn test_stale_swing_fails() {
        let result = judge(Some(1_000), 1_400);
        assert!(result.failed());
        assert_eq!(result.information(), "delay=400, max=150");
    }

    #[test]
    fn test_no_swing_at_all_fails() {
        assert!(judge(None, 5).failed());
    }
}
