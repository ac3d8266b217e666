//! Eating and drinking faster than the animation allows.

use serde::{Deserialize, Serialize};
use warden_shared::ParticipantId;

use crate::check::{Check, CheckCore, CheckParams, CheckResult, CheckType};
use crate::config::CheckConfig;
use crate::context::Context;
use crate::violation::ActionDecision;

/// `[checks.fast-use]` options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FastUseParams {
    /// Shortest legitimate consume duration. Vanilla food takes 1600 ms.
    pub min_consume_millis: u64,
}

impl Default for FastUseParams {
    fn default() -> Self {
        Self {
            min_consume_millis: 1_400,
        }
    }
}

impl CheckParams for FastUseParams {
    fn validate(&self) -> Result<(), String> {
        if self.min_consume_millis == 0 {
            return Err("min-consume-millis must be positive".to_owned());
        }
        Ok(())
    }
}

/// Fails when a consume finishes too soon after it started.
#[derive(Debug)]
pub struct FastUse {
    core: CheckCore<FastUseParams>,
}

impl FastUse {
    /// Creates the check with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: CheckCore::new(
                CheckType::FastUse,
                CheckConfig::DEFAULT,
                FastUseParams::default(),
            ),
        }
    }

    /// Judges one finished consume.
    #[must_use]
    pub fn evaluate(params: &FastUseParams, started: u64, finished: u64) -> CheckResult {
        let took = finished.saturating_sub(started);
        if took >= params.min_consume_millis {
            return CheckResult::pass();
        }
        CheckResult::fail("Consumed an item too quickly.")
            .with("took", took)
            .with("min", params.min_consume_millis)
    }
}

impl Default for FastUse {
    fn default() -> Self {
        Self::new()
    }
}

impl Check for FastUse {
    crate::check::delegate_to_core!();

    fn on_consume(
        &self,
        ctx: &Context,
        participant: ParticipantId,
        started: u64,
        finished: u64,
    ) -> Option<ActionDecision> {
        self.core.run(ctx, participant, |snapshot| {
            Self::evaluate(&snapshot.params, started, finished)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_meal_passes() {
        assert!(!FastUse::evaluate(&FastUseParams::default(), 1_000, 2_600).failed());
    }

    #[test]
    fn test_instant_meal_fails() {
        let result = FastUse::evaluate(&FastUseParams::default(), 1_000, 1_200);
        assert!(result.failed());
        assert_eq!(result.information(), "took=200, min=1400");
    }
}
