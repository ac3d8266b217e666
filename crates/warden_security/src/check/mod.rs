//! # Checks
//!
//! Units of detection logic, one per [`CheckType`].
//!
//! ## Evaluation path
//!
//! ```text
//! event ──► enabled? ──► bypass? ──► exempt? ──► evaluate ──► escalate
//!              │            │           │
//!              └────────────┴───────────┴──► skipped, score untouched
//! ```
//!
//! Configuration lives in an `Arc<Snapshot>` behind a lock. Evaluation
//! clones the `Arc` once and reads only from it, so a reload racing an
//! evaluation is observed entirely or not at all.

pub mod combat;
pub mod moving;
pub mod network;
pub mod player;
pub mod registry;
mod result;
mod types;

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use warden_shared::ParticipantId;

use crate::config::{resolve_section, CheckConfig, WardenConfig};
use crate::context::Context;
use crate::error::{WardenError, WardenResult};
use crate::scheduler::TaskHandle;
use crate::session::MovementState;
use crate::violation::ActionDecision;

pub use combat::AttackContext;
pub use registry::CheckRegistry;
pub use result::{CheckResult, ParamValue};
pub use types::{CheckCategory, CheckType};

/// A detector.
///
/// Event hooks return `None` when the check did not run (disabled, bypassed,
/// exempt, or not interested in the event).
pub trait Check: Send + Sync {
    /// Which detector this is.
    fn check_type(&self) -> CheckType;

    /// Resolves `config` without installing it.
    fn validate(&self, config: &WardenConfig) -> WardenResult<()>;

    /// Resolves and installs `config` as the new snapshot.
    fn reload(&self, config: &WardenConfig) -> WardenResult<()>;

    /// Is the installed snapshot enabled?
    fn is_enabled(&self) -> bool;

    /// Starts periodic work, if any.
    fn load(&self, _ctx: &Arc<Context>) {}

    /// Stops periodic work. Idempotent.
    fn unload(&self, _ctx: &Context) {}

    /// A position update was aggregated into `movement`.
    fn on_movement(
        &self,
        _ctx: &Context,
        _participant: ParticipantId,
        _movement: &MovementState,
    ) -> Option<ActionDecision> {
        None
    }

    /// The participant attacked something.
    fn on_attack(
        &self,
        _ctx: &Context,
        _participant: ParticipantId,
        _attack: &AttackContext<'_>,
    ) -> Option<ActionDecision> {
        None
    }

    /// The participant finished consuming an item.
    fn on_consume(
        &self,
        _ctx: &Context,
        _participant: ParticipantId,
        _started: u64,
        _finished: u64,
    ) -> Option<ActionDecision> {
        None
    }
}

/// Check-specific options stored next to the shared [`CheckConfig`].
pub trait CheckParams:
    Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Rejects values that can never work.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Options for checks that only use the shared settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct NoParams {}

impl CheckParams for NoParams {}

/// Requires `value > 0`.
pub(crate) fn positive(name: &str, value: f64) -> Result<(), String> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(format!("{name} must be positive, got {value}"))
    }
}

/// One immutable configuration version.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot<P> {
    /// Shared escalation settings.
    pub config: CheckConfig,
    /// Check-specific options.
    pub params: P,
}

/// State every check carries: identity, configuration snapshot and the
/// optional periodic task.
#[derive(Debug)]
pub struct CheckCore<P> {
    check_type: CheckType,
    defaults: Snapshot<P>,
    current: RwLock<Arc<Snapshot<P>>>,
    task: Mutex<Option<TaskHandle>>,
}

impl<P: CheckParams> CheckCore<P> {
    /// Creates a core whose snapshot starts at the defaults.
    #[must_use]
    pub fn new(check_type: CheckType, config: CheckConfig, params: P) -> Self {
        let defaults = Snapshot { config, params };
        Self {
            check_type,
            current: RwLock::new(Arc::new(defaults.clone())),
            defaults,
            task: Mutex::new(None),
        }
    }

    /// Which detector this is.
    #[must_use]
    pub const fn check_type(&self) -> CheckType {
        self.check_type
    }

    /// The installed snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot<P>> {
        Arc::clone(&self.current.read())
    }

    /// Builds the snapshot `config` describes, without installing it.
    pub fn resolve(&self, config: &WardenConfig) -> WardenResult<Snapshot<P>> {
        let (check_config, params) = resolve_section(
            self.check_type,
            config.check_section(self.check_type),
            &self.defaults.config,
            &self.defaults.params,
        )?;
        check_config.validate(self.check_type)?;
        params.validate().map_err(|message| {
            WardenError::InvalidConfig(format!("[checks.{}] {message}", self.check_type.name()))
        })?;
        Ok(Snapshot {
            config: check_config,
            params,
        })
    }

    /// Resolves and swaps in a new snapshot.
    pub fn reload(&self, config: &WardenConfig) -> WardenResult<()> {
        let snapshot = self.resolve(config)?;
        *self.current.write() = Arc::new(snapshot);
        tracing::debug!(check = %self.check_type, "configuration reloaded");
        Ok(())
    }

    /// Remembers the periodic task, returning any previous one.
    pub fn replace_task(&self, handle: TaskHandle) -> Option<TaskHandle> {
        self.task.lock().replace(handle)
    }

    /// Takes the periodic task so it is cancelled exactly once.
    pub fn take_task(&self) -> Option<TaskHandle> {
        self.task.lock().take()
    }

    /// Runs the shared gates, then `evaluate`, then escalation.
    pub fn run(
        &self,
        ctx: &Context,
        participant: ParticipantId,
        evaluate: impl FnOnce(&Snapshot<P>) -> CheckResult,
    ) -> Option<ActionDecision> {
        let snapshot = self.snapshot();
        if !snapshot.config.enabled || ctx.should_skip(participant, self.check_type) {
            return None;
        }
        let result = evaluate(&snapshot);
        Some(ctx.escalate(participant, self.check_type, &snapshot.config, &result))
    }
}

/// Implements the configuration half of [`Check`] by delegating to a
/// `core: CheckCore<_>` field.
macro_rules! delegate_to_core {
    () => {
        fn check_type(&self) -> $crate::check::CheckType {
            self.core.check_type()
        }

        fn validate(
            &self,
            config: &$crate::config::WardenConfig,
        ) -> $crate::error::WardenResult<()> {
            self.core.resolve(config).map(drop)
        }

        fn reload(
            &self,
            config: &$crate::config::WardenConfig,
        ) -> $crate::error::WardenResult<()> {
            self.core.reload(config)
        }

        fn is_enabled(&self) -> bool {
            self.core.snapshot().config.enabled
        }
    };
}

pub(crate) use delegate_to_core;

/// One instance of every check, in [`CheckType::ALL`] order.
#[must_use]
pub fn all_checks() -> Vec<Arc<dyn Check>> {
    vec![
        Arc::new(moving::NoFall::new()),
        Arc::new(moving::Flight::new()),
        Arc::new(moving::Speed::new()),
        Arc::new(combat::Criticals::new()),
        Arc::new(combat::Reach::new()),
        Arc::new(combat::NoSwing::new()),
        Arc::new(combat::KillAura::new()),
        Arc::new(network::SwingFrequency::new()),
        Arc::new(network::PayloadFrequency::new()),
        Arc::new(player::FastUse::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    struct Limit {
        max: f64,
    }

    impl CheckParams for Limit {
        fn validate(&self) -> Result<(), String> {
            positive("max", self.max)
        }
    }

    fn core() -> CheckCore<Limit> {
        CheckCore::new(CheckType::Reach, CheckConfig::DEFAULT, Limit { max: 3.0 })
    }

    #[test]
    fn test_reload_swaps_whole_snapshot() {
        let core = core();
        let before = core.snapshot();
        let config = WardenConfig::from_toml_str("[checks.reach]\nmax = 4.5\nkick = true").unwrap();
        core.reload(&config).unwrap();

        let after = core.snapshot();
        assert!((before.params.max - 3.0).abs() < f64::EPSILON);
        assert!(!before.config.kick);
        assert!((after.params.max - 4.5).abs() < f64::EPSILON);
        assert!(after.config.kick);
    }

    #[test]
    fn test_failed_reload_keeps_old_snapshot() {
        let core = core();
        let config = WardenConfig::from_toml_str("[checks.reach]\nmax = -1.0").unwrap();
        assert!(matches!(
            core.reload(&config),
            Err(WardenError::InvalidConfig(_))
        ));
        assert!((core.snapshot().params.max - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_section_restores_defaults() {
        let core = core();
        core.reload(&WardenConfig::from_toml_str("[checks.reach]\nmax = 9.0").unwrap())
            .unwrap();
        core.reload(&WardenConfig::default()).unwrap();
        assert!((core.snapshot().params.max - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_all_checks_cover_every_type() {
        let types: Vec<CheckType> = all_checks().iter().map(|check| check.check_type()).collect();
        assert_eq!(types, CheckType::ALL);
    }
}
