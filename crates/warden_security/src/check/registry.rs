//! Owns every check instance, one per type.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::check::{Check, CheckType};
use crate::config::WardenConfig;
use crate::context::Context;
use crate::error::{WardenError, WardenResult};

/// The set of registered checks.
#[derive(Default)]
pub struct CheckRegistry {
    checks: BTreeMap<CheckType, Arc<dyn Check>>,
}

impl CheckRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a check. A second instance of the same type is an error.
    pub fn register(&mut self, check: Arc<dyn Check>) -> WardenResult<()> {
        let check_type = check.check_type();
        if self.checks.contains_key(&check_type) {
            return Err(WardenError::DuplicateCheck(check_type));
        }
        self.checks.insert(check_type, check);
        Ok(())
    }

    /// The instance for `check_type`.
    pub fn lookup(&self, check_type: CheckType) -> WardenResult<&Arc<dyn Check>> {
        self.checks
            .get(&check_type)
            .ok_or(WardenError::CheckNotFound(check_type))
    }

    /// Registered checks in type order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Check>> {
        self.checks.values()
    }

    /// Number of registered checks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Nothing registered?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Validates `config` against every check, then installs it in every
    /// check. Nothing is swapped if any check rejects it.
    pub fn reload_all(&self, config: &WardenConfig) -> WardenResult<()> {
        for check in self.checks.values() {
            check.validate(config)?;
        }
        for check in self.checks.values() {
            check.reload(config)?;
        }
        tracing::info!(checks = self.checks.len(), "checks reloaded");
        Ok(())
    }

    /// Starts periodic work for every check.
    pub fn load_all(&self, ctx: &Arc<Context>) {
        for check in self.checks.values() {
            check.load(ctx);
        }
    }

    /// Unloads every check, drops their scores and empties the registry.
    pub fn close_all(&mut self, ctx: &Context) {
        for (check_type, check) in &self.checks {
            check.unload(ctx);
            ctx.violations.clear_check(*check_type);
            ctx.exemptions.clear_check(*check_type);
        }
        self.checks.clear();
    }
}

impl std::fmt::Debug for CheckRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.checks.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::all_checks;
    use crate::check::moving::Speed;

    fn registry() -> CheckRegistry {
        let mut registry = CheckRegistry::new();
        for check in all_checks() {
            registry.register(check).unwrap();
        }
        registry
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = registry();
        let err = registry.register(Arc::new(Speed::new())).unwrap_err();
        assert!(matches!(err, WardenError::DuplicateCheck(CheckType::Speed)));
        assert_eq!(registry.len(), CheckType::ALL.len());
    }

    #[test]
    fn test_lookup_unregistered() {
        let registry = CheckRegistry::new();
        assert!(matches!(
            registry.lookup(CheckType::Reach),
            Err(WardenError::CheckNotFound(CheckType::Reach))
        ));
    }

    #[test]
    fn test_reload_is_all_or_nothing() {
        let registry = registry();
        let config = WardenConfig::from_toml_str(
            r#"
            [checks.speed]
            enabled = false

            [checks.reach]
            max-reach = 0.0
            "#,
        )
        .unwrap();
        assert!(registry.reload_all(&config).is_err());
        assert!(registry.lookup(CheckType::Speed).unwrap().is_enabled());

        let config = WardenConfig::from_toml_str("[checks.speed]\nenabled = false").unwrap();
        registry.reload_all(&config).unwrap();
        assert!(!registry.lookup(CheckType::Speed).unwrap().is_enabled());
    }
}
