//! # Configuration
//!
//! TOML configuration with kebab-case keys. Every key has a default, so an
//! empty file is a valid configuration.
//!
//! ```toml
//! [engine]
//! tick-rate = 20
//!
//! [violations]
//! decay-interval-ms = 30000
//!
//! [checks.swing-frequency]
//! max-packets-per-second = 50
//! kick-if-threshold-reached = true
//! ```
//!
//! Per-check sections are kept as raw tables here and resolved by each check
//! against its own defaults, so a new check never touches this file.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::check::CheckType;
use crate::error::{WardenError, WardenResult};

// ============================================================================
// TOP LEVEL
// ============================================================================

/// Complete engine configuration.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct WardenConfig {
    /// Engine-wide settings.
    pub engine: EngineConfig,
    /// Scoring and notification settings.
    pub violations: ViolationConfig,
    /// Kick settings.
    pub kick: KickConfig,
    /// Ban settings.
    pub ban: BanConfig,
    /// Automatic exemptions.
    pub exemptions: ExemptionConfig,
    /// Raw per-check sections keyed by check name.
    pub checks: BTreeMap<String, toml::Table>,
}

impl WardenConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> WardenResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> WardenResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Checks the engine-wide settings.
    ///
    /// Per-check sections are validated by the checks themselves during
    /// reload.
    pub fn validate(&self) -> WardenResult<()> {
        if self.engine.tick_rate == 0 {
            return Err(invalid("engine.tick-rate must be positive"));
        }
        if self.engine.notification_capacity == 0 {
            return Err(invalid("engine.notification-capacity must be positive"));
        }
        if self.violations.decay_interval_ms > 0 && self.violations.decay_amount == 0 {
            return Err(invalid(
                "violations.decay-amount must be positive when decay is enabled",
            ));
        }
        if let Some(name) = self
            .checks
            .keys()
            .find(|name| CheckType::from_name(name).is_none())
        {
            return Err(invalid(format!("unknown check section [checks.{name}]")));
        }
        Ok(())
    }

    /// Raw section for one check, if present.
    #[must_use]
    pub fn check_section(&self, check: CheckType) -> Option<&toml::Table> {
        self.checks.get(check.name())
    }

    /// Ban duration, `None` for permanent.
    #[must_use]
    pub fn ban_duration(&self) -> Option<Duration> {
        match self.ban.duration_days {
            0 => None,
            days => Some(Duration::from_secs(days.saturating_mul(86_400))),
        }
    }
}

/// `[engine]`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct EngineConfig {
    /// Host ticks per second.
    pub tick_rate: u32,
    /// Bounded size of the notification outbox.
    pub notification_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_rate: warden_shared::TICK_RATE,
            notification_capacity: 1024,
        }
    }
}

/// `[violations]`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ViolationConfig {
    /// Staff notification template.
    ///
    /// Placeholders: `%player%`, `%check%`, `%level%`, `%info%`.
    pub notify_message: String,
    /// One decay step per this many milliseconds without a change. Zero
    /// disables decay.
    pub decay_interval_ms: u64,
    /// Score removed per decay step.
    pub decay_amount: u32,
}

impl Default for ViolationConfig {
    fn default() -> Self {
        Self {
            notify_message: "[Warden] %player% failed %check% (x%level%) %info%".to_owned(),
            decay_interval_ms: 30_000,
            decay_amount: 1,
        }
    }
}

/// `[kick]`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct KickConfig {
    /// Reason shown to the kicked participant. Supports `%check%`.
    pub message: String,
    /// Ticks between request and execution.
    pub delay_ticks: u64,
}

impl Default for KickConfig {
    fn default() -> Self {
        Self {
            message: "Kicked by Warden (%check%)".to_owned(),
            delay_ticks: 40,
        }
    }
}

/// `[ban]`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct BanConfig {
    /// Reason shown to the banned participant. Supports `%check%`.
    pub message: String,
    /// Ticks between request and execution.
    pub delay_ticks: u64,
    /// Ban length in days, 0 for permanent.
    pub duration_days: u64,
    /// Announce bans to everyone online.
    pub broadcast: bool,
    /// Announcement template. Supports `%player%` and `%check%`.
    pub broadcast_message: String,
}

impl Default for BanConfig {
    fn default() -> Self {
        Self {
            message: "Banned by Warden (%check%)".to_owned(),
            delay_ticks: 100,
            duration_days: 30,
            broadcast: true,
            broadcast_message: "[Warden] %player% was removed for cheating.".to_owned(),
        }
    }
}

/// `[exemptions]`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ExemptionConfig {
    /// Grace period after join during which no check runs.
    pub join_millis: u64,
}

impl Default for ExemptionConfig {
    fn default() -> Self {
        Self { join_millis: 2_000 }
    }
}

// ============================================================================
// PER-CHECK
// ============================================================================

/// Escalation settings shared by every check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CheckConfig {
    /// Check runs at all.
    pub enabled: bool,
    /// Cancel the offending action.
    pub cancel: bool,
    /// Score at which cancelling starts.
    pub cancel_level: u32,
    /// Notify staff.
    pub notify: bool,
    /// Notify when the score is a multiple of this.
    pub notify_every: u32,
    /// Kick at `kick_level`.
    pub kick: bool,
    /// Score that requests a kick.
    pub kick_level: u32,
    /// Ban at `ban_level`.
    pub ban: bool,
    /// Score that requests a ban.
    pub ban_level: u32,
}

impl CheckConfig {
    /// Baseline most checks start from.
    pub const DEFAULT: Self = Self {
        enabled: true,
        cancel: true,
        cancel_level: 1,
        notify: true,
        notify_every: 1,
        kick: false,
        kick_level: 20,
        ban: false,
        ban_level: 50,
    };

    /// Rejects settings that can never behave sensibly.
    pub fn validate(&self, check: CheckType) -> WardenResult<()> {
        if self.notify && self.notify_every == 0 {
            return Err(invalid(format!(
                "[checks.{}] notify-every must be positive when notify is enabled",
                check.name()
            )));
        }
        if self.kick && self.kick_level == 0 {
            return Err(invalid(format!(
                "[checks.{}] kick-level must be positive",
                check.name()
            )));
        }
        if self.ban && self.ban_level == 0 {
            return Err(invalid(format!(
                "[checks.{}] ban-level must be positive",
                check.name()
            )));
        }
        Ok(())
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Overlays a raw section onto a check's defaults and deserializes both the
/// shared settings and the check's own parameters from the result.
///
/// Keys the check does not know are rejected, so typos fail at load time
/// instead of silently falling back to a default.
pub fn resolve_section<P>(
    check: CheckType,
    section: Option<&toml::Table>,
    base: &CheckConfig,
    params: &P,
) -> WardenResult<(CheckConfig, P)>
where
    P: Serialize + DeserializeOwned,
{
    let mut merged = to_table(check, base)?;
    merged.extend(to_table(check, params)?);

    if let Some(section) = section {
        for (key, value) in section {
            if !merged.contains_key(key) {
                return Err(invalid(format!(
                    "unknown key `{key}` in [checks.{}]",
                    check.name()
                )));
            }
            merged.insert(key.clone(), value.clone());
        }
    }

    let merged = toml::Value::Table(merged);
    let config: CheckConfig = merged
        .clone()
        .try_into()
        .map_err(|err| invalid(format!("[checks.{}] {err}", check.name())))?;
    let params: P = merged
        .try_into()
        .map_err(|err| invalid(format!("[checks.{}] {err}", check.name())))?;
    Ok((config, params))
}

fn to_table<T: Serialize>(check: CheckType, value: &T) -> WardenResult<toml::Table> {
    match toml::Value::try_from(value) {
        Ok(toml::Value::Table(table)) => Ok(table),
        Ok(_) => Err(invalid(format!(
            "[checks.{}] defaults are not a table",
            check.name()
        ))),
        Err(err) => Err(invalid(format!("[checks.{}] {err}", check.name()))),
    }
}

fn invalid(message: impl Into<String>) -> WardenError {
    WardenError::InvalidConfig(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    struct Limits {
        max_reach: f64,
        strict: bool,
    }

    const LIMITS: Limits = Limits {
        max_reach: 3.4,
        strict: false,
    };

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = WardenConfig::from_toml_str("").unwrap();
        assert_eq!(config, WardenConfig::default());
        assert_eq!(config.engine.tick_rate, 20);
        assert_eq!(config.ban_duration(), Some(Duration::from_secs(30 * 86_400)));
    }

    #[test]
    fn test_sections_override_defaults() {
        let config = WardenConfig::from_toml_str(
            r#"
            [kick]
            delay-ticks = 5

            [ban]
            duration-days = 0

            [checks.reach]
            max-reach = 4.0
            "#,
        )
        .unwrap();
        assert_eq!(config.kick.delay_ticks, 5);
        assert_eq!(config.kick.message, KickConfig::default().message);
        assert_eq!(config.ban_duration(), None);
        assert!(config.check_section(CheckType::Reach).is_some());
    }

    #[test]
    fn test_zero_tick_rate_rejected() {
        let err = WardenConfig::from_toml_str("[engine]\ntick-rate = 0").unwrap_err();
        assert!(matches!(err, WardenError::InvalidConfig(_)));
    }

    #[test]
    fn test_unknown_check_section_rejected() {
        let err = WardenConfig::from_toml_str("[checks.wallhack]\nenabled = true").unwrap_err();
        assert!(matches!(err, WardenError::InvalidConfig(_)));
    }

    #[test]
    fn test_malformed_value_rejected() {
        let err = WardenConfig::from_toml_str("[kick]\ndelay-ticks = \"soon\"").unwrap_err();
        assert!(matches!(err, WardenError::InvalidConfig(_)));
    }

    #[test]
    fn test_resolve_overlays_section() {
        let section: toml::Table = toml::from_str("max-reach = 4\nkick = true").unwrap();
        let (config, limits) =
            resolve_section(CheckType::Reach, Some(&section), &CheckConfig::DEFAULT, &LIMITS)
                .unwrap();
        assert!(config.kick);
        assert_eq!(config.ban_level, CheckConfig::DEFAULT.ban_level);
        assert!((limits.max_reach - 4.0).abs() < f64::EPSILON);
        assert!(!limits.strict);
    }

    #[test]
    fn test_resolve_missing_section_is_defaults() {
        let (config, limits) =
            resolve_section(CheckType::Reach, None, &CheckConfig::DEFAULT, &LIMITS).unwrap();
        assert_eq!(config, CheckConfig::DEFAULT);
        assert_eq!(limits, LIMITS);
    }

    #[test]
    fn test_resolve_rejects_typos_and_bad_types() {
        let typo: toml::Table = toml::from_str("max-reatch = 4.0").unwrap();
        assert!(resolve_section(CheckType::Reach, Some(&typo), &CheckConfig::DEFAULT, &LIMITS)
            .is_err());

        let wrong: toml::Table = toml::from_str("strict = 3").unwrap();
        assert!(resolve_section(CheckType::Reach, Some(&wrong), &CheckConfig::DEFAULT, &LIMITS)
            .is_err());
    }

    #[test]
    fn test_notify_every_zero_rejected() {
        let config = CheckConfig {
            notify_every: 0,
            ..CheckConfig::DEFAULT
        };
        assert!(config.validate(CheckType::Speed).is_err());
        let silent = CheckConfig {
            notify: false,
            ..config
        };
        assert!(silent.validate(CheckType::Speed).is_ok());
    }
}
