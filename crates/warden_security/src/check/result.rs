//! Outcome of a single evaluation.

use std::fmt;

/// A diagnostic parameter value.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    /// Whole number.
    Int(i64),
    /// Real number.
    Float(f64),
    /// Flag.
    Bool(bool),
    /// Free text.
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:.3}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u64> for ParamValue {
    fn from(v: u64) -> Self {
        Self::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

/// Verdict of one check evaluation with ordered diagnostics.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CheckResult {
    failed: bool,
    reason: String,
    parameters: Vec<(&'static str, ParamValue)>,
}

impl CheckResult {
    /// A passing result.
    #[must_use]
    pub fn pass() -> Self {
        Self::default()
    }

    /// A failing result with a human-readable reason.
    #[must_use]
    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            failed: true,
            reason: reason.into(),
            parameters: Vec::new(),
        }
    }

    /// Appends a diagnostic parameter.
    #[must_use]
    pub fn with(mut self, name: &'static str, value: impl Into<ParamValue>) -> Self {
        self.parameters.push((name, value.into()));
        self
    }

    /// Did the check fail?
    #[must_use]
    pub const fn failed(&self) -> bool {
        self.failed
    }

    /// Why it failed (empty when passing).
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Diagnostics in insertion order.
    #[must_use]
    pub fn parameters(&self) -> &[(&'static str, ParamValue)] {
        &self.parameters
    }

    /// Looks up one parameter.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ParamValue> {
        self.parameters
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    /// `name=value` pairs joined by commas.
    #[must_use]
    pub fn information(&self) -> String {
        self.parameters
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_information_keeps_order() {
        let result = CheckResult::fail("Too many swing packets per second.")
            .with("count", 51_u32)
            .with("max", 50_u32);
        assert!(result.failed());
        assert_eq!(result.information(), "count=51, max=50");
        assert_eq!(result.parameter("max"), Some(&ParamValue::Int(50)));
    }

    #[test]
    fn test_float_formatting() {
        let result = CheckResult::fail("fast").with("distance", 0.5_f64);
        assert_eq!(result.information(), "distance=0.500");
    }

    #[test]
    fn test_pass_is_empty() {
        let result = CheckResult::pass();
        assert!(!result.failed());
        assert!(result.reason().is_empty());
        assert!(result.information().is_empty());
    }
}
