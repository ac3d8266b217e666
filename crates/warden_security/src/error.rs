//! # Engine Error Types
//!
//! All errors that can surface from the detection engine.

use crate::check::CheckType;
use thiserror::Error;

/// Errors that can occur in the detection engine.
#[derive(Error, Debug)]
pub enum WardenError {
    /// A check type was looked up that was never registered.
    ///
    /// The set of types is fixed at startup, so this is a programming error.
    #[error("check not registered: {0}")]
    CheckNotFound(CheckType),

    /// The same check type was registered twice.
    #[error("check registered twice: {0}")]
    DuplicateCheck(CheckType),

    /// Configuration is missing, malformed or inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The host runs a protocol revision this engine does not understand.
    #[error("incompatible host protocol revision {revision}")]
    IncompatibleHost {
        /// Revision reported by the host.
        revision: u32,
    },
}

impl From<toml::de::Error> for WardenError {
    fn from(err: toml::de::Error) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}

/// Result type for engine operations.
pub type WardenResult<T> = Result<T, WardenError>;
