//! # Engine Constants
//!
//! Defaults and permission nodes shared by the host and the engine.
//!
//! Tick rate and thresholds here are defaults only; the engine reads the
//! live values from its configuration snapshot.

// =============================================================================
// TICK CONFIGURATION
// =============================================================================

/// Default host tick rate (ticks per second).
pub const TICK_RATE: u32 = 20;

/// Milliseconds per tick at the default tick rate.
pub const MILLIS_PER_TICK: u64 = 1000 / TICK_RATE as u64;

/// Expected maximum concurrent participants (used for map pre-sizing).
pub const MAX_PARTICIPANTS: usize = 500;

// =============================================================================
// PERMISSION NODES
// =============================================================================

/// Receive violation notifications.
pub const PERMISSION_VIOLATIONS: &str = "warden.violations";

/// Bypass every check. Category and check nodes hang below this one:
/// `warden.bypass.<category>` and `warden.bypass.<category>.<check>`.
pub const PERMISSION_BYPASS: &str = "warden.bypass";
