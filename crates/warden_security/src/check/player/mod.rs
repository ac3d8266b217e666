//! # Player State Checks

mod fast_use;

pub use fast_use::{FastUse, FastUseParams};
