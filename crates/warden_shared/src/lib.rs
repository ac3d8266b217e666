//! # Warden Shared
//!
//! Common types used by both the host game server and the detection engine.
//!
//! ## CRITICAL RULE
//!
//! This crate holds vocabulary only:
//! - positions and block coordinates
//! - participant identity
//! - the inbound event stream
//!
//! Anything that evaluates behavior belongs in `warden_security`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod events;
pub mod math;

pub use constants::{
    MAX_PARTICIPANTS, MILLIS_PER_TICK, PERMISSION_BYPASS, PERMISSION_VIOLATIONS, TICK_RATE,
};
pub use events::{Attack, Location, Movement, ParticipantEvent, ParticipantId};
pub use math::{BlockPos, Vec3};
