//! # Movement Checks
//!
//! Evaluated after every position update, against the freshly aggregated
//! [`MovementState`](crate::session::MovementState).

mod flight;
mod no_fall;
mod speed;

pub use flight::{Flight, FlightParams};
pub use no_fall::NoFall;
pub use speed::{Speed, SpeedParams};
