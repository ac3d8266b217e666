//! # Warden Security - The Detection Engine
//!
//! Server-side anomaly detection and escalation for multiplayer game hosts.
//!
//! ## Features
//!
//! - **Environment Estimator**: ground / ice / liquid / climbable sampling
//! - **Aggregators**: per-participant movement, packet rate and combat state
//! - **Checks**: movement, combat, network and player-state detectors
//! - **Escalation**: violation scoring with notify / cancel / kick / ban
//! - **Exemptions**: timed and indefinite suppression, bypass permissions
//!
//! ## Architecture
//!
//! ```text
//! HOST EVENTS                                   HOST TICK
//!     │                                             │
//!     ▼                                             ▼
//! ┌──────────┐   ┌────────┐   ┌────────────┐   ┌─────────────┐
//! │ Sessions │──►│ Checks │──►│ Violations │──►│ Punishments │──► Host
//! └──────────┘   └────────┘   └────────────┘   └─────────────┘
//!                    ▲              │
//!               Exemptions          └──► notification outbox ──► staff
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod check;
pub mod clock;
pub mod config;
pub mod context;
pub mod engine;
pub mod environment;
pub mod error;
pub mod exemption;
pub mod host;
pub mod punishment;
pub mod scheduler;
pub mod session;
pub mod testing;
pub mod violation;

pub use check::{Check, CheckCategory, CheckRegistry, CheckResult, CheckType, ParamValue};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CheckConfig, WardenConfig};
pub use context::Context;
pub use engine::{Engine, TickReport};
pub use environment::Environment;
pub use error::{WardenError, WardenResult};
pub use exemption::{ExemptionKind, ExemptionLedger};
pub use host::{BlockInfo, Host, HostCapabilities, HostProfile, WorldQuery};
pub use punishment::{PendingPunishment, PunishmentExecutor, PunishmentKind};
pub use scheduler::{Scheduler, TickScheduler};
pub use session::{MovementState, Session, SessionRegistry};
pub use violation::{ActionDecision, Notification, ViolationLedger};
