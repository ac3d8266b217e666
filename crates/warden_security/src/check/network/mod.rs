//! # Network Rate Checks
//!
//! Once per second the tick scheduler sweeps every session:
//!
//! ```text
//! sample_and_reset(kind) ──► count > max? ──► escalate ──► cancel flag
//!                                  │
//!                                  └─► count >= kick threshold and nothing
//!                                      pending ──► immediate kick request
//! ```
//!
//! A bypassed or exempt participant's window is discarded unscored, so
//! packets counted during a grace period never land in a later window.

mod payload_frequency;
mod swing_frequency;

use std::sync::Arc;

use crate::check::{Check, CheckCore, CheckParams, CheckResult, CheckType};
use crate::config::CheckConfig;
use crate::context::Context;
use crate::scheduler::Task;
use crate::session::{PacketKind, Session};

pub use payload_frequency::PayloadFrequencyParams;
pub use swing_frequency::SwingFrequencyParams;

/// Too many arm swings per second.
pub type SwingFrequency = RateCheck<SwingFrequencyParams>;

/// Too many custom payloads per second.
pub type PayloadFrequency = RateCheck<PayloadFrequencyParams>;

/// Options every rate check exposes.
pub trait RateParams: CheckParams + Default {
    /// Counter this check reads.
    const KIND: PacketKind;
    /// Check identity.
    const CHECK: CheckType;
    /// Failure reason.
    const REASON: &'static str;

    /// Shared settings the check starts with.
    fn default_config() -> CheckConfig;
    /// Largest passing count per window.
    fn max_per_window(&self) -> u32;
    /// Count that requests an immediate kick.
    fn kick_threshold(&self) -> u32;
    /// Is the immediate kick enabled?
    fn kick_if_threshold_reached(&self) -> bool;
}

/// Fixed-window packet rate check.
#[derive(Debug)]
pub struct RateCheck<P> {
    core: Arc<CheckCore<P>>,
}

impl<P: RateParams> RateCheck<P> {
    /// Creates the check with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: Arc::new(CheckCore::new(P::CHECK, P::default_config(), P::default())),
        }
    }

    /// Judges one window's count.
    #[must_use]
    pub fn evaluate(params: &P, count: u32) -> CheckResult {
        let max = params.max_per_window();
        if count <= max {
            return CheckResult::pass();
        }
        CheckResult::fail(P::REASON)
            .with("count", count)
            .with("max", max)
    }

    /// Closes the current window for every session.
    pub fn sweep(core: &CheckCore<P>, ctx: &Context) {
        let snapshot = core.snapshot();
        for session in ctx.sessions.all() {
            Self::close_window(&snapshot.config, &snapshot.params, ctx, &session);
        }
    }

    fn close_window(config: &CheckConfig, params: &P, ctx: &Context, session: &Session) {
        let participant = session.id();
        let count = session.packets.sample_and_reset(P::KIND);

        if !config.enabled || ctx.should_skip(participant, P::CHECK) {
            session.packets.set_cancelled(P::KIND, false);
            return;
        }

        let result = Self::evaluate(params, count);
        if result.failed()
            && params.kick_if_threshold_reached()
            && count >= params.kick_threshold()
            && !ctx.punishments.has_pending(participant)
        {
            ctx.punishments.request_kick(participant, P::CHECK);
        }

        let decision = ctx.escalate(participant, P::CHECK, config, &result);
        session.packets.set_cancelled(P::KIND, decision.cancel);
    }
}

impl<P: RateParams> Default for RateCheck<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: RateParams> Check for RateCheck<P> {
    crate::check::delegate_to_core!();

    fn load(&self, ctx: &Arc<Context>) {
        let core = Arc::clone(&self.core);
        let weak = Arc::downgrade(ctx);
        let task: Task = Arc::new(move || {
            if let Some(ctx) = weak.upgrade() {
                Self::sweep(&core, &ctx);
            }
        });

        let period = u64::from(ctx.config().engine.tick_rate);
        let handle = ctx.scheduler().schedule_repeating(period, period, task);
        if let Some(previous) = self.core.replace_task(handle) {
            ctx.scheduler().cancel(previous);
        }
        tracing::debug!(check = %P::CHECK, period, "rate window scheduled");
    }

    fn unload(&self, ctx: &Context) {
        if let Some(handle) = self.core.take_task() {
            ctx.scheduler().cancel(handle);
            tracing::debug!(check = %P::CHECK, "rate window cancelled");
        }
    }
}
