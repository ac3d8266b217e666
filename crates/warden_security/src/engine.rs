//! # Detection Engine
//!
//! The host-facing entry point.
//!
//! ```text
//! HOST EVENT THREADS                          HOST TICK THREAD
//!     │                                             │
//!     │── on_join / on_leave ──► sessions           │── tick()
//!     │── on_movement ─────────► aggregate ──┐      │     ├─ rate windows
//!     │── on_attack ───────────► checks ◄────┘      │     ├─ punishments
//!     │── on_swing / payload ──► counters           │     └─ notifications
//!     │                                             │
//! ```
//!
//! Event handlers return `true` when the host should cancel the action.

use std::sync::Arc;
use std::time::Duration;

use warden_shared::{Attack, Location, Movement, ParticipantEvent, ParticipantId};

use crate::check::{all_checks, AttackContext, Check, CheckRegistry, CheckType};
use crate::clock::Clock;
use crate::config::WardenConfig;
use crate::context::Context;
use crate::error::WardenResult;
use crate::exemption::ExemptionKind;
use crate::host::{Host, WorldQuery};
use crate::session::{MovementState, PacketKind};
use crate::violation::ActionDecision;

/// What one call to [`Engine::tick`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number after advancing.
    pub tick: u64,
    /// Punishments executed (or dropped because the participant left).
    pub punishments: usize,
    /// Notifications drained from the outbox.
    pub notifications: usize,
}

/// The anomaly detection engine.
pub struct Engine {
    ctx: Arc<Context>,
    registry: CheckRegistry,
}

impl Engine {
    /// Negotiates with the host, registers every check and applies `config`.
    pub fn new(
        host: Arc<dyn Host>,
        world: Arc<dyn WorldQuery>,
        clock: Arc<dyn Clock>,
        config: WardenConfig,
    ) -> WardenResult<Self> {
        let ctx = Arc::new(Context::new(host, world, clock, config)?);

        let mut registry = CheckRegistry::new();
        for check in all_checks() {
            registry.register(check)?;
        }
        registry.reload_all(&ctx.config())?;
        registry.load_all(&ctx);

        tracing::info!(
            checks = registry.len(),
            revision = ctx.profile().revision,
            "detection engine started"
        );
        Ok(Self { ctx, registry })
    }

    /// Shared state.
    #[must_use]
    pub const fn context(&self) -> &Arc<Context> {
        &self.ctx
    }

    /// Registered checks.
    #[must_use]
    pub const fn registry(&self) -> &CheckRegistry {
        &self.registry
    }

    /// The check instance for `check_type`.
    pub fn check(&self, check_type: CheckType) -> WardenResult<&Arc<dyn Check>> {
        self.registry.lookup(check_type)
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Creates per-participant state at `spawn` and starts the join grace
    /// period.
    pub fn on_join(&self, participant: ParticipantId, spawn: Location) {
        let session = self.ctx.sessions.create(participant);
        *session.movement.lock() =
            MovementState::at_rest(&self.ctx.environment(), &spawn, self.ctx.now());
        self.ctx.violations.on_join(participant);
        self.ctx.exemptions.clear(participant);

        let grace = self.ctx.config().exemptions.join_millis;
        if grace > 0 {
            self.ctx
                .exemptions
                .exempt_all(participant, Duration::from_millis(grace));
        }
        tracing::debug!(participant = %participant, grace, "participant joined");
    }

    /// Destroys per-participant state.
    pub fn on_leave(&self, participant: ParticipantId) {
        self.ctx.sessions.remove(participant);
        self.ctx.violations.on_leave(participant);
        self.ctx.exemptions.clear(participant);
        tracing::debug!(participant = %participant, "participant left");
    }

    // ========================================================================
    // EVENTS
    // ========================================================================

    /// Aggregates a position update and runs the movement checks.
    pub fn on_movement(&self, participant: ParticipantId, movement: &Movement) -> bool {
        let Some(session) = self.ctx.sessions.get(participant) else {
            return false;
        };
        let state = {
            let mut state = session.movement.lock();
            state.update(&self.ctx.environment(), movement, self.ctx.now());
            state.clone()
        };

        let cancel = self.fan_out(|check| check.on_movement(&self.ctx, participant, &state));

        // The movement that follows a teleport is the server's, not the client's.
        self.ctx
            .exemptions
            .remove_kind(participant, ExemptionKind::Teleported);
        cancel
    }

    /// The server moved the participant.
    pub fn on_teleport(&self, participant: ParticipantId) {
        self.ctx
            .exemptions
            .exempt_kind(participant, ExemptionKind::Teleported);
    }

    /// Counts an arm swing. Returns true while swings are being cancelled.
    pub fn on_swing(&self, participant: ParticipantId) -> bool {
        let Some(session) = self.ctx.sessions.get(participant) else {
            return false;
        };
        session.packets.increment(PacketKind::Swing);
        session.combat.lock().last_swing = Some(self.ctx.now());
        session.packets.is_cancelled(PacketKind::Swing)
    }

    /// Counts a custom payload. Returns true while payloads are being
    /// cancelled.
    pub fn on_payload(&self, participant: ParticipantId) -> bool {
        let Some(session) = self.ctx.sessions.get(participant) else {
            return false;
        };
        session.packets.increment(PacketKind::Payload);
        session.packets.is_cancelled(PacketKind::Payload)
    }

    /// Runs the combat checks, then records the attack.
    pub fn on_attack(&self, participant: ParticipantId, attack: &Attack) -> bool {
        let Some(session) = self.ctx.sessions.get(participant) else {
            return false;
        };
        let now = self.ctx.now();
        let movement = session.movement_snapshot();
        let combat = *session.combat.lock();
        let input = AttackContext {
            attack,
            movement: &movement,
            combat: &combat,
            now,
        };

        let cancel = self.fan_out(|check| check.on_attack(&self.ctx, participant, &input));
        session.combat.lock().record_attack(attack.target, now);
        cancel
    }

    /// The participant started consuming an item.
    pub fn on_consume_start(&self, participant: ParticipantId) {
        if let Some(session) = self.ctx.sessions.get(participant) {
            session.combat.lock().consume_started = Some(self.ctx.now());
        }
    }

    /// The participant finished consuming an item.
    pub fn on_consume_finish(&self, participant: ParticipantId) -> bool {
        let Some(session) = self.ctx.sessions.get(participant) else {
            return false;
        };
        let Some(started) = session.combat.lock().consume_started.take() else {
            return false;
        };
        let finished = self.ctx.now();
        self.fan_out(|check| check.on_consume(&self.ctx, participant, started, finished))
    }

    /// Dispatches one event. Returns true when the action should be cancelled.
    pub fn handle(&self, participant: ParticipantId, event: &ParticipantEvent) -> bool {
        match event {
            ParticipantEvent::Join(spawn) => {
                self.on_join(participant, *spawn);
                false
            }
            ParticipantEvent::Leave => {
                self.on_leave(participant);
                false
            }
            ParticipantEvent::Move(movement) => self.on_movement(participant, movement),
            ParticipantEvent::Teleport => {
                self.on_teleport(participant);
                false
            }
            ParticipantEvent::Swing => self.on_swing(participant),
            ParticipantEvent::Attack(attack) => self.on_attack(participant, attack),
            ParticipantEvent::Payload => self.on_payload(participant),
            ParticipantEvent::ConsumeStart => {
                self.on_consume_start(participant);
                false
            }
            ParticipantEvent::ConsumeFinish => self.on_consume_finish(participant),
        }
    }

    fn fan_out(&self, mut run: impl FnMut(&dyn Check) -> Option<ActionDecision>) -> bool {
        self.registry
            .iter()
            .filter_map(|check| run(check.as_ref()))
            .fold(false, |cancel, decision| cancel | decision.cancel)
    }

    // ========================================================================
    // TICK
    // ========================================================================

    /// Advances one host tick: rate windows, due punishments, notifications.
    ///
    /// Must be called from the host's main thread.
    pub fn tick(&self) -> TickReport {
        let tick = self.ctx.tick_scheduler().advance();
        let executed =
            self.ctx
                .punishments
                .execute_due(tick, self.ctx.host(), self.ctx.profile());
        let notifications = self.ctx.deliver_notifications();
        TickReport {
            tick,
            punishments: executed.len(),
            notifications,
        }
    }

    // ========================================================================
    // ADMINISTRATION
    // ========================================================================

    /// Validates `config` against everything, then swaps it in everywhere.
    ///
    /// On error nothing changes.
    pub fn reload(&self, config: WardenConfig) -> WardenResult<()> {
        config.validate()?;
        self.registry.reload_all(&config)?;
        self.ctx.install_config(Arc::new(config));
        tracing::info!("configuration reloaded");
        Ok(())
    }

    /// Unloads every check and drops all state.
    pub fn close(&mut self) {
        self.registry.close_all(&self.ctx);
        self.ctx.tick_scheduler().clear();
        self.ctx.punishments.clear();
        self.ctx.sessions.clear();
        tracing::info!("detection engine closed");
    }

    /// Administrative override: drops a pending kick or ban.
    pub fn cancel_pending_punishment(&self, participant: ParticipantId) -> bool {
        self.ctx.punishments.cancel_pending(participant).is_some()
    }

    /// Flips notification delivery for `observer`. Returns the new state.
    pub fn toggle_notifications(&self, observer: ParticipantId) -> bool {
        self.ctx.violations.toggle_notifications(observer)
    }

    /// Exempts `participant` from `check` for `duration` (zero clears).
    pub fn exempt(&self, participant: ParticipantId, check: CheckType, duration: Duration) {
        self.ctx.exemptions.exempt(participant, check, duration);
    }

    /// Adds an indefinite exemption.
    pub fn exempt_kind(&self, participant: ParticipantId, kind: ExemptionKind) {
        self.ctx.exemptions.exempt_kind(participant, kind);
    }

    /// Removes an indefinite exemption.
    pub fn remove_kind(&self, participant: ParticipantId, kind: ExemptionKind) -> bool {
        self.ctx.exemptions.remove_kind(participant, kind)
    }

    /// Current violation score.
    #[must_use]
    pub fn level(&self, participant: ParticipantId, check: CheckType) -> u32 {
        self.ctx.violations.level(participant, check)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("context", &self.ctx)
            .field("registry", &self.registry)
            .finish()
    }
}
