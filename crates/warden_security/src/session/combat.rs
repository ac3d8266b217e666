//! Combat and item-use timing per participant.

/// Timing facts for combat checks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CombatState {
    /// Clock reading of the latest arm swing.
    pub last_swing: Option<u64>,
    /// Clock reading of the latest attack.
    pub last_attack: Option<u64>,
    /// Target of the latest attack.
    pub last_target: Option<u64>,
    /// Clock reading when the current item consumption started.
    pub consume_started: Option<u64>,
}

impl CombatState {
    /// Records an attack after the checks have read the previous one.
    pub fn record_attack(&mut self, target: u64, now: u64) {
        self.last_attack = Some(now);
        self.last_target = Some(target);
    }
}
