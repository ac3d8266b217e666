//! Check identity.

use std::fmt;

/// Bypass-permission group a check belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CheckCategory {
    /// Position and physics checks.
    Moving,
    /// Attack checks.
    Combat,
    /// Packet rate checks.
    Network,
    /// Player state checks (item use and the like).
    Player,
}

impl CheckCategory {
    /// Lower-case name used in permission nodes.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Moving => "moving",
            Self::Combat => "combat",
            Self::Network => "network",
            Self::Player => "player",
        }
    }
}

/// Every detector the engine knows about. Fixed at compile time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CheckType {
    /// Claims ground contact while falling, avoiding fall damage.
    NoFall,
    /// Sustained or excessive upward motion while airborne.
    Flight,
    /// Horizontal movement faster than physics allows.
    Speed,
    /// Critical hits without a real fall.
    Criticals,
    /// Attacks from too far away.
    Reach,
    /// Attacks without swinging.
    NoSwing,
    /// Automated aim / multi-target patterns.
    KillAura,
    /// Too many arm swings per second.
    SwingFrequency,
    /// Too many custom payload packets per second.
    PayloadFrequency,
    /// Consuming items faster than possible.
    FastUse,
}

impl CheckType {
    /// All check types in registration order.
    pub const ALL: [Self; 10] = [
        Self::NoFall,
        Self::Flight,
        Self::Speed,
        Self::Criticals,
        Self::Reach,
        Self::NoSwing,
        Self::KillAura,
        Self::SwingFrequency,
        Self::PayloadFrequency,
        Self::FastUse,
    ];

    /// Kebab-case name used for configuration sections and permissions.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NoFall => "no-fall",
            Self::Flight => "flight",
            Self::Speed => "speed",
            Self::Criticals => "criticals",
            Self::Reach => "reach",
            Self::NoSwing => "no-swing",
            Self::KillAura => "kill-aura",
            Self::SwingFrequency => "swing-frequency",
            Self::PayloadFrequency => "payload-frequency",
            Self::FastUse => "fast-use",
        }
    }

    /// Name shown to staff.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::NoFall => "NoFall",
            Self::Flight => "Flight",
            Self::Speed => "Speed",
            Self::Criticals => "Criticals",
            Self::Reach => "Reach",
            Self::NoSwing => "NoSwing",
            Self::KillAura => "KillAura",
            Self::SwingFrequency => "SwingFrequency",
            Self::PayloadFrequency => "PayloadFrequency",
            Self::FastUse => "FastUse",
        }
    }

    /// Category for bypass permissions.
    #[must_use]
    pub const fn category(self) -> CheckCategory {
        match self {
            Self::NoFall | Self::Flight | Self::Speed => CheckCategory::Moving,
            Self::Criticals | Self::Reach | Self::NoSwing | Self::KillAura => CheckCategory::Combat,
            Self::SwingFrequency | Self::PayloadFrequency => CheckCategory::Network,
            Self::FastUse => CheckCategory::Player,
        }
    }

    /// Looks a check up by its configuration name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|check| check.name() == name)
    }
}

impl fmt::Display for CheckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for check in CheckType::ALL {
            assert_eq!(CheckType::from_name(check.name()), Some(check));
        }
        assert_eq!(CheckType::from_name("nope"), None);
    }

    #[test]
    fn test_categories() {
        assert_eq!(CheckType::Speed.category(), CheckCategory::Moving);
        assert_eq!(CheckType::KillAura.category(), CheckCategory::Combat);
        assert_eq!(CheckType::SwingFrequency.category().name(), "network");
        assert_eq!(CheckType::FastUse.category(), CheckCategory::Player);
    }
}
