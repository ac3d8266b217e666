//! `[checks.swing-frequency]`

use serde::{Deserialize, Serialize};

use super::RateParams;
use crate::check::{CheckParams, CheckType};
use crate::config::CheckConfig;
use crate::session::PacketKind;

/// Arm swing rate options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SwingFrequencyParams {
    /// Largest passing swing count per second.
    pub max_packets_per_second: u32,
    /// Kick immediately at `packet_kick_threshold`.
    pub kick_if_threshold_reached: bool,
    /// Swing count per second that requests an immediate kick.
    pub packet_kick_threshold: u32,
}

impl Default for SwingFrequencyParams {
    fn default() -> Self {
        Self {
            max_packets_per_second: 50,
            kick_if_threshold_reached: false,
            packet_kick_threshold: 100,
        }
    }
}

impl CheckParams for SwingFrequencyParams {
    fn validate(&self) -> Result<(), String> {
        if self.max_packets_per_second == 0 {
            return Err("max-packets-per-second must be positive".to_owned());
        }
        if self.kick_if_threshold_reached && self.packet_kick_threshold == 0 {
            return Err("packet-kick-threshold must be positive".to_owned());
        }
        Ok(())
    }
}

impl RateParams for SwingFrequencyParams {
    const KIND: PacketKind = PacketKind::Swing;
    const CHECK: CheckType = CheckType::SwingFrequency;
    const REASON: &'static str = "Too many swing packets per second.";

    fn default_config() -> CheckConfig {
        CheckConfig {
            cancel_level: 0,
            kick: true,
            kick_level: 5,
            ban: true,
            ban_level: 10,
            ..CheckConfig::DEFAULT
        }
    }

    fn max_per_window(&self) -> u32 {
        self.max_packets_per_second
    }

    fn kick_threshold(&self) -> u32 {
        self.packet_kick_threshold
    }

    fn kick_if_threshold_reached(&self) -> bool {
        self.kick_if_threshold_reached
    }
}
