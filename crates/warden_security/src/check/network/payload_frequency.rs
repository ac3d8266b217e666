//! `[checks.payload-frequency]`

use serde::{Deserialize, Serialize};

use super::RateParams;
use crate::check::{CheckParams, CheckType};
use crate::config::CheckConfig;
use crate::session::PacketKind;

/// Custom payload rate options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PayloadFrequencyParams {
    /// Largest passing payload count per second.
    pub max_payloads_per_second: u32,
    /// Kick immediately at `payload_kick_threshold`.
    pub kick_if_threshold_reached: bool,
    /// Payload count per second that requests an immediate kick.
    pub payload_kick_threshold: u32,
}

impl Default for PayloadFrequencyParams {
    fn default() -> Self {
        Self {
            max_payloads_per_second: 20,
            kick_if_threshold_reached: false,
            payload_kick_threshold: 60,
        }
    }
}

impl CheckParams for PayloadFrequencyParams {
    fn validate(&self) -> Result<(), String> {
        if self.max_payloads_per_second == 0 {
            return Err("max-payloads-per-second must be positive".to_owned());
        }
        if self.kick_if_threshold_reached && self.payload_kick_threshold == 0 {
            return Err("payload-kick-threshold must be positive".to_owned());
        }
        Ok(())
    }
}

impl RateParams for PayloadFrequencyParams {
    const KIND: PacketKind = PacketKind::Payload;
    const CHECK: CheckType = CheckType::PayloadFrequency;
    const REASON: &'static str = "Too many payload packets per second.";

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
        self.max_payloads_per_second
    }

    fn kick_threshold(&self) -> u32 {
        self.payload_kick_threshold
    }

    fn kick_if_threshold_reached(&self) -> bool {
        self.kick_if_threshold_reached
    }
}
