//! System config domain: display/CAN/GPS/logger/WiFi/units settings
//! (`spec.md` §4.10).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitsSystem {
    Metric,
    Imperial,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    pub display_enabled: bool,
    pub can_enabled: bool,
    pub gps_rate_hz: f64,
    pub logger_rate_hz: f64,
    pub wifi_enabled: bool,
    #[serde(default = "default_units")]
    pub units: UnitsSystem,
}

fn default_units() -> UnitsSystem {
    UnitsSystem::Metric
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemFile {
    pub format_version: u32,
    #[serde(flatten)]
    pub system: SystemConfig,
}

impl SystemConfig {
    pub fn validate(&self) -> Result<(), racing_common::config::ConfigError> {
        if self.gps_rate_hz <= 0.0 || self.logger_rate_hz <= 0.0 {
            return Err(racing_common::config::ConfigError::ValidationError(
                "gps_rate_hz and logger_rate_hz must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
