//! Cross-domain validation (`spec.md` §4.10): "a candidate is rejected if
//! any channel referenced by a widget or alert does not exist, a screen id
//! collides, or a CAN id lies outside the 11/29-bit range for its declared
//! extended flag." The CAN-id check lives in [`crate::channels`] since it
//! only needs a single entry; this module covers checks that span files.

use std::collections::HashSet;

use racing_common::config::ConfigError;

use crate::FullConfig;

pub fn validate_full_config(full: &FullConfig) -> Result<(), ConfigError> {
    full.system.system.validate()?;

    let mut screen_ids = HashSet::new();
    for screen in &full.screens.screen {
        if !screen_ids.insert(screen.id) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate screen id {}",
                screen.id
            )));
        }
    }

    let known_channels: HashSet<&str> =
        full.channels.channel.iter().map(|c| c.name.as_str()).collect();

    for screen in &full.screens.screen {
        for widget in &screen.widget {
            if !known_channels.contains(widget.channel_name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "screen {} widget references unknown channel {}",
                    screen.id, widget.channel_name
                )));
            }
        }
    }

    for rule in &full.screens.rule {
        if !known_channels.contains(rule.channel_name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "display rule {} references unknown channel {}",
                rule.id, rule.channel_name
            )));
        }
        if !screen_ids.is_empty() && !screen_ids.contains(&rule.target_screen_id) {
            return Err(ConfigError::ValidationError(format!(
                "display rule {} targets unknown screen {}",
                rule.id, rule.target_screen_id
            )));
        }
    }

    // Validating each channel also enforces the CAN id/extended-flag range
    // check (`spec.md` §4.10) via `ChannelConfig::to_channel_def`.
    for channel in &full.channels.channel {
        channel.to_channel_def()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::{ChannelConfig, ChannelKindTag, ChannelsFile};
    use crate::screens::{ScreenConfig, ScreensFile, WidgetConfig};
    use crate::system::{SystemConfig, SystemFile, UnitsSystem};
    use crate::tracks::TracksFile;

    fn minimal_channel(id: u16, name: &str) -> ChannelConfig {
        ChannelConfig {
            id,
            name: name.into(),
            units: String::new(),
            kind: ChannelKindTag::AnalogIn,
            decimals: 0,
            enabled: true,
            analog_input_type: None,
            scale: 1.0,
            offset: 0.0,
            raw_min: 0.0,
            raw_max: 65535.0,
            min_value: f64::MIN,
            max_value: f64::MAX,
            filter_alpha: 0.0,
            thermistor_beta: 0.0,
            thermistor_r25: 0.0,
            thermistor_pullup: 0.0,
            digital_input_type: None,
            inverted: false,
            debounce_ms: 0,
            pulses_per_unit: 0.0,
            min_freq_hz: 0.0,
            max_freq_hz: 0.0,
            message_id: 0,
            extended: false,
            start_bit: 0,
            bit_length: 0,
            data_type: None,
            byte_order: None,
            timeout_ms: 0,
            timeout_policy: None,
            default_value: 0.0,
            operation: None,
            inputs: Vec::new(),
            params: Vec::new(),
        }
    }

    fn base_full() -> FullConfig {
        FullConfig {
            system: SystemFile {
                format_version: 1,
                system: SystemConfig {
                    display_enabled: true,
                    can_enabled: true,
                    gps_rate_hz: 5.0,
                    logger_rate_hz: 50.0,
                    wifi_enabled: false,
                    units: UnitsSystem::Metric,
                },
            },
            screens: ScreensFile {
                format_version: 1,
                screen: Vec::new(),
                rule: Vec::new(),
                default_screen_id: None,
            },
            channels: ChannelsFile { format_version: 1, channel: Vec::new() },
            tracks: TracksFile { format_version: 1, track: Vec::new() },
        }
    }

    #[test]
    fn rejects_widget_referencing_unknown_channel() {
        let mut full = base_full();
        full.screens.screen.push(ScreenConfig {
            id: 1,
            name: "main".into(),
            widget: vec![WidgetConfig {
                channel_name: "ghost".into(),
                warn_threshold: None,
                critical_threshold: None,
            }],
        });
        assert!(validate_full_config(&full).is_err());
    }

    #[test]
    fn rejects_duplicate_screen_ids() {
        let mut full = base_full();
        full.channels.channel.push(minimal_channel(1, "rpm"));
        for _ in 0..2 {
            full.screens.screen.push(ScreenConfig { id: 1, name: "main".into(), widget: Vec::new() });
        }
        assert!(validate_full_config(&full).is_err());
    }

    #[test]
    fn accepts_a_consistent_config() {
        let mut full = base_full();
        full.channels.channel.push(minimal_channel(1, "rpm"));
        full.screens.screen.push(ScreenConfig {
            id: 1,
            name: "main".into(),
            widget: vec![WidgetConfig {
                channel_name: "rpm".into(),
                warn_threshold: None,
                critical_threshold: None,
            }],
        });
        assert!(validate_full_config(&full).is_ok());
    }
}
