//! The Config Model (J): persistent system/screens/channels/tracks
//! settings, with defaults and cross-domain validation (`spec.md` §4.10).
//!
//! Each domain is one TOML file carrying a format-version integer
//! (`spec.md` §6); [`ConfigLoader`](racing_common::config::ConfigLoader)
//! loads and parses it, and [`load_config_dir`] aggregates all four and
//! cross-validates them into runtime-ready [`racing_core`] types.

pub mod channels;
pub mod screens;
pub mod system;
pub mod tracks;
pub mod validation;

use std::path::Path;

use racing_common::config::{check_version, ConfigError, ConfigLoader};

pub use channels::{ChannelConfig, ChannelsFile};
pub use screens::{ScreensFile, WidgetConfig};
pub use system::{SystemConfig, SystemFile};
pub use tracks::{TrackConfig, TracksFile};
pub use validation::validate_full_config;

const SYSTEM_FORMAT_VERSION: u32 = 1;
const SCREENS_FORMAT_VERSION: u32 = 1;
const CHANNELS_FORMAT_VERSION: u32 = 1;
const TRACKS_FORMAT_VERSION: u32 = 1;

/// The four config domains loaded and validated together.
#[derive(Debug, Clone)]
pub struct FullConfig {
    pub system: SystemFile,
    pub screens: ScreensFile,
    pub channels: ChannelsFile,
    pub tracks: TracksFile,
}

/// Load `system.toml`, `screens.toml`, `channels.toml`, `tracks.toml` from
/// `dir`, reject unknown format versions, then cross-validate references
/// (`spec.md` §4.10).
pub fn load_config_dir(dir: &Path) -> Result<FullConfig, ConfigError> {
    let system = SystemFile::load(&dir.join("system.toml"))?;
    check_version("system.toml", system.format_version, SYSTEM_FORMAT_VERSION)?;

    let screens = ScreensFile::load(&dir.join("screens.toml"))?;
    check_version("screens.toml", screens.format_version, SCREENS_FORMAT_VERSION)?;

    let channels = ChannelsFile::load(&dir.join("channels.toml"))?;
    check_version("channels.toml", channels.format_version, CHANNELS_FORMAT_VERSION)?;

    let tracks = TracksFile::load(&dir.join("tracks.toml"))?;
    check_version("tracks.toml", tracks.format_version, TRACKS_FORMAT_VERSION)?;

    let full = FullConfig { system, screens, channels, tracks };
    validate_full_config(&full)?;
    Ok(full)
}

pub mod prelude {
    pub use crate::{load_config_dir, FullConfig};
    pub use crate::channels::{ChannelConfig, ChannelsFile};
    pub use crate::screens::{ScreensFile, WidgetConfig};
    pub use crate::system::{SystemConfig, SystemFile};
    pub use crate::tracks::{TrackConfig, TracksFile};
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let mut f = std::fs::File::create(dir.join(name)).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn loads_and_cross_validates_a_minimal_config_dir() {
        let dir = tempfile::tempdir().unwrap();

        write_file(
            dir.path(),
            "system.toml",
            r#"
            format_version = 1
            display_enabled = true
            can_enabled = true
            gps_rate_hz = 5.0
            logger_rate_hz = 50.0
            wifi_enabled = false
            units = "metric"
            "#,
        );
        write_file(
            dir.path(),
            "channels.toml",
            r#"
            format_version = 1

            [[channel]]
            id = 1
            name = "rpm"
            units = "rpm"
            kind = "analog_in"
            decimals = 0
            "#,
        );
        write_file(
            dir.path(),
            "screens.toml",
            r#"
            format_version = 1

            [[screen]]
            id = 1
            name = "main"

            [[screen.widget]]
            channel_name = "rpm"
            "#,
        );
        write_file(dir.path(), "tracks.toml", "format_version = 1\n");

        let full = load_config_dir(dir.path()).unwrap();
        assert_eq!(full.channels.channel.len(), 1);
        assert_eq!(full.screens.screen.len(), 1);
    }

    #[test]
    fn rejects_unknown_format_version() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "system.toml",
            r#"
            format_version = 99
            display_enabled = true
            can_enabled = true
            gps_rate_hz = 5.0
            logger_rate_hz = 50.0
            wifi_enabled = false
            "#,
        );
        write_file(dir.path(), "channels.toml", "format_version = 1\n");
        write_file(dir.path(), "screens.toml", "format_version = 1\n");
        write_file(dir.path(), "tracks.toml", "format_version = 1\n");

        let err = load_config_dir(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedVersion { .. }));
    }
}
