//! Tracks config domain: named start/finish + sector line geometry
//! (`spec.md` §3.4, §4.10).

use racing_common::config::ConfigError;
use racing_core::lap::geo::{GeoPoint, Line};
use racing_core::lap::timer::Track;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LineConfig {
    pub p1_lat: f64,
    pub p1_lon: f64,
    pub p2_lat: f64,
    pub p2_lon: f64,
    pub radius_m: f64,
    #[serde(default)]
    pub required_heading_deg: Option<f64>,
    #[serde(default = "default_heading_tolerance")]
    pub heading_tolerance_deg: f64,
}

fn default_heading_tolerance() -> f64 {
    45.0
}

impl LineConfig {
    pub fn to_line(self) -> Line {
        Line {
            p1: GeoPoint::new(self.p1_lat, self.p1_lon),
            p2: GeoPoint::new(self.p2_lat, self.p2_lon),
            radius_m: self.radius_m,
            required_heading_deg: self.required_heading_deg,
            heading_tolerance_deg: self.heading_tolerance_deg,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackConfig {
    pub name: String,
    pub start_finish: LineConfig,
    #[serde(default, rename = "sector")]
    pub sector: Vec<LineConfig>,
}

impl TrackConfig {
    pub fn to_track(&self) -> Result<Track, ConfigError> {
        if self.sector.len() > racing_common::consts::MAX_SECTORS {
            return Err(ConfigError::ValidationError(format!(
                "track {}: at most {} sectors",
                self.name,
                racing_common::consts::MAX_SECTORS
            )));
        }
        let mut sectors = heapless::Vec::new();
        for sector in &self.sector {
            let _ = sectors.push(sector.to_line());
        }
        Ok(Track {
            name: heapless::String::try_from(self.name.as_str()).unwrap_or_default(),
            start_finish: self.start_finish.to_line(),
            sectors,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracksFile {
    pub format_version: u32,
    #[serde(default, rename = "track")]
    pub track: Vec<TrackConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_track_with_two_sectors() {
        let toml_str = r#"
            format_version = 1

            [[track]]
            name = "home_circuit"

            [track.start_finish]
            p1_lat = 45.0
            p1_lon = -93.0
            p2_lat = 45.0001
            p2_lon = -93.0
            radius_m = 15.0

            [[track.sector]]
            p1_lat = 45.001
            p1_lon = -93.0
            p2_lat = 45.0011
            p2_lon = -93.0
            radius_m = 15.0

            [[track.sector]]
            p1_lat = 45.002
            p1_lon = -93.0
            p2_lat = 45.0021
            p2_lon = -93.0
            radius_m = 15.0
        "#;
        let file: TracksFile = toml::from_str(toml_str).unwrap();
        let track = file.track[0].to_track().unwrap();
        assert_eq!(track.name.as_str(), "home_circuit");
        assert_eq!(track.sectors.len(), 2);
    }
}
