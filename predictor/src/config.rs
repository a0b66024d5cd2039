//! Observation run configuration.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use orbital_mechanics::Observer;
use pass_prediction::ObservationWindow;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// One satellite to track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SatelliteConfig {
    /// NORAD catalog number
    pub norad_id: u32,
    pub name: String,
    /// Trace color in the sky chart (any SVG color)
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    "black".to_string()
}

/// Full run configuration, read once at startup and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationConfig {
    pub observer: Observer,
    /// Elevation mask in degrees; samples at or below it are not visible
    pub min_elevation_deg: f64,
    /// Window start, UTC
    pub start: DateTime<Utc>,
    /// Window end, UTC, exclusive
    pub end: DateTime<Utc>,
    #[serde(default = "default_cadence")]
    pub cadence_min: u32,
    pub satellites: Vec<SatelliteConfig>,
}

fn default_cadence() -> u32 {
    1
}

impl ObservationConfig {
    pub fn window(&self) -> ObservationWindow {
        ObservationWindow {
            start: self.start,
            end: self.end,
            cadence_min: self.cadence_min,
        }
    }
}

/// Load and validate the configuration file.
pub fn load(path: impl AsRef<Path>) -> Result<ObservationConfig> {
    let path = path.as_ref();
    info!("Loading observation config from {:?}", path);

    let file = File::open(path).with_context(|| format!("cannot open config {:?}", path))?;
    let reader = BufReader::new(file);
    let config: ObservationConfig =
        serde_json::from_reader(reader).context("malformed observation config")?;
    validate(&config)?;

    Ok(config)
}

fn validate(config: &ObservationConfig) -> Result<()> {
    let observer = &config.observer;
    if !(-90.0..=90.0).contains(&observer.latitude_deg) {
        bail!("observer latitude out of range: {}", observer.latitude_deg);
    }
    if !(-180.0..=180.0).contains(&observer.longitude_deg) {
        bail!("observer longitude out of range: {}", observer.longitude_deg);
    }
    if config.cadence_min == 0 {
        bail!("cadence must be at least one minute");
    }
    if config.satellites.is_empty() {
        bail!("no satellites configured");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(
            r#"{
                "observer": {"latitude_deg": 48.25, "longitude_deg": -1.66667, "altitude_m": 0.0},
                "min_elevation_deg": 0.0,
                "start": "2024-09-05T00:00:00Z",
                "end": "2024-09-06T00:00:00Z",
                "satellites": [
                    {"norad_id": 28654, "name": "NOAA-18", "color": "blue"},
                    {"norad_id": 44876, "name": "ANGELS"}
                ]
            }"#,
        );

        let config = load(file.path()).unwrap();
        assert_eq!(config.observer.latitude_deg, 48.25);
        assert_eq!(config.cadence_min, 1, "cadence defaults to one minute");
        assert_eq!(config.satellites.len(), 2);
        assert_eq!(config.satellites[1].color, "black", "color falls back");
        assert_eq!(config.window().steps(), 1440);
    }

    #[test]
    fn test_invalid_latitude_rejected() {
        let file = write_config(
            r#"{
                "observer": {"latitude_deg": 95.0, "longitude_deg": 0.0, "altitude_m": 0.0},
                "min_elevation_deg": 0.0,
                "start": "2024-09-05T00:00:00Z",
                "end": "2024-09-06T00:00:00Z",
                "satellites": [{"norad_id": 28654, "name": "NOAA-18"}]
            }"#,
        );
        assert!(load(file.path()).is_err());
    }

    #[test]
    fn test_zero_cadence_rejected() {
        let file = write_config(
            r#"{
                "observer": {"latitude_deg": 0.0, "longitude_deg": 0.0, "altitude_m": 0.0},
                "min_elevation_deg": 0.0,
                "start": "2024-09-05T00:00:00Z",
                "end": "2024-09-06T00:00:00Z",
                "cadence_min": 0,
                "satellites": [{"norad_id": 28654, "name": "NOAA-18"}]
            }"#,
        );
        assert!(load(file.path()).is_err());
    }

    #[test]
    fn test_empty_satellite_list_rejected() {
        let file = write_config(
            r#"{
                "observer": {"latitude_deg": 0.0, "longitude_deg": 0.0, "altitude_m": 0.0},
                "min_elevation_deg": 0.0,
                "start": "2024-09-05T00:00:00Z",
                "end": "2024-09-06T00:00:00Z",
                "satellites": []
            }"#,
        );
        assert!(load(file.path()).is_err());
    }
}
