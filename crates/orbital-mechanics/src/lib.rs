//! Orbital Mechanics Library
//!
//! SGP4 propagation from two-line element sets and topocentric look angles
//! (elevation, azimuth, slant range) as seen by a fixed ground observer.

use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrbitalError {
    #[error("Invalid TLE format: {0}")]
    InvalidTle(String),
    #[error("Propagation failed: {0}")]
    PropagationFailed(String),
}

pub type Result<T> = std::result::Result<T, OrbitalError>;

/// A two-line element set, optionally carrying the catalog name line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementSet {
    pub name: Option<String>,
    pub line1: String,
    pub line2: String,
}

/// Geodetic observer location.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Observer {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
}

/// Topocentric direction to a satellite at one instant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LookAngles {
    /// Degrees above the horizon (negative when set).
    pub elevation_deg: f64,
    /// Degrees from North, clockwise, in [0, 360).
    pub azimuth_deg: f64,
    /// Slant range in km.
    pub range_km: f64,
}

/// SGP4 model bound to one element set and one observer.
///
/// TLE parsing and the SGP4 constants derivation happen once at
/// construction; every `observe` call after that is self-contained.
pub struct TopocentricModel {
    elements: sgp4::Elements,
    constants: sgp4::Constants,
    observer: Observer,
    observer_ecef: Vector3<f64>,
}

impl TopocentricModel {
    pub fn new(element_set: &ElementSet, observer: Observer) -> Result<Self> {
        let elements = sgp4::Elements::from_tle(
            element_set.name.clone(),
            element_set.line1.as_bytes(),
            element_set.line2.as_bytes(),
        )
        .map_err(|e| OrbitalError::InvalidTle(format!("{e:?}")))?;
        let constants = sgp4::Constants::from_elements(&elements)
            .map_err(|e| OrbitalError::PropagationFailed(format!("{e:?}")))?;

        Ok(Self {
            elements,
            constants,
            observer,
            observer_ecef: transforms::geodetic_to_ecef(&observer),
        })
    }

    /// Propagate to `time` and express the result as observer look angles.
    pub fn observe(&self, time: DateTime<Utc>) -> Result<LookAngles> {
        let minutes = self
            .elements
            .datetime_to_minutes_since_epoch(&time.naive_utc())
            .map_err(|e| OrbitalError::PropagationFailed(format!("{e:?}")))?;
        let prediction = self
            .constants
            .propagate(minutes)
            .map_err(|e| OrbitalError::PropagationFailed(format!("{e:?}")))?;

        let teme = Vector3::new(
            prediction.position[0],
            prediction.position[1],
            prediction.position[2],
        );
        let sat_ecef = transforms::eci_to_ecef(&teme, transforms::gmst(time));

        Ok(transforms::look_angles(
            &self.observer,
            &self.observer_ecef,
            &sat_ecef,
        ))
    }
}

pub mod transforms {
    use super::{LookAngles, Observer};
    use chrono::{DateTime, Utc};
    use nalgebra::Vector3;

    pub const EARTH_RADIUS_KM: f64 = 6378.137;
    pub const EARTH_FLATTENING: f64 = 1.0 / 298.257223563;

    /// 2000-01-01T12:00:00Z, the J2000 epoch, as unix milliseconds.
    const J2000_UNIX_MS: i64 = 946_728_000_000;

    /// Greenwich mean sidereal time in radians.
    pub fn gmst(time: DateTime<Utc>) -> f64 {
        let days = (time.timestamp_millis() - J2000_UNIX_MS) as f64 / 86_400_000.0;
        let hours = (18.697_374_558 + 24.065_709_824_419_08 * days).rem_euclid(24.0);
        (hours * 15.0).to_radians()
    }

    /// Rotate an ECI (TEME) position into ECEF by the sidereal angle.
    pub fn eci_to_ecef(eci: &Vector3<f64>, gmst_rad: f64) -> Vector3<f64> {
        let (sin_g, cos_g) = gmst_rad.sin_cos();
        Vector3::new(
            eci.x * cos_g + eci.y * sin_g,
            -eci.x * sin_g + eci.y * cos_g,
            eci.z,
        )
    }

    /// Observer geodetic position to ECEF km, WGS84 ellipsoid.
    pub fn geodetic_to_ecef(observer: &Observer) -> Vector3<f64> {
        let lat = observer.latitude_deg.to_radians();
        let lon = observer.longitude_deg.to_radians();
        let alt_km = observer.altitude_m / 1000.0;

        let e2 = EARTH_FLATTENING * (2.0 - EARTH_FLATTENING);
        let n = EARTH_RADIUS_KM / (1.0 - e2 * lat.sin().powi(2)).sqrt();

        Vector3::new(
            (n + alt_km) * lat.cos() * lon.cos(),
            (n + alt_km) * lat.cos() * lon.sin(),
            (n * (1.0 - e2) + alt_km) * lat.sin(),
        )
    }

    /// Look angles from an observer to a satellite, both in ECEF km.
    pub fn look_angles(
        observer: &Observer,
        observer_ecef: &Vector3<f64>,
        sat_ecef: &Vector3<f64>,
    ) -> LookAngles {
        let delta = sat_ecef - observer_ecef;
        let range_km = delta.norm();

        let (sin_lat, cos_lat) = observer.latitude_deg.to_radians().sin_cos();
        let (sin_lon, cos_lon) = observer.longitude_deg.to_radians().sin_cos();

        // East-North-Up rotation
        let east = -sin_lon * delta.x + cos_lon * delta.y;
        let north = -sin_lat * cos_lon * delta.x - sin_lat * sin_lon * delta.y + cos_lat * delta.z;
        let up = cos_lat * cos_lon * delta.x + cos_lat * sin_lon * delta.y + sin_lat * delta.z;

        // Azimuth from North, clockwise
        let azimuth_deg = east.atan2(north).to_degrees();
        let azimuth_deg = if azimuth_deg < 0.0 {
            azimuth_deg + 360.0
        } else {
            azimuth_deg
        };

        let horiz = (east * east + north * north).sqrt();
        let elevation_deg = up.atan2(horiz).to_degrees();

        LookAngles {
            elevation_deg,
            azimuth_deg,
            range_km,
        }
    }
}
