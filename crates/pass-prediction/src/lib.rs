//! Pass Prediction Library
//!
//! Splits a fixed-cadence stream of topocentric samples into visibility
//! segments above an elevation mask and summarizes each segment as a
//! passage record. Propagation sits behind the [`Propagator`] seam so the
//! segmentation logic never depends on a particular orbital model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod passage;
pub mod sampler;
pub mod segmenter;

pub use segmenter::{Segmenter, VisibilityState};

#[derive(Error, Debug)]
pub enum PredictionError {
    #[error("Propagation failed at {time}: {reason}")]
    Propagation {
        time: DateTime<Utc>,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, PredictionError>;

/// Error surfaced by a propagation backend.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct PropagationError(pub String);

/// Topocentric angles for one satellite at one instant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TopoAngles {
    pub elevation_deg: f64,
    pub azimuth_deg: f64,
    pub range_km: f64,
}

/// Propagation seam: anything that can produce topocentric angles for one
/// satellite at an arbitrary instant.
pub trait Propagator {
    fn observe(&self, time: DateTime<Utc>) -> std::result::Result<TopoAngles, PropagationError>;
}

/// One timestamped topocentric observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: DateTime<Utc>,
    pub elevation_deg: f64,
    pub azimuth_deg: f64,
    pub range_km: f64,
}

/// Elevation/azimuth pair retained inside a segment. The timestamp of the
/// point at index `i` is `segment.start + i × cadence`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub elevation_deg: f64,
    pub azimuth_deg: f64,
}

/// A contiguous run of samples strictly above the elevation mask.
///
/// `end` is the first instant at or below the mask (or the window grid end
/// for a boundary-truncated pass), not the last visible sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub points: Vec<TrackPoint>,
}

/// Read-only summary of one closed segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub start: DateTime<Utc>,
    /// Time-based midpoint, `start + (end - start) / 2`.
    pub mid: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_min: f64,
    /// Elevation of the sample at index `len / 2`, not time-interpolated.
    pub mid_elevation_deg: f64,
    pub start_azimuth_deg: f64,
    pub mid_azimuth_deg: f64,
    pub end_azimuth_deg: f64,
}

/// Observation interval and cadence shared by every satellite in a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ObservationWindow {
    pub start: DateTime<Utc>,
    /// Exclusive: samples are taken at `start + k × cadence` while strictly
    /// before `end`.
    pub end: DateTime<Utc>,
    pub cadence_min: u32,
}

impl ObservationWindow {
    pub fn cadence(&self) -> Duration {
        Duration::minutes(i64::from(self.cadence_min))
    }

    /// Number of cadence steps inside `[start, end)`. Zero when the window
    /// is empty or inverted (a valid degenerate case, not an error).
    pub fn steps(&self) -> usize {
        if self.end <= self.start || self.cadence_min == 0 {
            return 0;
        }
        let span_s = (self.end - self.start).num_seconds();
        let cadence_s = i64::from(self.cadence_min) * 60;
        ((span_s + cadence_s - 1) / cadence_s) as usize
    }

    /// First grid instant at or past `end`. A segment still open when the
    /// samples run out is closed with this timestamp rather than the last
    /// sample's, so a boundary-truncated pass keeps the nominal window end.
    pub fn grid_end(&self) -> DateTime<Utc> {
        self.start + self.cadence() * self.steps() as i32
    }
}

/// Segments and passages for one satellite, index-matched so trace `i`
/// carries the annotation of passage `i`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SatelliteTrack {
    pub segments: Vec<Segment>,
    pub passages: Vec<Passage>,
}

/// Run sampling, segmentation, and summarization for one satellite.
///
/// A propagation failure at any step abandons the whole run; there are no
/// partial results.
pub fn predict_track(
    propagator: &dyn Propagator,
    window: &ObservationWindow,
    mask_deg: f64,
) -> Result<SatelliteTrack> {
    let mut segmenter = Segmenter::new(mask_deg);
    let mut track = SatelliteTrack::default();

    for sample in sampler::samples(propagator, window) {
        if let Some(segment) = segmenter.observe(&sample?) {
            track.passages.push(passage::summarize(&segment));
            track.segments.push(segment);
        }
    }
    if let Some(segment) = segmenter.finish(window.grid_end()) {
        track.passages.push(passage::summarize(&segment));
        track.segments.push(segment);
    }

    debug!(
        "Segmented {} samples into {} passes",
        window.steps(),
        track.segments.len()
    );
    Ok(track)
}

/// Scripted propagator for tests and demos: replays a fixed profile, one
/// entry per cadence step from `start`.
pub struct ScriptedPropagator {
    start: DateTime<Utc>,
    cadence: Duration,
    profile: Vec<(f64, f64)>,
}

impl ScriptedPropagator {
    pub fn new(start: DateTime<Utc>, cadence_min: u32, profile: Vec<(f64, f64)>) -> Self {
        Self {
            start,
            cadence: Duration::minutes(i64::from(cadence_min)),
            profile,
        }
    }

    /// Elevation-only profile at a fixed due-south azimuth.
    pub fn from_elevations(start: DateTime<Utc>, cadence_min: u32, elevations: &[f64]) -> Self {
        Self::new(
            start,
            cadence_min,
            elevations.iter().map(|&e| (e, 180.0)).collect(),
        )
    }
}

impl Propagator for ScriptedPropagator {
    fn observe(&self, time: DateTime<Utc>) -> std::result::Result<TopoAngles, PropagationError> {
        let since = time - self.start;
        let cadence_s = self.cadence.num_seconds().max(1);
        if since < Duration::zero() || since.num_seconds() % cadence_s != 0 {
            return Err(PropagationError(format!("{time} is off the script grid")));
        }
        let index = (since.num_seconds() / cadence_s) as usize;
        self.profile
            .get(index)
            .map(|&(elevation_deg, azimuth_deg)| TopoAngles {
                elevation_deg,
                azimuth_deg,
                range_km: 1000.0,
            })
            .ok_or_else(|| PropagationError(format!("no scripted step at {time}")))
    }
}
