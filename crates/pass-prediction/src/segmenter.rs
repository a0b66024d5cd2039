//! Visibility segmentation state machine.

use chrono::{DateTime, Utc};

use crate::{Sample, Segment, TrackPoint};

/// Visibility of one satellite while its sample stream is consumed.
/// Scoped to a single segmentation run, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityState {
    NotVisible,
    Visible,
}

struct OpenSegment {
    start: DateTime<Utc>,
    points: Vec<TrackPoint>,
}

/// Two-state machine that partitions an ordered sample stream into
/// contiguous runs strictly above the elevation mask. Only the currently
/// open segment is held; closed segments are emitted immediately.
pub struct Segmenter {
    mask_deg: f64,
    state: VisibilityState,
    open: Option<OpenSegment>,
}

impl Segmenter {
    pub fn new(mask_deg: f64) -> Self {
        Self {
            mask_deg,
            state: VisibilityState::NotVisible,
            open: None,
        }
    }

    pub fn state(&self) -> VisibilityState {
        self.state
    }

    /// Feed the next sample; returns a segment when this sample closes one.
    ///
    /// Visibility is strict: elevation exactly at the mask is not visible.
    /// A closed segment ends at the first non-visible sample's timestamp,
    /// not at the last visible one, so the duration runs from first-visible
    /// to first-non-visible.
    pub fn observe(&mut self, sample: &Sample) -> Option<Segment> {
        let point = TrackPoint {
            elevation_deg: sample.elevation_deg,
            azimuth_deg: sample.azimuth_deg,
        };
        let visible = sample.elevation_deg > self.mask_deg;

        match (self.state, visible) {
            (VisibilityState::NotVisible, true) => {
                self.state = VisibilityState::Visible;
                self.open = Some(OpenSegment {
                    start: sample.time,
                    points: vec![point],
                });
                None
            }
            (VisibilityState::Visible, true) => {
                if let Some(open) = self.open.as_mut() {
                    open.points.push(point);
                }
                None
            }
            (VisibilityState::Visible, false) => {
                self.state = VisibilityState::NotVisible;
                self.open.take().map(|open| Segment {
                    start: open.start,
                    end: sample.time,
                    points: open.points,
                })
            }
            (VisibilityState::NotVisible, false) => None,
        }
    }

    /// Close a segment still open when the sample stream is exhausted.
    ///
    /// `grid_end` is the observation window's grid end, which may lie past
    /// the last visible sample when the pass runs into the boundary.
    pub fn finish(self, grid_end: DateTime<Utc>) -> Option<Segment> {
        self.open.map(|open| Segment {
            start: open.start,
            end: grid_end,
            points: open.points,
        })
    }
}
