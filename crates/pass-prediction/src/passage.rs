//! Passage summarization.

use crate::{Passage, Segment};

/// Derive the summary record for one closed segment.
///
/// The midpoint time is half the elapsed duration past the start; the
/// midpoint angles come from the sample at index `len / 2`. For odd-length
/// segments the two midpoints therefore do not coincide exactly.
pub fn summarize(segment: &Segment) -> Passage {
    let duration = segment.end - segment.start;

    // Segments are non-empty by construction
    let mid_index = segment.points.len() / 2;
    let mid_point = segment.points[mid_index];
    let first = segment.points[0];
    let last = segment.points[segment.points.len() - 1];

    Passage {
        start: segment.start,
        mid: segment.start + duration / 2,
        end: segment.end,
        duration_min: duration.num_milliseconds() as f64 / 60_000.0,
        mid_elevation_deg: mid_point.elevation_deg,
        start_azimuth_deg: first.azimuth_deg,
        mid_azimuth_deg: mid_point.azimuth_deg,
        end_azimuth_deg: last.azimuth_deg,
    }
}
