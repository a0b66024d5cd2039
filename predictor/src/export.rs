//! CSV passage report.
//!
//! Column order and the zero-padded 24-hour `HH:MM` time format are an
//! external contract; downstream tooling parses these files.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use csv::Writer;
use pass_prediction::Passage;
use std::path::Path;
use tracing::info;

const HEADERS: [&str; 8] = [
    "start",
    "mid",
    "end",
    "duration_min",
    "mid_elevation_deg",
    "start_azimuth_deg",
    "mid_azimuth_deg",
    "end_azimuth_deg",
];

/// Report filename carrying the observation date.
pub fn report_filename(start: DateTime<Utc>) -> String {
    format!("satellite_passes_{}.csv", start.format("%Y_%m_%d"))
}

/// Write the passage report in row order.
pub fn write_report(path: impl AsRef<Path>, passages: &[&Passage]) -> Result<()> {
    let path = path.as_ref();
    let mut writer =
        Writer::from_path(path).with_context(|| format!("cannot create report {path:?}"))?;

    writer.write_record(HEADERS)?;
    for passage in passages {
        writer.write_record([
            hhmm(passage.start),
            hhmm(passage.mid),
            hhmm(passage.end),
            format!("{:.1}", passage.duration_min),
            format!("{:.1}", passage.mid_elevation_deg),
            format!("{:.1}", passage.start_azimuth_deg),
            format!("{:.1}", passage.mid_azimuth_deg),
            format!("{:.1}", passage.end_azimuth_deg),
        ])?;
    }
    writer.flush()?;

    info!("Wrote {} passages to {:?}", passages.len(), path);
    Ok(())
}

fn hhmm(time: DateTime<Utc>) -> String {
    time.format("%H:%M").to_string()
}
