//! Polar sky chart rendering.
//!
//! North-up with azimuth increasing clockwise; the radial coordinate is
//! `90° − elevation`, so the zenith sits at the center and the horizon at
//! the rim. Written as a static SVG, one trace per visibility segment.

use anyhow::{Context, Result};
use pass_prediction::{Passage, Segment};
use std::path::Path;
use tracing::info;

const WIDTH: f64 = 840.0;
const HEIGHT: f64 = 680.0;
const CENTER_X: f64 = 340.0;
const CENTER_Y: f64 = 360.0;
const RADIUS: f64 = 280.0;
const LEGEND_X: f64 = 680.0;
const LEGEND_Y: f64 = 80.0;
const LEGEND_STEP: f64 = 22.0;

/// One satellite's traces and styling. `segments` and `passages` are
/// index-matched; trace `i` is annotated from passage `i`.
pub struct ChartSeries<'a> {
    pub name: &'a str,
    pub color: &'a str,
    pub segments: &'a [Segment],
    pub passages: &'a [Passage],
}

/// Render the chart and write it to `path`.
pub fn write_chart(path: impl AsRef<Path>, title: &str, series: &[ChartSeries]) -> Result<()> {
    let path = path.as_ref();
    let traces: usize = series.iter().map(|s| s.segments.len()).sum();
    std::fs::write(path, render(title, series))
        .with_context(|| format!("cannot write chart {path:?}"))?;

    info!("Wrote sky chart with {} traces to {:?}", traces, path);
    Ok(())
}

/// Project a topocentric direction onto the chart plane.
fn polar(elevation_deg: f64, azimuth_deg: f64) -> (f64, f64) {
    let r = RADIUS * (90.0 - elevation_deg).clamp(0.0, 90.0) / 90.0;
    let theta = azimuth_deg.to_radians();
    (CENTER_X + r * theta.sin(), CENTER_Y - r * theta.cos())
}

fn render(title: &str, series: &[ChartSeries]) -> String {
    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{WIDTH}\" height=\"{HEIGHT}\" \
         viewBox=\"0 0 {WIDTH} {HEIGHT}\" font-family=\"sans-serif\">\n"
    ));
    svg.push_str(&format!(
        "  <rect width=\"{WIDTH}\" height=\"{HEIGHT}\" fill=\"white\"/>\n"
    ));
    svg.push_str(&format!(
        "  <text x=\"{CENTER_X}\" y=\"36\" text-anchor=\"middle\" font-size=\"18\">{}</text>\n",
        escape(title)
    ));

    render_grid(&mut svg);
    for entry in series {
        render_series(&mut svg, entry);
    }
    render_legend(&mut svg, series);

    svg.push_str("</svg>\n");
    svg
}

fn render_grid(svg: &mut String) {
    // Elevation rings at 0°, 30°, 60°; tick labels stay hidden, as on the
    // reference chart
    for elevation in [0.0_f64, 30.0, 60.0] {
        let r = RADIUS * (90.0 - elevation) / 90.0;
        svg.push_str(&format!(
            "  <circle cx=\"{CENTER_X}\" cy=\"{CENTER_Y}\" r=\"{r:.1}\" \
             fill=\"none\" stroke=\"#cccccc\" stroke-width=\"1\"/>\n"
        ));
    }

    // Azimuth spokes every 30°
    for step in 0..12 {
        let azimuth = f64::from(step) * 30.0;
        let (x, y) = polar(0.0, azimuth);
        svg.push_str(&format!(
            "  <line x1=\"{CENTER_X}\" y1=\"{CENTER_Y}\" x2=\"{x:.1}\" y2=\"{y:.1}\" \
             stroke=\"#eeeeee\" stroke-width=\"1\"/>\n"
        ));
    }

    for (label, azimuth) in [("N", 0.0_f64), ("E", 90.0), ("S", 180.0), ("W", 270.0)] {
        // Cardinal labels sit just outside the horizon ring
        let r = RADIUS + 18.0;
        let theta = azimuth.to_radians();
        let (x, y) = (CENTER_X + r * theta.sin(), CENTER_Y - r * theta.cos());
        svg.push_str(&format!(
            "  <text x=\"{x:.1}\" y=\"{y:.1}\" text-anchor=\"middle\" \
             dominant-baseline=\"middle\" font-size=\"14\">{label}</text>\n"
        ));
    }
}

fn render_series(svg: &mut String, series: &ChartSeries) {
    for (i, segment) in series.segments.iter().enumerate() {
        // Index correspondence with the passage list is the contract; skip
        // any trace without a matching record
        let Some(passage) = series.passages.get(i) else {
            continue;
        };

        let points: Vec<String> = segment
            .points
            .iter()
            .map(|p| {
                let (x, y) = polar(p.elevation_deg, p.azimuth_deg);
                format!("{x:.1},{y:.1}")
            })
            .collect();
        svg.push_str(&format!(
            "  <polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\"/>\n",
            points.join(" "),
            escape(series.color)
        ));

        if let Some(first) = segment.points.first() {
            let (x, y) = polar(first.elevation_deg, first.azimuth_deg);
            svg.push_str(&format!(
                "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"9\" fill=\"#555555\">{} {}-{}</text>\n",
                x + 4.0,
                y - 4.0,
                escape(series.name),
                passage.start.format("%H:%M"),
                passage.end.format("%H:%M"),
            ));
        }
    }
}

fn render_legend(svg: &mut String, series: &[ChartSeries]) {
    // One entry per satellite, however many segments it produced
    for (i, entry) in series.iter().enumerate() {
        let y = LEGEND_Y + LEGEND_STEP * i as f64;
        svg.push_str(&format!(
            "  <line x1=\"{LEGEND_X}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\" \
             stroke=\"{}\" stroke-width=\"2\"/>\n",
            LEGEND_X + 24.0,
            escape(entry.color)
        ));
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"12\">{}</text>\n",
            LEGEND_X + 32.0,
            y + 4.0,
            escape(entry.name)
        ));
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use pass_prediction::TrackPoint;

    #[test]
    fn test_polar_projection() {
        let (x, y) = polar(90.0, 123.0);
        assert!((x - CENTER_X).abs() < 1e-9, "zenith maps to the center");
        assert!((y - CENTER_Y).abs() < 1e-9);

        let (x, y) = polar(0.0, 0.0);
        assert!((x - CENTER_X).abs() < 1e-9, "north horizon is straight up");
        assert!((y - (CENTER_Y - RADIUS)).abs() < 1e-9);

        let (x, y) = polar(0.0, 90.0);
        assert!((x - (CENTER_X + RADIUS)).abs() < 1e-9, "east is to the right");
        assert!((y - CENTER_Y).abs() < 1e-9);
    }

    #[test]
    fn test_render_traces_and_legend() {
        let start = Utc.with_ymd_and_hms(2024, 9, 5, 10, 0, 0).unwrap();
        let segment = Segment {
            start,
            end: start + Duration::minutes(3),
            points: vec![
                TrackPoint { elevation_deg: 15.0, azimuth_deg: 170.0 },
                TrackPoint { elevation_deg: 20.0, azimuth_deg: 180.0 },
                TrackPoint { elevation_deg: 15.0, azimuth_deg: 190.0 },
            ],
        };
        let passage = pass_prediction::passage::summarize(&segment);
        let segments = [segment];
        let passages = [passage];
        let series = [ChartSeries {
            name: "NOAA-18",
            color: "blue",
            segments: &segments,
            passages: &passages,
        }];

        let svg = render("Satellite passes 2024-09-05", &series);
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<polyline").count(), 1);
        assert!(svg.contains("NOAA-18"));
        assert!(svg.contains("10:00-10:03"), "trace carries its pass times");
        assert!(svg.contains(">N</text>"));
    }

    #[test]
    fn test_render_without_series_is_grid_only() {
        let svg = render("empty", &[]);
        assert_eq!(svg.matches("<polyline").count(), 0);
        assert_eq!(svg.matches("<circle").count(), 3);
    }

    #[test]
    fn test_trace_without_matching_passage_is_skipped() {
        let start = Utc.with_ymd_and_hms(2024, 9, 5, 10, 0, 0).unwrap();
        let segments = [Segment {
            start,
            end: start + Duration::minutes(1),
            points: vec![TrackPoint { elevation_deg: 15.0, azimuth_deg: 10.0 }],
        }];
        let series = [ChartSeries {
            name: "ORPHAN",
            color: "red",
            segments: &segments,
            passages: &[],
        }];

        let svg = render("t", &series);
        assert_eq!(svg.matches("<polyline").count(), 0);
    }
}
