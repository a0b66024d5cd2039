//! Satellite pass prediction CLI.
//!
//! Fetches element sets from Celestrak, finds each satellite's visibility
//! windows for a configured ground observer, writes a CSV passage report,
//! and renders a polar sky chart.
//!
//! Usage:
//!   predict-passes --config data/observation.json --output-dir reports

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use orbital_mechanics::{Observer, TopocentricModel};
use pass_prediction::{
    predict_track, ObservationWindow, PropagationError, Propagator, SatelliteTrack, TopoAngles,
};

mod celestrak;
mod config;
mod export;
mod plot;

use config::SatelliteConfig;

#[derive(Parser, Debug)]
#[command(
    name = "predict-passes",
    about = "Predict satellite visibility windows for a ground observer"
)]
struct Args {
    /// Path to the observation config JSON
    #[arg(short, long, default_value = "data/observation.json")]
    config: PathBuf,

    /// Directory for the CSV report and the sky chart
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Skip the SVG sky chart
    #[arg(long)]
    no_chart: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Bridges the SGP4 model into the core's propagation seam.
struct SgpPropagator(TopocentricModel);

impl Propagator for SgpPropagator {
    fn observe(&self, time: DateTime<Utc>) -> std::result::Result<TopoAngles, PropagationError> {
        let angles = self
            .0
            .observe(time)
            .map_err(|e| PropagationError(e.to_string()))?;
        Ok(TopoAngles {
            elevation_deg: angles.elevation_deg,
            azimuth_deg: angles.azimuth_deg,
            range_km: angles.range_km,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = config::load(&args.config)?;
    let window = config.window();
    info!(
        "Observer at {:.4}°, {:.4}° ({} m), elevation mask {}°",
        config.observer.latitude_deg,
        config.observer.longitude_deg,
        config.observer.altitude_m,
        config.min_elevation_deg
    );
    info!(
        "Window {} to {}, {} min cadence, {} satellites",
        config.start,
        config.end,
        config.cadence_min,
        config.satellites.len()
    );

    let client = celestrak::client()?;

    // One independent task per satellite; no shared mutable state, results
    // merged by catalog number in whatever order the tasks finish
    let mut tasks = Vec::new();
    for satellite in config.satellites.clone() {
        let client = client.clone();
        let observer = config.observer;
        let mask_deg = config.min_elevation_deg;
        tasks.push(tokio::spawn(async move {
            let outcome = run_satellite(&client, &satellite, observer, window, mask_deg).await;
            (satellite, outcome)
        }));
    }

    let mut tracks: HashMap<u32, SatelliteTrack> = HashMap::new();
    for task in tasks {
        let (satellite, outcome) = task.await?;
        match outcome {
            Ok(track) => {
                info!(
                    "{} ({}): {} passes",
                    satellite.name,
                    satellite.norad_id,
                    track.passages.len()
                );
                tracks.insert(satellite.norad_id, track);
            }
            // A failed satellite is excluded from every output; the run
            // carries on for the others
            Err(e) => warn!(
                "Skipping {} ({}): {:#}",
                satellite.name, satellite.norad_id, e
            ),
        }
    }

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("cannot create {:?}", args.output_dir))?;

    // Aggregate report in configuration order
    let mut rows = Vec::new();
    for satellite in &config.satellites {
        if let Some(track) = tracks.get(&satellite.norad_id) {
            rows.extend(track.passages.iter());
        }
    }
    let report_path = args.output_dir.join(export::report_filename(config.start));
    export::write_report(&report_path, &rows)?;

    if !args.no_chart {
        let series: Vec<plot::ChartSeries> = config
            .satellites
            .iter()
            .filter_map(|satellite| {
                tracks.get(&satellite.norad_id).map(|track| plot::ChartSeries {
                    name: &satellite.name,
                    color: &satellite.color,
                    segments: &track.segments,
                    passages: &track.passages,
                })
            })
            .collect();
        let chart_path = args
            .output_dir
            .join(format!("satellite_passes_{}.svg", config.start.format("%Y_%m_%d")));
        let title = format!("Satellite passes {}", config.start.format("%Y-%m-%d"));
        plot::write_chart(&chart_path, &title, &series)?;
    }

    info!(
        "Done: {}/{} satellites, {} passages",
        tracks.len(),
        config.satellites.len(),
        rows.len()
    );
    Ok(())
}

/// Fetch, build the model, and predict one satellite's track.
async fn run_satellite(
    client: &reqwest::Client,
    satellite: &SatelliteConfig,
    observer: Observer,
    window: ObservationWindow,
    mask_deg: f64,
) -> Result<SatelliteTrack> {
    let element_set = celestrak::fetch_elements(client, satellite.norad_id)
        .await
        .context("element set unavailable")?;
    let model =
        TopocentricModel::new(&element_set, observer).context("cannot build propagation model")?;
    let track = predict_track(&SgpPropagator(model), &window, mask_deg)?;
    Ok(track)
}
