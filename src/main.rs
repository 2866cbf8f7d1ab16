use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use road_topology::{
    config::{ConflictConfig, OverlapConfig, RoadQcConfig},
    rule::{MustNotConflict, MustNotOverlap},
    run_road_qc,
    util::{read_features, read_json, read_polygon_features, write_json},
    TopologyError, TopologyResult, TopologyResults,
};
use serde::de::DeserializeOwned;
use tracing_subscriber::EnvFilter;

/// Topology checks for projected line and polygon layers stored as JSON.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dangles, disconnected segments, self-intersections and short parts.
    Roads {
        /// Line features.
        input: PathBuf,
        #[arg(long, env = "ROAD_TOPOLOGY_TOLERANCE")]
        tolerance: Option<f64>,
        #[arg(long, env = "ROAD_TOPOLOGY_MIN_SEGMENT_LENGTH")]
        min_segment_length: Option<f64>,
        #[command(flatten)]
        common: Common,
    },
    /// Pairwise polygon overlaps classified as duplicate, partial or sliver.
    Overlaps {
        /// Polygon features.
        input: PathBuf,
        #[arg(long, env = "ROAD_TOPOLOGY_MIN_OVERLAP_AREA")]
        min_overlap_area: Option<f64>,
        #[arg(long, env = "ROAD_TOPOLOGY_DUPLICATE_RATIO")]
        duplicate_ratio: Option<f64>,
        #[arg(long, env = "ROAD_TOPOLOGY_PARTIAL_RATIO")]
        partial_ratio: Option<f64>,
        #[command(flatten)]
        common: Common,
    },
    /// Buildings intersecting buffered road corridors.
    Conflicts {
        /// Building polygons.
        buildings: PathBuf,
        /// Road corridor polygons, already buffered.
        corridors: PathBuf,
        #[arg(long, env = "ROAD_TOPOLOGY_MIN_CONFLICT_AREA")]
        min_conflict_area: Option<f64>,
        #[arg(long, env = "ROAD_TOPOLOGY_BUFFER_DISTANCE")]
        buffer_distance: Option<f64>,
        #[command(flatten)]
        common: Common,
    },
}

#[derive(Args, Debug)]
struct Common {
    /// JSON file with the check configuration. Command line values win.
    #[arg(long, env = "ROAD_TOPOLOGY_CONFIG")]
    config: Option<PathBuf>,
    /// Write the full results as JSON.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn load_config<T: DeserializeOwned + Default>(path: Option<&Path>) -> anyhow::Result<T> {
    match path {
        Some(path) => read_json(path),
        None => Ok(T::default()),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let start = Instant::now();
    let mut results = TopologyResults::default();

    match cli.command {
        Command::Roads {
            input,
            tolerance,
            min_segment_length,
            common,
        } => {
            let mut config: RoadQcConfig = load_config(common.config.as_deref())?;
            config.tolerance = tolerance.unwrap_or(config.tolerance);
            config.min_segment_length = min_segment_length.unwrap_or(config.min_segment_length);
            let features = read_features(&input)?;
            let report = run_road_qc(&features, &config)?;
            results.push("Road network", TopologyResult::from(&report), report.issues.len());
            if let Some(output) = &common.output {
                write_json(&report, output)?;
            }
        }
        Command::Overlaps {
            input,
            min_overlap_area,
            duplicate_ratio,
            partial_ratio,
            common,
        } => {
            let mut config: OverlapConfig = load_config(common.config.as_deref())?;
            config.min_overlap_area = min_overlap_area.unwrap_or(config.min_overlap_area);
            config.duplicate_ratio_min = duplicate_ratio.unwrap_or(config.duplicate_ratio_min);
            config.partial_ratio_min = partial_ratio.unwrap_or(config.partial_ratio_min);
            let features = read_polygon_features(&input)?;
            let checked = features.must_not_overlap(&config)?;
            results.push(
                "Must not overlap",
                TopologyResult::from_errors(vec![TopologyError::Overlaps(checked.value.clone())]),
                checked.issues.len(),
            );
            if let Some(output) = &common.output {
                write_json(&checked, output)?;
            }
        }
        Command::Conflicts {
            buildings,
            corridors,
            min_conflict_area,
            buffer_distance,
            common,
        } => {
            let mut config: ConflictConfig = load_config(common.config.as_deref())?;
            config.min_conflict_area = min_conflict_area.unwrap_or(config.min_conflict_area);
            config.buffer_distance = buffer_distance.unwrap_or(config.buffer_distance);
            let buildings = read_polygon_features(&buildings)?;
            let corridors = read_polygon_features(&corridors)?;
            let checked = buildings.must_not_conflict_with(&corridors, &config)?;
            results.push(
                "Must not conflict",
                TopologyResult::from_errors(vec![TopologyError::Conflicts(checked.value.clone())]),
                checked.issues.len(),
            );
            if let Some(output) = &common.output {
                write_json(&checked, output)?;
            }
        }
    }

    print!("{}", results.summary());
    tracing::info!(elapsed = ?start.elapsed(), "done");
    Ok(())
}
