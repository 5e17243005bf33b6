//! klusterpix CLI: cluster finding for Timepix ASCII frames.
//!
//! `process` clusters a set of frames and writes one cluster JSON file per
//! frame plus a `frames.json` summary; `info` reports on a single frame.
#![allow(clippy::uninlined_format_args, clippy::too_many_lines)]

use clap::{Parser, Subcommand, ValueEnum};

use klusterpix_algorithms::{cluster_frames, cluster_frames_par, summarize, KlusterFinder};
use klusterpix_core::{FinderConfig, FrameGeometry, HitMap, Mask};
use klusterpix_io::{
    read_frame, read_mask, write_frame_summaries_json, write_klusters_json, AsciiFrameReader,
    FrameSummary,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    KlusterpixIo(#[from] klusterpix_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] klusterpix_core::Error),

    #[error("Frame name '{0}' is duplicated or reserved")]
    FrameNameClash(String),
}

/// How frames are spread over threads.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// One frame after another
    Sequential,
    /// Frames in parallel on the rayon thread pool
    Parallel,
}

/// Cluster finder for Timepix hit frames.
#[derive(Parser)]
#[command(name = "klusterpix")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find clusters in one or more ASCII frame files
    Process {
        /// Input frame file(s)
        #[arg(required = true)]
        input: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Mask file of noisy pixels (x<TAB>y per line)
        #[arg(short, long)]
        mask: Option<PathBuf>,

        /// Frame rows
        #[arg(long, default_value = "256")]
        rows: u32,

        /// Frame columns
        #[arg(long, default_value = "256")]
        cols: u32,

        /// Mark the frames as simulated data
        #[arg(long)]
        simulated: bool,

        /// Execution mode
        #[arg(long, value_enum, default_value = "sequential")]
        mode: Mode,
    },

    /// Show information about a frame file
    Info {
        /// Input frame file
        input: PathBuf,

        /// Mask file of noisy pixels
        #[arg(short, long)]
        mask: Option<PathBuf>,

        /// Frame rows
        #[arg(long, default_value = "256")]
        rows: u32,

        /// Frame columns
        #[arg(long, default_value = "256")]
        cols: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Process {
            input,
            output,
            mask,
            rows,
            cols,
            simulated,
            mode,
        } => {
            let geometry = FrameGeometry::new(rows, cols)?;
            let mask = load_mask(mask.as_deref(), geometry)?;
            let finder = KlusterFinder::new(FinderConfig::new().with_simulated(simulated));

            log::info!(
                "Processing {} frame(s), {}x{} pixels, mode {:?}",
                input.len(),
                cols,
                rows,
                mode
            );

            let start = Instant::now();

            let names = frame_names(&input)?;
            let frames = input
                .iter()
                .map(|path| {
                    log::debug!("Reading: {}", path.display());
                    read_frame(path, geometry)
                })
                .collect::<std::result::Result<Vec<HitMap>, _>>()?;

            let results = match mode {
                Mode::Sequential => cluster_frames(&finder, &frames, &mask)?,
                Mode::Parallel => cluster_frames_par(&finder, &frames, &mask)?,
            };

            std::fs::create_dir_all(&output)?;
            let mut summaries = Vec::with_capacity(results.len());
            for (name, result) in names.iter().zip(&results) {
                let path = output.join(format!("{name}.json"));
                write_klusters_json(&path, result.klusters())?;
                log::debug!(
                    "{}: {} cluster(s) -> {}",
                    name,
                    result.len(),
                    path.display()
                );
                summaries.push(FrameSummary::new(
                    name.as_str(),
                    geometry,
                    result.statistics(),
                    simulated,
                ));
            }
            write_frame_summaries_json(output.join("frames.json"), &summaries)?;

            let totals = summarize(&results);
            let elapsed = start.elapsed();

            println!(
                "Processed {} frames in {:.2}s",
                results.len(),
                elapsed.as_secs_f64()
            );
            println!("Total hits: {}", totals.raw_pixels);
            println!("Masked hits: {}", totals.masked_pixels);
            println!("Clusters: {}", totals.klusters_found);
            println!("Gamma candidates: {}", totals.gammas.total());
            println!("Non-gamma clusters: {}", totals.non_gammas());
        }

        Commands::Info {
            input,
            mask,
            rows,
            cols,
        } => {
            let geometry = FrameGeometry::new(rows, cols)?;
            let mask = load_mask(mask.as_deref(), geometry)?;
            let reader = AsciiFrameReader::open(&input, geometry)?;
            let hits = reader.read_hits()?;
            let result = KlusterFinder::default().find(&hits, &mask)?;
            let stats = result.statistics();
            let gammas = result.gammas();

            println!("File: {}", input.display());
            println!("Format: {}", reader.format());
            println!("Geometry: {}x{}", geometry.cols(), geometry.rows());
            println!("Hits: {}", stats.raw_pixels);
            println!("Masked hits: {}", stats.masked_pixels);
            println!("Unmasked hits: {}", stats.unmasked_pixels);
            println!(
                "Occupancy: {} ({:.4}%)",
                stats.occupancy(),
                stats.occupancy_fraction() * 100.0
            );
            println!("Clusters: {}", stats.klusters_found);
            println!(
                "Gamma candidates: {} (mono {}, bi {}, tri {}, tetra {})",
                gammas.total(),
                gammas.monopixels,
                gammas.bipixels,
                gammas.tripixel_gammas,
                gammas.tetrapixel_gammas
            );
            println!("Non-gamma clusters: {}", stats.non_gammas());

            if let Some(largest) = result.klusters().first() {
                let props = largest.properties()?;
                println!(
                    "Largest cluster: {} pixels at ({:.1}, {:.1}), radius {:.2}, linearity {:.3}",
                    props.size, props.x_mean, props.y_mean, props.radius, props.line.linearity
                );
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn load_mask(path: Option<&Path>, geometry: FrameGeometry) -> Result<Mask> {
    match path {
        Some(path) => {
            let mask = read_mask(path, geometry)?;
            log::info!("Mask: {} pixel(s) from {}", mask.len(), path.display());
            Ok(mask)
        }
        None => Ok(Mask::new()),
    }
}

/// Output names from the input file stems; they must be unique.
fn frame_names(inputs: &[PathBuf]) -> Result<Vec<String>> {
    let mut seen = std::collections::HashSet::new();
    inputs
        .iter()
        .map(|path| {
            let name = path
                .file_stem()
                .map_or_else(|| "frame".to_string(), |s| s.to_string_lossy().into_owned());
            if name == "frames" || !seen.insert(name.clone()) {
                return Err(CliError::FrameNameClash(name));
            }
            Ok(name)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_process() {
        let cli = Cli::try_parse_from([
            "klusterpix",
            "process",
            "a.txt",
            "b.txt",
            "--output",
            "out",
            "--mode",
            "parallel",
            "--simulated",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Process {
                input,
                simulated,
                mode,
                rows,
                ..
            } => {
                assert_eq!(input.len(), 2);
                assert!(simulated);
                assert!(matches!(mode, Mode::Parallel));
                assert_eq!(rows, 256);
            }
            Commands::Info { .. } => panic!("expected process"),
        }
    }

    #[test]
    fn test_frame_names() {
        let names =
            frame_names(&[PathBuf::from("data/f_0001.txt"), PathBuf::from("f_0002.txt")]).unwrap();
        assert_eq!(names, vec!["f_0001", "f_0002"]);

        assert!(frame_names(&[PathBuf::from("a/x.txt"), PathBuf::from("b/x.txt")]).is_err());
        assert!(frame_names(&[PathBuf::from("frames.txt")]).is_err());
    }
}
