//! Command-line interface for the analysis pipelines.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use rayon::prelude::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::core::loaders::{load_tracks, load_tracks_or_empty};
use crate::core::mask::Pixel;
use crate::core::tracks::Track;
use crate::core::writers;
use crate::processors::filtering::{filter_by_length, DeltaFilter, DirectionalFilter, SidestepPolicy};
use crate::processors::optimization::LengthOptimizer;
use crate::processors::revolution::{Measurement, RevolutionIntegrator};
use crate::processors::velocity::VelocityAggregator;
use crate::PipelineConfig;

#[derive(Parser)]
#[command(name = "biophys-pipeline")]
#[command(about = "Particle track filtering and solid-of-revolution measurement", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter a track table and estimate the flow velocity
    Tracks {
        /// Whitespace-separated track table
        input: PathBuf,
        /// Directory for filtered tracks and per-track statistics
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Fixed minimum track length (skips the length search)
        #[arg(long)]
        min_length: Option<usize>,
        /// Minimum number of tracks a length cutoff must keep
        #[arg(long)]
        min_tracks: Option<usize>,
        /// Minimum net displacement along the flow axis
        #[arg(long)]
        min_displacement: Option<f64>,
        /// Lateral drift policy
        #[arg(long, value_enum)]
        sidestep: Option<SidestepArg>,
        /// Keep tracks that reverse direction along the flow axis
        #[arg(long)]
        no_backstep: bool,
        /// Fail on a missing or malformed table instead of using no tracks
        #[arg(long)]
        strict: bool,
    },

    /// Score every minimum-length cutoff for a track table
    Optimize {
        /// Whitespace-separated track table
        input: PathBuf,
        /// Minimum number of tracks a length cutoff must keep
        #[arg(long)]
        min_tracks: Option<usize>,
        /// Write every scored cutoff to this JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Fail on a missing or malformed table instead of using no tracks
        #[arg(long)]
        strict: bool,
    },

    /// Measure the body outlined by a contour mask
    Revolve {
        /// Binary mask image (nonzero pixels form the contour)
        mask: PathBuf,
        /// Seed pixel on the contour as ROW,COL
        #[arg(long, value_parser = parse_seed)]
        seed: Pixel,
        /// Output JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write the ordered contour to this CSV file
        #[arg(long)]
        contour_csv: Option<PathBuf>,
    },

    /// Measure many masks listed in a CSV of path,row,col
    RevolveBatch {
        /// CSV file with a header and columns path,row,col
        seeds: PathBuf,
        /// Output directory for measurements.json
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SidestepArg {
    Hard,
    Soft,
    Off,
}

impl SidestepArg {
    fn policy(self) -> Option<SidestepPolicy> {
        match self {
            SidestepArg::Hard => Some(SidestepPolicy::Hard),
            SidestepArg::Soft => Some(SidestepPolicy::Soft),
            SidestepArg::Off => None,
        }
    }
}

/// One row of a batch seed file.
#[derive(Debug, Deserialize)]
struct SeedRow {
    path: PathBuf,
    row: usize,
    col: usize,
}

/// Parse `ROW,COL` into a pixel.
fn parse_seed(value: &str) -> std::result::Result<Pixel, String> {
    let (row, col) = value
        .split_once(',')
        .ok_or_else(|| format!("expected ROW,COL, got '{}'", value))?;
    let row = row
        .trim()
        .parse()
        .map_err(|_| format!("invalid row '{}'", row.trim()))?;
    let col = col
        .trim()
        .parse()
        .map_err(|_| format!("invalid column '{}'", col.trim()))?;
    Ok(Pixel::new(row, col))
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<62} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 39 {
            format!("{}...", value.chars().take(36).collect::<String>())
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<39} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // Load config
    let config = match &cli.config {
        Some(path) => match PipelineConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("Failed to load config from {}: {}, using defaults", path.display(), e);
                PipelineConfig::default()
            }
        },
        None => PipelineConfig::default(),
    };

    // Dispatch to subcommands
    let result = match cli.command {
        Commands::Tracks {
            input,
            output_dir,
            min_length,
            min_tracks,
            min_displacement,
            sidestep,
            no_backstep,
            strict,
        } => {
            let mut config = config;
            if let Some(len) = min_length {
                config.filtering.min_length = Some(len);
            }
            if let Some(n) = min_tracks {
                config.optimizer.min_tracks = n;
            }
            if let Some(d) = min_displacement {
                config.filtering.min_displacement = d;
            }
            if let Some(arg) = sidestep {
                config.filtering.sidestep = arg.policy();
            }
            if no_backstep {
                config.filtering.backstep = false;
            }
            cmd_tracks(&input, output_dir.as_deref(), strict, &config)
        }
        Commands::Optimize {
            input,
            min_tracks,
            output,
            strict,
        } => {
            let mut config = config;
            if let Some(n) = min_tracks {
                config.optimizer.min_tracks = n;
            }
            cmd_optimize(&input, output.as_deref(), strict, &config)
        }
        Commands::Revolve {
            mask,
            seed,
            output,
            contour_csv,
        } => cmd_revolve(&mask, seed, output.as_deref(), contour_csv.as_deref(), &config),
        Commands::RevolveBatch { seeds, output_dir } => {
            cmd_revolve_batch(&seeds, output_dir.as_deref(), &config)
        }
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Load a track table and apply the directional and displacement filters.
///
/// An unreadable table yields no tracks unless `strict` is set.
fn load_filtered(input: &Path, strict: bool, config: &PipelineConfig) -> Result<(usize, Vec<Track>)> {
    let tracks = if strict {
        load_tracks(input, &config.tracking)
            .with_context(|| format!("failed to load tracks from {}", input.display()))?
    } else {
        load_tracks_or_empty(input, &config.tracking)
    };
    let loaded = tracks.len();

    let tracks = DirectionalFilter::new(&config.tracking, &config.filtering).apply(tracks);
    let tracks = DeltaFilter::new(&config.tracking, &config.filtering).apply(tracks);

    info!("{} of {} tracks passed the filters", tracks.len(), loaded);
    Ok((loaded, tracks))
}

fn cmd_tracks(
    input: &Path,
    output_dir: Option<&Path>,
    strict: bool,
    config: &PipelineConfig,
) -> Result<()> {
    let start = Instant::now();

    println!("Filtering tracks...");
    println!("Input: {}", input.display());

    let spinner = create_spinner("Loading and filtering tracks...");
    let loaded = load_filtered(input, strict, config);
    let (loaded, filtered) = match loaded {
        Ok(v) => v,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e);
        }
    };
    let passed = filtered.len();

    let aggregator = VelocityAggregator::new(config.tracking.flow_axis);

    let (min_length, searched) = match config.filtering.min_length {
        Some(len) => (len, false),
        None => {
            spinner.set_message("Searching minimum track length...");
            let search = LengthOptimizer::new(config.optimizer.min_tracks, aggregator).search(&filtered);
            if search.is_degenerate() {
                warn!(
                    "no length cutoff keeps {} tracks, using {}",
                    config.optimizer.min_tracks, search.best_length
                );
            }
            (search.best_length, true)
        }
    };

    let kept = filter_by_length(filtered, min_length);
    let estimate = aggregator.estimate(&kept);

    spinner.finish_and_clear();

    let mut outputs = Vec::new();
    if let Some(dir) = output_dir {
        let tracks_path = dir.join("tracks.csv");
        writers::write_tracks_csv(&tracks_path, &kept)?;
        let stats_path = dir.join("track_statistics.csv");
        writers::write_track_statistics_csv(&stats_path, &aggregator.per_track(&kept))?;
        outputs.push(tracks_path.display().to_string());
        outputs.push(stats_path.display().to_string());
    }

    let (mean, spread) = match estimate {
        Some(e) => (format!("{:.6}", e.mean_velocity), format!("{:.6}", e.velocity_spread)),
        None => ("n/a".to_string(), "n/a".to_string()),
    };

    let mut items = vec![
        ("Input file", input.display().to_string()),
        ("Tracks loaded", loaded.to_string()),
        ("Passed filters", passed.to_string()),
        (
            "Min length",
            format!("{}{}", min_length, if searched { " (searched)" } else { "" }),
        ),
        ("Tracks kept", kept.len().to_string()),
        ("Mean velocity", mean),
        ("Velocity spread", spread),
    ];
    if !outputs.is_empty() {
        items.push(("Output files", outputs.join(", ")));
    }
    items.push(("Duration", format!("{:.2?}", start.elapsed())));

    print_summary("Track Analysis Complete", &items);
    Ok(())
}

fn cmd_optimize(
    input: &Path,
    output: Option<&Path>,
    strict: bool,
    config: &PipelineConfig,
) -> Result<()> {
    let start = Instant::now();

    let spinner = create_spinner("Scoring length cutoffs...");
    let (_, filtered) = match load_filtered(input, strict, config) {
        Ok(v) => v,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e);
        }
    };

    let aggregator = VelocityAggregator::new(config.tracking.flow_axis);
    let search = LengthOptimizer::new(config.optimizer.min_tracks, aggregator).search(&filtered);

    spinner.finish_and_clear();

    println!("{:>10} {:>8} {:>14}", "min_length", "tracks", "spread");
    for s in &search.scores {
        println!("{:>10} {:>8} {:>14.6}", s.min_length, s.track_count, s.score);
    }

    if let Some(path) = output {
        writers::write_length_search_json(path, &search)?;
    }

    print_summary(
        "Length Search Complete",
        &[
            ("Input file", input.display().to_string()),
            ("Tracks", filtered.len().to_string()),
            ("Min tracks", config.optimizer.min_tracks.to_string()),
            ("Best length", search.best_length.to_string()),
            ("Best spread", format!("{:.6}", search.best_score)),
            ("Degenerate", search.is_degenerate().to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
    Ok(())
}

fn cmd_revolve(
    mask: &Path,
    seed: Pixel,
    output: Option<&Path>,
    contour_csv: Option<&Path>,
    config: &PipelineConfig,
) -> Result<()> {
    let start = Instant::now();

    let spinner = create_spinner("Tracing contour...");
    let integrator = RevolutionIntegrator::new(&config.revolution);
    let measured = integrator
        .measure_mask_file(mask, seed)
        .with_context(|| format!("failed to measure {}", mask.display()));
    spinner.finish_and_clear();
    let measurement = measured?;

    if let Some(path) = output {
        writers::write_measurement_json(path, &measurement)?;
    }
    if let Some(path) = contour_csv {
        writers::write_contour_csv(path, &measurement.contour)?;
    }

    print_summary(
        "Revolution Measurement Complete",
        &[
            ("Mask", mask.display().to_string()),
            ("Seed", format!("({}, {})", seed.row, seed.col)),
            ("Contour pixels", measurement.contour.len().to_string()),
            ("Volume", format!("{:.6}", measurement.volume)),
            ("Surface area", format!("{:.6}", measurement.surface_area)),
            ("Equivalent radius", format!("{:.6}", measurement.equivalent_radius)),
            ("Excess area", format!("{:.6}", measurement.excess_area)),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
    Ok(())
}

/// Read `path,row,col` rows. Relative mask paths resolve against the seed
/// file's directory.
fn read_seed_rows(seeds: &Path) -> Result<Vec<SeedRow>> {
    let base = seeds.parent().unwrap_or_else(|| Path::new(""));
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(seeds)
        .with_context(|| format!("failed to open {}", seeds.display()))?;

    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let mut row: SeedRow = record.with_context(|| format!("malformed row in {}", seeds.display()))?;
        if row.path.is_relative() {
            row.path = base.join(&row.path);
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Measure every listed mask in parallel, skipping failures.
fn measure_batch(rows: &[SeedRow], integrator: &RevolutionIntegrator) -> Vec<Measurement> {
    rows.par_iter()
        .filter_map(|row| {
            let seed = Pixel::new(row.row, row.col);
            match integrator.measure_mask_file(&row.path, seed) {
                Ok(m) => Some(m),
                Err(e) => {
                    warn!("{} at ({}, {}): {}", row.path.display(), row.row, row.col, e);
                    None
                }
            }
        })
        .collect()
}

fn cmd_revolve_batch(seeds: &Path, output_dir: Option<&Path>, config: &PipelineConfig) -> Result<()> {
    let start = Instant::now();

    let rows = read_seed_rows(seeds)?;
    if rows.is_empty() {
        bail!("no masks listed in {}", seeds.display());
    }

    let effective_output_dir = output_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| seeds.parent().unwrap_or_else(|| Path::new(".")).to_path_buf());
    let output_path = effective_output_dir.join("measurements.json");

    println!("Measuring {} masks...", rows.len());

    let spinner = create_spinner("Tracing and integrating contours...");
    let integrator = RevolutionIntegrator::new(&config.revolution);
    let measurements = measure_batch(&rows, &integrator);
    spinner.finish_and_clear();

    writers::write_measurements_json(&output_path, &measurements)?;

    print_summary(
        "Batch Measurement Complete",
        &[
            ("Seed file", seeds.display().to_string()),
            ("Masks listed", rows.len().to_string()),
            ("Measured", measurements.len().to_string()),
            ("Failed", (rows.len() - measurements.len()).to_string()),
            ("Output", output_path.display().to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
    Ok(())
}
