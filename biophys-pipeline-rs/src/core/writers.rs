//! Data writers for CSV and JSON outputs.
//!
//! This module provides functions for writing analysis results:
//! - CSV with one row per trajectory point (positions and velocities)
//! - CSV with per-track statistics
//! - CSV with ordered contour pixels
//! - JSON with revolution measurements and length search scores

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use super::mask::Pixel;
use super::tracks::Track;
use crate::processors::optimization::LengthSearch;
use crate::processors::revolution::Measurement;
use crate::processors::velocity::TrackStatistics;

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// JSON serialization error.
    #[error("JSON write error for '{path}': {source}")]
    JsonError {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Creates a buffered writer for the given path.
fn create_buffered_writer(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(BufWriter::new(file))
}

/// Write a header and rows through a CSV writer, then flush.
fn write_csv_rows<I>(path: &Path, header: &[&str], rows: I) -> Result<()>
where
    I: IntoIterator<Item = Vec<String>>,
{
    ensure_parent_dirs(path)?;
    let mut csv_writer = csv::Writer::from_writer(create_buffered_writer(path)?);

    let path_str = path.display().to_string();

    csv_writer.write_record(header).map_err(|e| WriteError::CsvError {
        path: path_str.clone(),
        source: e,
    })?;

    for row in rows {
        csv_writer.write_record(&row).map_err(|e| WriteError::CsvError {
            path: path_str.clone(),
            source: e,
        })?;
    }

    csv_writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

/// Pretty-print any serializable value as JSON.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dirs(path)?;
    let mut writer = create_buffered_writer(path)?;

    let path_str = path.display().to_string();

    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| WriteError::JsonError {
        path: path_str.clone(),
        source: e,
    })?;
    writeln!(writer).map_err(|e| WriteError::WriteFile {
        path: path_str.clone(),
        source: e,
    })?;
    writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

/// Write every trajectory point to CSV.
///
/// Creates a CSV file with headers `track_id,point,pos_0,pos_1,vel_0,vel_1`.
/// The final point of each track has no velocity, so its velocity cells are
/// left empty.
///
/// # Arguments
///
/// * `path` - Output file path (parent directories will be created if needed)
/// * `tracks` - Tracks to export, in the order given
///
/// # Errors
///
/// Returns an error if:
/// - Parent directories cannot be created
/// - File cannot be created or written to
///
/// # Example
///
/// ```no_run
/// use biophys_pipeline::core::tracks::Track;
/// use biophys_pipeline::core::writers::write_tracks_csv;
/// use std::path::Path;
///
/// let tracks = vec![Track::from_positions(1, vec![[0.0, 0.0], [1.0, 2.0]])];
/// write_tracks_csv(Path::new("tracks.csv"), &tracks).unwrap();
/// ```
pub fn write_tracks_csv(path: &Path, tracks: &[Track]) -> Result<()> {
    let rows = tracks.iter().flat_map(|track| {
        track.points.iter().enumerate().map(move |(i, record)| {
            let (vel_0, vel_1) = match record.velocity {
                Some(v) => (format!("{:.6}", v[0]), format!("{:.6}", v[1])),
                None => (String::new(), String::new()),
            };
            vec![
                track.id.to_string(),
                i.to_string(),
                format!("{:.6}", record.position[0]),
                format!("{:.6}", record.position[1]),
                vel_0,
                vel_1,
            ]
        })
    });

    write_csv_rows(
        path,
        &["track_id", "point", "pos_0", "pos_1", "vel_0", "vel_1"],
        rows,
    )
}

/// Write per-track means and spreads to CSV.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_track_statistics_csv(path: &Path, stats: &[TrackStatistics]) -> Result<()> {
    let rows = stats.iter().map(|s| {
        vec![
            s.id.to_string(),
            s.length.to_string(),
            format!("{:.6}", s.position_mean[0]),
            format!("{:.6}", s.position_mean[1]),
            format!("{:.6}", s.position_std[0]),
            format!("{:.6}", s.position_std[1]),
            format!("{:.6}", s.velocity_mean[0]),
            format!("{:.6}", s.velocity_mean[1]),
            format!("{:.6}", s.velocity_std[0]),
            format!("{:.6}", s.velocity_std[1]),
        ]
    });

    write_csv_rows(
        path,
        &[
            "track_id",
            "length",
            "pos_mean_0",
            "pos_mean_1",
            "pos_std_0",
            "pos_std_1",
            "vel_mean_0",
            "vel_mean_1",
            "vel_std_0",
            "vel_std_1",
        ],
        rows,
    )
}

/// Write ordered contour pixels to CSV with headers `row,col`.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_contour_csv(path: &Path, contour: &[Pixel]) -> Result<()> {
    let rows = contour
        .iter()
        .map(|p| vec![p.row.to_string(), p.col.to_string()]);
    write_csv_rows(path, &["row", "col"], rows)
}

/// Write a single measurement as a JSON object.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_measurement_json(path: &Path, measurement: &Measurement) -> Result<()> {
    write_json(path, measurement)
}

/// Write a batch of measurements as a JSON array.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_measurements_json(path: &Path, measurements: &[Measurement]) -> Result<()> {
    write_json(path, measurements)
}

/// Write every scored length cutoff as JSON.
///
/// Cutoffs that kept too few tracks have an infinite score, written as `null`.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_length_search_json(path: &Path, search: &LengthSearch) -> Result<()> {
    write_json(path, search)
}
