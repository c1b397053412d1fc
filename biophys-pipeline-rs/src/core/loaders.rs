//! Data loaders for particle track tables and contour masks.
//!
//! This module provides parsers for:
//! - Whitespace-separated track tables as written by the MOSAIC particle
//!   tracker (one header line, then one row per detected particle)
//! - Binary mask images (any nonzero grayscale value is a contour pixel)

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, warn};
use thiserror::Error;

use super::mask::BinaryMask;
use super::tracks::{Track, Vector2};
use crate::config::TrackingConfig;

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Line {line}: expected at least {expected} fields, found {found}")]
    MissingColumns {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: {message}")]
    ParseError { line: usize, message: String },
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Parse a track identifier. Integral floats such as `3.0` are accepted.
fn parse_track_id(field: &str) -> Option<i64> {
    if let Ok(id) = field.parse::<i64>() {
        return Some(id);
    }
    let value: f64 = field.parse().ok()?;
    if value.is_finite() && value.fract() == 0.0 {
        Some(value as i64)
    } else {
        None
    }
}

/// Parse tracks from a reader.
///
/// The first line is a header and is discarded. Every other non-blank line
/// is split on whitespace; the configured id and position fields are read
/// and rows are grouped by track id. Tracks come out in ascending id order,
/// rows inside a track keep their input order.
///
/// # Errors
///
/// Returns an error on I/O failure or when a row lacks the configured
/// fields or holds a value that is not a number.
pub fn parse_tracks<R: BufRead>(reader: R, config: &TrackingConfig) -> Result<Vec<Track>> {
    let [first_col, second_col] = config.position_columns;
    let needed = config.id_column.max(first_col).max(second_col) + 1;

    let mut grouped: BTreeMap<i64, Vec<Vector2>> = BTreeMap::new();
    let mut rows = 0usize;

    // Skip header
    for (idx, line) in reader.lines().enumerate().skip(1) {
        let line = line?;
        let line_no = idx + 1;

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() < needed {
            return Err(LoaderError::MissingColumns {
                line: line_no,
                expected: needed,
                found: fields.len(),
            });
        }

        let id = parse_track_id(fields[config.id_column]).ok_or_else(|| LoaderError::ParseError {
            line: line_no,
            message: format!("invalid track id: {}", fields[config.id_column]),
        })?;

        let mut position = [0.0; 2];
        for (component, &col) in [first_col, second_col].iter().enumerate() {
            position[component] = fields[col].parse().map_err(|_| LoaderError::ParseError {
                line: line_no,
                message: format!("invalid coordinate: {}", fields[col]),
            })?;
        }

        grouped.entry(id).or_default().push(position);
        rows += 1;
    }

    let tracks: Vec<Track> = grouped
        .into_iter()
        .map(|(id, positions)| Track::from_positions(id, positions))
        .collect();

    debug!("parsed {} rows into {} tracks", rows, tracks.len());
    Ok(tracks)
}

/// Load tracks from a whitespace-separated table on disk.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or a row is malformed.
pub fn load_tracks<P: AsRef<Path>>(path: P, config: &TrackingConfig) -> Result<Vec<Track>> {
    let file = File::open(path.as_ref())?;
    parse_tracks(BufReader::new(file), config)
}

/// Load tracks, treating any failure as an empty track set.
pub fn load_tracks_or_empty<P: AsRef<Path>>(path: P, config: &TrackingConfig) -> Vec<Track> {
    let path = path.as_ref();
    match load_tracks(path, config) {
        Ok(tracks) => tracks,
        Err(e) => {
            warn!("{}: {}, continuing with no tracks", path.display(), e);
            Vec::new()
        }
    }
}

/// Load a binary mask from an image file.
///
/// The image is converted to 8-bit grayscale; every nonzero pixel is set.
pub fn load_mask<P: AsRef<Path>>(path: P) -> Result<BinaryMask> {
    let image = image::open(path.as_ref())?.to_luma8();
    Ok(BinaryMask::from_luma(&image))
}
