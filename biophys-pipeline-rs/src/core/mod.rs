//! Core data types and I/O operations.

pub mod loaders;
pub mod mask;
pub mod statistics;
pub mod tracks;
pub mod writers;

pub use loaders::{load_mask, load_tracks, load_tracks_or_empty, LoaderError};
pub use mask::{BinaryMask, Pixel};
pub use tracks::{Axis, Kind, Track, TrajectoryRecord, Vector2};
pub use writers::{
    write_contour_csv, write_length_search_json, write_measurement_json, write_measurements_json,
    write_track_statistics_csv, write_tracks_csv, WriteError,
};
