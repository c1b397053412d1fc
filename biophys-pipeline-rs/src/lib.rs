//! Analysis pipelines for particle tracks and axisymmetric contours.
//!
//! This crate provides tools for:
//! - Loading particle track tables and deriving per-step velocities
//! - Rejecting implausible tracks (direction reversals, lateral drift, short
//!   or stationary tracks)
//! - Choosing the minimum track length that minimises flow velocity spread
//!   (parallelized)
//! - Tracing closed pixel contours and measuring the volume and surface of
//!   the body they outline when revolved about the seed row
//!
//! # Example
//!
//! ```no_run
//! use biophys_pipeline::core::mask::Pixel;
//! use biophys_pipeline::processors::revolution::RevolutionIntegrator;
//!
//! let measurement = RevolutionIntegrator::default()
//!     .measure_mask_file("vesicle.png", Pixel::new(120, 14))
//!     .unwrap();
//! println!("V = {}, dA = {}", measurement.volume, measurement.excess_area);
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;

pub use config::{FilterConfig, OptimizerConfig, PipelineConfig, RevolutionConfig, TrackingConfig};
pub use crate::core::mask::{BinaryMask, Pixel};
pub use crate::core::tracks::Track;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
