//! Data processing modules.

pub mod contour;
pub mod filtering;
pub mod optimization;
pub mod revolution;
pub mod velocity;

// Re-export key types for convenience
pub use contour::{Contour, ContourError, ContourTracer, WalkOrder};
pub use filtering::{filter_by_length, DeltaFilter, DirectionalFilter, SidestepPolicy};
pub use optimization::{LengthOptimizer, LengthScore, LengthSearch};
pub use revolution::{
    split_top_bottom, HalfContour, Measurement, RevolutionError, RevolutionIntegrator, VolumeMethod,
};
pub use velocity::{track_statistics, FlowEstimate, TrackStatistics, VelocityAggregator};
