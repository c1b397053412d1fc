//! Per-track and across-track velocity statistics.

use crate::core::statistics::{mean_std, vector_mean_std};
use crate::core::tracks::{Axis, Track, Vector2};

/// Mean and population spread of one track, final point excluded.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackStatistics {
    pub id: i64,
    pub length: usize,
    pub position_mean: Vector2,
    pub position_std: Vector2,
    pub velocity_mean: Vector2,
    pub velocity_std: Vector2,
}

/// Flow-axis velocity estimate across a set of tracks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowEstimate {
    /// Number of tracks that contributed a velocity.
    pub track_count: usize,
    /// Mean of the per-track mean flow-axis velocities.
    pub mean_velocity: f64,
    /// Spread of the per-track means; with a single track, that track's own
    /// step-to-step spread.
    pub velocity_spread: f64,
}

/// Statistics for one track, or `None` when it has no steps.
pub fn track_statistics(track: &Track) -> Option<TrackStatistics> {
    let steps = track.steps();
    let positions: Vec<Vector2> = steps.iter().map(|r| r.position).collect();
    let velocities: Vec<Vector2> = steps.iter().filter_map(|r| r.velocity).collect();

    let (position_mean, position_std) = vector_mean_std(&positions)?;
    let (velocity_mean, velocity_std) = vector_mean_std(&velocities)?;

    Some(TrackStatistics {
        id: track.id,
        length: track.len(),
        position_mean,
        position_std,
        velocity_mean,
        velocity_std,
    })
}

/// Aggregates track velocities along the flow axis.
#[derive(Debug, Clone, Copy)]
pub struct VelocityAggregator {
    pub flow_axis: Axis,
}

impl VelocityAggregator {
    pub fn new(flow_axis: Axis) -> Self {
        Self { flow_axis }
    }

    /// Statistics for every track that has at least one step.
    pub fn per_track(&self, tracks: &[Track]) -> Vec<TrackStatistics> {
        tracks.iter().filter_map(track_statistics).collect()
    }

    /// Combine the per-track flow-axis means of `tracks`.
    ///
    /// Returns `None` when no track has a defined velocity.
    pub fn estimate<'a, I>(&self, tracks: I) -> Option<FlowEstimate>
    where
        I: IntoIterator<Item = &'a Track>,
    {
        let axis = self.flow_axis.index();
        let stats: Vec<TrackStatistics> = tracks.into_iter().filter_map(track_statistics).collect();

        match stats.as_slice() {
            [] => None,
            [single] => Some(FlowEstimate {
                track_count: 1,
                mean_velocity: single.velocity_mean[axis],
                velocity_spread: single.velocity_std[axis],
            }),
            _ => {
                let means: Vec<f64> = stats.iter().map(|s| s.velocity_mean[axis]).collect();
                let (mean_velocity, velocity_spread) = mean_std(&means)?;
                Some(FlowEstimate {
                    track_count: stats.len(),
                    mean_velocity,
                    velocity_spread,
                })
            }
        }
    }
}
