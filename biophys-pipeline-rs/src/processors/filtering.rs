//! Track rejection by direction, lateral drift, displacement and length.
//!
//! All filters consume a track set and return the surviving tracks in their
//! original order. Tracks with fewer than two points have no velocity and
//! never pass a velocity-based check.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::{FilterConfig, TrackingConfig};
use crate::core::tracks::{Axis, Track};

/// How lateral (cross-axis) motion is compared against flow-axis motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SidestepPolicy {
    /// Reject when the largest cross-axis speed exceeds the smallest
    /// flow-axis speed anywhere on the track.
    Hard,
    /// Reject when any single step moves at least as far sideways as along.
    Soft,
}

/// True when the flow-axis velocity never changes sign.
///
/// Zero-velocity steps are neutral.
pub fn passes_backstep(track: &Track, flow_axis: Axis) -> bool {
    if !track.has_steps() {
        return false;
    }
    let along: Vec<f64> = track.step_components(flow_axis).collect();
    along.iter().all(|&v| v >= 0.0) || along.iter().all(|&v| v <= 0.0)
}

/// True when the track's lateral drift is acceptable under `policy`.
pub fn passes_sidestep(track: &Track, flow_axis: Axis, policy: SidestepPolicy) -> bool {
    if !track.has_steps() {
        return false;
    }
    let along = flow_axis.index();
    let cross = flow_axis.other().index();

    match policy {
        SidestepPolicy::Hard => {
            let max_cross = track
                .step_velocities()
                .map(|v| v[cross].abs())
                .fold(f64::NEG_INFINITY, f64::max);
            let min_along = track
                .step_velocities()
                .map(|v| v[along].abs())
                .fold(f64::INFINITY, f64::min);
            max_cross <= min_along
        }
        SidestepPolicy::Soft => track
            .step_velocities()
            .all(|v| v[cross].abs() < v[along].abs()),
    }
}

/// Directional plausibility filter combining the backstep and sidestep checks.
#[derive(Debug, Clone, Copy)]
pub struct DirectionalFilter {
    pub flow_axis: Axis,
    pub backstep: bool,
    pub sidestep: Option<SidestepPolicy>,
}

impl DirectionalFilter {
    pub fn new(tracking: &TrackingConfig, filtering: &FilterConfig) -> Self {
        Self {
            flow_axis: tracking.flow_axis,
            backstep: filtering.backstep,
            sidestep: filtering.sidestep,
        }
    }

    /// True when the track passes every enabled check.
    pub fn accepts(&self, track: &Track) -> bool {
        if !track.has_steps() {
            return false;
        }
        if self.backstep && !passes_backstep(track, self.flow_axis) {
            return false;
        }
        match self.sidestep {
            Some(policy) => passes_sidestep(track, self.flow_axis, policy),
            None => true,
        }
    }

    pub fn apply(&self, tracks: Vec<Track>) -> Vec<Track> {
        let before = tracks.len();
        let kept: Vec<Track> = tracks.into_iter().filter(|t| self.accepts(t)).collect();
        debug!(
            "directional filter kept {} of {} tracks (backstep={}, sidestep={:?})",
            kept.len(),
            before,
            self.backstep,
            self.sidestep
        );
        kept
    }
}

/// Rejects tracks whose net flow-axis displacement is too small.
#[derive(Debug, Clone, Copy)]
pub struct DeltaFilter {
    pub flow_axis: Axis,
    pub min_displacement: f64,
}

impl DeltaFilter {
    pub fn new(tracking: &TrackingConfig, filtering: &FilterConfig) -> Self {
        Self {
            flow_axis: tracking.flow_axis,
            min_displacement: filtering.min_displacement,
        }
    }

    pub fn accepts(&self, track: &Track) -> bool {
        track.displacement(self.flow_axis).abs() >= self.min_displacement
    }

    pub fn apply(&self, tracks: Vec<Track>) -> Vec<Track> {
        let before = tracks.len();
        let kept: Vec<Track> = tracks.into_iter().filter(|t| self.accepts(t)).collect();
        debug!(
            "delta filter kept {} of {} tracks (min displacement {})",
            kept.len(),
            before,
            self.min_displacement
        );
        kept
    }
}

/// Keep tracks with at least `min_length` points.
pub fn filter_by_length(tracks: Vec<Track>, min_length: usize) -> Vec<Track> {
    tracks.into_iter().filter(|t| t.len() >= min_length).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Track on the default flow axis (component 1) with the given step velocities.
    fn track_with_steps(id: i64, cross: &[f64], along: &[f64]) -> Track {
        assert_eq!(cross.len(), along.len());
        let mut positions = vec![[0.0, 0.0]];
        for (c, a) in cross.iter().zip(along) {
            let last = positions[positions.len() - 1];
            positions.push([last[0] + c, last[1] + a]);
        }
        Track::from_positions(id, positions)
    }

    fn along_only(along: &[f64]) -> Track {
        track_with_steps(0, &vec![0.0; along.len()], along)
    }

    #[test]
    fn test_backstep_rejects_reversal() {
        assert!(!passes_backstep(&along_only(&[1.0, 1.0, -1.0]), Axis::Second));
    }

    #[test]
    fn test_backstep_accepts_monotonic_and_zero_steps() {
        assert!(passes_backstep(&along_only(&[1.0, 1.0, 1.0]), Axis::Second));
        assert!(passes_backstep(&along_only(&[-1.0, -1.0, -1.0]), Axis::Second));
        assert!(passes_backstep(&along_only(&[0.0, 1.0, 0.0]), Axis::Second));
    }

    #[test]
    fn test_backstep_uses_flow_axis() {
        // Reversal only on component 1; component 0 is monotonic
        let track = track_with_steps(0, &[1.0, 1.0], &[1.0, -1.0]);
        assert!(passes_backstep(&track, Axis::First));
        assert!(!passes_backstep(&track, Axis::Second));
    }

    #[test]
    fn test_hard_sidestep() {
        let rejected = track_with_steps(0, &[5.0, 0.0], &[1.0, 10.0]);
        let accepted = track_with_steps(1, &[0.5, 0.5], &[1.0, 10.0]);

        assert!(!passes_sidestep(&rejected, Axis::Second, SidestepPolicy::Hard));
        assert!(passes_sidestep(&accepted, Axis::Second, SidestepPolicy::Hard));
    }

    #[test]
    fn test_hard_is_whole_track_soft_is_per_step() {
        // Each step moves further along than sideways, but the largest sideways
        // step (2) exceeds the smallest along step (1).
        let track = track_with_steps(0, &[0.5, 2.0], &[1.0, 10.0]);

        assert!(!passes_sidestep(&track, Axis::Second, SidestepPolicy::Hard));
        assert!(passes_sidestep(&track, Axis::Second, SidestepPolicy::Soft));
    }

    #[test]
    fn test_soft_rejects_equal_step() {
        let track = track_with_steps(0, &[0.0, 3.0], &[1.0, -3.0]);
        assert!(!passes_sidestep(&track, Axis::Second, SidestepPolicy::Soft));
    }

    #[test]
    fn test_single_point_tracks_are_excluded() {
        let single = Track::from_positions(0, vec![[1.0, 1.0]]);
        let filter = DirectionalFilter {
            flow_axis: Axis::Second,
            backstep: false,
            sidestep: None,
        };

        assert!(!passes_backstep(&single, Axis::Second));
        assert!(!passes_sidestep(&single, Axis::Second, SidestepPolicy::Soft));
        assert!(!filter.accepts(&single));
    }

    #[test]
    fn test_directional_filter_composition() {
        let filter = DirectionalFilter::new(&TrackingConfig::default(), &FilterConfig::default());
        let tracks = vec![
            track_with_steps(1, &[0.1, 0.1], &[1.0, 2.0]),   // passes both
            track_with_steps(2, &[0.1, 0.1], &[1.0, -2.0]),  // backstep
            track_with_steps(3, &[3.0, 0.0], &[1.0, 2.0]),   // sidestep
            track_with_steps(4, &[-0.2, 0.2], &[-1.0, -1.0]), // passes both
        ];

        let kept = filter.apply(tracks);
        let ids: Vec<i64> = kept.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn test_disabled_checks() {
        let filter = DirectionalFilter {
            flow_axis: Axis::Second,
            backstep: false,
            sidestep: None,
        };
        assert!(filter.accepts(&track_with_steps(0, &[9.0, 9.0], &[1.0, -1.0])));
    }

    #[test]
    fn test_delta_filter() {
        let filter = DeltaFilter {
            flow_axis: Axis::Second,
            min_displacement: 2.5,
        };
        let tracks = vec![
            along_only(&[1.0, 1.0]),
            along_only(&[-1.0, -2.0]),
            Track::from_positions(9, vec![[0.0, 0.0]]),
        ];

        let kept = filter.apply(tracks);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].displacement(Axis::Second), -3.0);
    }

    #[test]
    fn test_filter_by_length() {
        let tracks = vec![
            along_only(&[1.0]),
            along_only(&[1.0, 1.0, 1.0]),
            along_only(&[1.0, 1.0]),
        ];
        let kept = filter_by_length(tracks, 3);
        let lengths: Vec<usize> = kept.iter().map(Track::len).collect();
        assert_eq!(lengths, vec![4, 3]);
    }

    #[test]
    fn test_empty_input_is_valid() {
        let filter = DirectionalFilter::new(&TrackingConfig::default(), &FilterConfig::default());
        assert!(filter.apply(Vec::new()).is_empty());
        assert!(filter_by_length(Vec::new(), 2).is_empty());
    }
}
