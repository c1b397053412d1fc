//! Minimum track length selection.
//!
//! Longer length cutoffs discard short spurious tracks but shrink the sample.
//! The optimizer scans every cutoff from 2 up to the longest track and picks
//! the one whose surviving tracks give the least spread in the flow-axis
//! velocity estimate, subject to a minimum number of surviving tracks.
//!
//! Candidates are independent, so they are scored in parallel; the collected
//! scores keep ascending-length order and the result matches a sequential scan.

use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;

use super::velocity::VelocityAggregator;
use crate::core::tracks::Track;

/// Smallest candidate length; shorter tracks have no velocity.
pub const MIN_CANDIDATE_LENGTH: usize = 2;

/// Score of one candidate cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LengthScore {
    pub min_length: usize,
    /// Tracks with at least `min_length` points.
    pub track_count: usize,
    /// Velocity spread, or `f64::INFINITY` when too few tracks survive.
    pub score: f64,
}

/// Outcome of a length search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LengthSearch {
    pub best_length: usize,
    pub best_score: f64,
    /// Tracks retained at `best_length`.
    pub track_count: usize,
    /// Every candidate in ascending length order.
    pub scores: Vec<LengthScore>,
}

impl LengthSearch {
    /// True when no candidate met the minimum track count.
    pub fn is_degenerate(&self) -> bool {
        !self.best_score.is_finite()
    }
}

/// Searches the minimum-length cutoff that minimises velocity spread.
#[derive(Debug, Clone, Copy)]
pub struct LengthOptimizer {
    pub min_tracks: usize,
    pub aggregator: VelocityAggregator,
}

impl LengthOptimizer {
    pub fn new(min_tracks: usize, aggregator: VelocityAggregator) -> Self {
        Self {
            min_tracks,
            aggregator,
        }
    }

    /// Score a single cutoff.
    pub fn score(&self, tracks: &[Track], min_length: usize) -> LengthScore {
        let retained: Vec<&Track> = tracks.iter().filter(|t| t.len() >= min_length).collect();
        let track_count = retained.len();

        let score = if track_count < self.min_tracks {
            f64::INFINITY
        } else {
            self.aggregator
                .estimate(retained)
                .map_or(f64::INFINITY, |e| e.velocity_spread)
        };

        LengthScore {
            min_length,
            track_count,
            score,
        }
    }

    /// Scan every cutoff in `[2, longest track]` and return the first minimum.
    pub fn search(&self, tracks: &[Track]) -> LengthSearch {
        let longest = tracks.iter().map(Track::len).max().unwrap_or(0);

        let scores: Vec<LengthScore> = (MIN_CANDIDATE_LENGTH..=longest)
            .into_par_iter()
            .map(|min_length| self.score(tracks, min_length))
            .collect();

        for s in &scores {
            debug!(
                "min length {:>4}: {:>6} tracks, spread {}",
                s.min_length, s.track_count, s.score
            );
        }

        let mut best: Option<LengthScore> = None;
        for &candidate in &scores {
            match best {
                Some(current) if candidate.score >= current.score => {}
                _ => best = Some(candidate),
            }
        }

        let search = match best {
            Some(best) => LengthSearch {
                best_length: best.min_length,
                best_score: best.score,
                track_count: best.track_count,
                scores,
            },
            None => LengthSearch {
                best_length: MIN_CANDIDATE_LENGTH,
                best_score: f64::INFINITY,
                track_count: 0,
                scores,
            },
        };

        if search.is_degenerate() {
            info!(
                "no length cutoff retains {} tracks; falling back to {}",
                self.min_tracks, search.best_length
            );
        } else {
            info!(
                "best min length {} ({} tracks, spread {:.6})",
                search.best_length, search.track_count, search.best_score
            );
        }

        search
    }
}
