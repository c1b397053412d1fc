//! Ordered contour tracing on one-pixel-wide closed curves.
//!
//! The mask must hold a single closed loop in which every pixel has exactly
//! two 8-neighbours. Starting from a seed on the loop, the walk scans the
//! neighbours of the current pixel in a fixed cyclic order and steps to the
//! first set neighbour that is not the pixel it just came from. The walk is
//! only accepted if it visits every set pixel exactly once and ends next to
//! the seed; branches, gaps and thick regions surface as a [`ContourError`]
//! instead of a partial trace.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::mask::{BinaryMask, Pixel};

/// Neighbour offsets `(drow, dcol)` in counter-clockwise order, starting below
/// the current pixel.
pub const NEIGHBORS_CCW: [(isize, isize); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Neighbour offsets in clockwise order, starting above the current pixel.
///
/// Mirror image of [`NEIGHBORS_CCW`] about the row axis, so a seed with one
/// neighbour on each side of its row leaves in opposite directions.
pub const NEIGHBORS_CW: [(isize, isize); 8] = [
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
];

/// Rotational sense of the neighbour scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkOrder {
    #[default]
    CounterClockwise,
    Clockwise,
}

impl WalkOrder {
    pub fn neighbors(self) -> &'static [(isize, isize); 8] {
        match self {
            WalkOrder::CounterClockwise => &NEIGHBORS_CCW,
            WalkOrder::Clockwise => &NEIGHBORS_CW,
        }
    }
}

/// Errors that can occur while tracing a contour.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContourError {
    #[error("seed ({row}, {col}) lies outside the {rows}x{cols} mask")]
    SeedOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("seed ({row}, {col}) is not a contour pixel")]
    SeedNotOnContour { row: usize, col: usize },

    #[error("walk stopped at ({row}, {col}) after {visited} of {expected} pixels")]
    DeadEnd {
        row: usize,
        col: usize,
        visited: usize,
        expected: usize,
    },

    #[error("walk returned to ({row}, {col}) after {visited} of {expected} pixels")]
    Revisit {
        row: usize,
        col: usize,
        visited: usize,
        expected: usize,
    },

    #[error("walk ended at ({row}, {col}), which does not touch the seed")]
    NotClosed { row: usize, col: usize },
}

/// Result type for contour operations.
pub type Result<T> = std::result::Result<T, ContourError>;

/// Closed, ordered sequence of contour pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    points: Vec<Pixel>,
    order: WalkOrder,
}

impl Contour {
    #[inline]
    pub fn points(&self) -> &[Pixel] {
        &self.points
    }

    /// Rotational sense the contour was traced with.
    #[inline]
    pub fn order(&self) -> WalkOrder {
        self.order
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True when every consecutive pair, including last to first, is 8-adjacent.
    pub fn is_closed(&self) -> bool {
        let n = self.points.len();
        n >= 2 && (0..n).all(|i| self.points[i].is_adjacent(self.points[(i + 1) % n]))
    }

    /// Shoelace area over `(row, col)` coordinates.
    ///
    /// Positive when the loop runs counter-clockwise on screen (rows down,
    /// columns right), negative when clockwise.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        let twice: i64 = (0..n)
            .map(|i| {
                let a = self.points[i];
                let b = self.points[(i + 1) % n];
                a.row as i64 * b.col as i64 - b.row as i64 * a.col as i64
            })
            .sum();
        twice as f64 / 2.0
    }

    /// The same loop in counter-clockwise order from the same seed.
    ///
    /// Orientation is read from the geometry, not from the scan order the
    /// walk used, since both scans can take the same first step.
    pub fn to_counter_clockwise(&self) -> Contour {
        if self.signed_area() >= 0.0 {
            return Contour {
                points: self.points.clone(),
                order: WalkOrder::CounterClockwise,
            };
        }
        let mut points = Vec::with_capacity(self.points.len());
        points.extend(self.points.first().copied());
        points.extend(self.points.iter().skip(1).rev().copied());
        Contour {
            points,
            order: WalkOrder::CounterClockwise,
        }
    }
}

/// Walks a closed one-pixel-wide curve in a fixed rotational sense.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContourTracer {
    pub order: WalkOrder,
}

impl ContourTracer {
    pub fn new(order: WalkOrder) -> Self {
        Self { order }
    }

    /// First set neighbour of `current` in scan order, skipping `previous`.
    fn next_pixel(&self, mask: &BinaryMask, current: Pixel, previous: Option<Pixel>) -> Option<Pixel> {
        self.order
            .neighbors()
            .iter()
            .filter_map(|&(dr, dc)| current.offset(dr, dc))
            .find(|&p| mask.get(p) && Some(p) != previous)
    }

    /// Trace the loop through `seed`.
    ///
    /// # Errors
    ///
    /// Fails when the seed is not a set pixel, or the walk cannot visit every
    /// set pixel exactly once and finish next to the seed.
    pub fn trace(&self, mask: &BinaryMask, seed: Pixel) -> Result<Contour> {
        if !mask.contains(seed) {
            return Err(ContourError::SeedOutOfBounds {
                row: seed.row,
                col: seed.col,
                rows: mask.rows(),
                cols: mask.cols(),
            });
        }
        if !mask.get(seed) {
            return Err(ContourError::SeedNotOnContour {
                row: seed.row,
                col: seed.col,
            });
        }

        let expected = mask.count_nonzero();
        let mut visited = BinaryMask::new(mask.rows(), mask.cols());
        visited.set(seed, true);

        let mut points = Vec::with_capacity(expected);
        points.push(seed);

        let mut previous: Option<Pixel> = None;
        let mut current = seed;

        while points.len() < expected {
            let next = self.next_pixel(mask, current, previous).ok_or(ContourError::DeadEnd {
                row: current.row,
                col: current.col,
                visited: points.len(),
                expected,
            })?;

            if visited.get(next) {
                return Err(ContourError::Revisit {
                    row: next.row,
                    col: next.col,
                    visited: points.len(),
                    expected,
                });
            }

            visited.set(next, true);
            points.push(next);
            previous = Some(current);
            current = next;
        }

        if !current.is_adjacent(seed) {
            return Err(ContourError::NotClosed {
                row: current.row,
                col: current.col,
            });
        }

        Ok(Contour {
            points,
            order: self.order,
        })
    }
}
