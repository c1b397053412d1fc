//! Particle track types.
//!
//! A [`Track`] is the ordered list of position samples that share one track
//! identifier, together with the per-step velocity derived from consecutive
//! positions. Every point carries a velocity slot so positions and velocities
//! always have the same length; the slot of the final point is `None`.

use serde::{Deserialize, Serialize};

/// Two-component vector used for positions and velocities.
pub type Vector2 = [f64; 2];

/// Coordinate component of a [`Vector2`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Component 0.
    First,
    /// Component 1.
    Second,
}

impl Axis {
    /// Index of this component inside a [`Vector2`].
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::First => 0,
            Axis::Second => 1,
        }
    }

    /// The transverse component.
    #[inline]
    pub fn other(self) -> Axis {
        match self {
            Axis::First => Axis::Second,
            Axis::Second => Axis::First,
        }
    }
}

/// Which sample of a trajectory record to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Position,
    Velocity,
}

/// Position sample paired with the velocity of the step that leaves it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryRecord {
    pub position: Vector2,
    /// `None` on the final point of a track.
    pub velocity: Option<Vector2>,
}

/// Ordered sequence of samples sharing one track identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: i64,
    pub points: Vec<TrajectoryRecord>,
}

impl Track {
    /// Build a track from its positions, deriving finite-difference velocities.
    pub fn from_positions(id: i64, positions: Vec<Vector2>) -> Self {
        let n = positions.len();
        let mut points = Vec::with_capacity(n);

        for i in 0..n {
            let velocity = positions.get(i + 1).map(|next| {
                let current = positions[i];
                [next[0] - current[0], next[1] - current[1]]
            });
            points.push(TrajectoryRecord {
                position: positions[i],
                velocity,
            });
        }

        Self { id, points }
    }

    /// Number of position samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True when at least one step (and therefore one velocity) exists.
    #[inline]
    pub fn has_steps(&self) -> bool {
        self.points.len() >= 2
    }

    /// All records except the final one, whose velocity is missing.
    pub fn steps(&self) -> &[TrajectoryRecord] {
        match self.points.len() {
            0 => &[],
            n => &self.points[..n - 1],
        }
    }

    /// Velocities of every defined step.
    pub fn step_velocities(&self) -> impl Iterator<Item = Vector2> + '_ {
        self.steps().iter().filter_map(|record| record.velocity)
    }

    /// Velocity component along `axis` for every defined step.
    pub fn step_components(&self, axis: Axis) -> impl Iterator<Item = f64> + '_ {
        let idx = axis.index();
        self.step_velocities().map(move |v| v[idx])
    }

    /// Read the `[point][kind][axis]` view of the track.
    ///
    /// Returns `None` when `point` is out of range or the velocity is missing.
    pub fn value(&self, point: usize, kind: Kind, axis: Axis) -> Option<f64> {
        let record = self.points.get(point)?;
        match kind {
            Kind::Position => Some(record.position[axis.index()]),
            Kind::Velocity => record.velocity.map(|v| v[axis.index()]),
        }
    }

    /// Net displacement along `axis` between the first and last sample.
    pub fn displacement(&self, axis: Axis) -> f64 {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => last.position[axis.index()] - first.position[axis.index()],
            _ => 0.0,
        }
    }
}
