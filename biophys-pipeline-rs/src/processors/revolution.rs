//! Volume and surface of axisymmetric bodies from a traced outline.
//!
//! The outline is rotated about the horizontal line through the seed pixel.
//! The contour is split into the halves above and below that axis; each half
//! is a profile of radius (distance from the axis) against axial position
//! (column), integrated as a stack of truncated cones. The profile may fold
//! back past its leftmost point to form an internal cavity, whose volume is
//! subtracted. The two halves give two independent estimates that are
//! averaged.

use std::f64::consts::PI;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::contour::{Contour, ContourError, ContourTracer};
use crate::config::RevolutionConfig;
use crate::core::loaders::{load_mask, LoaderError};
use crate::core::mask::{BinaryMask, Pixel};

/// Errors that can occur while measuring a body of revolution.
#[derive(Debug, Error)]
pub enum RevolutionError {
    #[error("contour tracing failed: {0}")]
    Contour(#[from] ContourError),

    #[error("failed to load mask: {0}")]
    Load(#[from] LoaderError),

    #[error("volume {volume} is not positive")]
    DegenerateVolume { volume: f64 },
}

/// Result type for revolution operations.
pub type Result<T> = std::result::Result<T, RevolutionError>;

/// Formula used for the volume of one profile segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeMethod {
    /// Truncated cone: `π/3 · Δx · (y1² + y2² + y1·y2)`.
    #[default]
    Frustum,
    /// Analytic integral of the linearly interpolated radius.
    ClosedForm,
}

/// One side of a split contour as radius against axial position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HalfContour {
    pub radius: Vec<f64>,
    pub axial: Vec<f64>,
}

impl HalfContour {
    #[inline]
    pub fn len(&self) -> usize {
        self.radius.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.radius.is_empty()
    }

    fn push(&mut self, radius: f64, axial: f64) {
        self.radius.push(radius);
        self.axial.push(axial);
    }
}

/// Split a contour into the halves above (`top`) and below (`bottom`) the
/// row of `seed`.
///
/// The contour is first put in counter-clockwise order from the seed, judged
/// by its signed area, so either walk direction yields the same halves. The
/// bottom half keeps walk order, starting at the seed. The top half is
/// collected as the walk returns to the seed, so it is reversed to also start
/// next to the seed and run away from it.
pub fn split_top_bottom(contour: &Contour, seed: Pixel) -> (HalfContour, HalfContour) {
    let ordered = contour.to_counter_clockwise();

    let mut top = HalfContour::default();
    let mut bottom = HalfContour::default();

    for p in ordered.points() {
        let offset = p.row as f64 - seed.row as f64;
        let axial = p.col as f64;
        if offset < 0.0 {
            top.push(-offset, axial);
        } else {
            bottom.push(offset, axial);
        }
    }

    top.radius.reverse();
    top.axial.reverse();

    (top, bottom)
}

#[inline]
fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Signed volume of a truncated cone with radii `y1`, `y2` and height `dx`.
#[inline]
pub fn frustum_segment_volume(y1: f64, y2: f64, dx: f64) -> f64 {
    PI / 3.0 * dx * (y1 * y1 + y2 * y2 + y1 * y2)
}

/// Antiderivative of `π (slope·x + intercept)²` evaluated at `x`.
pub fn revolved_antiderivative(slope: f64, intercept: f64, x: f64) -> f64 {
    if slope == 0.0 {
        PI * intercept * intercept * x
    } else {
        let y = slope * x + intercept;
        PI * y * y * y / (3.0 * slope)
    }
}

/// Signed volume of the segment `(x1, y1)`–`(x2, y2)` from the analytic
/// integral of its line. Vertical segments evaluate to a non-finite value.
pub fn closed_form_segment_volume(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let slope = (y2 - y1) / (x2 - x1);
    let intercept = y1 - slope * x1;
    revolved_antiderivative(slope, intercept, x2) - revolved_antiderivative(slope, intercept, x1)
}

/// Volume swept by rotating the polyline about the axial direction.
///
/// Non-finite segment terms count as zero. The signed sum is returned as a
/// magnitude, so the walking direction does not matter.
pub fn volume_of_revolution(radius: &[f64], axial: &[f64], method: VolumeMethod) -> f64 {
    let total: f64 = radius
        .windows(2)
        .zip(axial.windows(2))
        .map(|(y, x)| {
            let term = match method {
                VolumeMethod::Frustum => frustum_segment_volume(y[0], y[1], x[1] - x[0]),
                VolumeMethod::ClosedForm => closed_form_segment_volume(x[0], y[0], x[1], y[1]),
            };
            finite_or_zero(term)
        })
        .sum();
    total.abs()
}

/// Lateral surface swept by rotating the polyline about the axial direction.
pub fn surface_of_revolution(radius: &[f64], axial: &[f64]) -> f64 {
    radius
        .windows(2)
        .zip(axial.windows(2))
        .map(|(y, x)| {
            let slant = (x[1] - x[0]).hypot(y[1] - y[0]);
            finite_or_zero(PI * (y[0] + y[1]).abs() * slant)
        })
        .sum()
}

/// Net volume of one half, subtracting the cavity in front of the leftmost
/// axial point.
pub fn concave_volume(half: &HalfContour, method: VolumeMethod) -> f64 {
    if half.is_empty() {
        return 0.0;
    }

    let mut border = 0;
    for (i, &x) in half.axial.iter().enumerate() {
        if x < half.axial[border] {
            border = i;
        }
    }

    let body = volume_of_revolution(&half.radius[border..], &half.axial[border..], method);
    let cavity = volume_of_revolution(&half.radius[..=border], &half.axial[..=border], method);
    body - cavity
}

/// Radius of the sphere with the given volume.
pub fn equivalent_sphere_radius(volume: f64) -> f64 {
    (0.75 * volume / PI).cbrt()
}

/// Dimensionless surface area in excess of the equal-volume sphere.
///
/// Zero for a sphere, positive for any other shape.
pub fn excess_area(area: f64, volume: f64) -> f64 {
    4.0 * PI * (area / (36.0 * PI * volume * volume).cbrt() - 1.0)
}

/// Measured body of revolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    #[serde(rename = "V")]
    pub volume: f64,
    #[serde(rename = "R0")]
    pub equivalent_radius: f64,
    #[serde(rename = "dA")]
    pub excess_area: f64,
    #[serde(rename = "A")]
    pub surface_area: f64,
    pub seed: Pixel,
    pub contour: Vec<Pixel>,
}

impl Measurement {
    fn from_totals(volume: f64, area: f64, seed: Pixel, contour: Vec<Pixel>) -> Result<Self> {
        if !(volume.is_finite() && volume > 0.0) {
            return Err(RevolutionError::DegenerateVolume { volume });
        }
        Ok(Self {
            volume,
            equivalent_radius: equivalent_sphere_radius(volume),
            excess_area: excess_area(area, volume),
            surface_area: area,
            seed,
            contour,
        })
    }
}

/// Traces, splits and integrates a contour mask.
#[derive(Debug, Clone, Copy)]
pub struct RevolutionIntegrator {
    pub method: VolumeMethod,
    pub pixel_size: f64,
    pub tracer: ContourTracer,
}

impl Default for RevolutionIntegrator {
    fn default() -> Self {
        Self::new(&RevolutionConfig::default())
    }
}

impl RevolutionIntegrator {
    pub fn new(config: &RevolutionConfig) -> Self {
        Self {
            method: config.volume_method,
            pixel_size: config.pixel_size,
            tracer: ContourTracer::new(config.walk_order),
        }
    }

    /// Averaged volume and surface of the two halves, in pixel units.
    pub fn integrate(&self, top: &HalfContour, bottom: &HalfContour) -> (f64, f64) {
        let volume_top = concave_volume(top, self.method);
        let volume_bottom = concave_volume(bottom, self.method);
        let area_top = surface_of_revolution(&top.radius, &top.axial);
        let area_bottom = surface_of_revolution(&bottom.radius, &bottom.axial);

        debug!(
            "halves: volume {:.3}/{:.3}, area {:.3}/{:.3}",
            volume_top, volume_bottom, area_top, area_bottom
        );

        ((volume_top + volume_bottom) / 2.0, (area_top + area_bottom) / 2.0)
    }

    /// Measure an already traced contour.
    pub fn measure_contour(&self, contour: &Contour, seed: Pixel) -> Result<Measurement> {
        let (top, bottom) = split_top_bottom(contour, seed);
        let (volume, area) = self.integrate(&top, &bottom);

        let s = self.pixel_size;
        Measurement::from_totals(volume * s * s * s, area * s * s, seed, contour.points().to_vec())
    }

    /// Trace the loop through `seed` and measure it.
    pub fn measure(&self, mask: &BinaryMask, seed: Pixel) -> Result<Measurement> {
        let contour = self.tracer.trace(mask, seed)?;
        self.measure_contour(&contour, seed)
    }

    /// Load a mask image and measure the loop through `seed`.
    pub fn measure_mask_file<P: AsRef<Path>>(&self, path: P, seed: Pixel) -> Result<Measurement> {
        let mask = load_mask(path)?;
        self.measure(&mask, seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::contour::WalkOrder;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}"
        );
    }

    fn diamond_mask() -> BinaryMask {
        let mut pixels = Vec::new();
        for r in 0..7usize {
            for c in 0..7usize {
                if r.abs_diff(3) + c.abs_diff(3) == 3 {
                    pixels.push(Pixel::new(r, c));
                }
            }
        }
        BinaryMask::from_pixels(7, 7, &pixels)
    }

    #[test]
    fn test_cylinder_volume() {
        let (r, length) = (2.0, 5.0);
        for n in [1usize, 4, 50] {
            let axial: Vec<f64> = (0..=n).map(|i| length * i as f64 / n as f64).collect();
            let radius = vec![r; n + 1];
            let half = HalfContour {
                radius: radius.clone(),
                axial: axial.clone(),
            };

            let expected = PI * r * r * length;
            assert_close(concave_volume(&half, VolumeMethod::Frustum), expected, 1e-9);
            assert_close(concave_volume(&half, VolumeMethod::ClosedForm), expected, 1e-9);
            assert_close(surface_of_revolution(&radius, &axial), 2.0 * PI * r * length, 1e-9);
        }
    }

    #[test]
    fn test_sphere_converges_with_segments() {
        let r = 3.0;
        let exact = 4.0 / 3.0 * PI * r * r * r;
        let relative_error = |n: usize| {
            let axial: Vec<f64> = (0..=n).map(|i| -r + 2.0 * r * i as f64 / n as f64).collect();
            let radius: Vec<f64> = axial.iter().map(|x| (r * r - x * x).max(0.0).sqrt()).collect();
            (volume_of_revolution(&radius, &axial, VolumeMethod::Frustum) - exact).abs() / exact
        };

        assert!(relative_error(64) < relative_error(8));
        assert!(relative_error(256) < relative_error(64));
        assert!(relative_error(256) < 1e-4);
    }

    #[test]
    fn test_degenerate_segment_contributes_zero() {
        assert_eq!(volume_of_revolution(&[1.0, 3.0], &[2.0, 2.0], VolumeMethod::Frustum), 0.0);
        assert_eq!(volume_of_revolution(&[1.0, 3.0], &[2.0, 2.0], VolumeMethod::ClosedForm), 0.0);
        assert_eq!(volume_of_revolution(&[1.0, 1.0], &[0.0, 0.0], VolumeMethod::ClosedForm), 0.0);

        // A vertical step inside a profile leaves the rest intact
        let v = volume_of_revolution(&[1.0, 1.0, 2.0, 2.0], &[0.0, 1.0, 1.0, 2.0], VolumeMethod::ClosedForm);
        assert!(v.is_finite());
        assert_close(v, PI + 4.0 * PI, 1e-9);
    }

    #[test]
    fn test_closed_form_matches_frustum() {
        assert_close(closed_form_segment_volume(0.0, 1.0, 2.0, 3.0), 26.0 * PI / 3.0, 1e-9);
        assert_close(closed_form_segment_volume(0.0, 3.0, 2.0, 1.0), 26.0 * PI / 3.0, 1e-9);
        assert_close(frustum_segment_volume(1.0, 3.0, 2.0), 26.0 * PI / 3.0, 1e-9);

        let radius = [0.0, 1.0, 2.5, 3.0, 2.0, 0.5];
        let axial = [0.0, 1.0, 3.0, 4.0, 6.0, 7.0];
        assert_close(
            volume_of_revolution(&radius, &axial, VolumeMethod::ClosedForm),
            volume_of_revolution(&radius, &axial, VolumeMethod::Frustum),
            1e-9,
        );
    }

    #[test]
    fn test_walk_direction_does_not_change_volume() {
        let radius = [0.0, 1.0, 2.0, 0.0];
        let axial = [0.0, 1.0, 2.0, 3.0];
        let reversed_r: Vec<f64> = radius.iter().rev().copied().collect();
        let reversed_x: Vec<f64> = axial.iter().rev().copied().collect();

        assert_eq!(
            volume_of_revolution(&radius, &axial, VolumeMethod::Frustum),
            volume_of_revolution(&reversed_r, &reversed_x, VolumeMethod::Frustum)
        );
    }

    #[test]
    fn test_cavity_is_subtracted() {
        let half = HalfContour {
            radius: vec![0.0, 1.0, 2.0, 3.0, 3.0, 0.0],
            axial: vec![2.0, 1.0, 0.0, 1.0, 2.0, 3.0],
        };
        // body 55π/3 minus cavity 8π/3
        assert_close(concave_volume(&half, VolumeMethod::Frustum), 47.0 * PI / 3.0, 1e-9);
        assert_eq!(concave_volume(&HalfContour::default(), VolumeMethod::Frustum), 0.0);
    }

    #[test]
    fn test_sphere_has_zero_excess_area() {
        let r = 2.5;
        let volume = 4.0 / 3.0 * PI * r * r * r;
        assert_close(equivalent_sphere_radius(volume), r, 1e-12);
        assert_close(excess_area(4.0 * PI * r * r, volume), 0.0, 1e-9);
        assert!(excess_area(5.0 * PI * r * r, volume) > 0.0);
    }

    #[test]
    fn test_split_diamond() {
        let mask = diamond_mask();
        let seed = Pixel::new(3, 0);
        let contour = ContourTracer::default().trace(&mask, seed).unwrap();
        let (top, bottom) = split_top_bottom(&contour, seed);

        assert_eq!(top.radius, vec![1.0, 2.0, 3.0, 2.0, 1.0]);
        assert_eq!(top.axial, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(bottom.radius, vec![0.0, 1.0, 2.0, 3.0, 2.0, 1.0, 0.0]);
        assert_eq!(bottom.axial, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert!(top.radius.iter().chain(&bottom.radius).all(|&r| r >= 0.0));
    }

    #[test]
    fn test_measure_diamond() {
        let measurement = RevolutionIntegrator::default()
            .measure(&diamond_mask(), Pixel::new(3, 0))
            .unwrap();

        assert_close(measurement.volume, 53.0 * PI / 3.0, 1e-9);
        assert_close(measurement.surface_area, 17.0 * PI * 2f64.sqrt(), 1e-9);
        assert_close(measurement.equivalent_radius, (53.0f64 / 4.0).cbrt(), 1e-9);
        assert_close(measurement.excess_area, 0.9223224704518714, 1e-9);
        assert_eq!(measurement.seed, Pixel::new(3, 0));
        assert_eq!(measurement.contour.len(), 12);
    }

    #[test]
    fn test_clockwise_trace_gives_same_measurement() {
        let mask = diamond_mask();
        let seed = Pixel::new(3, 0);
        let ccw = RevolutionIntegrator::default().measure(&mask, seed).unwrap();
        let cw = RevolutionIntegrator::new(&RevolutionConfig {
            walk_order: WalkOrder::Clockwise,
            ..RevolutionConfig::default()
        })
        .measure(&mask, seed)
        .unwrap();

        assert_close(cw.volume, ccw.volume, 1e-12);
        assert_close(cw.surface_area, ccw.surface_area, 1e-12);
        assert_ne!(cw.contour, ccw.contour);
    }

    #[test]
    fn test_seed_on_vertical_edge_measures_the_same_both_ways() {
        // Octagon with vertical sides; the seed has set pixels above and below
        let pixels: Vec<Pixel> = [
            (0, 2), (0, 3), (0, 4), (1, 1), (1, 5), (2, 0), (3, 0), (4, 0),
            (2, 6), (3, 6), (4, 6), (5, 1), (5, 5), (6, 2), (6, 3), (6, 4),
        ]
        .iter()
        .map(|&(r, c)| Pixel::new(r, c))
        .collect();
        let mask = BinaryMask::from_pixels(7, 7, &pixels);
        let seed = Pixel::new(3, 0);

        let ccw = RevolutionIntegrator::default().measure(&mask, seed).unwrap();
        let cw = RevolutionIntegrator::new(&RevolutionConfig {
            walk_order: WalkOrder::Clockwise,
            ..RevolutionConfig::default()
        })
        .measure(&mask, seed)
        .unwrap();

        assert_close(ccw.volume, 111.00294042683934, 1e-9);
        assert_close(ccw.surface_area, 111.92683150720117, 1e-9);
        assert_close(cw.volume, ccw.volume, 1e-9);
        assert_close(cw.surface_area, ccw.surface_area, 1e-9);

        let contour = ContourTracer::new(WalkOrder::Clockwise).trace(&mask, seed).unwrap();
        let (top, bottom) = split_top_bottom(&contour, seed);
        assert_eq!(top.axial, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(bottom.axial[..2], [0.0, 0.0]);
    }

    #[test]
    fn test_closed_form_measurement_matches() {
        let mask = diamond_mask();
        let seed = Pixel::new(3, 0);
        let frustum = RevolutionIntegrator::default().measure(&mask, seed).unwrap();
        let closed = RevolutionIntegrator::new(&RevolutionConfig {
            volume_method: VolumeMethod::ClosedForm,
            ..RevolutionConfig::default()
        })
        .measure(&mask, seed)
        .unwrap();

        assert_close(closed.volume, frustum.volume, 1e-9);
    }

    #[test]
    fn test_pixel_size_scaling() {
        let mask = diamond_mask();
        let seed = Pixel::new(3, 0);
        let unit = RevolutionIntegrator::default().measure(&mask, seed).unwrap();
        let scaled = RevolutionIntegrator::new(&RevolutionConfig {
            pixel_size: 0.5,
            ..RevolutionConfig::default()
        })
        .measure(&mask, seed)
        .unwrap();

        assert_close(scaled.volume, unit.volume / 8.0, 1e-9);
        assert_close(scaled.surface_area, unit.surface_area / 4.0, 1e-9);
        assert_close(scaled.equivalent_radius, unit.equivalent_radius / 2.0, 1e-9);
        assert_close(scaled.excess_area, unit.excess_area, 1e-9);
    }

    #[test]
    fn test_broken_contour_is_reported() {
        let mut mask = diamond_mask();
        mask.set(Pixel::new(6, 3), false);

        let err = RevolutionIntegrator::default()
            .measure(&mask, Pixel::new(3, 0))
            .unwrap_err();
        assert!(matches!(err, RevolutionError::Contour(ContourError::DeadEnd { .. })));
    }

    #[test]
    fn test_zero_volume_is_rejected() {
        let err = Measurement::from_totals(0.0, 1.0, Pixel::new(0, 0), Vec::new()).unwrap_err();
        assert!(matches!(err, RevolutionError::DegenerateVolume { .. }));
    }

    #[test]
    fn test_measure_mask_file_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diamond.png");

        let mask = diamond_mask();
        let mut img = image::GrayImage::new(7, 7);
        for r in 0..7u32 {
            for c in 0..7u32 {
                if mask.get(Pixel::new(r as usize, c as usize)) {
                    img.put_pixel(c, r, image::Luma([255]));
                }
            }
        }
        img.save(&path).unwrap();

        let measurement = RevolutionIntegrator::default()
            .measure_mask_file(&path, Pixel::new(3, 0))
            .unwrap();
        assert_close(measurement.volume, 53.0 * PI / 3.0, 1e-9);

        let missing = RevolutionIntegrator::default().measure_mask_file(dir.path().join("nope.png"), Pixel::new(0, 0));
        assert!(matches!(missing, Err(RevolutionError::Load(_))));
    }

    #[test]
    fn test_measurement_json_keys() {
        let measurement = RevolutionIntegrator::default()
            .measure(&diamond_mask(), Pixel::new(3, 0))
            .unwrap();
        let json = serde_json::to_value(&measurement).unwrap();

        for key in ["V", "R0", "dA", "A", "seed", "contour"] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(json["seed"]["row"], 3);
    }
}
