//! Configuration types for the analysis pipelines.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::tracks::Axis;
use crate::processors::contour::WalkOrder;
use crate::processors::filtering::SidestepPolicy;
use crate::processors::revolution::VolumeMethod;

/// Column layout of the track table and the dominant flow direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Field holding the integer track identifier
    #[serde(default = "default_id_column")]
    pub id_column: usize,

    /// Fields read into position components 0 and 1
    #[serde(default = "default_position_columns")]
    pub position_columns: [usize; 2],

    /// Position component treated as the flow (along) axis
    #[serde(default = "default_flow_axis")]
    pub flow_axis: Axis,
}

fn default_id_column() -> usize {
    1
}

fn default_position_columns() -> [usize; 2] {
    [4, 3] // MOSAIC writes x in field 3, y in field 4
}

fn default_flow_axis() -> Axis {
    Axis::Second
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            id_column: default_id_column(),
            position_columns: default_position_columns(),
            flow_axis: default_flow_axis(),
        }
    }
}

/// Configuration for track rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Reject tracks that reverse direction along the flow axis
    #[serde(default = "default_backstep")]
    pub backstep: bool,

    /// Lateral drift policy; `null` disables the check
    #[serde(default = "default_sidestep")]
    pub sidestep: Option<SidestepPolicy>,

    /// Minimum net displacement along the flow axis
    #[serde(default)]
    pub min_displacement: f64,

    /// Fixed minimum track length; `null` selects it with the optimizer
    #[serde(default)]
    pub min_length: Option<usize>,
}

fn default_backstep() -> bool {
    true
}

fn default_sidestep() -> Option<SidestepPolicy> {
    Some(SidestepPolicy::Hard)
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            backstep: default_backstep(),
            sidestep: default_sidestep(),
            min_displacement: 0.0,
            min_length: None,
        }
    }
}

/// Configuration for the minimum-length search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Minimum number of tracks a length candidate must retain
    #[serde(default = "default_min_tracks")]
    pub min_tracks: usize,
}

fn default_min_tracks() -> usize {
    10
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            min_tracks: default_min_tracks(),
        }
    }
}

/// Configuration for solid-of-revolution measurements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevolutionConfig {
    /// Segment volume formula
    #[serde(default)]
    pub volume_method: VolumeMethod,

    /// Rotational sense of the contour walk
    #[serde(default)]
    pub walk_order: WalkOrder,

    /// Physical length of one pixel
    #[serde(default = "default_pixel_size")]
    pub pixel_size: f64,
}

fn default_pixel_size() -> f64 {
    1.0
}

impl Default for RevolutionConfig {
    fn default() -> Self {
        Self {
            volume_method: VolumeMethod::default(),
            walk_order: WalkOrder::default(),
            pixel_size: default_pixel_size(),
        }
    }
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub tracking: TrackingConfig,

    #[serde(default)]
    pub filtering: FilterConfig,

    #[serde(default)]
    pub optimizer: OptimizerConfig,

    #[serde(default)]
    pub revolution: RevolutionConfig,
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
