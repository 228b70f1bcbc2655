use serde::{Deserialize, Serialize};
use std::fmt;

/// Shared configuration for the sampling and rendering stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// Grid columns are `image width / grid_divisor`.
    pub grid_divisor: usize,
    pub overlay_alpha: f32,
    pub marker_radius: i32,
    pub marker_outline: i32,
    pub title_band: u32,
    pub colorbar_band: u32,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            grid_divisor: 4,
            overlay_alpha: 0.5,
            marker_radius: 6,
            marker_outline: 1,
            title_band: 32,
            colorbar_band: 72,
        }
    }
}

/// Pipeline stage a per-metric failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PipelineStage {
    Aggregation,
    Interpolation,
    Sampling,
    Normalization,
    Rendering,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Aggregation => "aggregation",
            PipelineStage::Interpolation => "interpolation",
            PipelineStage::Sampling => "sampling",
            PipelineStage::Normalization => "normalization",
            PipelineStage::Rendering => "rendering",
        };
        f.write_str(name)
    }
}

/// Common error type for the heat-map pipeline.
#[derive(thiserror::Error, Debug)]
pub enum HeatmapError {
    #[error("data error: {0}")]
    Data(String),
    #[error("numerical error: {0}")]
    Numerical(String),
    #[error("invalid grid: {0}")]
    InvalidGrid(String),
    #[error("render error: {0}")]
    Render(String),
    #[error("metric {metric} failed during {stage}: {reason}")]
    MetricFailed {
        metric: String,
        stage: PipelineStage,
        reason: String,
    },
}

pub type HeatmapResult<T> = Result<T, HeatmapError>;

/// Scattered-data model that can be queried at arbitrary pixel coordinates.
pub trait Interpolator {
    fn evaluate(&self, x: f64, y: f64) -> f64;
}
