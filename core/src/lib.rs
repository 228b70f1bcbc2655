//! Interpolation and rendering core for Wi-Fi site-survey heat maps.
//!
//! Sparse measurements taken at known floor-plan positions are reshaped per metric,
//! fitted with an exact linear radial-basis interpolant, sampled on a regular grid and
//! composited over the floor plan together with the raw sample markers. Scan results
//! are summarised separately as mean quality per channel.

pub mod math;
pub mod pipeline;
pub mod prelude;
pub mod processing;
pub mod render;
pub mod survey;
pub mod telemetry;

pub use pipeline::{HeatmapPipeline, MetricFailure, MetricOutput, RunContext, SurveyReport};
pub use prelude::{HeatmapError, HeatmapResult, Interpolator, PipelineStage, StageConfig};
