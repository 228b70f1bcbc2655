use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use surveycore::prelude::StageConfig;
use surveycore::RunContext;

/// Upper bound for the title and colour-bar margins, in pixels.
const MAX_BAND: u32 = 1024;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    pub grid_divisor: usize,
    pub overlay_alpha: f32,
    pub marker_radius: i32,
    pub marker_outline: i32,
    pub title_band: u32,
    pub colorbar_band: u32,
    pub ignore_ssids: Vec<String>,
    pub fail_fast: bool,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        let stage = StageConfig::default();
        Self {
            grid_divisor: stage.grid_divisor,
            overlay_alpha: stage.overlay_alpha,
            marker_radius: stage.marker_radius,
            marker_outline: stage.marker_outline,
            title_band: stage.title_band,
            colorbar_band: stage.colorbar_band,
            ignore_ssids: Vec::new(),
            fail_fast: false,
        }
    }
}

impl SurveyConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading survey config {}", path_ref.display()))?;
        let config: SurveyConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing survey config {}", path_ref.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Command-line ignores are appended; `--fail-fast` can only switch it on.
    pub fn merge_args(mut self, ignore: &[String], fail_fast: bool) -> Self {
        for ssid in ignore {
            if !self.ignore_ssids.contains(ssid) {
                self.ignore_ssids.push(ssid.clone());
            }
        }
        self.fail_fast |= fail_fast;
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.grid_divisor > 0, "grid_divisor must be positive");
        ensure!(
            (0.0..=1.0).contains(&self.overlay_alpha),
            "overlay_alpha must lie in [0, 1], got {}",
            self.overlay_alpha
        );
        ensure!(self.marker_radius > 0, "marker_radius must be positive");
        ensure!(self.marker_outline >= 0, "marker_outline cannot be negative");
        ensure!(
            self.title_band <= MAX_BAND,
            "title_band must be at most {} pixels, got {}",
            MAX_BAND,
            self.title_band
        );
        ensure!(
            self.colorbar_band <= MAX_BAND,
            "colorbar_band must be at most {} pixels, got {}",
            MAX_BAND,
            self.colorbar_band
        );
        Ok(())
    }

    pub fn to_stage_config(&self) -> StageConfig {
        StageConfig {
            grid_divisor: self.grid_divisor,
            overlay_alpha: self.overlay_alpha,
            marker_radius: self.marker_radius,
            marker_outline: self.marker_outline,
            title_band: self.title_band,
            colorbar_band: self.colorbar_band,
        }
    }

    pub fn to_run_context(&self, title: &str) -> RunContext {
        RunContext {
            config: self.to_stage_config(),
            fail_fast: self.fail_fast,
            ..RunContext::new(title)
        }
        .with_excluded(self.ignore_ssids.iter().cloned())
    }
}
