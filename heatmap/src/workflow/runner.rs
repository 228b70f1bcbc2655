use crate::loader::survey::{load_background, load_dataset};
use crate::workflow::config::SurveyConfig;
use ab_glyph::FontArc;
use anyhow::Context;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use surveycore::processing::ChannelAggregate;
use surveycore::{HeatmapPipeline, MetricFailure, PipelineStage};

/// File locations for one run.
#[derive(Clone, Debug)]
pub struct RunInputs {
    pub image: PathBuf,
    pub data: PathBuf,
    pub output_dir: PathBuf,
    pub title: String,
}

pub struct WorkflowResult {
    pub written: Vec<PathBuf>,
    pub failures: Vec<MetricFailure>,
    pub failures_by_stage: BTreeMap<PipelineStage, usize>,
    pub channels: ChannelAggregate,
}

#[derive(Clone)]
pub struct Runner {
    config: SurveyConfig,
}

impl Runner {
    pub fn new(config: SurveyConfig) -> Self {
        Self { config }
    }

    /// Loads inputs, renders every metric and writes the successful outputs.
    pub fn execute(
        &self,
        inputs: &RunInputs,
        font: Option<&FontArc>,
    ) -> anyhow::Result<WorkflowResult> {
        let background = load_background(&inputs.image)?;
        log::debug!(
            "Loaded background {} with width={} height={}",
            inputs.image.display(),
            background.width(),
            background.height()
        );
        let dataset = load_dataset(&inputs.data, background.width(), background.height())?;

        let context = self.config.to_run_context(&inputs.title);
        let pipeline = HeatmapPipeline::new(&context, font);
        let report = pipeline
            .run(&dataset, &background)
            .context("rendering survey heat maps")?;

        fs::create_dir_all(&inputs.output_dir).with_context(|| {
            format!("creating output directory {}", inputs.output_dir.display())
        })?;

        let mut written = Vec::with_capacity(report.outputs.len());
        for output in &report.outputs {
            let path = inputs.output_dir.join(&output.file_name);
            log::info!("Writing plot to: {}", path.display());
            write_png(&output.image, &path)?;
            written.push(path);
        }

        let failures_by_stage = report.failures_by_stage();
        for (stage, count) in &failures_by_stage {
            log::info!("{} metric(s) failed during {}", count, stage);
        }
        log::info!(
            "{} metrics rendered, {} failed",
            report.outputs.len(),
            report.failures.len()
        );

        Ok(WorkflowResult {
            written,
            failures: report.failures,
            failures_by_stage,
            channels: report.channels,
        })
    }
}

fn write_png(image: &image::RgbaImage, path: &Path) -> anyhow::Result<()> {
    image
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("writing {}", path.display()))
}
