use crate::prelude::{HeatmapError, HeatmapResult, PipelineStage, StageConfig};
use crate::processing::aggregate::{DataAggregator, MetricTable};
use crate::processing::channels::{ChannelAggregate, ChannelAggregator};
use crate::processing::grid::{GridField, GridSampler, GridSpec};
use crate::processing::interpolate::RbfInterpolator;
use crate::render::colormap::Normalizer;
use crate::render::compose::Renderer;
use crate::survey::{Dataset, Metric};
use crate::telemetry::LogManager;
use ab_glyph::FontArc;
use image::RgbaImage;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Everything a single run needs besides the data itself.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub title: String,
    pub excluded_ssids: BTreeSet<String>,
    pub config: StageConfig,
    pub fail_fast: bool,
}

impl RunContext {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            excluded_ssids: BTreeSet::new(),
            config: StageConfig::default(),
            fail_fast: false,
        }
    }

    pub fn with_excluded<I, S>(mut self, ssids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_ssids.extend(ssids.into_iter().map(Into::into));
        self
    }
}

/// Rendered heat map for one metric, ready to be written out.
#[derive(Debug, Clone)]
pub struct MetricOutput {
    pub metric: Metric,
    pub file_name: String,
    pub title: String,
    pub field: GridField,
    pub legend: Normalizer,
    pub image: RgbaImage,
}

/// Why a metric produced no output.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFailure {
    pub metric: Metric,
    pub stage: PipelineStage,
    pub reason: String,
}

impl fmt::Display for MetricFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed during {}: {}", self.metric, self.stage, self.reason)
    }
}

impl From<MetricFailure> for HeatmapError {
    fn from(failure: MetricFailure) -> Self {
        HeatmapError::MetricFailed {
            metric: failure.metric.key().to_string(),
            stage: failure.stage,
            reason: failure.reason,
        }
    }
}

/// Outcome of a full run.
#[derive(Debug, Clone)]
pub struct SurveyReport {
    pub outputs: Vec<MetricOutput>,
    pub failures: Vec<MetricFailure>,
    pub channels: ChannelAggregate,
}

impl SurveyReport {
    pub fn output(&self, metric: Metric) -> Option<&MetricOutput> {
        self.outputs.iter().find(|o| o.metric == metric)
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failure counts per stage, in pipeline order.
    pub fn failures_by_stage(&self) -> BTreeMap<PipelineStage, usize> {
        let mut tally = BTreeMap::new();
        for failure in &self.failures {
            *tally.entry(failure.stage).or_insert(0) += 1;
        }
        tally
    }
}

/// Runs the aggregate -> interpolate -> sample -> colour -> render chain per metric.
pub struct HeatmapPipeline<'a> {
    context: &'a RunContext,
    font: Option<&'a FontArc>,
    logger: LogManager,
}

impl<'a> HeatmapPipeline<'a> {
    pub fn new(context: &'a RunContext, font: Option<&'a FontArc>) -> Self {
        Self {
            context,
            font,
            logger: LogManager::new(context.title.clone()),
        }
    }

    pub fn run(&self, dataset: &Dataset, background: &RgbaImage) -> HeatmapResult<SurveyReport> {
        if background.dimensions() != (dataset.width(), dataset.height()) {
            return Err(HeatmapError::Data(format!(
                "background is {}x{} but dataset extent is {}x{}",
                background.width(),
                background.height(),
                dataset.width(),
                dataset.height()
            )));
        }

        let channels = ChannelAggregator::aggregate(dataset, &self.context.excluded_ssids);
        for usage in channels.iter() {
            self.logger.record(&usage.to_string());
        }

        let table = DataAggregator::aggregate(dataset)?;
        let spec = GridSpec::for_image(
            dataset.width(),
            dataset.height(),
            self.context.config.grid_divisor,
        )?;
        self.logger.record(&format!(
            "{} points, {}x{} grid",
            table.real_len(),
            spec.num_x,
            spec.num_y
        ));

        let mut outputs = Vec::new();
        let mut failures = Vec::new();
        for metric in Metric::ALL {
            match self.render_metric(&table, spec, metric, background) {
                Ok(output) => outputs.push(output),
                Err(failure) => {
                    self.logger
                        .failure(failure.metric, failure.stage, &failure.reason);
                    if self.context.fail_fast {
                        return Err(failure.into());
                    }
                    failures.push(failure);
                }
            }
        }

        Ok(SurveyReport {
            outputs,
            failures,
            channels,
        })
    }

    pub fn render_metric(
        &self,
        table: &MetricTable,
        spec: GridSpec,
        metric: Metric,
        background: &RgbaImage,
    ) -> Result<MetricOutput, MetricFailure> {
        let fail = move |stage: PipelineStage| {
            move |err: HeatmapError| MetricFailure {
                metric,
                stage,
                reason: err.to_string(),
            }
        };

        let column = table
            .column(metric)
            .map_err(fail(PipelineStage::Aggregation))?;
        let model = RbfInterpolator::fit_column(&column)
            .map_err(fail(PipelineStage::Interpolation))?;
        self.logger.stage(
            metric,
            PipelineStage::Interpolation,
            &format!("fitted {} centres", model.centers().len()),
        );

        let field = GridSampler::new(spec)
            .sample(&model)
            .map_err(fail(PipelineStage::Sampling))?;
        let legend = Normalizer::from_field(&field).map_err(fail(PipelineStage::Normalization))?;
        self.logger.stage(
            metric,
            PipelineStage::Normalization,
            &format!("field range [{}, {}]", legend.min(), legend.max()),
        );

        let title = metric.plot_title(&self.context.title);
        let image = Renderer::new(&self.context.config, self.font)
            .render(background, &field, &column, &title)
            .map_err(fail(PipelineStage::Rendering))?;

        Ok(MetricOutput {
            metric,
            file_name: metric.output_file_name(&self.context.title),
            title,
            field,
            legend,
            image,
        })
    }
}
