use crate::prelude::PipelineStage;
use crate::survey::Metric;
use log::{debug, info, warn};

/// Per-run logging scope; every line is prefixed with the survey title.
pub struct LogManager {
    scope: String,
}

impl LogManager {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
        }
    }

    pub fn record(&self, message: &str) {
        info!("[{}] {}", self.scope, message);
    }

    pub fn stage(&self, metric: Metric, stage: PipelineStage, message: &str) {
        debug!("[{}] {} {}: {}", self.scope, metric, stage, message);
    }

    pub fn failure(&self, metric: Metric, stage: PipelineStage, reason: &str) {
        warn!("[{}] {} failed during {}: {}", self.scope, metric, stage, reason);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new("survey")
    }
}
