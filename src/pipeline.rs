use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::ContinuationResult;
use crate::models::TrainingSample;

/// Context available to all preparation steps
#[derive(Clone, Debug, Default)]
pub struct PipelineContext {
    pub verbose: bool,
}

/// A unit of per-sample preparation work, e.g. image conversion or box
/// generation. Steps produce files next to the sample's session prefix.
pub trait SampleStep: Send + Sync {
    fn process(&self, sample: &TrainingSample, context: &PipelineContext) -> ContinuationResult<()>;

    /// Human-readable name for this step (used in log output)
    fn name(&self) -> &str;
}

/// Ordered list of preparation steps applied to every sample
pub struct Pipeline {
    steps: Vec<Arc<dyn SampleStep>>,
    context: PipelineContext,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            context: PipelineContext::default(),
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.context.verbose = verbose;
        self
    }

    pub fn add_step(mut self, step: Arc<dyn SampleStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Helper method to add a step from a Box (for convenience)
    pub fn add_step_boxed(mut self, step: Box<dyn SampleStep>) -> Self {
        self.steps.push(Arc::from(step));
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step on every sample, sample by sample, and return the
    /// prefixes of the samples that went through; these are the manifest
    /// entries.
    ///
    /// The first failing step aborts the whole run.
    pub fn run(&self, samples: &[TrainingSample]) -> ContinuationResult<Vec<PathBuf>> {
        let mut entries = Vec::with_capacity(samples.len());
        let total = samples.len();

        for (idx, sample) in samples.iter().enumerate() {
            if self.context.verbose {
                info!(sample = %sample.base_name, "processing sample {} of {}", idx + 1, total);
            }
            for step in &self.steps {
                debug!(sample = %sample.base_name, step = step.name(), "running step");
                step.process(sample, &self.context)?;
            }
            entries.push(sample.prefix().to_path_buf());
        }

        Ok(entries)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
