//! Resume LSTM training on a fresh batch of labelled images.
//!
//! A run creates a timestamped session directory, backs up the model, turns
//! every image that has ground truth into a TIFF plus box file, writes the
//! training manifest and finally hands everything to `lstmtraining`.
//!
//! Failures before training abort the run and leave the partially populated
//! session directory behind for inspection. A failing trainer does not: the
//! session is still returned so training can be resumed from its checkpoint.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use crate::config::{ContinuationConfig, ConverterBackend};
use crate::models::{ContinuationReport, TrainingOutcome};
use crate::pipeline::Pipeline;
use crate::samples::discover_samples;
use crate::samples::steps::{ConvertStep, ImageConvertStep, MakeBoxStep, SharedRunner};
use crate::session::TrainingSession;
use crate::tools::{SystemRunner, ToolRunner};
use crate::training::{TrainingCommand, starting_model};
use crate::{ContinuationError, ContinuationResult};

/// Inputs of one continuation run.
#[derive(Debug, Clone)]
pub struct ContinuationRequest {
    pub existing_model: PathBuf,
    pub images_dir: PathBuf,
    pub ground_truth_dir: PathBuf,
    pub checkpoint: Option<PathBuf>,
}

impl ContinuationRequest {
    pub fn new(
        existing_model: impl Into<PathBuf>,
        images_dir: impl Into<PathBuf>,
        ground_truth_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            existing_model: existing_model.into(),
            images_dir: images_dir.into(),
            ground_truth_dir: ground_truth_dir.into(),
            checkpoint: None,
        }
    }

    pub fn with_checkpoint(mut self, checkpoint: Option<PathBuf>) -> Self {
        self.checkpoint = checkpoint;
        self
    }
}

pub struct Continuation {
    config: ContinuationConfig,
    runner: SharedRunner,
}

impl Continuation {
    /// Orchestrator that runs real subprocesses.
    pub fn new(config: ContinuationConfig) -> Self {
        Self::with_runner(config, Arc::new(SystemRunner))
    }

    pub fn with_runner(config: ContinuationConfig, runner: SharedRunner) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &ContinuationConfig {
        &self.config
    }

    /// Build the per-sample preparation pipeline for the configured backend.
    pub fn preparation_pipeline(&self) -> Pipeline {
        let tools = &self.config.tools;
        let pipeline = Pipeline::new().with_verbose(self.config.verbose);
        let pipeline = match self.config.converter {
            ConverterBackend::External => pipeline.add_step_boxed(Box::new(ConvertStep {
                program: tools.convert.clone(),
                runner: self.runner.clone(),
            })),
            ConverterBackend::Builtin => pipeline.add_step_boxed(Box::new(ImageConvertStep)),
        };
        pipeline.add_step_boxed(Box::new(MakeBoxStep {
            program: tools.tesseract.clone(),
            runner: self.runner.clone(),
        }))
    }

    /// Run with the session timestamped at the current local time.
    pub fn run(&self, request: &ContinuationRequest) -> ContinuationResult<ContinuationReport> {
        self.run_at(request, TrainingSession::now())
    }

    pub fn run_at(
        &self,
        request: &ContinuationRequest,
        created_at: OffsetDateTime,
    ) -> ContinuationResult<ContinuationReport> {
        let session = TrainingSession::create(&self.config.work_root, created_at)?;
        session.backup_model(&request.existing_model)?;

        info!("creating training data");
        let samples = discover_samples(&request.images_dir, &request.ground_truth_dir, &session)?;
        info!(count = samples.len(), "found images with ground truth");

        let pipeline = self.preparation_pipeline();
        debug!(steps = ?pipeline.step_names(), "preparing samples");
        let entries = pipeline.run(&samples)?;
        let manifest_path = session.write_manifest(&entries)?;

        info!("generating training command");
        let start = starting_model(&request.existing_model, request.checkpoint.as_deref());
        let training_command = TrainingCommand {
            continue_from: start.to_path_buf(),
            model_output: session.output_prefix(),
            traineddata: request.existing_model.clone(),
            train_listfile: manifest_path.clone(),
            hyperparameters: self.config.hyperparameters,
        }
        .to_tool_command(&self.config.tools.lstmtraining);
        info!(command = %training_command, "training command ready");

        let outcome = if self.config.skip_training {
            info!("prepare-only run, not starting training");
            TrainingOutcome::Skipped
        } else {
            info!("starting training");
            match self.runner.run(&training_command) {
                Ok(()) => {
                    info!("training completed successfully");
                    TrainingOutcome::Completed
                }
                Err(source) => {
                    let err = ContinuationError::TrainingFailed { source };
                    error!(error = %err, "training failed");
                    warn!(
                        session = %session.root().display(),
                        "training can be continued from the last checkpoint later"
                    );
                    TrainingOutcome::Failed(err)
                }
            }
        };

        Ok(ContinuationReport {
            session_dir: session.root().to_path_buf(),
            timestamp: session.timestamp().to_string(),
            manifest_path,
            samples: entries,
            training_command,
            outcome,
        })
    }
}

/// Run a continuation with default settings and real tools, returning the
/// session directory.
///
/// Setup and preparation errors propagate; a training failure is logged and
/// the session directory is still returned.
pub fn run_continuation(
    existing_model: &Path,
    images_dir: &Path,
    ground_truth_dir: &Path,
    checkpoint: Option<&Path>,
) -> ContinuationResult<PathBuf> {
    let request = ContinuationRequest::new(existing_model, images_dir, ground_truth_dir)
        .with_checkpoint(checkpoint.map(Path::to_path_buf));
    let report = Continuation::new(ContinuationConfig::default()).run(&request)?;
    Ok(report.session_dir)
}

/// Same as [`run_continuation`] with an explicit runner, mostly for embedding
/// and tests.
pub fn run_continuation_with<R>(
    runner: R,
    config: ContinuationConfig,
    request: &ContinuationRequest,
) -> ContinuationResult<PathBuf>
where
    R: ToolRunner + Send + Sync + 'static,
{
    let report = Continuation::with_runner(config, Arc::new(runner)).run(request)?;
    Ok(report.session_dir)
}
