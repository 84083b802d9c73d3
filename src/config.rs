//! Runtime configuration for a continuation run.
//!
//! Everything here is resolved once at startup (the CLI fills it from flags and
//! environment variables) and then passed into [`crate::Continuation`]. Library
//! code never reads the environment itself.

use std::path::PathBuf;

use crate::{ContinuationError, ContinuationResult};

pub const DEFAULT_MAX_ITERATIONS: u32 = 400;
pub const DEFAULT_TARGET_ERROR_RATE: f64 = 0.01;
pub const DEFAULT_DEBUG_INTERVAL: u32 = 100;

/// Fixed knobs passed to `lstmtraining`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hyperparameters {
    max_iterations: u32,
    target_error_rate: f64,
    debug_interval: u32,
}

impl Hyperparameters {
    pub fn new(
        max_iterations: u32,
        target_error_rate: f64,
        debug_interval: u32,
    ) -> ContinuationResult<Self> {
        if max_iterations == 0 {
            return Err(ContinuationError::InvalidConfig(
                "max_iterations must be greater than zero".into(),
            ));
        }
        if !(target_error_rate > 0.0 && target_error_rate <= 1.0) {
            return Err(ContinuationError::InvalidConfig(format!(
                "target_error_rate must be in (0, 1], got {target_error_rate}"
            )));
        }
        Ok(Self {
            max_iterations,
            target_error_rate,
            debug_interval,
        })
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn target_error_rate(&self) -> f64 {
        self.target_error_rate
    }

    pub fn debug_interval(&self) -> u32 {
        self.debug_interval
    }
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            target_error_rate: DEFAULT_TARGET_ERROR_RATE,
            debug_interval: DEFAULT_DEBUG_INTERVAL,
        }
    }
}

/// Program names (or absolute paths) of the external tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub convert: PathBuf,
    pub tesseract: PathBuf,
    pub lstmtraining: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            convert: PathBuf::from("convert"),
            tesseract: PathBuf::from("tesseract"),
            lstmtraining: PathBuf::from("lstmtraining"),
        }
    }
}

/// How images are turned into TIFF before box generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConverterBackend {
    /// Shell out to the configured `convert` program.
    #[default]
    External,
    /// Re-encode in process with the `image` crate.
    Builtin,
}

#[derive(Debug, Clone, Default)]
pub struct ContinuationConfig {
    pub tools: ToolPaths,
    pub hyperparameters: Hyperparameters,
    /// Directory the session folder is created in. Empty means the current
    /// directory, and manifest entries stay relative.
    pub work_root: PathBuf,
    pub converter: ConverterBackend,
    /// Stop after writing the manifest and building the training command.
    pub skip_training: bool,
    pub verbose: bool,
}

impl ContinuationConfig {
    pub fn with_work_root(mut self, work_root: impl Into<PathBuf>) -> Self {
        self.work_root = work_root.into();
        self
    }

    pub fn with_tools(mut self, tools: ToolPaths) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_hyperparameters(mut self, hyperparameters: Hyperparameters) -> Self {
        self.hyperparameters = hyperparameters;
        self
    }

    pub fn with_converter(mut self, converter: ConverterBackend) -> Self {
        self.converter = converter;
        self
    }

    pub fn with_skip_training(mut self, skip_training: bool) -> Self {
        self.skip_training = skip_training;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}
