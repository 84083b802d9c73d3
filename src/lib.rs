pub mod config;
pub mod continuation;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod samples;
pub mod session;
pub mod tools;
pub mod training;

pub use config::{ContinuationConfig, ConverterBackend, Hyperparameters, ToolPaths};
pub use continuation::{
    Continuation, ContinuationRequest, run_continuation, run_continuation_with,
};
pub use error::{ContinuationError, ContinuationResult};
pub use models::{ContinuationReport, TrainingOutcome, TrainingSample};
pub use pipeline::{Pipeline, PipelineContext, SampleStep};
pub use session::TrainingSession;
pub use tools::{SystemRunner, ToolCommand, ToolFailure, ToolRunner};
