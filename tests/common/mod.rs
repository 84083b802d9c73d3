#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from tessresume for tests
pub use tessresume::{
    Continuation, ContinuationConfig, ContinuationError, ContinuationRequest, ConverterBackend,
    TrainingOutcome,
};
