use std::path::PathBuf;

use crate::tools::ToolFailure;

#[derive(Debug, thiserror::Error)]
pub enum ContinuationError {
    #[error("io error at {path}: {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to convert image for sample '{base_name}': {source}")]
    ConversionFailed {
        base_name: String,
        #[source]
        source: ToolFailure,
    },
    #[error("failed to generate box file for sample '{base_name}': {source}")]
    SegmentationFailed {
        base_name: String,
        #[source]
        source: ToolFailure,
    },
    #[error("training failed: {source}")]
    TrainingFailed {
        #[source]
        source: ToolFailure,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ContinuationError {
    /// Wrap an io error together with the path it was raised for.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type ContinuationResult<T> = std::result::Result<T, ContinuationError>;
