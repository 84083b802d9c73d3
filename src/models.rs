use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::ContinuationError;
use crate::session::TrainingSession;
use crate::tools::ToolCommand;

/// An image paired with its ground-truth transcription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingSample {
    /// File stem of the image, lossily decoded; for messages only.
    pub base_name: String,
    pub image_path: PathBuf,
    pub ground_truth_path: PathBuf,
    /// `<session>/<base_name>`; the `.tiff` and `.box` files hang off it.
    pub prefix: PathBuf,
}

impl TrainingSample {
    pub fn new(
        stem: impl AsRef<OsStr>,
        image_path: PathBuf,
        ground_truth_path: PathBuf,
        session: &TrainingSession,
    ) -> Self {
        let stem = stem.as_ref();
        Self {
            base_name: stem.to_string_lossy().into_owned(),
            prefix: session.sample_prefix(stem),
            image_path,
            ground_truth_path,
        }
    }

    pub fn tiff_path(&self) -> PathBuf {
        self.with_suffix("tiff")
    }

    pub fn box_path(&self) -> PathBuf {
        self.with_suffix("box")
    }

    // Base names may contain dots, so append rather than `with_extension`.
    fn with_suffix(&self, extension: &str) -> PathBuf {
        let mut path = self.prefix.clone().into_os_string();
        path.push(".");
        path.push(extension);
        PathBuf::from(path)
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }
}

#[derive(Debug)]
pub enum TrainingOutcome {
    Completed,
    /// Training was not attempted (prepare-only run).
    Skipped,
    /// The trainer failed; the session can be resumed from its last checkpoint.
    Failed(ContinuationError),
}

impl TrainingOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TrainingOutcome::Completed)
    }
}

#[derive(Debug)]
pub struct ContinuationReport {
    pub session_dir: PathBuf,
    /// `YYYYMMDD_HHMMSS` suffix of the session directory.
    pub timestamp: String,
    pub manifest_path: PathBuf,
    /// Manifest entries (sample prefixes), in processing order.
    pub samples: Vec<PathBuf>,
    pub training_command: ToolCommand,
    pub outcome: TrainingOutcome,
}
