pub mod steps;

use std::ffi::OsString;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::models::TrainingSample;
use crate::session::TrainingSession;
use crate::{ContinuationError, ContinuationResult};

/// Image extensions picked up from the images directory. Matching is
/// case-sensitive.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

pub const GROUND_TRUTH_EXTENSION: &str = "txt";

/// Pair every image in `images_dir` with `<ground_truth_dir>/<base>.txt`.
///
/// Samples come back in directory-listing order. Images without ground truth
/// are left out.
pub fn discover_samples(
    images_dir: &Path,
    ground_truth_dir: &Path,
    session: &TrainingSession,
) -> ContinuationResult<Vec<TrainingSample>> {
    let read_dir = fs::read_dir(images_dir).map_err(|e| ContinuationError::io(images_dir, e))?;

    let mut samples = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| ContinuationError::io(images_dir, e))?;
        let image_path = entry.path();

        let Some(base_name) = image_base_name(&image_path) else {
            continue;
        };
        if !image_path.is_file() {
            continue;
        }

        let mut ground_truth_name = base_name.clone();
        ground_truth_name.push(".");
        ground_truth_name.push(GROUND_TRUTH_EXTENSION);
        let ground_truth_path = ground_truth_dir.join(ground_truth_name);
        if !ground_truth_path.exists() {
            debug!(image = %image_path.display(), "no ground truth, skipping");
            continue;
        }

        samples.push(TrainingSample::new(
            base_name,
            image_path,
            ground_truth_path,
            session,
        ));
    }

    Ok(samples)
}

/// File stem of `path` if its extension is one of [`IMAGE_EXTENSIONS`].
///
/// The stem is returned as-is, so names that are not valid UTF-8 still pair
/// with their ground truth.
pub fn image_base_name(path: &Path) -> Option<OsString> {
    let extension = path.extension()?.to_str()?;
    if !IMAGE_EXTENSIONS.contains(&extension) {
        return None;
    }
    path.file_stem().map(|s| s.to_os_string())
}
