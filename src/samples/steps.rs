use std::sync::Arc;

use image::ImageFormat;
use tracing::{debug, info};

use crate::models::TrainingSample;
use crate::pipeline::{PipelineContext, SampleStep};
use crate::tools::{ToolCommand, ToolFailure, ToolRunner};
use crate::{ContinuationError, ContinuationResult};

pub type SharedRunner = Arc<dyn ToolRunner + Send + Sync>;

/// Convert the sample image to TIFF with an external converter
/// (`convert <image> <tiff>`)
pub struct ConvertStep {
    pub program: std::path::PathBuf,
    pub runner: SharedRunner,
}

impl ConvertStep {
    pub fn command(&self, sample: &TrainingSample) -> ToolCommand {
        ToolCommand::new(self.program.as_os_str())
            .path_arg(&sample.image_path)
            .path_arg(&sample.tiff_path())
    }
}

impl SampleStep for ConvertStep {
    fn process(&self, sample: &TrainingSample, _context: &PipelineContext) -> ContinuationResult<()> {
        let command = self.command(sample);
        self.runner
            .run(&command)
            .map_err(|source| ContinuationError::ConversionFailed {
                base_name: sample.base_name.clone(),
                source,
            })
    }

    fn name(&self) -> &str {
        "Image Conversion"
    }
}

/// Convert the sample image to TIFF in process
pub struct ImageConvertStep;

impl SampleStep for ImageConvertStep {
    fn process(&self, sample: &TrainingSample, context: &PipelineContext) -> ContinuationResult<()> {
        let tiff_path = sample.tiff_path();
        let conversion_failed = |source: image::ImageError| ContinuationError::ConversionFailed {
            base_name: sample.base_name.clone(),
            source: ToolFailure::Image(source),
        };

        let img = image::open(&sample.image_path).map_err(conversion_failed)?;
        img.save_with_format(&tiff_path, ImageFormat::Tiff)
            .map_err(conversion_failed)?;

        if context.verbose {
            info!(
                "converted {} ({}x{}) to {}",
                sample.image_path.display(),
                img.width(),
                img.height(),
                tiff_path.display()
            );
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "Builtin Image Conversion"
    }
}

/// Generate the box file for the converted TIFF
/// (`tesseract <tiff> <prefix> batch.nochop makebox`)
pub struct MakeBoxStep {
    pub program: std::path::PathBuf,
    pub runner: SharedRunner,
}

impl MakeBoxStep {
    pub fn command(&self, sample: &TrainingSample) -> ToolCommand {
        ToolCommand::new(self.program.as_os_str())
            .path_arg(&sample.tiff_path())
            .path_arg(sample.prefix())
            .args(["batch.nochop", "makebox"])
    }
}

impl SampleStep for MakeBoxStep {
    fn process(&self, sample: &TrainingSample, _context: &PipelineContext) -> ContinuationResult<()> {
        let command = self.command(sample);
        self.runner
            .run(&command)
            .map_err(|source| ContinuationError::SegmentationFailed {
                base_name: sample.base_name.clone(),
                source,
            })?;
        debug!(box_file = %sample.box_path().display(), "box file generated");
        Ok(())
    }

    fn name(&self) -> &str {
        "Box Generation"
    }
}
