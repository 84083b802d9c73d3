use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::{ImageBuffer, Rgb};
use tessresume::{ToolCommand, ToolFailure, ToolRunner};

/// A fake tool runner that records every command and mimics the side effects
/// of `convert` and `tesseract ... makebox`.
///
/// Clones share the same call log.
#[derive(Clone, Default)]
pub struct RecordingRunner {
    calls: Arc<Mutex<Vec<ToolCommand>>>,
    failures: Vec<(String, Option<String>)>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every invocation of `program`.
    pub fn failing(mut self, program: &str) -> Self {
        self.failures.push((program.to_string(), None));
        self
    }

    /// Fail invocations of `program` whose arguments mention `needle`.
    pub fn failing_for(mut self, program: &str, needle: &str) -> Self {
        self.failures
            .push((program.to_string(), Some(needle.to_string())));
        self
    }

    pub fn calls(&self) -> Vec<ToolCommand> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded calls of one program, rendered as argument lists.
    pub fn calls_to(&self, program: &str) -> Vec<Vec<String>> {
        self.calls()
            .iter()
            .filter(|c| program_name(c) == program)
            .map(|c| c.args_lossy())
            .collect()
    }

    fn should_fail(&self, command: &ToolCommand) -> bool {
        let name = program_name(command);
        let rendered = command.args_lossy().join(" ");
        self.failures.iter().any(|(program, needle)| {
            *program == name && needle.as_ref().is_none_or(|n| rendered.contains(n.as_str()))
        })
    }
}

fn program_name(command: &ToolCommand) -> String {
    Path::new(&command.program)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl ToolRunner for RecordingRunner {
    fn run(&self, command: &ToolCommand) -> Result<(), ToolFailure> {
        self.calls.lock().unwrap().push(command.clone());

        let name = program_name(command);
        if self.should_fail(command) {
            return Err(ToolFailure::Exit {
                program: name,
                code: Some(1),
            });
        }

        // Raw arguments, so sample names that are not UTF-8 land on disk intact.
        let args = &command.args;
        match name.as_str() {
            "convert" => {
                fs::write(&args[1], b"fake tiff").expect("failed to write fake tiff");
            }
            "tesseract" => {
                let mut box_file = args[1].clone();
                box_file.push(".box");
                fs::write(box_file, b"a 0 0 1 1 0\n").expect("failed to write fake box file");
            }
            _ => {}
        }
        Ok(())
    }
}

/// Input directories for a continuation run.
pub struct TrainingInputs {
    pub root: tempfile::TempDir,
    pub model: PathBuf,
    pub images: PathBuf,
    pub ground_truth: PathBuf,
    pub work_root: PathBuf,
}

/// Creates a temp tree with `eng.traineddata`, an empty `images/`,
/// `ground_truth/` and `work/` directory.
pub fn create_training_inputs() -> TrainingInputs {
    let root = tempfile::TempDir::new().expect("Failed to create temp directory");
    let model = root.path().join("eng.traineddata");
    fs::write(&model, b"TRAINEDDATA\x00\x01\x02").expect("Failed to write model");

    let images = root.path().join("images");
    let ground_truth = root.path().join("ground_truth");
    let work_root = root.path().join("work");
    for dir in [&images, &ground_truth, &work_root] {
        fs::create_dir(dir).expect("Failed to create input directory");
    }

    TrainingInputs {
        root,
        model,
        images,
        ground_truth,
        work_root,
    }
}

impl TrainingInputs {
    /// Write a small PNG-encoded image regardless of the file extension.
    pub fn add_image(&self, file_name: impl AsRef<Path>) -> PathBuf {
        let path = self.images.join(file_name);
        let img = ImageBuffer::from_fn(24, 12, |x, y| Rgb([(x * 8) as u8, (y * 16) as u8, 200u8]));
        img.save_with_format(&path, image::ImageFormat::Png)
            .expect("Failed to save test image");
        path
    }

    pub fn add_ground_truth(&self, base_name: impl AsRef<OsStr>, text: &str) -> PathBuf {
        let mut file_name = base_name.as_ref().to_os_string();
        file_name.push(".txt");
        let path = self.ground_truth.join(file_name);
        fs::write(&path, text).expect("Failed to write ground truth");
        path
    }

    /// Base names of the images in directory-listing order.
    pub fn listing_order(&self) -> Vec<String> {
        fs::read_dir(&self.images)
            .expect("Failed to read images dir")
            .map(|e| e.expect("Failed to read dir entry").path())
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect()
    }
}
