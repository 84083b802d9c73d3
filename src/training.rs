use std::path::{Path, PathBuf};

use crate::config::Hyperparameters;
use crate::tools::ToolCommand;

/// Arguments of one `lstmtraining` run that continues from an existing model.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingCommand {
    pub continue_from: PathBuf,
    pub model_output: PathBuf,
    pub traineddata: PathBuf,
    pub train_listfile: PathBuf,
    pub hyperparameters: Hyperparameters,
}

impl TrainingCommand {
    pub fn to_tool_command(&self, program: &Path) -> ToolCommand {
        let hp = &self.hyperparameters;
        ToolCommand::new(program.as_os_str())
            .arg("--continue_from")
            .path_arg(&self.continue_from)
            .arg("--model_output")
            .path_arg(&self.model_output)
            .arg("--traineddata")
            .path_arg(&self.traineddata)
            .arg("--train_listfile")
            .path_arg(&self.train_listfile)
            .arg("--max_iterations")
            .arg(hp.max_iterations().to_string())
            .arg("--target_error_rate")
            .arg(hp.target_error_rate().to_string())
            .arg("--debug_interval")
            .arg(hp.debug_interval().to_string())
    }
}

/// Resume from the checkpoint when one is given, otherwise from the model.
pub fn starting_model<'a>(existing_model: &'a Path, checkpoint: Option<&'a Path>) -> &'a Path {
    checkpoint
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(existing_model)
}
