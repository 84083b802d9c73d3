use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::process::Command;

use tracing::debug;

/// A single external program invocation: the program plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.as_os_str())
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Arguments as lossy UTF-8 strings, mainly for logging and assertions.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

/// Renders the command the way it would be typed in a shell.
impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program.to_string_lossy()))?;
        for arg in &self.args {
            write!(f, " {}", quote(&arg.to_string_lossy()))?;
        }
        Ok(())
    }
}

fn quote(word: &str) -> String {
    let needs_quotes = word.is_empty()
        || word
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '$' | '`' | '\\'));
    if needs_quotes {
        let escaped = word
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('$', "\\$")
            .replace('`', "\\`");
        format!("\"{escaped}\"")
    } else {
        word.to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolFailure {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {}", describe_code(.code))]
    Exit { program: String, code: Option<i32> },
    #[error("in-process image conversion failed: {0}")]
    Image(#[from] image::ImageError),
}

fn describe_code(code: &Option<i32>) -> String {
    match *code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Executes tool commands. The orchestrator only talks to external programs
/// through this trait.
pub trait ToolRunner {
    fn run(&self, command: &ToolCommand) -> Result<(), ToolFailure>;
}

impl<T: ToolRunner + ?Sized> ToolRunner for &T {
    fn run(&self, command: &ToolCommand) -> Result<(), ToolFailure> {
        (**self).run(command)
    }
}

/// Runs commands as real child processes, blocking until each one exits.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, command: &ToolCommand) -> Result<(), ToolFailure> {
        let program = command.program.to_string_lossy().into_owned();
        debug!(command = %command, "running tool");

        // `status` waits on the child before returning, including on error paths.
        let status = Command::new(&command.program)
            .args(&command.args)
            .status()
            .map_err(|source| ToolFailure::Spawn {
                program: program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(ToolFailure::Exit {
                program,
                code: status.code(),
            });
        }
        Ok(())
    }
}
