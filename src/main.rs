use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tessresume::config::{
    DEFAULT_DEBUG_INTERVAL, DEFAULT_MAX_ITERATIONS, DEFAULT_TARGET_ERROR_RATE,
};
use tessresume::{
    Continuation, ContinuationConfig, ContinuationRequest, ConverterBackend, Hyperparameters,
    ToolPaths, TrainingOutcome,
};

#[derive(Parser)]
#[command(name = "tessresume")]
#[command(version, about = "Continue Tesseract LSTM training on new labelled images")]
struct Cli {
    /// Existing .traineddata model to continue from
    #[arg(value_name = "MODEL")]
    existing_model: PathBuf,

    /// Directory with new training images (.png, .jpg, .jpeg)
    #[arg(value_name = "IMAGES_DIR")]
    images_dir: PathBuf,

    /// Directory with one <name>.txt ground-truth file per image
    #[arg(value_name = "GROUND_TRUTH_DIR")]
    ground_truth_dir: PathBuf,

    /// Resume from this checkpoint instead of the model
    #[arg(long, value_name = "PATH")]
    checkpoint: Option<PathBuf>,

    /// Directory to create the session folder in (default: current directory)
    #[arg(long, value_name = "DIR")]
    work_root: Option<PathBuf>,

    /// How images are converted to TIFF
    #[arg(long, value_enum, default_value_t = Converter::External)]
    converter: Converter,

    /// Image converter program
    #[arg(long, env = "TESSRESUME_CONVERT", default_value = "convert")]
    convert_bin: PathBuf,

    /// Tesseract program used for box generation
    #[arg(long, env = "TESSRESUME_TESSERACT", default_value = "tesseract")]
    tesseract_bin: PathBuf,

    /// LSTM trainer program
    #[arg(long, env = "TESSRESUME_LSTMTRAINING", default_value = "lstmtraining")]
    lstmtraining_bin: PathBuf,

    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    max_iterations: u32,

    #[arg(long, default_value_t = DEFAULT_TARGET_ERROR_RATE)]
    target_error_rate: f64,

    #[arg(long, default_value_t = DEFAULT_DEBUG_INTERVAL)]
    debug_interval: u32,

    /// Prepare the session and print the training command without running it
    #[arg(long)]
    prepare_only: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum Converter {
    /// ImageMagick `convert`
    External,
    /// Built-in conversion, no external converter needed
    Builtin,
}

impl From<Converter> for ConverterBackend {
    fn from(value: Converter) -> Self {
        match value {
            Converter::External => ConverterBackend::External,
            Converter::Builtin => ConverterBackend::Builtin,
        }
    }
}

/// Log filter from `RUST_LOG`, falling back to our own crate at info (debug
/// with `--verbose`) only when `RUST_LOG` is unset or empty.
fn log_filter(verbose: bool, rust_log: Option<&str>) -> anyhow::Result<EnvFilter> {
    let default_directive: Directive = if verbose {
        "tessresume=debug"
    } else {
        "tessresume=info"
    }
    .parse()?;
    Ok(EnvFilter::builder()
        .with_default_directive(default_directive)
        .parse_lossy(rust_log.unwrap_or_default()))
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::registry()
        .with(log_filter(args.verbose, rust_log.as_deref())?)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let hyperparameters =
        Hyperparameters::new(args.max_iterations, args.target_error_rate, args.debug_interval)?;
    let config = ContinuationConfig::default()
        .with_work_root(args.work_root.unwrap_or_default())
        .with_tools(ToolPaths {
            convert: args.convert_bin,
            tesseract: args.tesseract_bin,
            lstmtraining: args.lstmtraining_bin,
        })
        .with_hyperparameters(hyperparameters)
        .with_converter(args.converter.into())
        .with_skip_training(args.prepare_only)
        .with_verbose(args.verbose);

    let request = ContinuationRequest::new(
        &args.existing_model,
        &args.images_dir,
        &args.ground_truth_dir,
    )
    .with_checkpoint(args.checkpoint);

    let continuation = Continuation::new(config);

    if args.verbose {
        let config = continuation.config();
        println!("Model: {}", request.existing_model.display());
        println!("Images: {}", request.images_dir.display());
        println!("Ground truth: {}", request.ground_truth_dir.display());
        if let Some(checkpoint) = &request.checkpoint {
            println!("Checkpoint: {}", checkpoint.display());
        }
        if !config.work_root.as_os_str().is_empty() {
            println!("Work root: {}", config.work_root.display());
        }
        println!(
            "Preparation steps: {}",
            continuation.preparation_pipeline().step_names().join(" -> ")
        );
        println!();
    }

    let report = continuation
        .run(&request)
        .with_context(|| {
            format!(
                "failed to prepare training continuation for {}",
                request.existing_model.display()
            )
        })?;

    println!("\n=== Training Continuation ===");
    println!("Samples prepared: {}", report.samples.len());
    if args.verbose {
        for sample in &report.samples {
            println!("  {}", sample.display());
        }
    }
    println!("\nTraining command:\n{}", report.training_command);

    match &report.outcome {
        TrainingOutcome::Completed => println!("\nTraining completed successfully!"),
        TrainingOutcome::Skipped => println!("\nTraining not started (--prepare-only)."),
        TrainingOutcome::Failed(err) => {
            println!("\n{}", err);
            println!("You can continue from the last checkpoint later.");
        }
    }

    println!(
        "\nTraining files and output saved in: {} (session {})",
        report.session_dir.display(),
        report.timestamp
    );

    Ok(())
}
