//! ffresize CLI - batch image resizer
//!
//! Scales every image of a folder, or every image named on the command
//! line, so that its longer side is at most `--max-length` pixels, using one
//! converter process per CPU core.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use console::style;
use tracing::{info, warn};

use ffresize::{
    init_logging, Config, Converter, InputSource, Job, OutputDirectory, ParallelProcessor,
    ProcessingEngine, ResizeError,
};

/// Exit status when `--strict` is set and a conversion failed
const EXIT_CONVERSION_FAILED: u8 = 2;

/// ffresize - batch image resizer
#[derive(Parser)]
#[command(
    name = "ffresize",
    version,
    about = "Batch resize images to a maximum width/height with ffmpeg",
    long_about = "Batch resize images so that no side is longer than a given maximum, \
                  preserving aspect ratio, with a given ffmpeg quality setting. One ffmpeg \
                  process runs per CPU core and results land in a fresh output directory."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output directory; must not exist yet
    #[arg(short, long, value_name = "DIR", global = true)]
    output: Option<PathBuf>,

    /// Number of concurrent conversions (default: CPU count)
    #[arg(short, long, value_name = "COUNT", value_parser = parse_threads, global = true)]
    threads: Option<usize>,

    /// Converter executable
    #[arg(long, value_name = "PROGRAM", env = "FFRESIZE_CONVERTER", global = true)]
    converter: Option<String>,

    /// Configuration file (.toml or .yaml)
    #[arg(short, long, value_name = "FILE", env = "FFRESIZE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Print the converter commands without running them
    #[arg(long, global = true)]
    dry_run: bool,

    /// Exit with status 2 if any conversion failed
    #[arg(long, global = true)]
    strict: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (errors only, no per-file notices)
    #[arg(short = 'Q', long, conflicts_with = "verbose", global = true)]
    quiet: bool,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Convert all images in a folder. Searches for .jpg, .JPG, and .jpeg files
    Folder {
        /// Folder holding images to convert
        #[arg(value_name = "DIR", default_value = ".")]
        dir: PathBuf,

        #[command(flatten)]
        resize: ResizeArgs,
    },
    /// Convert all given image files
    Image {
        /// Image files to convert
        #[arg(value_name = "PATH", required = true, num_args = 1..)]
        images: Vec<PathBuf>,

        #[command(flatten)]
        resize: ResizeArgs,
    },
}

impl Commands {
    fn resize_args(&self) -> &ResizeArgs {
        match self {
            Self::Folder { resize, .. } | Self::Image { resize, .. } => resize,
        }
    }
}

/// Resize parameters shared by both subcommands
#[derive(Args)]
struct ResizeArgs {
    /// Maximum length of any side after resizing [default: 1999]
    #[arg(short, long, value_name = "PIXELS", value_parser = clap::value_parser!(u32).range(1..))]
    max_length: Option<u32>,

    /// Quality setting for ffmpeg, influences resulting file size, higher = worse [default: 1]
    #[arg(short, long, value_name = "QUALITY")]
    quality: Option<u32>,
}

/// Parse a worker count, rejecting zero
fn parse_threads(s: &str) -> Result<usize, String> {
    let count = s
        .parse::<usize>()
        .map_err(|_| "Thread count must be a whole number".to_string())?;

    if count == 0 {
        return Err("Thread count must be greater than 0".to_string());
    }

    Ok(count)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            let message = match e.downcast_ref::<ResizeError>() {
                Some(guard @ ResizeError::OutputDirExists { .. }) => guard.user_message(),
                _ => format!("{:#}", e),
            };
            eprintln!("{}: {}", style("Error").red().bold(), message);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    apply_overrides(&mut config, &cli);
    config.validate()?;

    let log_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    init_logging(log_level, config.logging.json_format)?;

    if let Some(path) = &cli.config {
        info!("Loaded configuration from: {:?}", path);
    }

    let source = match &cli.command {
        Commands::Folder { dir, .. } => InputSource::Folder {
            root: dir.clone(),
            extensions: config.processing.extension_set(),
        },
        Commands::Image { images, .. } => InputSource::Images(images.clone()),
    };

    let inputs = source.resolve().await?;
    if let Some(ignored) = inputs.ignored {
        println!("Ignoring {} files", ignored);
    }
    println!("Found {} images", inputs.images.len());

    let resize_config = config.processing.resize_config();
    println!(
        "Resizing images to max length (any side) {} with quality {}",
        resize_config.max_length, resize_config.quality
    );

    let output_dir = &config.processing.output_dir;
    let jobs = Job::batch(
        &inputs.images,
        output_dir,
        &resize_config,
        &config.processing.naming(),
    )?;
    let engine = ProcessingEngine::new(config.converter.program.clone());

    if cli.dry_run {
        for job in &jobs {
            println!("{}", engine.describe(job));
        }
        return Ok(ExitCode::SUCCESS);
    }

    OutputDirectory::create(output_dir)
        .await
        .with_context(|| format!("Cannot create output directory {:?}", output_dir))?;

    let processor = ParallelProcessor::new(engine, Some(config.processing.worker_count()))
        .announce(!cli.quiet);
    let result = processor.process_batch(jobs).await;

    println!("Finished processing {} files.", result.processed());
    info!(
        "Processed {} files in {:.2}s ({:.1} files/s)",
        result.processed(),
        result.processing_time.as_secs_f64(),
        result.files_per_second()
    );

    if result.failed() > 0 {
        warn!(
            "{} of {} conversions failed (is '{}' installed?)",
            result.failed(),
            result.processed(),
            config.converter.program
        );

        if cli.strict {
            eprintln!(
                "{}: {} of {} conversions failed",
                style("Error").red().bold(),
                result.failed(),
                result.processed()
            );
            for failure in result.failures() {
                eprintln!("  {}: {:?}", failure.source.display(), failure.status);
            }
            return Ok(ExitCode::from(EXIT_CONVERSION_FAILED));
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Layer command-line values over the config file
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(output) = &cli.output {
        config.processing.output_dir = output.clone();
    }
    if let Some(threads) = cli.threads {
        config.processing.threads = Some(threads);
    }
    if let Some(program) = &cli.converter {
        config.converter.program = program.clone();
    }

    let resize = cli.command.resize_args();
    if let Some(max_length) = resize.max_length {
        config.processing.max_length = max_length;
    }
    if let Some(quality) = resize.quality {
        config.processing.quality = quality;
    }
}
