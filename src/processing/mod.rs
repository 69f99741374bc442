//! Per-image jobs and the external converter that executes them

use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::config::{NamingConfig, ResizeConfig};
use crate::error::{Result, ResizeError};

pub mod formats;
pub mod output;
pub mod resize;

pub use formats::*;
pub use output::*;
pub use resize::*;

/// One image's resize task. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    source: PathBuf,
    output: PathBuf,
    filter: ScaleFilter,
    quality: u32,
}

impl Job {
    /// Build the job for `source`, writing into `output_dir`
    pub fn new(
        source: PathBuf,
        output_dir: &Path,
        config: &ResizeConfig,
        naming: &NamingConfig,
    ) -> Result<Self> {
        let output = output::output_path_for(output_dir, &source, naming);
        Ok(Self {
            source,
            output,
            filter: ScaleFilter::from_config(config)?,
            quality: config.quality,
        })
    }

    /// Build one job per input, in input order
    pub fn batch(
        sources: &[PathBuf],
        output_dir: &Path,
        config: &ResizeConfig,
        naming: &NamingConfig,
    ) -> Result<Vec<Self>> {
        sources
            .iter()
            .map(|source| Self::new(source.clone(), output_dir, config, naming))
            .collect()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn filter(&self) -> ScaleFilter {
        self.filter
    }

    pub fn quality(&self) -> u32 {
        self.quality
    }

    /// Source file name as shown in completion notices
    pub fn display_name(&self) -> String {
        self.source
            .file_name()
            .unwrap_or(self.source.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    /// Arguments for the converter, program name excluded.
    ///
    /// `-n` makes the converter refuse to overwrite an existing file, so two
    /// inputs that share a file name cannot clobber each other.
    pub fn converter_args(&self) -> Vec<OsString> {
        vec![
            "-n".into(),
            "-i".into(),
            self.source.clone().into_os_string(),
            "-vf".into(),
            self.filter.to_string().into(),
            "-q:v".into(),
            self.quality.to_string().into(),
            self.output.clone().into_os_string(),
        ]
    }
}

/// How a single conversion ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionStatus {
    /// The converter exited with status 0
    Succeeded,
    /// The converter ran and reported failure (`None` when killed by a signal)
    Failed { exit_code: Option<i32> },
    /// The converter could not be started or the worker died
    SpawnFailed { message: String },
}

impl ConversionStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// Outcome of one job, as collected by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub source: PathBuf,
    pub output: PathBuf,
    pub status: ConversionStatus,
}

impl JobOutcome {
    pub fn new(job: &Job, status: ConversionStatus) -> Self {
        Self {
            source: job.source.clone(),
            output: job.output.clone(),
            status,
        }
    }
}

/// Something that turns a [`Job`] into a resized file
pub trait Converter: Send + Sync + 'static {
    /// Run one conversion to completion
    fn convert(&self, job: &Job) -> impl Future<Output = ConversionStatus> + Send;

    /// Human-readable command for `job`, used by dry runs
    fn describe(&self, job: &Job) -> String;
}

/// Converter backed by an external executable (ffmpeg by default)
#[derive(Debug, Clone)]
pub struct ProcessingEngine {
    program: String,
}

impl ProcessingEngine {
    /// Create an engine that invokes `program`
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Build the converter command with all standard streams discarded
    pub fn command(&self, job: &Job) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(job.converter_args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        command
    }

    /// Process a single job
    pub async fn process_file(&self, job: &Job) -> Result<ConversionStatus> {
        debug!("Running {}", self.describe(job));

        let status = self
            .command(job)
            .status()
            .await
            .map_err(|e| ResizeError::spawn(self.program.clone(), e))?;

        if status.success() {
            Ok(ConversionStatus::Succeeded)
        } else {
            Ok(ConversionStatus::Failed {
                exit_code: status.code(),
            })
        }
    }
}

impl Default for ProcessingEngine {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Converter for ProcessingEngine {
    async fn convert(&self, job: &Job) -> ConversionStatus {
        match self.process_file(job).await {
            Ok(status) => status,
            Err(e) => ConversionStatus::SpawnFailed {
                message: e.user_message(),
            },
        }
    }

    fn describe(&self, job: &Job) -> String {
        std::iter::once(OsString::from(&self.program))
            .chain(job.converter_args())
            .map(|arg| shell_quote(&arg.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Quote an argument for display in a POSIX shell
fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,+@%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
