//! ffresize - batch image resizer driven by an external converter
//!
//! Every input image becomes one invocation of an external tool (ffmpeg by
//! default) that scales the longer side down to a maximum length while
//! keeping the aspect ratio. Invocations run in parallel, one per CPU core,
//! and write into a fresh output directory.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ffresize::{Job, NamingConfig, OutputDirectory, ParallelProcessor, ProcessingEngine, ResizeConfig};
//! use std::path::PathBuf;
//!
//! # async fn run() -> ffresize::Result<()> {
//! let output = OutputDirectory::create("resized").await?;
//! let config = ResizeConfig::new().max_length(1999).quality(1);
//!
//! let jobs = Job::batch(
//!     &[PathBuf::from("a.jpg"), PathBuf::from("b.jpeg")],
//!     output.path(),
//!     &config,
//!     &NamingConfig::default(),
//! )?;
//!
//! let processor = ParallelProcessor::new(ProcessingEngine::default(), None);
//! let result = processor.process_batch(jobs).await;
//! println!("Finished processing {} files.", result.processed());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod input;
pub mod parallel;
pub mod processing;

// Re-export commonly used types
pub use config::{Config, NamingConfig, ResizeConfig};
pub use error::{Result, ResizeError};
pub use input::{InputSet, InputSource};
pub use parallel::{BatchProcessingResult, ParallelProcessor};
pub use processing::{
    target_dimensions, ConversionStatus, Converter, ExtensionSet, Job, JobOutcome,
    OutputDirectory, ProcessingEngine, ScaleFilter,
};

use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install a stderr tracing subscriber.
///
/// `RUST_LOG` wins over `default_level` when set. Calling this more than
/// once keeps the first subscriber.
pub fn init_logging(default_level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| ResizeError::config(format!("Invalid log level '{}': {}", default_level, e)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = if json {
        tracing::subscriber::set_global_default(builder.json().finish()).is_ok()
    } else {
        tracing::subscriber::set_global_default(builder.finish()).is_ok()
    };

    if installed {
        debug!("ffresize v{} initialized", VERSION);
    }

    Ok(())
}
