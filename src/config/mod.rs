//! Configuration management for ffresize

use std::path::{Path, PathBuf};
use serde::Deserialize;
use crate::error::{Result, ResizeError};
use crate::processing::{ExtensionSet, DEFAULT_EXTENSIONS};

pub mod resize;
pub use resize::*;

/// Default upper bound on the longer output side, in pixels
pub const DEFAULT_MAX_LENGTH: u32 = 1999;

/// Default encoder quality (`-q:v`), lower is better
pub const DEFAULT_QUALITY: u32 = 1;

/// Default output directory, relative to the working directory
pub const DEFAULT_OUTPUT_DIR: &str = "resized";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External converter settings
    pub converter: ConverterConfig,

    /// Global processing settings
    pub processing: ProcessingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// External converter configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Executable to invoke, looked up on PATH
    pub program: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
        }
    }
}

/// Global processing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of concurrent conversions (None = one per logical CPU)
    pub threads: Option<usize>,

    /// Upper bound on the longer output side
    pub max_length: u32,

    /// Encoder quality passed through to the converter
    pub quality: u32,

    /// Directory that receives the resized files
    pub output_dir: PathBuf,

    /// Tag inserted between the file stem and its extension
    pub suffix: String,

    /// Extensions picked up by a folder scan (case-insensitive)
    pub extensions: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            threads: None,
            max_length: DEFAULT_MAX_LENGTH,
            quality: DEFAULT_QUALITY,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            suffix: NamingConfig::default().suffix,
            extensions: DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl ProcessingConfig {
    /// Resolve the worker count, falling back to the logical CPU count
    pub fn worker_count(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Resize parameters for every job in the run
    pub fn resize_config(&self) -> ResizeConfig {
        ResizeConfig::new()
            .max_length(self.max_length)
            .quality(self.quality)
    }

    /// Matcher for folder scans
    pub fn extension_set(&self) -> ExtensionSet {
        ExtensionSet::new(&self.extensions)
    }

    /// Naming rule for output files
    pub fn naming(&self) -> NamingConfig {
        NamingConfig {
            suffix: self.suffix.clone(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Emit log lines as JSON
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json_format: false,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ResizeError::config(
                format!("Failed to read config file {:?}: {}", path.as_ref(), e)
            ))?;

        let extension = path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        match extension.to_lowercase().as_str() {
            "toml" => toml::from_str(&content).map_err(Into::into),
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(Into::into),
            _ => Err(ResizeError::config(
                "Unsupported config file format. Use .toml or .yaml"
            )),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.converter.program.trim().is_empty() {
            return Err(ResizeError::config("Converter program must not be empty"));
        }

        if let Some(threads) = self.processing.threads {
            if threads == 0 {
                return Err(ResizeError::config(
                    "Thread count must be greater than 0"
                ));
            }
        }

        self.processing.resize_config().validate()
            .map_err(|e| ResizeError::config(e.to_string()))?;
        self.processing.naming().validate()
            .map_err(|e| ResizeError::config(e.to_string()))?;

        if self.processing.extensions.is_empty() {
            return Err(ResizeError::config(
                "At least one image extension must be configured"
            ));
        }

        for extension in &self.processing.extensions {
            if extension.is_empty() || extension.contains(['.', '/', '\\']) {
                return Err(ResizeError::config(
                    format!("Invalid image extension '{}': give it without a leading dot", extension)
                ));
            }
        }

        Ok(())
    }
}
