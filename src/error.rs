//! Error types and handling for ffresize

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ffresize operations
pub type Result<T> = std::result::Result<T, ResizeError>;

/// Main error type for ffresize operations
#[derive(Debug, Error)]
pub enum ResizeError {
    /// I/O related errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The output directory is left over from an earlier run
    #[error("Output directory already exists: {path:?}")]
    OutputDirExists { path: PathBuf },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Invalid resize parameters
    #[error("Invalid resize parameters: {message}")]
    InvalidParameters { message: String },

    /// Input resolution errors
    #[error("Input error: {message} (path: {path:?})")]
    InputError { message: String, path: PathBuf },

    /// The external converter could not be started
    #[error("Failed to start converter '{program}': {source}")]
    SpawnError {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    SerdeError(String),
}

impl ResizeError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new invalid parameters error
    pub fn invalid_parameters<S: Into<String>>(message: S) -> Self {
        Self::InvalidParameters {
            message: message.into(),
        }
    }

    /// Create a new input error
    pub fn input<S: Into<String>>(message: S, path: PathBuf) -> Self {
        Self::InputError {
            message: message.into(),
            path,
        }
    }

    /// Create a new output-directory-exists error
    pub fn output_dir_exists(path: PathBuf) -> Self {
        Self::OutputDirExists { path }
    }

    /// Create a new spawn error
    pub fn spawn<S: Into<String>>(program: S, source: std::io::Error) -> Self {
        Self::SpawnError {
            program: program.into(),
            source,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::OutputDirExists { path } => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                format!("Please remove or rename existing '{}' folder to ensure no file loss", name)
            }
            Self::IoError(e) => format!("File system error: {}", e),
            Self::SpawnError { program, source } => {
                format!("Could not run '{}' ({}). Is it installed and on PATH?", program, source)
            }
            other => other.to_string(),
        }
    }
}

// Convert serde errors to our error type
impl From<toml::de::Error> for ResizeError {
    fn from(err: toml::de::Error) -> Self {
        Self::SerdeError(format!("TOML parsing error: {}", err))
    }
}

impl From<serde_yaml::Error> for ResizeError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::SerdeError(format!("YAML parsing error: {}", err))
    }
}
