//! Per-run resize parameters and output naming

use std::ffi::{OsStr, OsString};
use std::path::{Component, Path};
use crate::error::{Result, ResizeError};

/// Resize parameters shared by every job of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeConfig {
    /// Upper bound, in pixels, on the longer output side
    pub max_length: u32,
    /// Encoder quality passed through unchanged (lower = better)
    pub quality: u32,
}

impl ResizeConfig {
    /// Create a new resize configuration with the default bounds
    pub fn new() -> Self {
        Self {
            max_length: super::DEFAULT_MAX_LENGTH,
            quality: super::DEFAULT_QUALITY,
        }
    }

    /// Set the maximum side length
    pub fn max_length(mut self, max_length: u32) -> Self {
        self.max_length = max_length;
        self
    }

    /// Set quality
    pub fn quality(mut self, quality: u32) -> Self {
        self.quality = quality;
        self
    }

    /// Validate resize parameters
    pub fn validate(&self) -> Result<()> {
        if self.max_length == 0 {
            return Err(ResizeError::invalid_parameters(
                "Maximum length must be at least 1 pixel"
            ));
        }
        Ok(())
    }
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Naming rule for output files: `<stem><suffix><.ext>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingConfig {
    pub suffix: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            suffix: "_resized".to_string(),
        }
    }
}

impl NamingConfig {
    /// Generate the output file name for an input path.
    ///
    /// A path without a file name still gets one: `..` keeps `..` as its
    /// stem and a bare root gets an empty stem. The result never contains a
    /// path separator.
    pub fn output_file_name(&self, input: &Path) -> OsString {
        let stem = input.file_stem().unwrap_or_else(|| match input.components().next_back() {
            Some(Component::ParentDir) => OsStr::new(".."),
            _ => OsStr::new(""),
        });

        let mut name = OsString::with_capacity(stem.len() + self.suffix.len() + 8);
        name.push(stem);
        name.push(&self.suffix);

        if let Some(extension) = input.extension() {
            name.push(".");
            name.push(extension);
        }

        name
    }

    /// Validate naming configuration
    pub fn validate(&self) -> Result<()> {
        if self.suffix.is_empty() {
            // Output would carry the input's own name
            return Err(ResizeError::invalid_parameters(
                "Suffix must not be empty"
            ));
        }

        if self.suffix.contains(['/', '\\', ':', '*', '?', '"', '<', '>', '|']) {
            return Err(ResizeError::invalid_parameters(
                "Suffix contains invalid filename characters"
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_config_builder() {
        let config = ResizeConfig::new().max_length(800).quality(5);
        assert_eq!(config.max_length, 800);
        assert_eq!(config.quality, 5);
        assert!(config.validate().is_ok());

        let defaults = ResizeConfig::default();
        assert_eq!(defaults.max_length, 1999);
        assert_eq!(defaults.quality, 1);
    }

    #[test]
    fn test_zero_max_length_rejected() {
        assert!(ResizeConfig::new().max_length(0).validate().is_err());
    }

    #[test]
    fn test_filename_generation() {
        let naming = NamingConfig::default();

        assert_eq!(naming.output_file_name(Path::new("photos/a.jpg")), "a_resized.jpg");
        assert_eq!(naming.output_file_name(Path::new("B.JPEG")), "B_resized.JPEG");
        // Only the last extension is treated as the suffix
        assert_eq!(
            naming.output_file_name(Path::new("archive.tar.jpg")),
            "archive.tar_resized.jpg"
        );
        assert_eq!(naming.output_file_name(Path::new("noext")), "noext_resized");
        assert_eq!(naming.output_file_name(Path::new(".hidden.jpg")), ".hidden_resized.jpg");
    }

    #[test]
    fn test_filename_without_file_name() {
        let naming = NamingConfig::default();
        assert_eq!(naming.output_file_name(Path::new("..")), ".._resized");
        assert_eq!(naming.output_file_name(Path::new("photos/..")), ".._resized");
        assert_eq!(naming.output_file_name(Path::new("/")), "_resized");
    }

    #[test]
    fn test_naming_validation() {
        assert!(NamingConfig::default().validate().is_ok());
        assert!(NamingConfig { suffix: String::new() }.validate().is_err());
        assert!(NamingConfig { suffix: "_a/b".to_string() }.validate().is_err());
    }
}
