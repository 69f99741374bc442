//! Scale-filter construction and the dimension arithmetic behind it

use std::fmt;
use tracing::debug;

use crate::config::ResizeConfig;
use crate::error::{Result, ResizeError};

/// Which input side is pinned to the maximum length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Width > height: width is clamped
    Landscape,
    /// Height >= width: height is clamped (square images land here)
    Portrait,
}

impl Orientation {
    /// Classify an image the same way the filter's `gt(iw,ih)` does
    pub fn of(width: u32, height: u32) -> Self {
        if width > height {
            Self::Landscape
        } else {
            Self::Portrait
        }
    }
}

/// `scale` filter that pins the longer side to `max_length`.
///
/// The other side is left as `-1`, so the converter derives it from the
/// input aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleFilter {
    max_length: u32,
}

impl ScaleFilter {
    /// Create a filter for the given bound
    pub fn new(max_length: u32) -> Result<Self> {
        if max_length == 0 {
            return Err(ResizeError::invalid_parameters(
                "Maximum length must be at least 1 pixel"
            ));
        }
        Ok(Self { max_length })
    }

    /// Build the filter for a run's resize parameters
    pub fn from_config(config: &ResizeConfig) -> Result<Self> {
        Self::new(config.max_length)
    }

    pub fn max_length(&self) -> u32 {
        self.max_length
    }

    /// Output dimensions the filter produces for an input of `width` x `height`
    pub fn apply(&self, width: u32, height: u32) -> Result<(u32, u32)> {
        target_dimensions(width, height, self.max_length)
    }
}

impl fmt::Display for ScaleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.max_length;
        write!(f, "scale='if(gt(iw,ih),{m},-1)':'if(gt(iw,ih),-1,{m})'")
    }
}

/// Compute the output size for an input image and a maximum side length.
///
/// The longer side becomes exactly `max_length` (images smaller than the
/// bound are scaled up). The shorter side keeps the aspect ratio, rounded
/// to the nearest pixel with halves rounding up, and is never below 1.
pub fn target_dimensions(width: u32, height: u32, max_length: u32) -> Result<(u32, u32)> {
    if width == 0 || height == 0 {
        return Err(ResizeError::invalid_parameters(
            "Image has zero width or height"
        ));
    }
    if max_length == 0 {
        return Err(ResizeError::invalid_parameters(
            "Maximum length must be at least 1 pixel"
        ));
    }

    let dimensions = match Orientation::of(width, height) {
        Orientation::Landscape => (max_length, scale_side(height, width, max_length)),
        Orientation::Portrait => (scale_side(width, height, max_length), max_length),
    };

    debug!(
        "Scale {}x{} -> {}x{} (max {})",
        width, height, dimensions.0, dimensions.1, max_length
    );

    Ok(dimensions)
}

/// `round(max_length * short / long)`, at least 1
fn scale_side(short: u32, long: u32, max_length: u32) -> u32 {
    let numerator = u64::from(max_length) * u64::from(short);
    let long = u64::from(long);
    let rounded = (2 * numerator + long) / (2 * long);
    // short <= long, so the result never exceeds max_length
    u32::try_from(rounded).unwrap_or(max_length).max(1)
}
