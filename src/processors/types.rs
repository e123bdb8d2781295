//! Types used in image processing operations
//!
//! This module defines the enums and error type shared by the built-in
//! transforms and the batch assembly step.

use crate::core::config::ConfigError;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Errors raised by a transform while processing a single image.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImageProcessError {
    /// The image does not have the channel count the transform needs.
    #[error("expected {expected} channels, got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },

    /// The requested crop is larger than the image.
    #[error("crop {crop_w}x{crop_h} is larger than the {width}x{height} image")]
    CropSizeTooLarge {
        crop_w: usize,
        crop_h: usize,
        width: usize,
        height: usize,
    },

    /// The image already exceeds the padding target.
    #[error("{width}x{height} image exceeds the {target_w}x{target_h} padding target")]
    PadTargetTooSmall {
        width: usize,
        height: usize,
        target_w: usize,
        target_h: usize,
    },

    /// A transform computed an unusable output size.
    #[error("invalid output size {width}x{height}")]
    InvalidSize { width: usize, height: usize },

    /// The image has no pixels.
    #[error("empty image")]
    EmptyImage,
}

/// Specifies the order of channels in an image tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChannelOrder {
    /// Channel, Height, Width order (common in PyTorch)
    #[default]
    CHW,
    /// Height, Width, Channel order (common in TensorFlow)
    HWC,
}

/// Interpolation used by the resize transforms.
///
/// Names follow the deployment configuration vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Interpolation {
    #[serde(rename = "NEAREST")]
    Nearest,
    #[default]
    #[serde(rename = "LINEAR")]
    Linear,
    #[serde(rename = "CUBIC")]
    Cubic,
    #[serde(rename = "AREA")]
    Area,
    #[serde(rename = "LANCZOS4")]
    Lanczos4,
}

impl Interpolation {
    /// The resampling filter used for this interpolation.
    ///
    /// `AREA` has no direct counterpart and uses the triangle filter.
    pub fn filter(self) -> FilterType {
        match self {
            Interpolation::Nearest => FilterType::Nearest,
            Interpolation::Linear | Interpolation::Area => FilterType::Triangle,
            Interpolation::Cubic => FilterType::CatmullRom,
            Interpolation::Lanczos4 => FilterType::Lanczos3,
        }
    }
}

impl FromStr for Interpolation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEAREST" => Ok(Interpolation::Nearest),
            "LINEAR" => Ok(Interpolation::Linear),
            "CUBIC" => Ok(Interpolation::Cubic),
            "AREA" => Ok(Interpolation::Area),
            "LANCZOS4" => Ok(Interpolation::Lanczos4),
            other => Err(ConfigError::InvalidConfig {
                message: format!("unknown interpolation '{other}'"),
            }),
        }
    }
}
