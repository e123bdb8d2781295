//! Center crop.

use super::{ImageProcessError, Mat, parse_params};
use crate::core::config::ConfigError;
use crate::pipeline::Transform;
use ndarray::s;
use serde::Deserialize;

/// Crops a `width` x `height` window from the center of the image.
#[derive(Debug, Clone, Deserialize)]
pub struct CenterCrop {
    pub width: usize,
    pub height: usize,
}

impl CenterCrop {
    pub const NAME: &'static str = "CenterCrop";

    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn from_params(params: &serde_json::Value) -> Result<Self, ConfigError> {
        let crop: Self = parse_params(Self::NAME, params)?;
        if crop.width == 0 || crop.height == 0 {
            return Err(ConfigError::invalid_params(
                Self::NAME,
                "width and height must be greater than 0",
            ));
        }
        Ok(crop)
    }
}

impl Transform for CenterCrop {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, mat: &mut Mat) -> Result<(), ImageProcessError> {
        if self.width > mat.width() || self.height > mat.height() {
            return Err(ImageProcessError::CropSizeTooLarge {
                crop_w: self.width,
                crop_h: self.height,
                width: mat.width(),
                height: mat.height(),
            });
        }
        let top = (mat.height() - self.height) / 2;
        let left = (mat.width() - self.width) / 2;
        let cropped = mat
            .data()
            .slice(s![top..top + self.height, left..left + self.width, ..])
            .to_owned();
        mat.set_data(cropped);
        Ok(())
    }
}
