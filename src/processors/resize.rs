//! Resize transforms.
//!
//! Resampling runs channel by channel on `f32` planes through
//! [`image::imageops::resize`], so normalized values survive unclamped.

use super::{ImageProcessError, Interpolation, Mat, parse_params};
use crate::core::config::ConfigError;
use crate::pipeline::Transform;
use image::{ImageBuffer, Luma, imageops};
use ndarray::{Array3, Axis};
use serde::Deserialize;

/// Resizes every channel of `mat` to `width` x `height`.
pub(crate) fn resize_mat(
    mat: &mut Mat,
    width: usize,
    height: usize,
    interp: Interpolation,
) -> Result<(), ImageProcessError> {
    if width == 0 || height == 0 {
        return Err(ImageProcessError::InvalidSize { width, height });
    }
    if mat.is_empty() {
        return Err(ImageProcessError::EmptyImage);
    }
    if width == mat.width() && height == mat.height() {
        return Ok(());
    }

    let (src_w, src_h) = (mat.width() as u32, mat.height() as u32);
    let mut out = Array3::<f32>::zeros((height, width, mat.channels()));
    for c in 0..mat.channels() {
        let plane = mat.plane(c);
        let lo = plane.iter().copied().fold(f32::INFINITY, f32::min);
        let hi = plane.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let mut dst = out.index_axis_mut(Axis(2), c);
        if hi <= lo {
            dst.fill(lo);
            continue;
        }

        // The resampler clamps float pixels to 0..=1, so each plane is mapped
        // into that range and back.
        let range = hi - lo;
        let unit: Vec<f32> = plane.iter().map(|&v| (v - lo) / range).collect();
        let buffer = ImageBuffer::<Luma<f32>, Vec<f32>>::from_raw(src_w, src_h, unit).ok_or(
            ImageProcessError::InvalidSize {
                width: mat.width(),
                height: mat.height(),
            },
        )?;
        let resized = imageops::resize(&buffer, width as u32, height as u32, interp.filter());
        for (d, v) in dst.iter_mut().zip(resized.into_raw()) {
            *d = v * range + lo;
        }
    }
    mat.set_data(out);
    Ok(())
}

fn scaled(dim: usize, scale: f64) -> usize {
    ((dim as f64 * scale).round() as usize).max(1)
}

/// Resizes to a fixed size, ignoring the aspect ratio.
#[derive(Debug, Clone, Deserialize)]
pub struct Resize {
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub interp: Interpolation,
}

impl Resize {
    pub const NAME: &'static str = "Resize";

    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            interp: Interpolation::default(),
        }
    }

    pub fn with_interp(mut self, interp: Interpolation) -> Self {
        self.interp = interp;
        self
    }

    pub fn from_params(params: &serde_json::Value) -> Result<Self, ConfigError> {
        let resize: Self = parse_params(Self::NAME, params)?;
        if resize.width == 0 || resize.height == 0 {
            return Err(ConfigError::invalid_params(
                Self::NAME,
                "width and height must be greater than 0",
            ));
        }
        Ok(resize)
    }
}

impl Transform for Resize {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, mat: &mut Mat) -> Result<(), ImageProcessError> {
        resize_mat(mat, self.width, self.height, self.interp)
    }
}

/// Scales the short side to `target_size`, keeping the aspect ratio.
///
/// When `max_size` is set, the scale is reduced so the long side does not
/// exceed it.
#[derive(Debug, Clone, Deserialize)]
pub struct ResizeByShort {
    pub target_size: usize,
    #[serde(default)]
    pub max_size: Option<usize>,
    #[serde(default)]
    pub interp: Interpolation,
}

impl ResizeByShort {
    pub const NAME: &'static str = "ResizeByShort";

    pub fn new(target_size: usize) -> Self {
        Self {
            target_size,
            max_size: None,
            interp: Interpolation::default(),
        }
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    pub fn from_params(params: &serde_json::Value) -> Result<Self, ConfigError> {
        let mut resize: Self = parse_params(Self::NAME, params)?;
        if resize.target_size == 0 {
            return Err(ConfigError::invalid_params(
                Self::NAME,
                "target_size must be greater than 0",
            ));
        }
        // A max_size of 0 means no limit.
        if resize.max_size == Some(0) {
            resize.max_size = None;
        }
        Ok(resize)
    }

    /// Output `(width, height)` for an input of the given size.
    pub fn target_dims(&self, width: usize, height: usize) -> (usize, usize) {
        let short = width.min(height) as f64;
        let long = width.max(height) as f64;
        let mut scale = self.target_size as f64 / short;
        if let Some(max_size) = self.max_size {
            if (scale * long).round() > max_size as f64 {
                scale = max_size as f64 / long;
            }
        }
        (scaled(width, scale), scaled(height, scale))
    }
}

impl Transform for ResizeByShort {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, mat: &mut Mat) -> Result<(), ImageProcessError> {
        if mat.is_empty() {
            return Err(ImageProcessError::EmptyImage);
        }
        let (width, height) = self.target_dims(mat.width(), mat.height());
        resize_mat(mat, width, height, self.interp)
    }
}

/// Scales the long side to `target_size`, keeping the aspect ratio.
#[derive(Debug, Clone, Deserialize)]
pub struct ResizeByLong {
    pub target_size: usize,
    #[serde(default)]
    pub interp: Interpolation,
}

impl ResizeByLong {
    pub const NAME: &'static str = "ResizeByLong";

    pub fn new(target_size: usize) -> Self {
        Self {
            target_size,
            interp: Interpolation::default(),
        }
    }

    pub fn from_params(params: &serde_json::Value) -> Result<Self, ConfigError> {
        let resize: Self = parse_params(Self::NAME, params)?;
        if resize.target_size == 0 {
            return Err(ConfigError::invalid_params(
                Self::NAME,
                "target_size must be greater than 0",
            ));
        }
        Ok(resize)
    }

    /// Output `(width, height)` for an input of the given size.
    pub fn target_dims(&self, width: usize, height: usize) -> (usize, usize) {
        let scale = self.target_size as f64 / width.max(height) as f64;
        (scaled(width, scale), scaled(height, scale))
    }
}

impl Transform for ResizeByLong {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, mat: &mut Mat) -> Result<(), ImageProcessError> {
        if mat.is_empty() {
            return Err(ImageProcessError::EmptyImage);
        }
        let (width, height) = self.target_dims(mat.width(), mat.height());
        resize_mat(mat, width, height, self.interp)
    }
}
