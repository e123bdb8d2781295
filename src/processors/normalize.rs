//! Per-channel normalization.

use super::{ImageProcessError, Mat, parse_params};
use crate::core::config::ConfigError;
use crate::core::constants::{DEFAULT_NORMALIZE_MEAN, DEFAULT_NORMALIZE_SCALE, DEFAULT_NORMALIZE_STD};
use crate::pipeline::Transform;
use ndarray::Axis;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
struct NormalizeParams {
    mean: Vec<f32>,
    std: Vec<f32>,
    scale: f32,
    is_scale: bool,
}

impl Default for NormalizeParams {
    fn default() -> Self {
        Self {
            mean: DEFAULT_NORMALIZE_MEAN.to_vec(),
            std: DEFAULT_NORMALIZE_STD.to_vec(),
            scale: DEFAULT_NORMALIZE_SCALE,
            is_scale: true,
        }
    }
}

/// Normalizes each channel as `(x * scale - mean) / std`.
///
/// The per-channel factors are folded into `x * alpha + beta` once, at
/// construction.
#[derive(Debug, Clone)]
pub struct Normalize {
    /// Scaling factors for each channel (alpha = scale / std)
    pub alpha: Vec<f32>,
    /// Offset values for each channel (beta = -mean / std)
    pub beta: Vec<f32>,
}

impl Normalize {
    pub const NAME: &'static str = "Normalize";

    /// Creates a normalizer.
    ///
    /// `scale` multiplies raw values before the mean is subtracted; pass
    /// `None` to skip scaling.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * Scale is less than or equal to 0
    /// * Mean and std are empty or differ in length
    /// * Any standard deviation value is less than or equal to 0
    pub fn new(mean: Vec<f32>, std: Vec<f32>, scale: Option<f32>) -> Result<Self, ConfigError> {
        let scale = scale.unwrap_or(1.0);
        if !(scale > 0.0 && scale.is_finite()) {
            return Err(ConfigError::invalid_params(
                Self::NAME,
                format!("scale must be a positive finite number, got {scale}"),
            ));
        }
        if mean.is_empty() || mean.len() != std.len() {
            return Err(ConfigError::invalid_params(
                Self::NAME,
                format!(
                    "mean and std must be non-empty and of equal length, got {} and {}",
                    mean.len(),
                    std.len()
                ),
            ));
        }
        for (i, &s) in std.iter().enumerate() {
            if s <= 0.0 || !s.is_finite() {
                return Err(ConfigError::invalid_params(
                    Self::NAME,
                    format!("Standard deviation at index {i} must be greater than 0, got {s}"),
                ));
            }
        }

        let alpha: Vec<f32> = std.iter().map(|s| scale / s).collect();
        let beta: Vec<f32> = mean.iter().zip(&std).map(|(m, s)| -m / s).collect();
        Ok(Self { alpha, beta })
    }

    pub fn from_params(params: &serde_json::Value) -> Result<Self, ConfigError> {
        let p: NormalizeParams = parse_params(Self::NAME, params)?;
        Self::new(p.mean, p.std, p.is_scale.then_some(p.scale))
    }

    /// Number of channels this normalizer expects.
    pub fn channels(&self) -> usize {
        self.alpha.len()
    }
}

impl Transform for Normalize {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, mat: &mut Mat) -> Result<(), ImageProcessError> {
        if mat.channels() != self.channels() {
            return Err(ImageProcessError::ChannelMismatch {
                expected: self.channels(),
                actual: mat.channels(),
            });
        }
        for (c, mut plane) in mat.data_mut().axis_iter_mut(Axis(2)).enumerate() {
            let (alpha, beta) = (self.alpha[c], self.beta[c]);
            plane.mapv_inplace(|v| v * alpha + beta);
        }
        Ok(())
    }
}
