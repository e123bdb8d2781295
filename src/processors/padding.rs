//! Bottom/right padding to a fixed size or to a stride multiple.

use super::{ImageProcessError, Mat, parse_params};
use crate::core::config::ConfigError;
use crate::pipeline::Transform;
use ndarray::{Array3, Axis, s};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PadValue {
    Scalar(f32),
    PerChannel(Vec<f32>),
}

#[derive(Debug, Deserialize)]
struct PaddingParams {
    #[serde(default)]
    width: Option<usize>,
    #[serde(default)]
    height: Option<usize>,
    #[serde(default)]
    stride: Option<usize>,
    #[serde(default)]
    value: Option<PadValue>,
}

/// Target of a [`Padding`] transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadTarget {
    /// Pad to exactly `width` x `height`.
    Size { width: usize, height: usize },
    /// Pad each side up to the next multiple of `stride`.
    Stride(usize),
}

/// Pads the bottom and right edges of an image.
///
/// The original pixels stay at the top-left corner.
#[derive(Debug, Clone)]
pub struct Padding {
    pub target: PadTarget,
    /// Fill value per channel; a single value applies to every channel.
    pub value: Vec<f32>,
}

impl Padding {
    pub const NAME: &'static str = "Padding";

    pub fn to_size(width: usize, height: usize) -> Self {
        Self {
            target: PadTarget::Size { width, height },
            value: vec![0.0],
        }
    }

    pub fn to_stride(stride: usize) -> Self {
        Self {
            target: PadTarget::Stride(stride),
            value: vec![0.0],
        }
    }

    pub fn with_value(mut self, value: Vec<f32>) -> Self {
        self.value = value;
        self
    }

    pub fn from_params(params: &serde_json::Value) -> Result<Self, ConfigError> {
        let p: PaddingParams = parse_params(Self::NAME, params)?;
        let target = match (p.width, p.height, p.stride) {
            (Some(width), Some(height), None) if width > 0 && height > 0 => {
                PadTarget::Size { width, height }
            }
            (None, None, Some(stride)) if stride > 0 => PadTarget::Stride(stride),
            _ => {
                return Err(ConfigError::invalid_params(
                    Self::NAME,
                    "expected positive width and height, or a positive stride",
                ));
            }
        };
        let value = match p.value {
            None => vec![0.0],
            Some(PadValue::Scalar(v)) => vec![v],
            Some(PadValue::PerChannel(v)) if !v.is_empty() => v,
            Some(PadValue::PerChannel(_)) => {
                return Err(ConfigError::invalid_params(Self::NAME, "value must not be empty"));
            }
        };
        Ok(Self { target, value })
    }

    /// Output `(width, height)` for an input of the given size.
    pub fn target_dims(&self, width: usize, height: usize) -> (usize, usize) {
        match self.target {
            PadTarget::Size { width, height } => (width, height),
            PadTarget::Stride(stride) => (width.div_ceil(stride) * stride, height.div_ceil(stride) * stride),
        }
    }

    fn fill_value(&self, channel: usize) -> Result<f32, ImageProcessError> {
        match self.value.as_slice() {
            [v] => Ok(*v),
            values => values
                .get(channel)
                .copied()
                .ok_or(ImageProcessError::ChannelMismatch {
                    expected: values.len(),
                    actual: channel + 1,
                }),
        }
    }
}

impl Transform for Padding {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, mat: &mut Mat) -> Result<(), ImageProcessError> {
        let (height, width, channels) = (mat.height(), mat.width(), mat.channels());
        let (target_w, target_h) = self.target_dims(width, height);
        if width > target_w || height > target_h {
            return Err(ImageProcessError::PadTargetTooSmall {
                width,
                height,
                target_w,
                target_h,
            });
        }
        if self.value.len() > 1 && self.value.len() != channels {
            return Err(ImageProcessError::ChannelMismatch {
                expected: self.value.len(),
                actual: channels,
            });
        }
        if (target_w, target_h) == (width, height) {
            return Ok(());
        }

        let mut padded = Array3::<f32>::zeros((target_h, target_w, channels));
        for (c, mut plane) in padded.axis_iter_mut(Axis(2)).enumerate() {
            plane.fill(self.fill_value(c)?);
        }
        padded
            .slice_mut(s![..height, ..width, ..])
            .assign(mat.data());
        mat.set_data(padded);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pad_to_size_keeps_top_left() {
        let mut mat = Mat::filled(2, 3, 1, 7.0);
        Padding::to_size(4, 3)
            .with_value(vec![-1.0])
            .apply(&mut mat)
            .unwrap();
        assert_eq!((mat.height(), mat.width()), (3, 4));
        assert_eq!(mat.data()[[1, 2, 0]], 7.0);
        assert_eq!(mat.data()[[1, 3, 0]], -1.0);
        assert_eq!(mat.data()[[2, 0, 0]], -1.0);
    }

    #[test]
    fn test_pad_to_stride() {
        let padding = Padding::to_stride(32);
        assert_eq!(padding.target_dims(100, 64), (128, 64));
        let mut mat = Mat::filled(33, 1, 3, 1.0);
        padding.apply(&mut mat).unwrap();
        assert_eq!((mat.height(), mat.width()), (64, 32));
    }

    #[test]
    fn test_per_channel_value() {
        let mut mat = Mat::filled(1, 1, 3, 0.0);
        Padding::to_size(2, 1)
            .with_value(vec![1.0, 2.0, 3.0])
            .apply(&mut mat)
            .unwrap();
        assert_eq!(mat.data()[[0, 1, 2]], 3.0);
    }

    #[test]
    fn test_image_larger_than_target() {
        let mut mat = Mat::filled(10, 10, 3, 0.0);
        let err = Padding::to_size(8, 12).apply(&mut mat).unwrap_err();
        assert!(matches!(err, ImageProcessError::PadTargetTooSmall { .. }));
    }

    #[test]
    fn test_from_params() {
        let padding = Padding::from_params(&json!({"stride": 32, "value": [1.0, 2.0, 3.0]})).unwrap();
        assert_eq!(padding.target, PadTarget::Stride(32));
        assert_eq!(padding.value, vec![1.0, 2.0, 3.0]);

        let padding = Padding::from_params(&json!({"width": 10, "height": 8, "value": 0.5})).unwrap();
        assert_eq!(padding.target, PadTarget::Size { width: 10, height: 8 });
        assert_eq!(padding.value, vec![0.5]);

        assert!(Padding::from_params(&json!({"width": 10})).is_err());
        assert!(Padding::from_params(&json!({"width": 10, "height": 8, "stride": 4})).is_err());
    }
}
