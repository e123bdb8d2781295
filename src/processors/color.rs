//! Channel order swaps, value clipping and element-type quantization.

use super::{ImageProcessError, Mat, parse_params};
use crate::core::blob::DataType;
use crate::core::config::ConfigError;
use crate::pipeline::Transform;
use ndarray::Axis;
use serde::Deserialize;

fn swap_first_and_third(mat: &mut Mat) -> Result<(), ImageProcessError> {
    if mat.channels() != 3 {
        return Err(ImageProcessError::ChannelMismatch {
            expected: 3,
            actual: mat.channels(),
        });
    }
    for mut pixel in mat.data_mut().lanes_mut(Axis(2)) {
        pixel.swap(0, 2);
    }
    Ok(())
}

/// Reverses BGR channel order to RGB.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bgr2Rgb;

impl Bgr2Rgb {
    pub const NAME: &'static str = "BGR2RGB";
}

impl Transform for Bgr2Rgb {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, mat: &mut Mat) -> Result<(), ImageProcessError> {
        swap_first_and_third(mat)
    }
}

/// Reverses RGB channel order to BGR.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rgb2Bgr;

impl Rgb2Bgr {
    pub const NAME: &'static str = "RGB2BGR";
}

impl Transform for Rgb2Bgr {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, mat: &mut Mat) -> Result<(), ImageProcessError> {
        swap_first_and_third(mat)
    }
}

/// Clamps every value into `min..=max`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Clip {
    pub min: f32,
    pub max: f32,
}

impl Default for Clip {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 255.0,
        }
    }
}

impl Clip {
    pub const NAME: &'static str = "Clip";

    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn from_params(params: &serde_json::Value) -> Result<Self, ConfigError> {
        let clip: Self = parse_params(Self::NAME, params)?;
        if !(clip.min.is_finite() && clip.max.is_finite()) || clip.min > clip.max {
            return Err(ConfigError::invalid_params(
                Self::NAME,
                format!("min {} and max {} must be finite with min <= max", clip.min, clip.max),
            ));
        }
        Ok(clip)
    }
}

impl Transform for Clip {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, mat: &mut Mat) -> Result<(), ImageProcessError> {
        let (min, max) = (self.min, self.max);
        mat.data_mut().mapv_inplace(|v| v.clamp(min, max));
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ConvertParams {
    #[serde(default = "ConvertParams::default_dtype")]
    dtype: DataType,
}

impl ConvertParams {
    fn default_dtype() -> DataType {
        DataType::Float32
    }
}

/// Quantizes pixel values to the value set of an element type.
///
/// Working images stay `f32`; integer targets round half away from zero and
/// saturate at the type's range, matching a saturating cast. `float32` leaves
/// the image untouched.
#[derive(Debug, Clone, Copy)]
pub struct Convert {
    dtype: DataType,
}

impl Default for Convert {
    fn default() -> Self {
        Self {
            dtype: DataType::Float32,
        }
    }
}

impl Convert {
    pub const NAME: &'static str = "Convert";

    pub fn new(dtype: DataType) -> Self {
        Self { dtype }
    }

    pub fn from_params(params: &serde_json::Value) -> Result<Self, ConfigError> {
        let p: ConvertParams = parse_params(Self::NAME, params)?;
        Ok(Self::new(p.dtype))
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }
}

impl Transform for Convert {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, mat: &mut Mat) -> Result<(), ImageProcessError> {
        let (min, max) = match self.dtype {
            DataType::Float32 => return Ok(()),
            DataType::UInt8 => (u8::MIN as f32, u8::MAX as f32),
            DataType::Int32 => (i32::MIN as f32, i32::MAX as f32),
            DataType::Int64 => (i64::MIN as f32, i64::MAX as f32),
        };
        mat.data_mut().mapv_inplace(|v| v.round().clamp(min, max));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bgr_to_rgb_swaps_channels() {
        let mut mat = Mat::from_shape_vec(1, 2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        Bgr2Rgb.apply(&mut mat).unwrap();
        assert_eq!(
            mat.data().iter().copied().collect::<Vec<_>>(),
            vec![3.0, 2.0, 1.0, 6.0, 5.0, 4.0]
        );
        Rgb2Bgr.apply(&mut mat).unwrap();
        assert_eq!(mat.data()[[0, 0, 0]], 1.0);
    }

    #[test]
    fn test_swap_needs_three_channels() {
        let mut mat = Mat::filled(2, 2, 1, 0.0);
        assert!(Bgr2Rgb.apply(&mut mat).is_err());
    }

    #[test]
    fn test_clip() {
        let clip = Clip::from_params(&json!({"min": 0.0, "max": 1.0})).unwrap();
        let mut mat = Mat::from_shape_vec(1, 3, 1, vec![-0.5, 0.5, 2.0]).unwrap();
        clip.apply(&mut mat).unwrap();
        assert_eq!(
            mat.data().iter().copied().collect::<Vec<_>>(),
            vec![0.0, 0.5, 1.0]
        );
        assert!(Clip::from_params(&json!({"min": 2.0, "max": 1.0})).is_err());
    }

    #[test]
    fn test_convert_to_uint8_rounds_and_saturates() {
        let convert = Convert::from_params(&json!({"dtype": "uint8"})).unwrap();
        assert_eq!(convert.dtype(), DataType::UInt8);
        let mut mat = Mat::from_shape_vec(1, 4, 1, vec![-3.0, 1.4, 1.5, 300.0]).unwrap();
        convert.apply(&mut mat).unwrap();
        assert_eq!(
            mat.data().iter().copied().collect::<Vec<_>>(),
            vec![0.0, 1.0, 2.0, 255.0]
        );
    }

    #[test]
    fn test_convert_float32_is_identity() {
        let convert = Convert::from_params(&serde_json::Value::Null).unwrap();
        let mut mat = Mat::from_shape_vec(1, 2, 1, vec![0.25, -7.5]).unwrap();
        convert.apply(&mut mat).unwrap();
        assert_eq!(mat.data()[[0, 1, 0]], -7.5);

        let mut mat = Mat::from_shape_vec(1, 2, 1, vec![0.25, -7.5]).unwrap();
        Convert::new(DataType::Int32).apply(&mut mat).unwrap();
        assert_eq!(mat.data()[[0, 0, 0]], 0.0);
        assert_eq!(mat.data()[[0, 1, 0]], -8.0);
    }

    #[test]
    fn test_convert_rejects_unknown_dtype() {
        let err = Convert::from_params(&json!({"dtype": "float16"})).unwrap_err();
        assert!(err.to_string().contains("float16"));
    }
}
