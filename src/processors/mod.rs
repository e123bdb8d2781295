//! Image processing transforms.
//!
//! Every built-in transform works on a [`Mat`] (an `f32` HWC image) and
//! implements [`Transform`](crate::pipeline::Transform). Transforms are
//! immutable once built, so one instance serves every image of every batch.

pub mod color;
pub mod crop;
pub mod mat;
pub mod normalize;
pub mod padding;
pub mod resize;
pub mod types;

pub use color::{Bgr2Rgb, Clip, Convert, Rgb2Bgr};
pub use crop::CenterCrop;
pub use mat::Mat;
pub use normalize::Normalize;
pub use padding::{PadTarget, Padding};
pub use resize::{Resize, ResizeByLong, ResizeByShort};
pub use types::*;

use crate::core::config::ConfigError;
use serde::de::DeserializeOwned;

/// Parses transform parameters; `null` is read as an empty object so that
/// parameter structs can fall back to their defaults.
pub(crate) fn parse_params<T: DeserializeOwned>(
    transform: &str,
    params: &serde_json::Value,
) -> Result<T, ConfigError> {
    let result = if params.is_null() {
        serde_json::from_value(serde_json::Value::Object(Default::default()))
    } else {
        T::deserialize(params)
    };
    result.map_err(|e| ConfigError::invalid_params(transform, e.to_string()))
}
