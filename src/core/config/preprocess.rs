//! Preprocessing pipeline configuration.
//!
//! A [`PreprocessConfig`] lists the transforms to instantiate, in order, and
//! describes how transformed images are assembled into batch blobs.
//!
//! ```rust
//! use deploykit::core::config::PreprocessConfig;
//!
//! let config = PreprocessConfig::from_json_str(r#"
//! {
//!   "transforms": [
//!     {"name": "ResizeByShort", "params": {"target_size": 800, "max_size": 1333}},
//!     {"name": "Normalize", "params": {"mean": [0.485, 0.456, 0.406], "std": [0.229, 0.224, 0.225]}}
//!   ],
//!   "batch": {"image_input": "image", "scale_factor_input": "scale_factor"}
//! }
//! "#).unwrap();
//! assert_eq!(config.transforms.len(), 2);
//! ```

use super::errors::{ConfigError, ConfigValidator};
use crate::core::blob::DataType;
use crate::core::constants::{DEFAULT_IMAGE_INPUT_NAME, DEFAULT_PAD_VALUE, DEFAULT_PARALLEL_THRESHOLD};
use crate::core::errors::DeployError;
use crate::processors::ChannelOrder;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One entry of the transform list: a registered transform name plus its
/// parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformSpec {
    /// Registered transform name, e.g. `"Resize"`.
    pub name: String,
    /// Transform parameters; `null` selects the transform's defaults.
    #[serde(default)]
    pub params: serde_json::Value,
}

impl TransformSpec {
    /// A transform with default parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: serde_json::Value::Null,
        }
    }

    /// A transform with explicit parameters.
    pub fn with_params(name: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}

/// How transformed images are laid out in the batch blobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Name of the batched image blob (must match the model input).
    pub image_input: String,
    /// Layout of the image blob: `[N, C, H, W]` or `[N, H, W, C]`.
    pub channel_order: ChannelOrder,
    /// Fill value for the bottom/right padding of smaller images.
    pub pad_value: f32,
    /// Element type of the image blob (`float32` or `uint8`).
    pub dtype: DataType,
    /// When set, emit a float32 `[N, 2]` blob of per-image `(h, w)` under this name.
    pub im_shape_input: Option<String>,
    /// When set, emit a float32 `[N, 2]` blob of per-image resize ratios under this name.
    pub scale_factor_input: Option<String>,
    /// Batch size from which the per-image pass is spread over the rayon pool.
    pub parallel_threshold: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            image_input: DEFAULT_IMAGE_INPUT_NAME.to_string(),
            channel_order: ChannelOrder::CHW,
            pad_value: DEFAULT_PAD_VALUE,
            dtype: DataType::Float32,
            im_shape_input: None,
            scale_factor_input: None,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl BatchConfig {
    /// Sets the image blob name.
    pub fn with_image_input(mut self, name: impl Into<String>) -> Self {
        self.image_input = name.into();
        self
    }

    /// Sets the image blob layout.
    pub fn with_channel_order(mut self, order: ChannelOrder) -> Self {
        self.channel_order = order;
        self
    }

    /// Sets the padding fill value.
    pub fn with_pad_value(mut self, value: f32) -> Self {
        self.pad_value = value;
        self
    }

    /// Sets the element type of the image blob.
    pub fn with_dtype(mut self, dtype: DataType) -> Self {
        self.dtype = dtype;
        self
    }

    /// Emits an `im_shape` blob under the given name.
    pub fn with_im_shape(mut self, name: impl Into<String>) -> Self {
        self.im_shape_input = Some(name.into());
        self
    }

    /// Emits a `scale_factor` blob under the given name.
    pub fn with_scale_factor(mut self, name: impl Into<String>) -> Self {
        self.scale_factor_input = Some(name.into());
        self
    }

    /// Sets the parallel threshold.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }
}

impl ConfigValidator for BatchConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.require_tensor_name(&self.image_input, "image_input")?;
        if !matches!(self.dtype, DataType::Float32 | DataType::UInt8) {
            return Err(ConfigError::InvalidConfig {
                message: format!(
                    "image blob dtype must be float32 or uint8, got {}",
                    self.dtype
                ),
            });
        }
        self.require_finite(self.pad_value, "pad_value")?;

        let mut names = vec![self.image_input.as_str()];
        for (field, name) in [
            ("im_shape_input", &self.im_shape_input),
            ("scale_factor_input", &self.scale_factor_input),
        ] {
            let Some(name) = name else { continue };
            self.require_tensor_name(name, field)?;
            if names.contains(&name.as_str()) {
                return Err(ConfigError::ValidationFailed {
                    message: format!("blob name '{name}' is used more than once"),
                });
            }
            names.push(name.as_str());
        }
        Ok(())
    }
}

/// Full preprocessing configuration: ordered transforms plus batch layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Transforms in application order.
    pub transforms: Vec<TransformSpec>,
    /// Batch assembly options.
    pub batch: BatchConfig,
}

impl PreprocessConfig {
    /// Creates an empty configuration (no transforms, default batch layout).
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transform.
    pub fn add_transform(mut self, spec: TransformSpec) -> Self {
        self.transforms.push(spec);
        self
    }

    /// Replaces the batch options.
    pub fn with_batch(mut self, batch: BatchConfig) -> Self {
        self.batch = batch;
        self
    }

    /// Parses a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, DeployError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DeployError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

impl ConfigValidator for PreprocessConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (i, spec) in self.transforms.iter().enumerate() {
            if spec.name.trim().is_empty() {
                return Err(ConfigError::InvalidConfig {
                    message: format!("transforms[{i}] has an empty name"),
                });
            }
        }
        self.batch.validate()
    }
}
