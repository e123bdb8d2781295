//! Error types for the preprocessing and inference pipeline.
//!
//! Every failure the crate can report is a variant of [`DeployError`]. The
//! variants line up with the stages that can fail:
//!
//! - [`DeployError::Config`] - bad configuration at construction time
//! - [`DeployError::Transform`] - a transform failed on a specific image
//! - [`DeployError::UnsupportedDType`] - a dtype outside the supported set
//!   reached a byte boundary
//! - [`DeployError::Bind`] - an input blob does not match the loaded model
//! - [`DeployError::EngineExecution`] - the engine failed during a forward pass
//! - [`DeployError::ModelLoad`] - model artifacts could not be loaded
//!
//! # Usage
//!
//! ```rust
//! use deploykit::core::errors::DeployError;
//!
//! let error = DeployError::bind_error("wrong_name", "no model input with this name");
//! assert!(error.to_string().contains("wrong_name"));
//!
//! let error = DeployError::transform_error("Normalize", 2, "expected 3 channels, got 1");
//! assert!(matches!(error, DeployError::Transform { image_index: 2, .. }));
//! ```

mod constructors;

use std::path::PathBuf;
use thiserror::Error;

/// Convenient result alias for pipeline operations.
pub type DeployResult<T> = Result<T, DeployError>;

/// A plain message error used as the `source` of wrapped errors when no
/// underlying library error exists.
#[derive(Debug, Clone)]
pub struct SimpleError {
    message: String,
}

impl SimpleError {
    /// Creates a new simple error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SimpleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SimpleError {}

/// Enum representing the errors that can occur while preprocessing a batch or
/// running it through an inference engine.
#[derive(Error, Debug)]
pub enum DeployError {
    /// Invalid or unknown configuration. The instance being constructed is unusable.
    #[error("configuration: {message}")]
    Config {
        /// A message describing the configuration error.
        message: String,
    },

    /// A transform could not process one image of a batch.
    #[error("transform '{transform}' failed on image {image_index}: {message}")]
    Transform {
        /// Name of the failing transform.
        transform: String,
        /// Index of the image inside the batch.
        image_index: usize,
        /// What went wrong.
        message: String,
    },

    /// A dtype outside the supported closed set reached a byte boundary.
    #[error("unsupported dtype: {context}")]
    UnsupportedDType {
        /// Where the dtype was encountered.
        context: String,
    },

    /// An input blob does not match any input tensor of the loaded model, or
    /// its shape/dtype is incompatible with it.
    #[error("bind failed for tensor '{tensor}': {message}")]
    Bind {
        /// Name of the blob that failed to bind.
        tensor: String,
        /// What went wrong.
        message: String,
    },

    /// The engine failed while running or while reporting its outputs.
    #[error("engine execution failed for model '{model}': {context}")]
    EngineExecution {
        /// Name of the model being executed.
        model: String,
        /// Additional context about the failure.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Model artifacts could not be loaded.
    #[error("failed to load model from '{}': {reason}", path.display())]
    ModelLoad {
        /// Path of the artifact that failed to load.
        path: PathBuf,
        /// Why loading failed.
        reason: String,
        /// Optional hint for fixing the problem.
        suggestion: Option<String>,
        /// The underlying error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A blob violates its layout invariants.
    #[error("invalid blob '{name}': {message}")]
    InvalidBlob {
        /// Name of the blob.
        name: String,
        /// Which invariant was violated.
        message: String,
    },

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error from the ONNX Runtime session.
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// Error from tensor operations.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    /// Error from the image crate.
    #[error("image")]
    Image(#[from] image::ImageError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),

    /// JSON configuration error.
    #[error("json")]
    Json(#[from] serde_json::Error),
}

impl From<crate::core::config::ConfigError> for DeployError {
    fn from(error: crate::core::config::ConfigError) -> Self {
        Self::Config {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ConfigError;

    #[test]
    fn test_config_error_conversion_keeps_message() {
        let err: DeployError = ConfigError::UnknownTransform {
            name: "unknown_transform".to_string(),
        }
        .into();
        assert!(matches!(err, DeployError::Config { .. }));
        assert!(err.to_string().contains("unknown_transform"));
    }

    #[test]
    fn test_transform_error_display() {
        let err = DeployError::transform_error("CenterCrop", 1, "image smaller than crop");
        assert_eq!(
            err.to_string(),
            "transform 'CenterCrop' failed on image 1: image smaller than crop"
        );
    }

    #[test]
    fn test_model_load_display_includes_path() {
        let err = DeployError::model_load_error(
            "models/missing.onnx",
            "model file not found",
            None,
            None::<SimpleError>,
        );
        let text = err.to_string();
        assert!(text.contains("models/missing.onnx"));
        assert!(text.contains("model file not found"));
    }

    #[test]
    fn test_engine_execution_has_source() {
        use std::error::Error;
        let err = DeployError::engine_execution_error(
            "det",
            "forward pass",
            SimpleError::new("out of memory"),
        );
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("out of memory"));
    }
}
