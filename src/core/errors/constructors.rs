//! Helper constructors for [`DeployError`].
//!
//! These keep call sites short and make sure every error carries the name of
//! the tensor, transform or model it is attributable to.

use super::DeployError;
use std::path::Path;

impl DeployError {
    /// Creates a configuration error.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an error for a transform that failed on one image of a batch.
    ///
    /// # Arguments
    ///
    /// * `transform` - Name of the failing transform.
    /// * `image_index` - Index of the image inside the batch (0-based).
    /// * `message` - What went wrong.
    pub fn transform_error(
        transform: impl Into<String>,
        image_index: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Transform {
            transform: transform.into(),
            image_index,
            message: message.into(),
        }
    }

    /// Creates an error for a dtype outside the supported set.
    pub fn unsupported_dtype(context: impl Into<String>) -> Self {
        Self::UnsupportedDType {
            context: context.into(),
        }
    }

    /// Creates an error for an input blob that cannot be bound to the model.
    pub fn bind_error(tensor: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Bind {
            tensor: tensor.into(),
            message: message.into(),
        }
    }

    /// Creates an error for a failed engine execution.
    ///
    /// # Arguments
    ///
    /// * `model` - Name of the model being executed.
    /// * `context` - Additional context about the failure.
    /// * `error` - The underlying error.
    pub fn engine_execution_error(
        model: &str,
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::EngineExecution {
            model: model.to_string(),
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates an error for model artifacts that could not be loaded.
    ///
    /// # Arguments
    ///
    /// * `path` - Path of the artifact.
    /// * `reason` - Why loading failed.
    /// * `suggestion` - Optional hint for the user.
    /// * `error` - Optional underlying error.
    pub fn model_load_error(
        path: impl AsRef<Path>,
        reason: impl Into<String>,
        suggestion: Option<&str>,
        error: Option<impl std::error::Error + Send + Sync + 'static>,
    ) -> Self {
        Self::ModelLoad {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
            suggestion: suggestion.map(|s| s.to_string()),
            source: error.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Creates an error for a blob that violates its layout invariants.
    pub fn invalid_blob(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidBlob {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates an error for invalid input.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}
