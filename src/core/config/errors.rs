//! Configuration errors and the shared validation checks.

use thiserror::Error;

/// Upper bound accepted for engine math threads.
const MAX_ENGINE_THREADS: usize = 256;

/// Why a configuration was rejected.
///
/// Always raised before the pipeline or engine it configures exists.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A transform name has no factory in the registry.
    #[error("unknown transform: {name}")]
    UnknownTransform { name: String },

    /// A transform's parameters could not be parsed or are out of range.
    #[error("invalid parameters for transform '{name}': {message}")]
    InvalidParams { name: String, message: String },

    /// The reduced-precision engine batch size is zero.
    #[error("batch_size must be greater than 0")]
    InvalidBatchSize,

    /// A single option has an unusable value.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Options are individually valid but contradict each other.
    #[error("validation failed: {message}")]
    ValidationFailed { message: String },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidParams`].
    pub fn invalid_params(name: &str, message: impl Into<String>) -> Self {
        Self::InvalidParams {
            name: name.to_string(),
            message: message.into(),
        }
    }

    fn invalid(message: String) -> Self {
        Self::InvalidConfig { message }
    }
}

/// Validation hook shared by the pipeline and engine configurations.
///
/// Only [`validate`](ConfigValidator::validate) is required; the `require_*`
/// methods are the field checks implementations compose it from.
pub trait ConfigValidator {
    fn validate(&self) -> Result<(), ConfigError>;

    /// A tensor name must be non-empty since it is matched against model inputs.
    fn require_tensor_name(&self, name: &str, field: &str) -> Result<(), ConfigError> {
        if name.trim().is_empty() {
            return Err(ConfigError::invalid(format!("{field} must name a tensor")));
        }
        Ok(())
    }

    fn require_thread_count(&self, threads: usize, field: &str) -> Result<(), ConfigError> {
        match threads {
            0 => Err(ConfigError::invalid(format!("{field} must be at least 1"))),
            n if n > MAX_ENGINE_THREADS => Err(ConfigError::invalid(format!(
                "{field} is {n}, at most {MAX_ENGINE_THREADS} threads are accepted"
            ))),
            _ => Ok(()),
        }
    }

    fn require_finite(&self, value: f32, field: &str) -> Result<(), ConfigError> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(ConfigError::invalid(format!("{field} must be finite, got {value}")))
        }
    }

    fn require_positive(&self, value: usize, field: &str) -> Result<(), ConfigError> {
        if value == 0 {
            return Err(ConfigError::invalid(format!("{field} must be greater than 0")));
        }
        Ok(())
    }
}
