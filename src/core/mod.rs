//! The core module of the preprocessing and inference pipeline.
//!
//! This module contains the fundamental components shared by the pipeline and
//! the engine adapter:
//! - Typed blobs and their element types
//! - Configuration management
//! - Constants used throughout the crate
//! - Error handling
//! - Inference engine integration
//!
//! It also provides re-exports of commonly used types for convenience.

pub mod blob;
pub mod config;
pub mod constants;
pub mod errors;
pub mod inference;

pub use blob::{DataBlob, DataType, Element, RaggedOffsets, TypedTensor};
pub use config::{
    BatchConfig, ConfigError, ConfigValidator, EngineConfig, ModelArtifacts, PreprocessConfig,
    TransformSpec,
};
pub use constants::*;
pub use errors::{DeployError, DeployResult};
pub use inference::{InferenceEngine, OrtPredictor, Predictor, PredictorOutput, TensorSpec};

/// Installs a global `tracing` subscriber that prints formatted events.
///
/// Filtering follows `RUST_LOG`; when it is unset only `deploykit` events at
/// `info` and above are shown. Calling this more than once is a no-op.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("deploykit=info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();
}
