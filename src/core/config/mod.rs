//! Configuration management for the pipeline and the inference engine.
//!
//! This module provides configuration types, validation traits, and helpers
//! for loading configurations from JSON.

pub mod engine;
pub mod errors;
pub mod preprocess;

pub use engine::{EngineConfig, ModelArtifacts, Precision, RaggedOutputSpec};
pub use errors::{ConfigError, ConfigValidator};
pub use preprocess::{BatchConfig, PreprocessConfig, TransformSpec};
