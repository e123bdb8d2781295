//! Inference engine configuration.
//!
//! [`EngineConfig`] carries the acceleration options consumed when the engine
//! adapter is constructed. Option names follow the deployment configuration
//! vocabulary (`use_gpu`, `use_mkl`, `use_trt`, ...) so existing deployment
//! files deserialize unchanged.

use super::errors::{ConfigError, ConfigValidator};
use crate::core::constants::{DEFAULT_CPU_THREADS, DEFAULT_MAX_BATCH_SIZE, DEFAULT_MIN_SUBGRAPH_SIZE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Execution precision of the reduced-precision (TensorRT) engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precision {
    /// Full 32-bit floating point.
    Float32,
    /// 16-bit floating point.
    Half,
    /// 8-bit integer, optionally calibrated.
    Int8,
}

impl Precision {
    /// Maps a configuration precision code (0 = float32, 1 = half, 2 = int8).
    ///
    /// Any other code is a configuration error; the engine is never built with
    /// an unvalidated precision.
    pub fn from_code(code: i32) -> Result<Self, ConfigError> {
        match code {
            0 => Ok(Precision::Float32),
            1 => Ok(Precision::Half),
            2 => Ok(Precision::Int8),
            other => Err(ConfigError::InvalidConfig {
                message: format!(
                    "unsupported precision code {other}: expected 0 (float32), 1 (half) or 2 (int8)"
                ),
            }),
        }
    }

    /// Returns the configuration code of this precision.
    pub fn code(self) -> i32 {
        match self {
            Precision::Float32 => 0,
            Precision::Half => 1,
            Precision::Int8 => 2,
        }
    }
}

/// Pairs a variable-length output with the per-sample count tensor the model
/// exports next to it (for example `bbox` and `bbox_num`).
///
/// The counts are turned into cumulative ragged offsets attached to the data
/// output's blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaggedOutputSpec {
    /// Name of the concatenated data output.
    pub output: String,
    /// Name of the 1-D output holding one count per batch sample.
    pub counts: String,
}

impl RaggedOutputSpec {
    pub fn new(output: impl Into<String>, counts: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            counts: counts.into(),
        }
    }
}

/// Paths of the model artifacts handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelArtifacts {
    /// The model definition file.
    pub model_file: PathBuf,
    /// The separate parameters (external weights) file, if the model has one.
    ///
    /// ONNX Runtime resolves external weights relative to the model file, so
    /// this path is checked for existence but not opened separately.
    pub params_file: Option<PathBuf>,
}

impl ModelArtifacts {
    /// Artifacts consisting of a single self-contained model file.
    pub fn new(model_file: impl AsRef<Path>) -> Self {
        Self {
            model_file: model_file.as_ref().to_path_buf(),
            params_file: None,
        }
    }

    /// Adds a separate parameters file.
    pub fn with_params_file(mut self, params_file: impl AsRef<Path>) -> Self {
        self.params_file = Some(params_file.as_ref().to_path_buf());
        self
    }

    /// Model name used in logs and errors (the model file stem).
    pub fn model_name(&self) -> String {
        self.model_file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown_model")
            .to_string()
    }
}

/// Acceleration options for the inference engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Run on a GPU.
    pub use_gpu: bool,
    /// GPU device index.
    pub gpu_id: i32,
    /// Use the accelerated CPU math library (oneDNN). Ignored when `use_gpu` is set.
    pub use_mkl: bool,
    /// Number of CPU math threads.
    pub mkl_thread_num: usize,
    /// Use the reduced-precision engine (TensorRT). Only effective with `use_gpu`.
    pub use_trt: bool,
    /// Precision code for the reduced-precision engine (0 = float32, 1 = half, 2 = int8).
    pub precision: i32,
    /// Maximum batch size the reduced-precision engine is built for.
    pub batch_size: usize,
    /// Minimum subgraph size offloaded to the reduced-precision engine.
    pub min_subgraph_size: usize,
    /// Cache serialized engines on disk between runs.
    pub use_static: bool,
    /// Use int8 calibration tables.
    pub use_calib_mode: bool,
    /// Enable graph optimization.
    pub use_ir_optim: bool,
    /// Variable-length outputs and their count tensors.
    pub ragged_outputs: Vec<RaggedOutputSpec>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            use_gpu: false,
            gpu_id: 0,
            use_mkl: false,
            mkl_thread_num: DEFAULT_CPU_THREADS,
            use_trt: false,
            precision: 0,
            batch_size: DEFAULT_MAX_BATCH_SIZE,
            min_subgraph_size: DEFAULT_MIN_SUBGRAPH_SIZE,
            use_static: false,
            use_calib_mode: false,
            use_ir_optim: true,
            ragged_outputs: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Creates a new EngineConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables GPU execution on the given device.
    pub fn with_gpu(mut self, gpu_id: i32) -> Self {
        self.use_gpu = true;
        self.gpu_id = gpu_id;
        self
    }

    /// Enables the accelerated CPU library with the given thread count.
    pub fn with_mkl(mut self, threads: usize) -> Self {
        self.use_mkl = true;
        self.mkl_thread_num = threads;
        self
    }

    /// Sets the number of CPU math threads.
    pub fn with_cpu_threads(mut self, threads: usize) -> Self {
        self.mkl_thread_num = threads;
        self
    }

    /// Enables the reduced-precision engine with the given precision code.
    pub fn with_trt(mut self, precision: i32) -> Self {
        self.use_trt = true;
        self.precision = precision;
        self
    }

    /// Enables or disables graph optimization.
    pub fn with_ir_optim(mut self, enabled: bool) -> Self {
        self.use_ir_optim = enabled;
        self
    }

    /// Declares a ragged output and its per-sample count tensor.
    pub fn add_ragged_output(mut self, output: impl Into<String>, counts: impl Into<String>) -> Self {
        self.ragged_outputs.push(RaggedOutputSpec::new(output, counts));
        self
    }

    /// Returns the validated precision.
    pub fn precision(&self) -> Result<Precision, ConfigError> {
        Precision::from_code(self.precision)
    }

    /// Whether the reduced-precision engine will actually be used.
    pub fn trt_enabled(&self) -> bool {
        self.use_trt && self.use_gpu
    }

    /// Whether graph optimization is enabled on this target.
    ///
    /// Always off on ARM targets.
    pub fn ir_optim_enabled(&self) -> bool {
        if cfg!(any(target_arch = "arm", target_arch = "aarch64")) {
            false
        } else {
            self.use_ir_optim
        }
    }
}

impl ConfigValidator for EngineConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let precision = self.precision()?;
        self.require_thread_count(self.mkl_thread_num, "mkl_thread_num")?;
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        self.require_positive(self.min_subgraph_size, "min_subgraph_size")?;

        if self.gpu_id < 0 {
            return Err(ConfigError::InvalidConfig {
                message: format!("gpu_id must be non-negative, got {}", self.gpu_id),
            });
        }

        if self.use_calib_mode && precision != Precision::Int8 {
            return Err(ConfigError::ValidationFailed {
                message: format!(
                    "use_calib_mode requires int8 precision, got {:?}",
                    precision
                ),
            });
        }

        for (i, spec) in self.ragged_outputs.iter().enumerate() {
            self.require_tensor_name(&spec.output, &format!("ragged_outputs[{i}].output"))?;
            self.require_tensor_name(&spec.counts, &format!("ragged_outputs[{i}].counts"))?;
            if spec.output == spec.counts {
                return Err(ConfigError::ValidationFailed {
                    message: format!(
                        "ragged_outputs[{i}]: output and counts must differ, both are '{}'",
                        spec.output
                    ),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_precision_codes() {
        assert_eq!(Precision::from_code(0).unwrap(), Precision::Float32);
        assert_eq!(Precision::from_code(1).unwrap(), Precision::Half);
        assert_eq!(Precision::from_code(2).unwrap(), Precision::Int8);
        assert_eq!(Precision::Int8.code(), 2);
    }

    #[test]
    fn test_unsupported_precision_is_config_error() {
        let config = EngineConfig::new().with_gpu(0).with_trt(3);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("unsupported precision code 3"));
    }

    #[test]
    fn test_calibration_requires_int8() {
        let mut config = EngineConfig::new().with_gpu(0).with_trt(1);
        config.use_calib_mode = true;
        assert!(config.validate().is_err());

        config.precision = 2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_trt_needs_gpu() {
        let config = EngineConfig::new().with_trt(0);
        assert!(!config.trt_enabled());
        assert!(config.with_gpu(1).trt_enabled());
    }

    #[test]
    fn test_ragged_output_validation() {
        let config = EngineConfig::new().add_ragged_output("bbox", "bbox");
        assert!(config.validate().is_err());

        let config = EngineConfig::new().add_ragged_output("bbox", "bbox_num");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"use_gpu": true, "gpu_id": 1, "precision": 1}"#).unwrap();
        assert!(config.use_gpu);
        assert_eq!(config.gpu_id, 1);
        assert_eq!(config.precision().unwrap(), Precision::Half);
        assert_eq!(config.mkl_thread_num, DEFAULT_CPU_THREADS);
    }

    #[test]
    fn test_model_artifacts_name() {
        let artifacts = ModelArtifacts::new("models/ppyoloe.onnx").with_params_file("models/ppyoloe.data");
        assert_eq!(artifacts.model_name(), "ppyoloe");
        assert!(artifacts.params_file.is_some());
    }
}
