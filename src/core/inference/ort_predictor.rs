//! ONNX Runtime implementation of [`Predictor`].

use super::predictor::{Predictor, PredictorOutput, TensorSpec};
use super::session::{check_artifact, load_session_with};
use crate::core::blob::{DataType, RaggedOffsets, TypedTensor};
use crate::core::config::{
    ConfigError, ConfigValidator, EngineConfig, ModelArtifacts, RaggedOutputSpec,
};
use crate::core::errors::{DeployError, SimpleError};
use ort::execution_providers::ExecutionProviderDispatch;
use ort::logging::LogLevel;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::{Session, SessionInputValue, SessionInputs};
use ort::tensor::TensorElementType;
use ort::value::{DynValue, Tensor, ValueType};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// A single ONNX Runtime session wrapped as a [`Predictor`].
pub struct OrtPredictor {
    session: Session,
    model_path: PathBuf,
    model_name: String,
    input_specs: Vec<TensorSpec>,
    output_names: Vec<String>,
    ragged_outputs: Vec<RaggedOutputSpec>,
    providers: Vec<&'static str>,
}

impl std::fmt::Debug for OrtPredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtPredictor")
            .field("model_path", &self.model_path)
            .field(
                "inputs",
                &self.input_specs.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
            )
            .field("outputs", &self.output_names)
            .field("providers", &self.providers)
            .finish()
    }
}

impl OrtPredictor {
    /// Loads the model artifacts and builds a session configured from `config`.
    ///
    /// The configuration is validated and every requested execution provider
    /// resolved before the session is created.
    pub fn from_config(
        artifacts: &ModelArtifacts,
        config: &EngineConfig,
    ) -> Result<Self, DeployError> {
        config.validate()?;
        check_artifact(&artifacts.model_file, "model file")?;
        if let Some(params) = &artifacts.params_file {
            check_artifact(params, "params file")?;
        }

        let (providers, provider_names) =
            build_execution_providers(config, &artifacts.model_file)?;
        let session = load_session_with(
            &artifacts.model_file,
            |builder| apply_engine_config(builder, config, providers),
            Some("check device/EP configuration and model file"),
        )?;

        let input_specs = session
            .inputs()
            .iter()
            .map(|input| tensor_spec(input.name(), input.dtype()))
            .collect();
        let output_names: Vec<String> = session
            .outputs()
            .iter()
            .map(|o| o.name().to_string())
            .collect();

        for spec in &config.ragged_outputs {
            for name in [&spec.output, &spec.counts] {
                if !output_names.contains(name) {
                    return Err(ConfigError::InvalidConfig {
                        message: format!(
                            "ragged output '{name}' is not an output of the model (outputs: {})",
                            output_names.join(", ")
                        ),
                    }
                    .into());
                }
            }
        }

        let model_name = artifacts.model_name();
        tracing::info!(
            model = %model_name,
            path = %artifacts.model_file.display(),
            providers = ?provider_names,
            inputs = ?session.inputs().iter().map(|i| i.name()).collect::<Vec<_>>(),
            outputs = ?output_names,
            "inference session ready"
        );

        Ok(Self {
            session,
            model_path: artifacts.model_file.clone(),
            model_name,
            input_specs,
            output_names,
            ragged_outputs: config.ragged_outputs.clone(),
            providers: provider_names,
        })
    }

    /// Returns the model path associated with this predictor.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Returns the declared output names in engine order.
    pub fn output_names(&self) -> &[String] {
        &self.output_names
    }

    fn to_session_value(name: &str, tensor: TypedTensor) -> Result<DynValue, DeployError> {
        let dims: Vec<i64> = tensor.shape().iter().map(|&d| d as i64).collect();
        let value = match tensor {
            TypedTensor::F32 { data, .. } => Tensor::from_array((dims, data))?.into_dyn(),
            TypedTensor::I64 { data, .. } => Tensor::from_array((dims, data))?.into_dyn(),
            TypedTensor::I32 { data, .. } => Tensor::from_array((dims, data))?.into_dyn(),
            TypedTensor::U8 { data, .. } => Tensor::from_array((dims, data))?.into_dyn(),
        };
        tracing::trace!(input = name, "converted input tensor");
        Ok(value)
    }
}

impl Predictor for OrtPredictor {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn input_specs(&self) -> &[TensorSpec] {
        &self.input_specs
    }

    fn run(
        &mut self,
        inputs: Vec<(String, TypedTensor)>,
    ) -> Result<Vec<PredictorOutput>, DeployError> {
        let input_names: Vec<String> = inputs.iter().map(|(name, _)| name.clone()).collect();
        let context = format!(
            "ONNX Runtime inference failed with inputs: {}",
            input_names.join(", ")
        );

        let mut values: Vec<(Cow<'_, str>, SessionInputValue<'_>)> =
            Vec::with_capacity(inputs.len());
        for (name, tensor) in inputs {
            let value = Self::to_session_value(&name, tensor)?;
            values.push((Cow::Owned(name), value.into()));
        }

        let model_name = self.model_name.clone();
        let output_names = self.output_names.clone();
        let session_inputs: SessionInputs<'_, '_, 0> = SessionInputs::ValueMap(values);
        let outputs = self
            .session
            .run(session_inputs)
            .map_err(|e| DeployError::engine_execution_error(&model_name, &context, e))?;

        let mut results = Vec::with_capacity(output_names.len());
        for name in &output_names {
            let value = &outputs[name.as_str()];
            let tensor = extract_tensor(name, value).map_err(|e| match e {
                DeployError::UnsupportedDType { .. } => e,
                other => DeployError::engine_execution_error(
                    &model_name,
                    &format!("extract output '{name}'"),
                    other,
                ),
            })?;
            results.push(PredictorOutput::new(name.clone(), tensor));
        }
        drop(outputs);

        pair_ragged_outputs(&model_name, &self.ragged_outputs, &mut results)?;
        Ok(results)
    }
}

const RAGGED_CONTEXT: &str = "extract ragged outputs";

fn execution_error(model: &str, message: String) -> DeployError {
    DeployError::engine_execution_error(model, RAGGED_CONTEXT, SimpleError::new(message))
}

/// Attaches cumulative offsets to every ragged data output from its paired
/// counts output.
///
/// The counts may be any integer type. Their total must equal the first
/// dimension of the data output; a missing output or a mismatch is an
/// [`DeployError::EngineExecution`] error.
pub(crate) fn pair_ragged_outputs(
    model: &str,
    specs: &[RaggedOutputSpec],
    outputs: &mut [PredictorOutput],
) -> Result<(), DeployError> {
    for spec in specs {
        let counts = outputs
            .iter()
            .find(|o| o.name == spec.counts)
            .ok_or_else(|| {
                execution_error(
                    model,
                    format!("counts output '{}' missing from the results", spec.counts),
                )
            })?
            .tensor
            .to_i64_vec()
            .and_then(|counts| RaggedOffsets::from_signed_counts(&counts))
            .map_err(|e| {
                execution_error(model, format!("invalid counts in '{}': {e}", spec.counts))
            })?;

        let data = outputs
            .iter_mut()
            .find(|o| o.name == spec.output)
            .ok_or_else(|| {
                execution_error(
                    model,
                    format!("ragged output '{}' missing from the results", spec.output),
                )
            })?;
        let rows = data.tensor.shape().first().copied().unwrap_or(0);
        if counts.total() != rows {
            return Err(execution_error(
                model,
                format!(
                    "counts in '{}' sum to {} but '{}' has {} rows",
                    spec.counts,
                    counts.total(),
                    spec.output,
                    rows
                ),
            ));
        }
        data.ragged_offsets = Some(counts);
    }
    Ok(())
}

/// Maps an ONNX element type into the supported set.
fn map_element_type(ty: TensorElementType) -> Option<DataType> {
    match ty {
        TensorElementType::Float32 => Some(DataType::Float32),
        TensorElementType::Int64 => Some(DataType::Int64),
        TensorElementType::Int32 => Some(DataType::Int32),
        TensorElementType::Uint8 => Some(DataType::UInt8),
        _ => None,
    }
}

fn tensor_spec(name: &str, value_type: &ValueType) -> TensorSpec {
    let mut spec = TensorSpec::named(name);
    if let ValueType::Tensor { ty, shape, .. } = value_type {
        spec.dtype = map_element_type(*ty);
        spec.dims = Some(shape.iter().copied().collect());
    }
    spec
}

fn extract_tensor(name: &str, value: &DynValue) -> Result<TypedTensor, DeployError> {
    let ty = match value.dtype() {
        ValueType::Tensor { ty, .. } => *ty,
        other => {
            tracing::error!(output = name, value_type = ?other, "output is not a tensor");
            return Err(DeployError::unsupported_dtype(format!(
                "output '{name}' is not a tensor: {other:?}"
            )));
        }
    };
    let Some(dtype) = map_element_type(ty) else {
        tracing::error!(output = name, element_type = ?ty, "unsupported output element type");
        return Err(DeployError::unsupported_dtype(format!(
            "output '{name}' has element type {ty:?}; supported types are float32, int64, int32 and uint8"
        )));
    };

    macro_rules! extract {
        ($t:ty, $variant:ident) => {{
            let (shape, data) = value.try_extract_tensor::<$t>()?;
            TypedTensor::$variant {
                shape: to_usize_shape(name, shape)?,
                data: data.to_vec(),
            }
        }};
    }

    Ok(match dtype {
        DataType::Float32 => extract!(f32, F32),
        DataType::Int64 => extract!(i64, I64),
        DataType::Int32 => extract!(i32, I32),
        DataType::UInt8 => extract!(u8, U8),
    })
}

fn to_usize_shape(name: &str, shape: &[i64]) -> Result<Vec<usize>, DeployError> {
    shape
        .iter()
        .map(|&d| {
            usize::try_from(d).map_err(|_| {
                DeployError::invalid_input(format!("output '{name}' has negative dimension {d}"))
            })
        })
        .collect()
}

/// Applies the engine configuration to a session builder.
fn apply_engine_config(
    mut builder: SessionBuilder,
    config: &EngineConfig,
    providers: Vec<ExecutionProviderDispatch>,
) -> Result<SessionBuilder, ort::Error> {
    builder = builder.with_log_level(LogLevel::Error)?;
    builder = builder.with_intra_threads(config.mkl_thread_num)?;
    builder = builder.with_memory_pattern(true)?;
    let level = if config.ir_optim_enabled() {
        GraphOptimizationLevel::Level3
    } else {
        GraphOptimizationLevel::Disable
    };
    builder = builder.with_optimization_level(level)?;
    if !providers.is_empty() {
        builder = builder.with_execution_providers(providers)?;
    }
    Ok(builder)
}

/// Resolves the execution providers requested by `config`, in priority order.
///
/// A provider whose cargo feature is not compiled in is a configuration error.
/// Accelerators are checked for availability up front and registered with
/// `error_on_failure`, so a host that cannot run them fails here instead of
/// falling back to the CPU. Only the trailing CPU provider is non-fatal.
fn build_execution_providers(
    config: &EngineConfig,
    model: &Path,
) -> Result<(Vec<ExecutionProviderDispatch>, Vec<&'static str>), DeployError> {
    let mut providers = Vec::new();
    let mut names = Vec::new();

    if config.use_trt && !config.use_gpu {
        tracing::warn!("use_trt is ignored because use_gpu is not set");
    }
    if config.use_gpu && config.use_mkl {
        tracing::warn!("use_mkl is ignored because use_gpu is set");
    }

    if config.trt_enabled() {
        providers.push(tensorrt_provider(config, model)?);
        names.push("TensorRT");
    }
    if config.use_gpu {
        providers.push(cuda_provider(config, model)?);
        names.push("CUDA");
    } else if config.use_mkl {
        providers.push(onednn_provider(model)?);
        names.push("oneDNN");
    }

    providers.push(ort::execution_providers::CPUExecutionProvider::default().build());
    names.push("CPU");
    Ok((providers, names))
}

/// Fails model loading when an accelerator cannot run on this host.
fn ensure_available(
    provider: &str,
    available: Result<bool, ort::Error>,
    model: &Path,
) -> Result<(), DeployError> {
    match available {
        Ok(true) => Ok(()),
        Ok(false) => Err(DeployError::model_load_error(
            model,
            format!("{provider} execution provider is not available on this host"),
            Some("check the driver and runtime libraries, or disable the accelerator"),
            None::<SimpleError>,
        )),
        Err(e) => Err(DeployError::model_load_error(
            model,
            format!("could not query the {provider} execution provider"),
            None,
            Some(e),
        )),
    }
}

#[cfg(feature = "tensorrt")]
fn tensorrt_provider(
    config: &EngineConfig,
    model: &Path,
) -> Result<ExecutionProviderDispatch, DeployError> {
    use crate::core::config::Precision;
    use crate::core::constants::TRT_WORKSPACE_SIZE;
    use ort::execution_providers::ExecutionProvider;

    let precision = config.precision()?;
    tracing::debug!(
        batch_size = config.batch_size,
        "TensorRT builds profiles from the bound shapes; batch_size is advisory"
    );
    let provider = ort::execution_providers::TensorRTExecutionProvider::default()
        .with_device_id(config.gpu_id)
        .with_max_workspace_size(TRT_WORKSPACE_SIZE)
        .with_min_subgraph_size(config.min_subgraph_size)
        .with_fp16(precision == Precision::Half)
        .with_int8(precision == Precision::Int8)
        .with_int8_use_native_calibration_table(config.use_calib_mode)
        .with_engine_cache(config.use_static);
    ensure_available("TensorRT", provider.is_available(), model)?;
    Ok(provider.build().error_on_failure())
}

#[cfg(not(feature = "tensorrt"))]
fn tensorrt_provider(
    _config: &EngineConfig,
    _model: &Path,
) -> Result<ExecutionProviderDispatch, DeployError> {
    Err(DeployError::config_error(
        "use_trt requested but the tensorrt feature is not enabled",
    ))
}

#[cfg(feature = "cuda")]
fn cuda_provider(
    config: &EngineConfig,
    model: &Path,
) -> Result<ExecutionProviderDispatch, DeployError> {
    use ort::execution_providers::ExecutionProvider;

    let provider =
        ort::execution_providers::CUDAExecutionProvider::default().with_device_id(config.gpu_id);
    ensure_available("CUDA", provider.is_available(), model)?;
    Ok(provider.build().error_on_failure())
}

#[cfg(not(feature = "cuda"))]
fn cuda_provider(
    _config: &EngineConfig,
    _model: &Path,
) -> Result<ExecutionProviderDispatch, DeployError> {
    Err(DeployError::config_error(
        "use_gpu requested but the cuda feature is not enabled",
    ))
}

#[cfg(feature = "onednn")]
fn onednn_provider(model: &Path) -> Result<ExecutionProviderDispatch, DeployError> {
    use ort::execution_providers::ExecutionProvider;

    let provider = ort::execution_providers::OneDNNExecutionProvider::default();
    ensure_available("oneDNN", provider.is_available(), model)?;
    Ok(provider.build().error_on_failure())
}

#[cfg(not(feature = "onednn"))]
fn onednn_provider(_model: &Path) -> Result<ExecutionProviderDispatch, DeployError> {
    Err(DeployError::config_error(
        "use_mkl requested but the onednn feature is not enabled",
    ))
}
