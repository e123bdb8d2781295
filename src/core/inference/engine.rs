//! The engine adapter: binds blobs to a model, runs it once, and extracts the
//! outputs back into blobs.

use super::ort_predictor::OrtPredictor;
use super::predictor::{Predictor, TensorSpec};
use crate::core::blob::{DataBlob, TypedTensor};
use crate::core::config::{EngineConfig, ModelArtifacts};
use crate::core::errors::DeployError;
use std::collections::HashSet;

/// Adapter between [`DataBlob`]s and a [`Predictor`].
///
/// `infer` takes `&mut self`, so a single adapter never has two forward
/// passes in flight.
///
/// ```rust,no_run
/// use deploykit::core::config::{EngineConfig, ModelArtifacts};
/// use deploykit::core::inference::InferenceEngine;
///
/// let artifacts = ModelArtifacts::new("models/det.onnx");
/// let config = EngineConfig::new().with_cpu_threads(4);
/// let mut engine = InferenceEngine::new(&artifacts, &config)?;
/// # let blobs: Vec<deploykit::core::blob::DataBlob> = Vec::new();
/// let outputs = engine.infer(&blobs)?;
/// # Ok::<(), deploykit::core::errors::DeployError>(())
/// ```
#[derive(Debug)]
pub struct InferenceEngine<P: Predictor = OrtPredictor> {
    predictor: P,
}

impl InferenceEngine<OrtPredictor> {
    /// Loads the model and builds an ONNX Runtime session from `config`.
    ///
    /// # Errors
    ///
    /// * [`DeployError::Config`] for an invalid configuration or an execution
    ///   provider that is not compiled in.
    /// * [`DeployError::ModelLoad`] when an artifact is missing or the runtime
    ///   rejects the model.
    pub fn new(artifacts: &ModelArtifacts, config: &EngineConfig) -> Result<Self, DeployError> {
        Ok(Self {
            predictor: OrtPredictor::from_config(artifacts, config)?,
        })
    }
}

impl<P: Predictor> InferenceEngine<P> {
    /// Wraps an already constructed predictor.
    pub fn with_predictor(predictor: P) -> Self {
        Self { predictor }
    }

    pub fn predictor(&self) -> &P {
        &self.predictor
    }

    pub fn model_name(&self) -> &str {
        self.predictor.model_name()
    }

    /// Runs one forward pass over `inputs` and returns every engine output.
    ///
    /// All inputs are bound before the engine runs, and every declared model
    /// input must be supplied; a [`DeployError::Bind`] means the engine was
    /// not invoked. Outputs come back in engine order,
    /// each with the ragged offsets the engine reported.
    pub fn infer(&mut self, inputs: &[DataBlob]) -> Result<Vec<DataBlob>, DeployError> {
        let bound = self.bind(inputs)?;

        tracing::debug!(
            model = self.predictor.model_name(),
            inputs = bound.len(),
            "running forward pass"
        );
        let outputs = self.predictor.run(bound).map_err(|e| match e {
            DeployError::EngineExecution { .. } | DeployError::UnsupportedDType { .. } => e,
            other => DeployError::engine_execution_error(
                self.predictor.model_name(),
                "forward pass",
                other,
            ),
        })?;

        let mut blobs = Vec::with_capacity(outputs.len());
        for output in outputs {
            let name = output.name;
            let blob = DataBlob::from_typed(name.as_str(), output.tensor, output.ragged_offsets)
                .map_err(|e| {
                    DeployError::engine_execution_error(
                        self.predictor.model_name(),
                        &format!("extract output '{name}'"),
                        e,
                    )
                })?;
            tracing::trace!(
                output = blob.name(),
                dtype = %blob.dtype(),
                shape = ?blob.shape(),
                "extracted output"
            );
            blobs.push(blob);
        }
        Ok(blobs)
    }

    fn bind(&self, inputs: &[DataBlob]) -> Result<Vec<(String, TypedTensor)>, DeployError> {
        let specs = self.predictor.input_specs();
        let mut seen = HashSet::with_capacity(inputs.len());
        let mut bound = Vec::with_capacity(inputs.len());

        for blob in inputs {
            if !seen.insert(blob.name()) {
                return Err(DeployError::bind_error(
                    blob.name(),
                    "the same input is supplied more than once",
                ));
            }
            let spec = specs.iter().find(|s| s.name == blob.name()).ok_or_else(|| {
                let known: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
                DeployError::bind_error(
                    blob.name(),
                    format!("no model input with this name (inputs: {})", known.join(", ")),
                )
            })?;
            check_compatible(spec, blob)?;
            bound.push((blob.name().to_string(), blob.to_typed()));
        }

        if let Some(missing) = specs.iter().find(|s| !seen.contains(s.name.as_str())) {
            let supplied: Vec<&str> = inputs.iter().map(DataBlob::name).collect();
            return Err(DeployError::bind_error(
                missing.name.as_str(),
                format!(
                    "model input was not supplied (supplied: {})",
                    supplied.join(", ")
                ),
            ));
        }
        Ok(bound)
    }
}

fn check_compatible(spec: &TensorSpec, blob: &DataBlob) -> Result<(), DeployError> {
    if let Some(dtype) = spec.dtype {
        if dtype != blob.dtype() {
            return Err(DeployError::bind_error(
                blob.name(),
                format!("model expects {}, blob holds {}", dtype, blob.dtype()),
            ));
        }
    }

    if let Some(dims) = &spec.dims {
        if dims.len() != blob.shape().len() {
            return Err(DeployError::bind_error(
                blob.name(),
                format!(
                    "model expects rank {} {:?}, blob has rank {} {:?}",
                    dims.len(),
                    dims,
                    blob.shape().len(),
                    blob.shape()
                ),
            ));
        }
        for (axis, (&expected, &actual)) in dims.iter().zip(blob.shape()).enumerate() {
            if expected >= 0 && expected as usize != actual {
                return Err(DeployError::bind_error(
                    blob.name(),
                    format!("dimension {axis} must be {expected}, got {actual}"),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::blob::{DataType, RaggedOffsets};
    use crate::core::errors::SimpleError;
    use crate::core::inference::PredictorOutput;

    /// Echoes every input back as an output of the same name.
    struct IdentityPredictor {
        specs: Vec<TensorSpec>,
        runs: usize,
    }

    impl IdentityPredictor {
        fn new(specs: Vec<TensorSpec>) -> Self {
            Self { specs, runs: 0 }
        }
    }

    impl Predictor for IdentityPredictor {
        fn model_name(&self) -> &str {
            "identity"
        }

        fn input_specs(&self) -> &[TensorSpec] {
            &self.specs
        }

        fn run(
            &mut self,
            inputs: Vec<(String, TypedTensor)>,
        ) -> Result<Vec<PredictorOutput>, DeployError> {
            self.runs += 1;
            Ok(inputs
                .into_iter()
                .map(|(name, tensor)| PredictorOutput::new(name, tensor))
                .collect())
        }
    }

    /// Emits a fixed detection-style result: 3 boxes for sample 0, none for sample 1.
    struct DetectionPredictor;

    impl Predictor for DetectionPredictor {
        fn model_name(&self) -> &str {
            "det"
        }

        fn input_specs(&self) -> &[TensorSpec] {
            &[]
        }

        fn run(
            &mut self,
            _inputs: Vec<(String, TypedTensor)>,
        ) -> Result<Vec<PredictorOutput>, DeployError> {
            Ok(vec![
                PredictorOutput::new(
                    "bbox",
                    TypedTensor::F32 {
                        shape: vec![3, 6],
                        data: (0..18).map(|v| v as f32).collect(),
                    },
                )
                .with_ragged_offsets(RaggedOffsets::from_counts(&[3, 0])?),
                PredictorOutput::new(
                    "bbox_num",
                    TypedTensor::I32 {
                        shape: vec![2],
                        data: vec![3, 0],
                    },
                ),
            ])
        }
    }

    struct FailingPredictor;

    impl Predictor for FailingPredictor {
        fn model_name(&self) -> &str {
            "broken"
        }

        fn input_specs(&self) -> &[TensorSpec] {
            &[]
        }

        fn run(
            &mut self,
            _inputs: Vec<(String, TypedTensor)>,
        ) -> Result<Vec<PredictorOutput>, DeployError> {
            Err(DeployError::invalid_input("device lost"))
        }
    }

    fn image_spec() -> TensorSpec {
        TensorSpec::named("image")
            .with_dtype(DataType::Float32)
            .with_dims(vec![-1, 3, -1, -1])
    }

    fn image_blob(shape: Vec<usize>) -> DataBlob {
        let count: usize = shape.iter().product();
        let values: Vec<f32> = (0..count).map(|v| (v % 251) as f32 / 251.0).collect();
        DataBlob::from_elements("image", shape, &values).unwrap()
    }

    #[test]
    fn test_identity_round_trip() {
        let mut engine = InferenceEngine::with_predictor(IdentityPredictor::new(vec![image_spec()]));
        let input = image_blob(vec![1, 3, 224, 224]);

        let outputs = engine.infer(std::slice::from_ref(&input)).unwrap();

        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].name(), "image");
        assert_eq!(outputs[0].dtype(), DataType::Float32);
        assert_eq!(outputs[0].shape(), &[1, 3, 224, 224]);
        assert_eq!(outputs[0].data(), input.data());
        assert_eq!(engine.predictor().runs, 1);
    }

    #[test]
    fn test_unknown_input_name_never_runs() {
        let mut engine = InferenceEngine::with_predictor(IdentityPredictor::new(vec![image_spec()]));
        let blob = DataBlob::from_elements("wrong_name", vec![1], &[0.0f32]).unwrap();

        let err = engine.infer(&[blob]).unwrap_err();

        assert!(matches!(err, DeployError::Bind { ref tensor, .. } if tensor == "wrong_name"));
        assert_eq!(engine.predictor().runs, 0);
    }

    #[test]
    fn test_bind_failure_on_second_input_never_runs() {
        let specs = vec![image_spec(), TensorSpec::named("scale_factor")];
        let mut engine = InferenceEngine::with_predictor(IdentityPredictor::new(specs));
        let extra = DataBlob::from_elements("im_shape", vec![1, 2], &[1.0f32, 1.0]).unwrap();

        let err = engine
            .infer(&[image_blob(vec![1, 3, 4, 4]), extra])
            .unwrap_err();

        assert!(matches!(err, DeployError::Bind { .. }));
        assert_eq!(engine.predictor().runs, 0);
    }

    #[test]
    fn test_missing_model_input_never_runs() {
        let specs = vec![image_spec(), TensorSpec::named("scale_factor")];
        let mut engine = InferenceEngine::with_predictor(IdentityPredictor::new(specs));

        let err = engine.infer(&[image_blob(vec![1, 3, 4, 4])]).unwrap_err();

        assert!(matches!(err, DeployError::Bind { ref tensor, .. } if tensor == "scale_factor"));
        assert!(err.to_string().contains("not supplied"));
        assert_eq!(engine.predictor().runs, 0);
    }

    #[test]
    fn test_rank_mismatch() {
        let mut engine = InferenceEngine::with_predictor(IdentityPredictor::new(vec![image_spec()]));
        let err = engine.infer(&[image_blob(vec![3, 4, 4])]).unwrap_err();
        assert!(err.to_string().contains("rank"));
    }

    #[test]
    fn test_fixed_dim_mismatch() {
        let mut engine = InferenceEngine::with_predictor(IdentityPredictor::new(vec![image_spec()]));
        let err = engine.infer(&[image_blob(vec![1, 1, 4, 4])]).unwrap_err();
        assert!(err.to_string().contains("dimension 1 must be 3"));
    }

    #[test]
    fn test_dtype_mismatch() {
        let mut engine = InferenceEngine::with_predictor(IdentityPredictor::new(vec![image_spec()]));
        let blob = DataBlob::new("image", DataType::UInt8, vec![1, 3, 2, 2], vec![0; 12]).unwrap();
        let err = engine.infer(&[blob]).unwrap_err();
        assert!(matches!(err, DeployError::Bind { .. }));
    }

    #[test]
    fn test_duplicate_input_rejected() {
        let mut engine = InferenceEngine::with_predictor(IdentityPredictor::new(vec![image_spec()]));
        let blob = image_blob(vec![1, 3, 2, 2]);
        let err = engine.infer(&[blob.clone(), blob]).unwrap_err();
        assert!(err.to_string().contains("more than once"));
        assert_eq!(engine.predictor().runs, 0);
    }

    #[test]
    fn test_unconstrained_spec_accepts_any_dtype() {
        let mut engine =
            InferenceEngine::with_predictor(IdentityPredictor::new(vec![TensorSpec::named("ids")]));
        let blob = DataBlob::from_elements("ids", vec![2, 2], &[1i64, 2, 3, 4]).unwrap();
        let outputs = engine.infer(&[blob]).unwrap();
        assert_eq!(outputs[0].to_elements::<i64>().unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_ragged_output_extracted() {
        let mut engine = InferenceEngine::with_predictor(DetectionPredictor);
        let outputs = engine.infer(&[]).unwrap();

        assert_eq!(outputs.len(), 2);
        let bbox = &outputs[0];
        assert_eq!(bbox.name(), "bbox");
        assert_eq!(bbox.ragged_offsets().unwrap().as_slice(), &[0, 3, 3]);
        assert_eq!(bbox.data().len(), 3 * 6 * 4);
        assert_eq!(outputs[1].to_elements::<i32>().unwrap(), vec![3, 0]);
    }

    #[test]
    fn test_predictor_failure_is_engine_execution() {
        let mut engine = InferenceEngine::with_predictor(FailingPredictor);
        let err = engine.infer(&[]).unwrap_err();
        assert!(matches!(err, DeployError::EngineExecution { ref model, .. } if model == "broken"));
    }

    #[test]
    fn test_engine_execution_passes_through() {
        struct Oom;
        impl Predictor for Oom {
            fn model_name(&self) -> &str {
                "oom"
            }
            fn input_specs(&self) -> &[TensorSpec] {
                &[]
            }
            fn run(
                &mut self,
                _inputs: Vec<(String, TypedTensor)>,
            ) -> Result<Vec<PredictorOutput>, DeployError> {
                Err(DeployError::engine_execution_error(
                    "oom",
                    "forward pass",
                    SimpleError::new("out of memory"),
                ))
            }
        }
        let err = InferenceEngine::with_predictor(Oom).infer(&[]).unwrap_err();
        assert!(err.to_string().contains("forward pass"));
    }

    #[test]
    fn test_boxed_predictor() {
        let boxed: Box<dyn Predictor> = Box::new(IdentityPredictor::new(vec![image_spec()]));
        let mut engine = InferenceEngine::with_predictor(boxed);
        assert_eq!(engine.model_name(), "identity");
        assert!(engine.infer(&[image_blob(vec![2, 3, 2, 2])]).is_ok());
    }
}
