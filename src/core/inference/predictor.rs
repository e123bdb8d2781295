//! The seam between the engine adapter and a concrete inference runtime.

use crate::core::blob::{DataType, RaggedOffsets, TypedTensor};
use crate::core::errors::DeployError;

/// Declared metadata of one model input.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorSpec {
    /// Input tensor name.
    pub name: String,
    /// Element type, when the runtime reports one inside the supported set.
    pub dtype: Option<DataType>,
    /// Declared dimensions; negative entries are dynamic.
    pub dims: Option<Vec<i64>>,
}

impl TensorSpec {
    /// A spec that only constrains the name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dtype: None,
            dims: None,
        }
    }

    pub fn with_dtype(mut self, dtype: DataType) -> Self {
        self.dtype = Some(dtype);
        self
    }

    pub fn with_dims(mut self, dims: Vec<i64>) -> Self {
        self.dims = Some(dims);
        self
    }
}

/// One output of a forward pass, in engine order.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictorOutput {
    pub name: String,
    pub tensor: TypedTensor,
    /// Per-sample segment boundaries for variable-length outputs.
    pub ragged_offsets: Option<RaggedOffsets>,
}

impl PredictorOutput {
    pub fn new(name: impl Into<String>, tensor: TypedTensor) -> Self {
        Self {
            name: name.into(),
            tensor,
            ragged_offsets: None,
        }
    }

    pub fn with_ragged_offsets(mut self, offsets: RaggedOffsets) -> Self {
        self.ragged_offsets = Some(offsets);
        self
    }
}

/// A loaded model that can run one forward pass at a time.
///
/// [`InferenceEngine`](super::InferenceEngine) validates and converts blobs
/// before calling [`run`](Predictor::run), so implementations receive only
/// inputs whose names exist in [`input_specs`](Predictor::input_specs).
pub trait Predictor: Send {
    /// Name used in logs and errors.
    fn model_name(&self) -> &str;

    /// The model's declared inputs.
    fn input_specs(&self) -> &[TensorSpec];

    /// Runs the model once and returns every output in engine order.
    fn run(
        &mut self,
        inputs: Vec<(String, TypedTensor)>,
    ) -> Result<Vec<PredictorOutput>, DeployError>;
}

impl<P: Predictor + ?Sized> Predictor for Box<P> {
    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn input_specs(&self) -> &[TensorSpec] {
        (**self).input_specs()
    }

    fn run(
        &mut self,
        inputs: Vec<(String, TypedTensor)>,
    ) -> Result<Vec<PredictorOutput>, DeployError> {
        (**self).run(inputs)
    }
}
