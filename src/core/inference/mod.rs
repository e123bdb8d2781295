//! Binding blobs to an inference runtime.
//!
//! [`InferenceEngine`] is the adapter the rest of the crate talks to. It
//! delegates the forward pass to a [`Predictor`]; [`OrtPredictor`] is the ONNX
//! Runtime implementation used by [`InferenceEngine::new`].

pub mod engine;
pub mod ort_predictor;
pub mod predictor;
mod session;

pub use engine::InferenceEngine;
pub use ort_predictor::OrtPredictor;
pub use predictor::{Predictor, PredictorOutput, TensorSpec};
