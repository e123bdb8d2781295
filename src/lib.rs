//! # deploykit
//!
//! Batched preprocessing and tensor marshalling for deployed vision models.
//! Sits between decoded images and an ONNX Runtime session.
//!
//! ## Features
//!
//! - Configurable per-image transform pipeline (resize, normalize, crop, pad, ...)
//! - Per-image shape history for mapping predictions back onto the originals
//! - Padding of differently sized images into one contiguous batch tensor
//! - Type-erased, shape-checked tensor buffers ([`core::DataBlob`])
//! - Engine adapter that binds blobs, runs one forward pass and extracts every
//!   output, including variable-length (ragged) detection outputs
//!
//! ## Modules
//!
//! * [`core`] - Blobs, configuration, error handling and the inference engine
//! * [`pipeline`] - Transform pipeline, registry and shape bookkeeping
//! * [`processors`] - Built-in image transforms
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deploykit::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let preprocess = PreprocessConfig::from_json_file("models/det/preprocess.json")?;
//! let pipeline = TransformPipeline::new(&preprocess)?;
//!
//! let engine_config = EngineConfig::new()
//!     .with_cpu_threads(4)
//!     .add_ragged_output("bbox", "bbox_num");
//! let mut engine = InferenceEngine::new(&ModelArtifacts::new("models/det/model.onnx"), &engine_config)?;
//!
//! let image = image::open("document.jpg")?;
//! let (blobs, shape_infos) = pipeline.run_dynamic(&[image])?.into_parts();
//! let outputs = engine.infer(&blobs)?;
//! for output in &outputs {
//!     println!("{} {:?} {:?}", output.name(), output.shape(), output.ragged_offsets());
//! }
//! # let _ = shape_infos;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod pipeline;
pub mod processors;

/// Prelude module for convenient imports.
///
/// ```rust
/// use deploykit::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{
        DataBlob, DataType, DeployError, DeployResult, EngineConfig, InferenceEngine,
        ModelArtifacts, PreprocessConfig, RaggedOffsets, TransformSpec,
    };
    pub use crate::pipeline::{ShapeInfo, TransformPipeline, TransformRegistry};
    pub use crate::processors::Mat;
}
