//! The preprocessing pipeline.
//!
//! A [`TransformPipeline`] is built once from a
//! [`PreprocessConfig`](crate::core::config::PreprocessConfig): each
//! configured transform name is resolved in a [`TransformRegistry`] and
//! instantiated with its parameters. Each `run` then transforms a batch of
//! images, records every image's [`ShapeInfo`], and pads the results into a
//! single batch blob.

mod batch;
pub mod preprocess;
pub mod registry;
pub mod shape_info;
pub mod transform;

pub use batch::BatchExtent;
pub use preprocess::{PreprocessOutput, TransformPipeline};
pub use registry::{TransformFactory, TransformRegistry};
pub use shape_info::{ImageShape, ShapeInfo, StageShape};
pub use transform::Transform;
