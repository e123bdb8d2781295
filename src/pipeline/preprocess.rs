//! The preprocessing pipeline: per-image transforms followed by batch
//! assembly.

use super::batch::{self, BatchExtent};
use super::registry::TransformRegistry;
use super::shape_info::ShapeInfo;
use super::transform::Transform;
use crate::core::blob::DataBlob;
use crate::core::config::{BatchConfig, ConfigValidator, PreprocessConfig};
use crate::core::errors::DeployError;
use crate::processors::Mat;
use image::DynamicImage;
use rayon::prelude::*;

/// Everything one [`TransformPipeline::run`] produces.
#[derive(Debug, Clone)]
pub struct PreprocessOutput {
    /// The image blob first, then any auxiliary blobs.
    pub blobs: Vec<DataBlob>,
    /// One entry per input image, in input order.
    pub shape_infos: Vec<ShapeInfo>,
    /// Padded spatial extent of the batch.
    pub extent: BatchExtent,
}

impl PreprocessOutput {
    pub fn into_parts(self) -> (Vec<DataBlob>, Vec<ShapeInfo>) {
        (self.blobs, self.shape_infos)
    }
}

/// An ordered list of transforms plus the batch layout, fixed at
/// construction.
///
/// `run` takes `&self` and keeps no per-call state, so a pipeline can be
/// shared between threads.
///
/// ```rust
/// use deploykit::core::config::{PreprocessConfig, TransformSpec};
/// use deploykit::pipeline::TransformPipeline;
/// use deploykit::processors::Mat;
/// use serde_json::json;
///
/// let config = PreprocessConfig::new()
///     .add_transform(TransformSpec::with_params("Resize", json!({"width": 4, "height": 4})))
///     .add_transform(TransformSpec::new("Normalize"));
/// let pipeline = TransformPipeline::new(&config)?;
///
/// let output = pipeline.run(&[Mat::filled(8, 6, 3, 128.0)])?;
/// assert_eq!(output.blobs[0].shape(), &[1, 3, 4, 4]);
/// assert_eq!(output.shape_infos[0].len(), 2);
/// # Ok::<(), deploykit::core::errors::DeployError>(())
/// ```
#[derive(Debug)]
pub struct TransformPipeline {
    transforms: Vec<Box<dyn Transform>>,
    batch: BatchConfig,
}

impl TransformPipeline {
    /// Builds the pipeline from the built-in transforms.
    pub fn new(config: &PreprocessConfig) -> Result<Self, DeployError> {
        Self::with_registry(config, &TransformRegistry::with_builtins())
    }

    /// Builds the pipeline resolving transform names in `registry`.
    ///
    /// # Errors
    ///
    /// [`DeployError::Config`] for an unknown transform name, invalid
    /// transform parameters, or an invalid batch configuration.
    pub fn with_registry(
        config: &PreprocessConfig,
        registry: &TransformRegistry,
    ) -> Result<Self, DeployError> {
        config.validate()?;
        let transforms = config
            .transforms
            .iter()
            .map(|spec| registry.create(&spec.name, &spec.params))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            transforms = ?transforms.iter().map(|t| t.name()).collect::<Vec<_>>(),
            image_input = %config.batch.image_input,
            "built preprocessing pipeline"
        );
        Ok(Self {
            transforms,
            batch: config.batch.clone(),
        })
    }

    /// Names of the transforms in application order.
    pub fn transform_names(&self) -> Vec<&str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }

    pub fn batch_config(&self) -> &BatchConfig {
        &self.batch
    }

    /// Transforms every image and assembles the batch blobs.
    ///
    /// The inputs are not modified. The whole run fails on the first
    /// transform error, which names the transform and the image index.
    pub fn run(&self, images: &[Mat]) -> Result<PreprocessOutput, DeployError> {
        let processed: Vec<(Mat, ShapeInfo)> = if images.len() >= self.batch.parallel_threshold {
            images
                .par_iter()
                .enumerate()
                .map(|(i, image)| self.process_image(i, image))
                .collect::<Result<_, _>>()?
        } else {
            images
                .iter()
                .enumerate()
                .map(|(i, image)| self.process_image(i, image))
                .collect::<Result<_, _>>()?
        };
        let (mats, shape_infos): (Vec<Mat>, Vec<ShapeInfo>) = processed.into_iter().unzip();

        let (blobs, extent) = batch::assemble(&mats, &shape_infos, &self.batch)?;
        tracing::debug!(
            batch_size = images.len(),
            max_h = extent.max_h,
            max_w = extent.max_w,
            "preprocessed batch"
        );
        Ok(PreprocessOutput {
            blobs,
            shape_infos,
            extent,
        })
    }

    /// Converts decoded images to RGB [`Mat`]s and runs the pipeline.
    pub fn run_dynamic(&self, images: &[DynamicImage]) -> Result<PreprocessOutput, DeployError> {
        let mats: Vec<Mat> = images.iter().map(Mat::from_dynamic).collect();
        self.run(&mats)
    }

    fn process_image(&self, index: usize, image: &Mat) -> Result<(Mat, ShapeInfo), DeployError> {
        let mut mat = image.clone();
        let mut info = ShapeInfo::new(mat.shape());
        for transform in &self.transforms {
            transform
                .apply(&mut mat)
                .map_err(|e| DeployError::transform_error(transform.name(), index, e.to_string()))?;
            info.push(transform.name(), mat.shape());
        }
        Ok((mat, info))
    }
}
