//! Drives preprocessing output through the engine adapter with in-process
//! predictors standing in for a loaded model.

use deploykit::core::blob::{DataBlob, DataType, RaggedOffsets, TypedTensor};
use deploykit::core::config::{BatchConfig, PreprocessConfig, TransformSpec};
use deploykit::core::errors::DeployError;
use deploykit::core::inference::{InferenceEngine, Predictor, PredictorOutput, TensorSpec};
use deploykit::pipeline::TransformPipeline;
use deploykit::processors::Mat;
use serde_json::json;

/// A detector stub: reports one box per 8 rows of padded height for the
/// first sample and none for the rest, in the bbox/bbox_num convention.
struct StubDetector {
    specs: Vec<TensorSpec>,
    seen_inputs: Vec<String>,
}

impl StubDetector {
    fn new() -> Self {
        Self {
            specs: vec![
                TensorSpec::named("image")
                    .with_dtype(DataType::Float32)
                    .with_dims(vec![-1, 3, -1, -1]),
                TensorSpec::named("im_shape")
                    .with_dtype(DataType::Float32)
                    .with_dims(vec![-1, 2]),
                TensorSpec::named("scale_factor")
                    .with_dtype(DataType::Float32)
                    .with_dims(vec![-1, 2]),
            ],
            seen_inputs: Vec::new(),
        }
    }
}

impl Predictor for StubDetector {
    fn model_name(&self) -> &str {
        "stub_detector"
    }

    fn input_specs(&self) -> &[TensorSpec] {
        &self.specs
    }

    fn run(
        &mut self,
        inputs: Vec<(String, TypedTensor)>,
    ) -> Result<Vec<PredictorOutput>, DeployError> {
        self.seen_inputs = inputs.iter().map(|(name, _)| name.clone()).collect();
        let image = inputs
            .iter()
            .find(|(name, _)| name == "image")
            .map(|(_, tensor)| tensor)
            .ok_or_else(|| DeployError::invalid_input("image input missing"))?;
        let batch = image.shape()[0];
        let boxes = image.shape()[2] / 8;

        let mut counts = vec![0i64; batch];
        counts[0] = boxes as i64;
        Ok(vec![
            PredictorOutput::new(
                "bbox",
                TypedTensor::F32 {
                    shape: vec![boxes, 6],
                    data: vec![0.5; boxes * 6],
                },
            )
            .with_ragged_offsets(RaggedOffsets::from_signed_counts(&counts)?),
            PredictorOutput::new(
                "bbox_num",
                TypedTensor::I64 {
                    shape: vec![batch],
                    data: counts,
                },
            ),
        ])
    }
}

fn detection_config() -> PreprocessConfig {
    PreprocessConfig::new()
        .add_transform(TransformSpec::with_params(
            "ResizeByShort",
            json!({"target_size": 16, "max_size": 32}),
        ))
        .add_transform(TransformSpec::with_params(
            "Normalize",
            json!({"mean": [0.485, 0.456, 0.406], "std": [0.229, 0.224, 0.225]}),
        ))
        .add_transform(TransformSpec::with_params("Padding", json!({"stride": 8})))
        .with_batch(
            BatchConfig::default()
                .with_im_shape("im_shape")
                .with_scale_factor("scale_factor"),
        )
}

#[test]
fn preprocessed_batch_binds_and_extracts_ragged_outputs() {
    let pipeline = TransformPipeline::new(&detection_config()).unwrap();
    let images = [Mat::filled(20, 40, 3, 200.0), Mat::filled(30, 15, 3, 10.0)];

    let output = pipeline.run(&images).unwrap();
    assert_eq!(output.shape_infos.len(), 2);
    assert_eq!(output.shape_infos[0].len(), 3);
    // 20x40 -> 16x32 -> padded 16x32; 30x15 -> 32x16 -> padded 32x16
    assert_eq!((output.extent.max_h, output.extent.max_w), (32, 32));

    let (blobs, shape_infos) = output.into_parts();
    assert_eq!(blobs.len(), 3);
    assert_eq!(blobs[0].shape(), &[2, 3, 32, 32]);
    assert_eq!(blobs[1].to_elements::<f32>().unwrap(), vec![16.0, 32.0, 32.0, 16.0]);
    let (sy, sx) = shape_infos[1].scale_factor();
    assert!((sy - 32.0 / 30.0).abs() < 1e-6 && (sx - 16.0 / 15.0).abs() < 1e-6);

    let mut engine = InferenceEngine::with_predictor(StubDetector::new());
    let outputs = engine.infer(&blobs).unwrap();

    assert_eq!(
        engine.predictor().seen_inputs,
        vec!["image", "im_shape", "scale_factor"]
    );
    assert_eq!(outputs.len(), 2);
    let bbox = &outputs[0];
    assert_eq!(bbox.name(), "bbox");
    assert_eq!(bbox.shape(), &[4, 6]);
    assert_eq!(bbox.ragged_offsets().unwrap().as_slice(), &[0, 4, 4]);
    assert_eq!(bbox.data().len(), 4 * 6 * 4);
    assert_eq!(outputs[1].to_elements::<i64>().unwrap(), vec![4, 0]);
}

#[test]
fn unknown_blob_name_fails_before_execution() {
    let mut engine = InferenceEngine::with_predictor(StubDetector::new());
    let blob = DataBlob::from_elements("wrong_name", vec![1, 2], &[1.0f32, 1.0]).unwrap();

    let err = engine.infer(&[blob]).unwrap_err();

    assert!(matches!(err, DeployError::Bind { .. }));
    assert!(engine.predictor().seen_inputs.is_empty());
}

#[test]
fn uint8_batch_is_rejected_by_float_model() {
    let config = PreprocessConfig::new()
        .with_batch(BatchConfig::default().with_dtype(DataType::UInt8));
    let pipeline = TransformPipeline::new(&config).unwrap();
    let (blobs, _) = pipeline
        .run(&[Mat::filled(8, 8, 3, 1.0)])
        .unwrap()
        .into_parts();

    let mut engine = InferenceEngine::with_predictor(StubDetector::new());
    let err = engine.infer(&blobs).unwrap_err();
    assert!(err.to_string().contains("uint8"));
}

#[test]
fn unknown_transform_fails_construction() {
    let config = PreprocessConfig::from_json_str(
        r#"{"transforms": [{"name": "unknown_transform", "params": {}}]}"#,
    )
    .unwrap();
    assert!(matches!(
        TransformPipeline::new(&config),
        Err(DeployError::Config { .. })
    ));
}
