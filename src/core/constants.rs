//! Default values shared across the pipeline.

/// Default name of the batched image input tensor.
pub const DEFAULT_IMAGE_INPUT_NAME: &str = "image";

/// Default fill value for padded regions of a batch.
pub const DEFAULT_PAD_VALUE: f32 = 0.0;

/// Batch size from which the per-image transform pass runs on the rayon pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 8;

/// Default scale applied by `Normalize` before mean/std.
pub const DEFAULT_NORMALIZE_SCALE: f32 = 1.0 / 255.0;

/// Default ImageNet mean used by `Normalize`.
pub const DEFAULT_NORMALIZE_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Default ImageNet standard deviation used by `Normalize`.
pub const DEFAULT_NORMALIZE_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Default number of CPU math threads for the engine.
pub const DEFAULT_CPU_THREADS: usize = 1;

/// Default maximum batch size handed to the reduced-precision engine.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1;

/// Default minimum subgraph size offloaded to the reduced-precision engine.
pub const DEFAULT_MIN_SUBGRAPH_SIZE: usize = 3;

/// Workspace size handed to the reduced-precision engine (1 GiB).
pub const TRT_WORKSPACE_SIZE: usize = 1 << 30;

/// Upper bound on elements in a single blob.
pub const MAX_BLOB_ELEMENTS: usize = 1 << 30;
