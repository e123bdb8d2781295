//! The per-image transform abstraction.

use crate::processors::{ImageProcessError, Mat};
use std::fmt::Debug;

/// One preprocessing step applied to a single image.
///
/// Transforms hold only their configuration. `apply` must not depend on any
/// other image of the batch, which is what lets the pipeline run images in
/// parallel.
pub trait Transform: Send + Sync + Debug {
    /// The registered name of this transform.
    fn name(&self) -> &str;

    /// Transforms `mat` in place.
    fn apply(&self, mat: &mut Mat) -> Result<(), ImageProcessError>;
}
