//! Assembly of transformed images into padded batch blobs.

use super::shape_info::ShapeInfo;
use crate::core::blob::{DataBlob, DataType};
use crate::core::config::BatchConfig;
use crate::core::errors::DeployError;
use crate::processors::{ChannelOrder, Mat};
use ndarray::{Array4, s};

/// Spatial extent of a batch: the largest height and width over its images.
///
/// Computed per call and returned to the caller; nothing is cached between
/// runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchExtent {
    pub max_h: usize,
    pub max_w: usize,
    pub channels: usize,
}

impl BatchExtent {
    /// Computes the extent of `mats`.
    ///
    /// # Errors
    ///
    /// [`DeployError::InvalidInput`] if the images disagree on channel count.
    pub fn of(mats: &[Mat]) -> Result<Self, DeployError> {
        let Some(first) = mats.first() else {
            return Ok(Self::default());
        };
        let channels = first.channels();
        let mut extent = Self {
            max_h: 0,
            max_w: 0,
            channels,
        };
        for (i, mat) in mats.iter().enumerate() {
            if mat.channels() != channels {
                return Err(DeployError::invalid_input(format!(
                    "image {i} has {} channels after preprocessing, image 0 has {channels}",
                    mat.channels()
                )));
            }
            extent.max_h = extent.max_h.max(mat.height());
            extent.max_w = extent.max_w.max(mat.width());
        }
        Ok(extent)
    }
}

/// Copies every image into the top-left of its batch slot and fills the rest
/// with `pad_value`.
fn pad_into_batch(mats: &[Mat], extent: BatchExtent, config: &BatchConfig) -> Array4<f32> {
    let n = mats.len();
    let BatchExtent {
        max_h,
        max_w,
        channels,
    } = extent;
    match config.channel_order {
        ChannelOrder::CHW => {
            let mut batch = Array4::from_elem((n, channels, max_h, max_w), config.pad_value);
            for (i, mat) in mats.iter().enumerate() {
                let (h, w) = (mat.height(), mat.width());
                batch
                    .slice_mut(s![i, .., ..h, ..w])
                    .assign(&mat.data().view().permuted_axes([2, 0, 1]));
            }
            batch
        }
        ChannelOrder::HWC => {
            let mut batch = Array4::from_elem((n, max_h, max_w, channels), config.pad_value);
            for (i, mat) in mats.iter().enumerate() {
                let (h, w) = (mat.height(), mat.width());
                batch.slice_mut(s![i, ..h, ..w, ..]).assign(mat.data());
            }
            batch
        }
    }
}

fn image_blob(batch: Array4<f32>, config: &BatchConfig) -> Result<DataBlob, DeployError> {
    let shape = batch.shape().to_vec();
    let (values, _) = batch.into_raw_vec_and_offset();
    match config.dtype {
        DataType::Float32 => DataBlob::from_elements(config.image_input.as_str(), shape, &values),
        DataType::UInt8 => {
            let bytes: Vec<u8> = values
                .iter()
                .map(|v| v.round().clamp(0.0, 255.0) as u8)
                .collect();
            DataBlob::new(config.image_input.as_str(), DataType::UInt8, shape, bytes)
        }
        other => Err(DeployError::unsupported_dtype(format!(
            "batch image blob '{}' cannot be {other}",
            config.image_input
        ))),
    }
}

/// Builds the image blob plus the optional `im_shape` and `scale_factor`
/// blobs for a batch of transformed images.
pub(crate) fn assemble(
    mats: &[Mat],
    shape_infos: &[ShapeInfo],
    config: &BatchConfig,
) -> Result<(Vec<DataBlob>, BatchExtent), DeployError> {
    let extent = BatchExtent::of(mats)?;
    if mats.is_empty() {
        return Ok((Vec::new(), extent));
    }

    let mut blobs = vec![image_blob(pad_into_batch(mats, extent, config), config)?];
    let n = mats.len();

    if let Some(name) = &config.im_shape_input {
        let values: Vec<f32> = mats
            .iter()
            .flat_map(|m| [m.height() as f32, m.width() as f32])
            .collect();
        blobs.push(DataBlob::from_elements(name.as_str(), vec![n, 2], &values)?);
    }
    if let Some(name) = &config.scale_factor_input {
        let values: Vec<f32> = shape_infos
            .iter()
            .flat_map(|info| {
                let (sy, sx) = info.scale_factor();
                [sy, sx]
            })
            .collect();
        blobs.push(DataBlob::from_elements(name.as_str(), vec![n, 2], &values)?);
    }

    Ok((blobs, extent))
}
