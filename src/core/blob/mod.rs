//! Type-erased tensor buffers.
//!
//! A [`DataBlob`] is a named byte buffer tagged with a [`DataType`], a shape
//! and optional [`RaggedOffsets`]. Blobs are what the preprocessing pipeline
//! produces and what the inference engine consumes and returns.
//!
//! The element type is switched on in exactly two places:
//! [`DataBlob::to_typed`] when a blob is bound as an engine input, and
//! [`DataBlob::from_typed`] when an engine output is extracted.
//!
//! ```rust
//! use deploykit::core::blob::{DataBlob, DataType, RaggedOffsets};
//!
//! let blob = DataBlob::from_elements("bbox", vec![3, 2], &[0.0f32; 6])
//!     .unwrap()
//!     .with_ragged_offsets(RaggedOffsets::from_counts(&[3, 0]).unwrap())
//!     .unwrap();
//! assert_eq!(blob.dtype(), DataType::Float32);
//! assert_eq!(blob.data().len(), 24);
//! assert_eq!(blob.ragged_offsets().unwrap().as_slice(), &[0, 3, 3]);
//! ```

mod dtype;
mod ragged;
mod typed;

pub use dtype::{DataType, Element};
pub use ragged::RaggedOffsets;
pub use typed::TypedTensor;

use crate::core::constants::MAX_BLOB_ELEMENTS;
use crate::core::errors::DeployError;

/// Number of elements described by `shape`, guarding against overflow.
///
/// An empty shape is a scalar and holds one element.
pub(crate) fn element_count(name: &str, shape: &[usize]) -> Result<usize, DeployError> {
    let count = shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
        .ok_or_else(|| {
            DeployError::invalid_blob(name, format!("shape {shape:?} overflows the element count"))
        })?;
    if count > MAX_BLOB_ELEMENTS {
        return Err(DeployError::invalid_blob(
            name,
            format!("shape {shape:?} holds {count} elements, limit is {MAX_BLOB_ELEMENTS}"),
        ));
    }
    Ok(count)
}

/// A named, typed, contiguous tensor buffer.
///
/// The byte length always equals `product(shape) * dtype.element_width()`;
/// every constructor checks it.
#[derive(Debug, Clone, PartialEq)]
pub struct DataBlob {
    name: String,
    dtype: DataType,
    shape: Vec<usize>,
    data: Vec<u8>,
    ragged_offsets: Option<RaggedOffsets>,
}

impl DataBlob {
    /// Wraps raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::InvalidBlob`] if the byte length does not match
    /// the shape and dtype.
    pub fn new(
        name: impl Into<String>,
        dtype: DataType,
        shape: Vec<usize>,
        data: Vec<u8>,
    ) -> Result<Self, DeployError> {
        let name = name.into();
        let count = element_count(&name, &shape)?;
        let expected = count * dtype.element_width();
        if data.len() != expected {
            return Err(DeployError::invalid_blob(
                &name,
                format!(
                    "{} bytes do not match shape {:?} of {} ({} bytes expected)",
                    data.len(),
                    shape,
                    dtype,
                    expected
                ),
            ));
        }
        Ok(Self {
            name,
            dtype,
            shape,
            data,
            ragged_offsets: None,
        })
    }

    /// Encodes typed elements into a blob.
    pub fn from_elements<T: Element>(
        name: impl Into<String>,
        shape: Vec<usize>,
        values: &[T],
    ) -> Result<Self, DeployError> {
        Self::new(name, T::DTYPE, shape, dtype::encode(values))
    }

    /// Encodes an engine output into a blob.
    pub fn from_typed(
        name: impl Into<String>,
        tensor: TypedTensor,
        ragged_offsets: Option<RaggedOffsets>,
    ) -> Result<Self, DeployError> {
        let blob = match tensor {
            TypedTensor::F32 { shape, data } => Self::from_elements(name, shape, &data)?,
            TypedTensor::I64 { shape, data } => Self::from_elements(name, shape, &data)?,
            TypedTensor::I32 { shape, data } => Self::from_elements(name, shape, &data)?,
            TypedTensor::U8 { shape, data } => Self::new(name, DataType::UInt8, shape, data)?,
        };
        match ragged_offsets {
            Some(offsets) => blob.with_ragged_offsets(offsets),
            None => Ok(blob),
        }
    }

    /// Attaches ragged offsets.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::InvalidBlob`] for a scalar blob or when the
    /// offsets do not cover exactly the first dimension.
    pub fn with_ragged_offsets(mut self, offsets: RaggedOffsets) -> Result<Self, DeployError> {
        let Some(&rows) = self.shape.first() else {
            return Err(DeployError::invalid_blob(
                &self.name,
                "a scalar blob cannot carry ragged offsets",
            ));
        };
        if offsets.total() != rows {
            return Err(DeployError::invalid_blob(
                &self.name,
                format!(
                    "ragged offsets cover {} rows but the first dimension is {}",
                    offsets.total(),
                    rows
                ),
            ));
        }
        self.ragged_offsets = Some(offsets);
        Ok(self)
    }

    /// Decodes the bytes into the matching typed tensor.
    pub fn to_typed(&self) -> TypedTensor {
        let shape = self.shape.clone();
        match self.dtype {
            DataType::Float32 => TypedTensor::F32 {
                shape,
                data: f32::decode(&self.data),
            },
            DataType::Int64 => TypedTensor::I64 {
                shape,
                data: i64::decode(&self.data),
            },
            DataType::Int32 => TypedTensor::I32 {
                shape,
                data: i32::decode(&self.data),
            },
            DataType::UInt8 => TypedTensor::U8 {
                shape,
                data: self.data.clone(),
            },
        }
    }

    /// Copies the contents out as elements of type `T`.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::InvalidInput`] if `T` does not match the blob dtype.
    pub fn to_elements<T: Element>(&self) -> Result<Vec<T>, DeployError> {
        if T::DTYPE != self.dtype {
            return Err(DeployError::invalid_input(format!(
                "blob '{}' holds {}, requested {}",
                self.name,
                self.dtype,
                T::DTYPE
            )));
        }
        Ok(T::decode(&self.data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn ragged_offsets(&self) -> Option<&RaggedOffsets> {
        self.ragged_offsets.as_ref()
    }

    /// Number of elements, `product(shape)`.
    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// Consumes the blob and returns its bytes.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_byte_length() {
        assert!(DataBlob::new("x", DataType::Float32, vec![2, 3], vec![0; 24]).is_ok());
        let err = DataBlob::new("x", DataType::Float32, vec![2, 3], vec![0; 23]).unwrap_err();
        assert!(matches!(err, DeployError::InvalidBlob { .. }));
        assert!(DataBlob::new("x", DataType::Int64, vec![2, 3], vec![0; 24]).is_err());
    }

    #[test]
    fn test_scalar_shape_has_one_element() {
        let blob = DataBlob::from_elements("s", vec![], &[42i64]).unwrap();
        assert_eq!(blob.element_count(), 1);
        assert_eq!(blob.data().len(), 8);
        assert!(DataBlob::from_elements::<i64>("s", vec![], &[]).is_err());
    }

    #[test]
    fn test_zero_dim_blob_is_empty() {
        let blob = DataBlob::from_elements::<f32>("empty", vec![0, 6], &[]).unwrap();
        assert_eq!(blob.element_count(), 0);
        assert!(blob.data().is_empty());
    }

    #[test]
    fn test_overflowing_shape_rejected() {
        let err = DataBlob::new("big", DataType::UInt8, vec![usize::MAX, 2], vec![]).unwrap_err();
        assert!(matches!(err, DeployError::InvalidBlob { .. }));
    }

    #[test]
    fn test_typed_boundary_preserves_bytes() {
        let values: Vec<f32> = (0..12).map(|v| v as f32 * 0.5).collect();
        let blob = DataBlob::from_elements("image", vec![1, 3, 2, 2], &values).unwrap();
        let back = DataBlob::from_typed("image", blob.to_typed(), None).unwrap();
        assert_eq!(back, blob);
    }

    #[test]
    fn test_u8_blob_to_typed() {
        let blob = DataBlob::new("mask", DataType::UInt8, vec![2, 2], vec![1, 2, 3, 4]).unwrap();
        assert_eq!(
            blob.to_typed(),
            TypedTensor::U8 {
                shape: vec![2, 2],
                data: vec![1, 2, 3, 4]
            }
        );
    }

    #[test]
    fn test_ragged_offsets_must_cover_first_dim() {
        let blob = DataBlob::from_elements("bbox", vec![3, 6], &[0.0f32; 18]).unwrap();
        let ragged = blob
            .clone()
            .with_ragged_offsets(RaggedOffsets::from_counts(&[3, 0]).unwrap())
            .unwrap();
        assert_eq!(ragged.ragged_offsets().unwrap().as_slice(), &[0, 3, 3]);
        assert_eq!(ragged.data().len(), 3 * 6 * 4);

        assert!(
            blob.with_ragged_offsets(RaggedOffsets::from_counts(&[2, 2]).unwrap())
                .is_err()
        );
    }

    #[test]
    fn test_scalar_cannot_be_ragged() {
        let blob = DataBlob::from_elements("s", vec![], &[1i32]).unwrap();
        let offsets = RaggedOffsets::from_counts(&[1]).unwrap();
        assert!(blob.with_ragged_offsets(offsets).is_err());
    }

    #[test]
    fn test_to_elements_checks_dtype() {
        let blob = DataBlob::from_elements("n", vec![2], &[3i32, 0]).unwrap();
        assert_eq!(blob.to_elements::<i32>().unwrap(), vec![3, 0]);
        assert!(blob.to_elements::<i64>().is_err());
    }

    #[test]
    fn test_from_typed_with_ragged() {
        let tensor = TypedTensor::F32 {
            shape: vec![3, 2],
            data: vec![0.0; 6],
        };
        let offsets = RaggedOffsets::from_counts(&[1, 2]).unwrap();
        let blob = DataBlob::from_typed("bbox", tensor, Some(offsets)).unwrap();
        assert_eq!(blob.ragged_offsets().unwrap().counts(), vec![1, 2]);
    }
}
