//! Typed views of blob contents.
//!
//! A [`TypedTensor`] exists only where bytes meet the engine: blobs are turned
//! into typed tensors when they are bound as inputs, and engine outputs are
//! handed back as typed tensors before being encoded into blobs.

use super::DataType;
use crate::core::errors::DeployError;
use ndarray::ArrayD;

/// Tensor data with its element type made explicit.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedTensor {
    /// 32-bit floating point tensor
    F32 { shape: Vec<usize>, data: Vec<f32> },
    /// 64-bit integer tensor
    I64 { shape: Vec<usize>, data: Vec<i64> },
    /// 32-bit integer tensor
    I32 { shape: Vec<usize>, data: Vec<i32> },
    /// 8-bit unsigned tensor
    U8 { shape: Vec<usize>, data: Vec<u8> },
}

impl TypedTensor {
    /// Returns the element type.
    pub fn dtype(&self) -> DataType {
        match self {
            TypedTensor::F32 { .. } => DataType::Float32,
            TypedTensor::I64 { .. } => DataType::Int64,
            TypedTensor::I32 { .. } => DataType::Int32,
            TypedTensor::U8 { .. } => DataType::UInt8,
        }
    }

    /// Returns the shape of the tensor.
    pub fn shape(&self) -> &[usize] {
        match self {
            TypedTensor::F32 { shape, .. }
            | TypedTensor::I64 { shape, .. }
            | TypedTensor::I32 { shape, .. }
            | TypedTensor::U8 { shape, .. } => shape,
        }
    }

    /// Returns the number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Returns the number of elements actually held.
    pub fn len(&self) -> usize {
        match self {
            TypedTensor::F32 { data, .. } => data.len(),
            TypedTensor::I64 { data, .. } => data.len(),
            TypedTensor::I32 { data, .. } => data.len(),
            TypedTensor::U8 { data, .. } => data.len(),
        }
    }

    /// Returns true if the tensor has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads the values as `i64` regardless of the integer width.
    ///
    /// Used for count tensors, which models export as either int32 or int64.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::InvalidInput`] for floating point tensors.
    pub fn to_i64_vec(&self) -> Result<Vec<i64>, DeployError> {
        match self {
            TypedTensor::I64 { data, .. } => Ok(data.clone()),
            TypedTensor::I32 { data, .. } => Ok(data.iter().map(|&v| v as i64).collect()),
            TypedTensor::U8 { data, .. } => Ok(data.iter().map(|&v| v as i64).collect()),
            TypedTensor::F32 { .. } => Err(DeployError::invalid_input(
                "expected an integer tensor, got float32",
            )),
        }
    }

    /// Converts an f32 tensor into an n-dimensional array.
    ///
    /// # Errors
    ///
    /// Returns an error if the tensor is not f32 or the data does not fill the shape.
    pub fn try_into_array_f32(self) -> Result<ArrayD<f32>, DeployError> {
        match self {
            TypedTensor::F32 { shape, data } => {
                ArrayD::from_shape_vec(shape, data).map_err(DeployError::Tensor)
            }
            other => Err(DeployError::invalid_input(format!(
                "Expected float32 tensor, got {}",
                other.dtype()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let tensor = TypedTensor::I32 {
            shape: vec![2, 2],
            data: vec![1, 2, 3, 4],
        };
        assert_eq!(tensor.dtype(), DataType::Int32);
        assert_eq!(tensor.shape(), &[2, 2]);
        assert_eq!(tensor.ndim(), 2);
        assert_eq!(tensor.len(), 4);
        assert!(!tensor.is_empty());
    }

    #[test]
    fn test_counts_widen_to_i64() {
        let tensor = TypedTensor::I32 {
            shape: vec![2],
            data: vec![3, 0],
        };
        assert_eq!(tensor.to_i64_vec().unwrap(), vec![3, 0]);

        let float = TypedTensor::F32 {
            shape: vec![1],
            data: vec![1.0],
        };
        assert!(float.to_i64_vec().is_err());
    }

    #[test]
    fn test_try_into_array_f32() {
        let tensor = TypedTensor::F32 {
            shape: vec![1, 2, 3],
            data: (0..6).map(|v| v as f32).collect(),
        };
        let array = tensor.try_into_array_f32().unwrap();
        assert_eq!(array.shape(), &[1, 2, 3]);
        assert_eq!(array[[0, 1, 2]], 5.0);
    }

    #[test]
    fn test_try_into_array_wrong_type() {
        let tensor = TypedTensor::U8 {
            shape: vec![1],
            data: vec![7],
        };
        assert!(tensor.try_into_array_f32().is_err());
    }
}
