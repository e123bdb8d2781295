//! Element data types of blobs.

use crate::core::errors::DeployError;
use serde::{Deserialize, Serialize};

/// Element type tag of a [`DataBlob`](super::DataBlob).
///
/// The set is closed; supporting a new element type means adding a variant
/// here and an [`Element`] implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Float32,
    Int64,
    Int32,
    UInt8,
}

impl DataType {
    /// Size in bytes of one element.
    pub const fn element_width(self) -> usize {
        match self {
            DataType::Float32 => 4,
            DataType::Int64 => 8,
            DataType::Int32 => 4,
            DataType::UInt8 => 1,
        }
    }

    /// Stable integer code (0 = float32, 1 = int64, 2 = int32, 3 = uint8).
    pub const fn code(self) -> i32 {
        match self {
            DataType::Float32 => 0,
            DataType::Int64 => 1,
            DataType::Int32 => 2,
            DataType::UInt8 => 3,
        }
    }

    /// Resolves an integer dtype code.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::UnsupportedDType`] for codes outside the closed set.
    pub fn from_code(code: i32) -> Result<Self, DeployError> {
        match code {
            0 => Ok(DataType::Float32),
            1 => Ok(DataType::Int64),
            2 => Ok(DataType::Int32),
            3 => Ok(DataType::UInt8),
            other => {
                tracing::error!(code = other, "unsupported dtype code");
                Err(DeployError::unsupported_dtype(format!(
                    "dtype code {other} is not one of 0 (float32), 1 (int64), 2 (int32), 3 (uint8)"
                )))
            }
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::Float32 => write!(f, "float32"),
            DataType::Int64 => write!(f, "int64"),
            DataType::Int32 => write!(f, "int32"),
            DataType::UInt8 => write!(f, "uint8"),
        }
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for i64 {}
    impl Sealed for i32 {}
    impl Sealed for u8 {}
}

/// A fixed-width element type that can live inside a blob.
///
/// Implemented for `f32`, `i64`, `i32` and `u8` only. Bytes are native-endian,
/// the layout the engine reads and writes.
pub trait Element: sealed::Sealed + Copy + Send + Sync + 'static {
    /// The dtype tag of this element type.
    const DTYPE: DataType;

    /// Appends the native-endian bytes of `values` to `out`.
    fn extend_bytes(values: &[Self], out: &mut Vec<u8>);

    /// Decodes native-endian bytes. `bytes.len()` must be a multiple of the element width.
    fn decode(bytes: &[u8]) -> Vec<Self>;
}

macro_rules! impl_element {
    ($($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DataType = DataType::$dtype;

                fn extend_bytes(values: &[Self], out: &mut Vec<u8>) {
                    out.reserve(values.len() * std::mem::size_of::<$ty>());
                    for v in values {
                        out.extend_from_slice(&v.to_ne_bytes());
                    }
                }

                fn decode(bytes: &[u8]) -> Vec<Self> {
                    bytes
                        .chunks_exact(std::mem::size_of::<$ty>())
                        .map(|chunk| {
                            let mut raw = [0u8; std::mem::size_of::<$ty>()];
                            raw.copy_from_slice(chunk);
                            <$ty>::from_ne_bytes(raw)
                        })
                        .collect()
                }
            }
        )*
    };
}

impl_element! {
    f32 => Float32,
    i64 => Int64,
    i32 => Int32,
    u8 => UInt8,
}

/// Encodes a slice of elements into a fresh byte vector.
pub(crate) fn encode<T: Element>(values: &[T]) -> Vec<u8> {
    let mut out = Vec::new();
    T::extend_bytes(values, &mut out);
    out
}
