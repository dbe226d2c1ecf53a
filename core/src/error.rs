//! Core error types.

use thiserror::Error;

use crate::buffer::ElementType;

/// Errors raised when constructing or mutating vertex data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A buffer was created with a stride of zero.
    #[error("buffer stride must be at least 1")]
    ZeroStride,
    /// The backing array does not hold a whole number of records.
    #[error("buffer length {len} is not a multiple of stride {stride}")]
    RaggedData { len: usize, stride: usize },
    /// A write touched elements past the end of the buffer.
    #[error("write of {count} elements at offset {offset} exceeds buffer length {len}")]
    OutOfBounds {
        offset: usize,
        count: usize,
        len: usize,
    },
    /// Data of one element type was written into a buffer of another.
    #[error("element type mismatch: buffer holds {expected:?}, got {actual:?}")]
    ElementTypeMismatch {
        expected: ElementType,
        actual: ElementType,
    },
    /// The usage hint was changed after the buffer reached the GPU.
    #[error("usage hint cannot change after the buffer has been uploaded")]
    UsageLocked,
    /// Item size outside of the supported range.
    #[error("invalid item size {0}")]
    InvalidItemSize(usize),
    /// Interleaved attribute reads past the end of its record.
    #[error("interleaved attribute offset {offset} + item size {item_size} exceeds stride {stride}")]
    InterleavedOverflow {
        offset: usize,
        item_size: usize,
        stride: usize,
    },
    /// An operation that only makes sense for interleaved attributes.
    #[error("attribute is not interleaved")]
    NotInterleaved,
    /// Instancing divisor of zero.
    #[error("instanced attribute divisor must be at least 1")]
    ZeroDivisor,
    /// Per-instance data attached to an object drawn once.
    #[error("object is not instanced")]
    NotInstanced,
    /// Index attributes must hold integers with item size 1.
    #[error("index attribute must be an unsigned integer attribute with item size 1")]
    InvalidIndex,
    /// Non-instanced attributes disagree on the vertex count.
    #[error("attribute '{name}' has {count} records, expected {expected}")]
    VertexCountMismatch {
        name: String,
        count: usize,
        expected: usize,
    },
}
