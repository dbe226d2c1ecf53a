//! GPU context abstraction.
//!
//! The binding layer never talks to a graphics API directly. Everything it
//! needs from the GPU goes through the [`GpuContext`] trait: vertex-array
//! objects, slot enable/divisor/pointer state, constant slot values and
//! buffer objects.
//!
//! # Available Backends
//!
//! - `dummy`: records every call, for tests and headless runs
//!
//! Calls are fire-and-forget. The only fallible call is buffer creation,
//! which a context reports as failed once it has been lost.

pub mod dummy;
pub mod error;

use bitflags::bitflags;
use vbind_core::{ElementType, UsageHint};

pub use error::BackendError;

bitflags! {
    /// Optional capabilities of a GPU context.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ContextFeatures: u32 {
        /// Vertex-array objects can capture slot state.
        const VERTEX_ARRAY_OBJECTS = 1 << 0;
        /// Per-slot divisors for instanced attributes.
        const INSTANCED_ARRAYS = 1 << 1;
        /// Integer attribute pointers.
        const INTEGER_ATTRIBUTES = 1 << 2;
    }
}

impl Default for ContextFeatures {
    fn default() -> Self {
        Self::all()
    }
}

/// Handle to a vertex-array object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayHandle(pub u32);

/// Handle to a GPU buffer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuBufferHandle(pub u32);

/// Binding point a buffer object is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferTarget {
    /// Per-vertex or per-instance attribute data.
    #[default]
    Vertex,
    /// Element indices.
    Index,
    /// Indirect draw parameters.
    DrawIndirect,
}

/// Layout of one hardware slot inside the currently bound vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributePointer {
    /// Components read per vertex (1 to 4).
    pub components: u32,
    /// Element type of the source data.
    pub element_type: ElementType,
    /// Whether integer data is normalized to `[0, 1]` or `[-1, 1]`.
    pub normalized: bool,
    /// Distance between consecutive records in bytes.
    pub stride: u32,
    /// Offset of the first component in bytes.
    pub offset: u32,
}

/// Constant value fed to a disabled slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstantValue {
    Scalar(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
}

impl ConstantValue {
    /// Number of components.
    pub fn components(&self) -> u32 {
        match self {
            Self::Scalar(_) => 1,
            Self::Vec2(_) => 2,
            Self::Vec3(_) => 3,
            Self::Vec4(_) => 4,
        }
    }

    /// Components padded to four with `(0, 0, 0, 1)`.
    pub fn to_vec4(&self) -> [f32; 4] {
        match *self {
            Self::Scalar(x) => [x, 0.0, 0.0, 1.0],
            Self::Vec2([x, y]) => [x, y, 0.0, 1.0],
            Self::Vec3([x, y, z]) => [x, y, z, 1.0],
            Self::Vec4(v) => v,
        }
    }
}

impl From<f32> for ConstantValue {
    fn from(value: f32) -> Self {
        Self::Scalar(value)
    }
}

impl From<[f32; 2]> for ConstantValue {
    fn from(value: [f32; 2]) -> Self {
        Self::Vec2(value)
    }
}

impl From<[f32; 3]> for ConstantValue {
    fn from(value: [f32; 3]) -> Self {
        Self::Vec3(value)
    }
}

impl From<[f32; 4]> for ConstantValue {
    fn from(value: [f32; 4]) -> Self {
        Self::Vec4(value)
    }
}

/// The GPU-side operations the binding layer issues.
///
/// Slot state (enabled flags, divisors, pointers) is captured by whichever
/// vertex-array object is bound at the time of the call, or by the context's
/// global state when none is. The same holds for the [`BufferTarget::Index`]
/// binding: creating or binding an index buffer changes the bound vertex
/// array, so it must only happen once the right one is bound.
pub trait GpuContext {
    /// Human-readable context name.
    fn name(&self) -> &str;

    /// Optional capabilities.
    fn features(&self) -> ContextFeatures;

    /// Number of vertex attribute slots.
    fn max_vertex_attributes(&self) -> u32;

    fn create_vertex_array(&mut self) -> VertexArrayHandle;
    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayHandle>);
    fn delete_vertex_array(&mut self, vertex_array: VertexArrayHandle);

    fn enable_attribute(&mut self, slot: u32);
    fn disable_attribute(&mut self, slot: u32);
    fn set_attribute_divisor(&mut self, slot: u32, divisor: u32);

    /// Point `slot` at the bound vertex buffer, converting to float.
    fn set_attribute_pointer(&mut self, slot: u32, pointer: &AttributePointer);

    /// Point `slot` at the bound vertex buffer, keeping integer values.
    fn set_attribute_integer_pointer(&mut self, slot: u32, pointer: &AttributePointer);

    /// Feed a constant to a slot that has no enabled array.
    fn set_constant_attribute(&mut self, slot: u32, value: ConstantValue);

    /// Create a buffer object and fill it with `data`.
    fn create_buffer(
        &mut self,
        target: BufferTarget,
        data: &[u8],
        usage: UsageHint,
    ) -> Result<GpuBufferHandle, BackendError>;

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<GpuBufferHandle>);

    /// Overwrite part of the buffer bound to `target`.
    fn upload_buffer_range(&mut self, target: BufferTarget, byte_offset: u64, data: &[u8]);

    fn delete_buffer(&mut self, buffer: GpuBufferHandle);
}
