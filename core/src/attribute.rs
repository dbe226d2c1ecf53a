//! Vertex attributes: named views over versioned buffers.
//!
//! An [`Attribute`] describes how to read one logical vertex property out of a
//! [`VertexBuffer`](crate::VertexBuffer). The way the buffer is addressed is a
//! closed set of variants ([`AttributeKind`]):
//!
//! | Kind                   | Buffer ownership | Record advance           |
//! |------------------------|------------------|--------------------------|
//! | `Plain`                | exclusive        | once per vertex          |
//! | `Interleaved`          | shared           | once per vertex          |
//! | `Instanced`            | exclusive        | once per `divisor` draws |
//! | `InstancedInterleaved` | shared           | once per `divisor` draws |
//!
//! Cloning an attribute keeps its [`AttributeId`]; the clone is the same
//! attribute. Build a new one to get a new identity.

use crate::buffer::{BufferData, BufferRef, ElementType};
use crate::error::CoreError;
use crate::id::{AttributeId, BufferId};
use crate::index::IndexWidth;

/// Largest supported item size (a 4x4 matrix spread over four slots).
pub const MAX_ITEM_SIZE: usize = 16;

/// Override of how the GPU interprets attribute data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuType {
    /// Bind through the float/normalized pointer path.
    Float,
    /// Bind through the integer pointer path.
    Integer,
}

/// How an attribute addresses its buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// Owns a buffer whose stride equals the item size.
    Plain,
    /// Reads `item_size` elements at `offset` within each record of a shared buffer.
    Interleaved {
        /// Element offset within a record.
        offset: usize,
    },
    /// Owns a buffer that advances once every `divisor` instances.
    Instanced {
        /// Instances per record.
        divisor: u32,
    },
    /// Shared buffer that advances once every `divisor` instances.
    InstancedInterleaved {
        /// Element offset within a record.
        offset: usize,
        /// Instances per record.
        divisor: u32,
    },
}

impl AttributeKind {
    /// Element offset within a record (0 for non-interleaved kinds).
    pub fn offset(&self) -> usize {
        match self {
            Self::Plain | Self::Instanced { .. } => 0,
            Self::Interleaved { offset } | Self::InstancedInterleaved { offset, .. } => *offset,
        }
    }

    /// Instancing divisor (0 for per-vertex kinds).
    pub fn divisor(&self) -> u32 {
        match self {
            Self::Plain | Self::Interleaved { .. } => 0,
            Self::Instanced { divisor } | Self::InstancedInterleaved { divisor, .. } => *divisor,
        }
    }

    /// Whether the buffer is shared with sibling attributes.
    pub fn is_interleaved(&self) -> bool {
        matches!(self, Self::Interleaved { .. } | Self::InstancedInterleaved { .. })
    }

    /// Whether the attribute advances per instance.
    pub fn is_instanced(&self) -> bool {
        matches!(self, Self::Instanced { .. } | Self::InstancedInterleaved { .. })
    }
}

/// A named-by-the-geometry view over a versioned buffer.
#[derive(Debug, Clone)]
pub struct Attribute {
    id: AttributeId,
    item_size: usize,
    normalized: bool,
    gpu_type: Option<GpuType>,
    buffer: BufferRef,
    kind: AttributeKind,
}

fn check_item_size(item_size: usize) -> Result<(), CoreError> {
    if item_size == 0 || item_size > MAX_ITEM_SIZE {
        return Err(CoreError::InvalidItemSize(item_size));
    }
    Ok(())
}

fn check_interleaved(buffer: &BufferRef, item_size: usize, offset: usize) -> Result<(), CoreError> {
    let stride = buffer.stride();
    if offset + item_size > stride {
        return Err(CoreError::InterleavedOverflow {
            offset,
            item_size,
            stride,
        });
    }
    Ok(())
}

impl Attribute {
    fn from_parts(buffer: BufferRef, item_size: usize, kind: AttributeKind) -> Self {
        Self {
            id: AttributeId::new(),
            item_size,
            normalized: false,
            gpu_type: None,
            buffer,
            kind,
        }
    }

    /// Plain per-vertex attribute owning its own buffer.
    pub fn new(data: impl Into<BufferData>, item_size: usize) -> Result<Self, CoreError> {
        check_item_size(item_size)?;
        let buffer = BufferRef::from_data(data, item_size)?;
        Ok(Self::from_parts(buffer, item_size, AttributeKind::Plain))
    }

    /// Per-instance attribute owning its own buffer.
    pub fn instanced(
        data: impl Into<BufferData>,
        item_size: usize,
        divisor: u32,
    ) -> Result<Self, CoreError> {
        check_item_size(item_size)?;
        if divisor == 0 {
            return Err(CoreError::ZeroDivisor);
        }
        let buffer = BufferRef::from_data(data, item_size)?;
        Ok(Self::from_parts(
            buffer,
            item_size,
            AttributeKind::Instanced { divisor },
        ))
    }

    /// Per-vertex view into a shared interleaved buffer.
    pub fn interleaved(buffer: &BufferRef, item_size: usize, offset: usize) -> Result<Self, CoreError> {
        check_item_size(item_size)?;
        check_interleaved(buffer, item_size, offset)?;
        Ok(Self::from_parts(
            buffer.clone(),
            item_size,
            AttributeKind::Interleaved { offset },
        ))
    }

    /// Per-instance view into a shared interleaved buffer.
    pub fn instanced_interleaved(
        buffer: &BufferRef,
        item_size: usize,
        offset: usize,
        divisor: u32,
    ) -> Result<Self, CoreError> {
        check_item_size(item_size)?;
        check_interleaved(buffer, item_size, offset)?;
        if divisor == 0 {
            return Err(CoreError::ZeroDivisor);
        }
        Ok(Self::from_parts(
            buffer.clone(),
            item_size,
            AttributeKind::InstancedInterleaved { offset, divisor },
        ))
    }

    /// Index attribute, stored as 16-bit when every value fits below the
    /// primitive-restart sentinel and 32-bit otherwise.
    pub fn index(values: &[u32]) -> Result<Self, CoreError> {
        let width = IndexWidth::for_indices(values);
        Self::new(width.pack(values), 1)
    }

    /// Set whether integer data is normalized to `[0, 1]` / `[-1, 1]`.
    pub fn with_normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }

    /// Override how the GPU interprets the data.
    pub fn with_gpu_type(mut self, gpu_type: GpuType) -> Self {
        self.gpu_type = Some(gpu_type);
        self
    }

    /// Attribute identity.
    pub fn id(&self) -> AttributeId {
        self.id
    }

    /// Components per record.
    pub fn item_size(&self) -> usize {
        self.item_size
    }

    /// Whether integer data is normalized.
    pub fn normalized(&self) -> bool {
        self.normalized
    }

    /// GPU type override, if any.
    pub fn gpu_type(&self) -> Option<GpuType> {
        self.gpu_type
    }

    /// Addressing variant.
    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    /// Backing buffer handle.
    pub fn buffer(&self) -> &BufferRef {
        &self.buffer
    }

    /// Identity of the backing buffer.
    pub fn buffer_id(&self) -> BufferId {
        self.buffer.id()
    }

    /// Content version of the backing buffer.
    pub fn version(&self) -> u64 {
        self.buffer.version()
    }

    /// Number of records.
    pub fn count(&self) -> usize {
        self.buffer.count()
    }

    /// Element type of the backing buffer.
    pub fn element_type(&self) -> ElementType {
        self.buffer.element_type()
    }

    /// Whether this attribute exclusively owns its buffer.
    pub fn owns_buffer(&self) -> bool {
        !self.kind.is_interleaved()
    }

    /// Whether the data should bind through the integer pointer path.
    pub fn binds_as_integer(&self, element_type: ElementType) -> bool {
        match self.gpu_type {
            Some(GpuType::Integer) => true,
            Some(GpuType::Float) => false,
            None => element_type.binds_as_integer(),
        }
    }

    /// Point an interleaved attribute at a different shared buffer.
    ///
    /// The attribute keeps its id; the binding cache notices the swap through
    /// the buffer identity.
    pub fn set_shared_buffer(&mut self, buffer: &BufferRef) -> Result<(), CoreError> {
        if !self.kind.is_interleaved() {
            return Err(CoreError::NotInterleaved);
        }
        check_interleaved(buffer, self.item_size, self.kind.offset())?;
        self.buffer = buffer.clone();
        Ok(())
    }

    /// Index value at `position`, if this attribute holds index data.
    pub fn index_at(&self, position: usize) -> Option<u32> {
        self.buffer.read().data().get_index(position)
    }

    /// All values of an index attribute widened to `u32`.
    pub fn index_values(&self) -> Result<Vec<u32>, CoreError> {
        let buffer = self.buffer.read();
        if self.item_size != 1 || IndexWidth::of_element_type(buffer.element_type()).is_none() {
            return Err(CoreError::InvalidIndex);
        }
        let data = buffer.data();
        Ok((0..data.len()).filter_map(|i| data.get_index(i)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_attribute() {
        let attr = Attribute::new(vec![0.0f32; 9], 3).unwrap();
        assert_eq!(attr.count(), 3);
        assert_eq!(attr.kind(), AttributeKind::Plain);
        assert!(attr.owns_buffer());
        assert_eq!(attr.kind().divisor(), 0);
        assert_eq!(attr.kind().offset(), 0);
    }

    #[test]
    fn test_clone_keeps_identity() {
        let attr = Attribute::new(vec![0.0f32; 3], 3).unwrap();
        let other = Attribute::new(vec![0.0f32; 3], 3).unwrap();
        assert_eq!(attr.clone().id(), attr.id());
        assert_ne!(attr.id(), other.id());
    }

    #[test]
    fn test_version_mirrors_buffer() {
        let attr = Attribute::new(vec![0.0f32; 3], 3).unwrap();
        attr.buffer().write().mark_modified();
        assert_eq!(attr.version(), 1);
    }

    #[test]
    fn test_interleaved_bounds() {
        let buffer = BufferRef::from_data(vec![0.0f32; 16], 8).unwrap();
        let uv = Attribute::interleaved(&buffer, 3, 3).unwrap();
        assert_eq!(uv.kind(), AttributeKind::Interleaved { offset: 3 });
        assert!(!uv.owns_buffer());
        assert_eq!(uv.count(), 2);

        let err = Attribute::interleaved(&buffer, 3, 6).unwrap_err();
        assert_eq!(
            err,
            CoreError::InterleavedOverflow {
                offset: 6,
                item_size: 3,
                stride: 8
            }
        );
    }

    #[test]
    fn test_instanced_requires_divisor() {
        assert_eq!(
            Attribute::instanced(vec![0.0f32; 4], 4, 0).unwrap_err(),
            CoreError::ZeroDivisor
        );
        let attr = Attribute::instanced(vec![0.0f32; 8], 4, 2).unwrap();
        assert_eq!(attr.kind().divisor(), 2);
        assert!(attr.kind().is_instanced());
    }

    #[test]
    fn test_invalid_item_size() {
        assert_eq!(
            Attribute::new(vec![0.0f32; 3], 0).unwrap_err(),
            CoreError::InvalidItemSize(0)
        );
    }

    #[test]
    fn test_set_shared_buffer() {
        let first = BufferRef::from_data(vec![0.0f32; 8], 4).unwrap();
        let second = BufferRef::from_data(vec![0.0f32; 8], 4).unwrap();
        let mut attr = Attribute::interleaved(&first, 2, 2).unwrap();
        let id = attr.id();
        attr.set_shared_buffer(&second).unwrap();
        assert_eq!(attr.id(), id);
        assert_eq!(attr.buffer_id(), second.id());

        let mut plain = Attribute::new(vec![0.0f32; 3], 3).unwrap();
        assert_eq!(
            plain.set_shared_buffer(&second).unwrap_err(),
            CoreError::NotInterleaved
        );
    }

    #[test]
    fn test_index_width_selection() {
        let small = Attribute::index(&[0, 1, 65534]).unwrap();
        assert_eq!(small.element_type(), ElementType::U16);

        let large = Attribute::index(&[0, 1, 65535]).unwrap();
        assert_eq!(large.element_type(), ElementType::U32);
        assert_eq!(large.index_values().unwrap(), vec![0, 1, 65535]);
    }

    #[test]
    fn test_integer_binding() {
        let attr = Attribute::new(vec![0u16; 4], 4).unwrap();
        assert!(!attr.binds_as_integer(ElementType::U16));
        let attr = attr.with_gpu_type(GpuType::Integer);
        assert!(attr.binds_as_integer(ElementType::U16));

        let ids = Attribute::new(vec![0i32; 4], 4).unwrap();
        assert!(ids.binds_as_integer(ElementType::I32));
    }
}
