//! Versioned vertex buffers.
//!
//! A [`VertexBuffer`] is a flat, strided block of typed elements. One buffer can
//! back several attributes (interleaving), so it is shared through a
//! [`BufferRef`] handle. Every content change bumps the buffer's version; the
//! GPU attribute store compares that version with the one it last uploaded
//! and skips the upload when nothing changed.
//!
//! # Version discipline
//!
//! Staleness is detected by version only. Writing through [`VertexBuffer::data_mut`]
//! does not bump the version; callers that mutate in place must follow up
//! with [`VertexBuffer::mark_modified`] or the GPU copy stays stale.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::CoreError;
use crate::id::BufferId;

/// Numeric type of the elements stored in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// Signed 8-bit integer.
    I8,
    /// Unsigned 8-bit integer.
    U8,
    /// Signed 16-bit integer.
    I16,
    /// Unsigned 16-bit integer.
    U16,
    /// Signed 32-bit integer.
    I32,
    /// Unsigned 32-bit integer.
    U32,
    /// 32-bit float.
    F32,
}

impl ElementType {
    /// Size of one element in bytes.
    pub fn size(&self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
        }
    }

    /// Whether the element type is an integer type.
    pub fn is_integer(&self) -> bool {
        !matches!(self, Self::F32)
    }

    /// Whether data of this type must go through the integer pointer path.
    ///
    /// 8- and 16-bit integers are commonly fed to float inputs (normalized
    /// colors, packed normals); only 32-bit integers bind as integers by default.
    pub fn binds_as_integer(&self) -> bool {
        matches!(self, Self::I32 | Self::U32)
    }
}

/// Typed backing storage of a [`VertexBuffer`].
#[derive(Debug, Clone, PartialEq)]
pub enum BufferData {
    /// Signed bytes.
    I8(Vec<i8>),
    /// Unsigned bytes.
    U8(Vec<u8>),
    /// Signed shorts.
    I16(Vec<i16>),
    /// Unsigned shorts.
    U16(Vec<u16>),
    /// Signed ints.
    I32(Vec<i32>),
    /// Unsigned ints.
    U32(Vec<u32>),
    /// Floats.
    F32(Vec<f32>),
}

macro_rules! impl_buffer_data_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Vec<$ty>> for BufferData {
                fn from(values: Vec<$ty>) -> Self {
                    Self::$variant(values)
                }
            }
        )*
    };
}

impl_buffer_data_from!(
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    f32 => F32,
);

impl BufferData {
    /// Element type of the stored values.
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::I8(_) => ElementType::I8,
            Self::U8(_) => ElementType::U8,
            Self::I16(_) => ElementType::I16,
            Self::U16(_) => ElementType::U16,
            Self::I32(_) => ElementType::I32,
            Self::U32(_) => ElementType::U32,
            Self::F32(_) => ElementType::F32,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::I8(v) => v.len(),
            Self::U8(v) => v.len(),
            Self::I16(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::I32(v) => v.len(),
            Self::U32(v) => v.len(),
            Self::F32(v) => v.len(),
        }
    }

    /// Whether the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw bytes of the whole array.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::I8(v) => bytemuck::cast_slice(v),
            Self::U8(v) => v,
            Self::I16(v) => bytemuck::cast_slice(v),
            Self::U16(v) => bytemuck::cast_slice(v),
            Self::I32(v) => bytemuck::cast_slice(v),
            Self::U32(v) => bytemuck::cast_slice(v),
            Self::F32(v) => bytemuck::cast_slice(v),
        }
    }

    /// Raw bytes of `count` elements starting at element `offset`.
    ///
    /// The range is clamped to the array length.
    pub fn range_bytes(&self, offset: usize, count: usize) -> &[u8] {
        let size = self.element_type().size();
        let bytes = self.as_bytes();
        let start = offset.saturating_mul(size).min(bytes.len());
        let end = offset.saturating_add(count).saturating_mul(size).clamp(start, bytes.len());
        &bytes[start..end]
    }

    /// Element at `index` widened to `u32`, for index data.
    ///
    /// Negative and float values are not valid indices and yield `None`.
    pub fn get_index(&self, index: usize) -> Option<u32> {
        match self {
            Self::U8(v) => v.get(index).map(|&x| x as u32),
            Self::U16(v) => v.get(index).map(|&x| x as u32),
            Self::U32(v) => v.get(index).copied(),
            Self::I8(v) => v.get(index).and_then(|&x| u32::try_from(x).ok()),
            Self::I16(v) => v.get(index).and_then(|&x| u32::try_from(x).ok()),
            Self::I32(v) => v.get(index).and_then(|&x| u32::try_from(x).ok()),
            Self::F32(_) => None,
        }
    }

    /// Copy `source` into this array starting at element `offset`.
    fn copy_from(&mut self, offset: usize, source: &BufferData) -> Result<(), CoreError> {
        let expected = self.element_type();
        let actual = source.element_type();
        if expected != actual {
            return Err(CoreError::ElementTypeMismatch { expected, actual });
        }
        let len = self.len();
        let count = source.len();
        if offset + count > len {
            return Err(CoreError::OutOfBounds { offset, count, len });
        }
        let range = offset..offset + count;
        match (self, source) {
            (Self::I8(dst), Self::I8(src)) => dst[range].copy_from_slice(src),
            (Self::U8(dst), Self::U8(src)) => dst[range].copy_from_slice(src),
            (Self::I16(dst), Self::I16(src)) => dst[range].copy_from_slice(src),
            (Self::U16(dst), Self::U16(src)) => dst[range].copy_from_slice(src),
            (Self::I32(dst), Self::I32(src)) => dst[range].copy_from_slice(src),
            (Self::U32(dst), Self::U32(src)) => dst[range].copy_from_slice(src),
            (Self::F32(dst), Self::F32(src)) => dst[range].copy_from_slice(src),
            _ => unreachable!("element types checked above"),
        }
        Ok(())
    }
}

/// Optimization hint describing how often a buffer changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UsageHint {
    /// Written once, drawn many times.
    #[default]
    Static,
    /// Rewritten occasionally.
    Dynamic,
    /// Rewritten every frame.
    Stream,
}

/// A pending partial upload, in elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UpdateRange {
    /// First element to upload.
    pub offset: usize,
    /// Number of elements to upload.
    pub count: usize,
}

/// A flat, strided, versioned array of numeric elements.
#[derive(Debug)]
pub struct VertexBuffer {
    id: BufferId,
    data: BufferData,
    stride: usize,
    usage: UsageHint,
    usage_locked: bool,
    version: u64,
    update_ranges: Vec<UpdateRange>,
    disposed: bool,
    label: Option<String>,
}

impl VertexBuffer {
    /// Create a buffer whose records are `stride` elements wide.
    pub fn new(data: impl Into<BufferData>, stride: usize) -> Result<Self, CoreError> {
        let data = data.into();
        if stride == 0 {
            return Err(CoreError::ZeroStride);
        }
        if data.len() % stride != 0 {
            return Err(CoreError::RaggedData {
                len: data.len(),
                stride,
            });
        }
        Ok(Self {
            id: BufferId::new(),
            data,
            stride,
            usage: UsageHint::Static,
            usage_locked: false,
            version: 0,
            update_ranges: Vec::new(),
            disposed: false,
            label: None,
        })
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the usage hint before first upload.
    pub fn with_usage(mut self, usage: UsageHint) -> Self {
        self.usage = usage;
        self
    }

    /// Buffer identity.
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Debug label, if set.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Elements per record.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of records.
    pub fn count(&self) -> usize {
        self.data.len() / self.stride
    }

    /// Element type of the backing array.
    pub fn element_type(&self) -> ElementType {
        self.data.element_type()
    }

    /// Content version. Starts at 0 and only grows.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Flag the content as changed.
    pub fn mark_modified(&mut self) {
        self.version += 1;
    }

    /// Backing array.
    pub fn data(&self) -> &BufferData {
        &self.data
    }

    /// Mutable backing array. Does not bump the version.
    pub fn data_mut(&mut self) -> &mut BufferData {
        &mut self.data
    }

    /// Replace the whole content.
    ///
    /// Pending update ranges are dropped since the next upload covers everything.
    pub fn set_data(&mut self, data: impl Into<BufferData>) -> Result<(), CoreError> {
        let data = data.into();
        if data.len() % self.stride != 0 {
            return Err(CoreError::RaggedData {
                len: data.len(),
                stride: self.stride,
            });
        }
        self.data = data;
        self.update_ranges.clear();
        self.mark_modified();
        Ok(())
    }

    /// Overwrite elements starting at `offset` and schedule a partial upload.
    pub fn write(&mut self, offset: usize, values: impl Into<BufferData>) -> Result<(), CoreError> {
        let values = values.into();
        self.data.copy_from(offset, &values)?;
        self.update_ranges.push(UpdateRange {
            offset,
            count: values.len(),
        });
        self.mark_modified();
        Ok(())
    }

    /// Schedule a partial upload of an element range.
    ///
    /// The range is clamped to the buffer. Ranges that end up empty are dropped.
    pub fn add_update_range(&mut self, offset: usize, count: usize) {
        let len = self.data.len();
        let count = count.min(len.saturating_sub(offset));
        if count == 0 {
            log::debug!("Dropping empty update range at {offset} of buffer {}", self.id);
            return;
        }
        self.update_ranges.push(UpdateRange { offset, count });
    }

    /// Pending partial uploads.
    pub fn update_ranges(&self) -> &[UpdateRange] {
        &self.update_ranges
    }

    /// Forget pending partial uploads.
    pub fn clear_update_ranges(&mut self) {
        self.update_ranges.clear();
    }

    /// Usage hint.
    pub fn usage(&self) -> UsageHint {
        self.usage
    }

    /// Change the usage hint. Fails once the buffer has been uploaded.
    pub fn set_usage(&mut self, usage: UsageHint) -> Result<(), CoreError> {
        if self.usage_locked && usage != self.usage {
            log::warn!(
                "Buffer {} is already uploaded, keeping usage {:?} over {usage:?}",
                self.id,
                self.usage
            );
            return Err(CoreError::UsageLocked);
        }
        self.usage = usage;
        Ok(())
    }

    /// Freeze the usage hint. Called on first upload.
    pub fn lock_usage(&mut self) {
        self.usage_locked = true;
    }

    /// Whether the usage hint is frozen.
    pub fn is_usage_locked(&self) -> bool {
        self.usage_locked
    }

    /// Mark the buffer unusable. Its GPU copy is released by whoever owns it.
    pub fn dispose(&mut self) {
        log::debug!("Disposing buffer {}", self.id);
        self.disposed = true;
    }

    /// Whether [`dispose`](Self::dispose) was called.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// Shared handle to a [`VertexBuffer`].
///
/// Cloning the handle shares the buffer. The id is cached outside the lock so
/// identity checks never contend with writers.
#[derive(Clone)]
pub struct BufferRef {
    id: BufferId,
    inner: Arc<RwLock<VertexBuffer>>,
}

impl BufferRef {
    /// Wrap a buffer in a shared handle.
    pub fn new(buffer: VertexBuffer) -> Self {
        Self {
            id: buffer.id(),
            inner: Arc::new(RwLock::new(buffer)),
        }
    }

    /// Create a buffer and wrap it in one step.
    pub fn from_data(data: impl Into<BufferData>, stride: usize) -> Result<Self, CoreError> {
        VertexBuffer::new(data, stride).map(Self::new)
    }

    /// Buffer identity.
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Lock for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, VertexBuffer> {
        self.inner.read()
    }

    /// Lock for writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, VertexBuffer> {
        self.inner.write()
    }

    /// Current content version.
    pub fn version(&self) -> u64 {
        self.inner.read().version()
    }

    /// Elements per record.
    pub fn stride(&self) -> usize {
        self.inner.read().stride()
    }

    /// Number of records.
    pub fn count(&self) -> usize {
        self.inner.read().count()
    }

    /// Element type of the backing array.
    pub fn element_type(&self) -> ElementType {
        self.inner.read().element_type()
    }

    /// Whether two handles share one buffer.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for BufferRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let buffer = self.inner.read();
        f.debug_struct("BufferRef")
            .field("id", &self.id)
            .field("label", &buffer.label)
            .field("stride", &buffer.stride)
            .field("count", &buffer.count())
            .field("version", &buffer.version)
            .finish()
    }
}

static_assertions::assert_impl_all!(BufferRef: Send, Sync);
