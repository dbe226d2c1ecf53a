//! GPU copies of versioned buffers.
//!
//! [`AttributeStore`] maps each [`VertexBuffer`](vbind_core::VertexBuffer)
//! to the buffer object holding its GPU copy. Attributes that share an
//! interleaved buffer share one record. Uploads are gated on the buffer
//! version: an unchanged version never reaches the GPU.

use std::collections::HashMap;

use vbind_core::{Attribute, BufferId, ElementType};

use crate::backend::{BufferTarget, GpuBufferHandle, GpuContext};

/// GPU-side state of one buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuBufferRecord {
    pub handle: GpuBufferHandle,
    pub element_type: ElementType,
    pub bytes_per_element: usize,
    /// Buffer version last uploaded.
    pub version: u64,
    /// Allocation size in bytes.
    pub size: usize,
}

/// What [`AttributeStore::update`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadOutcome {
    /// The buffer object was created with the full content.
    Created,
    /// Pending ranges (or the whole content) were uploaded.
    Uploaded,
    /// The GPU copy was already current.
    Unchanged,
    /// Nothing could be uploaded: the buffer is disposed or creation failed.
    Skipped,
}

impl UploadOutcome {
    /// Whether bytes were sent to the GPU.
    pub fn transferred(&self) -> bool {
        matches!(self, Self::Created | Self::Uploaded)
    }
}

/// Buffer-id keyed table of GPU buffer objects.
#[derive(Debug, Default)]
pub struct AttributeStore {
    buffers: HashMap<BufferId, GpuBufferRecord>,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the GPU copy of `attribute`'s buffer up to date.
    pub fn update(&mut self, ctx: &mut dyn GpuContext, attribute: &Attribute, target: BufferTarget) -> UploadOutcome {
        let buffer_ref = attribute.buffer();
        let id = buffer_ref.id();
        let mut buffer = buffer_ref.write();
        if buffer.is_disposed() {
            log::debug!("Skipping upload of disposed buffer {id}");
            return UploadOutcome::Skipped;
        }

        let size = buffer.data().as_bytes().len();
        if self.buffers.get(&id).is_some_and(|record| record.size != size) {
            log::debug!("Buffer {id} changed size, recreating");
            self.remove_buffer(ctx, id);
        }

        match self.buffers.get_mut(&id) {
            None => {
                buffer.lock_usage();
                let handle = match ctx.create_buffer(target, buffer.data().as_bytes(), buffer.usage()) {
                    Ok(handle) => handle,
                    Err(err) => {
                        log::warn!("Failed to create GPU buffer for {id}: {err}");
                        return UploadOutcome::Skipped;
                    }
                };
                let element_type = buffer.element_type();
                self.buffers.insert(
                    id,
                    GpuBufferRecord {
                        handle,
                        element_type,
                        bytes_per_element: element_type.size(),
                        version: buffer.version(),
                        size,
                    },
                );
                buffer.clear_update_ranges();
                UploadOutcome::Created
            }
            Some(record) if record.version >= buffer.version() => UploadOutcome::Unchanged,
            Some(record) => {
                ctx.bind_buffer(target, Some(record.handle));
                if buffer.update_ranges().is_empty() {
                    ctx.upload_buffer_range(target, 0, buffer.data().as_bytes());
                } else {
                    let element_size = record.bytes_per_element;
                    for range in buffer.update_ranges() {
                        let data = buffer.data().range_bytes(range.offset, range.count);
                        ctx.upload_buffer_range(target, (range.offset * element_size) as u64, data);
                    }
                    buffer.clear_update_ranges();
                }
                record.version = buffer.version();
                UploadOutcome::Uploaded
            }
        }
    }

    /// GPU record of `attribute`'s buffer, if materialized.
    pub fn get(&self, attribute: &Attribute) -> Option<&GpuBufferRecord> {
        self.buffers.get(&attribute.buffer_id())
    }

    /// Release the GPU copy of `attribute`'s buffer.
    pub fn remove(&mut self, ctx: &mut dyn GpuContext, attribute: &Attribute) -> bool {
        self.remove_buffer(ctx, attribute.buffer_id())
    }

    /// Release the GPU copy of a buffer by id.
    pub fn remove_buffer(&mut self, ctx: &mut dyn GpuContext, id: BufferId) -> bool {
        match self.buffers.remove(&id) {
            Some(record) => {
                ctx.delete_buffer(record.handle);
                true
            }
            None => false,
        }
    }

    /// Forget every record without touching the GPU.
    ///
    /// Used after context loss, when the handles are already gone.
    pub fn clear(&mut self) {
        self.buffers.clear();
    }

    /// Release every GPU copy.
    pub fn dispose(&mut self, ctx: &mut dyn GpuContext) {
        for (_, record) in self.buffers.drain() {
            ctx.delete_buffer(record.handle);
        }
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}
