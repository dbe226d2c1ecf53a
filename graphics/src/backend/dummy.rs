//! Dummy GPU context for testing and development.
//!
//! This context performs no GPU work. It keeps a CPU mirror of every buffer
//! object it hands out and records each call as a [`GpuCommand`], so tests
//! can assert on exactly what the binding layer issued.

use std::collections::{HashMap, HashSet};

use vbind_core::UsageHint;

use super::{
    AttributePointer, BackendError, BufferTarget, ConstantValue, ContextFeatures, GpuBufferHandle,
    GpuContext, VertexArrayHandle,
};

/// Default number of vertex attribute slots.
pub const DEFAULT_MAX_VERTEX_ATTRIBUTES: u32 = 16;

/// One recorded context call.
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    CreateVertexArray(VertexArrayHandle),
    BindVertexArray(Option<VertexArrayHandle>),
    DeleteVertexArray(VertexArrayHandle),
    EnableAttribute(u32),
    DisableAttribute(u32),
    AttributeDivisor { slot: u32, divisor: u32 },
    AttributePointer { slot: u32, pointer: AttributePointer },
    AttributeIntegerPointer { slot: u32, pointer: AttributePointer },
    ConstantAttribute { slot: u32, value: ConstantValue },
    CreateBuffer {
        handle: GpuBufferHandle,
        target: BufferTarget,
        size: usize,
        usage: UsageHint,
    },
    BindBuffer {
        target: BufferTarget,
        buffer: Option<GpuBufferHandle>,
    },
    UploadBufferRange {
        target: BufferTarget,
        byte_offset: u64,
        size: usize,
    },
    DeleteBuffer(GpuBufferHandle),
}

/// Recording GPU context.
#[derive(Debug)]
pub struct DummyContext {
    features: ContextFeatures,
    max_vertex_attributes: u32,
    next_handle: u32,
    lost: bool,
    commands: Vec<GpuCommand>,
    buffers: HashMap<GpuBufferHandle, Vec<u8>>,
    bound_buffers: HashMap<BufferTarget, GpuBufferHandle>,
    vertex_arrays: HashSet<VertexArrayHandle>,
    current_vertex_array: Option<VertexArrayHandle>,
    /// Index binding captured by each vertex array; `None` is the default one.
    element_buffers: HashMap<Option<VertexArrayHandle>, GpuBufferHandle>,
}

impl DummyContext {
    /// Create a context with every feature and 16 attribute slots.
    pub fn new() -> Self {
        Self {
            features: ContextFeatures::all(),
            max_vertex_attributes: DEFAULT_MAX_VERTEX_ATTRIBUTES,
            next_handle: 1,
            lost: false,
            commands: Vec::new(),
            buffers: HashMap::new(),
            bound_buffers: HashMap::new(),
            vertex_arrays: HashSet::new(),
            current_vertex_array: None,
            element_buffers: HashMap::new(),
        }
    }

    /// Create a context without vertex-array objects.
    pub fn legacy() -> Self {
        Self::new().with_features(ContextFeatures::INSTANCED_ARRAYS | ContextFeatures::INTEGER_ATTRIBUTES)
    }

    /// Override the advertised features.
    pub fn with_features(mut self, features: ContextFeatures) -> Self {
        self.features = features;
        self
    }

    /// Override the number of attribute slots.
    pub fn with_max_vertex_attributes(mut self, max: u32) -> Self {
        self.max_vertex_attributes = max;
        self
    }

    /// Simulate losing (or restoring) the context.
    ///
    /// A lost context forgets every object it created and refuses to create
    /// new buffers until restored.
    pub fn set_lost(&mut self, lost: bool) {
        log::trace!("DummyContext: lost = {lost}");
        self.lost = lost;
        if lost {
            self.buffers.clear();
            self.bound_buffers.clear();
            self.vertex_arrays.clear();
            self.current_vertex_array = None;
            self.element_buffers.clear();
        }
    }

    /// Whether the context is currently lost.
    pub fn is_lost(&self) -> bool {
        self.lost
    }

    /// Every call recorded so far.
    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    /// Drain the recorded calls.
    pub fn take_commands(&mut self) -> Vec<GpuCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Forget the recorded calls.
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Number of recorded calls matching `predicate`.
    pub fn count_commands(&self, predicate: impl Fn(&GpuCommand) -> bool) -> usize {
        self.commands.iter().filter(|cmd| predicate(cmd)).count()
    }

    /// CPU mirror of a live buffer object.
    pub fn buffer_contents(&self, handle: GpuBufferHandle) -> Option<&[u8]> {
        self.buffers.get(&handle).map(Vec::as_slice)
    }

    /// Number of live buffer objects.
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Index buffer captured by `vertex_array`, or by the default state.
    pub fn element_buffer(&self, vertex_array: Option<VertexArrayHandle>) -> Option<GpuBufferHandle> {
        self.element_buffers.get(&vertex_array).copied()
    }

    /// Vertex array bound right now.
    pub fn current_vertex_array(&self) -> Option<VertexArrayHandle> {
        self.current_vertex_array
    }

    /// Number of live vertex-array objects.
    pub fn live_vertex_arrays(&self) -> usize {
        self.vertex_arrays.len()
    }

    fn track_binding(&mut self, target: BufferTarget, buffer: Option<GpuBufferHandle>) {
        match buffer {
            Some(handle) => self.bound_buffers.insert(target, handle),
            None => self.bound_buffers.remove(&target),
        };
        if target == BufferTarget::Index {
            match buffer {
                Some(handle) => self.element_buffers.insert(self.current_vertex_array, handle),
                None => self.element_buffers.remove(&self.current_vertex_array),
            };
        }
    }

    fn next_handle(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }
}

impl Default for DummyContext {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuContext for DummyContext {
    fn name(&self) -> &str {
        "Dummy Context"
    }

    fn features(&self) -> ContextFeatures {
        self.features
    }

    fn max_vertex_attributes(&self) -> u32 {
        self.max_vertex_attributes
    }

    fn create_vertex_array(&mut self) -> VertexArrayHandle {
        let handle = VertexArrayHandle(self.next_handle());
        log::trace!("DummyContext: create_vertex_array {handle:?}");
        self.vertex_arrays.insert(handle);
        self.commands.push(GpuCommand::CreateVertexArray(handle));
        handle
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayHandle>) {
        log::trace!("DummyContext: bind_vertex_array {vertex_array:?}");
        self.current_vertex_array = vertex_array;
        match self.element_buffers.get(&vertex_array) {
            Some(&handle) => self.bound_buffers.insert(BufferTarget::Index, handle),
            None => self.bound_buffers.remove(&BufferTarget::Index),
        };
        self.commands.push(GpuCommand::BindVertexArray(vertex_array));
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayHandle) {
        log::trace!("DummyContext: delete_vertex_array {vertex_array:?}");
        self.vertex_arrays.remove(&vertex_array);
        self.element_buffers.remove(&Some(vertex_array));
        if self.current_vertex_array == Some(vertex_array) {
            self.current_vertex_array = None;
            match self.element_buffers.get(&None) {
                Some(&handle) => self.bound_buffers.insert(BufferTarget::Index, handle),
                None => self.bound_buffers.remove(&BufferTarget::Index),
            };
        }
        self.commands.push(GpuCommand::DeleteVertexArray(vertex_array));
    }

    fn enable_attribute(&mut self, slot: u32) {
        log::trace!("DummyContext: enable_attribute {slot}");
        self.commands.push(GpuCommand::EnableAttribute(slot));
    }

    fn disable_attribute(&mut self, slot: u32) {
        log::trace!("DummyContext: disable_attribute {slot}");
        self.commands.push(GpuCommand::DisableAttribute(slot));
    }

    fn set_attribute_divisor(&mut self, slot: u32, divisor: u32) {
        log::trace!("DummyContext: attribute_divisor slot={slot} divisor={divisor}");
        self.commands.push(GpuCommand::AttributeDivisor { slot, divisor });
    }

    fn set_attribute_pointer(&mut self, slot: u32, pointer: &AttributePointer) {
        log::trace!("DummyContext: attribute_pointer slot={slot} {pointer:?}");
        self.commands.push(GpuCommand::AttributePointer {
            slot,
            pointer: *pointer,
        });
    }

    fn set_attribute_integer_pointer(&mut self, slot: u32, pointer: &AttributePointer) {
        log::trace!("DummyContext: attribute_integer_pointer slot={slot} {pointer:?}");
        self.commands.push(GpuCommand::AttributeIntegerPointer {
            slot,
            pointer: *pointer,
        });
    }

    fn set_constant_attribute(&mut self, slot: u32, value: ConstantValue) {
        log::trace!("DummyContext: constant_attribute slot={slot} {value:?}");
        self.commands.push(GpuCommand::ConstantAttribute { slot, value });
    }

    fn create_buffer(
        &mut self,
        target: BufferTarget,
        data: &[u8],
        usage: UsageHint,
    ) -> Result<GpuBufferHandle, BackendError> {
        if self.lost {
            return Err(BackendError::ContextLost);
        }
        let handle = GpuBufferHandle(self.next_handle());
        log::trace!(
            "DummyContext: create_buffer {handle:?} target={target:?} size={} usage={usage:?}",
            data.len()
        );
        self.buffers.insert(handle, data.to_vec());
        self.track_binding(target, Some(handle));
        self.commands.push(GpuCommand::CreateBuffer {
            handle,
            target,
            size: data.len(),
            usage,
        });
        Ok(handle)
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<GpuBufferHandle>) {
        log::trace!("DummyContext: bind_buffer target={target:?} {buffer:?}");
        self.track_binding(target, buffer);
        self.commands.push(GpuCommand::BindBuffer { target, buffer });
    }

    fn upload_buffer_range(&mut self, target: BufferTarget, byte_offset: u64, data: &[u8]) {
        log::trace!(
            "DummyContext: upload_buffer_range target={target:?} offset={byte_offset} len={}",
            data.len()
        );
        if let Some(contents) = self
            .bound_buffers
            .get(&target)
            .and_then(|handle| self.buffers.get_mut(handle))
        {
            let start = byte_offset as usize;
            let end = start + data.len();
            if end <= contents.len() {
                contents[start..end].copy_from_slice(data);
            }
        }
        self.commands.push(GpuCommand::UploadBufferRange {
            target,
            byte_offset,
            size: data.len(),
        });
    }

    fn delete_buffer(&mut self, buffer: GpuBufferHandle) {
        log::trace!("DummyContext: delete_buffer {buffer:?}");
        self.buffers.remove(&buffer);
        self.bound_buffers.retain(|_, bound| *bound != buffer);
        // Deleting only detaches the buffer from the bound vertex array.
        if self.element_buffers.get(&self.current_vertex_array) == Some(&buffer) {
            self.element_buffers.remove(&self.current_vertex_array);
        }
        self.commands.push(GpuCommand::DeleteBuffer(buffer));
    }
}

static_assertions::assert_impl_all!(DummyContext: Send, Sync);
