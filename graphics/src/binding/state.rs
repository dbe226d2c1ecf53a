//! A single binding state: one vertex-array object plus the bookkeeping
//! needed to decide whether it is stale.

use std::collections::HashMap;

use fixedbitset::FixedBitSet;
use vbind_core::{Attribute, AttributeId, AttributeKind, BufferId, Geometry};

use super::layout::slot_layouts;
use super::StateKey;
use crate::attributes::AttributeStore;
use crate::backend::{AttributePointer, BufferTarget, ContextFeatures, GpuBufferHandle, GpuContext, VertexArrayHandle};
use crate::material::MaterialState;
use crate::object::{resolve_attribute, Drawable};
use crate::program::Program;

/// What a slot was last pointed at.
///
/// The GPU handle is part of the identity: a buffer recreated after a resize,
/// or materialized after an earlier skip, must be re-pointed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CachedAttribute {
    attribute: AttributeId,
    buffer: BufferId,
    handle: Option<GpuBufferHandle>,
}

impl CachedAttribute {
    fn of(attribute: &Attribute, store: &AttributeStore) -> Self {
        Self {
            attribute: attribute.id(),
            buffer: attribute.buffer_id(),
            handle: store.get(attribute).map(|record| record.handle),
        }
    }
}

/// Slot configuration captured by one vertex-array object, or by the
/// context's global state for the default state.
#[derive(Debug)]
pub struct BindingState {
    vertex_array: Option<VertexArrayHandle>,
    key: Option<StateKey>,
    new_slots: FixedBitSet,
    enabled_slots: FixedBitSet,
    divisors: Vec<u32>,
    cache: HashMap<String, Option<CachedAttribute>>,
    attribute_count: usize,
    index: Option<CachedAttribute>,
}

impl BindingState {
    pub(crate) fn new(vertex_array: Option<VertexArrayHandle>, max_slots: usize) -> Self {
        Self {
            vertex_array,
            key: None,
            new_slots: FixedBitSet::with_capacity(max_slots),
            enabled_slots: FixedBitSet::with_capacity(max_slots),
            divisors: vec![0; max_slots],
            cache: HashMap::new(),
            attribute_count: 0,
            index: None,
        }
    }

    /// Vertex-array object, `None` for the default state.
    pub fn vertex_array(&self) -> Option<VertexArrayHandle> {
        self.vertex_array
    }

    /// Slots currently enabled.
    pub fn enabled_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.enabled_slots.ones()
    }

    /// Divisor last set on `slot`.
    pub fn divisor(&self, slot: usize) -> u32 {
        self.divisors.get(slot).copied().unwrap_or(0)
    }

    /// Point the default state at `key`. Returns `true` when it changed.
    pub(crate) fn rekey(&mut self, key: StateKey) -> bool {
        if self.key == Some(key) {
            return false;
        }
        self.key = Some(key);
        true
    }

    pub(crate) fn key(&self) -> Option<StateKey> {
        self.key
    }

    pub(crate) fn clear_key(&mut self) {
        self.key = None;
    }

    /// Whether the captured configuration differs from what this draw needs.
    pub(crate) fn needs_update(
        &self,
        store: &AttributeStore,
        object: &dyn Drawable,
        geometry: &Geometry,
        program: &Program,
        index: Option<&Attribute>,
    ) -> bool {
        let mut count = 0;
        for input in program.inputs() {
            let current = resolve_attribute(&input.name, geometry, object).map(|attr| CachedAttribute::of(attr, store));
            match self.cache.get(&input.name) {
                Some(cached) if *cached == current => count += 1,
                _ => return true,
            }
        }
        if self.attribute_count != count {
            return true;
        }
        self.index != index.map(|index| CachedAttribute::of(index, store))
    }

    /// Record what this draw binds, including inputs with no attribute.
    pub(crate) fn save_cache(
        &mut self,
        store: &AttributeStore,
        object: &dyn Drawable,
        geometry: &Geometry,
        program: &Program,
        index: Option<&Attribute>,
    ) {
        self.cache.clear();
        for input in program.inputs() {
            let current = resolve_attribute(&input.name, geometry, object).map(|attr| CachedAttribute::of(attr, store));
            self.cache.insert(input.name.clone(), current);
        }
        self.attribute_count = program.inputs().len();
        self.index = index.map(|index| CachedAttribute::of(index, store));
    }

    /// Issue the slot enable/divisor/pointer calls for this draw.
    ///
    /// Inputs with no attribute fall back to the material's default value;
    /// inputs with neither, or whose buffer is not on the GPU yet, are
    /// skipped. Slots enabled by an earlier draw but unused now are
    /// disabled afterwards.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn bind_attributes(
        &mut self,
        ctx: &mut dyn GpuContext,
        store: &AttributeStore,
        features: ContextFeatures,
        object: &dyn Drawable,
        material: &MaterialState,
        program: &Program,
        geometry: &Geometry,
    ) {
        self.new_slots.clear();

        for input in program.inputs() {
            let Some(attribute) = resolve_attribute(&input.name, geometry, object) else {
                if let Some(value) = material.default_value(&input.name) {
                    ctx.set_constant_attribute(input.location, value);
                }
                continue;
            };
            let Some(record) = store.get(attribute) else {
                log::debug!("Input '{}' skipped: buffer {} not on the GPU", input.name, attribute.buffer_id());
                continue;
            };

            let divisor = match attribute.kind() {
                AttributeKind::Plain | AttributeKind::Interleaved { .. } => 0,
                AttributeKind::Instanced { divisor } | AttributeKind::InstancedInterleaved { divisor, .. } => {
                    if !object.is_instanced() {
                        let count = u32::try_from(attribute.count()).unwrap_or(u32::MAX);
                        geometry.set_max_instance_count_hint(divisor.saturating_mul(count));
                    }
                    divisor
                }
            };
            if divisor > 0 && !features.contains(ContextFeatures::INSTANCED_ARRAYS) {
                log::warn!("Input '{}' skipped: context lacks instanced arrays", input.name);
                continue;
            }
            let integer = attribute.binds_as_integer(record.element_type);
            if integer && !features.contains(ContextFeatures::INTEGER_ATTRIBUTES) {
                log::warn!("Input '{}' skipped: context lacks integer attributes", input.name);
                continue;
            }

            for i in 0..input.location_size {
                self.enable_slot(ctx, input.location + i, divisor);
            }
            ctx.bind_buffer(BufferTarget::Vertex, Some(record.handle));

            let layouts = slot_layouts(
                attribute.kind(),
                attribute.item_size(),
                attribute.buffer().stride(),
                record.bytes_per_element,
                input.location_size,
            );
            for layout in layouts {
                let pointer = AttributePointer {
                    components: layout.components,
                    element_type: record.element_type,
                    normalized: attribute.normalized(),
                    stride: layout.stride,
                    offset: layout.offset,
                };
                let slot = input.location + layout.slot_offset;
                if integer {
                    ctx.set_attribute_integer_pointer(slot, &pointer);
                } else {
                    ctx.set_attribute_pointer(slot, &pointer);
                }
            }
        }

        self.disable_unused_slots(ctx);
    }

    fn enable_slot(&mut self, ctx: &mut dyn GpuContext, slot: u32, divisor: u32) {
        let index = slot as usize;
        self.new_slots.insert(index);
        if !self.enabled_slots.contains(index) {
            ctx.enable_attribute(slot);
            self.enabled_slots.insert(index);
        }
        if self.divisors[index] != divisor {
            ctx.set_attribute_divisor(slot, divisor);
            self.divisors[index] = divisor;
        }
    }

    fn disable_unused_slots(&mut self, ctx: &mut dyn GpuContext) {
        let stale: Vec<usize> = self.enabled_slots.difference(&self.new_slots).collect();
        for index in stale {
            ctx.disable_attribute(index as u32);
            self.enabled_slots.set(index, false);
        }
    }
}
