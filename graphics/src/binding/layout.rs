//! Byte layout of attribute data across hardware slots.
//!
//! An input wider than four components (a 4x4 matrix) spans several
//! consecutive slots. Each slot reads `item_size / location_size` components
//! at its own byte offset within the record.

use vbind_core::AttributeKind;

/// Pointer parameters for one slot of a program input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotLayout {
    /// Slot index relative to the input's first location.
    pub slot_offset: u32,
    /// Components read by this slot.
    pub components: u32,
    /// Record stride in bytes.
    pub stride: u32,
    /// Byte offset of this slot's first component.
    pub offset: u32,
}

/// Slot layouts for an attribute bound to an input spanning `location_size` slots.
///
/// `buffer_stride` is the record width of the backing buffer in elements; it
/// only matters for interleaved attributes, where the record holds several
/// attributes side by side.
pub fn slot_layouts(
    kind: AttributeKind,
    item_size: usize,
    buffer_stride: usize,
    element_size: usize,
    location_size: u32,
) -> impl Iterator<Item = SlotLayout> {
    let per_slot = (item_size / location_size.max(1) as usize).max(1);
    let (record, base) = match kind {
        AttributeKind::Plain | AttributeKind::Instanced { .. } => (item_size, 0),
        AttributeKind::Interleaved { offset } | AttributeKind::InstancedInterleaved { offset, .. } => {
            (buffer_stride, offset)
        }
    };
    (0..location_size).map(move |i| SlotLayout {
        slot_offset: i,
        components: per_slot as u32,
        stride: (record * element_size) as u32,
        offset: ((base + per_slot * i as usize) * element_size) as u32,
    })
}
