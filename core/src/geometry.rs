//! Geometry: a named set of attributes plus optional index data.
//!
//! A [`Geometry`] is shared between drawn objects through a [`GeometryRef`].
//! The binding layer reads it, and writes back exactly one derived value:
//! the maximum-instance-count hint, which is write-once so re-entrant binds
//! within a frame cannot disagree about it.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::attribute::Attribute;
use crate::error::CoreError;
use crate::id::GeometryId;
use crate::index::IndexWidth;

/// Shared handle to a geometry.
pub type GeometryRef = Arc<RwLock<Geometry>>;

/// Sub-range of the geometry to draw, in vertices (or indices when indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DrawRange {
    /// First vertex or index.
    pub start: usize,
    /// Number of vertices or indices; `None` draws to the end.
    pub count: Option<usize>,
}

/// Attribute container for one drawable shape.
#[derive(Debug)]
pub struct Geometry {
    id: GeometryId,
    label: Option<String>,
    attributes: BTreeMap<String, Attribute>,
    index: Option<Attribute>,
    indirect: Option<Attribute>,
    max_instance_count: OnceLock<u32>,
    draw_range: DrawRange,
}

impl Geometry {
    /// Create an empty geometry.
    pub fn new() -> Self {
        Self {
            id: GeometryId::new(),
            label: None,
            attributes: BTreeMap::new(),
            index: None,
            indirect: None,
            max_instance_count: OnceLock::new(),
            draw_range: DrawRange::default(),
        }
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Add an attribute (builder form of [`set_attribute`](Self::set_attribute)).
    pub fn with_attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.set_attribute(name, attribute);
        self
    }

    /// Wrap in a shared handle.
    pub fn into_shared(self) -> GeometryRef {
        Arc::new(RwLock::new(self))
    }

    /// Geometry identity.
    pub fn id(&self) -> GeometryId {
        self.id
    }

    /// Debug label, if set.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Insert or replace the attribute stored under `name`.
    ///
    /// Returns the attribute previously stored under that name.
    pub fn set_attribute(&mut self, name: impl Into<String>, attribute: Attribute) -> Option<Attribute> {
        self.attributes.insert(name.into(), attribute)
    }

    /// Attribute stored under `name`.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Mutable attribute stored under `name`.
    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes.get_mut(name)
    }

    /// Remove the attribute stored under `name`.
    pub fn remove_attribute(&mut self, name: &str) -> Option<Attribute> {
        self.attributes.remove(name)
    }

    /// Whether an attribute is stored under `name`.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// All attributes, ordered by name.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes.iter().map(|(name, attr)| (name.as_str(), attr))
    }

    /// Set or clear the index attribute.
    pub fn set_index(&mut self, index: Option<Attribute>) -> Result<(), CoreError> {
        if let Some(index) = &index {
            let valid_type = IndexWidth::of_element_type(index.element_type()).is_some();
            if index.item_size() != 1 || !valid_type || index.kind().is_interleaved() {
                return Err(CoreError::InvalidIndex);
            }
        }
        self.index = index;
        Ok(())
    }

    /// Index attribute, if indexed.
    pub fn index(&self) -> Option<&Attribute> {
        self.index.as_ref()
    }

    /// Set or clear the indirect draw-parameter attribute.
    pub fn set_indirect(&mut self, indirect: Option<Attribute>) {
        self.indirect = indirect;
    }

    /// Indirect draw-parameter attribute, if any.
    pub fn indirect(&self) -> Option<&Attribute> {
        self.indirect.as_ref()
    }

    /// Draw range.
    pub fn draw_range(&self) -> DrawRange {
        self.draw_range
    }

    /// Restrict drawing to a sub-range.
    pub fn set_draw_range(&mut self, start: usize, count: Option<usize>) {
        self.draw_range = DrawRange { start, count };
    }

    /// Number of vertices: the `position` count, or the first per-vertex attribute's.
    pub fn vertex_count(&self) -> usize {
        if let Some(position) = self.attributes.get("position") {
            return position.count();
        }
        self.attributes
            .values()
            .find(|attr| !attr.kind().is_instanced())
            .map(Attribute::count)
            .unwrap_or(0)
    }

    /// Check that all per-vertex attributes agree on the vertex count.
    ///
    /// Indexed geometries may carry attributes of differing lengths.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.index.is_some() {
            return Ok(());
        }
        let expected = self.vertex_count();
        for (name, attr) in &self.attributes {
            if attr.kind().is_instanced() {
                continue;
            }
            if attr.count() != expected {
                return Err(CoreError::VertexCountMismatch {
                    name: name.clone(),
                    count: attr.count(),
                    expected,
                });
            }
        }
        Ok(())
    }

    /// Maximum drawable instance count derived from instanced attributes.
    pub fn max_instance_count(&self) -> Option<u32> {
        self.max_instance_count.get().copied()
    }

    /// Record the maximum instance count. The first write wins.
    ///
    /// Returns `true` if this call stored the value.
    pub fn set_max_instance_count_hint(&self, count: u32) -> bool {
        self.max_instance_count.set(count).is_ok()
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(Geometry: Send, Sync);
