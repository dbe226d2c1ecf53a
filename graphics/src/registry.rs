//! Geometry registry: first-sight registration, uploads, derived wireframe
//! indices and dispose-time teardown.

use std::collections::{HashMap, HashSet};

use vbind_core::profiling::profile_scope;
use vbind_core::{Attribute, AttributeId, CoreError, Geometry, GeometryId, WireframeSource};

use crate::attributes::{AttributeStore, UploadOutcome};
use crate::backend::{BufferTarget, GpuContext};
use crate::binding::BindingStates;

#[derive(Debug)]
struct WireframeEntry {
    attribute: Attribute,
    source: AttributeId,
    source_version: u64,
}

/// Counts from one [`GeometryRegistry::upload_attributes`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub transferred: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

impl UploadSummary {
    fn record(&mut self, outcome: UploadOutcome) {
        match outcome {
            UploadOutcome::Created | UploadOutcome::Uploaded => self.transferred += 1,
            UploadOutcome::Unchanged => self.unchanged += 1,
            UploadOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Tracks which geometries are live and owns their wireframe indices.
#[derive(Debug, Default)]
pub struct GeometryRegistry {
    registered: HashSet<GeometryId>,
    wireframes: HashMap<GeometryId, WireframeEntry>,
}

impl GeometryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `geometry` as live. Returns `true` on first sight.
    pub fn register(&mut self, geometry: &Geometry) -> bool {
        let fresh = self.registered.insert(geometry.id());
        if fresh {
            log::debug!(
                "Registered geometry {} ({:?}) with {} attributes",
                geometry.id(),
                geometry.label(),
                geometry.attributes().count()
            );
        }
        fresh
    }

    pub fn is_registered(&self, id: GeometryId) -> bool {
        self.registered.contains(&id)
    }

    /// Number of live geometries.
    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    /// Upload every attribute of `geometry` whose version advanced.
    ///
    /// The index is left to bind time, where the wireframe decision picks
    /// which index to upload.
    pub fn upload_attributes(
        &mut self,
        ctx: &mut dyn GpuContext,
        store: &mut AttributeStore,
        geometry: &Geometry,
    ) -> UploadSummary {
        profile_scope!("upload_attributes");

        let mut summary = UploadSummary::default();
        for (_, attribute) in geometry.attributes() {
            summary.record(store.update(ctx, attribute, BufferTarget::Vertex));
        }
        if let Some(indirect) = geometry.indirect() {
            summary.record(store.update(ctx, indirect, BufferTarget::DrawIndirect));
        }
        log::trace!("Geometry {} uploads: {summary:?}", geometry.id());
        summary
    }

    /// Line-list index for drawing `geometry` as a wireframe.
    ///
    /// Built on first request and rebuilt only when the source attribute is
    /// replaced or its version advances past the one recorded at build time.
    /// A rebuilt attribute's stale GPU copy is released.
    pub fn wireframe_attribute(
        &mut self,
        ctx: &mut dyn GpuContext,
        store: &mut AttributeStore,
        geometry: &Geometry,
    ) -> Result<Option<Attribute>, CoreError> {
        let Some(source) = WireframeSource::of(geometry) else {
            return Ok(None);
        };
        let source_id = source.attribute().id();
        let source_version = source.version();

        if let Some(entry) = self.wireframes.get(&geometry.id()) {
            if entry.source == source_id && entry.source_version >= source_version {
                return Ok(Some(entry.attribute.clone()));
            }
        }

        profile_scope!("build_wireframe");
        let attribute = source.build()?;
        log::debug!(
            "Built wireframe for geometry {} ({} indices)",
            geometry.id(),
            attribute.count()
        );
        let entry = WireframeEntry {
            attribute: attribute.clone(),
            source: source_id,
            source_version,
        };
        if let Some(stale) = self.wireframes.insert(geometry.id(), entry) {
            store.remove(ctx, &stale.attribute);
        }
        Ok(Some(attribute))
    }

    /// Tear down everything derived from `geometry`.
    ///
    /// Releases the GPU copies of buffers its attributes own (including the
    /// index), its wireframe index and every binding state keyed on it.
    /// Shared interleaved buffers stay alive. A second call is a no-op and
    /// returns `false`.
    pub fn dispose(
        &mut self,
        ctx: &mut dyn GpuContext,
        store: &mut AttributeStore,
        states: &mut BindingStates,
        geometry: &Geometry,
    ) -> bool {
        let id = geometry.id();
        if !self.registered.remove(&id) {
            return false;
        }

        let owned = geometry
            .attributes()
            .map(|(_, attribute)| attribute)
            .chain(geometry.index())
            .chain(geometry.indirect())
            .filter(|attribute| attribute.owns_buffer());
        for attribute in owned {
            store.remove(ctx, attribute);
        }
        if let Some(entry) = self.wireframes.remove(&id) {
            store.remove(ctx, &entry.attribute);
        }
        states.release_states_of_geometry(ctx, id);

        log::debug!("Disposed geometry {id}");
        true
    }

    /// Forget all state without touching the GPU.
    pub fn clear(&mut self) {
        self.registered.clear();
        self.wireframes.clear();
    }
}
