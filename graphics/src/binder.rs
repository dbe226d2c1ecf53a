//! The binder: one entry point per draw-loop step.
//!
//! ```ignore
//! let mut binder = VertexBinder::new(context, BinderConfig::default());
//! binder.begin_frame();
//! for object in &objects {
//!     let setup = binder.prepare_draw(object, &material, &program)?;
//!     // issue the draw described by `setup`
//! }
//! ```

use vbind_core::profiling::{frame_mark, profile_plot, profile_scope};
use vbind_core::{Attribute, Geometry, GeometryId, GeometryRef, IndexWidth};

use crate::attributes::AttributeStore;
use crate::backend::GpuContext;
use crate::binding::{BindOutcome, BindingStates};
use crate::config::BinderConfig;
use crate::error::BindingError;
use crate::frame::{FrameCoordinator, FrameUpdate};
use crate::material::MaterialState;
use crate::object::Drawable;
use crate::program::Program;
use crate::registry::GeometryRegistry;
use crate::stats::BinderStats;

/// Primitive topology of a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveMode {
    #[default]
    Triangles,
    Lines,
}

/// Everything needed to issue a draw after [`VertexBinder::prepare_draw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawSetup {
    pub mode: PrimitiveMode,
    /// Index width, `None` for a non-indexed draw.
    pub index_width: Option<IndexWidth>,
    /// First vertex or index.
    pub first: usize,
    /// Vertices or indices to draw.
    pub count: usize,
    /// Instances to draw.
    pub instance_count: u32,
    /// Whether slot state was rebuilt for this draw.
    pub outcome: BindOutcome,
}

/// Owns a GPU context and every cache built on top of it.
#[derive(Debug)]
pub struct VertexBinder<C: GpuContext> {
    context: C,
    config: BinderConfig,
    attributes: AttributeStore,
    registry: GeometryRegistry,
    states: BindingStates,
    frames: FrameCoordinator,
    stats: BinderStats,
}

impl<C: GpuContext> VertexBinder<C> {
    /// Create a binder driving `context`.
    pub fn new(context: C, config: BinderConfig) -> Self {
        let states = BindingStates::new(&context, &config);
        log::info!("Created vertex binder {:?}", config.label);
        Self {
            context,
            config,
            attributes: AttributeStore::new(),
            registry: GeometryRegistry::new(),
            states,
            frames: FrameCoordinator::new(),
            stats: BinderStats::default(),
        }
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    /// Counter snapshot.
    pub fn stats(&self) -> BinderStats {
        BinderStats {
            geometries: self.registry.len(),
            binding_states: self.states.len(),
            ..self.stats
        }
    }

    pub fn attributes(&self) -> &AttributeStore {
        &self.attributes
    }

    pub fn registry(&self) -> &GeometryRegistry {
        &self.registry
    }

    pub fn binding_states(&self) -> &BindingStates {
        &self.states
    }

    pub fn frames(&self) -> &FrameCoordinator {
        &self.frames
    }

    /// Current frame number.
    pub fn frame(&self) -> u64 {
        self.frames.frame()
    }

    /// Start a new frame. Per-frame work runs again for everything drawn after this.
    pub fn begin_frame(&mut self) -> u64 {
        if self.frames.frame() > 0 {
            frame_mark!();
            profile_plot!("rebinds", self.stats.rebinds);
        }
        self.stats.frames += 1;
        self.frames.begin_frame()
    }

    /// Register `object`'s geometry and run this frame's uploads for it.
    ///
    /// Returns the geometry to draw.
    pub fn register_and_sync(&mut self, object: &dyn Drawable) -> GeometryRef {
        let update: FrameUpdate = self
            .frames
            .update(&mut self.context, &mut self.attributes, &mut self.registry, object);
        let geometry_uploads = match update.geometry {
            Some(summary) => summary.transferred,
            None => {
                self.stats.deduplicated += 1;
                0
            }
        };
        self.stats.uploads += (geometry_uploads + update.instance_uploads) as u64;
        object.geometry().clone()
    }

    /// Make the binding state for this draw current, rebuilding it if stale.
    ///
    /// `index` is the index to draw with; see
    /// [`draw_index`](Self::draw_index) for the usual choice.
    pub fn program_bind(
        &mut self,
        object: &dyn Drawable,
        material: &MaterialState,
        program: &Program,
        geometry: &Geometry,
        index: Option<&Attribute>,
    ) -> Result<BindOutcome, BindingError> {
        let outcome = self.states.setup(
            &mut self.context,
            &mut self.attributes,
            object,
            material,
            program,
            geometry,
            index,
        )?;
        match outcome {
            BindOutcome::Rebound => self.stats.rebinds += 1,
            BindOutcome::Reused => self.stats.reuses += 1,
        }
        Ok(outcome)
    }

    /// Index to draw `geometry` with under `material`.
    ///
    /// Wireframe materials get a derived line-list index; solid ones the
    /// geometry's own index, if any.
    pub fn draw_index(
        &mut self,
        geometry: &Geometry,
        material: &MaterialState,
    ) -> Result<Option<Attribute>, BindingError> {
        if material.wireframe() {
            Ok(self
                .registry
                .wireframe_attribute(&mut self.context, &mut self.attributes, geometry)?)
        } else {
            Ok(geometry.index().cloned())
        }
    }

    /// Sync, bind and describe one draw of `object`.
    pub fn prepare_draw(
        &mut self,
        object: &dyn Drawable,
        material: &MaterialState,
        program: &Program,
    ) -> Result<DrawSetup, BindingError> {
        profile_scope!("prepare_draw");

        let geometry_ref = self.register_and_sync(object);
        let geometry = geometry_ref.read();
        let index = self.draw_index(&geometry, material)?;
        let outcome = self.program_bind(object, material, program, &geometry, index.as_ref())?;

        let mode = if material.wireframe() {
            PrimitiveMode::Lines
        } else {
            PrimitiveMode::Triangles
        };
        let (index_width, total) = match &index {
            Some(index) => (IndexWidth::of_element_type(index.element_type()), index.count()),
            None => (None, geometry.vertex_count()),
        };
        // Line lists carry two indices per triangle index.
        let range_factor = if index.is_some() && material.wireframe() { 2 } else { 1 };
        let range = geometry.draw_range();
        let first = (range.start * range_factor).min(total);
        let count = range
            .count
            .map_or(total - first, |count| (count * range_factor).min(total - first));

        let instance_count = if object.is_instanced() {
            object.instance_count()
        } else {
            geometry.max_instance_count().unwrap_or(1)
        };

        Ok(DrawSetup {
            mode,
            index_width,
            first,
            count,
            instance_count,
            outcome,
        })
    }

    /// Release everything derived from `geometry`. Returns `false` if it was
    /// not registered.
    pub fn dispose_geometry(&mut self, geometry: &Geometry) -> bool {
        let disposed = self
            .registry
            .dispose(&mut self.context, &mut self.attributes, &mut self.states, geometry);
        if disposed {
            self.frames.forget_geometry(geometry.id());
            self.stats.disposed_geometries += 1;
        }
        disposed
    }

    /// Release the instance buffers owned by `object` and its frame stamps.
    ///
    /// A skeleton shared with live objects is simply posed again on its next draw.
    pub fn dispose_object(&mut self, object: &dyn Drawable) {
        for attribute in object.instance_matrix().into_iter().chain(object.instance_color()) {
            self.attributes.remove(&mut self.context, attribute);
        }
        self.frames.forget_object(object.object_id());
        if let Some(skeleton) = object.skeleton() {
            let skeleton = skeleton.lock().skeleton_id();
            self.frames.forget_skeleton(skeleton);
        }
    }

    /// Delete every binding state keyed on `geometry`.
    pub fn release_states_of_geometry(&mut self, geometry: GeometryId) -> usize {
        self.states.release_states_of_geometry(&mut self.context, geometry)
    }

    /// Delete every binding state keyed on `program`.
    pub fn release_states_of_program(&mut self, program: &Program) -> usize {
        self.states.release_states_of_program(&mut self.context, program.id())
    }

    /// Forget assumptions about context state.
    ///
    /// Call after other code touched vertex state behind the binder's back.
    /// The next draw rebuilds its slot state and every geometry is re-checked
    /// for uploads.
    pub fn reset(&mut self) {
        log::debug!("Resetting binder state");
        self.states.reset(&mut self.context);
        self.frames.reset();
    }

    /// Drop every GPU-side record after the context was lost.
    ///
    /// Handles from the lost context are never deleted; the next frame
    /// re-creates and re-uploads everything it draws.
    pub fn context_lost(&mut self) {
        log::warn!("GPU context lost, dropping {} buffers", self.attributes.len());
        self.states.forget();
        self.attributes.clear();
        self.registry.clear();
        self.frames.reset();
    }

    /// Release every GPU object the binder created.
    pub fn dispose(&mut self) {
        log::info!("Disposing vertex binder {:?}", self.config.label);
        self.states.dispose(&mut self.context);
        self.attributes.dispose(&mut self.context);
        self.registry.clear();
        self.frames.reset();
    }
}
