//! Binding-state cache.
//!
//! Each `(geometry, program, wireframe)` triple owns one vertex-array object
//! capturing its slot configuration. A draw that finds its state current
//! binds the object and nothing else; only a changed attribute, buffer,
//! index or input set triggers the full enable/divisor/pointer sequence.
//!
//! Contexts without vertex-array objects share a single default state keyed
//! on the last triple drawn, so every switch rebuilds slot state. The default
//! state still runs the attribute comparison, since a swapped attribute under
//! an unchanged triple leaves the global slot state stale.

mod layout;
mod state;

use std::collections::HashMap;

use vbind_core::profiling::profile_scope;
use vbind_core::{Attribute, Geometry, GeometryId};

pub use layout::{SlotLayout, slot_layouts};
pub use state::BindingState;

use crate::attributes::AttributeStore;
use crate::backend::{BufferTarget, ContextFeatures, GpuContext};
use crate::config::BinderConfig;
use crate::error::BindingError;
use crate::material::MaterialState;
use crate::object::Drawable;
use crate::program::{Program, ProgramId};

/// Cache key of one binding state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateKey {
    pub geometry: GeometryId,
    pub program: ProgramId,
    pub wireframe: bool,
}

/// Result of [`BindingStates::setup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindOutcome {
    /// Slot state was rebuilt.
    Rebound,
    /// The cached state was current.
    Reused,
}

#[derive(Debug, Default)]
struct ProgramStates {
    solid: Option<BindingState>,
    wireframe: Option<BindingState>,
}

impl ProgramStates {
    fn slot_mut(&mut self, wireframe: bool) -> &mut Option<BindingState> {
        if wireframe { &mut self.wireframe } else { &mut self.solid }
    }

    fn into_states(self) -> impl Iterator<Item = BindingState> {
        self.solid.into_iter().chain(self.wireframe)
    }

    fn len(&self) -> usize {
        self.solid.is_some() as usize + self.wireframe.is_some() as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Current {
    Default,
    Keyed(StateKey),
}

/// All binding states of one context.
#[derive(Debug)]
pub struct BindingStates {
    vertex_arrays: bool,
    features: ContextFeatures,
    max_slots: u32,
    states: HashMap<GeometryId, HashMap<ProgramId, ProgramStates>>,
    default_state: BindingState,
    current: Current,
    force_update: bool,
}

impl BindingStates {
    /// Create the cache for `ctx`, honoring the limits in `config`.
    pub fn new(ctx: &dyn GpuContext, config: &BinderConfig) -> Self {
        let vertex_arrays = config.uses_vertex_arrays(ctx);
        let max_slots = config.effective_max_vertex_attributes(ctx);
        log::info!(
            "Binding cache on '{}': vertex arrays {}, {} slots",
            ctx.name(),
            if vertex_arrays { "on" } else { "off" },
            max_slots
        );
        Self {
            vertex_arrays,
            features: ctx.features(),
            max_slots,
            states: HashMap::new(),
            default_state: BindingState::new(None, max_slots as usize),
            current: Current::Default,
            force_update: false,
        }
    }

    /// Whether states are captured in vertex-array objects.
    pub fn uses_vertex_arrays(&self) -> bool {
        self.vertex_arrays
    }

    /// Number of hardware slots in use.
    pub fn max_slots(&self) -> u32 {
        self.max_slots
    }

    /// Number of cached vertex-array states.
    pub fn len(&self) -> usize {
        self.states
            .values()
            .flat_map(|programs| programs.values())
            .map(ProgramStates::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached state for `key`, if any.
    pub fn get(&self, key: &StateKey) -> Option<&BindingState> {
        let states = self.states.get(&key.geometry)?.get(&key.program)?;
        if key.wireframe { states.wireframe.as_ref() } else { states.solid.as_ref() }
    }

    /// The state shared by all draws when vertex arrays are off.
    pub fn default_state(&self) -> &BindingState {
        &self.default_state
    }

    /// Make the state for this draw current and rebuild it if stale.
    ///
    /// `index` is the index attribute actually drawn with: the geometry's
    /// own, a derived wireframe index, or none.
    #[allow(clippy::too_many_arguments)]
    pub fn setup(
        &mut self,
        ctx: &mut dyn GpuContext,
        store: &mut AttributeStore,
        object: &dyn Drawable,
        material: &MaterialState,
        program: &Program,
        geometry: &Geometry,
        index: Option<&Attribute>,
    ) -> Result<BindOutcome, BindingError> {
        profile_scope!("binding_setup");
        program.check_slots(self.max_slots)?;

        let key = StateKey {
            geometry: geometry.id(),
            program: program.id(),
            wireframe: material.wireframe(),
        };
        let max_slots = self.max_slots as usize;
        let (state, update) = if self.vertex_arrays {
            let state = self
                .states
                .entry(key.geometry)
                .or_default()
                .entry(key.program)
                .or_default()
                .slot_mut(key.wireframe)
                .get_or_insert_with(|| {
                    let vertex_array = ctx.create_vertex_array();
                    log::debug!("New binding state {vertex_array:?} for {key:?}");
                    BindingState::new(Some(vertex_array), max_slots)
                });
            if self.current != Current::Keyed(key) {
                self.current = Current::Keyed(key);
                ctx.bind_vertex_array(state.vertex_array());
            }
            // The index binding lands in whichever vertex array is bound.
            if let Some(index) = index {
                store.update(ctx, index, BufferTarget::Index);
            }
            let update = state.needs_update(store, object, geometry, program, index);
            if update {
                state.save_cache(store, object, geometry, program, index);
            }
            (state, update)
        } else {
            if let Some(index) = index {
                store.update(ctx, index, BufferTarget::Index);
            }
            let state = &mut self.default_state;
            let rekeyed = state.rekey(key);
            let update = rekeyed || state.needs_update(store, object, geometry, program, index);
            if update {
                state.save_cache(store, object, geometry, program, index);
            }
            (state, update)
        };

        if !update && !self.force_update {
            return Ok(BindOutcome::Reused);
        }
        self.force_update = false;

        log::trace!("Rebinding {key:?}");
        state.bind_attributes(ctx, store, self.features, object, material, program, geometry);
        if let Some(record) = index.and_then(|index| store.get(index)) {
            ctx.bind_buffer(BufferTarget::Index, Some(record.handle));
        }
        Ok(BindOutcome::Rebound)
    }

    /// Delete every state keyed on `geometry`. Returns how many were released.
    pub fn release_states_of_geometry(&mut self, ctx: &mut dyn GpuContext, geometry: GeometryId) -> usize {
        let Some(programs) = self.states.remove(&geometry) else {
            self.forget_current(|key| key.geometry == geometry);
            return 0;
        };
        let mut released = 0;
        for state in programs.into_values().flat_map(ProgramStates::into_states) {
            delete_state(ctx, state);
            released += 1;
        }
        self.forget_current(|key| key.geometry == geometry);
        log::debug!("Released {released} binding states of geometry {geometry}");
        released
    }

    /// Delete every state keyed on `program`. Returns how many were released.
    pub fn release_states_of_program(&mut self, ctx: &mut dyn GpuContext, program: ProgramId) -> usize {
        let mut released = 0;
        for programs in self.states.values_mut() {
            if let Some(states) = programs.remove(&program) {
                for state in states.into_states() {
                    delete_state(ctx, state);
                    released += 1;
                }
            }
        }
        self.states.retain(|_, programs| !programs.is_empty());
        self.forget_current(|key| key.program == program);
        log::debug!("Released {released} binding states of program {program}");
        released
    }

    /// Return to the default state and force the next setup to rebuild.
    pub fn reset(&mut self, ctx: &mut dyn GpuContext) {
        self.default_state.clear_key();
        self.force_update = true;
        if self.current == Current::Default {
            return;
        }
        self.current = Current::Default;
        ctx.bind_vertex_array(None);
    }

    /// Reset, then delete every vertex-array object.
    pub fn dispose(&mut self, ctx: &mut dyn GpuContext) {
        self.reset(ctx);
        let states = std::mem::take(&mut self.states);
        let mut released = 0;
        for state in states
            .into_values()
            .flat_map(HashMap::into_values)
            .flat_map(ProgramStates::into_states)
        {
            delete_state(ctx, state);
            released += 1;
        }
        log::debug!("Disposed {released} binding states");
    }

    /// Drop every state without touching the GPU, for a lost context.
    pub fn forget(&mut self) {
        self.states.clear();
        self.default_state = BindingState::new(None, self.max_slots as usize);
        self.current = Current::Default;
        self.force_update = true;
    }

    fn forget_current(&mut self, released: impl Fn(&StateKey) -> bool) {
        if let Current::Keyed(key) = self.current {
            if released(&key) {
                self.current = Current::Default;
            }
        }
        if self.default_state.key().is_some_and(|key| released(&key)) {
            self.default_state.clear_key();
        }
    }
}

fn delete_state(ctx: &mut dyn GpuContext, state: BindingState) {
    if let Some(vertex_array) = state.vertex_array() {
        ctx.delete_vertex_array(vertex_array);
    }
}
