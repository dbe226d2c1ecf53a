//! Common utilities for binding integration tests.
//!
//! Tests are parameterized over the two context flavours the binder supports:
//! one with vertex-array objects and a legacy one without.

use vbind_core::{Attribute, BufferRef, Geometry};
use vbind_graphics::{
    BinderConfig, ContextFeatures, DummyContext, GpuCommand, Program, ProgramInput, VertexBinder,
};

/// Initialize logging once per test binary.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Context Enumeration
// ============================================================================

/// Context flavours to run binding tests against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKind {
    /// Binding states captured in vertex-array objects.
    VertexArrays,
    /// A single shared binding state.
    Legacy,
}

impl ContextKind {
    /// Create a dummy context of this flavour.
    pub fn context(&self) -> DummyContext {
        match self {
            ContextKind::VertexArrays => DummyContext::new(),
            ContextKind::Legacy => DummyContext::new()
                .with_features(ContextFeatures::INSTANCED_ARRAYS | ContextFeatures::INTEGER_ATTRIBUTES),
        }
    }
}

/// Create a binder over a fresh dummy context.
pub fn binder(kind: ContextKind) -> VertexBinder<DummyContext> {
    init_logging();
    VertexBinder::new(kind.context(), BinderConfig::new().with_label(format!("{kind:?}")))
}

/// Number of recorded commands matching `predicate`.
pub fn count(binder: &VertexBinder<DummyContext>, predicate: impl Fn(&GpuCommand) -> bool) -> usize {
    binder.context().count_commands(predicate)
}

/// Number of partial or whole buffer uploads recorded.
pub fn uploads(binder: &VertexBinder<DummyContext>) -> usize {
    count(binder, |c| matches!(c, GpuCommand::UploadBufferRange { .. }))
}

/// Number of attribute pointer calls recorded, float and integer.
#[allow(dead_code)]
pub fn pointer_calls(binder: &VertexBinder<DummyContext>) -> usize {
    count(binder, |c| {
        matches!(
            c,
            GpuCommand::AttributePointer { .. } | GpuCommand::AttributeIntegerPointer { .. }
        )
    })
}

// ============================================================================
// Geometry Fixtures
// ============================================================================

/// Unindexed single triangle with positions and normals.
pub fn triangle() -> Geometry {
    Geometry::new()
        .with_label("triangle")
        .with_attribute("position", Attribute::new(vec![0.0f32; 9], 3).unwrap())
        .with_attribute("normal", Attribute::new(vec![0.0f32; 9], 3).unwrap())
}

/// Indexed quad with positions and uvs.
#[allow(dead_code)]
pub fn indexed_quad() -> Geometry {
    let mut geometry = Geometry::new()
        .with_label("quad")
        .with_attribute("position", Attribute::new(vec![0.0f32; 12], 3).unwrap())
        .with_attribute("uv", Attribute::new(vec![0.0f32; 8], 2).unwrap());
    geometry
        .set_index(Some(Attribute::index(&[0, 1, 2, 0, 2, 3]).unwrap()))
        .unwrap();
    geometry
}

/// Triangle whose attributes share one interleaved buffer.
///
/// Record layout: `[px, py, pz, nx, ny, nz, u, v]`.
#[allow(dead_code)]
pub fn interleaved_triangle() -> (Geometry, BufferRef) {
    let shared = BufferRef::from_data(vec![0.0f32; 24], 8).unwrap();
    let geometry = Geometry::new()
        .with_label("interleaved")
        .with_attribute("position", Attribute::interleaved(&shared, 3, 0).unwrap())
        .with_attribute("normal", Attribute::interleaved(&shared, 3, 3).unwrap())
        .with_attribute("uv", Attribute::interleaved(&shared, 2, 6).unwrap());
    (geometry, shared)
}

// ============================================================================
// Program Fixtures
// ============================================================================

/// Program reading position (slot 0) and normal (slot 1).
pub fn basic_program() -> Program {
    Program::new(vec![ProgramInput::new("position", 0), ProgramInput::new("normal", 1)])
        .unwrap()
        .with_label("basic")
}

/// Program with a per-instance matrix spanning slots 1 to 4 and a color at 5.
#[allow(dead_code)]
pub fn instanced_program() -> Program {
    Program::new(vec![
        ProgramInput::new("position", 0),
        ProgramInput::new("instanceMatrix", 1).with_location_size(4),
        ProgramInput::new("instanceColor", 5),
    ])
    .unwrap()
    .with_label("instanced")
}
