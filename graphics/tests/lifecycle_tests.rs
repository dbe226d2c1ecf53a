//! Registration, per-frame coordination and teardown tests.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::*;
use parking_lot::Mutex;
use rstest::rstest;
use vbind_graphics::{
    BindOutcome, DrawObject, Drawable, GpuCommand, MaterialState, Skeleton, SkeletonId, SkeletonRef, StateKey,
};

struct CountingSkeleton {
    id: SkeletonId,
    poses: Arc<AtomicUsize>,
}

impl Skeleton for CountingSkeleton {
    fn skeleton_id(&self) -> SkeletonId {
        self.id
    }

    fn update_pose(&mut self) {
        self.poses.fetch_add(1, Ordering::Relaxed);
    }
}

fn counting_skeleton() -> (SkeletonRef, Arc<AtomicUsize>) {
    let poses = Arc::new(AtomicUsize::new(0));
    let skeleton: SkeletonRef = Arc::new(Mutex::new(CountingSkeleton {
        id: SkeletonId::new(),
        poses: poses.clone(),
    }));
    (skeleton, poses)
}

fn deletes(binder: &vbind_graphics::VertexBinder<vbind_graphics::DummyContext>) -> usize {
    count(binder, |c| matches!(c, GpuCommand::DeleteBuffer(_)))
}

// ============================================================================
// Registration
// ============================================================================

#[rstest]
#[case::vertex_arrays(ContextKind::VertexArrays)]
#[case::legacy(ContextKind::Legacy)]
fn test_registration_is_idempotent(#[case] kind: ContextKind) {
    let mut binder = binder(kind);
    let object = DrawObject::new(triangle().into_shared());

    for _ in 0..3 {
        binder.begin_frame();
        binder.register_and_sync(&object);
    }
    assert_eq!(binder.stats().geometries, 1);
    assert_eq!(binder.context().live_buffers(), 2);

    let geometry = object.geometry().clone();
    assert!(binder.dispose_geometry(&geometry.read()));
    assert_eq!(deletes(&binder), 2);

    assert!(!binder.dispose_geometry(&geometry.read()));
    assert_eq!(deletes(&binder), 2);
    assert_eq!(binder.stats().disposed_geometries, 1);
}

#[test]
fn test_shared_geometry_synced_once_per_frame() {
    let mut binder = binder(ContextKind::VertexArrays);
    let geometry = triangle().into_shared();
    let objects: Vec<DrawObject> = (0..4).map(|_| DrawObject::new(geometry.clone())).collect();

    binder.begin_frame();
    for object in &objects {
        let synced = binder.register_and_sync(object);
        assert!(Arc::ptr_eq(&synced, &geometry));
    }

    let stats = binder.stats();
    assert_eq!(stats.deduplicated, 3);
    assert_eq!(stats.uploads, 2);
}

// ============================================================================
// Disposal
// ============================================================================

#[rstest]
#[case::vertex_arrays(ContextKind::VertexArrays)]
#[case::legacy(ContextKind::Legacy)]
fn test_dispose_cascades(#[case] kind: ContextKind) {
    let mut binder = binder(kind);
    let object = DrawObject::new(indexed_quad().into_shared());
    let program = basic_program();

    binder.begin_frame();
    binder.prepare_draw(&object, &MaterialState::new(), &program).unwrap();
    binder
        .prepare_draw(&object, &MaterialState::new().with_wireframe(true), &program)
        .unwrap();

    let geometry = object.geometry().clone();
    assert!(binder.dispose_geometry(&geometry.read()));

    let stats = binder.stats();
    assert_eq!(stats.binding_states, 0);
    assert_eq!(stats.geometries, 0);
    assert!(binder.attributes().is_empty());
    assert_eq!(binder.context().live_buffers(), 0);
    assert_eq!(binder.context().live_vertex_arrays(), 0);

    let replacement = DrawObject::new(triangle().into_shared());
    let setup = binder.prepare_draw(&replacement, &MaterialState::new(), &program).unwrap();
    assert_eq!(setup.outcome, BindOutcome::Rebound);
}

#[test]
fn test_disposed_geometry_registers_again() {
    let mut binder = binder(ContextKind::VertexArrays);
    let object = DrawObject::new(triangle().into_shared());
    let program = basic_program();

    binder.begin_frame();
    binder.prepare_draw(&object, &MaterialState::new(), &program).unwrap();
    binder.dispose_geometry(&object.geometry().read());

    let setup = binder.prepare_draw(&object, &MaterialState::new(), &program).unwrap();
    assert_eq!(setup.outcome, BindOutcome::Rebound);
    assert_eq!(binder.stats().geometries, 1);
    assert_eq!(binder.context().live_buffers(), 2);
}

#[test]
fn test_shared_interleaved_buffer_survives_dispose() {
    let mut binder = binder(ContextKind::VertexArrays);
    let (first, shared) = interleaved_triangle();
    let second = vbind_core::Geometry::new()
        .with_attribute("position", vbind_core::Attribute::interleaved(&shared, 3, 0).unwrap());
    let first = DrawObject::new(first.into_shared());
    let second = DrawObject::new(second.into_shared());

    binder.begin_frame();
    binder.register_and_sync(&first);
    binder.register_and_sync(&second);
    assert_eq!(binder.context().live_buffers(), 1);

    binder.dispose_geometry(&first.geometry().read());
    assert_eq!(binder.context().live_buffers(), 1);
}

#[test]
fn test_release_states_of_program() {
    let mut binder = binder(ContextKind::VertexArrays);
    let object = DrawObject::new(triangle().into_shared());
    let basic = basic_program();
    let positions = vbind_graphics::Program::new(vec![vbind_graphics::ProgramInput::new("position", 0)]).unwrap();
    let material = MaterialState::new();

    binder.begin_frame();
    binder.prepare_draw(&object, &material, &basic).unwrap();
    binder.prepare_draw(&object, &material, &positions).unwrap();
    assert_eq!(binder.stats().binding_states, 2);

    assert_eq!(binder.release_states_of_program(&basic), 1);
    assert_eq!(binder.stats().binding_states, 1);
    assert_eq!(binder.context().live_vertex_arrays(), 1);
    let key = StateKey {
        geometry: object.geometry().read().id(),
        program: positions.id(),
        wireframe: false,
    };
    assert!(binder.binding_states().get(&key).is_some());

    let setup = binder.prepare_draw(&object, &material, &basic).unwrap();
    assert_eq!(setup.outcome, BindOutcome::Rebound);
    // Buffers are untouched by state release.
    assert_eq!(deletes(&binder), 0);
}

#[rstest]
#[case::vertex_arrays(ContextKind::VertexArrays)]
#[case::legacy(ContextKind::Legacy)]
fn test_release_states_of_geometry(#[case] kind: ContextKind) {
    let mut binder = binder(kind);
    let object = DrawObject::new(triangle().into_shared());
    let program = basic_program();
    let material = MaterialState::new();

    binder.begin_frame();
    binder.prepare_draw(&object, &material, &program).unwrap();
    let geometry_id = object.geometry().read().id();
    binder.release_states_of_geometry(geometry_id);
    assert_eq!(binder.stats().binding_states, 0);

    let setup = binder.prepare_draw(&object, &material, &program).unwrap();
    assert_eq!(setup.outcome, BindOutcome::Rebound);
}

#[rstest]
#[case::vertex_arrays(ContextKind::VertexArrays)]
#[case::legacy(ContextKind::Legacy)]
fn test_binder_dispose_releases_everything(#[case] kind: ContextKind) {
    let mut binder = binder(kind);
    let plain = DrawObject::new(indexed_quad().into_shared());
    let instanced = DrawObject::instanced(triangle().into_shared(), 4).unwrap();

    binder.begin_frame();
    binder.prepare_draw(&plain, &MaterialState::new(), &basic_program()).unwrap();
    binder
        .prepare_draw(&instanced, &MaterialState::new().with_wireframe(true), &instanced_program())
        .unwrap();
    assert!(binder.context().live_buffers() > 0);

    binder.dispose();
    assert_eq!(binder.context().live_buffers(), 0);
    assert_eq!(binder.context().live_vertex_arrays(), 0);
    assert_eq!(binder.stats().binding_states, 0);
}

// ============================================================================
// Instances and Skeletons
// ============================================================================

#[test]
fn test_instance_buffers_per_object() {
    let mut binder = binder(ContextKind::VertexArrays);
    let geometry = triangle().into_shared();
    let mut first = DrawObject::instanced(geometry.clone(), 2).unwrap();
    let second = DrawObject::instanced(geometry, 5).unwrap();
    let program = instanced_program();
    let material = MaterialState::new();

    binder.begin_frame();
    let a = binder.prepare_draw(&first, &material, &program).unwrap();
    let b = binder.prepare_draw(&second, &material, &program).unwrap();
    assert_eq!((a.instance_count, b.instance_count), (2, 5));
    // Two geometry buffers and one matrix buffer per object.
    assert_eq!(binder.context().live_buffers(), 4);
    assert_eq!(b.outcome, BindOutcome::Rebound);

    first
        .instance_matrix_mut()
        .unwrap()
        .buffer()
        .write()
        .write(12, vec![1.0f32, 2.0, 3.0])
        .unwrap();
    binder.begin_frame();
    binder.prepare_draw(&first, &material, &program).unwrap();
    binder.prepare_draw(&first, &material, &program).unwrap();
    assert_eq!(uploads(&binder), 1);

    binder.dispose_object(&first);
    assert_eq!(binder.context().live_buffers(), 3);
}

#[test]
fn test_skeleton_updates_once_per_frame() {
    let mut binder = binder(ContextKind::VertexArrays);
    let (skeleton, poses) = counting_skeleton();
    let geometry = triangle().into_shared();
    let body = DrawObject::new(geometry.clone()).with_skeleton(skeleton.clone());
    let shadow = DrawObject::new(geometry).with_skeleton(skeleton);

    for frame in 1..=3 {
        binder.begin_frame();
        binder.register_and_sync(&body);
        binder.register_and_sync(&shadow);
        binder.register_and_sync(&body);
        assert_eq!(poses.load(Ordering::Relaxed), frame);
    }
    assert_eq!(binder.frame(), 3);
}

#[test]
fn test_dispose_object_forgets_skeleton() {
    let mut binder = binder(ContextKind::VertexArrays);
    let (skeleton, poses) = counting_skeleton();
    let geometry = triangle().into_shared();
    let body = DrawObject::new(geometry.clone()).with_skeleton(skeleton);

    binder.begin_frame();
    binder.register_and_sync(&body);
    assert_eq!(binder.frames().len(), 2);

    binder.dispose_object(&body);
    assert_eq!(binder.frames().len(), 1);

    binder.dispose_geometry(&geometry.read());
    assert!(binder.frames().is_empty());
    assert_eq!(poses.load(Ordering::Relaxed), 1);
}

// ============================================================================
// Context Loss
// ============================================================================

#[rstest]
#[case::vertex_arrays(ContextKind::VertexArrays)]
#[case::legacy(ContextKind::Legacy)]
fn test_recovers_after_context_loss(#[case] kind: ContextKind) {
    let mut binder = binder(kind);
    let object = DrawObject::new(triangle().into_shared());
    let program = basic_program();
    let material = MaterialState::new();

    binder.begin_frame();
    binder.prepare_draw(&object, &material, &program).unwrap();

    binder.context_mut().set_lost(true);
    binder.context_lost();
    assert!(binder.attributes().is_empty());

    binder.context_mut().clear_commands();
    binder.begin_frame();
    let lost = binder.prepare_draw(&object, &material, &program).unwrap();
    assert_eq!(lost.outcome, BindOutcome::Rebound);
    assert_eq!(pointer_calls(&binder), 0);

    binder.context_mut().set_lost(false);
    binder.begin_frame();
    let restored = binder.prepare_draw(&object, &material, &program).unwrap();
    assert_eq!(restored.outcome, BindOutcome::Rebound);
    assert_eq!(pointer_calls(&binder), 2);
    assert_eq!(binder.context().live_buffers(), 2);
    assert_eq!(deletes(&binder), 0);
}

#[test]
fn test_frame_counter() {
    let mut binder = binder(ContextKind::Legacy);
    assert_eq!(binder.frame(), 0);
    assert_eq!(binder.begin_frame(), 1);
    assert_eq!(binder.begin_frame(), 2);
    assert_eq!(binder.stats().frames, 2);
    assert!(!binder.binding_states().uses_vertex_arrays());
    assert_eq!(binder.config().label.as_deref(), Some("Legacy"));
}

#[test]
fn test_drawable_trait_defaults() {
    struct Bare(vbind_core::GeometryRef, vbind_graphics::ObjectId);

    impl Drawable for Bare {
        fn object_id(&self) -> vbind_graphics::ObjectId {
            self.1
        }

        fn geometry(&self) -> &vbind_core::GeometryRef {
            &self.0
        }
    }

    let mut binder = binder(ContextKind::VertexArrays);
    let bare = Bare(triangle().into_shared(), vbind_graphics::ObjectId::new());
    binder.begin_frame();
    let setup = binder.prepare_draw(&bare, &MaterialState::new(), &basic_program()).unwrap();
    assert_eq!(setup.instance_count, 1);
    assert_eq!(setup.count, 3);
}
