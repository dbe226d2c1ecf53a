use criterion::{Criterion, black_box, criterion_group, criterion_main};

use vbind_core::{Attribute, Geometry};
use vbind_graphics::{
    BinderConfig, DrawObject, Drawable, DummyContext, MaterialState, Program, ProgramInput, VertexBinder,
};

fn mesh(vertices: usize) -> Geometry {
    let indices: Vec<u32> = (0..vertices as u32).collect();
    let mut geometry = Geometry::new()
        .with_attribute("position", Attribute::new(vec![0.0f32; vertices * 3], 3).unwrap())
        .with_attribute("normal", Attribute::new(vec![0.0f32; vertices * 3], 3).unwrap())
        .with_attribute("uv", Attribute::new(vec![0.0f32; vertices * 2], 2).unwrap());
    geometry.set_index(Some(Attribute::index(&indices).unwrap())).unwrap();
    geometry
}

fn program() -> Program {
    Program::new(vec![
        ProgramInput::new("position", 0),
        ProgramInput::new("normal", 1),
        ProgramInput::new("uv", 2),
    ])
    .unwrap()
}

fn binder(vertex_arrays: bool) -> VertexBinder<DummyContext> {
    VertexBinder::new(
        DummyContext::new(),
        BinderConfig::new().with_vertex_arrays(vertex_arrays),
    )
}

// ---------------------------------------------------------------------------
// Steady-state draws
// ---------------------------------------------------------------------------

fn bench_cached_draws(c: &mut Criterion) {
    let objects: Vec<DrawObject> = (0..64).map(|_| DrawObject::new(mesh(300).into_shared())).collect();
    let program = program();
    let material = MaterialState::new();

    for (name, vertex_arrays) in [("vertex_arrays", true), ("legacy", false)] {
        let mut binder = binder(vertex_arrays);
        binder.begin_frame();
        for object in &objects {
            binder.prepare_draw(object, &material, &program).unwrap();
        }

        c.bench_function(&format!("prepare_draw_64_objects_{name}"), |b| {
            b.iter(|| {
                binder.begin_frame();
                for object in &objects {
                    black_box(binder.prepare_draw(object, &material, &program).unwrap());
                }
                binder.context_mut().clear_commands();
            });
        });
    }
}

fn bench_shared_geometry(c: &mut Criterion) {
    let geometry = mesh(300).into_shared();
    let objects: Vec<DrawObject> = (0..256).map(|_| DrawObject::new(geometry.clone())).collect();
    let program = program();
    let material = MaterialState::new();
    let mut binder = binder(true);

    c.bench_function("prepare_draw_256_shared_geometry", |b| {
        b.iter(|| {
            binder.begin_frame();
            for object in &objects {
                black_box(binder.prepare_draw(object, &material, &program).unwrap());
            }
            binder.context_mut().clear_commands();
        });
    });
}

// ---------------------------------------------------------------------------
// Uploads and rebuilds
// ---------------------------------------------------------------------------

fn bench_dynamic_upload(c: &mut Criterion) {
    let object = DrawObject::new(mesh(3000).into_shared());
    let program = program();
    let material = MaterialState::new();
    let mut binder = binder(true);
    let position = object.geometry().read().attribute("position").cloned().unwrap();

    c.bench_function("partial_upload_3000_vertices", |b| {
        b.iter(|| {
            position.buffer().write().write(300, vec![1.0f32; 300]).unwrap();
            binder.begin_frame();
            black_box(binder.prepare_draw(&object, &material, &program).unwrap());
            binder.context_mut().clear_commands();
        });
    });
}

fn bench_wireframe_build(c: &mut Criterion) {
    let material = MaterialState::new().with_wireframe(true);
    let program = program();

    c.bench_function("wireframe_build_30000_indices", |b| {
        b.iter_with_setup(
            || (binder(true), DrawObject::new(mesh(30000).into_shared())),
            |(mut binder, object)| {
                binder.begin_frame();
                black_box(binder.prepare_draw(&object, &material, &program).unwrap());
            },
        );
    });
}

criterion_group!(
    benches,
    bench_cached_draws,
    bench_shared_geometry,
    bench_dynamic_upload,
    bench_wireframe_build
);
criterion_main!(benches);
