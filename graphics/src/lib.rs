//! # vbind graphics
//!
//! Vertex-resource binding cache: decides, for every draw, which buffers to
//! upload and which vertex attribute slots to rebind.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`VertexBinder`] - Per-frame entry point owning every cache below
//! - [`AttributeStore`] - Version-gated GPU copies of vertex buffers
//! - [`GeometryRegistry`] - Registration, wireframe indices and teardown
//! - [`BindingStates`] - One vertex-array state per (geometry, program, wireframe)
//! - [`FrameCoordinator`] - Once-per-frame geometry, instance and skeleton updates
//! - [`GpuContext`] - Trait for GPU contexts, with a recording [`DummyContext`]
//!
//! ## Example
//!
//! ```ignore
//! use vbind_graphics::{BinderConfig, DummyContext, VertexBinder};
//!
//! let mut binder = VertexBinder::new(DummyContext::new(), BinderConfig::default());
//! binder.begin_frame();
//! let setup = binder.prepare_draw(&object, &material, &program)?;
//! ```

pub mod attributes;
pub mod backend;
pub mod binder;
pub mod binding;
pub mod config;
pub mod error;
pub mod frame;
pub mod material;
pub mod object;
pub mod program;
pub mod registry;
pub mod stats;

// Re-export main types for convenience
pub use attributes::{AttributeStore, GpuBufferRecord, UploadOutcome};
pub use backend::dummy::{DummyContext, GpuCommand};
pub use backend::{
    AttributePointer, BackendError, BufferTarget, ConstantValue, ContextFeatures, GpuBufferHandle, GpuContext,
    VertexArrayHandle,
};
pub use binder::{DrawSetup, PrimitiveMode, VertexBinder};
pub use binding::{BindOutcome, BindingState, BindingStates, StateKey};
pub use config::BinderConfig;
pub use error::BindingError;
pub use frame::{FrameCoordinator, FrameUpdate};
pub use material::MaterialState;
pub use object::{DrawObject, Drawable, INSTANCE_COLOR, INSTANCE_MATRIX, ObjectId, Skeleton, SkeletonId, SkeletonRef};
pub use program::{Program, ProgramId, ProgramInput};
pub use registry::{GeometryRegistry, UploadSummary};
pub use stats::BinderStats;

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
