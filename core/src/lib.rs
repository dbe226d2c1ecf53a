//! # vbind core
//!
//! CPU-side vertex data for the vbind binding layer.
//!
//! ## Overview
//!
//! - [`VertexBuffer`] / [`BufferRef`] - Flat, strided, versioned element storage
//! - [`Attribute`] - A view over a buffer: plain, interleaved, instanced or both
//! - [`Geometry`] - Named attributes plus optional index and indirect data
//! - [`wireframe`] - Line-list derivation from triangle indices
//!
//! Nothing in this crate talks to a GPU. `vbind-graphics` reads these types to
//! decide what to upload and what to rebind.

pub mod attribute;
pub mod buffer;
pub mod error;
pub mod geometry;
pub mod id;
pub mod index;
pub mod profiling;
pub mod wireframe;

pub use attribute::{Attribute, AttributeKind, GpuType, MAX_ITEM_SIZE};
pub use buffer::{BufferData, BufferRef, ElementType, UpdateRange, UsageHint, VertexBuffer};
pub use error::CoreError;
pub use geometry::{DrawRange, Geometry, GeometryRef};
pub use id::{AttributeId, BufferId, GeometryId};
pub use index::{IndexWidth, MAX_U16_INDEX};
pub use wireframe::{WireframeSource, sequential_wireframe_indices, wireframe_indices};

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
