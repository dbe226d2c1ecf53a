//! Process-unique identities for buffers, attributes and geometries.
//!
//! Caches in the binding layer key everything by these ids instead of by
//! object address. Ids come from a global monotonically increasing counter
//! and are never reused, so a freshly created resource can never collide
//! with cache entries left behind by a disposed one.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate the next unused id value.
pub fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Declare a `Copy` id newtype backed by the global counter.
#[macro_export]
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u64);

        impl $name {
            /// Allocate a new, never-before-seen id.
            pub fn new() -> Self {
                Self($crate::id::next_id())
            }

            /// Raw id value.
            pub fn raw(self) -> u64 {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

define_id!(
    /// Identity of a [`VertexBuffer`](crate::VertexBuffer).
    BufferId
);
define_id!(
    /// Identity of an [`Attribute`](crate::Attribute).
    AttributeId
);
define_id!(
    /// Identity of a [`Geometry`](crate::Geometry).
    GeometryId
);
