//! Derivation of line-list indices for wireframe rendering.
//!
//! Every triangle `(a, b, c)` becomes the three edges `a-b`, `b-c`, `c-a`.
//! Shared edges are emitted once per triangle that uses them.

use crate::attribute::Attribute;
use crate::error::CoreError;
use crate::geometry::Geometry;

/// Expand a triangle list into a line list.
///
/// Trailing indices that do not complete a triangle are ignored.
pub fn wireframe_indices(triangles: &[u32]) -> Vec<u32> {
    let mut lines = Vec::with_capacity(triangles.len() * 2);
    for tri in triangles.chunks_exact(3) {
        let (a, b, c) = (tri[0], tri[1], tri[2]);
        lines.extend_from_slice(&[a, b, b, c, c, a]);
    }
    lines
}

/// Line list for an unindexed triangle list of `vertex_count` vertices.
pub fn sequential_wireframe_indices(vertex_count: usize) -> Vec<u32> {
    let triangles = vertex_count / 3;
    let mut lines = Vec::with_capacity(triangles * 6);
    for tri in 0..triangles as u32 {
        let a = tri * 3;
        lines.extend_from_slice(&[a, a + 1, a + 1, a + 2, a + 2, a]);
    }
    lines
}

/// Where the wireframe of a geometry is derived from.
#[derive(Debug, Clone)]
pub enum WireframeSource<'a> {
    /// The geometry's triangle index.
    Index(&'a Attribute),
    /// Sequential vertex order of the position attribute.
    Positions(&'a Attribute),
}

impl WireframeSource<'_> {
    /// Pick the source attribute for `geometry`.
    ///
    /// Returns `None` for a geometry with neither an index nor positions.
    pub fn of(geometry: &Geometry) -> Option<WireframeSource<'_>> {
        if let Some(index) = geometry.index() {
            return Some(WireframeSource::Index(index));
        }
        geometry.attribute("position").map(WireframeSource::Positions)
    }

    /// The attribute the wireframe is derived from.
    pub fn attribute(&self) -> &Attribute {
        match self {
            Self::Index(attr) | Self::Positions(attr) => *attr,
        }
    }

    /// Version of the source attribute.
    pub fn version(&self) -> u64 {
        self.attribute().version()
    }

    /// Build the line-list index attribute.
    pub fn build(&self) -> Result<Attribute, CoreError> {
        let lines = match self {
            Self::Index(index) => wireframe_indices(&index.index_values()?),
            Self::Positions(position) => sequential_wireframe_indices(position.count()),
        };
        Attribute::index(&lines)
    }
}
