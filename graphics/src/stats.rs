//! Binder counters.

/// Counters kept by a [`VertexBinder`](crate::VertexBinder).
///
/// `geometries` and `binding_states` are sampled when the snapshot is taken;
/// the rest accumulate over the binder's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinderStats {
    /// Frames begun.
    pub frames: u64,
    /// Registered geometries.
    pub geometries: usize,
    /// Live vertex-array binding states.
    pub binding_states: usize,
    /// Draws whose slot state was rebuilt.
    pub rebinds: u64,
    /// Draws that reused a current state.
    pub reuses: u64,
    /// Buffers sent to the GPU (created or re-uploaded).
    pub uploads: u64,
    /// Geometry visits skipped because the geometry was already synced this frame.
    pub deduplicated: u64,
    /// Geometries disposed.
    pub disposed_geometries: u64,
}

impl BinderStats {
    /// Fraction of draws served without a rebuild.
    pub fn reuse_ratio(&self) -> f64 {
        let total = self.rebinds + self.reuses;
        if total == 0 {
            return 0.0;
        }
        self.reuses as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reuse_ratio() {
        assert_eq!(BinderStats::default().reuse_ratio(), 0.0);
        let stats = BinderStats {
            rebinds: 1,
            reuses: 3,
            ..Default::default()
        };
        assert_eq!(stats.reuse_ratio(), 0.75);
    }
}
