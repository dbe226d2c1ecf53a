//! Binder configuration.

use crate::backend::{ContextFeatures, GpuContext};

/// Settings for a [`VertexBinder`](crate::VertexBinder).
///
/// Every limit is an upper bound: the context's own capabilities always win.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinderConfig {
    /// Debug label.
    pub label: Option<String>,
    /// Capture slot state in vertex-array objects when the context has them.
    pub vertex_arrays: bool,
    /// Cap on hardware attribute slots; `None` uses the context limit.
    pub max_vertex_attributes: Option<u32>,
}

impl BinderConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self {
            label: None,
            vertex_arrays: true,
            max_vertex_attributes: None,
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Enable or disable vertex-array objects.
    pub fn with_vertex_arrays(mut self, enabled: bool) -> Self {
        self.vertex_arrays = enabled;
        self
    }

    /// Cap the number of attribute slots.
    pub fn with_max_vertex_attributes(mut self, max: u32) -> Self {
        self.max_vertex_attributes = Some(max);
        self
    }

    /// Whether binding states use vertex-array objects on `ctx`.
    pub fn uses_vertex_arrays(&self, ctx: &dyn GpuContext) -> bool {
        self.vertex_arrays && ctx.features().contains(ContextFeatures::VERTEX_ARRAY_OBJECTS)
    }

    /// Slot count after applying the cap to `ctx`'s limit.
    pub fn effective_max_vertex_attributes(&self, ctx: &dyn GpuContext) -> u32 {
        let limit = ctx.max_vertex_attributes();
        self.max_vertex_attributes.map_or(limit, |max| max.min(limit))
    }
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::dummy::DummyContext;

    #[test]
    fn test_context_limits_win() {
        let ctx = DummyContext::new().with_max_vertex_attributes(8);
        let config = BinderConfig::new().with_max_vertex_attributes(32);
        assert_eq!(config.effective_max_vertex_attributes(&ctx), 8);
        assert_eq!(
            BinderConfig::new().with_max_vertex_attributes(4).effective_max_vertex_attributes(&ctx),
            4
        );
        assert_eq!(BinderConfig::new().effective_max_vertex_attributes(&ctx), 8);
    }

    #[test]
    fn test_vertex_arrays_need_feature() {
        assert!(BinderConfig::new().uses_vertex_arrays(&DummyContext::new()));
        assert!(!BinderConfig::new().uses_vertex_arrays(&DummyContext::legacy()));
        assert!(!BinderConfig::new().with_vertex_arrays(false).uses_vertex_arrays(&DummyContext::new()));
    }
}
