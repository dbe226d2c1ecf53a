//! The slice of material state the binding layer reads.

use std::collections::HashMap;

use crate::backend::ConstantValue;

/// Material properties relevant to vertex binding.
///
/// `default_attribute_values` feeds constant values to program inputs the
/// geometry does not provide.
#[derive(Debug, Clone, Default)]
pub struct MaterialState {
    wireframe: bool,
    default_attribute_values: HashMap<String, ConstantValue>,
}

impl MaterialState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render as line-list wireframe.
    pub fn with_wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }

    /// Constant for the input `name` when the geometry lacks it.
    pub fn with_default_value(mut self, name: impl Into<String>, value: impl Into<ConstantValue>) -> Self {
        self.default_attribute_values.insert(name.into(), value.into());
        self
    }

    pub fn wireframe(&self) -> bool {
        self.wireframe
    }

    pub fn set_wireframe(&mut self, wireframe: bool) {
        self.wireframe = wireframe;
    }

    pub fn default_value(&self, name: &str) -> Option<ConstantValue> {
        self.default_attribute_values.get(name).copied()
    }
}
