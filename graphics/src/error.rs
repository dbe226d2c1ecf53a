//! Binding error types.

use thiserror::Error;
use vbind_core::CoreError;

/// Errors surfaced by the binding layer.
///
/// Missing attributes, unmaterialized buffers and disposed resources are not
/// errors: such inputs are skipped at bind time. Only precondition violations
/// by the caller are reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// A program input addresses slots past the context limit.
    #[error(
        "input '{input}' uses slots {location}..{} but the context has {max}",
        .location + .location_size
    )]
    SlotOutOfRange {
        input: String,
        location: u32,
        location_size: u32,
        max: u32,
    },
    /// A program description is malformed.
    #[error("invalid program: {0}")]
    InvalidProgram(String),
    /// Vertex data rejected by the core types.
    #[error(transparent)]
    Core(#[from] CoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BindingError::SlotOutOfRange {
            input: "instanceMatrix".to_string(),
            location: 14,
            location_size: 4,
            max: 16,
        };
        assert_eq!(
            err.to_string(),
            "input 'instanceMatrix' uses slots 14..18 but the context has 16"
        );

        let err: BindingError = CoreError::ZeroStride.into();
        assert_eq!(err.to_string(), "buffer stride must be at least 1");
    }
}
