//! Backend error types.

use thiserror::Error;

/// Errors reported by a GPU context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Failed to create a resource.
    #[error("resource creation failed: {0}")]
    ResourceCreationFailed(String),
    /// Out of GPU memory.
    #[error("out of GPU memory")]
    OutOfMemory,
    /// The context was lost; every handle it issued is gone.
    #[error("GPU context lost")]
    ContextLost,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(BackendError::ContextLost.to_string(), "GPU context lost");
        assert_eq!(
            BackendError::ResourceCreationFailed("too large".to_string()).to_string(),
            "resource creation failed: too large"
        );
    }
}
