use thiserror::Error;

/// Errors surfaced by the LRN API.
///
/// The per-element kernels never fail; these variants are only produced at the
/// API boundary (layout construction, tensor packing, unsupported modes).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LrnError {
    #[error("Shape mismatch in operation '{operation}': expected {expected}, got {got}")]
    ShapeMismatch {
        operation: String,
        expected: String,
        got: String,
    },

    #[error("Invalid shape in operation '{operation}': {reason}")]
    InvalidShape {
        operation: String,
        reason: String,
        shape: Option<Vec<usize>>,
    },

    #[error("Invalid argument in operation '{operation}': {reason}")]
    InvalidArgument { operation: String, reason: String },

    #[error("Operation '{operation}' not supported: {reason}")]
    UnsupportedOperation {
        operation: String,
        reason: String,
        alternatives: Vec<String>,
    },
}

impl LrnError {
    /// Create a shape mismatch error
    pub fn shape_mismatch(operation: &str, expected: &str, got: &str) -> Self {
        Self::ShapeMismatch {
            operation: operation.to_string(),
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }

    /// Create an invalid shape error, optionally recording the offending dims
    pub fn invalid_shape(operation: &str, reason: &str, shape: Option<&[usize]>) -> Self {
        Self::InvalidShape {
            operation: operation.to_string(),
            reason: reason.to_string(),
            shape: shape.map(|s| s.to_vec()),
        }
    }

    pub fn invalid_argument(operation: &str, reason: &str) -> Self {
        Self::InvalidArgument {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an unsupported operation error listing what the caller can use instead
    pub fn unsupported_operation(operation: &str, reason: &str, alternatives: &[&str]) -> Self {
        Self::UnsupportedOperation {
            operation: operation.to_string(),
            reason: reason.to_string(),
            alternatives: alternatives.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Get the operation name for this error
    pub fn operation(&self) -> &str {
        match self {
            Self::ShapeMismatch { operation, .. } => operation,
            Self::InvalidShape { operation, .. } => operation,
            Self::InvalidArgument { operation, .. } => operation,
            Self::UnsupportedOperation { operation, .. } => operation,
        }
    }

    /// Whether the error signals a mode or layout the kernels do not implement
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedOperation { .. })
    }
}

pub type Result<T> = std::result::Result<T, LrnError>;
