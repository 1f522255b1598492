//! Error types for transform construction and sequence operations.
//!
//! Every variant is raised where the problem is detected and propagated
//! unchanged, so a calling pipeline can tell a malformed parameter file from
//! a degenerate sequence.

use thiserror::Error;

/// Main error type for transform and sequence operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    /// The parameter vector length does not match what the kind requires.
    #[error("{kind} expects {expected} parameters, got {actual}")]
    ParameterCount {
        kind: String,
        expected: usize,
        actual: usize,
    },

    /// Transform name not one of the supported kinds.
    #[error("Unsupported transform: {0}")]
    UnsupportedTransform(String),

    /// Resample interpolator name not recognised.
    #[error("Unsupported resample interpolator: {0}")]
    UnsupportedInterpolator(String),

    /// A required parameter-map key is absent.
    #[error("Missing field: {0}")]
    MissingField(String),

    /// A parameter-map value could not be interpreted.
    #[error("Invalid value for {field}: {message}")]
    InvalidField { field: String, message: String },

    /// A linear transform matrix has no inverse.
    #[error("Singular matrix: {0}")]
    SingularMatrix(String),

    /// A grid direction matrix has no inverse.
    #[error("Singular direction matrix: {0}")]
    SingularDirection(String),

    /// Spacing components must be finite and strictly positive.
    #[error("Invalid spacing: {0:?}")]
    InvalidSpacing(Vec<f64>),

    /// Size, grid size or spline order out of range.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A composite or point mapping was requested with zero transforms.
    #[error("Transform sequence is empty")]
    EmptySequence,

    /// The number of stage indices differs from the number of transforms.
    #[error("Stage index mismatch: {transforms} transforms, {indices} stage indices")]
    StageIndexMismatch { transforms: usize, indices: usize },
}

/// Result type for transform operations.
pub type Result<T> = std::result::Result<T, TransformError>;

impl TransformError {
    pub fn parameter_count(kind: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::ParameterCount {
            kind: kind.into(),
            expected,
            actual,
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_geometry(msg: impl Into<String>) -> Self {
        Self::InvalidGeometry(msg.into())
    }
}
