use thiserror::Error;

/// Rejected raw input for a value type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Input does not have the required shape.
    #[error("invalid {field}: '{value}'")]
    PatternMismatch {
        /// Value type being parsed.
        field: &'static str,
        /// Rejected input.
        value: String,
    },
    /// Input is well-formed but not representable.
    #[error("{field} {value} is out of range")]
    OutOfBounds {
        /// Value type being parsed.
        field: &'static str,
        /// Rejected input.
        value: String,
    },
}
