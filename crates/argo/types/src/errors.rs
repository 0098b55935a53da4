//! Error types for schema-level checks

/// Errors raised when a template violates the engine's structural rules
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypesError {
    #[error("Template name must not be empty")]
    EmptyName,

    #[error("Duplicate parameter name: '{0}'")]
    DuplicateParameter(String),

    #[error("Parameter '{0}' sets both a default and a valueFrom reference")]
    ConflictingParameterSource(String),

    #[error("Parameter name must not be empty")]
    EmptyParameterName,
}

/// Result type alias for schema checks
pub type TypesResult<T> = Result<T, TypesError>;
