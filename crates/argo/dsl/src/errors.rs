//! DSL error types
//!
//! Every failure here is a defect in a template definition, surfaced at
//! definition or compile time. Nothing is retried.

/// Errors that can occur during introspection, encoding, or compilation
#[derive(Debug, thiserror::Error)]
pub enum DslError {
    #[error("Unknown manifest kind: {0}")]
    UnknownManifestKind(String),

    #[error("Invalid {kind} manifest: {message}")]
    InvalidManifest { kind: String, message: String },

    #[error("Template '{0}' has no manifest and no manifest producer")]
    MissingManifestProducer(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Duplicate parameter: '{0}'")]
    DuplicateParameter(String),

    #[error("Unknown template: '{0}'")]
    UnknownTemplate(String),

    #[error("Step '{step}' is bound to template '{expected}', not '{found}'")]
    TemplateMismatch {
        step: String,
        expected: String,
        found: String,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Cannot encode '{parameter}': {message}")]
    Encoding { parameter: String, message: String },

    #[error("Introspection error at line {line}: {message}")]
    Introspection { line: usize, message: String },

    #[error("Render error: {0}")]
    Render(String),

    #[error("Template error: {0}")]
    Template(#[from] argo_types::TypesError),
}

impl DslError {
    pub fn encoding(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Encoding {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    pub fn introspection(line: usize, message: impl Into<String>) -> Self {
        Self::Introspection {
            line,
            message: message.into(),
        }
    }

    /// Problems with how a template is put together
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownManifestKind(_)
                | Self::InvalidManifest { .. }
                | Self::MissingManifestProducer(_)
                | Self::MissingField(_)
                | Self::DuplicateParameter(_)
                | Self::UnknownTemplate(_)
                | Self::TemplateMismatch { .. }
                | Self::Config(_)
                | Self::Template(_)
        )
    }

    pub fn is_encoding(&self) -> bool {
        matches!(self, Self::Encoding { .. })
    }

    pub fn is_introspection(&self) -> bool {
        matches!(self, Self::Introspection { .. })
    }
}

impl From<serde_yaml::Error> for DslError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Render(err.to_string())
    }
}

impl From<serde_json::Error> for DslError {
    fn from(err: serde_json::Error) -> Self {
        Self::Render(err.to_string())
    }
}

/// Result type alias for DSL operations
pub type DslResult<T> = Result<T, DslError>;
