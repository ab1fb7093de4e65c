use thiserror::Error;

/// Result type for sonoreport operations
pub type Result<T> = std::result::Result<T, ReportError>;

/// Error types surfaced by the command-line path
#[derive(Error, Debug)]
pub enum ReportError {
    /// Template or preset could not be loaded
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// Input document is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors raised while loading or saving templates
///
/// Template loading is the only fallible part of the engine. A load either
/// succeeds completely or returns one of these without touching any record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The template root (or organ section) is not a JSON object
    #[error("template is not an object")]
    NotAnObject,

    /// The template is an object but does not follow the organ schema
    #[error("template does not match the {0}")]
    WrongSchema(String),

    /// A preset with this name already exists and overwrite was not requested
    #[error("preset already exists: {0}")]
    PresetExists(String),

    /// No preset with this name exists
    #[error("preset not found: {0}")]
    PresetNotFound(String),

    /// Built-in presets cannot be replaced or removed
    #[error("preset is read-only: {0}")]
    ReadOnlyPreset(String),
}

impl TemplateError {
    /// Builds a schema mismatch error
    pub(crate) fn schema(reason: impl Into<String>) -> Self {
        TemplateError::WrongSchema(reason.into())
    }
}
