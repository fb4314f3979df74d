use thiserror::Error;

/// Errors that can occur while preparing data for or rendering a template.
///
/// Missing or malformed substitution data is never an error: unknown tags render
/// empty, out-of-range predefined indexes fall back to the first option. Only
/// shape violations and exhausted recursion ceilings are reported.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("Nesting depth exceeds the configured limit of {limit}")]
    DepthExceeded { limit: usize },
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}

impl serde::ser::Error for TemplateError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        TemplateError::Serialize(msg.to_string())
    }
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;
