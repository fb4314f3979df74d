use crate::error::{Result, TemplateError};

pub const DEFAULT_DELIMITER: &str = "|";
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default tag-name character class: `[A-Za-z0-9_-]`.
pub fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Rendering configuration, passed explicitly to every [`Templater`](crate::Templater).
#[derive(Debug, Clone)]
pub struct TemplaterOptions {
    /// Delimiter used by predefined tags without a `delimiter=[..]` clause.
    pub default_delimiter: String,
    /// Ceiling for block nesting in templates and Container nesting in data.
    pub max_depth: usize,
    /// Character class of tag names.
    pub tag_char: fn(char) -> bool,
}

impl Default for TemplaterOptions {
    fn default() -> Self {
        TemplaterOptions {
            default_delimiter: DEFAULT_DELIMITER.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            tag_char: is_tag_char,
        }
    }
}

impl TemplaterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.default_delimiter = delimiter.into();
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn tag_char(mut self, tag_char: fn(char) -> bool) -> Self {
        self.tag_char = tag_char;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_delimiter.is_empty() {
            return Err(TemplateError::InvalidOptions(
                "default delimiter must not be empty".into(),
            ));
        }
        if self.max_depth == 0 {
            return Err(TemplateError::InvalidOptions(
                "max depth must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
