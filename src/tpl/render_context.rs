use crate::error::Result;
use crate::models::options::TemplaterOptions;
use crate::values::container::Container;
use crate::values::value::{Data, Value};

/// Expands the entries of a [`Container`] against the block templates of the
/// template currently being rendered.
///
/// The resolver is handed to rendering code explicitly for each call, so a
/// container never stores which template it was last rendered with.
pub trait BlockResolver {
    fn render_container(&self, container: &Container) -> Result<String>;
}

/// Data scope of one substitution unit (the skeleton or one block instance).
pub(crate) struct Context<'a> {
    data: &'a Data,
    options: &'a TemplaterOptions,
    resolver: Option<&'a dyn BlockResolver>,
}

impl<'a> Context<'a> {
    pub fn new(data: &'a Data, options: &'a TemplaterOptions) -> Self {
        Self {
            data,
            options,
            resolver: None,
        }
    }

    pub fn with_resolver(mut self, resolver: &'a dyn BlockResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn options(&self) -> &'a TemplaterOptions {
        self.options
    }

    pub fn lookup(&self, key: &str) -> Option<&'a Value> {
        self.data.get(key)
    }

    /// Replacement text for a plain tag; unknown and empty tags give `""`.
    pub fn resolve(&self, tag: &str) -> Result<String> {
        if tag.is_empty() {
            return Ok(String::new());
        }
        match self.lookup(tag) {
            Some(value) => value.render(self.resolver),
            None => Ok(String::new()),
        }
    }

    /// Option index selected by a predefined tag, if the data holds a usable one.
    pub fn index(&self, tag: &str) -> Option<usize> {
        self.lookup(tag)
            .and_then(Value::as_index)
            .and_then(|i| usize::try_from(i).ok())
    }
}
