use crate::error::Result;
use crate::tpl::render_context::BlockResolver;
use crate::values::value::{Data, Value};
use tracing::debug;

/// Schema key holding the block name in [`Container::to_sequence`] output.
pub const BLOCK_KEY: &str = "block";
/// Schema key holding the text literal or the block data.
pub const DATA_KEY: &str = "data";

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Text(String),
    Block { name: String, data: Data },
}

/// Ordered builder of literal text and named block instances.
///
/// A container only describes *what* to render. Expanding its block entries needs
/// the block templates of the template being rendered, which are supplied at
/// render time through a [`BlockResolver`]. Containers nested in block data are
/// kept as they are and resolved lazily.
///
/// ```
/// use anatomy::{data, render, Container};
///
/// let people = Container::new()
///     .add_block("person", data! { "name" => "Alice" })
///     .add_block("person", data! { "name" => "Bob" });
///
/// let out = render(
///     "<ul>{{people}}</ul>[[#person]]<li>{{name}}</li>[[/person]]",
///     &data! { "people" => people },
/// )
/// .unwrap();
/// assert_eq!(out, "<ul><li>Alice</li><li>Bob</li></ul>");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Container {
    entries: Vec<Entry>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_text(mut self, text: impl Into<String>) -> Self {
        self.entries.push(Entry::Text(text.into()));
        self
    }

    pub fn add_block(mut self, name: impl Into<String>, data: Data) -> Self {
        self.entries.push(Entry::Block {
            name: name.into(),
            data,
        });
        self
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Plain representation of the entries, nested containers included.
    ///
    /// Each entry becomes a map with a `block` key (omitted for text and for an
    /// empty name) and a `data` key (omitted when the text or data is empty).
    pub fn to_sequence(&self) -> Vec<Value> {
        self.entries.iter().map(entry_schema).collect()
    }

    /// Stringifies the container. Without a resolver the result is empty.
    pub fn render(&self, resolver: Option<&dyn BlockResolver>) -> Result<String> {
        match resolver {
            Some(resolver) => resolver.render_container(self),
            None => {
                debug!(
                    entries = self.entries.len(),
                    "container rendered without a context"
                );
                Ok(String::new())
            }
        }
    }
}

impl<'a> IntoIterator for &'a Container {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn entry_schema(entry: &Entry) -> Value {
    let mut schema = Data::new();
    match entry {
        Entry::Text(text) => {
            if !text.is_empty() {
                schema.insert(DATA_KEY.to_string(), Value::Str(text.clone()));
            }
        }
        Entry::Block { name, data } => {
            if !name.is_empty() {
                schema.insert(BLOCK_KEY.to_string(), Value::Str(name.clone()));
            }
            if !data.is_empty() {
                let data = data
                    .iter()
                    .map(|(key, value)| (key.clone(), plain(value)))
                    .collect();
                schema.insert(DATA_KEY.to_string(), Value::Map(data));
            }
        }
    }
    Value::Map(schema)
}

/// Replaces containers with their sequence, wherever they sit in `value`.
fn plain(value: &Value) -> Value {
    match value {
        Value::Container(inner) => Value::List(inner.to_sequence()),
        Value::List(items) => Value::List(items.iter().map(plain).collect()),
        Value::Map(map) => Value::Map(
            map.iter()
                .map(|(key, value)| (key.clone(), plain(value)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data;

    struct Echo;

    impl BlockResolver for Echo {
        fn render_container(&self, container: &Container) -> Result<String> {
            Ok(format!("{} entries", container.len()))
        }
    }

    #[test]
    fn test_append_keeps_order() {
        let container = Container::new()
            .add_text("a")
            .add_block("b", Data::new())
            .add_text("c");
        assert_eq!(container.len(), 3);
        assert_eq!(container.entries()[0], Entry::Text("a".into()));
        assert!(matches!(&container.entries()[1], Entry::Block { name, .. } if name == "b"));
        assert_eq!(container.entries()[2], Entry::Text("c".into()));
    }

    #[test]
    fn test_schema_omits_empty_parts() {
        let container = Container::new().add_text("").add_block("only_name", Data::new());
        let sequence = container.to_sequence();
        assert_eq!(sequence[0], Value::Map(Data::new()));
        assert_eq!(
            sequence[1],
            Value::Map(data! { BLOCK_KEY => "only_name" })
        );
    }

    #[test]
    fn test_schema_reaches_containers_inside_lists_and_maps() {
        let inner = Container::new().add_text("t");
        let container = Container::new().add_block(
            "b",
            data! {
                "list" => vec![Value::from(inner.clone())],
                "map" => data! { "deep" => inner },
            },
        );
        let text = Value::Map(data! { DATA_KEY => "t" });
        assert_eq!(
            container.to_sequence(),
            vec![Value::Map(data! {
                BLOCK_KEY => "b",
                DATA_KEY => data! {
                    "list" => vec![Value::List(vec![text.clone()])],
                    "map" => data! { "deep" => vec![text] },
                },
            })]
        );
    }

    #[test]
    fn test_render_delegates_to_resolver() {
        let container = Container::new().add_text("x").add_text("y");
        assert_eq!(container.render(Some(&Echo)).unwrap(), "2 entries");
        assert_eq!(container.render(None).unwrap(), "");
    }
}
