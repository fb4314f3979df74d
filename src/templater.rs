use crate::error::{Result, TemplateError};
use crate::models::options::TemplaterOptions;
use crate::tpl::engine::Engine;
use crate::values::container::Entry;
use crate::values::serializer::to_data;
use crate::values::value::{Data, Value};
use serde::Serialize;
use tracing::{debug, warn};

/// Entry point of the engine: builds a render context per call, binds every
/// container reachable from the data to it and renders.
#[derive(Debug, Clone, Default)]
pub struct Templater {
    options: TemplaterOptions,
}

impl Templater {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: TemplaterOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &TemplaterOptions {
        &self.options
    }

    /// Renders `template`: top-level block regions are cut out and the rest is
    /// substituted against `data`. Blocks only appear where a container asks
    /// for them.
    pub fn render(&self, template: &str, data: &Data) -> Result<String> {
        self.run(template, None, data)
    }

    /// Renders the single block `block_name` of `template` against `data`,
    /// ignoring the rest of the template. Unknown blocks render empty; an empty
    /// name renders the whole template like [`Templater::render`].
    pub fn render_block(&self, template: &str, block_name: &str, data: &Data) -> Result<String> {
        let block_name = Some(block_name).filter(|name| !name.is_empty());
        self.run(template, block_name, data)
    }

    pub fn render_serialized<T: ?Sized + Serialize>(
        &self,
        template: &str,
        data: &T,
    ) -> Result<String> {
        let data = to_data(data)?;
        self.render(template, &data)
    }

    pub fn render_block_serialized<T: ?Sized + Serialize>(
        &self,
        template: &str,
        block_name: &str,
        data: &T,
    ) -> Result<String> {
        let data = to_data(data)?;
        self.render_block(template, block_name, &data)
    }

    fn run(&self, template: &str, block_name: Option<&str>, data: &Data) -> Result<String> {
        debug!(
            template_len = template.len(),
            keys = data.len(),
            block = ?block_name,
            "rendering template"
        );
        let mut engine = Engine::new(template, data, &self.options);
        bind_context(data, &mut engine)?;
        engine.render(block_name)
    }
}

/// Binds every container reachable from `data` to `engine`, depth first,
/// descending into the data of each container's block entries.
pub fn bind_context<'a>(data: &'a Data, engine: &mut Engine<'a>) -> Result<()> {
    bind_at_depth(data, engine, 1)
}

fn bind_at_depth<'a>(data: &'a Data, engine: &mut Engine<'a>, depth: usize) -> Result<()> {
    for value in data.values() {
        let Value::Container(container) = value else {
            continue;
        };
        let limit = engine.options().max_depth;
        if depth > limit {
            warn!(limit, "container nesting too deep");
            return Err(TemplateError::DepthExceeded { limit });
        }
        engine.bind(container);
        for entry in container {
            if let Entry::Block { data, .. } = entry {
                bind_at_depth(data, engine, depth + 1)?;
            }
        }
    }
    Ok(())
}

/// Renders `template` with default options.
pub fn render(template: &str, data: &Data) -> Result<String> {
    Templater::new().render(template, data)
}

/// Renders one named block of `template` with default options.
pub fn render_block(template: &str, block_name: &str, data: &Data) -> Result<String> {
    Templater::new().render_block(template, block_name, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Container;
    use crate::data;

    #[test]
    fn test_bind_context_reaches_nested_containers() {
        let inner = Container::new().add_block("copy", data! { "text" => "c" });
        let outer = Container::new()
            .add_text("t")
            .add_block("footer", data! { "two" => inner, "one" => "1" });
        let data = data! { "after" => outer, "plain" => "p" };

        let options = TemplaterOptions::default();
        let mut engine = Engine::new("", &data, &options);
        bind_context(&data, &mut engine).unwrap();

        let outer = data["after"].as_container().unwrap();
        assert!(engine.is_bound(outer));
        let Entry::Block { data: footer, .. } = &outer.entries()[1] else {
            panic!("expected a block entry");
        };
        assert!(engine.is_bound(footer["two"].as_container().unwrap()));
    }

    #[test]
    fn test_bind_context_depth_limit() {
        let level3 = Container::new().add_text("x");
        let level2 = Container::new().add_block("b", data! { "c" => level3 });
        let level1 = Container::new().add_block("a", data! { "b" => level2 });
        let data = data! { "a" => level1 };

        let options = TemplaterOptions::new().max_depth(2);
        let mut engine = Engine::new("", &data, &options);
        assert_eq!(
            bind_context(&data, &mut engine),
            Err(TemplateError::DepthExceeded { limit: 2 })
        );

        let options = TemplaterOptions::new().max_depth(3);
        let mut engine = Engine::new("", &data, &options);
        assert!(bind_context(&data, &mut engine).is_ok());
    }

    #[test]
    fn test_render_block_with_empty_name_renders_template() {
        let template = "<p>{{x}}</p>[[#b]]<b>{{x}}</b>[[/b]]";
        let data = data! { "x" => "1" };
        assert_eq!(render_block(template, "", &data).unwrap(), "<p>1</p>");
        assert_eq!(render_block(template, "b", &data).unwrap(), "<b>1</b>");
    }

    #[test]
    fn test_with_options_validates() {
        assert!(Templater::with_options(TemplaterOptions::new().max_depth(0)).is_err());
        let templater = Templater::with_options(TemplaterOptions::new().max_depth(8)).unwrap();
        assert_eq!(templater.options().max_depth, 8);
    }
}
