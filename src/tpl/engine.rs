use crate::error::{Result, TemplateError};
use crate::models::options::TemplaterOptions;
use crate::tpl::ast::ExtractionResult;
use crate::tpl::parser::extract_blocks;
use crate::tpl::render::substitute;
use crate::tpl::render_context::{BlockResolver, Context};
use crate::values::container::{Container, Entry};
use crate::values::value::Data;
use std::cell::{Cell, OnceCell};
use std::collections::HashSet;
use tracing::{debug, trace, warn};

/// Render context of one template for the duration of one render call.
///
/// Blocks are extracted at most once per engine and shared by the whole call
/// tree, including the reentrant expansion of containers. Containers are
/// expanded only after they have been bound with [`Engine::bind`].
pub struct Engine<'a> {
    template: &'a str,
    data: &'a Data,
    options: &'a TemplaterOptions,
    extracted: OnceCell<Option<ExtractionResult>>,
    // Identity of bound containers, never dereferenced.
    bound: HashSet<*const Container>,
    depth: Cell<usize>,
}

impl<'a> Engine<'a> {
    pub fn new(template: &'a str, data: &'a Data, options: &'a TemplaterOptions) -> Self {
        Self {
            template,
            data,
            options,
            extracted: OnceCell::new(),
            bound: HashSet::new(),
            depth: Cell::new(0),
        }
    }

    pub fn options(&self) -> &'a TemplaterOptions {
        self.options
    }

    /// Makes `container` expandable by this engine.
    pub fn bind(&mut self, container: &'a Container) {
        trace!(entries = container.len(), "container bound");
        self.bound.insert(container as *const Container);
    }

    pub fn is_bound(&self, container: &Container) -> bool {
        self.bound.contains(&(container as *const Container))
    }

    /// Renders the whole template, or only `single_block` against the
    /// top-level data. A missing block renders empty.
    pub fn render(&self, single_block: Option<&str>) -> Result<String> {
        if self.data.is_empty() && single_block.is_none() {
            return Ok(self.template.to_string());
        }

        let ctx = Context::new(self.data, self.options).with_resolver(self);
        match (self.extraction()?, single_block) {
            (Some(extracted), None) => substitute(&extracted.skeleton(self.template), &ctx),
            (None, None) => substitute(self.template, &ctx),
            (Some(extracted), Some(name)) => match extracted.block(name) {
                Some(block) => substitute(block, &ctx),
                None => Ok(missing_block(name)),
            },
            (None, Some(name)) => Ok(missing_block(name)),
        }
    }

    /// Blocks of the template, extracted on first use.
    pub fn extraction(&self) -> Result<Option<&ExtractionResult>> {
        if self.extracted.get().is_none() {
            let extracted = extract_blocks(self.template, self.options.max_depth)?;
            // Set only here, so the cell is still empty.
            let _ = self.extracted.set(extracted);
        }
        Ok(self.extracted.get().and_then(Option::as_ref))
    }

    fn render_entry_block(&self, name: &str, data: &Data) -> Result<String> {
        let Some(block) = self.extraction()?.and_then(|e| e.block(name)) else {
            return Ok(missing_block(name));
        };
        trace!(block = name, keys = data.len(), "expanding block entry");
        let ctx = Context::new(data, self.options).with_resolver(self);
        substitute(block, &ctx)
    }

    fn enter(&self) -> Result<DepthGuard<'_>> {
        let depth = self.depth.get() + 1;
        if depth > self.options.max_depth {
            warn!(limit = self.options.max_depth, "container nesting too deep");
            return Err(TemplateError::DepthExceeded {
                limit: self.options.max_depth,
            });
        }
        self.depth.set(depth);
        Ok(DepthGuard { depth: &self.depth })
    }
}

impl BlockResolver for Engine<'_> {
    /// Concatenates the entries in order: text as is, each block entry as its
    /// block template substituted against the entry's own data.
    fn render_container(&self, container: &Container) -> Result<String> {
        if !self.is_bound(container) {
            debug!(entries = container.len(), "container is not bound to this render");
            return Ok(String::new());
        }

        let _guard = self.enter()?;
        let mut out = String::new();
        for entry in container {
            match entry {
                Entry::Text(text) => out.push_str(text),
                Entry::Block { name, data } => {
                    out.push_str(&self.render_entry_block(name, data)?);
                }
            }
        }
        Ok(out)
    }
}

fn missing_block(name: &str) -> String {
    debug!(block = name, "block not found in template");
    String::new()
}

struct DepthGuard<'e> {
    depth: &'e Cell<usize>,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get() - 1);
    }
}
