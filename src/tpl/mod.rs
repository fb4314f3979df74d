pub(crate) mod ast;
pub(crate) mod engine;
pub(crate) mod parser;
mod render;
pub(crate) mod render_context;
