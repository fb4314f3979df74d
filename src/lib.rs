//! Text templates with two embedded micro-syntaxes:
//!
//! - tags: `{{name}}` and predefined tags `{{#class=[zero|one|two] delimiter=[|]}}`,
//!   the latter selecting one literal of the list by the integer value of `class`;
//! - named blocks `[[#row]]…[[/row]]`, nested to any depth, which are cut out of
//!   the template and instantiated once per block entry of a [`Container`].
//!
//! ```
//! use anatomy::{data, render, render_block, Container};
//!
//! let template = "<table>{{rows}}</table>[[#row]]<tr><td>{{name}}</td>{{cells}}</tr>[[#cell]]<td>{{v}}</td>[[/cell]][[/row]]";
//!
//! let rows = Container::new()
//!     .add_block("row", data! {
//!         "name" => "a",
//!         "cells" => Container::new()
//!             .add_block("cell", data! { "v" => 1 })
//!             .add_block("cell", data! { "v" => 2 }),
//!     })
//!     .add_block("row", data! { "name" => "b" });
//!
//! assert_eq!(
//!     render(template, &data! { "rows" => rows }).unwrap(),
//!     "<table><tr><td>a</td><td>1</td><td>2</td></tr><tr><td>b</td></tr></table>",
//! );
//! assert_eq!(
//!     render_block(template, "cell", &data! { "v" => 9 }).unwrap(),
//!     "<td>9</td>",
//! );
//! ```
pub mod error;
pub mod models;
mod templater;
pub(crate) mod tpl;
pub mod values;

pub use error::{Result, TemplateError};
pub use models::options::TemplaterOptions;
pub use templater::{Templater, bind_context, render, render_block};
pub use tpl::ast::{BlockOccurrence, ExtractionResult};
pub use tpl::engine::Engine;
pub use tpl::parser::extract_blocks;
pub use tpl::render_context::BlockResolver;
pub use values::container::{Container, Entry};
pub use values::serializer::{to_data, to_value};
pub use values::value::{Data, Value};

/// Builds a [`Data`] map: `data! { "key" => value, ... }`.
#[macro_export]
macro_rules! data {
    () => {
        $crate::Data::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut data = $crate::Data::new();
        $(
            data.insert(::std::string::String::from($key), $crate::Value::from($value));
        )+
        data
    }};
}
