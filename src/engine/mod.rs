//! Directive engine
//!
//! Renders a template body against a set of variables. Directive blocks
//! (`{{#if}}`, `{{else if}}`, `{{else}}`, `{{#unless}}`) are resolved first,
//! then the remaining `{{expr}}` placeholders in the selected content are
//! substituted.
//!
//! ```text
//! {{#if score > 90}}A{{else if score > 70}}B{{else}}C{{/if}}
//! ```
//!
//! Rendering never fails. Missing variables, malformed expressions,
//! unbalanced blocks and suspicious input all end up in the
//! [`RenderResult`] diagnostics while the rest of the body still renders.

mod analysis;
mod config;
mod render;
mod scanner;
pub mod security;
mod tree;

pub use analysis::{extract_variables, validate_syntax, SyntaxIssue, SyntaxReport};
pub use config::RenderOptions;
pub use render::{cleanup, render, render_with_options, RenderResult};
