//! Expression language used inside `{{ }}` tags
//!
//! Placeholders hold an [`Expr`]: a literal or a variable path such as
//! `user.roles[0]`. Directive tags hold a [`Condition`], which adds
//! comparisons, helper calls (`eq a b`), negation, `&&` and `||`.

pub mod ast;
mod eval;
mod grammar;
pub mod lexer;

pub use ast::*;
pub use eval::{compare, evaluate_condition, evaluate_expression, try_evaluate_condition};
pub use grammar::{parse_condition, parse_expression};
