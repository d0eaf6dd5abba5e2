//! Template documents, validation and the registry
//!
//! A template document is a fenced metadata block followed by a body:
//!
//! ```text
//! ---
//! name: Code Reviewer
//! category: professional
//! variables:
//!   - name: code
//!     required: true
//! ---
//! You are a meticulous reviewer. Review:
//! {{code}}
//! ```
//!
//! [`parse_document`] turns it into a [`Template`], [`validate`] checks it,
//! and [`TemplateRegistry`] stores templates that pass.

mod document;
mod loader;
mod model;
mod registry;
mod validate;

pub use document::{content_hash, load_document, parse_document};
pub use loader::{directory_category, find_documents, LoadFailure, LoadReport, DEFAULT_EXTENSION};
pub use model::{
    normalize_name, Category, ExpectedOutput, Metrics, ModelConfig, SecuritySettings, Template,
    TestCase, ValidationRules, VariableDeclaration, VariableType,
};
pub use registry::TemplateRegistry;
pub use validate::{validate, IssueKind, ValidationIssue, ValidationReport};
