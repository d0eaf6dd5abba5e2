//! Prompt Forge - prompt templates with conditional directives
//!
//! This library parses prompt-template documents (a metadata block plus a
//! body), validates them, and renders their bodies against caller-supplied
//! variables with `{{#if}}` / `{{else if}}` / `{{else}}` / `{{#unless}}`
//! directives and `{{placeholder}}` substitution.
//!
//! # Example
//!
//! ```rust
//! use prompt_forge::{render, Value, Variables};
//!
//! let mut vars = Variables::new();
//! vars.insert("premium".to_string(), Value::from(true));
//! vars.insert("name".to_string(), Value::from("Ada"));
//!
//! let result = render("Hello {{#if premium}}VIP {{/if}}{{name}}!", &vars, &[]);
//! assert_eq!(result.content, "Hello VIP Ada!");
//! assert!(result.errors.is_empty());
//! ```
//!
//! Documents go through [`parse_document`] and can be kept in a
//! [`TemplateRegistry`]:
//!
//! ```rust
//! use prompt_forge::{parse_document, TemplateRegistry, Variables};
//!
//! let doc = "---\nname: Greeter\nvariables:\n  - name: who\n    required: true\n---\nYou are friendly. Greet {{who}}.";
//! let template = parse_document(doc, None).unwrap();
//!
//! let result = template.render(&Variables::new());
//! assert_eq!(result.content, "You are friendly. Greet [MISSING: who].");
//! assert_eq!(result.missing_variables, vec!["who".to_string()]);
//!
//! let mut registry = TemplateRegistry::new();
//! let id = registry.register(template).unwrap();
//! assert_eq!(id, "custom-greeter-1.0.0");
//! ```

pub mod engine;
pub mod error;
pub mod expr;
pub mod settings;
pub mod template;
pub mod value;

pub use engine::{
    extract_variables, render, render_with_options, validate_syntax, RenderOptions, RenderResult,
    SyntaxIssue, SyntaxReport,
};
pub use error::{DocumentError, ExprError, MetadataFormat, RegistryError, SettingsError};
pub use expr::{evaluate_condition, evaluate_expression};
pub use settings::Settings;
pub use template::{
    load_document, parse_document, validate, Category, LoadReport, Template, TemplateRegistry,
    ValidationReport, VariableDeclaration, VariableType,
};
pub use value::{Value, Variables};
