//! Consistency checks for parsed templates
//!
//! Errors make a template unusable; warnings and suggestions are advice.
//! Only errors outside [`IssueKind::Variables`] block registration.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::engine::{extract_variables, validate_syntax};
use crate::template::model::Template;

/// Names that look like engine keywords rather than variables
const DIRECTIVE_KEYWORDS: [&str; 8] = ["if", "else", "unless", "each", "with", "this", "lookup", "log"];

/// Phrases that establish a role or persona at the start of a prompt
const ROLE_PHRASES: [&str; 7] = [
    "you are",
    "you're",
    "act as",
    "your role",
    "as a ",
    "as an ",
    "role:",
];

const MIN_BODY_LENGTH: usize = 50;

/// A validation finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub message: String,
}

/// Area of the template an issue concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Structure,
    Variables,
    Metadata,
    Model,
    Body,
    Syntax,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::Structure => write!(f, "structure"),
            IssueKind::Variables => write!(f, "variables"),
            IssueKind::Metadata => write!(f, "metadata"),
            IssueKind::Model => write!(f, "model"),
            IssueKind::Body => write!(f, "body"),
            IssueKind::Syntax => write!(f, "syntax"),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub suggestions: Vec<String>,
}

impl ValidationReport {
    /// Errors that are not about variable declarations
    pub fn blocking_errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.errors
            .iter()
            .filter(|issue| issue.kind != IssueKind::Variables)
    }

    fn error(&mut self, kind: IssueKind, message: String) {
        self.errors.push(ValidationIssue { kind, message });
    }

    fn warn(&mut self, kind: IssueKind, message: String) {
        self.warnings.push(ValidationIssue { kind, message });
    }
}

/// Validate a template's metadata, declarations and body
pub fn validate(template: &Template) -> ValidationReport {
    let mut report = ValidationReport::default();

    check_structure(template, &mut report);
    check_metadata(template, &mut report);
    check_variables(template, &mut report);
    check_model(template, &mut report);
    check_body(template, &mut report);
    suggest(template, &mut report);

    report.valid = report.errors.is_empty();
    report
}

fn check_structure(template: &Template, report: &mut ValidationReport) {
    if template.name.trim().is_empty() {
        report.error(IssueKind::Structure, "Template name is required".to_string());
    }
    if template.body.trim().is_empty() {
        report.error(IssueKind::Structure, "Template body is empty".to_string());
    }
}

fn check_metadata(template: &Template, report: &mut ValidationReport) {
    if template.description.trim().is_empty() {
        report.warn(IssueKind::Metadata, "Template has no description".to_string());
    }
    if !is_semver(&template.version) {
        report.warn(
            IssueKind::Metadata,
            format!(
                "Version '{}' is not in semantic version format (x.y.z)",
                template.version
            ),
        );
    }
}

/// `x.y.z` with numeric parts
fn is_semver(version: &str) -> bool {
    let parts: Vec<&str> = version.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

fn check_variables(template: &Template, report: &mut ValidationReport) {
    let used = extract_variables(&template.body);

    let mut seen = HashSet::new();
    for decl in &template.variables {
        if !seen.insert(decl.name.as_str()) {
            report.error(
                IssueKind::Variables,
                format!("Duplicate variable declaration '{}'", decl.name),
            );
        }
    }

    for name in &used {
        if template.variable(name).is_some() {
            continue;
        }
        if DIRECTIVE_KEYWORDS.contains(&name.as_str()) {
            report.warn(
                IssueKind::Variables,
                format!("'{}' looks like a directive keyword and is not declared", name),
            );
        } else {
            report.error(
                IssueKind::Variables,
                format!("Variable '{}' is used in the body but not declared", name),
            );
        }
    }

    for decl in &template.variables {
        if !used.contains(&decl.name) {
            report.warn(
                IssueKind::Variables,
                format!("Variable '{}' is declared but never used", decl.name),
            );
        }
        if decl.description.trim().is_empty() {
            report.warn(
                IssueKind::Variables,
                format!("Variable '{}' has no description", decl.name),
            );
        }
        let Some(default) = &decl.default else {
            continue;
        };
        if decl.required {
            report.warn(
                IssueKind::Variables,
                format!(
                    "Required variable '{}' declares a default that is never applied",
                    decl.name
                ),
            );
        }
        if !default.is_nullish() && !decl.var_type.matches(default) {
            report.warn(
                IssueKind::Variables,
                format!(
                    "Default for '{}' is a {} but the variable is declared as {}",
                    decl.name,
                    default.type_name(),
                    decl.var_type
                ),
            );
        }
        let options = decl.validation.as_ref().and_then(|rules| rules.options.as_ref());
        if let Some(options) = options {
            if !options.iter().any(|option| option.strict_eq(default)) {
                report.warn(
                    IssueKind::Variables,
                    format!("Default for '{}' is not one of its allowed options", decl.name),
                );
            }
        }
    }
}

fn check_model(template: &Template, report: &mut ValidationReport) {
    let temperature = template.model.temperature;
    if !(0.0..=2.0).contains(&temperature) {
        report.warn(
            IssueKind::Model,
            format!("Temperature {} is outside the range 0 to 2", temperature),
        );
    }
    if template.model.max_tokens < 1 {
        report.error(
            IssueKind::Model,
            format!(
                "max_tokens must be at least 1, got {}",
                template.model.max_tokens
            ),
        );
    }
}

fn check_body(template: &Template, report: &mut ValidationReport) {
    let body = template.body.trim();
    if body.is_empty() {
        return;
    }
    if body.chars().count() < MIN_BODY_LENGTH {
        report.warn(
            IssueKind::Body,
            format!("Body is shorter than {} characters", MIN_BODY_LENGTH),
        );
    }
    let opening = body.lines().next().unwrap_or_default().to_lowercase();
    if !ROLE_PHRASES.iter().any(|phrase| opening.contains(phrase)) {
        report.warn(
            IssueKind::Body,
            "Body does not start by establishing a role (e.g. \"You are ...\")".to_string(),
        );
    }

    let syntax = validate_syntax(&template.body);
    for issue in syntax.errors.into_iter().chain(syntax.warnings) {
        report.warn(IssueKind::Syntax, issue.message);
    }
}

fn suggest(template: &Template, report: &mut ValidationReport) {
    if template.tags.is_empty() {
        report
            .suggestions
            .push("Add tags so the template is easier to find".to_string());
    }
    if template.test_cases.is_empty() {
        report
            .suggestions
            .push("Add test cases to check the template's output".to_string());
    }
    if template
        .variables
        .iter()
        .any(|decl| decl.description.trim().is_empty())
    {
        report
            .suggestions
            .push("Describe every variable so callers know what to supply".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::document::parse_document;
    use pretty_assertions::assert_eq;

    fn parse(doc: &str) -> Template {
        parse_document(doc, None).expect("fixture should parse")
    }

    fn messages(issues: &[ValidationIssue]) -> Vec<String> {
        issues.iter().map(|i| i.message.clone()).collect()
    }

    const GOOD: &str = r#"---
name: Code Reviewer
description: Reviews a snippet
version: 1.0.0
tags: [code]
variables:
  - name: code
    required: true
    description: Source to review
test_cases:
  - id: tc-1
    input: { code: "fn main() {}" }
---
You are a meticulous senior engineer. Review the following code carefully:
{{code}}
"#;

    #[test]
    fn test_clean_template() {
        let report = validate(&parse(GOOD));
        assert!(report.valid);
        assert_eq!(report.errors, vec![]);
        assert_eq!(report.warnings, vec![]);
        assert_eq!(report.suggestions, Vec::<String>::new());
    }

    #[test]
    fn test_structure_errors() {
        let report = validate(&parse("---\nname: ''\n---\n"));
        assert!(!report.valid);
        assert_eq!(
            messages(&report.errors),
            vec!["Template name is required", "Template body is empty"]
        );
        assert_eq!(report.blocking_errors().count(), 2);
    }

    #[test]
    fn test_undeclared_and_duplicate_variables() {
        let doc = "---\nname: x\nvariables:\n  - name: a\n  - name: a\n---\nYou are {{a}} and {{b}} {{#if this}}t{{/if}}";
        let report = validate(&parse(doc));
        assert!(!report.valid);
        assert_eq!(
            messages(&report.errors),
            vec![
                "Duplicate variable declaration 'a'",
                "Variable 'b' is used in the body but not declared",
            ]
        );
        assert_eq!(report.blocking_errors().count(), 0);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.message == "'this' looks like a directive keyword and is not declared"));
    }

    #[test]
    fn test_model_checks() {
        let doc = "---\nname: x\nmodel:\n  temperature: 2.5\n  max_tokens: 0\n---\nYou are a helper.";
        let report = validate(&parse(doc));
        assert_eq!(messages(&report.errors), vec!["max_tokens must be at least 1, got 0"]);
        assert_eq!(report.errors[0].kind, IssueKind::Model);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.kind == IssueKind::Model && w.message.contains("2.5")));
    }

    #[test]
    fn test_metadata_and_body_warnings() {
        let doc = "---\nname: x\nversion: '1.0'\n---\nSummarise this.";
        let report = validate(&parse(doc));
        assert!(report.valid);
        let kinds: Vec<IssueKind> = report.warnings.iter().map(|w| w.kind).collect();
        assert_eq!(
            kinds,
            vec![
                IssueKind::Metadata,
                IssueKind::Metadata,
                IssueKind::Body,
                IssueKind::Body
            ]
        );
    }

    #[test]
    fn test_declaration_warnings() {
        let doc = r#"---
name: x
variables:
  - name: level
    required: true
    default: 3
    description: Difficulty
    validation: { options: [beginner, advanced] }
  - name: unused
    description: Never referenced
---
You are a tutor. Explain the topic at the requested level: {{level}} please.
"#;
        let report = validate(&parse(doc));
        assert!(report.valid);
        assert_eq!(
            messages(&report.warnings),
            vec![
                "Template has no description",
                "Required variable 'level' declares a default that is never applied",
                "Default for 'level' is a number but the variable is declared as string",
                "Default for 'level' is not one of its allowed options",
                "Variable 'unused' is declared but never used",
            ]
        );
    }

    #[test]
    fn test_syntax_findings_are_warnings() {
        let doc = "---\nname: x\ndescription: d\n---\nYou are a helpful assistant. {{#if open}}This block never closes and that is a problem.";
        let report = validate(&parse(doc));
        assert!(report.warnings.iter().any(|w| w.kind == IssueKind::Syntax
            && w.message.starts_with("Unmatched {{#if}}")));
    }

    #[test]
    fn test_issue_display() {
        let issue = ValidationIssue {
            kind: IssueKind::Body,
            message: "too short".to_string(),
        };
        assert_eq!(issue.to_string(), "[body] too short");
    }
}
