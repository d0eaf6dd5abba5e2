//! Directive resolution and placeholder substitution

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::analysis::extract_variables;
use crate::engine::config::RenderOptions;
use crate::engine::security::{detect_injection, sanitize};
use crate::engine::tree::{build, Node, ProblemKind};
use crate::error::join_expr_errors;
use crate::expr::{parse_expression, try_evaluate_condition, Expr};
use crate::template::VariableDeclaration;
use crate::value::{Value, Variables};

/// Output of a render call. Every field is always present, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderResult {
    pub content: String,
    /// Root variable names referenced anywhere in the body, in order of appearance
    pub variables_used: Vec<String>,
    /// Required variables that are referenced but were not supplied
    pub missing_variables: Vec<String>,
    pub security_violations: Vec<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl RenderResult {
    /// No errors, missing variables or security violations
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
            && self.missing_variables.is_empty()
            && self.security_violations.is_empty()
    }
}

/// Render a body with protections enabled
pub fn render(
    body: &str,
    variables: &Variables,
    declarations: &[VariableDeclaration],
) -> RenderResult {
    render_with_options(body, variables, declarations, &RenderOptions::default())
}

/// Render a body: resolve directives, then substitute placeholders in the
/// selected content. Never fails; problems are reported in the result.
pub fn render_with_options(
    body: &str,
    variables: &Variables,
    declarations: &[VariableDeclaration],
    options: &RenderOptions,
) -> RenderResult {
    let tree = build(body);
    let mut renderer = Renderer {
        body,
        variables,
        declarations,
        options,
        result: RenderResult {
            variables_used: extract_variables(body),
            ..RenderResult::default()
        },
    };

    for problem in &tree.problems {
        match problem.kind {
            ProblemKind::UnsupportedBlock | ProblemKind::UnterminatedTag => {
                renderer.result.warnings.push(problem.message.clone())
            }
            _ => renderer.result.errors.push(problem.message.clone()),
        }
    }

    let mut out = String::with_capacity(body.len());
    renderer.render_nodes(&tree.nodes, &mut out);
    renderer.collect_missing();

    let mut result = renderer.result;
    result.content = cleanup(&out);
    debug!(
        used = result.variables_used.len(),
        missing = result.missing_variables.len(),
        errors = result.errors.len(),
        warnings = result.warnings.len(),
        "rendered template body"
    );
    result
}

struct Renderer<'a> {
    body: &'a str,
    variables: &'a Variables,
    declarations: &'a [VariableDeclaration],
    options: &'a RenderOptions,
    result: RenderResult,
}

impl Renderer<'_> {
    fn render_nodes(&mut self, nodes: &[Node], out: &mut String) {
        for node in nodes {
            match node {
                Node::Text(span) | Node::Verbatim(span) => out.push_str(&self.body[span.clone()]),
                Node::Placeholder { expr, .. } => {
                    let text = self.substitute(expr);
                    out.push_str(&text);
                }
                Node::Conditional {
                    branches,
                    otherwise,
                    ..
                } => {
                    // First truthy branch wins; later conditions are not evaluated
                    let selected = branches
                        .iter()
                        .find(|branch| self.condition(&branch.condition))
                        .map(|branch| &branch.body)
                        .or(otherwise.as_ref());
                    if let Some(body) = selected {
                        self.render_nodes(body, out);
                    }
                }
                Node::Unless {
                    condition, body, ..
                } => {
                    if !self.condition(condition) {
                        self.render_nodes(body, out);
                    }
                }
            }
        }
    }

    /// Evaluate a directive condition; malformed conditions are false
    fn condition(&mut self, source: &str) -> bool {
        match try_evaluate_condition(source, self.variables) {
            Ok(value) => value,
            Err(errs) => {
                self.result.errors.push(format!(
                    "Error evaluating condition '{}': {}",
                    source.trim(),
                    join_expr_errors(&errs)
                ));
                false
            }
        }
    }

    fn substitute(&mut self, expr: &str) -> String {
        let parsed = match parse_expression(expr) {
            Ok(parsed) => parsed,
            Err(errs) => {
                self.result.errors.push(format!(
                    "Error processing variable '{}': {}",
                    expr,
                    join_expr_errors(&errs)
                ));
                return format!("[ERROR: {}]", expr);
            }
        };

        let value = parsed.evaluate(self.variables);
        if !value.is_nullish() {
            return self.supplied_text(expr, &parsed, &value);
        }

        // A supplied root with a missing nested key is undefined, not missing
        let declaration = match &parsed {
            Expr::Path(path) if !self.is_supplied(&path.root) => {
                self.declarations.iter().find(|d| d.name == path.root)
            }
            _ => None,
        };
        match declaration {
            Some(decl) if decl.required => {
                self.result
                    .errors
                    .push(format!("Required variable '{}' is missing", expr));
                push_unique(&mut self.result.missing_variables, &decl.name);
                format!("[MISSING: {}]", expr)
            }
            Some(decl) if decl.default.is_some() => {
                self.result.warnings.push(format!(
                    "Variable '{}' not provided, using default value",
                    expr
                ));
                let default = decl.default.clone().unwrap_or_default();
                self.default_text(&parsed, &decl.name, default)
            }
            _ => {
                self.result.warnings.push(format!(
                    "Undefined variable '{}', using empty string",
                    expr
                ));
                String::new()
            }
        }
    }

    /// Text for a value that came from the caller's variables
    fn supplied_text(&mut self, expr: &str, parsed: &Expr, value: &Value) -> String {
        let text = value.to_string();
        if matches!(parsed, Expr::Literal(_)) {
            return text;
        }
        if self.options.injection_protection {
            for pattern in detect_injection(&text) {
                self.result.security_violations.push(format!(
                    "Potential prompt injection in '{}': {}",
                    expr, pattern
                ));
            }
        }
        if self.options.sanitize_input {
            sanitize(&text)
        } else {
            text
        }
    }

    /// Resolve a placeholder against a declaration's default value
    fn default_text(&self, parsed: &Expr, root: &str, default: Value) -> String {
        let resolved = match parsed {
            Expr::Path(path) if path.segments.is_empty() => default,
            _ => {
                let mut scoped = self.variables.clone();
                scoped.insert(root.to_string(), default);
                parsed.evaluate(&scoped)
            }
        };
        if resolved.is_nullish() {
            String::new()
        } else {
            resolved.to_string()
        }
    }

    fn is_supplied(&self, name: &str) -> bool {
        self.variables
            .get(name)
            .is_some_and(|value| !value.is_nullish())
    }

    /// Required variables referenced anywhere (including conditions) but not supplied
    fn collect_missing(&mut self) {
        for name in &self.result.variables_used {
            let required = self
                .declarations
                .iter()
                .any(|d| d.required && &d.name == name);
            if required && !self.is_supplied(name) {
                push_unique(&mut self.result.missing_variables, name);
            }
        }
    }
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|existing| existing == name) {
        list.push(name.to_string());
    }
}

/// Collapse runs of two or more blank lines to one empty line, drop one
/// leading blank line and trim trailing whitespace
pub fn cleanup(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut blank_run: Vec<&str> = Vec::new();
    for line in text.split('\n') {
        if line.trim().is_empty() {
            blank_run.push(line);
            continue;
        }
        flush_blank_run(&mut lines, &mut blank_run);
        lines.push(line);
    }
    flush_blank_run(&mut lines, &mut blank_run);

    if lines.first().is_some_and(|line| line.trim().is_empty()) {
        lines.remove(0);
    }
    lines.join("\n").trim_end().to_string()
}

/// A lone blank line is kept as written; a longer run becomes one empty line
fn flush_blank_run<'a>(lines: &mut Vec<&'a str>, run: &mut Vec<&'a str>) {
    match run.as_slice() {
        [] => {}
        [single] => lines.push(*single),
        _ => lines.push(""),
    }
    run.clear();
}
