//! Static analysis of template bodies: variable extraction and syntax lint

use serde::{Deserialize, Serialize};

use crate::engine::scanner::{scan, Piece, TagKind};
use crate::engine::tree::{build, ProblemKind};
use crate::error::{join_expr_errors, render_report, Span};
use crate::expr::lexer::{lex_lossy, Token};
use crate::expr::{parse_condition, parse_expression, Helper};

/// Words that never count as variable names
const RESERVED: [&str; 3] = ["and", "or", "not"];

/// Root variable names referenced by placeholders and directive conditions,
/// in order of first appearance
pub fn extract_variables(body: &str) -> Vec<String> {
    let mut names = Vec::new();
    for piece in scan(body).pieces {
        let Piece::Tag(tag) = piece else { continue };
        match tag.kind {
            TagKind::IfOpen(cond) | TagKind::ElseIf(cond) | TagKind::UnlessOpen(cond) => {
                match parse_condition(cond.trim()) {
                    Ok(parsed) => parsed.collect_roots(&mut names),
                    Err(_) => collect_identifiers(&cond, &mut names),
                }
            }
            TagKind::Placeholder(expr) => match parse_expression(&expr) {
                Ok(parsed) => parsed.collect_roots(&mut names),
                Err(_) => collect_identifiers(&expr, &mut names),
            },
            _ => {}
        }
    }
    names.retain(|name| !is_reserved(name));
    names
}

/// Best-effort fallback for text that does not parse: every identifier
/// not preceded by a `.` is taken as a root name
fn collect_identifiers(source: &str, names: &mut Vec<String>) {
    let mut after_dot = false;
    for (token, _) in lex_lossy(source) {
        if let Token::Ident(name) = &token {
            if !after_dot && !names.contains(name) {
                names.push(name.clone());
            }
        }
        after_dot = token == Token::Dot;
    }
}

fn is_reserved(name: &str) -> bool {
    Helper::NAMES.contains(&name) || RESERVED.contains(&name)
}

/// A problem found by [`validate_syntax`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxIssue {
    pub message: String,
    pub span: Span,
}

impl SyntaxIssue {
    /// Format the issue with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        render_report(source, filename, self.span.clone(), &self.message)
    }
}

/// Result of [`validate_syntax`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyntaxReport {
    pub valid: bool,
    pub errors: Vec<SyntaxIssue>,
    /// Conditions and placeholders that will not parse; they render as
    /// `false` and `[ERROR: ...]` respectively
    pub warnings: Vec<SyntaxIssue>,
}

/// Lint a body for unbalanced blocks, stray tags, nested `{{` and
/// unterminated tags. Best effort, not a full grammar check.
pub fn validate_syntax(body: &str) -> SyntaxReport {
    let mut report = SyntaxReport::default();

    for problem in build(body).problems {
        if problem.kind != ProblemKind::UnsupportedBlock {
            report.errors.push(SyntaxIssue {
                message: problem.message,
                span: problem.span,
            });
        }
    }

    for piece in scan(body).pieces {
        let Piece::Tag(tag) = piece else { continue };
        let inner = &body[tag.span.start + 2..tag.span.end - 2];
        if inner.contains("{{") {
            report.errors.push(SyntaxIssue {
                message: "Malformed nesting: '{{' inside another tag".to_string(),
                span: tag.span.clone(),
            });
            continue;
        }
        let failure = match &tag.kind {
            TagKind::IfOpen(cond) | TagKind::ElseIf(cond) | TagKind::UnlessOpen(cond) => {
                parse_condition(cond)
                    .err()
                    .map(|errs| format!("Invalid condition '{}': {}", cond, join_expr_errors(&errs)))
            }
            TagKind::Placeholder(expr) => parse_expression(expr).err().map(|errs| {
                format!("Invalid expression '{}': {}", expr, join_expr_errors(&errs))
            }),
            _ => None,
        };
        if let Some(message) = failure {
            report.warnings.push(SyntaxIssue {
                message,
                span: tag.span,
            });
        }
    }

    report.errors.sort_by_key(|issue| issue.span.start);
    report.valid = report.errors.is_empty();
    report
}
