//! Error types for expressions, documents, registration and settings

use std::fmt;
use std::path::PathBuf;

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Failure to lex or parse a condition or placeholder expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("{message} at {span:?}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },
}

impl ExprError {
    /// Human-readable message without the span suffix
    pub fn message(&self) -> String {
        match self {
            ExprError::Syntax {
                message, expected, ..
            } => {
                if expected.is_empty() {
                    message.clone()
                } else {
                    format!("{} (expected {})", message, expected.join(", "))
                }
            }
        }
    }
}

/// Render a single-label ariadne report into a string
pub fn render_report(source: &str, filename: &str, span: Span, message: &str) -> String {
    let mut buf = Vec::new();
    let written = Report::build(ReportKind::Error, filename, span.start)
        .with_message(message)
        .with_label(
            Label::new((filename, span))
                .with_message(message)
                .with_color(Color::Red),
        )
        .finish()
        .write((filename, Source::from(source)), &mut buf);
    match written {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        Err(_) => format!("{}: {}", filename, message),
    }
}

/// Join several expression errors into one line for diagnostics
pub fn join_expr_errors(errors: &[ExprError]) -> String {
    errors
        .iter()
        .map(|e| e.message())
        .collect::<Vec<_>>()
        .join("; ")
}

impl<'a> From<chumsky::error::Rich<'a, crate::expr::lexer::Token>> for ExprError {
    fn from(err: chumsky::error::Rich<'a, crate::expr::lexer::Token>) -> Self {
        use chumsky::error::RichReason;

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => {
                let found_str = match found {
                    Some(tok) => format_token(tok),
                    None => "end of input".to_string(),
                };
                format!("Unexpected {}", found_str)
            }
            RichReason::Custom(msg) => msg.to_string(),
        };

        let mut expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                chumsky::error::RichPattern::Token(tok) => Some(format_token(tok)),
                chumsky::error::RichPattern::Label(label) => Some(label.to_string()),
                chumsky::error::RichPattern::EndOfInput => Some("end of input".to_string()),
                chumsky::error::RichPattern::Identifier(s) => Some(format!("identifier '{}'", s)),
                chumsky::error::RichPattern::Any => Some("any token".to_string()),
                chumsky::error::RichPattern::SomethingElse => None,
            })
            .collect();
        expected.sort();
        expected.dedup();

        ExprError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &crate::expr::lexer::Token) -> String {
    use crate::expr::lexer::Token;
    match tok {
        Token::Ident(s) => format!("identifier '{}'", s),
        Token::Str(s) => format!("string \"{}\"", s),
        Token::Number(n) => format!("number {}", crate::value::format_number(*n)),
        Token::True => "'true'".to_string(),
        Token::False => "'false'".to_string(),
        Token::Null => "'null'".to_string(),
        Token::Undefined => "'undefined'".to_string(),
        Token::StrictEq => "'==='".to_string(),
        Token::StrictNe => "'!=='".to_string(),
        Token::LooseEq => "'=='".to_string(),
        Token::LooseNe => "'!='".to_string(),
        Token::GreaterOrEqual => "'>='".to_string(),
        Token::LessOrEqual => "'<='".to_string(),
        Token::Greater => "'>'".to_string(),
        Token::Less => "'<'".to_string(),
        Token::And => "'&&'".to_string(),
        Token::Or => "'||'".to_string(),
        Token::Bang => "'!'".to_string(),
        Token::ParenOpen => "'('".to_string(),
        Token::ParenClose => "')'".to_string(),
        Token::BracketOpen => "'['".to_string(),
        Token::BracketClose => "']'".to_string(),
        Token::Dot => "'.'".to_string(),
    }
}

/// Which flavour of metadata block a document used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataFormat {
    /// `---` fenced YAML
    Yaml,
    /// `+++` fenced TOML
    Toml,
}

impl fmt::Display for MetadataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataFormat::Yaml => write!(f, "YAML"),
            MetadataFormat::Toml => write!(f, "TOML"),
        }
    }
}

/// Hard failures while turning a document into a template
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The document does not have the metadata-block + body structure
    #[error("invalid template format: {0}")]
    InvalidFormat(String),

    /// The metadata block is not valid structured data
    #[error("failed to decode {format} metadata block: {source}")]
    MetadataDecode {
        format: MetadataFormat,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The document file could not be read
    #[error("failed to read template file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A template failed validation badly enough that it cannot be registered
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("template {id} rejected: {}", .reasons.join("; "))]
    Rejected { id: String, reasons: Vec<String> },
}

/// Failures loading the settings file
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_includes_expected_tokens() {
        let err = ExprError::Syntax {
            span: 3..4,
            message: "Unexpected end of input".to_string(),
            expected: vec!["identifier".to_string()],
        };
        assert_eq!(err.message(), "Unexpected end of input (expected identifier)");
    }

    #[test]
    fn test_report_mentions_filename_and_message() {
        let report = render_report("{{#if x}}", "body.prompty", 0..9, "Unmatched {{#if}}");
        assert!(report.contains("body.prompty"));
        assert!(report.contains("Unmatched {{#if}}"));
    }

    #[test]
    fn test_registry_error_display() {
        let err = RegistryError::Rejected {
            id: "custom--1.0.0".to_string(),
            reasons: vec!["name is required".to_string(), "body is empty".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "template custom--1.0.0 rejected: name is required; body is empty"
        );
    }

    #[test]
    fn test_document_error_display() {
        let err = DocumentError::InvalidFormat("missing closing '---' marker".to_string());
        assert_eq!(
            err.to_string(),
            "invalid template format: missing closing '---' marker"
        );
    }
}
