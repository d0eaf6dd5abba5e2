//! Splits a template body into text runs and `{{ ... }}` tags

use crate::error::Span;

/// What a `{{ ... }}` tag means to the engine
#[derive(Debug, Clone, PartialEq)]
pub enum TagKind {
    /// `{{#if cond}}`
    IfOpen(String),
    /// `{{else if cond}}`
    ElseIf(String),
    /// `{{else}}`
    Else,
    /// `{{/if}}`
    IfClose,
    /// `{{#unless cond}}`
    UnlessOpen(String),
    /// `{{/unless}}`
    UnlessClose,
    /// `{{! ... }}`
    Comment,
    /// Any other tag starting with `#`, `/` or `^`, e.g. `{{#each items}}`
    Block(String),
    /// `{{expr}}`
    Placeholder(String),
}

/// A classified tag with the span of the whole `{{ ... }}` text
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub kind: TagKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    Text(Span),
    Tag(Tag),
}

/// Result of scanning a body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scan {
    pub pieces: Vec<Piece>,
    /// Offset of a `{{` with no closing `}}`; everything from there on is text
    pub unterminated: Option<usize>,
}

/// Scan a body into pieces. Never fails; an unterminated `{{` turns the
/// rest of the body into text and is recorded in [`Scan::unterminated`].
pub fn scan(body: &str) -> Scan {
    let mut scan = Scan::default();
    let mut pos = 0;

    while pos < body.len() {
        let Some(rel_open) = body[pos..].find("{{") else {
            scan.pieces.push(Piece::Text(pos..body.len()));
            break;
        };
        let open = pos + rel_open;
        let Some(rel_close) = body[open + 2..].find("}}") else {
            scan.pieces.push(Piece::Text(pos..body.len()));
            scan.unterminated = Some(open);
            break;
        };
        let close = open + 2 + rel_close;

        if open > pos {
            scan.pieces.push(Piece::Text(pos..open));
        }
        scan.pieces.push(Piece::Tag(Tag {
            kind: classify(&body[open + 2..close]),
            span: open..close + 2,
        }));
        pos = close + 2;
    }

    scan
}

/// Classify the text between `{{` and `}}`
pub fn classify(inner: &str) -> TagKind {
    let inner = inner.trim();

    if inner.starts_with('!') {
        return TagKind::Comment;
    }
    if let Some(cond) = keyword_rest(inner, "#if") {
        return TagKind::IfOpen(cond.to_string());
    }
    if let Some(cond) = keyword_rest(inner, "#unless") {
        return TagKind::UnlessOpen(cond.to_string());
    }
    if keyword_rest(inner, "/if").is_some_and(str::is_empty) {
        return TagKind::IfClose;
    }
    if keyword_rest(inner, "/unless").is_some_and(str::is_empty) {
        return TagKind::UnlessClose;
    }
    if let Some(rest) = keyword_rest(inner, "else") {
        if rest.is_empty() {
            return TagKind::Else;
        }
        if let Some(cond) = keyword_rest(rest, "if") {
            return TagKind::ElseIf(cond.to_string());
        }
    }
    if inner.starts_with(['#', '/', '^']) {
        return TagKind::Block(inner.to_string());
    }
    TagKind::Placeholder(inner.to_string())
}

/// If `text` is `keyword` alone or followed by whitespace, return the trimmed rest
fn keyword_rest<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(keyword)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify_directives() {
        assert_eq!(classify("#if score > 90"), TagKind::IfOpen("score > 90".into()));
        assert_eq!(classify(" else if  b "), TagKind::ElseIf("b".into()));
        assert_eq!(classify("else"), TagKind::Else);
        assert_eq!(classify("/if"), TagKind::IfClose);
        assert_eq!(classify("#unless done"), TagKind::UnlessOpen("done".into()));
        assert_eq!(classify("/unless"), TagKind::UnlessClose);
        assert_eq!(classify("! note to self "), TagKind::Comment);
    }

    #[test]
    fn test_classify_other_blocks_and_placeholders() {
        assert_eq!(classify("#each items"), TagKind::Block("#each items".into()));
        assert_eq!(classify("^empty"), TagKind::Block("^empty".into()));
        assert_eq!(classify("/each"), TagKind::Block("/each".into()));
        assert_eq!(classify("#iffy"), TagKind::Block("#iffy".into()));
        assert_eq!(classify("elsewhere"), TagKind::Placeholder("elsewhere".into()));
        assert_eq!(classify(" user.name "), TagKind::Placeholder("user.name".into()));
    }

    #[test]
    fn test_scan_pieces() {
        let body = "Hi {{name}}!{{#if a}}x{{/if}}";
        let scan = scan(body);
        assert_eq!(scan.unterminated, None);
        assert_eq!(
            scan.pieces,
            vec![
                Piece::Text(0..3),
                Piece::Tag(Tag {
                    kind: TagKind::Placeholder("name".into()),
                    span: 3..11
                }),
                Piece::Text(11..12),
                Piece::Tag(Tag {
                    kind: TagKind::IfOpen("a".into()),
                    span: 12..21
                }),
                Piece::Text(21..22),
                Piece::Tag(Tag {
                    kind: TagKind::IfClose,
                    span: 22..29
                }),
            ]
        );
    }

    #[test]
    fn test_scan_unterminated_tag() {
        let scan = scan("Hello {{name");
        assert_eq!(scan.unterminated, Some(6));
        assert_eq!(scan.pieces, vec![Piece::Text(0..12)]);
    }

    #[test]
    fn test_scan_empty_body() {
        assert_eq!(scan(""), Scan::default());
    }
}
