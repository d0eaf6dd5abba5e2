//! Directive tree built from scanned pieces
//!
//! The builder is tolerant: an unclosed block, a stray closer or an `else`
//! outside an `if` never aborts the build. Opening tags of unclosed blocks
//! become [`Node::Verbatim`], stray closers and `else` tags are dropped, and
//! a [`TreeProblem`] is recorded for the caller either way.

use crate::engine::scanner::{scan, Piece, Tag, TagKind};
use crate::error::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal body text
    Text(Span),
    /// Tag text copied to the output unchanged
    Verbatim(Span),
    Placeholder {
        expr: String,
        span: Span,
    },
    /// `if` / `else if` chain with an optional `else`
    Conditional {
        branches: Vec<Branch>,
        otherwise: Option<Vec<Node>>,
        span: Span,
    },
    Unless {
        condition: String,
        body: Vec<Node>,
        span: Span,
    },
}

/// One `if` or `else if` arm
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub condition: String,
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProblemKind {
    UnclosedIf,
    UnclosedUnless,
    StrayClose,
    StrayElse,
    UnsupportedBlock,
    UnterminatedTag,
}

/// Structural issue found while building the tree
#[derive(Debug, Clone, PartialEq)]
pub struct TreeProblem {
    pub kind: ProblemKind,
    pub span: Span,
    pub message: String,
}

/// Parsed body: top-level nodes plus structural problems
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    pub nodes: Vec<Node>,
    pub problems: Vec<TreeProblem>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BlockKind {
    If,
    Unless,
}

/// Arm of an open block: its opening tag span, condition (`None` for
/// `else`) and the nodes collected so far
#[derive(Debug)]
struct Arm {
    tag: Span,
    condition: Option<String>,
    nodes: Vec<Node>,
}

#[derive(Debug)]
struct Frame {
    kind: BlockKind,
    arms: Vec<Arm>,
}

impl Frame {
    fn open(kind: BlockKind, tag: Span, condition: String) -> Self {
        Frame {
            kind,
            arms: vec![Arm {
                tag,
                condition: Some(condition),
                nodes: Vec::new(),
            }],
        }
    }

    fn in_else(&self) -> bool {
        self.arms.last().is_some_and(|arm| arm.condition.is_none())
    }

    fn nodes_mut(&mut self) -> &mut Vec<Node> {
        // A frame always has at least its opening arm
        let last = self.arms.len() - 1;
        &mut self.arms[last].nodes
    }

    /// Turn a properly closed frame into its node
    fn close(self, close_tag: &Span) -> Node {
        let start = self.arms[0].tag.start;
        let span = start..close_tag.end;
        match self.kind {
            BlockKind::Unless => {
                let mut arms = self.arms.into_iter();
                let first = arms.next();
                let (condition, body) = first
                    .map(|arm| (arm.condition.unwrap_or_default(), arm.nodes))
                    .unwrap_or_default();
                Node::Unless {
                    condition,
                    body,
                    span,
                }
            }
            BlockKind::If => {
                let mut branches = Vec::new();
                let mut otherwise = None;
                for arm in self.arms {
                    match arm.condition {
                        Some(condition) => branches.push(Branch {
                            condition,
                            body: arm.nodes,
                        }),
                        None => otherwise = Some(arm.nodes),
                    }
                }
                Node::Conditional {
                    branches,
                    otherwise,
                    span,
                }
            }
        }
    }

    /// Flatten an unclosed frame: its tags stay verbatim, its content is kept
    fn flatten(self) -> Vec<Node> {
        let mut nodes = Vec::new();
        for arm in self.arms {
            nodes.push(Node::Verbatim(arm.tag));
            nodes.extend(arm.nodes);
        }
        nodes
    }
}

struct Builder<'a> {
    body: &'a str,
    root: Vec<Node>,
    stack: Vec<Frame>,
    problems: Vec<TreeProblem>,
}

impl<'a> Builder<'a> {
    fn push_node(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(frame) => frame.nodes_mut().push(node),
            None => self.root.push(node),
        }
    }

    fn problem(&mut self, kind: ProblemKind, span: Span, message: String) {
        self.problems.push(TreeProblem {
            kind,
            span,
            message,
        });
    }

    fn tag_text(&self, span: &Span) -> &'a str {
        &self.body[span.clone()]
    }

    fn handle_tag(&mut self, tag: Tag) {
        match tag.kind {
            TagKind::IfOpen(cond) => self.stack.push(Frame::open(BlockKind::If, tag.span, cond)),
            TagKind::UnlessOpen(cond) => {
                self.stack
                    .push(Frame::open(BlockKind::Unless, tag.span, cond))
            }
            TagKind::ElseIf(cond) => self.add_arm(tag.span, Some(cond)),
            TagKind::Else => self.add_arm(tag.span, None),
            TagKind::IfClose => self.close_block(BlockKind::If, tag.span),
            TagKind::UnlessClose => self.close_block(BlockKind::Unless, tag.span),
            TagKind::Comment => {}
            TagKind::Block(_) => {
                let text = self.tag_text(&tag.span);
                self.problem(
                    ProblemKind::UnsupportedBlock,
                    tag.span.clone(),
                    format!("Unsupported block tag '{}' left as-is", text),
                );
                self.push_node(Node::Verbatim(tag.span));
            }
            TagKind::Placeholder(expr) => self.push_node(Node::Placeholder {
                expr,
                span: tag.span,
            }),
        }
    }

    fn add_arm(&mut self, tag: Span, condition: Option<String>) {
        let accepts = matches!(
            self.stack.last(),
            Some(frame) if frame.kind == BlockKind::If && !frame.in_else()
        );
        if !accepts {
            let text = self.tag_text(&tag);
            self.problem(
                ProblemKind::StrayElse,
                tag.clone(),
                format!("'{}' outside of an {{{{#if}}}} block", text),
            );
            return;
        }
        if let Some(frame) = self.stack.last_mut() {
            frame.arms.push(Arm {
                tag,
                condition,
                nodes: Vec::new(),
            });
        }
    }

    fn close_block(&mut self, kind: BlockKind, tag: Span) {
        let Some(depth) = self.stack.iter().rposition(|frame| frame.kind == kind) else {
            let text = self.tag_text(&tag);
            self.problem(
                ProblemKind::StrayClose,
                tag.clone(),
                format!("'{}' has no matching opening tag", text),
            );
            return;
        };

        // Anything opened after the matching block was never closed
        while self.stack.len() > depth + 1 {
            self.unwind_top();
        }
        if let Some(frame) = self.stack.pop() {
            let node = frame.close(&tag);
            self.push_node(node);
        }
    }

    fn unwind_top(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let open_tag = frame.arms[0].tag.clone();
        let (kind, name) = match frame.kind {
            BlockKind::If => (ProblemKind::UnclosedIf, "if"),
            BlockKind::Unless => (ProblemKind::UnclosedUnless, "unless"),
        };
        self.problem(
            kind,
            open_tag,
            format!("Unmatched {{{{#{}}}}}: missing {{{{/{}}}}}", name, name),
        );
        for node in frame.flatten() {
            self.push_node(node);
        }
    }
}

/// Build the directive tree for a body
pub fn build(body: &str) -> Tree {
    let scanned = scan(body);
    let mut builder = Builder {
        body,
        root: Vec::new(),
        stack: Vec::new(),
        problems: Vec::new(),
    };

    for piece in scanned.pieces {
        match piece {
            Piece::Text(span) => builder.push_node(Node::Text(span)),
            Piece::Tag(tag) => builder.handle_tag(tag),
        }
    }
    while !builder.stack.is_empty() {
        builder.unwind_top();
    }
    if let Some(offset) = scanned.unterminated {
        builder.problem(
            ProblemKind::UnterminatedTag,
            offset..body.len(),
            "Unterminated tag: '{{' without a closing '}}'".to_string(),
        );
    }

    Tree {
        nodes: builder.root,
        problems: builder.problems,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(tree: &Tree) -> Vec<ProblemKind> {
        tree.problems.iter().map(|p| p.kind.clone()).collect()
    }

    #[test]
    fn test_if_else_if_else_chain() {
        let tree = build("{{#if a}}A{{else if b}}B{{else}}C{{/if}}");
        assert!(tree.problems.is_empty());
        assert_eq!(
            tree.nodes,
            vec![Node::Conditional {
                branches: vec![
                    Branch {
                        condition: "a".into(),
                        body: vec![Node::Text(9..10)],
                    },
                    Branch {
                        condition: "b".into(),
                        body: vec![Node::Text(23..24)],
                    },
                ],
                otherwise: Some(vec![Node::Text(32..33)]),
                span: 0..40,
            }]
        );
    }

    #[test]
    fn test_nested_blocks() {
        let tree = build("{{#if a}}{{#unless b}}x{{/unless}}{{/if}}");
        assert!(tree.problems.is_empty());
        let Node::Conditional { branches, .. } = &tree.nodes[0] else {
            panic!("expected a conditional, got {:?}", tree.nodes);
        };
        assert!(matches!(branches[0].body[0], Node::Unless { .. }));
    }

    #[test]
    fn test_unclosed_if_is_flattened() {
        let tree = build("{{#if a}}x {{name}}");
        assert_eq!(kinds(&tree), vec![ProblemKind::UnclosedIf]);
        assert_eq!(
            tree.nodes,
            vec![
                Node::Verbatim(0..9),
                Node::Text(9..11),
                Node::Placeholder {
                    expr: "name".into(),
                    span: 11..19
                },
            ]
        );
    }

    #[test]
    fn test_stray_closer_and_else() {
        let tree = build("a{{/if}}b{{else}}c");
        assert_eq!(kinds(&tree), vec![ProblemKind::StrayClose, ProblemKind::StrayElse]);
        assert_eq!(
            tree.nodes,
            vec![Node::Text(0..1), Node::Text(8..9), Node::Text(17..18)]
        );
    }

    #[test]
    fn test_second_else_is_stray() {
        let tree = build("{{#if a}}x{{else}}y{{else}}z{{/if}}");
        assert_eq!(kinds(&tree), vec![ProblemKind::StrayElse]);
    }

    #[test]
    fn test_closer_unwinds_inner_unclosed_block() {
        let tree = build("{{#if a}}{{#unless b}}x{{/if}}");
        assert_eq!(kinds(&tree), vec![ProblemKind::UnclosedUnless]);
        assert!(matches!(tree.nodes[0], Node::Conditional { .. }));
    }

    #[test]
    fn test_comments_vanish_and_blocks_stay() {
        let tree = build("{{! hidden }}{{#each xs}}");
        assert_eq!(kinds(&tree), vec![ProblemKind::UnsupportedBlock]);
        assert_eq!(tree.nodes, vec![Node::Verbatim(13..25)]);
    }

    #[test]
    fn test_unterminated_tag_reported() {
        let tree = build("Hi {{name");
        assert_eq!(kinds(&tree), vec![ProblemKind::UnterminatedTag]);
        assert_eq!(tree.nodes, vec![Node::Text(0..9)]);
    }
}
