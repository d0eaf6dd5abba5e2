//! Syntax tree for directive conditions and placeholder expressions

use crate::value::Value;

/// A value-producing expression: a literal or a variable path
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Path(Path),
}

/// Variable reference like `user.roles[0].name`
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub root: String,
    pub segments: Vec<Segment>,
}

/// One step after the root of a [`Path`]
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// `.name` or `.0`
    Key(String),
    /// `[expr]`
    Index(Box<Expr>),
}

/// Comparison operators usable between two expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `===`
    StrictEq,
    /// `!==`
    StrictNe,
    /// `==`
    LooseEq,
    /// `!=`
    LooseNe,
    /// `>=`
    Ge,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `<`
    Lt,
}

/// Prefix helper functions: `eq a b`, `gt a b`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Helper {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
}

impl Helper {
    pub const NAMES: [&'static str; 6] = ["eq", "ne", "gt", "lt", "gte", "lte"];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "eq" => Some(Helper::Eq),
            "ne" => Some(Helper::Ne),
            "gt" => Some(Helper::Gt),
            "lt" => Some(Helper::Lt),
            "gte" => Some(Helper::Gte),
            "lte" => Some(Helper::Lte),
            _ => None,
        }
    }
}

/// A directive condition
///
/// `And` is the outermost grouping: `a || b && c` parses as
/// `And([Or([a, b]), c])`. Parenthesised groups nest as written.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Bare expression, tested for truthiness
    Value(Expr),
    Compare {
        left: Expr,
        op: CompareOp,
        right: Expr,
    },
    Helper {
        helper: Helper,
        left: Expr,
        right: Expr,
    },
    Not(Box<Condition>),
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

impl Expr {
    /// Root variable names referenced by this expression, in source order
    pub fn collect_roots(&self, out: &mut Vec<String>) {
        if let Expr::Path(path) = self {
            push_unique(out, &path.root);
            for segment in &path.segments {
                if let Segment::Index(inner) = segment {
                    inner.collect_roots(out);
                }
            }
        }
    }
}

impl Condition {
    /// Root variable names referenced anywhere in this condition, in source order
    pub fn collect_roots(&self, out: &mut Vec<String>) {
        match self {
            Condition::Value(expr) => expr.collect_roots(out),
            Condition::Compare { left, right, .. } | Condition::Helper { left, right, .. } => {
                left.collect_roots(out);
                right.collect_roots(out);
            }
            Condition::Not(inner) => inner.collect_roots(out),
            Condition::And(parts) | Condition::Or(parts) => {
                for part in parts {
                    part.collect_roots(out);
                }
            }
        }
    }
}

fn push_unique(out: &mut Vec<String>, name: &str) {
    if !out.iter().any(|existing| existing == name) {
        out.push(name.to_string());
    }
}
