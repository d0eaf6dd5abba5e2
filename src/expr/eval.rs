//! Evaluation of expressions and conditions against variable bindings

use crate::error::ExprError;
use crate::expr::ast::{CompareOp, Condition, Expr, Helper, Segment};
use crate::expr::grammar::{parse_condition, parse_expression};
use crate::value::{Value, Variables};

impl Expr {
    /// Resolve the expression. Missing variables and keys yield `Undefined`.
    pub fn evaluate(&self, vars: &Variables) -> Value {
        match self {
            Expr::Literal(value) => value.clone(),
            Expr::Path(path) => {
                let mut current = vars.get(&path.root).cloned().unwrap_or_default();
                for segment in &path.segments {
                    current = match segment {
                        Segment::Key(key) => current.get_key(key),
                        Segment::Index(inner) => current.get_index(&inner.evaluate(vars)),
                    };
                }
                current
            }
        }
    }
}

impl Condition {
    pub fn evaluate(&self, vars: &Variables) -> bool {
        match self {
            Condition::Value(expr) => expr.evaluate(vars).is_truthy(),
            Condition::Compare { left, op, right } => {
                compare(&left.evaluate(vars), *op, &right.evaluate(vars))
            }
            Condition::Helper {
                helper,
                left,
                right,
            } => {
                let left = left.evaluate(vars);
                let right = coerce_operand(&left, right.evaluate(vars));
                let op = match helper {
                    Helper::Eq => CompareOp::LooseEq,
                    Helper::Ne => CompareOp::LooseNe,
                    Helper::Gt => CompareOp::Gt,
                    Helper::Lt => CompareOp::Lt,
                    Helper::Gte => CompareOp::Ge,
                    Helper::Lte => CompareOp::Le,
                };
                compare(&left, op, &right)
            }
            Condition::Not(inner) => !inner.evaluate(vars),
            Condition::And(parts) => parts.iter().all(|part| part.evaluate(vars)),
            Condition::Or(parts) => parts.iter().any(|part| part.evaluate(vars)),
        }
    }
}

/// Apply a comparison operator
pub fn compare(left: &Value, op: CompareOp, right: &Value) -> bool {
    match op {
        CompareOp::StrictEq => left.strict_eq(right),
        CompareOp::StrictNe => !left.strict_eq(right),
        CompareOp::LooseEq => left.loose_eq(right),
        CompareOp::LooseNe => !left.loose_eq(right),
        CompareOp::Gt | CompareOp::Lt | CompareOp::Ge | CompareOp::Le => {
            let (l, r) = (left.to_number(), right.to_number());
            if l.is_nan() || r.is_nan() {
                return false;
            }
            match op {
                CompareOp::Gt => l > r,
                CompareOp::Lt => l < r,
                CompareOp::Ge => l >= r,
                _ => l <= r,
            }
        }
    }
}

/// Helper operands: when the left side is not a string, a string on the
/// right is read as a number or boolean if it looks like one.
fn coerce_operand(left: &Value, right: Value) -> Value {
    match right {
        Value::String(s) if !left.is_string() => match s.trim() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            trimmed => trimmed
                .parse::<f64>()
                .map(Value::Number)
                .unwrap_or(Value::String(s)),
        },
        other => other,
    }
}

/// Parse and resolve an expression in one step
pub fn evaluate_expression(source: &str, vars: &Variables) -> Result<Value, Vec<ExprError>> {
    parse_expression(source.trim()).map(|expr| expr.evaluate(vars))
}

/// Parse and evaluate a condition, treating malformed input as `false`
pub fn evaluate_condition(source: &str, vars: &Variables) -> bool {
    try_evaluate_condition(source, vars).unwrap_or(false)
}

/// Parse and evaluate a condition, reporting parse failures
pub fn try_evaluate_condition(source: &str, vars: &Variables) -> Result<bool, Vec<ExprError>> {
    parse_condition(source.trim()).map(|cond| cond.evaluate(vars))
}
