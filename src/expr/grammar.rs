//! Parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::error::ExprError;
use crate::expr::ast::*;
use crate::expr::lexer::{lex, Token};
use crate::value::{format_number, Value};

/// Parse a placeholder expression such as `user.name` or `items[0]`
pub fn parse_expression(input: &str) -> Result<Expr, Vec<ExprError>> {
    let len = input.len();
    let tokens = lex(input).map_err(|e| vec![e])?;

    // Turn the token list into a stream that chumsky can use
    let token_iter = tokens.into_iter().map(|(tok, span)| (tok, span.into()));
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    expression_parser()
        .then_ignore(end())
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Parse a directive condition such as `score > 90 && !archived`
pub fn parse_condition(input: &str) -> Result<Condition, Vec<ExprError>> {
    let len = input.len();
    let tokens = lex(input).map_err(|e| vec![e])?;

    let token_iter = tokens.into_iter().map(|(tok, span)| (tok, span.into()));
    let token_stream = Stream::from_iter(token_iter).map((len..len).into(), |(t, s): (_, _)| (t, s));

    condition_parser()
        .then_ignore(end())
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

fn expression_parser<'a, I>() -> impl Parser<'a, I, Expr, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    recursive(|expr| {
        let literal = select! {
            Token::Str(s) => Value::String(s),
            Token::Number(n) => Value::Number(n),
            Token::True => Value::Bool(true),
            Token::False => Value::Bool(false),
            Token::Null => Value::Null,
            Token::Undefined => Value::Undefined,
        }
        .map(Expr::Literal);

        // `.name` or `.0`
        let key_segment = just(Token::Dot)
            .ignore_then(select! {
                Token::Ident(s) => s,
                Token::Number(n) => format_number(n),
            })
            .map(Segment::Key);

        // `[expr]`, where expr is itself resolved against the variables
        let index_segment = expr
            .delimited_by(just(Token::BracketOpen), just(Token::BracketClose))
            .map(|inner| Segment::Index(Box::new(inner)));

        let path = select! { Token::Ident(s) => s }
            .then(
                choice((key_segment, index_segment))
                    .repeated()
                    .collect::<Vec<_>>(),
            )
            .map(|(root, segments)| Expr::Path(Path { root, segments }));

        choice((literal, path))
    })
}

fn condition_parser<'a, I>() -> impl Parser<'a, I, Condition, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let value = expression_parser();

    // Comparison operators (the lexer already split `===` from `==`)
    let compare_op = choice((
        just(Token::StrictEq).to(CompareOp::StrictEq),
        just(Token::StrictNe).to(CompareOp::StrictNe),
        just(Token::LooseEq).to(CompareOp::LooseEq),
        just(Token::LooseNe).to(CompareOp::LooseNe),
        just(Token::GreaterOrEqual).to(CompareOp::Ge),
        just(Token::LessOrEqual).to(CompareOp::Le),
        just(Token::Greater).to(CompareOp::Gt),
        just(Token::Less).to(CompareOp::Lt),
    ));

    let helper = select! { Token::Ident(s) => s }.try_map(|name, span| {
        Helper::from_name(&name)
            .ok_or_else(|| Rich::custom(span, format!("'{}' is not a helper function", name)))
    });

    recursive(|condition| {
        // `eq left right`
        let helper_call = helper
            .then(value.clone())
            .then(value.clone())
            .map(|((helper, left), right)| Condition::Helper {
                helper,
                left,
                right,
            });

        let group = condition
            .clone()
            .delimited_by(just(Token::ParenOpen), just(Token::ParenClose));

        // `left OP right`, or a bare expression tested for truthiness
        let comparison = value
            .clone()
            .then(compare_op.then(value.clone()).or_not())
            .map(|(left, rest)| match rest {
                Some((op, right)) => Condition::Compare { left, op, right },
                None => Condition::Value(left),
            });

        // Order matters: a helper name followed by two operands wins over a
        // plain variable that happens to be called `eq`
        let atom = choice((helper_call, group, comparison));

        let unary = just(Token::Bang)
            .repeated()
            .collect::<Vec<_>>()
            .then(atom)
            .map(|(negations, inner)| {
                negations
                    .iter()
                    .fold(inner, |cond, _| Condition::Not(Box::new(cond)))
            });

        // `&&` is split first, so it groups loosest: `a || b && c` is `(a || b) && c`
        let or_chain = unary
            .separated_by(just(Token::Or))
            .at_least(1)
            .collect::<Vec<_>>()
            .map(|parts| combine(parts, Condition::Or));

        or_chain
            .separated_by(just(Token::And))
            .at_least(1)
            .collect::<Vec<_>>()
            .map(|parts| combine(parts, Condition::And))
            .boxed()
    })
}

/// Collapse a single-element chain to its element
fn combine(mut parts: Vec<Condition>, chain: fn(Vec<Condition>) -> Condition) -> Condition {
    if parts.len() == 1 {
        parts.remove(0)
    } else {
        chain(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn path(root: &str) -> Expr {
        Expr::Path(Path {
            root: root.to_string(),
            segments: vec![],
        })
    }

    fn var(root: &str) -> Condition {
        Condition::Value(path(root))
    }

    #[test]
    fn test_parse_plain_identifier() {
        assert_eq!(parse_expression("user_name").expect("should parse"), path("user_name"));
    }

    #[test]
    fn test_parse_literals() {
        assert_eq!(
            parse_expression(r#""hi""#).expect("should parse"),
            Expr::Literal(Value::from("hi"))
        );
        assert_eq!(
            parse_expression("-2.5").expect("should parse"),
            Expr::Literal(Value::from(-2.5))
        );
        assert_eq!(
            parse_expression("undefined").expect("should parse"),
            Expr::Literal(Value::Undefined)
        );
    }

    #[test]
    fn test_parse_dotted_and_indexed_path() {
        let expr = parse_expression("user.roles[idx].name").expect("should parse");
        assert_eq!(
            expr,
            Expr::Path(Path {
                root: "user".to_string(),
                segments: vec![
                    Segment::Key("roles".to_string()),
                    Segment::Index(Box::new(path("idx"))),
                    Segment::Key("name".to_string()),
                ],
            })
        );
    }

    #[test]
    fn test_parse_numeric_key_segment() {
        let expr = parse_expression("items.0").expect("should parse");
        assert_eq!(
            expr,
            Expr::Path(Path {
                root: "items".to_string(),
                segments: vec![Segment::Key("0".to_string())],
            })
        );
    }

    #[test]
    fn test_parse_expression_rejects_trailing_tokens() {
        assert!(parse_expression("a b").is_err());
        assert!(parse_expression("items[0").is_err());
        assert!(parse_expression("").is_err());
    }

    #[test]
    fn test_parse_comparison() {
        let cond = parse_condition("score >= 90").expect("should parse");
        assert_eq!(
            cond,
            Condition::Compare {
                left: path("score"),
                op: CompareOp::Ge,
                right: Expr::Literal(Value::from(90)),
            }
        );
    }

    #[test]
    fn test_parse_helper_call() {
        let cond = parse_condition(r#"eq "1" 1"#).expect("should parse");
        assert_eq!(
            cond,
            Condition::Helper {
                helper: Helper::Eq,
                left: Expr::Literal(Value::from("1")),
                right: Expr::Literal(Value::from(1)),
            }
        );
    }

    #[test]
    fn test_helper_name_alone_is_a_variable() {
        assert_eq!(parse_condition("eq").expect("should parse"), var("eq"));
    }

    #[test]
    fn test_and_groups_looser_than_or() {
        let cond = parse_condition("a || b && c").expect("should parse");
        assert_eq!(
            cond,
            Condition::And(vec![Condition::Or(vec![var("a"), var("b")]), var("c")])
        );
    }

    #[test]
    fn test_parentheses_override_grouping() {
        let cond = parse_condition("a || (b && c)").expect("should parse");
        assert_eq!(
            cond,
            Condition::Or(vec![
                var("a"),
                Condition::And(vec![var("b"), var("c")])
            ])
        );
    }

    #[test]
    fn test_negation() {
        let cond = parse_condition("!!done").expect("should parse");
        assert_eq!(
            cond,
            Condition::Not(Box::new(Condition::Not(Box::new(var("done")))))
        );
    }

    #[test]
    fn test_wrapping_parentheses_are_stripped() {
        assert_eq!(parse_condition("(ready)").expect("should parse"), var("ready"));
    }

    #[test]
    fn test_parse_condition_errors() {
        assert!(parse_condition("").is_err());
        assert!(parse_condition("a >").is_err());
        assert!(parse_condition("(a && b").is_err());
        assert!(parse_condition("a and b").is_err());
    }
}
