//! Dynamic values bound to template variables
//!
//! Template variables arrive from YAML test fixtures, JSON files or the
//! caller's own code, so their type is only known at render time. [`Value`]
//! models them as a tagged union, and the comparison and truthiness rules of
//! the directive language are expressed as pattern matches over it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Variable bindings passed to a render call
pub type Variables = BTreeMap<String, Value>;

/// A dynamically typed variable value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Result of looking up something that does not exist
    #[default]
    #[serde(skip)]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// `true` for `Undefined` and `Null`
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Truthiness as used by `{{#if}}` and `{{#unless}}`
    ///
    /// Empty strings, zero, `NaN`, empty lists and empty maps are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
        }
    }

    /// Numeric coercion used by ordering operators and loose equality.
    ///
    /// Returns `NaN` for values that have no numeric reading.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Bool(true) => 1.0,
            Value::Bool(false) | Value::Null => 0.0,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse::<f64>().unwrap_or(f64::NAN)
                }
            }
            Value::Undefined | Value::List(_) | Value::Map(_) => f64::NAN,
        }
    }

    /// Short type name used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "array",
            Value::Map(_) => "object",
        }
    }

    /// Property lookup for one path segment.
    ///
    /// Missing keys, out-of-range indices and lookups on scalars all yield
    /// `Undefined` rather than failing.
    pub fn get_key(&self, key: &str) -> Value {
        match self {
            Value::Map(map) => map.get(key).cloned().unwrap_or_default(),
            Value::List(items) => {
                if key == "length" {
                    return Value::Number(items.len() as f64);
                }
                key.parse::<usize>()
                    .ok()
                    .and_then(|idx| items.get(idx).cloned())
                    .unwrap_or_default()
            }
            Value::String(s) if key == "length" => Value::Number(s.chars().count() as f64),
            _ => Value::Undefined,
        }
    }

    /// Index lookup for a `name[expr]` segment
    pub fn get_index(&self, index: &Value) -> Value {
        match index {
            Value::Number(n) if n.fract() == 0.0 && *n >= 0.0 => self.get_key(&format_number(*n)),
            Value::String(s) => self.get_key(s),
            Value::Bool(_) | Value::Null => self.get_key(&index.to_string()),
            _ => Value::Undefined,
        }
    }

    /// Strict (`===`) equality: same variant and same contents
    pub fn strict_eq(&self, other: &Value) -> bool {
        self == other
    }

    /// Loose (`==`) equality with primitive coercion
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(n), text @ Value::String(_))
            | (text @ Value::String(_), Value::Number(n)) => *n == text.to_number(),
            (Value::Bool(b), rest) | (rest, Value::Bool(b)) => {
                Value::Number(if *b { 1.0 } else { 0.0 }).loose_eq(rest)
            }
            (Value::List(_) | Value::Map(_), Value::List(_) | Value::Map(_)) => self == other,
            (container @ (Value::List(_) | Value::Map(_)), primitive)
            | (primitive, container @ (Value::List(_) | Value::Map(_))) => {
                Value::String(container.to_string()).loose_eq(primitive)
            }
            _ => false,
        }
    }

    /// JSON form with integral numbers written without a fraction
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Undefined | Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                serde_json::Value::from(*n as i64)
            }
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

/// Number formatting that drops a trailing `.0` on integral values
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{}", s),
            Value::List(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|item| match item {
                        Value::Undefined | Value::Null => String::new(),
                        other => other.to_string(),
                    })
                    .collect();
                write!(f, "{}", parts.join(","))
            }
            Value::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, Value)]) -> Value {
        Value::Map(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Undefined.is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::List(vec![]).is_truthy());
        assert!(!map(&[]).is_truthy());

        assert!(Value::from(true).is_truthy());
        assert!(Value::from(-1).is_truthy());
        assert!(Value::from("0").is_truthy());
        assert!(Value::from(vec![1]).is_truthy());
        assert!(map(&[("a", Value::Null)]).is_truthy());
    }

    #[test]
    fn test_display_matches_template_output() {
        assert_eq!(Value::from(80).to_string(), "80");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::from(vec!["a", "b"]).to_string(), "a,b");
        assert_eq!(map(&[("k", Value::from(1))]).to_string(), r#"{"k":1}"#);
        assert_eq!(Value::from(false).to_string(), "false");
    }

    #[test]
    fn test_loose_equality_coerces_primitives() {
        assert!(Value::from("1").loose_eq(&Value::from(1)));
        assert!(Value::from(1).loose_eq(&Value::from("1.0")));
        assert!(Value::from(true).loose_eq(&Value::from(1)));
        assert!(Value::from(false).loose_eq(&Value::from("")));
        assert!(Value::Null.loose_eq(&Value::Undefined));
        assert!(!Value::Null.loose_eq(&Value::from(0)));
        assert!(!Value::from("a").loose_eq(&Value::from("b")));
    }

    #[test]
    fn test_strict_equality_requires_same_variant() {
        assert!(!Value::from("1").strict_eq(&Value::from(1)));
        assert!(Value::from("x").strict_eq(&Value::from("x")));
        assert!(!Value::Null.strict_eq(&Value::Undefined));
    }

    #[test]
    fn test_key_and_index_lookup() {
        let user = map(&[
            ("name", Value::from("Ada")),
            ("roles", Value::from(vec!["admin", "dev"])),
        ]);
        assert_eq!(user.get_key("name"), Value::from("Ada"));
        assert_eq!(user.get_key("missing"), Value::Undefined);
        assert_eq!(user.get_key("roles").get_key("length"), Value::from(2));
        assert_eq!(user.get_key("roles").get_index(&Value::from(1)), Value::from("dev"));
        assert_eq!(Value::from("abc").get_key("length"), Value::from(3));
        assert_eq!(Value::Undefined.get_key("anything"), Value::Undefined);
    }

    #[test]
    fn test_deserialize_from_yaml_and_json() {
        let yaml: Value = serde_yaml::from_str("{count: 3, tags: [a, b], on: true, none: null}")
            .expect("yaml value");
        assert_eq!(yaml.get_key("count"), Value::from(3));
        assert_eq!(yaml.get_key("tags"), Value::from(vec!["a", "b"]));
        assert_eq!(yaml.get_key("on"), Value::from(true));
        assert_eq!(yaml.get_key("none"), Value::Null);

        let json = Value::from(serde_json::json!({"n": 1.5, "s": "x"}));
        assert_eq!(json.get_key("n"), Value::from(1.5));
    }
}
