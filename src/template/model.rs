//! Template record and the declarations it carries

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::engine::{render_with_options, RenderOptions, RenderResult};
use crate::value::{Value, Variables};

/// A parsed prompt template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_version", deserialize_with = "version_string")]
    pub version: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Declared variables, in document order
    #[serde(default)]
    pub variables: Vec<VariableDeclaration>,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub security: SecuritySettings,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
    #[serde(default)]
    pub metrics: Metrics,
    /// Body text following the metadata block
    #[serde(skip_deserializing)]
    pub body: String,
    /// Hex SHA-256 of the raw document
    #[serde(skip_deserializing)]
    pub content_hash: String,
    /// Where the document came from, if known
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Template {
    /// Registry key: `category-normalized_name-version`
    pub fn id(&self) -> String {
        format!(
            "{}-{}-{}",
            self.category,
            normalize_name(&self.name),
            self.version
        )
    }

    pub fn variable(&self, name: &str) -> Option<&VariableDeclaration> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions::from(&self.security)
    }

    /// Render the body with this template's declarations and security settings
    pub fn render(&self, variables: &Variables) -> RenderResult {
        render_with_options(&self.body, variables, &self.variables, &self.render_options())
    }

    /// Render with the input bindings of a declared test case
    pub fn render_test_case(&self, id: &str) -> Option<RenderResult> {
        self.test_cases
            .iter()
            .find(|case| case.id == id)
            .map(|case| self.render(&case.input))
    }
}

/// Lower-case a name and replace every run of non-alphanumerics with `-`
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn default_version() -> String {
    "1.0.0".to_string()
}

/// Accept `version: 1.2.0` as well as bare YAML numbers like `version: 2`
fn version_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(match Option::<Repr>::deserialize(deserializer)? {
        Some(Repr::Text(text)) => text,
        Some(Repr::Integer(n)) => n.to_string(),
        Some(Repr::Float(n)) => format!("{:?}", n),
        None => default_version(),
    })
}

/// Template category. Unknown names decode as [`Category::Custom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Category {
    Educational,
    Creative,
    Analytical,
    Professional,
    Testing,
    #[default]
    Custom,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Educational,
        Category::Creative,
        Category::Analytical,
        Category::Professional,
        Category::Testing,
        Category::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Educational => "educational",
            Category::Creative => "creative",
            Category::Analytical => "analytical",
            Category::Professional => "professional",
            Category::Testing => "testing",
            Category::Custom => "custom",
        }
    }
}

impl From<String> for Category {
    fn from(name: String) -> Self {
        let name = name.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == name)
            .unwrap_or_default()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A variable the template expects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    pub name: String,
    #[serde(rename = "type", default)]
    pub var_type: VariableType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRules>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    #[default]
    String,
    #[serde(alias = "integer", alias = "float")]
    Number,
    #[serde(alias = "bool")]
    Boolean,
    #[serde(alias = "list")]
    Array,
    #[serde(alias = "map")]
    Object,
}

impl VariableType {
    /// Whether a value has this type
    pub fn matches(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (VariableType::String, Value::String(_))
                | (VariableType::Number, Value::Number(_))
                | (VariableType::Boolean, Value::Bool(_))
                | (VariableType::Array, Value::List(_))
                | (VariableType::Object, Value::Map(_))
        )
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VariableType::String => "string",
            VariableType::Number => "number",
            VariableType::Boolean => "boolean",
            VariableType::Array => "array",
            VariableType::Object => "object",
        };
        f.write_str(name)
    }
}

/// Optional value constraints on a declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Allowed values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Value>>,
}

/// Generation hints passed through to whoever calls the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred: Option<String>,
    pub temperature: f64,
    pub max_tokens: i64,
    /// Any other parameters, kept as written
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            preferred: None,
            temperature: 0.7,
            max_tokens: 1000,
            extra: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
    pub injection_protection: bool,
    pub sanitize_input: bool,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            injection_protection: true,
            sanitize_input: true,
        }
    }
}

impl From<&SecuritySettings> for RenderOptions {
    fn from(settings: &SecuritySettings) -> Self {
        RenderOptions::new()
            .with_injection_protection(settings.injection_protection)
            .with_sanitize_input(settings.sanitize_input)
    }
}

/// Input bindings and expectations for one evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub input: Variables,
    #[serde(default)]
    pub expected: ExpectedOutput,
    /// Free-text evaluation criteria
    #[serde(default)]
    pub criteria: Vec<String>,
}

/// Assertions about a model response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpectedOutput {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contains: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub not_contains: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Usage counters owned by whoever tracks template usage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metrics {
    pub usage_count: u64,
    pub success_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used: Option<String>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            usage_count: 0,
            success_rate: 100.0,
            last_used: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Socratic Tutor"), "socratic-tutor");
        assert_eq!(normalize_name("  Code -- Review!! v2 "), "code-review-v2");
    }

    #[test]
    fn test_category_decoding() {
        let c: Category = serde_yaml::from_str("Creative").expect("should decode");
        assert_eq!(c, Category::Creative);
        let c: Category = serde_yaml::from_str("poetry").expect("should decode");
        assert_eq!(c, Category::Custom);
        assert_eq!(Category::Analytical.to_string(), "analytical");
    }

    #[test]
    fn test_variable_type_matches() {
        assert!(VariableType::Number.matches(&Value::from(3)));
        assert!(!VariableType::Number.matches(&Value::from("3")));
        assert!(VariableType::Array.matches(&Value::from(vec![1, 2])));
    }

    #[test]
    fn test_declaration_from_yaml() {
        let yaml = "name: level\ntype: bool\ndefault: false\nvalidation:\n  options: [true, false]\n";
        let decl: VariableDeclaration = serde_yaml::from_str(yaml).expect("should decode");
        assert_eq!(decl.var_type, VariableType::Boolean);
        assert!(!decl.required);
        assert_eq!(decl.default, Some(Value::Bool(false)));
        assert_eq!(
            decl.validation.and_then(|v| v.options).map(|o| o.len()),
            Some(2)
        );
    }

    #[test]
    fn test_defaults() {
        let template: Template = serde_yaml::from_str("name: Bare").expect("should decode");
        assert_eq!(template.version, "1.0.0");
        assert_eq!(template.category, Category::Custom);
        assert_eq!(template.model.temperature, 0.7);
        assert_eq!(template.model.max_tokens, 1000);
        assert!(template.security.injection_protection);
        assert!(template.security.sanitize_input);
        assert_eq!(template.metrics.usage_count, 0);
        assert_eq!(template.metrics.success_rate, 100.0);
        assert_eq!(template.id(), "custom-bare-1.0.0");
    }

    #[test]
    fn test_numeric_version() {
        let template: Template = serde_yaml::from_str("name: x\nversion: 2").expect("should decode");
        assert_eq!(template.version, "2");
        let template: Template =
            serde_yaml::from_str("name: x\nversion: 1.5").expect("should decode");
        assert_eq!(template.version, "1.5");
    }

    #[test]
    fn test_model_extra_parameters_pass_through() {
        let yaml = "name: x\nmodel:\n  preferred: small\n  top_p: 0.9\n";
        let template: Template = serde_yaml::from_str(yaml).expect("should decode");
        assert_eq!(template.model.preferred.as_deref(), Some("small"));
        assert_eq!(template.model.max_tokens, 1000);
        assert_eq!(template.model.extra.get("top_p"), Some(&Value::from(0.9)));
    }

    #[test]
    fn test_render_test_case() {
        let yaml = "name: x\ntest_cases:\n  - id: tc-1\n    input: { who: Ada }\n";
        let mut template: Template = serde_yaml::from_str(yaml).expect("should decode");
        template.body = "Hi {{who}}".to_string();
        let result = template.render_test_case("tc-1").expect("case exists");
        assert_eq!(result.content, "Hi Ada");
        assert!(template.render_test_case("nope").is_none());
    }
}
