//! Options controlling how caller-supplied values are treated during rendering

use serde::{Deserialize, Serialize};

/// Render options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Scan substituted values for prompt-injection patterns
    pub injection_protection: bool,

    /// Neutralise `{{`/`}}` and strip control characters in substituted values
    pub sanitize_input: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            injection_protection: true,
            sanitize_input: true,
        }
    }
}

impl RenderOptions {
    /// Create options with both protections enabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Options with both protections disabled
    pub fn permissive() -> Self {
        Self {
            injection_protection: false,
            sanitize_input: false,
        }
    }

    pub fn with_injection_protection(mut self, enabled: bool) -> Self {
        self.injection_protection = enabled;
        self
    }

    pub fn with_sanitize_input(mut self, enabled: bool) -> Self {
        self.sanitize_input = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = RenderOptions::default();
        assert!(options.injection_protection);
        assert!(options.sanitize_input);
    }

    #[test]
    fn test_builder_methods() {
        let options = RenderOptions::new()
            .with_injection_protection(false)
            .with_sanitize_input(true);
        assert!(!options.injection_protection);
        assert!(options.sanitize_input);
        assert_eq!(
            RenderOptions::permissive().with_sanitize_input(true),
            RenderOptions {
                injection_protection: false,
                sanitize_input: true
            }
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let options: RenderOptions =
            toml::from_str("sanitize_input = false").expect("should decode");
        assert!(options.injection_protection);
        assert!(!options.sanitize_input);
    }
}
