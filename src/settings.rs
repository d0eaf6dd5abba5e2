//! Settings file for the command-line tool
//!
//! ```toml
//! [templates]
//! dir = "prompts/templates"
//! extension = "prompty"
//!
//! [render]
//! injection_protection = true
//! sanitize_input = true
//!
//! [logging]
//! level = "warn"
//! ```
//!
//! Every section and key is optional.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::engine::RenderOptions;
use crate::error::SettingsError;
use crate::template::DEFAULT_EXTENSION;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub templates: TemplateSettings,
    /// Options for rendering bodies that carry no security metadata of their own
    pub render: RenderOptions,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
    /// Directory listed when no directory is given
    pub dir: PathBuf,
    /// Document file extension, without the dot
    pub extension: String,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("prompts/templates"),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing` filter directive used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load settings from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }
}
