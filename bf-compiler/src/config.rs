//! Compiler configuration and settings

use crate::language::Language;
use bf_editor::{FIELD_NAME_KEY, INPUT_NAME_KEY};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Main compiler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub default_language: String,
    /// Prepend collected definitions (imports, helpers) to generated code
    pub emit_definitions: bool,
    pub languages: BTreeMap<String, LanguageConfig>,
    pub lint: LintConfig,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            default_language: Language::Python.as_str().to_string(),
            emit_definitions: true,
            languages: BTreeMap::new(),
            lint: LintConfig::default(),
        }
    }
}

/// Language-specific configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    pub indent: Option<String>,
}

/// Lint pass settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    /// Field names checked for duplicates across the workspace
    pub name_keys: Vec<String>,
    /// Treat any warning as a failure
    pub deny_warnings: bool,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            name_keys: vec![FIELD_NAME_KEY.to_string(), INPUT_NAME_KEY.to_string()],
            deny_warnings: false,
        }
    }
}

impl CompilerConfig {
    /// Load configuration from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e,
        })
    }

    /// Save configuration to TOML file
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                error: e,
            })?;
        }

        std::fs::write(path, content).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e,
        })
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize { error: e })
    }

    /// Indent override for `language`
    pub fn indent_for(&self, language: Language) -> Option<&str> {
        self.languages
            .get(language.as_str())
            .and_then(|config| config.indent.as_deref())
    }

    pub fn set_indent(&mut self, language: Language, indent: impl Into<String>) {
        self.languages
            .entry(language.as_str().to_string())
            .or_default()
            .indent = Some(indent.into());
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_language.parse::<Language>().is_err() {
            return Err(ConfigError::Invalid {
                field: "default_language".to_string(),
                message: format!("unknown language '{}'", self.default_language),
            });
        }

        for (name, config) in &self.languages {
            if name.parse::<Language>().is_err() {
                return Err(ConfigError::Invalid {
                    field: format!("languages.{}", name),
                    message: "unknown language".to_string(),
                });
            }
            if let Some(indent) = &config.indent {
                if indent.is_empty() || !indent.chars().all(|c| c == ' ' || c == '\t') {
                    return Err(ConfigError::Invalid {
                        field: format!("languages.{}.indent", name),
                        message: "indent must be one or more spaces or tabs".to_string(),
                    });
                }
            }
        }

        if self.lint.name_keys.iter().any(|key| key.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                field: "lint.name_keys".to_string(),
                message: "name keys must not be blank".to_string(),
            });
        }

        Ok(())
    }

    /// Merge with another configuration (other takes precedence)
    pub fn merge(&mut self, other: CompilerConfig) {
        let defaults = CompilerConfig::default();
        if other.default_language != defaults.default_language {
            self.default_language = other.default_language;
        }
        if other.emit_definitions != defaults.emit_definitions {
            self.emit_definitions = other.emit_definitions;
        }
        if other.lint.name_keys != defaults.lint.name_keys {
            self.lint.name_keys = other.lint.name_keys;
        }
        if other.lint.deny_warnings {
            self.lint.deny_warnings = true;
        }

        // Merge language configs
        for (language, config) in other.languages {
            self.languages.insert(language, config);
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error for {path:?}: {error}")]
    Io { path: PathBuf, error: std::io::Error },

    #[error("Parse error for {path:?}: {error}")]
    Parse { path: PathBuf, error: toml::de::Error },

    #[error("Serialization error: {error}")]
    Serialize { error: toml::ser::Error },

    #[error("Invalid configuration for {field}: {message}")]
    Invalid { field: String, message: String },
}

/// Predefined configurations
pub mod presets {
    use super::*;

    /// Python output with PEP 8 indentation
    pub fn python_default() -> CompilerConfig {
        let mut config = CompilerConfig::default();
        config.set_indent(Language::Python, "    ");
        config
    }

    /// JavaScript output, as the block factory emits it
    pub fn javascript_default() -> CompilerConfig {
        let mut config = CompilerConfig {
            default_language: Language::JavaScript.as_str().to_string(),
            ..CompilerConfig::default()
        };
        config.set_indent(Language::JavaScript, "  ");
        config
    }
}
