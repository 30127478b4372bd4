#![forbid(unsafe_code)]

//! Catalog configuration.
//!
//! [`I18nConfig`] captures every tunable of the resource catalog and can be
//! loaded from TOML or JSON at startup.
//!
//! ```toml
//! language = "fr"
//! fallback_language = "en"
//! default_namespace = "common"
//! missing_key = "error"
//!
//! [interpolation]
//! prefix = "{{"
//! suffix = "}}"
//! ```
//!
//! Every field has a default, so a partial file (or an empty one) is valid.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{I18nError, Result};

/// What the catalog does when a key cannot be resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingKeyPolicy {
    /// Return the key path (without its namespace prefix).
    #[default]
    ReturnKey,
    /// Fail with [`I18nError::MissingKey`].
    Error,
}

/// Placeholder delimiters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpolationConfig {
    pub prefix: String,
    pub suffix: String,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            prefix: "{{".into(),
            suffix: "}}".into(),
        }
    }
}

/// Configuration for [`ResourceCatalog`](crate::ResourceCatalog).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct I18nConfig {
    /// Active language.
    pub language: String,
    /// Consulted when the active language lacks a key.
    pub fallback_language: Option<String>,
    /// Namespace used when neither the key nor the options name one.
    pub default_namespace: String,
    /// Splits `"ns:key"`.
    pub namespace_separator: String,
    /// Splits nested key paths such as `"menu.file.open"`.
    pub key_separator: String,
    pub interpolation: InterpolationConfig,
    pub missing_key: MissingKeyPolicy,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            language: "en".into(),
            fallback_language: None,
            default_namespace: "translation".into(),
            namespace_separator: ":".into(),
            key_separator: ".".into(),
            interpolation: InterpolationConfig::default(),
            missing_key: MissingKeyPolicy::default(),
        }
    }
}

impl I18nConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Check that every delimiter is usable.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        if self.language.trim().is_empty() {
            problems.push("language must not be empty".to_string());
        }
        if self.default_namespace.is_empty() {
            problems.push("default_namespace must not be empty".to_string());
        }
        if self.namespace_separator.is_empty() {
            problems.push("namespace_separator must not be empty".to_string());
        }
        if self.key_separator.is_empty() {
            problems.push("key_separator must not be empty".to_string());
        }
        if self.namespace_separator == self.key_separator {
            problems.push(format!(
                "namespace_separator and key_separator must differ (both '{}')",
                self.key_separator
            ));
        }
        if self.interpolation.prefix.is_empty() || self.interpolation.suffix.is_empty() {
            problems.push("interpolation prefix and suffix must not be empty".to_string());
        } else if self.interpolation.prefix == self.interpolation.suffix {
            problems.push("interpolation prefix and suffix must differ".to_string());
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(I18nError::Config(problems.join("; ")))
        }
    }
}
