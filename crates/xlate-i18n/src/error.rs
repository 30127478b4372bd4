#![forbid(unsafe_code)]

use thiserror::Error;

/// Failures reported by a localization engine or while loading its inputs.
#[derive(Debug, Error)]
pub enum I18nError {
    #[error("missing translation for key '{key}' in namespace '{namespace}'")]
    MissingKey { namespace: String, key: String },
    #[error("key '{key}' in namespace '{namespace}' resolves to an object, not a string")]
    NotAString { namespace: String, key: String },
    #[error("invalid resource bundle: {0}")]
    InvalidResource(#[from] serde_json::Error),
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Free-form failure raised by a custom engine.
    #[error("{0}")]
    Engine(String),
}

pub type Result<T> = std::result::Result<T, I18nError>;
