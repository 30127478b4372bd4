#![forbid(unsafe_code)]

//! Top-level error type.

use thiserror::Error;
use xlate_i18n::I18nError;

/// Errors surfaced by the `xlate` crate itself.
///
/// Translation calls keep returning [`I18nError`] so engine failures reach
/// the caller exactly as the engine produced them; this type only wraps
/// them for application code that mixes translation with setup work.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    I18n(#[from] I18nError),

    /// A global tracing subscriber could not be installed.
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(String),
}

pub type Result<T> = std::result::Result<T, Error>;
