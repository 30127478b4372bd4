#![forbid(unsafe_code)]

//! The localization engine contract.
//!
//! Anything that can turn a key plus pass-through options into a string is
//! an engine. The adapter in `xlate` never inspects the options; they are
//! forwarded verbatim.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::error::I18nError;

/// Pass-through arguments for a single translate call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslateOptions {
    /// Namespace used when the key does not name one.
    pub ns: Option<String>,
    /// Interpolation variables.
    pub args: BTreeMap<String, String>,
    /// Plural hint.
    pub count: Option<i64>,
    /// Returned (after interpolation) when the key is missing.
    pub default_value: Option<String>,
    /// Overrides the engine's active language for this call.
    pub language: Option<String>,
}

impl TranslateOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_ns(mut self, ns: impl Into<String>) -> Self {
        self.ns = Some(ns.into());
        self
    }

    #[must_use]
    pub fn with_arg(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.args.insert(name.into(), value.to_string());
        self
    }

    #[must_use]
    pub fn with_count(mut self, count: i64) -> Self {
        self.count = Some(count);
        self
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// A localization engine.
pub trait Translate {
    /// Resolve `key` to display text.
    fn translate(&self, key: &str, options: &TranslateOptions) -> Result<String, I18nError>;
}

impl<F> Translate for F
where
    F: Fn(&str, &TranslateOptions) -> Result<String, I18nError>,
{
    fn translate(&self, key: &str, options: &TranslateOptions) -> Result<String, I18nError> {
        self(key, options)
    }
}

/// Shared handle to an engine instance.
///
/// Equality is instance identity: two handles are equal only when they
/// point at the same engine, so swapping in a different instance (even one
/// with identical resources) counts as a change.
#[derive(Clone)]
pub struct EngineRef(Rc<dyn Translate>);

impl EngineRef {
    pub fn new(engine: impl Translate + 'static) -> Self {
        Self(Rc::new(engine))
    }

    /// Wrap an engine that is already shared elsewhere.
    pub fn from_rc(engine: Rc<dyn Translate>) -> Self {
        Self(engine)
    }

    pub fn translate(&self, key: &str, options: &TranslateOptions) -> Result<String, I18nError> {
        self.0.translate(key, options)
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl PartialEq for EngineRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for EngineRef {}

impl fmt::Debug for EngineRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EngineRef")
            .field(&Rc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}
