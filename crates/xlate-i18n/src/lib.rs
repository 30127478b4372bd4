#![forbid(unsafe_code)]

//! Localization engine contract for xlate.
//!
//! Defines what a localization engine is ([`Translate`]), how it is shared
//! ([`EngineRef`]), and ships one concrete engine: [`ResourceCatalog`], an
//! in-memory catalog of namespaced JSON resources with interpolation and a
//! simple plural hint.
//!
//! # Role in xlate
//! The translation adapter in `xlate` treats every engine as a black box:
//! it forwards the key and [`TranslateOptions`] untouched and hands the
//! result (or the [`I18nError`]) straight back to the caller. Custom engines
//! only need to implement [`Translate`]; plain closures already do.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;

pub use catalog::ResourceCatalog;
pub use config::{I18nConfig, InterpolationConfig, MissingKeyPolicy};
pub use engine::{EngineRef, Translate, TranslateOptions};
pub use error::{I18nError, Result};
