#![forbid(unsafe_code)]

//! Scope-isolated reactive translation.
//!
//! `xlate` exposes "the current translate function" as a derived reactive
//! value. Until the host signals that setup finished, the function is the
//! identity (keys come back verbatim). Once setup fired and an engine is
//! available, calls are forwarded to that engine with their options intact.
//!
//! # Crates
//!
//! - [`xlate_reactive`]: scopes, observables, events and derived cells.
//! - [`xlate_i18n`]: the engine contract and an in-memory resource catalog.
//! - this crate: the translation cell, the per-context bundle and ambient
//!   setup (errors, logging).
//!
//! # Example
//!
//! ```
//! use xlate::{ResourceCatalog, TranslationContext};
//!
//! let ctx = TranslationContext::new("request-1");
//! assert_eq!(ctx.t("common:foo").unwrap(), "common:foo");
//!
//! ctx.setup();
//! let mut catalog = ResourceCatalog::default();
//! catalog.add_resource("en", "common", "foo", "bar");
//! ctx.provide(catalog);
//! assert_eq!(ctx.t("common:foo").unwrap(), "bar");
//! ```

pub mod context;
pub mod error;
#[cfg(feature = "subscriber")]
pub mod logging;
pub mod translation;

pub use context::TranslationContext;
pub use error::{Error, Result};
pub use translation::{EngineHandle, TranslateFn, TranslationCell, TranslationState};

pub use xlate_i18n::{
    EngineRef, I18nConfig, I18nError, InterpolationConfig, MissingKeyPolicy, ResourceCatalog,
    Translate, TranslateOptions,
};
pub use xlate_reactive::{Batch, Computed, Event, Observable, Scope, ScopeId, Settled, Subscription};
