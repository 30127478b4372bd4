#![forbid(unsafe_code)]

//! One isolated translation context.
//!
//! A [`TranslationContext`] owns everything a single execution context
//! (a request, a test case, a UI instance) needs: its own [`Scope`], its own
//! engine cell, its own setup event and the [`TranslationCell`] wired to
//! them. Nothing is shared between contexts, so one context's engine or
//! setup timing can never leak into another's output.
//!
//! ```rust,ignore
//! let ctx = TranslationContext::new("request-42");
//! assert_eq!(ctx.t("common:foo")?, "common:foo");
//! ctx.setup();
//! ctx.provide(catalog);
//! assert_eq!(ctx.t("common:foo")?, "bar");
//! ```

use tracing::{info, warn};
use xlate_i18n::{EngineRef, I18nConfig, I18nError, ResourceCatalog, Translate, TranslateOptions};
use xlate_reactive::{Event, Observable, Scope, Settled};

use crate::translation::{EngineHandle, TranslateFn, TranslationCell, TranslationState};

/// Per-context bundle of scope, inputs and translation cell.
#[derive(Debug)]
pub struct TranslationContext {
    scope: Scope,
    /// Writable engine input; `None` for a static context.
    engine: Option<Observable<Option<EngineRef>>>,
    setup: Event<()>,
    cell: TranslationCell,
}

impl TranslationContext {
    /// A context with no engine yet.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self::reactive(Scope::new(label), None)
    }

    /// A context whose engine cell starts populated.
    #[must_use]
    pub fn with_engine(label: impl Into<String>, engine: EngineRef) -> Self {
        Self::reactive(Scope::new(label), Some(engine))
    }

    /// A context whose engine is fixed for its whole lifetime.
    ///
    /// [`set_engine`](Self::set_engine) and [`provide`](Self::provide) are
    /// ignored on such a context.
    #[must_use]
    pub fn with_static_engine(label: impl Into<String>, engine: Option<EngineRef>) -> Self {
        Self::build(Scope::new(label), EngineHandle::Static(engine), None)
    }

    /// A context built from catalog configuration plus a resources document
    /// of the form `{ language: { namespace: { .. } } }`.
    pub fn from_config(
        label: impl Into<String>,
        config: &I18nConfig,
        resources_json: &str,
    ) -> Result<Self, I18nError> {
        config.validate()?;
        let mut catalog = ResourceCatalog::new(config.clone());
        catalog.load_resources_json(resources_json)?;
        Ok(Self::with_engine(label, EngineRef::new(catalog)))
    }

    fn reactive(scope: Scope, engine: Option<EngineRef>) -> Self {
        let engine = scope.observable(engine);
        Self::build(scope, EngineHandle::Reactive(engine.clone()), Some(engine))
    }

    fn build(
        scope: Scope,
        handle: EngineHandle,
        engine: Option<Observable<Option<EngineRef>>>,
    ) -> Self {
        let setup = scope.event();
        let cell = TranslationCell::new(&scope, handle, &setup);
        info!(
            scope = %scope.id(),
            label = scope.label(),
            engine_present = cell.engine().is_some(),
            fixed = engine.is_none(),
            "translation context created"
        );
        Self {
            scope,
            engine,
            setup,
            cell,
        }
    }

    /// Fire the setup signal and settle.
    pub fn setup(&self) -> Settled {
        self.scope.launch(&self.setup, ())
    }

    /// Replace (or clear) the engine and settle.
    pub fn set_engine(&self, engine: Option<EngineRef>) -> Settled {
        let Some(input) = self.engine.as_ref() else {
            warn!(scope = %self.scope.id(), "engine change ignored on a static context");
            return Settled::default();
        };
        self.scope.run(|| input.set(engine))
    }

    /// Install `engine` and settle.
    pub fn provide(&self, engine: impl Translate + 'static) -> Settled {
        self.set_engine(Some(EngineRef::new(engine)))
    }

    pub fn t(&self, key: &str) -> Result<String, I18nError> {
        self.cell.t(key)
    }

    pub fn t_with(&self, key: &str, options: &TranslateOptions) -> Result<String, I18nError> {
        self.cell.t_with(key, options)
    }

    #[must_use]
    pub fn translate_fn(&self) -> TranslateFn {
        self.cell.get()
    }

    #[must_use]
    pub fn state(&self) -> TranslationState {
        self.cell.state()
    }

    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    #[must_use]
    pub fn cell(&self) -> &TranslationCell {
        &self.cell
    }

    #[must_use]
    pub fn setup_event(&self) -> &Event<()> {
        &self.setup
    }

    /// The engine currently installed, whether or not setup has fired.
    #[must_use]
    pub fn engine(&self) -> Option<EngineRef> {
        self.cell.engine()
    }

    /// False for contexts built with [`with_static_engine`](Self::with_static_engine).
    #[must_use]
    pub fn accepts_engine_changes(&self) -> bool {
        self.engine.is_some()
    }
}
