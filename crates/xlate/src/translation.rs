#![forbid(unsafe_code)]

//! The translation-function cell.
//!
//! [`TranslationCell`] exposes "the current translate function" as a derived
//! reactive value of two inputs:
//!
//! - an engine handle, either a fixed optional engine or an observable one
//!   that may be filled in (or swapped) at any time;
//! - a setup event signalling that the host application finished its
//!   bootstrap.
//!
//! # Derivation
//!
//! ```text
//!   setup ──watch──▶ ready: Observable<bool> ──┐
//!                                              ├─ Computed::from2 ─▶ TranslateFn
//!   engine handle ─▶ Observable<Option<Engine>>┘
//! ```
//!
//! | ready | engine  | exposed function     | state          |
//! |-------|---------|----------------------|----------------|
//! | false | any     | `Identity`           | `Uninitialized`|
//! | true  | absent  | `Identity`           | `Initializing` |
//! | true  | present | `Bound(engine)`      | `Ready`        |
//!
//! `ready` is a latch: the first setup fire sets it and later fires change
//! nothing. An engine that arrives after setup upgrades the function without
//! another setup fire; an engine that arrives before setup is held until it.
//!
//! # Errors
//!
//! The cell has no failure mode of its own. The identity function never
//! fails; the bound function returns whatever the engine returns.

use std::fmt;

use tracing::{debug, warn};
use xlate_i18n::{EngineRef, I18nError, TranslateOptions};
use xlate_reactive::{Computed, Event, Observable, Scope, Subscription};

/// Where the engine comes from.
#[derive(Debug, Clone)]
pub enum EngineHandle {
    /// Known once, at wiring time.
    Static(Option<EngineRef>),
    /// May change over the lifetime of the scope.
    Reactive(Observable<Option<EngineRef>>),
}

impl From<EngineRef> for EngineHandle {
    fn from(engine: EngineRef) -> Self {
        Self::Static(Some(engine))
    }
}

impl From<Option<EngineRef>> for EngineHandle {
    fn from(engine: Option<EngineRef>) -> Self {
        Self::Static(engine)
    }
}

impl From<Observable<Option<EngineRef>>> for EngineHandle {
    fn from(engine: Observable<Option<EngineRef>>) -> Self {
        Self::Reactive(engine)
    }
}

/// The callable exposed by a [`TranslationCell`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateFn {
    /// Returns the key untouched.
    Identity,
    /// Delegates to an engine.
    Bound(EngineRef),
}

impl TranslateFn {
    /// Translate `key` with no extra arguments.
    pub fn call(&self, key: &str) -> Result<String, I18nError> {
        self.call_with(key, &TranslateOptions::default())
    }

    /// Translate `key`, forwarding `options` verbatim.
    pub fn call_with(&self, key: &str, options: &TranslateOptions) -> Result<String, I18nError> {
        match self {
            Self::Identity => Ok(key.to_owned()),
            Self::Bound(engine) => engine.translate(key, options),
        }
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        matches!(self, Self::Bound(_))
    }

    /// The engine behind a bound function.
    #[must_use]
    pub fn engine(&self) -> Option<&EngineRef> {
        match self {
            Self::Identity => None,
            Self::Bound(engine) => Some(engine),
        }
    }
}

/// Lifecycle of a translation cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TranslationState {
    /// Setup has not fired yet.
    Uninitialized,
    /// Setup fired, but no engine is available.
    Initializing,
    /// Setup fired and an engine is bound.
    Ready,
}

impl fmt::Display for TranslationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
        })
    }
}

fn warn_if_foreign(scope: &Scope, owner: Option<&Scope>, input: &'static str) {
    if let Some(owner) = owner
        && !owner.same_scope(scope)
    {
        warn!(
            scope = %scope.id(),
            owner = %owner.id(),
            input,
            "translation cell wired to an input owned by another scope"
        );
    }
}

fn derive(ready: bool, engine: Option<&EngineRef>) -> TranslateFn {
    match (ready, engine) {
        (true, Some(engine)) => TranslateFn::Bound(engine.clone()),
        _ => TranslateFn::Identity,
    }
}

/// Reactive "current translate function" for one scope.
pub struct TranslationCell {
    scope: Scope,
    ready: Observable<bool>,
    engine: Observable<Option<EngineRef>>,
    current: Computed<TranslateFn>,
    _setup_watch: Subscription,
}

impl fmt::Debug for TranslationCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationCell")
            .field("scope", &self.scope.id())
            .field("state", &self.state())
            .field("version", &self.version())
            .finish()
    }
}

impl TranslationCell {
    /// Wire a cell into `scope`.
    ///
    /// The cell starts as the identity function whatever the engine handle
    /// holds, and stays that way until `setup` fires.
    pub fn new(scope: &Scope, engine: impl Into<EngineHandle>, setup: &Event<()>) -> Self {
        let engine = match engine.into() {
            EngineHandle::Static(engine) => scope.observable(engine),
            EngineHandle::Reactive(engine) => {
                warn_if_foreign(scope, engine.scope(), "engine");
                engine
            }
        };
        warn_if_foreign(scope, setup.scope(), "setup event");
        let ready = scope.observable(false);

        let latch = ready.clone();
        let scope_id = scope.id();
        let setup_watch = setup.watch(move |()| {
            if !latch.get() {
                debug!(scope = %scope_id, "translation setup acknowledged");
            }
            latch.set(true);
        });

        let current = Computed::from2(&ready, &engine, move |ready, engine| {
            let next = derive(*ready, engine.as_ref());
            debug!(
                scope = %scope_id,
                ready = *ready,
                bound = next.is_bound(),
                "translation function derived"
            );
            next
        });

        Self {
            scope: scope.clone(),
            ready,
            engine,
            current,
            _setup_watch: setup_watch,
        }
    }

    /// The current translate function.
    #[must_use]
    pub fn get(&self) -> TranslateFn {
        self.current.get()
    }

    /// Translate `key` through the current function.
    pub fn t(&self, key: &str) -> Result<String, I18nError> {
        self.get().call(key)
    }

    /// Translate `key` with pass-through options.
    pub fn t_with(&self, key: &str, options: &TranslateOptions) -> Result<String, I18nError> {
        self.get().call_with(key, options)
    }

    #[must_use]
    pub fn state(&self) -> TranslationState {
        match (self.ready.get(), self.get().is_bound()) {
            (false, _) => TranslationState::Uninitialized,
            (true, false) => TranslationState::Initializing,
            (true, true) => TranslationState::Ready,
        }
    }

    /// True once setup has fired in this scope.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.get()
    }

    /// Called with the new function whenever its variant or engine changes.
    pub fn subscribe(&self, callback: impl Fn(&TranslateFn) + 'static) -> Subscription {
        self.current.subscribe(callback)
    }

    /// Number of derivations so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.current.version()
    }

    /// The engine currently feeding the cell, bound or not.
    ///
    /// A static handle is held privately, so it cannot be changed after
    /// construction.
    #[must_use]
    pub fn engine(&self) -> Option<EngineRef> {
        self.engine.get()
    }

    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }
}
