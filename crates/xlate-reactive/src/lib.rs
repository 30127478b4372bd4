#![forbid(unsafe_code)]

//! Scoped reactive primitives for xlate.
//!
//! Provides the small reactive substrate the translation adapter is built
//! on: value cells that notify on change, payload-carrying events, lazy
//! two-input derivations, and isolated scopes that own the reaction queue.
//!
//! # Role in xlate
//! `xlate-reactive` carries no localization knowledge. `xlate` composes these
//! primitives into the translation-function cell; applications use them to
//! hold their own per-context state.
//!
//! # Isolation
//! There is no process-wide reactive runtime. Every queue lives in a
//! [`Scope`], and every cell created with [`Scope::observable`] or
//! [`Scope::event`] reacts only inside that scope.

pub mod computed;
pub mod event;
pub mod observable;
pub mod scope;
pub mod subscription;

pub use computed::Computed;
pub use event::Event;
pub use observable::Observable;
pub use scope::{Batch, Scope, ScopeId, Settled};
pub use subscription::Subscription;
