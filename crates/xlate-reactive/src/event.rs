#![forbid(unsafe_code)]

//! Payload-carrying triggers.
//!
//! An [`Event<P>`] holds no value of its own; firing it hands the payload
//! to every live watcher. A zero-payload `Event<()>` models signals such as
//! "bootstrap complete". Unlike observable notifications, deliveries are
//! never coalesced: firing twice runs every watcher twice.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::scope::Scope;
use crate::subscription::Subscription;

type WatcherRc<P> = Rc<dyn Fn(&P)>;
type WatcherWeak<P> = Weak<dyn Fn(&P)>;

struct EventInner<P> {
    watchers: Vec<WatcherWeak<P>>,
    fired: u64,
}

/// A trigger that forwards its payload to watchers.
pub struct Event<P> {
    inner: Rc<RefCell<EventInner<P>>>,
    scope: Option<Scope>,
}

impl<P> Clone for Event<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            scope: self.scope.clone(),
        }
    }
}

impl<P> fmt::Debug for Event<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Event")
            .field("fired", &inner.fired)
            .field("watchers", &inner.watchers.len())
            .field("scope", &self.scope.as_ref().map(Scope::id))
            .finish()
    }
}

impl<P: Clone + 'static> Default for Event<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Clone + 'static> Event<P> {
    /// Detached event; watchers run inside `fire`.
    #[must_use]
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Event whose deliveries are queued on `scope`.
    #[must_use]
    pub fn new_in(scope: &Scope) -> Self {
        Self::build(Some(scope.clone()))
    }

    fn build(scope: Option<Scope>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(EventInner {
                watchers: Vec::new(),
                fired: 0,
            })),
            scope,
        }
    }

    /// Run `watcher` on every future fire.
    pub fn watch(&self, watcher: impl Fn(&P) + 'static) -> Subscription {
        let strong: WatcherRc<P> = Rc::new(watcher);
        self.inner.borrow_mut().watchers.push(Rc::downgrade(&strong));
        Subscription::new(strong)
    }

    /// Deliver `payload` to every live watcher.
    ///
    /// Prefer [`Scope::launch`] for scoped events: it also settles the
    /// reactions the delivery causes before returning.
    pub fn fire(&self, payload: P) {
        let watchers: Vec<WatcherRc<P>> = {
            let mut inner = self.inner.borrow_mut();
            inner.fired += 1;
            inner.watchers.retain(|w| w.strong_count() > 0);
            inner.watchers.iter().filter_map(Weak::upgrade).collect()
        };
        trace!(watchers = watchers.len(), "event.fire");

        match self.scope.as_ref() {
            Some(scope) => {
                for watcher in watchers {
                    let payload = payload.clone();
                    scope.dispatch(move || watcher(&payload));
                }
            }
            None => {
                for watcher in &watchers {
                    watcher(&payload);
                }
            }
        }
    }

    /// How many times the event has fired.
    #[must_use]
    pub fn fire_count(&self) -> u64 {
        self.inner.borrow().fired
    }

    #[must_use]
    pub fn watcher_count(&self) -> usize {
        self.inner.borrow().watchers.len()
    }

    #[must_use]
    pub fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }
}
