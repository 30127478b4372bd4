#![forbid(unsafe_code)]

//! Observable value cell with change notification and version tracking.
//!
//! # Design
//!
//! [`Observable<T>`] keeps its value in shared, reference-counted storage.
//! A change (decided by `PartialEq`) bumps the version and notifies every
//! live subscriber in registration order.
//!
//! A cell is either *detached* ([`Observable::new`]), in which case
//! subscribers run synchronously inside `set`, or *scoped*
//! ([`Observable::new_in`]), in which case each subscriber becomes a keyed
//! reaction on the owning [`Scope`]'s settle queue. Keyed reactions coalesce,
//! so a burst of writes inside one batch reaches each subscriber once, with
//! the final value.
//!
//! # Invariants
//!
//! 1. `version` increments by exactly 1 on each value-changing mutation.
//! 2. `set(v)` where `v == current` is a no-op.
//! 3. Subscribers are notified in registration order.
//! 4. A deferred notification delivers the value current at delivery time.
//!
//! # Failure Modes
//!
//! - **Re-entrant write from `with`**: mutating the cell from inside a
//!   [`Observable::with`] closure panics (`RefCell` borrow rules). Writing
//!   from a subscriber callback is fine; no borrow is held while callbacks
//!   run.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::scope::Scope;
use crate::subscription::Subscription;

type CallbackRc<T> = Rc<dyn Fn(&T)>;
type CallbackWeak<T> = Weak<dyn Fn(&T)>;

struct ObservableInner<T> {
    value: T,
    version: u64,
    subscribers: Vec<CallbackWeak<T>>,
}

/// A shared, version-tracked value with change notification.
///
/// Cloning an `Observable` yields a new handle to the same cell.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
    scope: Option<Scope>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            scope: self.scope.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscriber_count", &inner.subscribers.len())
            .field("scope", &self.scope.as_ref().map(Scope::id))
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create a detached observable. Subscribers run synchronously.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self::build(value, None)
    }

    /// Create an observable whose notifications go through `scope`.
    #[must_use]
    pub fn new_in(scope: &Scope, value: T) -> Self {
        Self::build(value, Some(scope.clone()))
    }

    fn build(value: T, scope: Option<Scope>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
            scope,
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Borrow the current value without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replace the value, notifying subscribers if it changed.
    pub fn set(&self, value: T) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.value = value;
            inner.version += 1;
        }
        self.notify();
    }

    /// Mutate the value in place, notifying subscribers if it changed.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let changed = {
            let mut inner = self.inner.borrow_mut();
            let before = inner.value.clone();
            f(&mut inner.value);
            if inner.value == before {
                false
            } else {
                inner.version += 1;
                true
            }
        };
        if changed {
            self.notify();
        }
    }

    /// Register `callback` for future changes.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: CallbackRc<T> = Rc::new(callback);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&strong));
        Subscription::new(strong)
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Registered subscribers, including dropped ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Owning scope, if any.
    #[must_use]
    pub fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    /// True when both handles refer to the same cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn notify(&self) {
        let callbacks: Vec<CallbackRc<T>> = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.retain(|w| w.strong_count() > 0);
            inner.subscribers.iter().filter_map(Weak::upgrade).collect()
        };
        if callbacks.is_empty() {
            return;
        }

        let Some(scope) = self.scope.as_ref() else {
            let value = self.get();
            trace!(subscribers = callbacks.len(), "observable.notify");
            for cb in &callbacks {
                cb(&value);
            }
            return;
        };

        trace!(
            scope = %scope.id(),
            subscribers = callbacks.len(),
            "observable.notify deferred"
        );
        for cb in callbacks {
            let key = Rc::as_ptr(&cb) as *const () as usize;
            let source = self.clone();
            scope.dispatch_keyed(key, move || {
                let latest = source.get();
                cb(&latest);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn get_set_basic() {
        let obs = Observable::new(42);
        assert_eq!(obs.get(), 42);
        assert_eq!(obs.version(), 0);

        obs.set(99);
        assert_eq!(obs.get(), 99);
        assert_eq!(obs.version(), 1);
    }

    #[test]
    fn equal_value_is_noop() {
        let obs = Observable::new(Some("en"));
        let hits = Rc::new(Cell::new(0u32));
        let h = Rc::clone(&hits);
        let _sub = obs.subscribe(move |_| h.set(h.get() + 1));

        obs.set(Some("en"));
        assert_eq!(obs.version(), 0);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn update_mutates_in_place() {
        let obs = Observable::new(vec!["common".to_string()]);
        obs.update(|v| v.push("errors".to_string()));
        assert_eq!(obs.get().len(), 2);
        assert_eq!(obs.version(), 1);

        obs.update(|_| {});
        assert_eq!(obs.version(), 1);
    }

    #[test]
    fn detached_subscribers_run_synchronously_in_order() {
        let obs = Observable::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));
        let l1 = Rc::clone(&log);
        let _a = obs.subscribe(move |v| l1.borrow_mut().push(('a', *v)));
        let l2 = Rc::clone(&log);
        let _b = obs.subscribe(move |v| l2.borrow_mut().push(('b', *v)));

        obs.set(5);
        assert_eq!(*log.borrow(), vec![('a', 5), ('b', 5)]);
    }

    #[test]
    fn dropping_subscription_stops_delivery_and_prunes() {
        let obs = Observable::new(0);
        let hits = Rc::new(Cell::new(0u32));
        let h = Rc::clone(&hits);
        let sub = obs.subscribe(move |_| h.set(h.get() + 1));
        let _keep = obs.subscribe(|_| {});

        obs.set(1);
        drop(sub);
        assert_eq!(obs.subscriber_count(), 2);

        obs.set(2);
        assert_eq!(hits.get(), 1);
        assert_eq!(obs.subscriber_count(), 1);
    }

    #[test]
    fn scoped_notifications_coalesce_inside_batch() {
        let scope = Scope::new("obs");
        let obs = scope.observable(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = obs.subscribe(move |v| s.borrow_mut().push(*v));

        {
            let _batch = scope.batch();
            obs.set(1);
            obs.set(2);
            obs.update(|v| *v += 1);
            assert!(seen.borrow().is_empty());
            assert_eq!(obs.get(), 3, "reads see writes immediately");
        }
        assert_eq!(*seen.borrow(), vec![3]);
        assert_eq!(obs.version(), 3);
    }

    #[test]
    fn scoped_subscriber_may_write_back() {
        let scope = Scope::new("write-back");
        let source = scope.observable(1);
        let mirror = scope.observable(0);
        let m = mirror.clone();
        let _sub = source.subscribe(move |v| m.set(*v * 10));

        source.set(4);
        assert_eq!(mirror.get(), 40);
    }

    #[test]
    fn clone_shares_cell() {
        let a = Observable::new(0);
        let b = a.clone();
        b.set(3);
        assert_eq!(a.get(), 3);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&Observable::new(3)));
    }

    #[test]
    fn debug_format() {
        let obs = Observable::new(42);
        let dbg = format!("{obs:?}");
        assert!(dbg.contains("Observable"));
        assert!(dbg.contains("42"));
        assert!(dbg.contains("version"));
    }
}
