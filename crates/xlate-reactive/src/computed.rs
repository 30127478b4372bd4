#![forbid(unsafe_code)]

//! Lazy, memoized derivations over observable sources.
//!
//! A [`Computed<T>`] subscribes to its sources and marks itself dirty when
//! one of them notifies. Reads also compare a stamp built from the source
//! versions, so a read inside a scope batch (before any deferred
//! notification has run) still reflects the latest source values and never
//! an intermediate state.
//!
//! Once a computed has subscribers of its own it becomes eager: each source
//! notification recomputes immediately and subscribers hear about it only
//! when the result differs from the last value they were given.
//!
//! # Invariants
//!
//! 1. Nothing is computed before the first read or first subscriber.
//! 2. Repeated reads without a source change never recompute.
//! 3. `version` counts recomputations.
//! 4. A computed outlives its sources and keeps its last value.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::observable::Observable;
use crate::subscription::Subscription;

type ComputeFn<T> = Rc<dyn Fn() -> T>;
type StampFn = Rc<dyn Fn() -> u64>;
type CallbackRc<T> = Rc<dyn Fn(&T)>;
type CallbackWeak<T> = Weak<dyn Fn(&T)>;

struct ComputedInner<T> {
    value: Option<T>,
    delivered: Option<T>,
    dirty: bool,
    stamp: u64,
    version: u64,
    compute: ComputeFn<T>,
    source_stamp: StampFn,
    subscribers: Vec<CallbackWeak<T>>,
    sources: Vec<Subscription>,
}

/// A derived value recomputed from one or two observables.
pub struct Computed<T> {
    inner: Rc<RefCell<ComputedInner<T>>>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Computed")
            .field("value", &inner.value)
            .field("dirty", &inner.dirty)
            .field("stamp", &inner.stamp)
            .field("version", &inner.version)
            .field("sources", &inner.sources.len())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Computed<T> {
    /// Derive from a single observable.
    pub fn from_observable<S>(source: &Observable<S>, f: impl Fn(&S) -> T + 'static) -> Self
    where
        S: Clone + PartialEq + 'static,
    {
        let src = source.clone();
        let stamp_src = source.clone();
        let computed = Self::with_compute(
            Rc::new(move || src.with(|s| f(s))),
            Rc::new(move || stamp_src.version()),
        );
        computed.track(source);
        computed
    }

    /// Derive from two observables; recomputes when either changes.
    pub fn from2<A, B>(a: &Observable<A>, b: &Observable<B>, f: impl Fn(&A, &B) -> T + 'static) -> Self
    where
        A: Clone + PartialEq + 'static,
        B: Clone + PartialEq + 'static,
    {
        let (sa, sb) = (a.clone(), b.clone());
        let (va, vb) = (a.clone(), b.clone());
        let computed = Self::with_compute(
            Rc::new(move || sa.with(|x| sb.with(|y| f(x, y)))),
            Rc::new(move || va.version().wrapping_add(vb.version())),
        );
        computed.track(a);
        computed.track(b);
        computed
    }

    fn with_compute(compute: ComputeFn<T>, source_stamp: StampFn) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ComputedInner {
                value: None,
                delivered: None,
                dirty: true,
                stamp: 0,
                version: 0,
                compute,
                source_stamp,
                subscribers: Vec::new(),
                sources: Vec::new(),
            })),
        }
    }

    fn track<S: Clone + PartialEq + 'static>(&self, source: &Observable<S>) {
        let weak = Rc::downgrade(&self.inner);
        let guard = source.subscribe(move |_| {
            if let Some(inner) = weak.upgrade() {
                Computed { inner }.mark_dirty();
            }
        });
        self.inner.borrow_mut().sources.push(guard);
    }

    /// Current value, recomputing first if a source changed.
    #[must_use]
    pub fn get(&self) -> T {
        if let Some(value) = self.fresh_value() {
            return value;
        }
        self.recompute()
    }

    /// Apply `f` to the current value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.get())
    }

    /// Number of recomputations so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// True when the next read will recompute.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        let (dirty, stamp, source_stamp) = {
            let inner = self.inner.borrow();
            (inner.dirty, inner.stamp, Rc::clone(&inner.source_stamp))
        };
        dirty || source_stamp() != stamp
    }

    /// Force a recompute on the next read (or now, if subscribed).
    pub fn invalidate(&self) {
        self.mark_dirty();
    }

    /// Register `callback` for changes of the derived value.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let current = self.get();
        let strong: CallbackRc<T> = Rc::new(callback);
        let mut inner = self.inner.borrow_mut();
        inner.subscribers.retain(|w| w.strong_count() > 0);
        if inner.subscribers.is_empty() {
            inner.delivered = Some(current);
        }
        inner.subscribers.push(Rc::downgrade(&strong));
        Subscription::new(strong)
    }

    fn fresh_value(&self) -> Option<T> {
        if self.is_dirty() {
            return None;
        }
        self.inner.borrow().value.clone()
    }

    fn recompute(&self) -> T {
        let (compute, source_stamp) = {
            let inner = self.inner.borrow();
            (Rc::clone(&inner.compute), Rc::clone(&inner.source_stamp))
        };
        let next = compute();
        let stamp = source_stamp();
        let mut inner = self.inner.borrow_mut();
        inner.value = Some(next.clone());
        inner.stamp = stamp;
        inner.dirty = false;
        inner.version += 1;
        next
    }

    fn mark_dirty(&self) {
        let callbacks: Vec<CallbackRc<T>> = {
            let mut inner = self.inner.borrow_mut();
            inner.dirty = true;
            inner.subscribers.retain(|w| w.strong_count() > 0);
            inner.subscribers.iter().filter_map(Weak::upgrade).collect()
        };
        if callbacks.is_empty() {
            return;
        }
        let value = self.recompute();
        {
            let mut inner = self.inner.borrow_mut();
            if inner.delivered.as_ref() == Some(&value) {
                return;
            }
            inner.delivered = Some(value.clone());
        }
        for cb in &callbacks {
            cb(&value);
        }
    }
}
