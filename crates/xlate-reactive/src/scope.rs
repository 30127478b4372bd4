#![forbid(unsafe_code)]

//! Isolated execution contexts with a run-to-completion settle queue.
//!
//! A [`Scope`] is the unit of isolation for reactive state. Cells and events
//! created inside a scope route every reaction they trigger through that
//! scope's queue, and nothing else. Two scopes never share a queue, so two
//! concurrently live contexts (one per request, one per test case) cannot
//! observe each other's reactions.
//!
//! # Settling
//!
//! Reactions are drained in FIFO order. A reaction that triggers further
//! reactions appends them to the same queue; they run in the same settle
//! pass, after everything already queued. [`Scope::launch`] fires an event
//! and returns only once the queue is empty, so callers observe the fully
//! settled state.
//!
//! # Invariants
//!
//! 1. Only the outermost [`Batch`] guard drains the queue.
//! 2. A keyed reaction that is still pending is replaced in place, so a
//!    subscriber runs at most once per settle pass for a burst of changes.
//! 3. Unkeyed reactions (event deliveries) are never coalesced.
//!
//! # Failure Modes
//!
//! - **Panicking reaction**: the remaining reactions still run, the queue is
//!   left idle, and the first panic is re-raised once the pass completes.
//! - **Panicking batch body**: the guard still drains on unwind. The body's
//!   panic propagates; a reaction panic during that drain is logged and
//!   dropped.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug_span, field, warn};
use web_time::Instant;

use crate::event::Event;
use crate::observable::Observable;

type Reaction = Box<dyn FnOnce()>;

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier of a [`Scope`], unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u64);

impl ScopeId {
    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

struct QueuedReaction {
    key: Option<usize>,
    run: Reaction,
}

struct SettleQueue {
    pending: VecDeque<QueuedReaction>,
    draining: bool,
    batch_depth: u32,
    reactions_run: u64,
}

struct ScopeInner {
    id: ScopeId,
    label: String,
    queue: RefCell<SettleQueue>,
}

/// Outcome of a settle pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Settled {
    /// Number of reactions that ran before the queue went idle.
    pub reactions: u64,
}

/// An isolated reactive execution context.
///
/// Cloning a `Scope` yields another handle to the same context.
#[derive(Clone)]
pub struct Scope {
    inner: Rc<ScopeInner>,
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = self.inner.queue.borrow();
        f.debug_struct("Scope")
            .field("id", &self.inner.id)
            .field("label", &self.inner.label)
            .field("pending", &queue.pending.len())
            .field("reactions_run", &queue.reactions_run)
            .finish()
    }
}

impl Scope {
    /// Create a fresh, empty scope.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        let id = ScopeId(NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed));
        Self {
            inner: Rc::new(ScopeInner {
                id,
                label: label.into(),
                queue: RefCell::new(SettleQueue {
                    pending: VecDeque::new(),
                    draining: false,
                    batch_depth: 0,
                    reactions_run: 0,
                }),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> ScopeId {
        self.inner.id
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// True when both handles refer to the same context.
    #[must_use]
    pub fn same_scope(&self, other: &Scope) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Create an observable owned by this scope.
    #[must_use]
    pub fn observable<T: Clone + PartialEq + 'static>(&self, value: T) -> Observable<T> {
        Observable::new_in(self, value)
    }

    /// Create an event owned by this scope.
    #[must_use]
    pub fn event<P: Clone + 'static>(&self) -> Event<P> {
        Event::new_in(self)
    }

    /// Defer draining until the returned guard (and any enclosing guard)
    /// is dropped.
    #[must_use]
    pub fn batch(&self) -> Batch {
        self.inner.queue.borrow_mut().batch_depth += 1;
        Batch {
            scope: self.clone(),
        }
    }

    /// Fire `event` with `payload` and settle every reaction it causes.
    ///
    /// When called from inside a reaction of this scope, the new reactions
    /// join the pass already in progress and the returned count covers only
    /// what ran before this call returned.
    pub fn launch<P: Clone + 'static>(&self, event: &Event<P>, payload: P) -> Settled {
        if let Some(owner) = event.scope()
            && !owner.same_scope(self)
        {
            warn!(
                scope = %self.inner.id,
                owner = %owner.id(),
                "launching an event owned by another scope"
            );
        }
        self.run(|| event.fire(payload))
    }

    /// Run `f` inside a batch, then settle everything it queued.
    pub fn run(&self, f: impl FnOnce()) -> Settled {
        let before = self.reactions_run();
        {
            let _batch = self.batch();
            f();
        }
        Settled {
            reactions: self.reactions_run() - before,
        }
    }

    /// Drain anything still pending.
    pub fn settle(&self) -> Settled {
        let before = self.reactions_run();
        self.drain();
        Settled {
            reactions: self.reactions_run() - before,
        }
    }

    /// Number of reactions waiting in the queue.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.queue.borrow().pending.len()
    }

    /// Total reactions run by this scope since creation.
    #[must_use]
    pub fn reactions_run(&self) -> u64 {
        self.inner.queue.borrow().reactions_run
    }

    /// Queue a reaction that is never coalesced.
    pub(crate) fn dispatch(&self, run: impl FnOnce() + 'static) {
        self.inner.queue.borrow_mut().pending.push_back(QueuedReaction {
            key: None,
            run: Box::new(run),
        });
        self.drain();
    }

    /// Queue a reaction keyed by `key`. A pending reaction with the same key
    /// is replaced but keeps its position.
    pub(crate) fn dispatch_keyed(&self, key: usize, run: impl FnOnce() + 'static) {
        {
            let mut queue = self.inner.queue.borrow_mut();
            if let Some(entry) = queue
                .pending
                .iter_mut()
                .find(|entry| entry.key == Some(key))
            {
                entry.run = Box::new(run);
            } else {
                queue.pending.push_back(QueuedReaction {
                    key: Some(key),
                    run: Box::new(run),
                });
            }
        }
        self.drain();
    }

    fn drain(&self) {
        {
            let mut queue = self.inner.queue.borrow_mut();
            if queue.draining || queue.batch_depth > 0 || queue.pending.is_empty() {
                return;
            }
            queue.draining = true;
        }

        let started = Instant::now();
        let span = debug_span!(
            "scope.settle",
            scope = %self.inner.id,
            label = %self.inner.label,
            reactions = field::Empty,
            duration_us = field::Empty
        );
        let _entered = span.enter();

        let mut ran = 0_u64;
        let mut first_panic: Option<Box<dyn std::any::Any + Send>> = None;
        loop {
            let next = {
                let mut queue = self.inner.queue.borrow_mut();
                let next = queue.pending.pop_front();
                if next.is_some() {
                    queue.reactions_run += 1;
                }
                next
            };
            let Some(reaction) = next else {
                break;
            };
            ran += 1;
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(reaction.run));
            if let Err(payload) = result
                && first_panic.is_none()
            {
                first_panic = Some(payload);
            }
        }

        self.inner.queue.borrow_mut().draining = false;
        span.record("reactions", ran);
        span.record("duration_us", started.elapsed().as_micros() as u64);

        if let Some(payload) = first_panic {
            // Draining from a `Batch` dropped during unwinding: re-raising
            // here would abort the process.
            if std::thread::panicking() {
                warn!(
                    scope = %self.inner.id,
                    "reaction panicked while the scope was already unwinding"
                );
                return;
            }
            std::panic::resume_unwind(payload);
        }
    }
}

/// RAII guard returned by [`Scope::batch`].
pub struct Batch {
    scope: Scope,
}

impl Batch {
    /// Reactions queued so far in the guarded scope.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.scope.pending_count()
    }
}

impl fmt::Debug for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Batch")
            .field("scope", &self.scope.id())
            .field("pending", &self.pending_count())
            .finish()
    }
}

impl Drop for Batch {
    fn drop(&mut self) {
        let outermost = {
            let mut queue = self.scope.inner.queue.borrow_mut();
            queue.batch_depth = queue.batch_depth.saturating_sub(1);
            queue.batch_depth == 0
        };
        if outermost {
            self.scope.drain();
        }
    }
}
