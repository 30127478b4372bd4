#![forbid(unsafe_code)]

//! E2E tests for scoped reactive state.
//!
//! 1. `settle` – launch runs every downstream reaction before returning
//! 2. `batching` – nested batches coalesce keyed reactions
//! 3. `isolation` – two scopes never share queued work
//! 4. `lifecycle` – dropped subscriptions stop reacting
//! 5. `logging` – cross-scope launches are reported
//!
//! Run:
//!   cargo test -p xlate-reactive --test scope_isolation_e2e

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use xlate_reactive::{Computed, Event, Observable, Scope};

// =========================================================================
// 1. Settle
// =========================================================================

mod settle {
    use super::*;

    #[test]
    fn launch_settles_event_chain() {
        let scope = Scope::new("chain");
        let start: Event<u32> = scope.event();
        let middle = scope.observable(0_u32);
        let last = Computed::from_observable(&middle, |v| v * 10);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let m = middle.clone();
        let _w = start.watch(move |n| m.set(*n));
        let s = Rc::clone(&seen);
        let _sub = last.subscribe(move |v| s.borrow_mut().push(*v));

        let settled = scope.launch(&start, 4);
        assert!(settled.reactions >= 2);
        assert_eq!(scope.pending_count(), 0);
        assert_eq!(last.get(), 40);
        assert_eq!(*seen.borrow(), vec![40]);
    }

    #[test]
    fn reactions_queued_during_settle_run_in_same_pass() {
        let scope = Scope::new("cascade");
        let a = scope.observable(0);
        let b = scope.observable(0);
        let order = Rc::new(RefCell::new(Vec::new()));

        let (bb, o) = (b.clone(), Rc::clone(&order));
        let _sa = a.subscribe(move |v| {
            o.borrow_mut().push(format!("a={v}"));
            bb.set(v + 1);
        });
        let o = Rc::clone(&order);
        let _sb = b.subscribe(move |v| o.borrow_mut().push(format!("b={v}")));

        let settled = scope.run(|| a.set(1));
        assert_eq!(settled.reactions, 2);
        assert_eq!(*order.borrow(), vec!["a=1", "b=2"]);
    }
}

// =========================================================================
// 2. Batching
// =========================================================================

mod batching {
    use super::*;

    #[test]
    fn burst_inside_batch_notifies_once_with_latest() {
        let scope = Scope::new("burst");
        let value = scope.observable(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = value.subscribe(move |v| s.borrow_mut().push(*v));

        {
            let outer = scope.batch();
            for i in 1..=5 {
                value.set(i);
            }
            {
                let _inner = scope.batch();
                value.set(6);
            }
            assert_eq!(outer.pending_count(), 1);
            assert!(seen.borrow().is_empty());
        }

        assert_eq!(*seen.borrow(), vec![6]);
    }

    #[test]
    fn event_deliveries_are_not_coalesced() {
        let scope = Scope::new("events");
        let ping: Event<u8> = scope.event();
        let got = Rc::new(RefCell::new(Vec::new()));
        let g = Rc::clone(&got);
        let _w = ping.watch(move |p| g.borrow_mut().push(*p));

        let settled = scope.run(|| {
            ping.fire(1);
            ping.fire(2);
            ping.fire(3);
        });

        assert_eq!(settled.reactions, 3);
        assert_eq!(*got.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn two_input_derivation_sees_no_torn_state() {
        let scope = Scope::new("torn");
        let first = scope.observable(String::from("Ada"));
        let last = scope.observable(String::from("Lovelace"));
        let full = Computed::from2(&first, &last, |f, l| format!("{f} {l}"));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = full.subscribe(move |v| s.borrow_mut().push(v.clone()));

        scope.run(|| {
            first.set("Grace".into());
            last.set("Hopper".into());
        });

        assert_eq!(*seen.borrow(), vec!["Grace Hopper".to_string()]);
    }
}

// =========================================================================
// 3. Isolation
// =========================================================================

mod isolation {
    use super::*;

    #[test]
    fn batch_in_one_scope_does_not_hold_another() {
        let a = Scope::new("a");
        let b = Scope::new("b");
        let in_b = b.observable(0);
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = in_b.subscribe(move |_| h.set(h.get() + 1));

        let _held = a.batch();
        in_b.set(1);

        assert_eq!(hits.get(), 1);
        assert_eq!(a.pending_count(), 0);
        assert_eq!(b.reactions_run(), 1);
    }

    #[test]
    fn same_shape_in_two_scopes_stays_separate() {
        let build = |label: &str| {
            let scope = Scope::new(label);
            let setup: Event<()> = scope.event();
            let ready = scope.observable(false);
            let r = ready.clone();
            let watch = setup.watch(move |()| r.set(true));
            (scope, setup, ready, watch)
        };
        let (sa, setup_a, ready_a, _wa) = build("a");
        let (sb, _setup_b, ready_b, _wb) = build("b");

        sa.launch(&setup_a, ());

        assert!(ready_a.get());
        assert!(!ready_b.get());
        assert_eq!(sb.reactions_run(), 0);
        assert!(!sa.same_scope(&sb));
        assert!(sa.same_scope(&sa.clone()));
    }
}

// =========================================================================
// 4. Lifecycle
// =========================================================================

mod lifecycle {
    use super::*;

    #[test]
    fn dropped_subscription_stops_reacting() {
        let scope = Scope::new("drop");
        let value = scope.observable(0);
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let sub = value.subscribe(move |_| h.set(h.get() + 1));

        value.set(1);
        drop(sub);
        value.set(2);

        assert_eq!(hits.get(), 1);
        assert_eq!(value.subscriber_count(), 0);
    }

    #[test]
    fn computed_outlives_dropped_handles_to_its_source() {
        let scope = Scope::new("outlive");
        let source = scope.observable(2);
        let doubled = Computed::from_observable(&source, |v| v * 2);
        let writer = source.clone();
        drop(source);
        writer.set(5);
        assert_eq!(doubled.get(), 10);
    }

    #[test]
    fn detached_cells_react_immediately() {
        let value = Observable::new(1);
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = value.subscribe(move |_| h.set(h.get() + 1));
        value.set(2);
        assert_eq!(hits.get(), 1);
        assert!(value.scope().is_none());
    }
}

// =========================================================================
// 5. Logging
// =========================================================================

mod logging {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Default, Clone)]
    struct Messages(Arc<Mutex<Vec<(tracing::Level, String)>>>);

    struct MessageVisitor<'a>(&'a mut String);

    impl tracing::field::Visit for MessageVisitor<'_> {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                *self.0 = format!("{value:?}");
            }
        }
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for Messages {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
            let mut message = String::new();
            event.record(&mut MessageVisitor(&mut message));
            self.0
                .lock()
                .unwrap()
                .push((*event.metadata().level(), message));
        }
    }

    #[test]
    fn launching_foreign_event_warns() {
        let messages = Messages::default();
        let subscriber = tracing_subscriber::registry().with(messages.clone());

        tracing::subscriber::with_default(subscriber, || {
            let home = Scope::new("home");
            let away = Scope::new("away");
            let foreign: Event<()> = away.event();
            let fired = Rc::new(Cell::new(false));
            let f = Rc::clone(&fired);
            let _w = foreign.watch(move |()| f.set(true));
            home.launch(&foreign, ());
            assert!(fired.get());
        });

        let warnings: Vec<_> = messages
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|(level, _)| *level == tracing::Level::WARN)
            .map(|(_, m)| m.clone())
            .collect();
        assert_eq!(warnings, vec!["launching an event owned by another scope".to_string()]);
    }
}
