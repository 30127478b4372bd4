//! Property-based invariant tests for the translation cell.
//!
//! 1. Without setup, `t(key) == key` for any key and any engine history
//! 2. With setup and no engine, `t(key) == key`
//! 3. With setup and an engine, `t(key)` equals the engine's own answer
//! 4. The exposed function depends only on the final inputs, not on the
//!    order in which setup and engine changes happened
//! 5. Operations on one context never change another context's output

use proptest::prelude::*;
use xlate::{
    EngineRef, I18nError, ResourceCatalog, Translate, TranslateOptions, TranslationContext,
    TranslationState,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn key_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,8}",
        "[a-z]{1,6}:[a-z]{1,6}",
        "[a-z]{1,4}:[a-z]{1,4}\\.[a-z]{1,4}",
        ".{0,24}",
    ]
}

fn suffixing(tag: u8) -> EngineRef {
    EngineRef::new(move |key: &str, _: &TranslateOptions| -> Result<String, I18nError> {
        Ok(format!("{key}#{tag}"))
    })
}

#[derive(Debug, Clone)]
enum Op {
    Setup,
    Engine(Option<u8>),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Setup),
        proptest::option::of(0u8..4).prop_map(Op::Engine),
    ]
}

fn apply(ctx: &TranslationContext, op: &Op) {
    match op {
        Op::Setup => {
            ctx.setup();
        }
        Op::Engine(tag) => {
            ctx.set_engine(tag.map(suffixing));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 1. No setup: identity
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn identity_without_setup(
        key in key_strategy(),
        engines in proptest::collection::vec(proptest::option::of(0u8..4), 0..6),
    ) {
        let ctx = TranslationContext::new("no-setup");
        for tag in engines {
            ctx.set_engine(tag.map(suffixing));
            prop_assert_eq!(ctx.t(&key).unwrap(), key.clone());
        }
        prop_assert_eq!(ctx.state(), TranslationState::Uninitialized);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Setup without engine: identity
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn identity_without_engine(key in key_strategy(), fires in 1usize..4) {
        let ctx = TranslationContext::new("no-engine");
        for _ in 0..fires {
            ctx.setup();
        }
        prop_assert_eq!(ctx.t(&key).unwrap(), key);
        prop_assert_eq!(ctx.state(), TranslationState::Initializing);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Setup with engine: engine's answer
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn bound_matches_engine(
        key in key_strategy(),
        entries in proptest::collection::btree_map("[a-z]{1,6}", "[ -~]{0,12}", 0..6),
    ) {
        let mut catalog = ResourceCatalog::default();
        for (k, v) in &entries {
            catalog.add_resource("en", "common", k, v.clone());
        }
        let direct = catalog.clone();
        let ctx = TranslationContext::with_engine("bound", EngineRef::new(catalog));
        ctx.setup();

        let expected = direct.translate(&key, &TranslateOptions::new()).unwrap();
        prop_assert_eq!(ctx.t(&key).unwrap(), expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Final inputs decide the function
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn result_depends_only_on_final_inputs(
        ops in proptest::collection::vec(op_strategy(), 0..12),
        key in "[a-z]{1,8}",
    ) {
        let ctx = TranslationContext::new("ops");
        let mut ready = false;
        let mut engine = None;
        for op in &ops {
            apply(&ctx, op);
            match op {
                Op::Setup => ready = true,
                Op::Engine(tag) => engine = *tag,
            }
            let expected = match (ready, engine) {
                (true, Some(tag)) => format!("{key}#{tag}"),
                _ => key.clone(),
            };
            prop_assert_eq!(ctx.t(&key).unwrap(), expected);
        }
        prop_assert_eq!(ctx.scope().pending_count(), 0);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Contexts are isolated
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn contexts_do_not_interfere(
        ops_a in proptest::collection::vec(op_strategy(), 0..8),
        ops_b in proptest::collection::vec(op_strategy(), 0..8),
        key in "[a-z]{1,8}",
    ) {
        let a = TranslationContext::new("a");
        let b = TranslationContext::new("b");
        for op in &ops_a {
            apply(&a, op);
        }
        let a_before = a.t(&key).unwrap();

        for op in &ops_b {
            apply(&b, op);
        }
        prop_assert_eq!(a.t(&key).unwrap(), a_before);

        let solo = TranslationContext::new("solo");
        for op in &ops_b {
            apply(&solo, op);
        }
        prop_assert_eq!(b.t(&key).unwrap(), solo.t(&key).unwrap());
    }
}
