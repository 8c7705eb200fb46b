//! Determinism lock: repeated discovery of the same suite yields identical
//! plans, and the optional double pass rejects a body whose checkpoint
//! calls drift between passes.

use std::cell::Cell;
use std::rc::Rc;

use checkpoint_harness::collect::{collect, CollectionError};
use checkpoint_harness::config::HarnessConfig;
use checkpoint_harness::fixtures::FixtureRegistry;
use checkpoint_harness::runner::run_suite;
use checkpoint_harness::suite::{Suite, TestDef};
use checkpoint_harness::suites::sample;
use checkpoint_kernel::checkpoint::registry::{CheckpointCall, Tag};
use checkpoint_kernel::generate::{DiscoveryConfig, DiscoveryError};
use checkpoint_kernel::inputs::graph::CHECKPOINTS_INPUT;
use lock_tests::init_tracing;

const N: usize = 10;

fn verifying() -> HarnessConfig {
    HarnessConfig {
        discovery: DiscoveryConfig {
            verify_determinism: Some(true),
            ..DiscoveryConfig::default()
        },
        ..HarnessConfig::default()
    }
}

#[test]
fn repeated_collection_is_identical() {
    init_tracing();
    let suite = sample::suite();
    let baseline = collect(&suite, &HarnessConfig::default());
    assert!(!baseline.plan_digests.is_empty());

    for run in 1..N {
        let again = collect(&suite, &HarnessConfig::default());
        assert_eq!(again.plan_digests, baseline.plan_digests, "run {run}");
        assert_eq!(again.cases, baseline.cases, "run {run}");
    }
}

#[test]
fn repeated_reports_are_identical() {
    init_tracing();
    let baseline = run_suite(&sample::suite(), &HarnessConfig::default())
        .to_canonical_json()
        .unwrap();
    for run in 1..N {
        let again = run_suite(&sample::suite(), &HarnessConfig::default())
            .to_canonical_json()
            .unwrap();
        assert_eq!(again, baseline, "run {run}");
    }
}

#[test]
fn plan_digest_covers_ids_and_tags() {
    let suite_with = |tag: Tag| {
        let mut suite = Suite::new(FixtureRegistry::new());
        suite.add(TestDef::new("t", &[CHECKPOINTS_INPUT], move |inputs| {
            let step = inputs.checkpoints()?.wrap(|_| Ok(()));
            step.call(CheckpointCall::new().id("only").tag(tag.clone()))?;
            Ok(())
        }));
        suite
    };
    let a = collect(&suite_with(Tag::label("fast")), &HarnessConfig::default());
    let b = collect(&suite_with(Tag::label("slow")), &HarnessConfig::default());
    assert_ne!(a.plan_digests["t"], b.plan_digests["t"]);
}

#[test]
fn verification_accepts_deterministic_suite() {
    init_tracing();
    let collection = collect(&sample::suite(), &verifying());
    assert!(collection.errors.is_empty(), "{:?}", collection.errors);
    assert_eq!(
        collection.plan_digests,
        collect(&sample::suite(), &HarnessConfig::default()).plan_digests
    );
}

#[test]
fn verification_rejects_drifting_body() {
    init_tracing();
    let runs = Rc::new(Cell::new(0_usize));
    let r = Rc::clone(&runs);
    let mut suite = Suite::new(FixtureRegistry::new());
    suite.add(TestDef::new("drifts", &[CHECKPOINTS_INPUT], move |inputs| {
        r.set(r.get() + 1);
        let step = inputs.checkpoints()?.wrap(|_| Ok(()));
        for _ in 0..r.get() {
            step.check()?;
        }
        Ok(())
    }));

    // Without verification the drift goes unnoticed.
    let unchecked = collect(&suite, &HarnessConfig::default());
    assert!(unchecked.errors.is_empty());

    let checked = collect(&suite, &verifying());
    assert!(checked.cases.is_empty());
    assert!(matches!(
        checked.errors.as_slice(),
        [CollectionError::Discovery(DiscoveryError::NonDeterministic { test_name, .. })]
            if test_name == "drifts"
    ));
}
