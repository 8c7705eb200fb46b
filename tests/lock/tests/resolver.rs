//! Resolver lock: unrelated inputs are never computed during discovery,
//! the recorder is threaded through every input that reaches it, and
//! failures in mixed inputs surface as collection errors.

use std::cell::RefCell;
use std::rc::Rc;

use checkpoint_harness::collect::{collect, CollectionError};
use checkpoint_harness::config::HarnessConfig;
use checkpoint_harness::fixtures::FixtureRegistry;
use checkpoint_harness::runner::run_suite;
use checkpoint_harness::suite::{Suite, TestDef};
use checkpoint_kernel::checkpoint::discovery::DiscoveryRecorder;
use checkpoint_kernel::checkpoint::registry::{Checkpoint, Checkpoints};
use checkpoint_kernel::error::Failure;
use checkpoint_kernel::generate::{DiscoveryConfig, DiscoveryError};
use checkpoint_kernel::inputs::graph::{graph_of, InputDef, CHECKPOINTS_INPUT};
use checkpoint_kernel::inputs::resolve::{Resolved, Resolver};
use checkpoint_kernel::value::Value;
use lock_tests::init_tracing;
use lock_tests::event_log::EventLog;

fn counted(log: &EventLog, name: &str, deps: &[&str]) -> InputDef {
    let p = log.clone();
    let event = name.to_string();
    InputDef::new(name, deps, move |_| {
        p.hit(event.clone());
        Ok(Value::from(1_i64))
    })
}

// ---------------------------------------------------------------------------
// Sentinel propagation
// ---------------------------------------------------------------------------

#[test]
fn unrelated_subtree_is_never_computed() {
    init_tracing();
    let log = EventLog::new();
    let graph = graph_of(vec![
        counted(&log, "db_url", &[]),
        counted(&log, "db", &["db_url"]),
        counted(&log, "repo", &["db", "cache"]),
        counted(&log, "cache", &[]),
    ]);
    let recorder = Checkpoints::from_phase(Rc::new(RefCell::new(DiscoveryRecorder::new())));
    let mut resolver = Resolver::new(&graph, recorder, 64);

    let inputs = resolver
        .resolve_all(&["repo".to_string(), "db".to_string()])
        .unwrap();
    assert!(inputs.value("repo").is_stand_in());
    assert!(inputs.value("db").is_stand_in());
    assert!(log.events().is_empty());
    assert_eq!(resolver.computed(), 0);
}

#[test]
fn mixed_input_is_computed_with_stand_ins() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = Rc::clone(&seen);
    let graph = graph_of(vec![
        InputDef::new("db", &[], |_| Ok(Value::from("real connection"))),
        InputDef::new("audited_db", &[CHECKPOINTS_INPUT, "db"], move |inputs| {
            s.borrow_mut().push((
                inputs.value(CHECKPOINTS_INPUT).as_checkpoints().is_some(),
                inputs.value("db").is_stand_in(),
            ));
            Ok(Value::from("wrapped"))
        }),
    ]);
    let recorder = Checkpoints::from_phase(Rc::new(RefCell::new(DiscoveryRecorder::new())));
    let mut resolver = Resolver::new(&graph, recorder, 64);

    let Resolved::Value(value) = resolver.resolve("audited_db").unwrap() else {
        panic!("mixed input must be materialized");
    };
    assert_eq!(value.as_str(), Some("wrapped"));
    // Recorder passed through, unrelated db replaced by a stand-in.
    assert_eq!(*seen.borrow(), vec![(true, true)]);
}

#[test]
fn unrelated_fixtures_untouched_by_collection_but_built_for_replay() {
    init_tracing();
    let log = EventLog::new();
    let mut fixtures = FixtureRegistry::new();
    fixtures.insert(counted(&log, "expensive", &[]));

    let mut suite = Suite::new(fixtures);
    suite.add(TestDef::new(
        "uses_expensive",
        &[CHECKPOINTS_INPUT, "expensive"],
        |inputs| {
            let cp = inputs.checkpoints()?;
            let value = inputs.value("expensive");
            let check = cp.wrap(move |_| {
                checkpoint_kernel::error::ensure_eq(&value.as_i64(), &Some(1), "expensive")
            });
            check.check()?;
            check.check()?;
            Ok(())
        },
    ));

    let config = HarnessConfig::default();
    let collection = collect(&suite, &config);
    assert_eq!(collection.cases.len(), 2);
    assert_eq!(log.count("expensive"), 0);

    let report = run_suite(&suite, &config);
    assert!(report.is_success());
    // run_suite collects again (0 computations), then one real
    // computation per case.
    assert_eq!(log.count("expensive"), 2);
}

// ---------------------------------------------------------------------------
// Recorder threading
// ---------------------------------------------------------------------------

#[test]
fn checkpoint_wrapped_inside_a_fixture_is_discovered() {
    init_tracing();
    let log = EventLog::new();
    let p = log.clone();
    let mut fixtures = FixtureRegistry::new();
    fixtures.define("login_step", &[CHECKPOINTS_INPUT], move |inputs| {
        let cp = inputs.checkpoints()?;
        let pl = p.clone();
        let step = cp.wrap(move |_| {
            pl.hit("login");
            Ok(())
        });
        Ok(Value::object(step))
    });

    let mut suite = Suite::new(fixtures);
    suite.add(TestDef::new(
        "flow",
        &[CHECKPOINTS_INPUT, "login_step"],
        |inputs| {
            let step = inputs
                .value("login_step")
                .downcast::<Checkpoint>()
                .ok_or_else(|| Failure::input("login_step", "not a checkpoint"))?;
            step.check()?;
            let cp = inputs.checkpoints()?;
            cp.wrap(|_| Ok(())).check()?;
            Ok(())
        },
    ));

    let report = run_suite(&suite, &HarnessConfig::default());
    assert!(report.is_success(), "{report:?}");
    assert_eq!(report.cases.len(), 2);
    // Only the case selecting position 0 ran the fixture's checkpoint.
    assert_eq!(log.events(), vec!["login"]);
}

#[test]
fn recorder_reached_only_through_a_fixture_still_generates_cases() {
    init_tracing();
    let log = EventLog::new();
    let p = log.clone();
    let mut fixtures = FixtureRegistry::new();
    fixtures.define("login_step", &[CHECKPOINTS_INPUT], move |inputs| {
        let cp = inputs.checkpoints()?;
        let pl = p.clone();
        let step = cp.wrap(move |_| {
            pl.hit("login");
            Ok(())
        });
        Ok(Value::object(step))
    });

    let mut suite = Suite::new(fixtures);
    suite.add(TestDef::new("flow", &["login_step"], |inputs| {
        let step = inputs
            .require("login_step")?
            .downcast::<Checkpoint>()
            .ok_or_else(|| Failure::input("login_step", "not a checkpoint"))?;
        step.check()?;
        step.check()?;
        Ok(())
    }));

    let collection = collect(&suite, &HarnessConfig::default());
    assert!(collection.errors.is_empty(), "{:?}", collection.errors);
    assert_eq!(collection.cases.len(), 2);
    assert!(collection.plan_digests.contains_key("flow"));

    let report = run_suite(&suite, &HarnessConfig::default());
    assert!(report.is_success(), "{report:?}");
    assert_eq!(report.cases.len(), 2);
    assert!(report.plan_digests.contains_key("flow"));
    // One executed call per case.
    assert_eq!(log.events(), vec!["login", "login"]);
}

// ---------------------------------------------------------------------------
// Failure surfaces
// ---------------------------------------------------------------------------

#[test]
fn stand_in_rejected_by_setup_code_is_a_collection_error() {
    init_tracing();
    let mut fixtures = FixtureRegistry::new();
    fixtures
        .define("port", &[], |_| Ok(Value::from(5432_i64)))
        .define("server", &[CHECKPOINTS_INPUT, "port"], |inputs| {
            inputs
                .value("port")
                .as_i64()
                .map(Value::from)
                .ok_or_else(|| Failure::input("server", "port is not a number"))
        });

    let mut suite = Suite::new(fixtures);
    suite.add(TestDef::new("strict", &[CHECKPOINTS_INPUT, "server"], |inputs| {
        inputs.checkpoints()?.wrap(|_| Ok(())).check()?;
        Ok(())
    }));

    let collection = collect(&suite, &HarnessConfig::default());
    assert!(collection.cases.is_empty());
    assert_eq!(
        collection.errors,
        vec![CollectionError::Discovery(DiscoveryError::InputFailed {
            test_name: "strict".into(),
            failure: Failure::input("server", "port is not a number"),
        })]
    );
}

#[test]
fn runaway_graph_hits_the_depth_bound() {
    let mut fixtures = FixtureRegistry::new();
    fixtures
        .define("ping", &[CHECKPOINTS_INPUT, "pong"], |_| Ok(Value::StandIn))
        .define("pong", &["ping"], |_| Ok(Value::StandIn));

    let mut suite = Suite::new(fixtures);
    suite.add(TestDef::new("loop", &[CHECKPOINTS_INPUT, "pong"], |_| Ok(())));

    let config = HarnessConfig {
        discovery: DiscoveryConfig {
            max_resolution_depth: Some(8),
            ..DiscoveryConfig::default()
        },
        ..HarnessConfig::default()
    };
    let collection = collect(&suite, &config);
    assert!(collection.cases.is_empty());
    let [CollectionError::Discovery(DiscoveryError::InputFailed { failure, .. })] =
        collection.errors.as_slice()
    else {
        panic!("expected one input failure, got {:?}", collection.errors);
    };
    assert!(matches!(
        failure,
        Failure::ResolutionDepthExceeded { max_depth: 8, .. }
    ));
}
