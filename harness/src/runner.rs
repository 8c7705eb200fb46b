//! Suite runner: collect, then execute every case in its own execution.
//!
//! # Pipeline
//!
//! ```text
//! collect() → for each case:
//!   tags → skip? / deselected?
//!   seed call index → resolve_real() → body (catch_unwind)
//!   → outcome (xfail mapping) → SuiteReport
//! ```
//!
//! Each parametrized case seeds its call index and resolves real inputs
//! from scratch. The built-in `checkpoints` fixture therefore yields a
//! fresh replay registry per case, and cases can run in any order.

use std::panic::{catch_unwind, AssertUnwindSafe};

use checkpoint_kernel::checkpoint::registry::Tag;
use checkpoint_kernel::inputs::graph::CALL_INDEX_INPUT;
use checkpoint_kernel::value::{Inputs, Value};

use crate::collect::{collect, panic_detail, Collection, CollectedCase};
use crate::config::HarnessConfig;
use crate::report::{CaseOutcome, CaseReport, CollectionFailure, SuiteReport};
use crate::suite::Suite;

/// Collect and run `suite`.
#[must_use]
pub fn run_suite(suite: &Suite, config: &HarnessConfig) -> SuiteReport {
    let collection = collect(suite, config);
    run_collection(suite, &collection, config)
}

/// Run an already collected suite.
#[must_use]
pub fn run_collection(suite: &Suite, collection: &Collection, config: &HarnessConfig) -> SuiteReport {
    let mut report = SuiteReport {
        collection_failures: collection
            .errors
            .iter()
            .map(|e| CollectionFailure {
                test_name: e.test_name().to_string(),
                detail: e.to_string(),
            })
            .collect(),
        plan_digests: collection.plan_digests.clone(),
        ..SuiteReport::default()
    };

    for case in &collection.cases {
        let tags = case.param.as_ref().map_or(&[][..], |p| p.tags.as_slice());
        if !config.selects(tags) {
            report.deselected += 1;
            continue;
        }
        let outcome = run_case(suite, case, config);
        tracing::debug!(case = %case.node_id, outcome = outcome.as_str(), "case finished");
        report.cases.push(CaseReport {
            node_id: case.node_id.clone(),
            call_index: case.param.as_ref().map(|p| p.call_index),
            outcome,
        });
    }

    let summary = report.summary();
    tracing::info!(
        passed = summary.get("passed").copied().unwrap_or(0),
        failed = summary.get("failed").copied().unwrap_or(0),
        skipped = summary.get("skipped").copied().unwrap_or(0),
        deselected = report.deselected,
        collection_failures = report.collection_failures.len(),
        "suite finished"
    );
    report
}

/// Execute one collected case.
#[must_use]
pub fn run_case(suite: &Suite, case: &CollectedCase, config: &HarnessConfig) -> CaseOutcome {
    let tags = case.param.as_ref().map_or(&[][..], |p| p.tags.as_slice());

    if let Some(reason) = tags.iter().find_map(|t| match t {
        Tag::Skip { reason } => Some(reason.clone()),
        _ => None,
    }) {
        return CaseOutcome::Skipped { reason };
    }
    let xfail = tags.iter().find_map(|t| match t {
        Tag::XFail { reason } => Some(reason.clone()),
        _ => None,
    });

    let Some(test) = suite.tests().get(case.test_index) else {
        return CaseOutcome::Failed {
            detail: format!("no test at index {}", case.test_index),
        };
    };

    let mut seeded = Inputs::new();
    if let Some(param) = &case.param {
        seeded.insert(CALL_INDEX_INPUT, Value::from(param.call_index));
    }

    // `resolved` keeps intermediate fixtures alive while the body runs;
    // the body sees only its declared inputs.
    let result = match suite.fixtures().resolve_real(test.inputs(), &seeded) {
        Ok(resolved) => {
            let mut inputs = Inputs::new();
            for name in test.inputs() {
                inputs.insert(name.clone(), resolved.value(name));
            }
            match catch_unwind(AssertUnwindSafe(|| test.run(&inputs))) {
                Ok(Ok(())) => Ok(()),
                Ok(Err(failure)) => Err(failure.to_string()),
                Err(payload) => Err(format!("panicked: {}", panic_detail(payload.as_ref()))),
            }
        }
        Err(failure) => Err(format!("setup failed: {failure}")),
    };

    match (result, xfail) {
        (Ok(()), None) => CaseOutcome::Passed,
        (Err(detail), None) => CaseOutcome::Failed { detail },
        (Err(_), Some(reason)) => CaseOutcome::XFailed { reason },
        (Ok(()), Some(reason)) if config.xfail_strict() => CaseOutcome::Failed {
            detail: format!("unexpectedly passed (strict xfail): {reason}"),
        },
        (Ok(()), Some(reason)) => CaseOutcome::XPassed { reason },
    }
}
