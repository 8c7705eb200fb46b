//! Collection: turn a suite into concrete cases.
//!
//! For each test the harness calls the kernel's generation hook:
//!
//! - a test that does not request the checkpoints input becomes one plain
//!   case
//! - a test that does becomes one case per discovered checkpoint call
//!   (zero calls, zero cases)
//! - a discovery failure or panic becomes a collection error and the
//!   test gets no cases
//!
//! Case ids are `name[id]`, or `name[index]` for calls without an id.
//! Repeated ids within one test get their occurrence number appended
//! (`name[dup0]`, `name[dup1]`).

use std::collections::{BTreeMap, BTreeSet};
use std::panic::{catch_unwind, AssertUnwindSafe};

use checkpoint_kernel::checkpoint::discovery::CaseParam;
use checkpoint_kernel::error::Failure;
use checkpoint_kernel::generate::{generate_tests, CollectionHost, DiscoveryError};
use checkpoint_kernel::inputs::graph::{InputGraph, CALL_INDEX_INPUT};
use checkpoint_kernel::proof::hash::ContentHash;
use checkpoint_kernel::value::Inputs;

use crate::config::HarnessConfig;
use crate::fixtures::FixtureRegistry;
use crate::suite::{Suite, TestDef};

/// One concrete, separately reported execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedCase {
    /// Report id (`test[id]`, or just `test` for plain cases).
    pub node_id: String,
    /// Index of the owning test in the suite.
    pub test_index: usize,
    /// The generated parameter; `None` for plain cases.
    pub param: Option<CaseParam>,
}

/// Error collecting one test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// The generation hook returned an error.
    Discovery(DiscoveryError),
    /// The dry run panicked.
    Panicked { test_name: String, detail: String },
}

impl CollectionError {
    /// Name of the test that failed to collect.
    #[must_use]
    pub fn test_name(&self) -> &str {
        match self {
            Self::Discovery(
                DiscoveryError::InputFailed { test_name, .. }
                | DiscoveryError::BodyFailed { test_name, .. }
                | DiscoveryError::NonDeterministic { test_name, .. },
            )
            | Self::Panicked { test_name, .. } => test_name.as_str(),
            Self::Discovery(DiscoveryError::Canon { .. }) => "",
        }
    }
}

impl std::fmt::Display for CollectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Discovery(e) => write!(f, "{e}"),
            Self::Panicked { test_name, detail } => {
                write!(f, "{test_name}: panicked during discovery: {detail}")
            }
        }
    }
}

impl std::error::Error for CollectionError {}

/// Everything collection produced.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    /// Cases in suite order, then call order.
    pub cases: Vec<CollectedCase>,
    /// Tests that could not be collected.
    pub errors: Vec<CollectionError>,
    /// Discovery plan digest per parametrized test.
    pub plan_digests: BTreeMap<String, ContentHash>,
}

/// The harness side of the generation hook for one test.
struct Candidate<'s> {
    test: &'s TestDef,
    fixtures: &'s FixtureRegistry,
    params: Option<Vec<CaseParam>>,
}

impl CollectionHost for Candidate<'_> {
    fn test_name(&self) -> &str {
        self.test.name()
    }

    fn input_names(&self) -> &[String] {
        self.test.inputs()
    }

    fn input_graph(&self) -> &dyn InputGraph {
        self.fixtures
    }

    fn invoke(&self, inputs: &Inputs) -> Result<(), Failure> {
        self.test.run(inputs)
    }

    fn parametrize(&mut self, input_name: &str, params: Vec<CaseParam>) {
        debug_assert_eq!(input_name, CALL_INDEX_INPUT);
        self.params = Some(params);
    }
}

/// Collect every test in `suite`.
#[must_use]
pub fn collect(suite: &Suite, config: &HarnessConfig) -> Collection {
    let mut collection = Collection::default();

    for (test_index, test) in suite.tests().iter().enumerate() {
        let mut candidate = Candidate {
            test,
            fixtures: suite.fixtures(),
            params: None,
        };
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            generate_tests(&mut candidate, &config.discovery)
        }));

        match outcome {
            Ok(Ok(None)) => collection.cases.push(CollectedCase {
                node_id: test.name().to_string(),
                test_index,
                param: None,
            }),
            Ok(Ok(Some(digest))) => {
                let params = candidate.params.take().unwrap_or_default();
                if params.is_empty() {
                    tracing::info!(test = test.name(), "no checkpoint calls; no cases");
                }
                collection
                    .cases
                    .extend(parametrized_cases(test.name(), test_index, params));
                collection
                    .plan_digests
                    .insert(test.name().to_string(), digest);
            }
            Ok(Err(e)) => {
                tracing::warn!(test = test.name(), error = %e, "collection failed");
                collection.errors.push(CollectionError::Discovery(e));
            }
            Err(payload) => {
                let detail = panic_detail(payload.as_ref());
                tracing::warn!(test = test.name(), %detail, "discovery panicked");
                collection.errors.push(CollectionError::Panicked {
                    test_name: test.name().to_string(),
                    detail,
                });
            }
        }
    }

    tracing::info!(
        cases = collection.cases.len(),
        errors = collection.errors.len(),
        "collection finished"
    );
    collection
}

fn parametrized_cases(
    test_name: &str,
    test_index: usize,
    params: Vec<CaseParam>,
) -> Vec<CollectedCase> {
    let labels: Vec<String> = params
        .iter()
        .map(|p| p.id.clone().unwrap_or_else(|| p.call_index.to_string()))
        .collect();

    let mut totals: BTreeMap<&str, usize> = BTreeMap::new();
    for label in &labels {
        *totals.entry(label.as_str()).or_default() += 1;
    }

    // Suffixed ids must not collide with any label used as-is, nor with
    // each other.
    let mut taken: BTreeSet<String> = totals
        .iter()
        .filter(|(_, &count)| count == 1)
        .map(|(label, _)| (*label).to_string())
        .collect();
    let mut next: BTreeMap<&str, usize> = BTreeMap::new();
    let mut ids = Vec::with_capacity(labels.len());
    for label in &labels {
        if totals[label.as_str()] == 1 {
            ids.push(label.clone());
            continue;
        }
        let n = next.entry(label.as_str()).or_default();
        let mut id = format!("{label}{n}");
        while taken.contains(&id) {
            *n += 1;
            id = format!("{label}{n}");
        }
        *n += 1;
        taken.insert(id.clone());
        ids.push(id);
    }

    params
        .into_iter()
        .zip(ids)
        .map(|(param, id)| CollectedCase {
            node_id: format!("{test_name}[{id}]"),
            test_index,
            param: Some(param),
        })
        .collect()
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_detail(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
