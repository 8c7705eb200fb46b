//! Test generation: the hook the host calls once per candidate test.
//!
//! # Protocol
//!
//! ```text
//! checkpoints input reachable? ── no ──→ leave the candidate alone
//!        │ yes
//!        ▼
//! DiscoveryRecorder → Resolver::resolve_all() → body(inputs) once
//!        ▼
//! generate_params() → plan digest → host.parametrize(CALL_INDEX_INPUT, params)
//! ```
//!
//! Reachable means declared directly or through any declared input's
//! dependency closure: a test may take only a fixture that wraps
//! checkpoints. The body still receives exactly its declared inputs.
//!
//! The host then creates one execution per parameter. Each execution
//! resolves real inputs, where the checkpoints input becomes a fresh
//! [`crate::checkpoint::replay::ReplayMultiplexer`] targeting that
//! parameter's call index.
//!
//! # Known constraint
//!
//! Discovery evaluates the body against stand-ins. A checkpoint call gated
//! on real data is not taken during discovery and gets no case. Checkpoint
//! call sites must be unconditional, or conditioned only on data that is
//! identical in both phases.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use crate::checkpoint::discovery::{CaseParam, DiscoveryRecorder};
use crate::checkpoint::registry::Checkpoints;
use crate::error::Failure;
use crate::inputs::graph::{InputGraph, CALL_INDEX_INPUT, CHECKPOINTS_INPUT};
use crate::inputs::resolve::Resolver;
use crate::proof::canon::canonical_json_bytes;
use crate::proof::hash::{canonical_hash, ContentHash, DOMAIN_DISCOVERY_PLAN};
use crate::value::Inputs;

/// Default bound on input-graph recursion during discovery.
pub const DEFAULT_MAX_RESOLUTION_DEPTH: usize = 64;
const DEFAULT_VERIFY_DETERMINISM: bool = false;

/// Discovery configuration. `None` fields use the defaults.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryConfig {
    /// Maximum input-graph depth. `None` uses
    /// [`DEFAULT_MAX_RESOLUTION_DEPTH`].
    pub max_resolution_depth: Option<usize>,
    /// Run discovery twice and require identical plan digests.
    pub verify_determinism: Option<bool>,
}

impl DiscoveryConfig {
    /// Effective depth bound.
    #[must_use]
    pub fn max_resolution_depth(&self) -> usize {
        self.max_resolution_depth
            .unwrap_or(DEFAULT_MAX_RESOLUTION_DEPTH)
    }

    /// Effective determinism check flag.
    #[must_use]
    pub fn verify_determinism(&self) -> bool {
        self.verify_determinism.unwrap_or(DEFAULT_VERIFY_DETERMINISM)
    }
}

/// What the host exposes about one candidate test.
pub trait CollectionHost {
    /// Candidate test name.
    fn test_name(&self) -> &str;

    /// Declared input names, in declaration order.
    fn input_names(&self) -> &[String];

    /// The host's input graph for this candidate.
    fn input_graph(&self) -> &dyn InputGraph;

    /// Run the test body once with `inputs`.
    ///
    /// # Errors
    ///
    /// Returns the body's [`Failure`].
    fn invoke(&self, inputs: &Inputs) -> Result<(), Failure>;

    /// Register `params` under the index input `input_name`; the host
    /// creates one execution per parameter.
    fn parametrize(&mut self, input_name: &str, params: Vec<CaseParam>);
}

/// Result of one discovery pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryPlan {
    /// Candidate test name.
    pub test_name: String,
    /// One parameter per recorded checkpoint call, in call order.
    pub params: Vec<CaseParam>,
    /// Digest of the canonical plan JSON.
    pub digest: ContentHash,
}

impl DiscoveryPlan {
    /// Canonical JSON value of a plan (the digest input).
    #[must_use]
    pub fn to_json(test_name: &str, params: &[CaseParam]) -> serde_json::Value {
        serde_json::json!({
            "cases": params.iter().map(CaseParam::to_json).collect::<Vec<_>>(),
            "schema_version": "discovery_plan.v1",
            "test": test_name,
        })
    }
}

/// Typed failure of the discovery pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    /// An input computation failed (typically unrelated setup code that
    /// rejected a stand-in).
    InputFailed { test_name: String, failure: Failure },
    /// The test body failed during the dry run.
    BodyFailed { test_name: String, failure: Failure },
    /// Two discovery passes produced different plans.
    NonDeterministic {
        test_name: String,
        first: ContentHash,
        second: ContentHash,
    },
    /// Plan canonicalization failed.
    Canon { detail: String },
}

impl std::fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InputFailed { test_name, failure } => {
                write!(f, "{test_name}: input resolution failed during discovery: {failure}")
            }
            Self::BodyFailed { test_name, failure } => {
                write!(f, "{test_name}: test body failed during discovery: {failure}")
            }
            Self::NonDeterministic {
                test_name,
                first,
                second,
            } => write!(
                f,
                "{test_name}: discovery is not deterministic ({first} != {second})"
            ),
            Self::Canon { detail } => write!(f, "discovery plan canonicalization: {detail}"),
        }
    }
}

impl std::error::Error for DiscoveryError {}

/// Run discovery for one candidate without registering anything.
///
/// Returns `Ok(None)` if the checkpoints input is not reachable from the
/// candidate's declared inputs.
///
/// # Errors
///
/// Returns [`DiscoveryError`] if resolution or the dry run fails, or if
/// determinism verification is on and two passes disagree.
pub fn discover(
    host: &dyn CollectionHost,
    config: &DiscoveryConfig,
) -> Result<Option<DiscoveryPlan>, DiscoveryError> {
    if !reaches_checkpoints(host) {
        return Ok(None);
    }

    let plan = discover_once(host, config)?;
    if config.verify_determinism() {
        let again = discover_once(host, config)?;
        if again.digest != plan.digest {
            return Err(DiscoveryError::NonDeterministic {
                test_name: plan.test_name,
                first: plan.digest,
                second: again.digest,
            });
        }
    }

    tracing::info!(
        test = host.test_name(),
        cases = plan.params.len(),
        digest = %plan.digest,
        "discovered checkpoints"
    );
    Ok(Some(plan))
}

/// The generation hook: discover, then register the parameters with the
/// host under [`CALL_INDEX_INPUT`].
///
/// Returns the plan digest, or `None` if the candidate was left alone.
///
/// # Errors
///
/// See [`discover`]. Nothing is registered on error.
pub fn generate_tests(
    host: &mut dyn CollectionHost,
    config: &DiscoveryConfig,
) -> Result<Option<ContentHash>, DiscoveryError> {
    let Some(plan) = discover(host, config)? else {
        return Ok(None);
    };
    host.parametrize(CALL_INDEX_INPUT, plan.params);
    Ok(Some(plan.digest))
}

/// Whether the checkpoints input is in the dependency closure of the
/// declared inputs. Names missing from the graph are leaves.
fn reaches_checkpoints(host: &dyn CollectionHost) -> bool {
    let graph = host.input_graph();
    let mut visited: BTreeSet<&str> = BTreeSet::new();
    let mut stack: Vec<&str> = host.input_names().iter().map(String::as_str).collect();
    while let Some(name) = stack.pop() {
        if name == CHECKPOINTS_INPUT {
            return true;
        }
        if !visited.insert(name) {
            continue;
        }
        if let Some(def) = graph.definition(name) {
            stack.extend(def.dependencies().iter().map(String::as_str));
        }
    }
    false
}

fn discover_once(
    host: &dyn CollectionHost,
    config: &DiscoveryConfig,
) -> Result<DiscoveryPlan, DiscoveryError> {
    let test_name = host.test_name().to_string();
    let recorder = Rc::new(RefCell::new(DiscoveryRecorder::new()));

    let inputs = {
        let mut resolver = Resolver::new(
            host.input_graph(),
            Checkpoints::from_phase(Rc::clone(&recorder)),
            config.max_resolution_depth(),
        );
        resolver
            .resolve_all(host.input_names())
            .map_err(|failure| DiscoveryError::InputFailed {
                test_name: test_name.clone(),
                failure,
            })?
    };

    host.invoke(&inputs)
        .map_err(|failure| DiscoveryError::BodyFailed {
            test_name: test_name.clone(),
            failure,
        })?;

    let params = recorder.borrow().generate_params();
    let bytes = canonical_json_bytes(&DiscoveryPlan::to_json(&test_name, &params))
        .map_err(|e| DiscoveryError::Canon {
            detail: e.to_string(),
        })?;
    let digest = canonical_hash(DOMAIN_DISCOVERY_PLAN, &bytes);

    Ok(DiscoveryPlan {
        test_name,
        params,
        digest,
    })
}
