//! Suite report: per-case outcomes plus collection errors.
//!
//! The canonical JSON form is what gets hashed and written to disk. It
//! holds no wall time or paths, so the same suite yields the same bytes.

use std::collections::BTreeMap;

use checkpoint_kernel::proof::canon::{canonical_json_bytes, CanonError};
use checkpoint_kernel::proof::hash::{canonical_hash, ContentHash, DOMAIN_SUITE_REPORT};

/// Result of one executed (or skipped) case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseOutcome {
    /// The body returned `Ok`.
    Passed,
    /// Setup failed, the body failed, or it panicked.
    Failed { detail: String },
    /// Skipped by tag; the body never ran.
    Skipped { reason: String },
    /// Expected failure that failed.
    XFailed { reason: String },
    /// Expected failure that passed (non-strict).
    XPassed { reason: String },
}

impl CaseOutcome {
    /// Canonical outcome name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed { .. } => "failed",
            Self::Skipped { .. } => "skipped",
            Self::XFailed { .. } => "xfailed",
            Self::XPassed { .. } => "xpassed",
        }
    }

    /// Whether this outcome fails the suite.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    fn detail(&self) -> Option<&str> {
        match self {
            Self::Passed => None,
            Self::Failed { detail } => Some(detail),
            Self::Skipped { reason } | Self::XFailed { reason } | Self::XPassed { reason } => {
                Some(reason)
            }
        }
    }
}

/// One case in the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseReport {
    /// Case id.
    pub node_id: String,
    /// Selected call index; `None` for plain cases.
    pub call_index: Option<usize>,
    /// What happened.
    pub outcome: CaseOutcome,
}

/// A test that produced no cases because collection failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionFailure {
    /// Test name.
    pub test_name: String,
    /// Rendered error.
    pub detail: String,
}

/// Outcome of a whole suite run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteReport {
    /// Executed or skipped cases, in collection order.
    pub cases: Vec<CaseReport>,
    /// Tests that failed to collect.
    pub collection_failures: Vec<CollectionFailure>,
    /// Cases removed by label selection.
    pub deselected: usize,
    /// Discovery plan digest per parametrized test.
    pub plan_digests: BTreeMap<String, ContentHash>,
}

impl SuiteReport {
    /// Count of cases per outcome name.
    #[must_use]
    pub fn summary(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for case in &self.cases {
            *counts.entry(case.outcome.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of cases with the given outcome name.
    #[must_use]
    pub fn count(&self, outcome: &str) -> usize {
        self.cases
            .iter()
            .filter(|c| c.outcome.as_str() == outcome)
            .count()
    }

    /// Whether no case failed and every test collected.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.collection_failures.is_empty() && !self.cases.iter().any(|c| c.outcome.is_failure())
    }

    /// Look up a case by id.
    #[must_use]
    pub fn case(&self, node_id: &str) -> Option<&CaseReport> {
        self.cases.iter().find(|c| c.node_id == node_id)
    }

    /// JSON form of the report.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let cases: Vec<serde_json::Value> = self
            .cases
            .iter()
            .map(|c| {
                serde_json::json!({
                    "call_index": c.call_index,
                    "detail": c.outcome.detail(),
                    "node_id": c.node_id,
                    "outcome": c.outcome.as_str(),
                })
            })
            .collect();
        let failures: Vec<serde_json::Value> = self
            .collection_failures
            .iter()
            .map(|f| serde_json::json!({"detail": f.detail, "test": f.test_name}))
            .collect();
        let plans: serde_json::Map<String, serde_json::Value> = self
            .plan_digests
            .iter()
            .map(|(test, digest)| (test.clone(), serde_json::Value::from(digest.as_str())))
            .collect();

        serde_json::json!({
            "cases": cases,
            "collection_failures": failures,
            "deselected": self.deselected,
            "plans": plans,
            "schema_version": "suite_report.v1",
            "summary": self.summary(),
        })
    }

    /// Canonical JSON bytes of the report.
    ///
    /// # Errors
    ///
    /// Returns [`CanonError`] if canonicalization fails.
    pub fn to_canonical_json(&self) -> Result<Vec<u8>, CanonError> {
        canonical_json_bytes(&self.to_json())
    }

    /// Digest of the canonical bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CanonError`] if canonicalization fails.
    pub fn digest(&self) -> Result<ContentHash, CanonError> {
        Ok(canonical_hash(DOMAIN_SUITE_REPORT, &self.to_canonical_json()?))
    }
}
