//! Discovery recorder: the registry phase used by the dry run.
//!
//! Every checkpoint call is appended to an ordered record and returns
//! without running the body. After the test body has run once, the
//! record is turned into one [`CaseParam`] per call, in call order. The
//! position of a call in that order is its call index, the only state
//! threaded from discovery into a replay execution.

use crate::checkpoint::registry::{
    CallArgs, CheckpointCall, CheckpointKey, CheckpointPhase, CheckpointTable, Handling, Tag,
};
use crate::error::Failure;

/// One recorded checkpoint call.
#[derive(Debug, Clone)]
pub struct InvocationRecord {
    /// Key of the wrapped body.
    pub key: CheckpointKey,
    /// Arguments the call was made with.
    pub args: CallArgs,
    /// Tags for the generated case.
    pub tags: Vec<Tag>,
    /// Display id for the generated case.
    pub id: Option<String>,
}

/// One generated case parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseParam {
    /// Position of the call in discovery order; the replay target.
    pub call_index: usize,
    /// Key of the body the call was made through.
    pub key: CheckpointKey,
    /// Display id, if the call supplied one.
    pub id: Option<String>,
    /// Tags of the generated case.
    pub tags: Vec<Tag>,
}

impl CaseParam {
    /// JSON form used by the plan digest and reports.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "call_index": self.call_index,
            "id": self.id,
            "key": self.key.index(),
            "tags": self.tags.iter().map(Tag::to_json).collect::<Vec<_>>(),
        })
    }
}

/// Registry phase that records calls instead of running them.
#[derive(Default)]
pub struct DiscoveryRecorder {
    table: CheckpointTable,
    calls: Vec<InvocationRecord>,
}

impl DiscoveryRecorder {
    /// Empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded calls in call order.
    #[must_use]
    pub fn calls(&self) -> &[InvocationRecord] {
        &self.calls
    }

    /// One parameter per recorded call, in call order.
    #[must_use]
    pub fn generate_params(&self) -> Vec<CaseParam> {
        self.calls
            .iter()
            .enumerate()
            .map(|(call_index, record)| CaseParam {
                call_index,
                key: record.key,
                id: record.id.clone(),
                tags: record.tags.clone(),
            })
            .collect()
    }
}

impl CheckpointPhase for DiscoveryRecorder {
    fn phase(&self) -> &'static str {
        "discovery"
    }

    fn table(&self) -> &CheckpointTable {
        &self.table
    }

    fn table_mut(&mut self) -> &mut CheckpointTable {
        &mut self.table
    }

    fn handle_call(
        &mut self,
        key: CheckpointKey,
        call: &CheckpointCall,
    ) -> Result<Handling, Failure> {
        tracing::debug!(
            call_index = self.calls.len(),
            %key,
            id = call.id.as_deref().unwrap_or(""),
            "recorded checkpoint call"
        );
        self.calls.push(InvocationRecord {
            key,
            args: call.args.clone(),
            tags: call.tags.clone(),
            id: call.id.clone(),
        });
        Ok(Handling::Recorded)
    }
}
