//! Replay multiplexer: the registry phase used by each generated case.
//!
//! Constructed with the target call index chosen for the case. Calls are
//! counted in order; only the call whose position equals the target runs
//! its body, every other call is a no-op.
//!
//! The counter advances before the body is selected, so the count stays
//! correct even when the selected body fails or panics. Selection is by
//! position, not by key or id: it relies on the test body making its
//! checkpoint calls in the same order in every phase.

use crate::checkpoint::registry::{
    CheckpointCall, CheckpointKey, CheckpointPhase, CheckpointTable, Handling,
};
use crate::error::Failure;

/// Registry phase that runs exactly one selected call.
pub struct ReplayMultiplexer {
    table: CheckpointTable,
    target: usize,
    current: usize,
}

impl ReplayMultiplexer {
    /// A multiplexer selecting the call at position `target`.
    #[must_use]
    pub fn new(target: usize) -> Self {
        Self {
            table: CheckpointTable::default(),
            target,
            current: 0,
        }
    }

    /// The selected call index.
    #[must_use]
    pub fn target(&self) -> usize {
        self.target
    }

    /// Number of calls seen so far.
    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }
}

impl CheckpointPhase for ReplayMultiplexer {
    fn phase(&self) -> &'static str {
        "replay"
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
        _call: &CheckpointCall,
    ) -> Result<Handling, Failure> {
        let position = self.current;
        self.current += 1;

        if position != self.target {
            tracing::trace!(position, target = self.target, %key, "skipped checkpoint call");
            return Ok(Handling::Skip);
        }

        tracing::debug!(position, %key, "running selected checkpoint");
        self.table
            .get(key)
            .cloned()
            .map(Handling::Run)
            .ok_or(Failure::UnknownCheckpoint { key })
    }
}
