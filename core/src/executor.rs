//! Action-script executor seam
//!
//! A proposal that resolves Yea forwards its stored script here, exactly
//! once. Failures surface to the resolving caller; nothing is swallowed.

use parking_lot::Mutex;
use thiserror::Error;

use crate::types::ProposalId;

/// Script execution failure, surfaced verbatim to the resolving caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("script execution failed: {0}")]
pub struct ExecutionError(pub String);

/// Executes approved proposal scripts synchronously.
pub trait ScriptExecutor: Send + Sync {
    fn execute(&self, proposal_id: ProposalId, script: &[u8]) -> Result<(), ExecutionError>;
}

/// Reference executor that records every forwarded script.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    executed: Mutex<Vec<(ProposalId, Vec<u8>)>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts forwarded so far, in execution order.
    pub fn executed(&self) -> Vec<(ProposalId, Vec<u8>)> {
        self.executed.lock().clone()
    }
}

impl ScriptExecutor for RecordingExecutor {
    fn execute(&self, proposal_id: ProposalId, script: &[u8]) -> Result<(), ExecutionError> {
        self.executed.lock().push((proposal_id, script.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_executor_keeps_order() {
        let executor = RecordingExecutor::new();
        executor.execute(0, b"first").unwrap();
        executor.execute(1, b"second").unwrap();

        let executed = executor.executed();
        assert_eq!(executed.len(), 2);
        assert_eq!(executed[0], (0, b"first".to_vec()));
        assert_eq!(executed[1], (1, b"second".to_vec()));
    }
}
