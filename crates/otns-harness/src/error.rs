use otns_common::{NodeId, Partitions};
use thiserror::Error;

// ── Collaborator Errors ─────────────────────────────────────────────

/// Failures reported by a simulation-control handle.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to launch simulator: {0}")]
    Launch(String),
    #[error("simulator rejected `{command}`: {message}")]
    Command { command: String, message: String },
    #[error("simulation handle is closed")]
    Closed,
    #[error("malformed simulator output: {0}")]
    Malformed(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ── Harness Errors ──────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("failed to open simulation handle: {0}")]
    Open(#[source] SimError),
    #[error("simulator command failed: {0}")]
    Sim(#[from] SimError),
    #[error("invalid harness config: {0}")]
    Config(String),
    #[error(
        "expected {expected} formed partitions with none unassigned, got {count}: {partitions}",
        count = .partitions.len()
    )]
    PartitionMismatch {
        expected: usize,
        partitions: Partitions,
    },
    #[error("Node {node} state mismatch: expected {expected}, but is {actual}")]
    NodeStateMismatch {
        node: NodeId,
        expected: String,
        actual: String,
    },
}

impl HarnessError {
    /// Whether this is an assertion failure rather than a collaborator or setup error.
    pub fn is_assertion(&self) -> bool {
        matches!(
            self,
            HarnessError::PartitionMismatch { .. } | HarnessError::NodeStateMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use otns_common::PartitionId;

    #[test]
    fn node_state_message_names_both_labels() {
        let err = HarnessError::NodeStateMismatch {
            node: 3,
            expected: "leader".into(),
            actual: "router".into(),
        };
        assert_eq!(
            err.to_string(),
            "Node 3 state mismatch: expected leader, but is router"
        );
        assert!(err.is_assertion());
    }

    #[test]
    fn partition_message_includes_actual_data() {
        let partitions: Partitions = [(PartitionId(0), vec![1]), (PartitionId(0xab), vec![2])]
            .into_iter()
            .collect();
        let err = HarnessError::PartitionMismatch {
            expected: 1,
            partitions,
        };
        let msg = err.to_string();
        assert!(msg.contains("expected 1"), "{msg}");
        assert!(msg.contains("got 2"), "{msg}");
        assert!(msg.contains("0: [1]"), "{msg}");
        assert!(msg.contains("ab: [2]"), "{msg}");
    }

    #[test]
    fn sim_errors_convert() {
        let err: HarnessError = SimError::Closed.into();
        assert!(matches!(err, HarnessError::Sim(SimError::Closed)));
        assert!(!err.is_assertion());
    }
}
