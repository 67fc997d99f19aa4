//! Run reports
//!
//! Every pipeline run ends with a [`RunReport`]: the final state, per-node
//! timings and a digest of the state for integrity checks.

use crate::models::ExecutionDecision;
use crate::state::WorkflowState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Write;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeTiming {
    pub node: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub timings: Vec<NodeTiming>,
    pub state_digest: String,
    pub state: WorkflowState,
}

impl RunReport {
    pub fn new(
        run_id: Uuid,
        started_at: DateTime<Utc>,
        timings: Vec<NodeTiming>,
        state: WorkflowState,
    ) -> Self {
        Self {
            run_id,
            started_at,
            finished_at: Utc::now(),
            timings,
            state_digest: compute_state_digest(&state),
            state,
        }
    }

    pub fn decision(&self) -> Option<ExecutionDecision> {
        self.state.investment_execution
    }

    /// Names of the nodes in the order they ran
    pub fn path(&self) -> Vec<&str> {
        self.timings.iter().map(|t| t.node.as_str()).collect()
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.timings.iter().map(|t| t.duration_ms).sum()
    }

    /// Check the stored state still matches its digest
    pub fn verify_integrity(&self) -> bool {
        compute_state_digest(&self.state) == self.state_digest
    }
}

/// SHA-256 over the JSON form of the state, hex encoded.
/// Streams the serialization straight into the hasher.
pub fn compute_state_digest(state: &WorkflowState) -> String {
    let mut hasher = Sha256::new();

    if serde_json::to_writer(&mut HashWriter(&mut hasher), state).is_err() {
        return String::new();
    }

    hex::encode(hasher.finalize())
}

/// Adapter to allow writing into Sha256 via std::io::Write
struct HashWriter<'a, H: Digest>(&'a mut H);

impl<'a, H: Digest> Write for HashWriter<'a, H> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
