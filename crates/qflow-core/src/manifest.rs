//! Per-enumeration run report.
//!
//! The engine emits one after an enumeration reaches a terminal state; two
//! reports with equal `plan_hash` and `outputs_digest` describe repeatable runs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hash::Hash256;
use crate::id::CursorId;
use crate::state::EnumerationState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(pub Uuid);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumerationReport {
    pub id: ReportId,

    pub cursor: CursorId,

    /// Stable hash of the plan shape that was executed.
    pub plan_hash: Hash256,

    /// Engine version string for provenance.
    pub engine_version: String,

    /// Optional digest of the yielded elements (only when they are serializable).
    pub outputs_digest: Option<Hash256>,

    pub rows_yielded: u64,

    pub outcome: EnumerationState,

    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
}

impl EnumerationReport {
    pub fn new(cursor: CursorId, plan_hash: Hash256, started_ms: u64) -> Self {
        Self {
            id: ReportId(Uuid::new_v4()),
            cursor,
            plan_hash,
            engine_version: crate::VERSION.to_string(),
            outputs_digest: None,
            rows_yielded: 0,
            outcome: EnumerationState::Pending,
            started_ms,
            finished_ms: started_ms,
        }
    }

    pub fn finish(
        mut self,
        finished_ms: u64,
        rows_yielded: u64,
        outcome: EnumerationState,
        outputs_digest: Option<Hash256>,
    ) -> Self {
        self.finished_ms = finished_ms;
        self.rows_yielded = rows_yielded;
        self.outcome = outcome;
        self.outputs_digest = outputs_digest;
        self
    }
}
