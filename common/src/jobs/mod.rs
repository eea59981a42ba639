use serde::{Deserialize, Serialize};

/// Number of per-row error messages surfaced to clients. The full list is
/// kept internally for diagnostics; only this many ever cross the transport
/// boundary.
pub const SURFACED_ERROR_LIMIT: usize = 5;

/// Lifecycle of a batch issuance job.
///
/// Transitions are `Queued -> Running -> {Done | Error}`; no transition ever
/// leaves a terminal phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobPhase {
    Queued,
    Running,
    Done,
    Error,
}

impl JobPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobPhase::Done | JobPhase::Error)
    }
}

/// Orchestration state for one batch run.
///
/// Mutated only by the central job updater task while the job is live; read
/// paths observe clones taken under the registry lock. Once the phase is
/// terminal, all counters are frozen.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobRecord {
    pub phase: JobPhase,
    /// Total number of dataset rows, known once loading succeeds.
    pub total: usize,
    /// Rows processed so far, successful or not. Increases by exactly one
    /// per row and never decreases.
    pub done: usize,
    pub success_count: usize,
    /// Ordered per-row failure descriptions. Unbounded internally; truncated
    /// to [`SURFACED_ERROR_LIMIT`] whenever it leaves the process.
    pub errors: Vec<String>,
    /// Location of the finished archive, set only on the transition to `Done`.
    pub output_path: Option<String>,
    /// Human-readable failure, set only on the transition to `Error`.
    pub failure: Option<String>,
}

impl JobRecord {
    pub fn queued() -> Self {
        Self {
            phase: JobPhase::Queued,
            total: 0,
            done: 0,
            success_count: 0,
            errors: Vec::new(),
            output_path: None,
            failure: None,
        }
    }

    /// Read-only view handed to poll callers, with the error list capped.
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            status: self.phase,
            total: self.total,
            done: self.done,
            success_count: self.success_count,
            error_count: self.errors.len(),
            errors: self
                .errors
                .iter()
                .take(SURFACED_ERROR_LIMIT)
                .cloned()
                .collect(),
            failure: self.failure.clone(),
        }
    }
}

/// Transport-facing copy of a [`JobRecord`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub status: JobPhase,
    pub total: usize,
    pub done: usize,
    pub success_count: usize,
    /// Full error count, even when `errors` is truncated.
    pub error_count: usize,
    pub errors: Vec<String>,
    pub failure: Option<String>,
}
