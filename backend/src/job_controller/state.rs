//! Manages the state of long-running, asynchronous issuance jobs.
//!
//! This module provides the core components for tracking batch certificate
//! generation outside the request/response cycle:
//! - `JobsState`: a clonable, thread-safe registry of all jobs, injected into
//!   the Actix application state in `main.rs`.
//! - `JobUpdate` / `JobProgress`: messages a background worker sends to
//!   report phase transitions and per-row progress.
//! - `start_job_updater`: the single long-running task that applies those
//!   messages to the shared registry.
//!
//! Workers never touch the registry directly; all mutations funnel through
//! the MPSC channel into the updater, so every counter change for a record
//! happens atomically under one write lock and poll callers can never
//! observe a partially-updated counter set.

use common::jobs::{JobPhase, JobRecord};
use std::{collections::HashMap, path::PathBuf, sync::Arc};
use tokio::sync::{mpsc, RwLock};

/// A thread-safe, shareable container for the state of all issuance jobs.
///
/// The map is the single source of truth for job status. It is protected by
/// an `Arc<RwLock>` to allow concurrent reads (status polling, the SSE
/// stream) and exclusive writes (the updater task, terminal disposal).
#[derive(Clone)]
pub struct JobsState {
    pub jobs: Arc<RwLock<HashMap<String, JobRecord>>>,

    /// Sender half of the channel into `start_job_updater`. Background
    /// workers push `JobUpdate` messages here instead of taking the write
    /// lock themselves.
    pub tx: mpsc::Sender<JobUpdate>,
}

impl JobsState {
    pub fn new(tx: mpsc::Sender<JobUpdate>) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
        }
    }
}

/// A progress message for one specific job.
#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) job_id: String,
    pub(crate) progress: JobProgress,
}

impl JobUpdate {
    pub fn new(job_id: impl Into<String>, progress: JobProgress) -> Self {
        Self {
            job_id: job_id.into(),
            progress,
        }
    }
}

/// What happened inside the worker since the last update.
#[derive(Debug)]
pub enum JobProgress {
    /// The worker picked the job up: `Queued -> Running`.
    Running,
    /// Template and dataset loaded; the row count is known.
    Total { total: usize },
    /// One row finished. `error` is `Some` when the row failed and was
    /// skipped; the job itself continues either way.
    Row { error: Option<String> },
    /// Terminal success: the archive is complete at `archive`.
    Finished { archive: PathBuf },
    /// Terminal failure of the whole job.
    Failed { message: String },
}

/// Applies `JobUpdate` messages to the shared registry.
///
/// Spawned once in `main.rs` and lives for the whole process. Updates for
/// unknown jobs (already disposed) and for jobs in a terminal phase are
/// dropped: no transition ever leaves `Done` or `Error`.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        let Some(record) = jobs.get_mut(&update.job_id) else {
            continue;
        };
        if record.phase.is_terminal() {
            continue;
        }
        match update.progress {
            JobProgress::Running => record.phase = JobPhase::Running,
            JobProgress::Total { total } => record.total = total,
            JobProgress::Row { error } => {
                record.done += 1;
                match error {
                    None => record.success_count += 1,
                    Some(message) => record.errors.push(message),
                }
            }
            JobProgress::Finished { archive } => {
                record.output_path = Some(archive.to_string_lossy().into_owned());
                record.phase = JobPhase::Done;
            }
            JobProgress::Failed { message } => {
                record.failure = Some(message);
                record.phase = JobPhase::Error;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> (JobsState, mpsc::Sender<JobUpdate>) {
        let (tx, rx) = mpsc::channel(16);
        let state = JobsState::new(tx.clone());
        tokio::spawn(start_job_updater(state.clone(), rx));
        (state, tx)
    }

    #[tokio::test]
    async fn row_updates_advance_counters_atomically() {
        let (state, tx) = setup().await;
        state
            .jobs
            .write()
            .await
            .insert("job".to_string(), JobRecord::queued());

        tx.send(JobUpdate::new("job", JobProgress::Running)).await.unwrap();
        tx.send(JobUpdate::new("job", JobProgress::Total { total: 3 }))
            .await
            .unwrap();
        tx.send(JobUpdate::new("job", JobProgress::Row { error: None }))
            .await
            .unwrap();
        tx.send(JobUpdate::new(
            "job",
            JobProgress::Row {
                error: Some("Row 2: boom".to_string()),
            },
        ))
        .await
        .unwrap();
        tx.send(JobUpdate::new("job", JobProgress::Row { error: None }))
            .await
            .unwrap();
        tx.send(JobUpdate::new(
            "job",
            JobProgress::Finished {
                archive: PathBuf::from("/tmp/out.zip"),
            },
        ))
        .await
        .unwrap();

        // Wait for the updater to drain the channel.
        for _ in 0..50 {
            if state.jobs.read().await.get("job").map(|r| r.phase) == Some(JobPhase::Done) {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        let jobs = state.jobs.read().await;
        let record = jobs.get("job").unwrap();
        assert_eq!(record.phase, JobPhase::Done);
        assert_eq!(record.total, 3);
        assert_eq!(record.done, 3);
        assert_eq!(record.success_count, 2);
        assert_eq!(record.errors, vec!["Row 2: boom".to_string()]);
        assert_eq!(record.output_path.as_deref(), Some("/tmp/out.zip"));
    }

    #[tokio::test]
    async fn terminal_phase_is_frozen() {
        let (state, tx) = setup().await;
        let mut record = JobRecord::queued();
        record.phase = JobPhase::Error;
        record.failure = Some("dead".to_string());
        state.jobs.write().await.insert("job".to_string(), record);

        tx.send(JobUpdate::new("job", JobProgress::Row { error: None }))
            .await
            .unwrap();
        tx.send(JobUpdate::new(
            "job",
            JobProgress::Finished {
                archive: PathBuf::from("x.zip"),
            },
        ))
        .await
        .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let jobs = state.jobs.read().await;
        let record = jobs.get("job").unwrap();
        assert_eq!(record.phase, JobPhase::Error);
        assert_eq!(record.done, 0);
        assert!(record.output_path.is_none());
    }
}
