//! Streaming progress protocol.
//!
//! One append-only event sequence per job, framed as server-sent events
//! (`data: {json}\n\n`). Non-terminal jobs produce `progress` events with a
//! bounded sleep between polls; the terminal event is either `done`
//! (carrying the base64-encoded archive, after which the archive file is
//! deleted) or `error`. Emitting the terminal event disposes of the job
//! record, so a second stream for the same id gets a single `error` event.
//!
//! Disconnection of the stream consumer does not stop the worker; the job
//! runs to completion regardless of whether anyone is listening.

use actix_web::web::Bytes;
use actix_web::{web, HttpResponse, Responder};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use common::jobs::{JobPhase, JobRecord, SURFACED_ERROR_LIMIT};
use futures_util::stream;
use serde_json::json;
use std::fs;
use std::time::Duration;

use crate::job_controller::state::JobsState;

/// Cadence between successive progress polls of a non-terminal job.
const POLL_INTERVAL: Duration = Duration::from_millis(800);

enum StreamStep {
    /// First poll happens immediately.
    Start,
    /// Subsequent polls wait out the cadence interval first.
    Wait,
    /// Terminal event emitted; the stream ends.
    Closed,
}

pub(crate) async fn process(
    job_id: web::Path<String>,
    state: web::Data<JobsState>,
) -> impl Responder {
    let job_id = job_id.into_inner();
    let state = state.get_ref().clone();

    let events = stream::unfold(StreamStep::Start, move |step| {
        let state = state.clone();
        let job_id = job_id.clone();
        async move {
            match step {
                StreamStep::Closed => return None,
                StreamStep::Start => {}
                StreamStep::Wait => tokio::time::sleep(POLL_INTERVAL).await,
            }
            let (event, terminal) = next_event(&state, &job_id).await;
            let next = if terminal {
                StreamStep::Closed
            } else {
                StreamStep::Wait
            };
            Some((Ok::<Bytes, actix_web::Error>(sse_frame(&event)), next))
        }
    });

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(events)
}

fn sse_frame(event: &serde_json::Value) -> Bytes {
    Bytes::from(format!("data: {event}\n\n"))
}

/// Polls the registry once. Returns the event to emit and whether it is
/// terminal. Terminal observation disposes of the job record.
async fn next_event(state: &JobsState, job_id: &str) -> (serde_json::Value, bool) {
    let record = { state.jobs.read().await.get(job_id).cloned() };
    let Some(record) = record else {
        return (
            json!({
                "type": "error",
                "message": "Job not found or already consumed.",
            }),
            true,
        );
    };

    match record.phase {
        JobPhase::Done => {
            let event = done_event(&record);
            state.jobs.write().await.remove(job_id);
            (event, true)
        }
        JobPhase::Error => {
            let message = record
                .failure
                .clone()
                .unwrap_or_else(|| "Generation failed.".to_string());
            state.jobs.write().await.remove(job_id);
            (json!({ "type": "error", "message": message }), true)
        }
        JobPhase::Queued | JobPhase::Running => (
            json!({
                "type": "progress",
                "status": record.phase,
                "done": record.done,
                "total": record.total,
                "success": record.success_count,
                // Count only; full messages never travel in progress events.
                "errors": record.errors.len(),
            }),
            false,
        ),
    }
}

/// Builds the terminal `done` event: the archive is read into the event as
/// base64 and deleted from storage immediately after.
fn done_event(record: &JobRecord) -> serde_json::Value {
    let Some(path) = record.output_path.as_deref() else {
        return json!({
            "type": "error",
            "message": "Archive location missing from completed job.",
        });
    };
    match fs::read(path) {
        Ok(bytes) => {
            let _ = fs::remove_file(path);
            let surfaced: Vec<&String> =
                record.errors.iter().take(SURFACED_ERROR_LIMIT).collect();
            json!({
                "type": "done",
                "success": record.success_count,
                "total": record.total,
                "errors": surfaced,
                "zip_b64": BASE64.encode(bytes),
            })
        }
        Err(e) => json!({
            "type": "error",
            "message": format!("Failed to send ZIP: {e}"),
        }),
    }
}
