//! Batch certificate generation.
//!
//! Registered routes:
//! - `POST /api/generate/start`: validates the session, registers a job in
//!   state `queued`, schedules the background worker and returns the
//!   `job_id` immediately.
//! - `GET /api/generate/status/{job_id}`: non-consuming poll; returns a
//!   read-only snapshot of the job record (error list capped at five).
//! - `GET /api/generate/stream/{job_id}`: the consuming read path; emits
//!   `progress` events until the job is terminal, then a single `done`
//!   event carrying the base64 archive (or an `error` event) and disposes
//!   of the job.

mod archive;
mod get_status;
pub mod start;
mod stream;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/generate";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/start", post().to(start::process))
        .route("/status/{job_id}", get().to(get_status::process))
        .route("/stream/{job_id}", get().to(stream::process))
}
