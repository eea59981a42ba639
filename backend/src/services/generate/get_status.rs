use actix_web::{web, HttpResponse, Responder};

use crate::job_controller::state::JobsState;

/// Non-consuming poll: a read-only snapshot of the job record, or 404 when
/// the id is unknown or the job was already consumed by the stream.
pub(crate) async fn process(
    job_id: web::Path<String>,
    state: web::Data<JobsState>,
) -> impl Responder {
    let jobs = state.jobs.read().await;
    match jobs.get(job_id.as_str()) {
        Some(record) => HttpResponse::Ok().json(record.snapshot()),
        None => HttpResponse::NotFound().body("Job ID not found"),
    }
}
