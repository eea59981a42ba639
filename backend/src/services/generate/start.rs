//! # Generation Job Start Service
//!
//! Initiates a background job that combines an analyzed session (template +
//! dataset + optional signature image) into one certificate document per
//! dataset row, bundled into a single archive.
//!
//! ## Workflow
//!
//! 1. **HTTP request**: `process` receives a `StartGenerateRequest` with the
//!    `session_id` and layout options.
//! 2. **Job scheduling**: `schedule_generate_job` validates that the session
//!    files exist, registers the job as `queued` in the shared `JobsState`
//!    and immediately returns the `job_id`. A Tokio task manages the job's
//!    lifecycle; the heavy lifting runs via `tokio::task::spawn_blocking` so
//!    file I/O and PDF rendering never block the async runtime.
//! 3. **Row iteration**: `generate_blocking` loads placeholders and dataset,
//!    then processes rows strictly in order. Each row derives its canonical
//!    fields, gets a fresh certificate id, is signed and hashed, rendered,
//!    persisted to the certificate store and appended to the archive. A
//!    failing row is recorded and skipped; it never aborts the job.
//! 4. **Progress**: after every row the worker sends a `JobUpdate` so the
//!    registry counters advance atomically and poll/stream callers never
//!    see a torn counter set.
//! 5. **Completion**: zero successful rows turns into a job-level failure
//!    (carrying the first row error) and the partial archive is discarded;
//!    otherwise the job finishes `done` with the archive location. The
//!    session's transient files are removed afterwards in every case, even
//!    when the worker panicked.

use actix_web::{web, HttpResponse, Responder};
use common::jobs::JobRecord;
use common::model::certificate::CertificateRecord;
use common::requests::StartGenerateRequest;
use log::info;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::Config;
use crate::crypto::{self, CanonicalFields};
use crate::error::GenerateError;
use crate::job_controller::state::{JobProgress, JobUpdate, JobsState};
use crate::services::certificates::store;
use crate::services::data_sources::loader::{self, Dataset};
use crate::services::data_sources::mapping;
use crate::services::data_sources::placeholders;
use crate::services::generate::archive::ArchiveBuilder;
use crate::services::render::{PdfRenderer, RenderJob, Renderer};
use crate::services::sessions::{self, SessionFiles};

/// Row error messages are clipped to keep job records and events bounded.
const ROW_ERROR_MAX_LEN: usize = 150;

pub(crate) async fn process(
    config: web::Data<Config>,
    state: web::Data<JobsState>,
    payload: web::Json<StartGenerateRequest>,
) -> impl Responder {
    let renderer: Arc<dyn Renderer> = Arc::new(PdfRenderer);
    match schedule_generate_job(&config, &state, payload.into_inner(), renderer).await {
        Ok(job_id) => HttpResponse::Ok().json(serde_json::json!({ "job_id": job_id })),
        Err(GenerateError::InvalidInput(message)) => {
            HttpResponse::BadRequest().json(serde_json::json!({ "error": message }))
        }
        Err(err) => {
            HttpResponse::InternalServerError().json(serde_json::json!({ "error": err.to_string() }))
        }
    }
}

/// Registers a job and spawns its worker; returns the job id without waiting
/// for any row to be processed.
pub async fn schedule_generate_job(
    config: &Config,
    state: &JobsState,
    req: StartGenerateRequest,
    renderer: Arc<dyn Renderer>,
) -> Result<String, GenerateError> {
    let session = sessions::locate_session_files(config, &req.session_id).ok_or_else(|| {
        GenerateError::InvalidInput("Session expired. Please re-upload your files.".to_string())
    })?;

    let job_id = Uuid::new_v4().to_string();
    state
        .jobs
        .write()
        .await
        .insert(job_id.clone(), JobRecord::queued());

    let tx = state.tx.clone();
    let job_id_clone = job_id.clone();
    let config = config.clone();

    tokio::spawn(async move {
        let tx_block = tx.clone();
        let job_for_blocking = job_id_clone.clone();
        let session_for_blocking = session.clone();
        let config_for_blocking = config.clone();

        let handle = tokio::task::spawn_blocking(move || {
            generate_blocking(
                tx_block,
                &job_for_blocking,
                &session_for_blocking,
                &config_for_blocking,
                renderer.as_ref(),
                &req.qr_position,
                &req.sig_position,
            )
        });

        match handle.await {
            // The worker already sent its terminal update.
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = tx
                    .send(JobUpdate::new(
                        job_id_clone.clone(),
                        JobProgress::Failed {
                            message: e.to_string(),
                        },
                    ))
                    .await;
            }
            Err(e) => {
                let _ = tx
                    .send(JobUpdate::new(
                        job_id_clone.clone(),
                        JobProgress::Failed {
                            message: format!("Task join error: {e}"),
                        },
                    ))
                    .await;
            }
        }

        // Transient inputs are removed whatever the outcome, even after a
        // worker panic, to bound disk usage.
        sessions::remove_session_files(&session);
        info!("job {job_id_clone} finished, session files removed");
    });

    Ok(job_id)
}

/// The synchronous body of one issuance job, run via `spawn_blocking`.
fn generate_blocking(
    tx: mpsc::Sender<JobUpdate>,
    job_id: &str,
    session: &SessionFiles,
    config: &Config,
    renderer: &dyn Renderer,
    qr_position: &str,
    sig_position: &str,
) -> Result<(), GenerateError> {
    let _ = tx.blocking_send(JobUpdate::new(job_id, JobProgress::Running));

    let placeholder_keys = placeholders::extract_placeholders(&session.template)?;
    if placeholder_keys.is_empty() {
        return Err(GenerateError::NoPlaceholders);
    }
    let dataset = loader::load(&session.data)?;

    let _ = tx.blocking_send(JobUpdate::new(
        job_id,
        JobProgress::Total {
            total: dataset.rows.len(),
        },
    ));

    let conn = Connection::open(&config.db_path)
        .map_err(|e| GenerateError::Internal(format!("certificate store: {e}")))?;
    store::init_db(&conn).map_err(|e| GenerateError::Internal(format!("certificate store: {e}")))?;

    let archive_path = config
        .output_dir()
        .join(format!("certificates_{job_id}.zip"));

    let ctx = BatchContext {
        dataset: &dataset,
        placeholders: &placeholder_keys,
        session,
        config,
        conn: &conn,
        renderer,
        qr_position,
        sig_position,
        archive_path: &archive_path,
    };

    let result = run_rows(&ctx, |_, row_error| {
        let _ = tx.blocking_send(JobUpdate::new(
            job_id,
            JobProgress::Row {
                error: row_error.map(|e| e.to_string()),
            },
        ));
    });

    match result {
        Ok(_) => {
            let _ = tx.blocking_send(JobUpdate::new(
                job_id,
                JobProgress::Finished {
                    archive: archive_path,
                },
            ));
            Ok(())
        }
        Err(e) => {
            // No partial archive survives a job-level failure.
            let _ = fs::remove_file(&archive_path);
            Err(e)
        }
    }
}

/// Everything one batch run needs, bundled so the row loop is testable
/// without the HTTP or channel plumbing around it.
pub struct BatchContext<'a> {
    pub dataset: &'a Dataset,
    pub placeholders: &'a [String],
    pub session: &'a SessionFiles,
    pub config: &'a Config,
    pub conn: &'a Connection,
    pub renderer: &'a dyn Renderer,
    pub qr_position: &'a str,
    pub sig_position: &'a str,
    pub archive_path: &'a Path,
}

/// Counters of a completed (successful) batch run.
#[derive(Debug)]
pub struct BatchOutcome {
    pub success_count: usize,
    pub errors: Vec<String>,
}

/// Processes every dataset row strictly in order, calling `on_row(done,
/// error)` after each one.
///
/// Row failures are isolated: they are recorded and the loop continues. The
/// only fatal outcomes are archive I/O failures and the zero-success rule.
pub fn run_rows(
    ctx: &BatchContext<'_>,
    mut on_row: impl FnMut(usize, Option<&str>),
) -> Result<BatchOutcome, GenerateError> {
    let mut builder = ArchiveBuilder::create(ctx.archive_path)
        .map_err(GenerateError::Internal)?;
    let mut errors: Vec<String> = Vec::new();
    let mut success_count = 0usize;

    for (idx, row) in ctx.dataset.rows.iter().enumerate() {
        let row_error = match issue_row(ctx, idx, row, &mut builder) {
            Ok(()) => {
                success_count += 1;
                None
            }
            Err(message) => {
                let clipped: String = message.chars().take(ROW_ERROR_MAX_LEN).collect();
                let entry = format!("Row {}: {}", idx + 1, clipped);
                errors.push(entry.clone());
                Some(entry)
            }
        };
        on_row(idx + 1, row_error.as_deref());
    }

    if success_count == 0 {
        // Discard the partially-built archive before reporting failure.
        drop(builder);
        let _ = fs::remove_file(ctx.archive_path);
        let mut message = "Failed to generate any certificates.".to_string();
        if let Some(first) = errors.first() {
            message.push_str(" First error: ");
            message.push_str(first);
        }
        return Err(GenerateError::AllRowsFailed(message));
    }

    builder.finish().map_err(GenerateError::Internal)?;
    Ok(BatchOutcome {
        success_count,
        errors,
    })
}

/// Issues one certificate: canonical fields, fresh id, signature, hash,
/// rendering, persistence, archive entry. Returns a plain message on
/// failure; the caller records it and moves on.
fn issue_row(
    ctx: &BatchContext<'_>,
    idx: usize,
    row: &[String],
    builder: &mut ArchiveBuilder,
) -> Result<(), String> {
    let values = ctx.dataset.row_values(row);

    let first_value = row.first().map(String::as_str).unwrap_or_default();
    let display_name = mapping::safe_file_name(first_value, idx);
    let out_pdf: PathBuf = ctx
        .config
        .output_dir()
        .join(format!("{display_name}_{idx}.pdf"));

    let result = render_and_persist(ctx, idx, row, &values, &display_name, &out_pdf, builder);
    // Never leave a stale per-row document behind, success or not.
    let _ = fs::remove_file(&out_pdf);
    result
}

fn render_and_persist(
    ctx: &BatchContext<'_>,
    idx: usize,
    row: &[String],
    values: &std::collections::HashMap<String, String>,
    display_name: &str,
    out_pdf: &Path,
    builder: &mut ArchiveBuilder,
) -> Result<(), String> {
    let canonical = mapping::derive_canonical_fields(row, &ctx.dataset.columns);

    // The identifier is assigned exactly once, before signing.
    let cert_id = crypto::generate_certificate_id();
    let fields = CanonicalFields {
        cert_id: cert_id.clone(),
        recipient: canonical.recipient,
        course: canonical.course,
        issue_date: canonical.issue_date,
    };
    let signature = crypto::sign_certificate(&fields, &ctx.config.secret_key);
    let content_hash = crypto::compute_certificate_hash(&fields);
    let verification_url = ctx.config.verification_url(&cert_id);

    let render_job = RenderJob {
        template_path: &ctx.session.template,
        output_path: out_pdf,
        values,
        placeholders: ctx.placeholders,
        cert_id: &cert_id,
        verification_url: &verification_url,
        qr_position: ctx.qr_position,
        signature_path: ctx.session.signature.as_deref(),
        sig_position: ctx.sig_position,
    };
    ctx.renderer.render(&render_job).map_err(|e| e.to_string())?;

    let size = fs::metadata(out_pdf).map(|m| m.len()).unwrap_or(0);
    if size == 0 {
        return Err("PDF not created".to_string());
    }

    let record = CertificateRecord {
        cert_id,
        recipient: fields.recipient.clone(),
        course: fields.course.clone(),
        issue_date: fields.issue_date.clone(),
        signature,
        content_hash,
        additional_fields: values.clone(),
    };
    store::store_certificate(ctx.conn, &record).map_err(|e| e.to_string())?;

    builder.add_certificate(display_name, idx, out_pdf)?;
    Ok(())
}
