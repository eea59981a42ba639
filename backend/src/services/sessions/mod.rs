//! Session upload and analysis.
//!
//! A session is the pair of transient files (template + dataset, plus an
//! optional signature image) that one issuance run works from. The provided
//! route is:
//! - `POST /api/sessions/analyze`: multipart upload of `template`, `data`
//!   and optional `signature` parts. Files are saved under the configured
//!   base directory with a session-id prefix, the template's placeholders
//!   are extracted, the dataset is loaded, and the response carries the
//!   placeholder/column mapping preview plus up to five preview rows.
//!
//! Session files are transient: the generation worker deletes them when its
//! job finishes, regardless of outcome.

mod analyze;

use actix_web::web::{post, scope};
use actix_web::Scope;
use std::fs;
use std::path::PathBuf;

use crate::config::Config;

const API_PATH: &str = "/api/sessions";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/analyze", post().to(analyze::process))
}

/// Paths of one session's saved uploads.
#[derive(Clone, Debug)]
pub struct SessionFiles {
    pub template: PathBuf,
    pub data: PathBuf,
    pub signature: Option<PathBuf>,
}

/// Finds the saved files for `session_id`, or `None` when the template or
/// dataset is missing (expired or never-uploaded session).
pub fn locate_session_files(config: &Config, session_id: &str) -> Option<SessionFiles> {
    let find_prefixed = |dir: PathBuf, prefix: String| -> Option<PathBuf> {
        let entries = fs::read_dir(dir).ok()?;
        for entry in entries.flatten() {
            let name = entry.file_name();
            if name.to_string_lossy().starts_with(&prefix) {
                return Some(entry.path());
            }
        }
        None
    };

    let template = find_prefixed(config.uploads_dir(), format!("{session_id}_template"))?;
    let data = find_prefixed(config.uploads_dir(), format!("{session_id}_data"))?;
    let signature = find_prefixed(config.signatures_dir(), format!("{session_id}_signature"));
    Some(SessionFiles {
        template,
        data,
        signature,
    })
}

/// Deletes a session's transient files. Best-effort: removal failures are
/// ignored so cleanup can never fail a job that already finished.
pub fn remove_session_files(files: &SessionFiles) {
    let _ = fs::remove_file(&files.template);
    let _ = fs::remove_file(&files.data);
    if let Some(signature) = &files.signature {
        let _ = fs::remove_file(signature);
    }
}
