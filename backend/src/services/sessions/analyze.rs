use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use common::model::analyze::AnalyzeResponse;
use futures_util::StreamExt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::Config;
use crate::error::GenerateError;
use crate::services::data_sources::{loader, mapping, placeholders};

/// Length of a session identifier.
const SESSION_ID_LEN: usize = 10;

pub(crate) async fn process(config: web::Data<Config>, payload: Multipart) -> impl Responder {
    match analyze_session(&config, payload).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(err @ (GenerateError::InvalidInput(_)
        | GenerateError::SourceRead(_)
        | GenerateError::NoPlaceholders)) => {
            HttpResponse::BadRequest().json(serde_json::json!({ "error": err.to_string() }))
        }
        Err(err) => {
            HttpResponse::InternalServerError().json(serde_json::json!({ "error": err.to_string() }))
        }
    }
}

fn new_session_id() -> String {
    Uuid::new_v4().simple().to_string()[..SESSION_ID_LEN].to_string()
}

/// Extension of an uploaded filename including the dot, or `fallback`.
fn extension_or(filename: &str, fallback: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_else(|| fallback.to_string())
}

/// Streams one multipart field to `path`.
async fn save_field(
    field: &mut actix_multipart::Field,
    path: &Path,
) -> Result<(), GenerateError> {
    let mut file =
        File::create(path).map_err(|e| GenerateError::Internal(format!("save upload: {e}")))?;
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| GenerateError::InvalidInput(e.to_string()))?;
        file.write_all(&chunk)
            .map_err(|e| GenerateError::Internal(format!("save upload: {e}")))?;
    }
    Ok(())
}

async fn analyze_session(
    config: &Config,
    mut payload: Multipart,
) -> Result<AnalyzeResponse, GenerateError> {
    let session_id = new_session_id();
    let mut template_path: Option<PathBuf> = None;
    let mut data_path: Option<PathBuf> = None;
    let mut signature_path: Option<PathBuf> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| GenerateError::InvalidInput(e.to_string()))?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
            .unwrap_or_default();

        let target = match name.as_deref() {
            Some("template") => Some(
                config
                    .uploads_dir()
                    .join(format!("{session_id}_template{}", extension_or(&filename, ".txt"))),
            ),
            Some("data") => Some(
                config
                    .uploads_dir()
                    .join(format!("{session_id}_data{}", extension_or(&filename, ".csv"))),
            ),
            Some("signature") if !filename.is_empty() => Some(
                config
                    .signatures_dir()
                    .join(format!("{session_id}_signature{}", extension_or(&filename, ".png"))),
            ),
            _ => None,
        };

        match target {
            Some(path) => {
                save_field(&mut field, &path).await?;
                match name.as_deref() {
                    Some("template") => template_path = Some(path),
                    Some("data") => data_path = Some(path),
                    _ => signature_path = Some(path),
                }
            }
            None => {
                // Drain unrecognized parts so the multipart stream stays in sync.
                while let Some(chunk) = field.next().await {
                    let _ = chunk.map_err(|e| GenerateError::InvalidInput(e.to_string()))?;
                }
            }
        }
    }

    let required = "Both a template and a data file are required.";
    let template = template_path
        .ok_or_else(|| GenerateError::InvalidInput(required.to_string()))?;
    let data = data_path.ok_or_else(|| GenerateError::InvalidInput(required.to_string()))?;

    let placeholder_keys = placeholders::extract_placeholders(&template)?;
    if placeholder_keys.is_empty() {
        return Err(GenerateError::NoPlaceholders);
    }
    let dataset = loader::load(&data)?;

    let (matched, unmatched) = mapping::compute_mapping(&dataset.columns, &placeholder_keys);
    let preview = dataset
        .rows
        .iter()
        .take(5)
        .map(|row| dataset.row_values(row))
        .collect();

    Ok(AnalyzeResponse {
        session_id,
        placeholders: placeholder_keys,
        columns: dataset.columns.clone(),
        matched,
        unmatched,
        total: dataset.rows.len(),
        preview,
        has_signature: signature_path.is_some(),
    })
}
