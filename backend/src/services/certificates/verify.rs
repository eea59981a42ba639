use actix_web::{web, HttpResponse, Responder};
use rusqlite::Connection;
use serde_json::json;

use crate::config::Config;
use crate::crypto::{self, CanonicalFields};
use crate::services::certificates::store;

pub(crate) async fn process(
    config: web::Data<Config>,
    cert_id: web::Path<String>,
) -> impl Responder {
    let cert_id = cert_id.into_inner();
    let conn = match Connection::open(&config.db_path) {
        Ok(conn) => conn,
        Err(e) => {
            return HttpResponse::InternalServerError().json(json!({ "error": e.to_string() }))
        }
    };

    match store::get_certificate(&conn, &cert_id) {
        Ok(Some(stored)) => {
            let fields = CanonicalFields {
                cert_id: stored.record.cert_id.clone(),
                recipient: stored.record.recipient.clone(),
                course: stored.record.course.clone(),
                issue_date: stored.record.issue_date.clone(),
            };
            let valid =
                crypto::verify_signature(&fields, &stored.record.signature, &config.secret_key);
            HttpResponse::Ok().json(json!({
                "found": true,
                "valid": valid,
                "certificate": {
                    "id": stored.record.cert_id,
                    "recipient": stored.record.recipient,
                    "course": stored.record.course,
                    "issue_date": stored.record.issue_date,
                    "issued_at": stored.created_at,
                }
            }))
        }
        Ok(None) => HttpResponse::NotFound().json(json!({
            "found": false,
            "cert_id": cert_id,
            "message": "Certificate not found",
        })),
        Err(e) => HttpResponse::InternalServerError().json(json!({ "error": e.to_string() })),
    }
}
