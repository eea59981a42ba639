//! Issued-certificate persistence and public verification.
//!
//! Registered route:
//! - `GET /api/certificates/verify/{cert_id}`: looks the certificate up in
//!   the SQLite store, recomputes the signature over the stored canonical
//!   fields and reports both the fields and the boolean validity. An
//!   unknown id is a 404 with `found: false`, never an error; a signature
//!   mismatch is `valid: false`, never an error.

pub mod store;
mod verify;

use actix_web::web::{get, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/certificates";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/verify/{cert_id}", get().to(verify::process))
}
