//! SQLite persistence for issued certificates.
//!
//! All functions take an open `Connection` so callers control the database
//! lifetime (the worker opens one per job, the verify handler one per
//! request, tests use in-memory databases).

use common::model::certificate::{CertificateRecord, StoredCertificate};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;

pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS certificates (
            cert_id         TEXT PRIMARY KEY,
            name            TEXT NOT NULL,
            course          TEXT NOT NULL,
            date            TEXT NOT NULL,
            signature       TEXT NOT NULL,
            content_hash    TEXT NOT NULL,
            additional_data TEXT NOT NULL,
            created_at      TEXT NOT NULL
        )",
    )
}

/// Persists one record. Records are immutable after this point.
pub fn store_certificate(conn: &Connection, record: &CertificateRecord) -> rusqlite::Result<()> {
    let additional = serde_json::to_string(&record.additional_fields).unwrap_or_default();
    conn.execute(
        "INSERT INTO certificates
            (cert_id, name, course, date, signature, content_hash, additional_data, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            record.cert_id,
            record.recipient,
            record.course,
            record.issue_date,
            record.signature,
            record.content_hash,
            additional,
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_certificate(
    conn: &Connection,
    cert_id: &str,
) -> rusqlite::Result<Option<StoredCertificate>> {
    conn.query_row(
        "SELECT cert_id, name, course, date, signature, content_hash, additional_data, created_at
         FROM certificates WHERE cert_id = ?1",
        params![cert_id],
        |row| {
            let additional: String = row.get(6)?;
            let additional_fields: HashMap<String, String> =
                serde_json::from_str(&additional).unwrap_or_default();
            Ok(StoredCertificate {
                record: CertificateRecord {
                    cert_id: row.get(0)?,
                    recipient: row.get(1)?,
                    course: row.get(2)?,
                    issue_date: row.get(3)?,
                    signature: row.get(4)?,
                    content_hash: row.get(5)?,
                    additional_fields,
                },
                created_at: row.get(7)?,
            })
        },
    )
    .optional()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CertificateRecord {
        let mut additional = HashMap::new();
        additional.insert("Grade".to_string(), "A".to_string());
        CertificateRecord {
            cert_id: "abc123def456".to_string(),
            recipient: "Jane Doe".to_string(),
            course: "Rust".to_string(),
            issue_date: "2026-08-01".to_string(),
            signature: "sig".to_string(),
            content_hash: "hash".to_string(),
            additional_fields: additional,
        }
    }

    #[test]
    fn store_then_fetch_roundtrip() {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        store_certificate(&conn, &record()).unwrap();

        let stored = get_certificate(&conn, "abc123def456").unwrap().unwrap();
        assert_eq!(stored.record.recipient, "Jane Doe");
        assert_eq!(stored.record.additional_fields.get("Grade").unwrap(), "A");
        assert!(!stored.created_at.is_empty());
    }

    #[test]
    fn unknown_id_is_none_not_an_error() {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        assert!(get_certificate(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        store_certificate(&conn, &record()).unwrap();
        assert!(store_certificate(&conn, &record()).is_err());
    }
}
