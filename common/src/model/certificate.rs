use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The canonical signed unit representing one issued certificate.
///
/// `cert_id`, `recipient`, `course` and `issue_date` are the four canonical
/// fields covered by `signature` and `content_hash`. `additional_fields`
/// carries every other dataset column for display only and is never signed.
///
/// A record is created during one row's processing, persisted once and
/// immutable thereafter; verification never mutates it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CertificateRecord {
    /// Opaque, content-independent identifier, assigned exactly once before
    /// signing.
    pub cert_id: String,
    pub recipient: String,
    pub course: String,
    pub issue_date: String,
    /// Keyed authentication tag over the four canonical fields (hex).
    pub signature: String,
    /// Unkeyed digest over the same fields, for audit without secret access.
    pub content_hash: String,
    /// Remaining dataset columns, normalized, unsigned.
    pub additional_fields: HashMap<String, String>,
}

/// A stored certificate plus its persistence timestamp.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredCertificate {
    pub record: CertificateRecord,
    pub created_at: String,
}
