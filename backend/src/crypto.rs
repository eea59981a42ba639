//! Certificate integrity primitives: identifier generation, signing, content
//! hashing and verification.
//!
//! Signing uses HMAC-SHA256 under a single shared secret. This keeps
//! verification stateless and fast at the cost of per-issuer non-repudiation,
//! an explicit trade-off for the issuance-and-lookup use case; switching to
//! asymmetric signing is the documented upgrade path.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Length of a certificate identifier in characters.
pub const CERT_ID_LEN: usize = 12;

/// The four signed attributes of a certificate record.
#[derive(Clone, Debug)]
pub struct CanonicalFields {
    pub cert_id: String,
    pub recipient: String,
    pub course: String,
    pub issue_date: String,
}

impl CanonicalFields {
    /// Stable serialization fed to both the signature and the content hash.
    /// Field order and delimiter are part of the verification contract and
    /// must never change.
    fn serialize(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.cert_id, self.recipient, self.course, self.issue_date
        )
    }
}

/// Produces a short, globally unique, URL-safe identifier.
///
/// Derived from fresh randomness only, never from certificate fields, so an
/// identifier cannot be guessed from a recipient name or course.
pub fn generate_certificate_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    hex[..CERT_ID_LEN].to_string()
}

/// Keyed authentication tag over the canonical fields, hex-encoded.
/// Deterministic: same fields and secret always yield the same tag.
pub fn sign_certificate(fields: &CanonicalFields, secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(fields.serialize().as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Unkeyed SHA-256 digest over the same serialization, stored alongside the
/// signature as a secondary tamper indicator usable without the secret.
pub fn compute_certificate_hash(fields: &CanonicalFields) -> String {
    hex::encode(Sha256::digest(fields.serialize().as_bytes()))
}

/// Recomputes the tag over the currently stored fields and compares it
/// byte-for-byte with the supplied signature.
///
/// Any mismatch, whether a forged signature, an edited field or the wrong
/// secret, yields `false`. This never fails with an error; mismatches are
/// data, not faults.
pub fn verify_signature(fields: &CanonicalFields, signature: &str, secret: &str) -> bool {
    sign_certificate(fields, secret) == signature
}
