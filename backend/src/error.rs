use thiserror::Error;

/// Failures of the issuance pipeline, from request validation to job
/// completion.
///
/// Row-level faults are deliberately *not* part of this enum: a failure while
/// processing one row is recorded as a plain message on the job record and
/// the job continues. Row faults only escalate to a job-level error through
/// the zero-success rule (`AllRowsFailed`).
#[derive(Debug, Error)]
pub enum GenerateError {
    /// A required upload (template or dataset) is missing; rejected before
    /// any job is created.
    #[error("{0}")]
    InvalidInput(String),

    /// The template or dataset could not be read or parsed. Aborts the whole
    /// job; no partial archive survives.
    #[error("failed to read files: {0}")]
    SourceRead(String),

    /// The template contains no placeholders. Aborts the whole job.
    #[error("no placeholders found in template")]
    NoPlaceholders,

    /// Iteration completed with zero successful rows. Carries the prepared
    /// message, including the first recorded per-row error when there is one.
    #[error("{0}")]
    AllRowsFailed(String),

    /// Unknown job or certificate identifier.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}
