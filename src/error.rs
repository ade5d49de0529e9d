use thiserror::Error;

/// Failure inside a storage backend.
///
/// `Backend` is kept distinct from `NotFound`: a backend failure while
/// checking for a prior record must never be read as "no record", or the
/// same payout could be paid twice.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no payment record for external id `{0}`")]
    NotFound(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Outcome of a failed claim attempt.
#[derive(Debug, Error)]
pub enum ClaimError {
    /// A record for this external id already exists. Expected under
    /// concurrent or repeated submissions; maps to the `duplicate` status.
    #[error("external id `{0}` is already claimed")]
    AlreadyClaimed(String),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("a batch report for `{0}` already exists")]
    AlreadyExists(String),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("amount must be positive, got {0}")]
    InvalidAmount(i64),
    #[error("pix key is empty")]
    MissingKey,
    #[error("pix gateway timed out after {0}ms")]
    Timeout(u64),
    #[error("pix rail refused the transfer")]
    Refused,
}

/// Batch-fatal errors. Per-item failures never surface here; they are
/// contained in that item's detail.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("invalid batch: {0}")]
    Validation(String),
    #[error(transparent)]
    Storage(#[from] StoreError),
}
