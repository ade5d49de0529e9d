use crate::error::BatchError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One requested PIX transfer, as submitted by the caller.
///
/// `external_id` is the caller-assigned idempotency key; two items sharing
/// an external id refer to the same payout, regardless of batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutItem {
    pub external_id: String,
    pub user_id: String,
    pub amount_cents: i64,
    pub pix_key: String,
}

/// Terminal and in-flight states of a payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

/// The durable outcome of one external id.
///
/// Created in `pending` state by the claim that wins the external id;
/// mutated only by the worker that owns that claim; never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub external_id: String,
    pub user_id: String,
    pub amount_cents: i64,
    pub pix_key: String,
    pub batch_id: String,
    pub status: PaymentStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentRecord {
    /// A fresh `pending` record for a claim attempt.
    pub fn pending(item: &PayoutItem, batch_id: &str) -> Self {
        let now = Utc::now();
        Self {
            external_id: item.external_id.clone(),
            user_id: item.user_id.clone(),
            amount_cents: item.amount_cents,
            pix_key: item.pix_key.clone(),
            batch_id: batch_id.to_string(),
            status: PaymentStatus::Pending,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A batch identifier plus the ordered list of items to pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub batch_id: String,
    pub items: Vec<PayoutItem>,
}

impl BatchRequest {
    /// Batch-level invariants. A violation rejects the whole batch before
    /// any item is touched; there is no partial processing.
    pub fn validate(&self) -> Result<(), BatchError> {
        if self.batch_id.trim().is_empty() {
            return Err(BatchError::Validation("batch_id must not be empty".into()));
        }
        if self.items.is_empty() {
            return Err(BatchError::Validation("items must not be empty".into()));
        }
        let mut seen = HashSet::with_capacity(self.items.len());
        for item in &self.items {
            if !seen.insert(item.external_id.as_str()) {
                return Err(BatchError::Validation(format!(
                    "duplicate external_id `{}` within batch",
                    item.external_id
                )));
            }
        }
        Ok(())
    }
}

/// The durable aggregate outcome of one batch id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: String,
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub duplicates: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailStatus {
    Paid,
    Failed,
    Duplicate,
}

/// Per-item projection returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutDetail {
    pub external_id: String,
    pub status: DetailStatus,
    pub amount_cents: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PayoutDetail {
    pub fn paid(external_id: String, amount_cents: i64) -> Self {
        Self {
            external_id,
            status: DetailStatus::Paid,
            amount_cents,
            error: None,
        }
    }

    pub fn failed(external_id: String, amount_cents: i64, error: String) -> Self {
        Self {
            external_id,
            status: DetailStatus::Failed,
            amount_cents,
            error: Some(error),
        }
    }

    /// A `duplicate` classification projected from the record that won the
    /// claim for this external id.
    pub fn duplicate_of(record: &PaymentRecord) -> Self {
        Self {
            external_id: record.external_id.clone(),
            status: DetailStatus::Duplicate,
            amount_cents: record.amount_cents,
            error: None,
        }
    }
}

impl From<&PaymentRecord> for PayoutDetail {
    /// Projection of a stored record, used when re-hydrating an already
    /// completed batch. A `pending` record can only be observed mid-flight,
    /// so it projects as `failed` here.
    fn from(record: &PaymentRecord) -> Self {
        let status = match record.status {
            PaymentStatus::Paid => DetailStatus::Paid,
            PaymentStatus::Failed | PaymentStatus::Pending => DetailStatus::Failed,
        };
        Self {
            external_id: record.external_id.clone(),
            status,
            amount_cents: record.amount_cents,
            error: record.error.clone(),
        }
    }
}

/// The consolidated response for one batch submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub batch_id: String,
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub duplicates: usize,
    pub details: Vec<PayoutDetail>,
}
