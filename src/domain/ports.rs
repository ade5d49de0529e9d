use super::payout::{BatchReport, PaymentRecord, PaymentStatus, PayoutItem};
use crate::error::{ClaimError, GatewayError, ReportError, StoreError};
use async_trait::async_trait;
use std::sync::Arc;

/// Durable keyed record of every claimed external id and its outcome.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// True iff a record for `external_id` already exists.
    async fn exists(&self, external_id: &str) -> Result<bool, StoreError>;

    /// Atomically inserts `record` iff no record exists for its external id.
    ///
    /// This is the single serialization point that prevents double-paying
    /// one external id, including across overlapping batches. On conflict
    /// the store is left untouched and `AlreadyClaimed` is returned.
    async fn claim(&self, record: PaymentRecord) -> Result<(), ClaimError>;

    /// Transitions a claimed record and stamps `updated_at`. Only the
    /// worker that won the claim may call this.
    async fn update_status(
        &self,
        external_id: &str,
        status: PaymentStatus,
        error: Option<String>,
    ) -> Result<(), StoreError>;

    async fn get(&self, external_id: &str) -> Result<Option<PaymentRecord>, StoreError>;
}

/// Batch-level summaries, enabling idempotent resubmission of a whole batch.
#[async_trait]
pub trait BatchReportStore: Send + Sync {
    async fn get(&self, batch_id: &str) -> Result<Option<BatchReport>, StoreError>;

    /// Inserts the report iff none exists for its batch id.
    async fn create(&self, report: BatchReport) -> Result<(), ReportError>;
}

/// One transfer against the (simulated) PIX rail.
#[async_trait]
pub trait PixGateway: Send + Sync {
    async fn process_payment(&self, item: &PayoutItem) -> Result<(), GatewayError>;
}

pub type PaymentStoreRef = Arc<dyn PaymentStore>;
pub type BatchReportStoreRef = Arc<dyn BatchReportStore>;
pub type PixGatewayRef = Arc<dyn PixGateway>;
