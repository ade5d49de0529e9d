use crate::domain::payout::{BatchReport, PaymentRecord, PaymentStatus};
use crate::domain::ports::{BatchReportStore, PaymentStore};
use crate::error::{ClaimError, ReportError, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory payment store.
///
/// Uses `Arc<RwLock<HashMap<String, PaymentRecord>>>` for shared concurrent
/// access. The claim is atomic because the insert-if-absent runs under the
/// write lock. Suitable for tests and single-process deployments.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    records: Arc<RwLock<HashMap<String, PaymentRecord>>>,
}

impl InMemoryPaymentStore {
    /// Creates a new, empty in-memory payment store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn exists(&self, external_id: &str) -> Result<bool, StoreError> {
        let records = self.records.read().await;
        Ok(records.contains_key(external_id))
    }

    async fn claim(&self, record: PaymentRecord) -> Result<(), ClaimError> {
        let mut records = self.records.write().await;
        match records.entry(record.external_id.clone()) {
            Entry::Occupied(_) => Err(ClaimError::AlreadyClaimed(record.external_id)),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn update_status(
        &self,
        external_id: &str,
        status: PaymentStatus,
        error: Option<String>,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(external_id)
            .ok_or_else(|| StoreError::NotFound(external_id.to_string()))?;
        record.status = status;
        record.error = error;
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn get(&self, external_id: &str) -> Result<Option<PaymentRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records.get(external_id).cloned())
    }
}

/// A thread-safe in-memory batch report store.
#[derive(Default, Clone)]
pub struct InMemoryReportStore {
    reports: Arc<RwLock<HashMap<String, BatchReport>>>,
}

impl InMemoryReportStore {
    /// Creates a new, empty in-memory report store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BatchReportStore for InMemoryReportStore {
    async fn get(&self, batch_id: &str) -> Result<Option<BatchReport>, StoreError> {
        let reports = self.reports.read().await;
        Ok(reports.get(batch_id).cloned())
    }

    async fn create(&self, report: BatchReport) -> Result<(), ReportError> {
        let mut reports = self.reports.write().await;
        match reports.entry(report.batch_id.clone()) {
            Entry::Occupied(_) => Err(ReportError::AlreadyExists(report.batch_id)),
            Entry::Vacant(slot) => {
                slot.insert(report);
                Ok(())
            }
        }
    }
}
