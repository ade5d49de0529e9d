use crate::domain::payout::{BatchReport, PaymentRecord, PaymentStatus};
use crate::domain::ports::{BatchReportStore, PaymentStore};
use crate::error::{ClaimError, ReportError, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column family for payment records, keyed by external id.
pub const CF_PAYMENTS: &str = "payments";
/// Column family for batch reports, keyed by batch id.
pub const CF_REPORTS: &str = "batch_reports";

/// A persistent store backed by RocksDB.
///
/// Payment records and batch reports live in separate column families,
/// serialized as JSON. `Clone` shares the underlying `Arc<DB>`.
///
/// RocksDB has no native insert-if-absent, so claims and report creation
/// serialize their check-then-put on `write_gate`. That is sufficient for
/// the single-process writer this store is meant for.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
    write_gate: Arc<Mutex<()>>,
}

impl RocksDbStore {
    /// Opens or creates a RocksDB instance at `path`, ensuring both column
    /// families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_payments = ColumnFamilyDescriptor::new(CF_PAYMENTS, Options::default());
        let cf_reports = ColumnFamilyDescriptor::new(CF_REPORTS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_payments, cf_reports])
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_gate: Arc::new(Mutex::new(())),
        })
    }

    fn cf_handle(&self, name: &str) -> Result<&rocksdb::ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Backend(format!("column family `{name}` not found")))
    }

    fn read_payment(&self, external_id: &str) -> Result<Option<PaymentRecord>, StoreError> {
        let cf = self.cf_handle(CF_PAYMENTS)?;
        let bytes = self
            .db
            .get_cf(cf, external_id.as_bytes())
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        bytes
            .map(|b| {
                serde_json::from_slice(&b)
                    .map_err(|e| StoreError::Backend(format!("corrupt payment record: {e}")))
            })
            .transpose()
    }

    fn write_payment(&self, record: &PaymentRecord) -> Result<(), StoreError> {
        let cf = self.cf_handle(CF_PAYMENTS)?;
        let value = serde_json::to_vec(record)
            .map_err(|e| StoreError::Backend(format!("serialize payment record: {e}")))?;
        self.db
            .put_cf(cf, record.external_id.as_bytes(), value)
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}

#[async_trait]
impl PaymentStore for RocksDbStore {
    async fn exists(&self, external_id: &str) -> Result<bool, StoreError> {
        let cf = self.cf_handle(CF_PAYMENTS)?;
        let found = self
            .db
            .get_pinned_cf(cf, external_id.as_bytes())
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(found.is_some())
    }

    async fn claim(&self, record: PaymentRecord) -> Result<(), ClaimError> {
        let _guard = self.write_gate.lock().await;
        if self.read_payment(&record.external_id)?.is_some() {
            return Err(ClaimError::AlreadyClaimed(record.external_id));
        }
        self.write_payment(&record)?;
        Ok(())
    }

    async fn update_status(
        &self,
        external_id: &str,
        status: PaymentStatus,
        error: Option<String>,
    ) -> Result<(), StoreError> {
        let _guard = self.write_gate.lock().await;
        let mut record = self
            .read_payment(external_id)?
            .ok_or_else(|| StoreError::NotFound(external_id.to_string()))?;
        record.status = status;
        record.error = error;
        record.updated_at = Utc::now();
        self.write_payment(&record)
    }

    async fn get(&self, external_id: &str) -> Result<Option<PaymentRecord>, StoreError> {
        self.read_payment(external_id)
    }
}

#[async_trait]
impl BatchReportStore for RocksDbStore {
    async fn get(&self, batch_id: &str) -> Result<Option<BatchReport>, StoreError> {
        let cf = self.cf_handle(CF_REPORTS)?;
        let bytes = self
            .db
            .get_cf(cf, batch_id.as_bytes())
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        bytes
            .map(|b| {
                serde_json::from_slice(&b)
                    .map_err(|e| StoreError::Backend(format!("corrupt batch report: {e}")))
            })
            .transpose()
    }

    async fn create(&self, report: BatchReport) -> Result<(), ReportError> {
        let _guard = self.write_gate.lock().await;
        if BatchReportStore::get(self, &report.batch_id).await?.is_some() {
            return Err(ReportError::AlreadyExists(report.batch_id));
        }
        let cf = self.cf_handle(CF_REPORTS)?;
        let value = serde_json::to_vec(&report)
            .map_err(|e| StoreError::Backend(format!("serialize batch report: {e}")))?;
        self.db
            .put_cf(cf, report.batch_id.as_bytes(), value)
            .map_err(|e| ReportError::Storage(StoreError::Backend(e.to_string())))?;
        Ok(())
    }
}
