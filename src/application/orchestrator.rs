use crate::domain::payout::{
    BatchReport, BatchRequest, BatchResponse, DetailStatus, PaymentRecord, PaymentStatus,
    PayoutDetail, PayoutItem,
};
use crate::domain::ports::{BatchReportStoreRef, PaymentStoreRef, PixGatewayRef};
use crate::error::{BatchError, ClaimError, GatewayError, ReportError};
use chrono::Utc;
use std::time::Duration;
use tokio::task::JoinSet;

#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    /// Deadline for one gateway call. An item whose call outlives this is
    /// recorded as `failed` with a timeout error, never left `pending`.
    pub gateway_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            gateway_timeout: Duration::from_secs(5),
        }
    }
}

/// The batch payment orchestrator.
///
/// Fans a validated batch out into one concurrent task per item, coordinates
/// claims against the payment store, joins on all tasks, and folds the
/// per-item details into a consolidated report. It owns no record lifecycle;
/// all mutation goes through the store ports.
pub struct BatchOrchestrator {
    payments: PaymentStoreRef,
    reports: BatchReportStoreRef,
    gateway: PixGatewayRef,
    config: OrchestratorConfig,
}

impl BatchOrchestrator {
    pub fn new(
        payments: PaymentStoreRef,
        reports: BatchReportStoreRef,
        gateway: PixGatewayRef,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            payments,
            reports,
            gateway,
            config,
        }
    }

    /// Processes one batch end to end.
    ///
    /// Validation failures and batch report lookup failures reject the whole
    /// batch before any item task is spawned. Per-item failures are folded
    /// into that item's detail and never abort siblings, so the response
    /// always satisfies `processed == successful + failed + duplicates`.
    pub async fn process_batch(&self, request: BatchRequest) -> Result<BatchResponse, BatchError> {
        request.validate()?;

        // Full-batch idempotency: a stored report short-circuits the batch
        // with zero workers and zero gateway calls.
        if let Some(report) = self.reports.get(&request.batch_id).await? {
            tracing::info!(
                batch_id = %request.batch_id,
                "batch already processed, returning stored report"
            );
            return self.rehydrate(report, &request).await;
        }

        tracing::info!(
            batch_id = %request.batch_id,
            item_count = request.items.len(),
            "dispatching batch"
        );

        let mut tasks = JoinSet::new();
        for (idx, item) in request.items.iter().cloned().enumerate() {
            let worker = ItemWorker {
                payments: self.payments.clone(),
                gateway: self.gateway.clone(),
                gateway_timeout: self.config.gateway_timeout,
                batch_id: request.batch_id.clone(),
            };
            tasks.spawn(async move { (idx, worker.run(item).await) });
        }

        // Join barrier: completion order is non-deterministic, so details
        // are re-indexed into submission order.
        let mut slots: Vec<Option<PayoutDetail>> = vec![None; request.items.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, detail)) => slots[idx] = Some(detail),
                Err(err) => tracing::error!(error = %err, "payout worker aborted"),
            }
        }
        let details: Vec<PayoutDetail> = slots
            .into_iter()
            .zip(&request.items)
            .map(|(slot, item)| {
                slot.unwrap_or_else(|| {
                    PayoutDetail::failed(
                        item.external_id.clone(),
                        item.amount_cents,
                        "payout worker aborted".to_string(),
                    )
                })
            })
            .collect();

        let successful = details
            .iter()
            .filter(|d| d.status == DetailStatus::Paid)
            .count();
        let failed = details
            .iter()
            .filter(|d| d.status == DetailStatus::Failed)
            .count();
        let duplicates = details
            .iter()
            .filter(|d| d.status == DetailStatus::Duplicate)
            .count();

        let now = Utc::now();
        let report = BatchReport {
            batch_id: request.batch_id.clone(),
            processed: details.len(),
            successful,
            failed,
            duplicates,
            created_at: now,
            updated_at: now,
        };

        match self.reports.create(report.clone()).await {
            Ok(()) => {}
            Err(ReportError::AlreadyExists(_)) => {
                // Lost a create race against a concurrent submission of the
                // same batch id; the stored report is authoritative.
                tracing::warn!(batch_id = %request.batch_id, "batch report already created");
                if let Some(stored) = self.reports.get(&request.batch_id).await? {
                    return self.rehydrate(stored, &request).await;
                }
            }
            Err(ReportError::Storage(err)) => return Err(err.into()),
        }

        tracing::info!(
            batch_id = %request.batch_id,
            processed = report.processed,
            successful = report.successful,
            failed = report.failed,
            duplicates = report.duplicates,
            "batch completed"
        );

        Ok(BatchResponse {
            batch_id: request.batch_id,
            processed: report.processed,
            successful,
            failed,
            duplicates,
            details,
        })
    }

    /// Rebuilds the response for an already completed batch from the stored
    /// report and the stored record projections, in request order.
    async fn rehydrate(
        &self,
        report: BatchReport,
        request: &BatchRequest,
    ) -> Result<BatchResponse, BatchError> {
        let mut details = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let detail = match self.payments.get(&item.external_id).await? {
                // A record claimed under a different batch id was a
                // duplicate in this one; its raw status belongs to the
                // claiming batch.
                Some(record) if record.batch_id != request.batch_id => {
                    PayoutDetail::duplicate_of(&record)
                }
                Some(record) => PayoutDetail::from(&record),
                None => PayoutDetail::failed(
                    item.external_id.clone(),
                    item.amount_cents,
                    "no payment record".to_string(),
                ),
            };
            details.push(detail);
        }
        Ok(BatchResponse {
            batch_id: report.batch_id,
            processed: report.processed,
            successful: report.successful,
            failed: report.failed,
            duplicates: report.duplicates,
            details,
        })
    }
}

/// Per-item task: claim, pay, record the outcome.
struct ItemWorker {
    payments: PaymentStoreRef,
    gateway: PixGatewayRef,
    gateway_timeout: Duration,
    batch_id: String,
}

impl ItemWorker {
    async fn run(&self, item: PayoutItem) -> PayoutDetail {
        let record = PaymentRecord::pending(&item, &self.batch_id);
        match self.payments.claim(record).await {
            Ok(()) => self.execute(item).await,
            Err(ClaimError::AlreadyClaimed(_)) => self.classify_duplicate(item).await,
            Err(ClaimError::Storage(err)) => {
                tracing::warn!(
                    external_id = %item.external_id,
                    error = %err,
                    "claim failed against storage"
                );
                PayoutDetail::failed(item.external_id, item.amount_cents, err.to_string())
            }
        }
    }

    /// Runs the gateway call under the configured deadline and records the
    /// terminal status on the claimed record.
    async fn execute(&self, item: PayoutItem) -> PayoutDetail {
        let outcome =
            match tokio::time::timeout(self.gateway_timeout, self.gateway.process_payment(&item))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(GatewayError::Timeout(self.gateway_timeout.as_millis() as u64)),
            };

        let (status, error) = match &outcome {
            Ok(()) => (PaymentStatus::Paid, None),
            Err(err) => (PaymentStatus::Failed, Some(err.to_string())),
        };

        if let Err(err) = self
            .payments
            .update_status(&item.external_id, status, error.clone())
            .await
        {
            tracing::error!(
                external_id = %item.external_id,
                error = %err,
                "failed to record payout outcome"
            );
            return PayoutDetail::failed(item.external_id, item.amount_cents, err.to_string());
        }

        match error {
            None => PayoutDetail::paid(item.external_id, item.amount_cents),
            Some(error) => PayoutDetail::failed(item.external_id, item.amount_cents, error),
        }
    }

    /// Immediate non-blocking duplicate classification: the detail projects
    /// whatever record state the claim winner has produced so far, without
    /// waiting for a terminal status.
    async fn classify_duplicate(&self, item: PayoutItem) -> PayoutDetail {
        match self.payments.get(&item.external_id).await {
            Ok(Some(record)) => PayoutDetail::duplicate_of(&record),
            Ok(None) => PayoutDetail {
                external_id: item.external_id,
                status: DetailStatus::Duplicate,
                amount_cents: item.amount_cents,
                error: None,
            },
            Err(err) => {
                tracing::warn!(
                    external_id = %item.external_id,
                    error = %err,
                    "could not project winning record for duplicate detail"
                );
                PayoutDetail {
                    external_id: item.external_id,
                    status: DetailStatus::Duplicate,
                    amount_cents: item.amount_cents,
                    error: None,
                }
            }
        }
    }
}
