use async_trait::async_trait;
use pix_payouts::application::orchestrator::{BatchOrchestrator, OrchestratorConfig};
use pix_payouts::domain::payout::{BatchRequest, PayoutItem};
use pix_payouts::domain::ports::PixGateway;
use pix_payouts::error::GatewayError;
use pix_payouts::infrastructure::in_memory::{InMemoryPaymentStore, InMemoryReportStore};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Deterministic gateway stub: validates items like the simulator, never
/// sleeps, counts calls, and refuses the external ids it is scripted to.
pub struct ScriptedGateway {
    refuse_ids: HashSet<String>,
    calls: AtomicUsize,
}

impl ScriptedGateway {
    pub fn always_paying() -> Arc<Self> {
        Self::refusing([])
    }

    pub fn refusing<I: IntoIterator<Item = &'static str>>(ids: I) -> Arc<Self> {
        Arc::new(Self {
            refuse_ids: ids.into_iter().map(String::from).collect(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PixGateway for ScriptedGateway {
    async fn process_payment(&self, item: &PayoutItem) -> Result<(), GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if item.amount_cents <= 0 {
            return Err(GatewayError::InvalidAmount(item.amount_cents));
        }
        if item.pix_key.trim().is_empty() {
            return Err(GatewayError::MissingKey);
        }
        if self.refuse_ids.contains(&item.external_id) {
            return Err(GatewayError::Refused);
        }
        Ok(())
    }
}

pub fn item(external_id: &str, amount_cents: i64, pix_key: &str) -> PayoutItem {
    PayoutItem {
        external_id: external_id.to_string(),
        user_id: "u1".to_string(),
        amount_cents,
        pix_key: pix_key.to_string(),
    }
}

pub fn batch(batch_id: &str, items: Vec<PayoutItem>) -> BatchRequest {
    BatchRequest {
        batch_id: batch_id.to_string(),
        items,
    }
}

/// An orchestrator over fresh in-memory stores, returning the payment store
/// for direct inspection.
pub fn orchestrator(gateway: Arc<ScriptedGateway>) -> (BatchOrchestrator, Arc<InMemoryPaymentStore>) {
    let payments = Arc::new(InMemoryPaymentStore::new());
    let orchestrator = BatchOrchestrator::new(
        payments.clone(),
        Arc::new(InMemoryReportStore::new()),
        gateway,
        OrchestratorConfig::default(),
    );
    (orchestrator, payments)
}
