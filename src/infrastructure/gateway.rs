use crate::domain::payout::PayoutItem;
use crate::domain::ports::PixGateway;
use crate::error::GatewayError;
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

/// Tuning knobs for the simulated PIX rail.
#[derive(Debug, Clone, Copy)]
pub struct GatewayConfig {
    pub min_delay: Duration,
    pub max_delay: Duration,
    /// Probability in `[0, 1]` that a transfer is accepted by the rail.
    pub success_rate: f64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(50),
            max_delay: Duration::from_millis(200),
            success_rate: 0.9,
        }
    }
}

/// Simulates an external PIX rail call: a bounded random delay followed by
/// success or refusal according to the configured success rate.
///
/// Item validation happens before any delay, so malformed items fail fast.
pub struct SimulatedPixGateway {
    config: GatewayConfig,
}

impl SimulatedPixGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PixGateway for SimulatedPixGateway {
    async fn process_payment(&self, item: &PayoutItem) -> Result<(), GatewayError> {
        if item.amount_cents <= 0 {
            return Err(GatewayError::InvalidAmount(item.amount_cents));
        }
        if item.pix_key.trim().is_empty() {
            return Err(GatewayError::MissingKey);
        }

        // The rng handle must not be held across an await point.
        let delay = {
            let mut rng = rand::thread_rng();
            rng.gen_range(self.config.min_delay..=self.config.max_delay)
        };
        tokio::time::sleep(delay).await;

        let roll: f64 = rand::thread_rng().r#gen();
        if roll < self.config.success_rate {
            Ok(())
        } else {
            Err(GatewayError::Refused)
        }
    }
}
