use clap::Parser;
use miette::{IntoDiagnostic, Result};
use pix_payouts::application::orchestrator::{BatchOrchestrator, OrchestratorConfig};
use pix_payouts::domain::ports::{BatchReportStoreRef, PaymentStoreRef, PixGatewayRef};
use pix_payouts::infrastructure::gateway::{GatewayConfig, SimulatedPixGateway};
use pix_payouts::infrastructure::in_memory::{InMemoryPaymentStore, InMemoryReportStore};
#[cfg(feature = "storage-rocksdb")]
use pix_payouts::infrastructure::rocksdb::RocksDbStore;
use pix_payouts::interfaces::http;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to bind the HTTP server on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    bind_addr: SocketAddr,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "DB_PATH")]
    db_path: Option<PathBuf>,

    /// Minimum simulated gateway delay in milliseconds
    #[arg(long, env = "MIN_DELAY_MS", default_value_t = 50)]
    min_delay_ms: u64,

    /// Maximum simulated gateway delay in milliseconds
    #[arg(long, env = "MAX_DELAY_MS", default_value_t = 200)]
    max_delay_ms: u64,

    /// Probability in [0, 1] that a simulated transfer succeeds
    #[arg(long, env = "SUCCESS_RATE", default_value_t = 0.9)]
    success_rate: f64,

    /// Deadline for one gateway call, in milliseconds
    #[arg(long, env = "GATEWAY_TIMEOUT_MS", default_value_t = 5_000)]
    gateway_timeout_ms: u64,
}

fn build_stores(db_path: Option<PathBuf>) -> Result<(PaymentStoreRef, BatchReportStoreRef)> {
    if let Some(path) = db_path {
        #[cfg(feature = "storage-rocksdb")]
        {
            let store = RocksDbStore::open(&path).into_diagnostic()?;
            tracing::info!(path = %path.display(), "using rocksdb storage");
            return Ok((
                Arc::new(store.clone()) as PaymentStoreRef,
                Arc::new(store) as BatchReportStoreRef,
            ));
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        {
            let _ = path;
            miette::bail!("--db-path requires building with the `storage-rocksdb` feature");
        }
    }
    tracing::info!("using in-memory storage");
    Ok((
        Arc::new(InMemoryPaymentStore::new()),
        Arc::new(InMemoryReportStore::new()),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pix_payouts=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if cli.min_delay_ms > cli.max_delay_ms {
        miette::bail!(
            "--min-delay-ms ({}) must not exceed --max-delay-ms ({})",
            cli.min_delay_ms,
            cli.max_delay_ms
        );
    }
    if !(0.0..=1.0).contains(&cli.success_rate) {
        miette::bail!("--success-rate must be within [0, 1], got {}", cli.success_rate);
    }

    let (payments, reports) = build_stores(cli.db_path)?;
    let gateway: PixGatewayRef = Arc::new(SimulatedPixGateway::new(GatewayConfig {
        min_delay: Duration::from_millis(cli.min_delay_ms),
        max_delay: Duration::from_millis(cli.max_delay_ms),
        success_rate: cli.success_rate,
    }));

    let orchestrator = Arc::new(BatchOrchestrator::new(
        payments,
        reports,
        gateway,
        OrchestratorConfig {
            gateway_timeout: Duration::from_millis(cli.gateway_timeout_ms),
        },
    ));

    let app = http::app(orchestrator);
    let listener = tokio::net::TcpListener::bind(cli.bind_addr)
        .await
        .into_diagnostic()?;
    tracing::info!(addr = %cli.bind_addr, "pix payout server listening");

    axum::serve(listener, app).await.into_diagnostic()?;

    Ok(())
}
