//! oracled - PropToken verification oracle node
//!
//! Serves the verification pipeline over REST:
//! - existence, ownership and activity checks against pluggable providers
//! - signed commitment over the committed signals
//! - optional registration in an asset registry ledger

use clap::Parser;
use oracle_service::config::{LedgerMode, OracleConfig};
use oracle_service::{build_router, ServiceState};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zeroize::Zeroize;

#[derive(Parser)]
#[command(name = "oracled")]
#[command(about = "PropToken oracle node - asset verification and attestation", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "ORACLE_CONFIG")]
    config: Option<String>,

    /// Listen address, e.g. 0.0.0.0:8080
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Listen port; replaces the port of the configured address
    #[arg(short, long, env = "ORACLE_PORT")]
    port: Option<u16>,

    /// Hex-encoded secp256k1 signing key
    #[arg(long, env = "ORACLE_PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,

    /// Ledger backend
    #[arg(long, value_enum)]
    ledger: Option<LedgerMode>,

    /// Log level
    #[arg(long)]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn apply(&mut self, config: &mut OracleConfig) {
        if let Some(listen) = self.listen {
            config.server.listen_addr = listen;
        }
        if let Some(port) = self.port {
            config.server.listen_addr.set_port(port);
        }
        if let Some(mut private_key) = self.private_key.take() {
            config.signer.private_key = private_key.clone();
            private_key.zeroize();
        }
        if let Some(ledger) = self.ledger {
            config.ledger.mode = ledger;
        }
        if let Some(level) = self.log_level.take() {
            config.logging.level = level;
        }
        if self.log_json {
            config.logging.json = true;
        }
    }
}

fn init_tracing(config: &OracleConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();

    let mut config = OracleConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    init_tracing(&config);

    let state = ServiceState::bootstrap(&config)?;
    info!(
        oracle_address = %state.aggregator.oracle_address(),
        ledger = state.aggregator.ledger_id().unwrap_or("none"),
        dispatch = ?state.aggregator.dispatch(),
        "oracle node initialised"
    );

    let listener = tokio::net::TcpListener::bind(config.server.listen_addr).await?;
    info!(addr = %config.server.listen_addr, "oracled listening");
    axum::serve(listener, build_router(state)).await?;

    Ok(())
}
