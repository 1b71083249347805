//! CLI Interface Module
//!
//! The application's entry point. Per spec §6 the binary takes no
//! arguments: it seeds a small built-in symbol set, binds the matching
//! socket at the fixed address the spec mandates, starts the observability
//! HTTP server, and runs until SIGINT/SIGTERM.
//!
//! ## Responsibilities
//! - Initialize logging
//! - Open the WAL and seed `SymbolConfigRegistry`/`EngineController`
//! - Bind the TCP listener and the observability server
//! - Handle graceful shutdown

use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::application::controller::EngineController;
use crate::application::wal::{FileWalSink, WalSink};
use crate::domain::config::SymbolConfigRegistry;
use crate::infrastructure::network;
use crate::infrastructure::observability::ObservabilityServer;

/// Fixed per spec §6: "binds TCP 0.0.0.0:9999. ... No environment
/// variables are required."
const MATCHING_ADDR: &str = "0.0.0.0:9999";
const OBSERVABILITY_PORT: u16 = 9090;
const WAL_PATH: &str = "matching_engine.wal";

/// A small built-in symbol set so the server is immediately useful without
/// an external config loader (SPEC_FULL.md §A.3) — `(symbol, tick_size,
/// min_quantity, min_price, max_price, volatility_threshold, reference_price)`.
const SEED_SYMBOLS: &[(&str, f64, u64, f64, f64, f64, f64)] = &[
    ("AAPL", 0.01, 1, 1.00, 10_000.00, 0.5, 150.00),
    ("MSFT", 0.01, 1, 1.00, 10_000.00, 0.5, 330.00),
    ("GOOG", 0.01, 1, 1.00, 10_000.00, 0.5, 140.00),
];

/// Runs the CLI application. Returns exit code 0 on normal shutdown, 1 on
/// initialization failure (spec §6).
pub async fn run() -> ExitCode {
    init_logging();
    info!("matching engine starting");

    let wal: Arc<dyn WalSink> = match FileWalSink::open(WAL_PATH) {
        Ok(wal) => Arc::new(wal),
        Err(e) => {
            error!(error = %e, path = WAL_PATH, "failed to open WAL, aborting startup");
            return ExitCode::from(1);
        }
    };

    let config = Arc::new(SymbolConfigRegistry::new());
    let controller = Arc::new(EngineController::new(config, wal));
    for &(symbol, tick_size, min_qty, min_price, max_price, vol_threshold, ref_price) in SEED_SYMBOLS {
        controller.add_engine_for_symbol(Arc::from(symbol), tick_size, min_qty, min_price, max_price, vol_threshold, ref_price);
    }

    let listener = match tokio::net::TcpListener::bind(MATCHING_ADDR).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, addr = MATCHING_ADDR, "failed to bind matching socket, aborting startup");
            return ExitCode::from(1);
        }
    };
    info!(addr = MATCHING_ADDR, "matching socket bound");

    let observability = ObservabilityServer::new(OBSERVABILITY_PORT);

    tokio::select! {
        result = network::serve(listener, controller) => {
            if let Err(e) = result {
                error!(error = %e, "session acceptor loop exited with error");
            }
        }
        result = observability.run() => {
            if let Err(e) = result {
                error!(error = %e, "observability server exited with error");
            }
        }
        _ = shutdown_signal() => {
            info!("shutdown signal received");
        }
    }

    info!("matching engine shutting down");
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}
