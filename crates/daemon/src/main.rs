// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Linger Daemon (lingerd)
//!
//! Echo server that drains in-flight connections before running its exit
//! hooks on SIGTERM/SIGINT.

use std::path::PathBuf;
use std::sync::atomic::Ordering;

use linger_daemon::lifecycle::{self, Config, LifecycleError};
use linger_daemon::server;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let config_path = args.get(1).map(PathBuf::from);

    // Load configuration
    let config = Config::load(config_path.as_deref())?;

    // Set up logging
    let _log_guard = setup_logging(&config)?;

    // Start daemon
    let daemon = match lifecycle::startup(&config).await {
        Ok(d) => d,
        Err(e) => {
            error!("Failed to start daemon: {}", e);
            return Err(e.into());
        }
    };

    // Set up signal handlers
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let addr = daemon.local_addr()?;
    info!("Daemon ready, listening on {}", addr);

    // Signal ready for parent process
    println!("READY {}", addr);

    // Main event loop
    loop {
        tokio::select! {
            // Accept client connections
            result = daemon.listener.accept() => {
                match result {
                    Ok((stream, peer)) => {
                        daemon.connections.fetch_add(1, Ordering::SeqCst);
                        let active = daemon.active.enter();
                        tokio::spawn(async move {
                            if let Err(e) = server::handle_connection(stream, active).await {
                                error!("Error handling connection from {}: {}", peer, e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                    }
                }
            }

            // Graceful shutdown on SIGTERM
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                break;
            }

            // Graceful shutdown on SIGINT
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down...");
                break;
            }
        }
    }

    // Stop accepting; connections already in flight keep running while the
    // exit hooks wait for them
    let ran = daemon.shutdown().await;

    info!(ran, "Daemon stopped");
    println!("Daemon stopped");
    Ok(())
}

fn setup_logging(
    config: &Config,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(log_path) = &config.shutdown.log_path else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
        return Ok(None);
    };

    // Create log directory if needed
    let dir = log_path.parent().ok_or(LifecycleError::NoLogDir)?;
    std::fs::create_dir_all(dir)?;

    // Set up file appender
    let file_appender = tracing_appender::rolling::never(
        dir,
        log_path.file_name().ok_or(LifecycleError::NoLogDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(Some(guard))
}
