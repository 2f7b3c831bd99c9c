// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup and shutdown.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use linger_adapters::{ExitHooks, TracedHookRegistry};
use linger_core::{ActiveCount, ConfigError, ShutdownConfig};
use linger_engine::ShutdownDelay;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

/// Environment variable overriding the listen address
pub const BIND_ENV: &str = "LINGER_BIND";

const DEFAULT_BIND: &str = "127.0.0.1:0";

/// Coordinator over the traced in-process registry
pub type DaemonCoordinator = ShutdownDelay<TracedHookRegistry<ExitHooks>>;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Config file the settings were read from, if any
    pub config_path: Option<PathBuf>,
    /// Address to listen on
    pub bind_addr: SocketAddr,
    /// Drain and interception settings
    pub shutdown: ShutdownConfig,
}

impl Config {
    /// Load from an optional config file, with `LINGER_BIND` overriding the
    /// listen address
    pub fn load(config_path: Option<&Path>) -> Result<Self, LifecycleError> {
        let shutdown = match config_path {
            Some(path) => ShutdownConfig::load(path)?,
            None => ShutdownConfig::default(),
        };
        let bind = std::env::var(BIND_ENV).unwrap_or_else(|_| DEFAULT_BIND.to_string());
        let bind_addr = bind
            .parse()
            .map_err(|_| LifecycleError::InvalidBindAddr(bind.clone()))?;

        Ok(Self {
            config_path: config_path.map(Path::to_path_buf),
            bind_addr,
            shutdown,
        })
    }
}

/// Daemon state during operation
pub struct DaemonState {
    /// TCP listener
    pub listener: TcpListener,
    /// In-flight connections
    pub active: ActiveCount,
    /// Exit hooks run on shutdown
    pub hooks: ExitHooks,
    /// Delays the exit hooks until connections drain
    pub coordinator: DaemonCoordinator,
    /// Connections accepted so far
    pub connections: Arc<AtomicU64>,
}

impl DaemonState {
    pub fn local_addr(&self) -> Result<SocketAddr, LifecycleError> {
        Ok(self.listener.local_addr()?)
    }

    /// Shutdown the daemon gracefully
    ///
    /// Closes the listener, then runs the exit hooks; once intercepted, that
    /// waits for active connections to drain before running the original
    /// hooks. New clients are refused while the drain runs.
    pub async fn shutdown(self) -> usize {
        drop(self.listener);
        info!(
            active = self.active.active(),
            state = %self.coordinator.state(),
            "Shutting down daemon..."
        );
        let ran = self.hooks.run_all().await;
        info!("Daemon shutdown complete");
        ran
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid bind address: {0}")]
    InvalidBindAddr(String),

    #[error("Failed to bind {0}: {1}")]
    BindFailed(SocketAddr, std::io::Error),

    #[error("Could not determine log directory")]
    NoLogDir,

    #[error("Exit hook registration failed: {0}")]
    Hooks(#[from] linger_adapters::RegistryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    // 1. Bind listener
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .map_err(|e| LifecycleError::BindFailed(config.bind_addr, e))?;

    // 2. Register the daemon's own exit work
    let active = ActiveCount::new(config.shutdown.drain.clone());
    let hooks = ExitHooks::new();
    let connections = Arc::new(AtomicU64::new(0));
    let start_time = Instant::now();
    {
        let connections = Arc::clone(&connections);
        hooks.register(move || {
            let served = connections.load(Ordering::SeqCst);
            async move {
                info!(
                    served,
                    uptime_ms = start_time.elapsed().as_millis() as u64,
                    "listener closed"
                );
            }
        })?;
    }

    // 3. Delay those hooks behind the drain once registration settles
    let coordinator = ShutdownDelay::new(TracedHookRegistry::new(hooks.clone()));
    let _ = coordinator.register(config.shutdown.register_delay, active.as_callback());

    info!(
        addr = %listener.local_addr()?,
        register_delay_ms = config.shutdown.register_delay.as_millis() as u64,
        max_wait_ms = config.shutdown.drain.max_wait().as_millis() as u64,
        "Daemon started"
    );

    Ok(DaemonState {
        listener,
        active,
        hooks,
        coordinator,
        connections,
    })
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
