// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shutdown delay coordinator
//!
//! Intercepts the exit hooks registered with a [`HookRegistry`] and replaces
//! them with a single master hook. When the host runs its exit hooks, the
//! master hook first runs the delay callback (typically waiting for active
//! requests to drain) and then runs the original hooks.
//!
//! Hooks registered after the swap are not intercepted; they run alongside
//! the master hook.

use crate::error::CoordinatorError;
use async_trait::async_trait;
use linger_adapters::{run_hooks, HookHandle, HookRegistry};
use linger_core::{run_isolated, shared, ExitAction, SharedAction};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Coordinator lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// No swap performed (or the swap was aborted)
    Idle,
    /// Master hook installed, original hooks held
    Intercepted,
    /// Master hook running
    Terminating,
    /// Original hooks have run (or been attempted)
    Done,
}

impl fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoordinatorState::Idle => "idle",
            CoordinatorState::Intercepted => "intercepted",
            CoordinatorState::Terminating => "terminating",
            CoordinatorState::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Default)]
struct Held {
    delay_callback: Option<SharedAction>,
    captured: Option<Vec<HookHandle>>,
}

struct Inner<R> {
    registry: R,
    state: Mutex<CoordinatorState>,
    // Guards swap and master hook execution
    held: tokio::sync::Mutex<Held>,
}

impl<R: HookRegistry> Inner<R> {
    fn state(&self) -> CoordinatorState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: CoordinatorState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    async fn run_master(&self) {
        let mut held = self.held.lock().await;
        let state = self.state();
        if state != CoordinatorState::Intercepted {
            warn!(%state, "shutdown hook invoked out of order, ignoring");
            return;
        }
        self.set_state(CoordinatorState::Terminating);
        info!("shutdown requested");

        if let Some(callback) = held.delay_callback.take() {
            if !run_isolated(callback).await {
                warn!("error executing shutdown delay callback");
            }
        }

        if let Some(hooks) = held.captured.take() {
            info!(count = hooks.len(), "executing normal exit hooks");
            let summary = run_hooks(hooks).await;
            debug!(
                completed = summary.completed,
                failed = summary.failed,
                "normal exit hooks finished"
            );
        }

        self.set_state(CoordinatorState::Done);
    }
}

/// Delays the host's exit hooks behind a callback.
///
/// Create one per process in startup code and clone it to wherever
/// registration happens.
pub struct ShutdownDelay<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for ShutdownDelay<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: HookRegistry> ShutdownDelay<R> {
    pub fn new(registry: R) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry,
                state: Mutex::new(CoordinatorState::Idle),
                held: tokio::sync::Mutex::new(Held::default()),
            }),
        }
    }

    /// Current state; never waits on a running swap or master hook
    pub fn state(&self) -> CoordinatorState {
        self.inner.state()
    }

    /// Register a delay callback to run before the usual exit hooks.
    ///
    /// The swap happens after `delay`, which should be long enough for the
    /// application to finish registering its own exit hooks. The returned
    /// handle resolves to the swap result and may be ignored.
    pub fn register(
        &self,
        delay: Duration,
        delay_callback: impl ExitAction,
    ) -> JoinHandle<Result<usize, CoordinatorError>> {
        let coordinator = self.clone();
        let callback = shared(delay_callback);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            coordinator.swap_shared(callback).await
        })
    }

    /// Capture the registered exit hooks and install the master hook now.
    ///
    /// Returns the number of hooks captured. On error the registry is left as
    /// it was, with every hook under its original id, and the state stays
    /// [`CoordinatorState::Idle`]. A second registration is rejected without
    /// touching anything.
    pub async fn swap(&self, delay_callback: impl ExitAction) -> Result<usize, CoordinatorError> {
        self.swap_shared(shared(delay_callback)).await
    }

    async fn swap_shared(&self, delay_callback: SharedAction) -> Result<usize, CoordinatorError> {
        let mut held = self.inner.held.lock().await;

        let state = self.state();
        if state != CoordinatorState::Idle {
            warn!(%state, "exit hooks already intercepted, ignoring registration");
            return Err(CoordinatorError::AlreadyIntercepted(state));
        }

        let registry = &self.inner.registry;
        let existing = registry.list().map_err(|e| {
            error!(error = %e, "error getting exit hooks");
            CoordinatorError::Enumerate(e)
        })?;
        debug!(count = existing.len(), "de-register existing exit hooks");

        // Installed before anything is removed, so a failure leaves every
        // hook registered under its own id
        let master = MasterHook {
            inner: Arc::clone(&self.inner),
        };
        registry.add(shared(master)).map_err(|e| {
            error!(error = %e, "error installing shutdown hook");
            CoordinatorError::Install(e)
        })?;

        let mut captured = Vec::with_capacity(existing.len());
        for hook in existing {
            // A hook we fail to remove stays with the host and is not captured,
            // so it still runs exactly once
            match registry.remove(&hook) {
                Ok(true) => captured.push(hook),
                Ok(false) => debug!(id = %hook.id(), "exit hook already removed"),
                Err(e) => warn!(
                    id = %hook.id(),
                    error = %e,
                    "failed to remove exit hook, leaving it registered"
                ),
            }
        }

        let count = captured.len();
        held.delay_callback = Some(delay_callback);
        held.captured = Some(captured);
        self.inner.set_state(CoordinatorState::Intercepted);

        info!(count, "registered shutdown delay hook");
        Ok(count)
    }
}

/// The single exit hook installed in place of all others
struct MasterHook<R> {
    inner: Arc<Inner<R>>,
}

#[async_trait]
impl<R: HookRegistry> ExitAction for MasterHook<R> {
    async fn run(&self) {
        self.inner.run_master().await
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
