// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exit hook registries
//!
//! A [`HookRegistry`] is the host's "run these on exit" facility. The
//! coordinator only needs to enumerate, remove and add hooks; running them is
//! done through the captured [`HookHandle`]s.

mod exit;

pub use exit::ExitHooks;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeHookRegistry, RegistryCall};

use linger_core::SharedAction;
use std::fmt;
use thiserror::Error;
use tokio::task::JoinSet;

/// Errors from registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("hook registry unavailable: {0}")]
    Unavailable(String),
    #[error("shutdown in progress")]
    ShutdownInProgress,
    #[error("injected failure: {0}")]
    Injected(String),
}

/// Registry-assigned hook identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HookId(pub u64);

impl fmt::Display for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hook-{}", self.0)
    }
}

/// Handle to a registered exit hook
#[derive(Clone)]
pub struct HookHandle {
    id: HookId,
    action: SharedAction,
}

impl HookHandle {
    pub fn new(id: HookId, action: SharedAction) -> Self {
        Self { id, action }
    }

    pub fn id(&self) -> HookId {
        self.id
    }

    pub fn action(&self) -> &SharedAction {
        &self.action
    }

    /// Run the hook's action on the current task
    pub async fn run(&self) {
        self.action.run().await
    }
}

impl PartialEq for HookHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for HookHandle {}

impl fmt::Debug for HookHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookHandle").field("id", &self.id).finish()
    }
}

/// The host's registry of actions to run at exit
pub trait HookRegistry: Clone + Send + Sync + 'static {
    /// Currently registered hooks
    fn list(&self) -> Result<Vec<HookHandle>, RegistryError>;

    /// Remove a hook; `Ok(false)` if it was not registered
    fn remove(&self, hook: &HookHandle) -> Result<bool, RegistryError>;

    /// Register an action to run at exit
    fn add(&self, action: SharedAction) -> Result<HookHandle, RegistryError>;
}

/// Result of running a batch of hooks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub failed: usize,
}

/// Start every hook on its own task and wait for all of them.
///
/// Order among the hooks is unspecified. A hook that panics or is cancelled
/// is logged and counted as failed; it never stops the others.
pub async fn run_hooks(hooks: Vec<HookHandle>) -> RunSummary {
    let mut set = JoinSet::new();
    for hook in hooks {
        set.spawn(async move {
            hook.run().await;
            hook.id()
        });
    }

    let mut summary = RunSummary::default();
    while let Some(result) = set.join_next().await {
        match result {
            Ok(id) => {
                tracing::debug!(%id, "exit hook finished");
                summary.completed += 1;
            }
            Err(e) if e.is_panic() => {
                tracing::warn!(error = %e, "exit hook panicked");
                summary.failed += 1;
            }
            Err(e) => {
                // Cancelled while waiting; keep going with the rest
                tracing::warn!(error = %e, "exit hook cancelled");
                summary.failed += 1;
            }
        }
    }
    summary
}
