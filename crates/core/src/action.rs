// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Zero-argument actions run at process exit

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// A unit of work with no arguments and no result.
///
/// Exit hooks, the master hook and the delay callback are all `ExitAction`s.
/// Failures surface as panics, which the runner catches on the task boundary.
#[async_trait]
pub trait ExitAction: Send + Sync + 'static {
    async fn run(&self);
}

#[async_trait]
impl<F, Fut> ExitAction for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn run(&self) {
        (self)().await
    }
}

/// Shared, type-erased action
pub type SharedAction = Arc<dyn ExitAction>;

/// Erase an action into a [`SharedAction`]
pub fn shared(action: impl ExitAction) -> SharedAction {
    Arc::new(action)
}

/// Run an action on its own task so a panic stays contained.
///
/// Returns `false` when the action panicked or was cancelled.
pub async fn run_isolated(action: SharedAction) -> bool {
    let handle = tokio::spawn(async move { action.run().await });
    match handle.await {
        Ok(()) => true,
        Err(e) if e.is_panic() => {
            tracing::warn!(error = %e, "exit action panicked");
            false
        }
        Err(e) => {
            tracing::warn!(error = %e, "exit action cancelled");
            false
        }
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
