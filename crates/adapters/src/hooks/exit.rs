// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process exit hook registry

use super::{run_hooks, HookHandle, HookId, HookRegistry, RegistryError};
use linger_core::{shared, ExitAction, SharedAction};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct HooksState {
    hooks: BTreeMap<HookId, SharedAction>,
    next_id: u64,
    shutting_down: bool,
}

/// Registry of actions the process runs when it exits.
///
/// Components register their exit work here instead of running it from their
/// own signal handlers; the entry point calls [`ExitHooks::run_all`] once the
/// process decides to stop. Clones share the same registry.
#[derive(Clone, Default)]
pub struct ExitHooks {
    state: Arc<Mutex<HooksState>>,
}

impl ExitHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register any [`ExitAction`]
    pub fn register(&self, action: impl ExitAction) -> Result<HookHandle, RegistryError> {
        self.add(shared(action))
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .hooks
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True once [`run_all`](Self::run_all) has started
    pub fn is_shutting_down(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .shutting_down
    }

    /// Run every registered hook concurrently and wait for all of them.
    ///
    /// Only the first call runs anything; later calls return 0. The registry
    /// rejects changes from the moment this starts.
    pub async fn run_all(&self) -> usize {
        let hooks: Vec<HookHandle> = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if state.shutting_down {
                return 0;
            }
            state.shutting_down = true;
            std::mem::take(&mut state.hooks)
                .into_iter()
                .map(|(id, action)| HookHandle::new(id, action))
                .collect()
        };
        // Lock released: hooks may inspect the registry while they run

        let count = hooks.len();
        tracing::info!(count, "running exit hooks");
        let summary = run_hooks(hooks).await;
        if summary.failed > 0 {
            tracing::warn!(failed = summary.failed, "some exit hooks failed");
        }
        count
    }
}

impl HookRegistry for ExitHooks {
    fn list(&self) -> Result<Vec<HookHandle>, RegistryError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state
            .hooks
            .iter()
            .map(|(id, action)| HookHandle::new(*id, Arc::clone(action)))
            .collect())
    }

    fn remove(&self, hook: &HookHandle) -> Result<bool, RegistryError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.shutting_down {
            return Err(RegistryError::ShutdownInProgress);
        }
        Ok(state.hooks.remove(&hook.id()).is_some())
    }

    fn add(&self, action: SharedAction) -> Result<HookHandle, RegistryError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.shutting_down {
            return Err(RegistryError::ShutdownInProgress);
        }
        state.next_id += 1;
        let id = HookId(state.next_id);
        state.hooks.insert(id, Arc::clone(&action));
        Ok(HookHandle::new(id, action))
    }
}

#[cfg(test)]
#[path = "exit_tests.rs"]
mod tests;
