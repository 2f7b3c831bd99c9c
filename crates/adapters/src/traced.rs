// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced registry wrapper for consistent observability

use crate::hooks::{HookHandle, HookRegistry, RegistryError};
use linger_core::SharedAction;

/// Wrapper that adds tracing to any HookRegistry
#[derive(Clone)]
pub struct TracedHookRegistry<R> {
    inner: R,
}

impl<R> TracedHookRegistry<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: HookRegistry> HookRegistry for TracedHookRegistry<R> {
    fn list(&self) -> Result<Vec<HookHandle>, RegistryError> {
        let result = self.inner.list();
        match &result {
            Ok(hooks) => tracing::debug!(count = hooks.len(), "listed exit hooks"),
            Err(e) => tracing::error!(error = %e, "list exit hooks failed"),
        }
        result
    }

    fn remove(&self, hook: &HookHandle) -> Result<bool, RegistryError> {
        let span = tracing::info_span!("hooks.remove", id = %hook.id());
        let _guard = span.enter();

        let result = self.inner.remove(hook);
        // Not found is fine: the hook may have been removed by its owner
        match &result {
            Ok(true) => tracing::debug!("removed"),
            Ok(false) => tracing::debug!("not registered"),
            Err(e) => tracing::warn!(error = %e, "remove failed"),
        }
        result
    }

    fn add(&self, action: SharedAction) -> Result<HookHandle, RegistryError> {
        let result = self.inner.add(action);
        match &result {
            Ok(hook) => tracing::debug!(id = %hook.id(), "exit hook added"),
            Err(e) => tracing::error!(error = %e, "add exit hook failed"),
        }
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
