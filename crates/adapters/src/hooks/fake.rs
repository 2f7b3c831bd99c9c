// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake hook registry for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ExitHooks, HookHandle, HookId, HookRegistry, RegistryError};
use linger_core::SharedAction;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Recorded registry call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryCall {
    List,
    Remove { id: HookId },
    Add,
}

#[derive(Default)]
struct Failures {
    list: bool,
    add: bool,
    remove: HashSet<HookId>,
}

/// Hook registry backed by a real [`ExitHooks`] with injectable failures
#[derive(Clone, Default)]
pub struct FakeHookRegistry {
    hooks: ExitHooks,
    calls: Arc<Mutex<Vec<RegistryCall>>>,
    failures: Arc<Mutex<Failures>>,
}

impl FakeHookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying registry, for registering and running hooks
    pub fn hooks(&self) -> &ExitHooks {
        &self.hooks
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<RegistryCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Make `list` fail
    pub fn fail_list(&self) {
        self.failures.lock().unwrap_or_else(|e| e.into_inner()).list = true;
    }

    /// Make `add` fail
    pub fn fail_add(&self) {
        self.failures.lock().unwrap_or_else(|e| e.into_inner()).add = true;
    }

    /// Make `remove` fail for one hook
    pub fn fail_remove(&self, id: HookId) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove
            .insert(id);
    }

    fn record(&self, call: RegistryCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }
}

impl HookRegistry for FakeHookRegistry {
    fn list(&self) -> Result<Vec<HookHandle>, RegistryError> {
        self.record(RegistryCall::List);
        if self.failures.lock().unwrap_or_else(|e| e.into_inner()).list {
            return Err(RegistryError::Injected("list".to_string()));
        }
        self.hooks.list()
    }

    fn remove(&self, hook: &HookHandle) -> Result<bool, RegistryError> {
        self.record(RegistryCall::Remove { id: hook.id() });
        let failing = self
            .failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove
            .contains(&hook.id());
        if failing {
            return Err(RegistryError::Injected(format!("remove {}", hook.id())));
        }
        self.hooks.remove(hook)
    }

    fn add(&self, action: SharedAction) -> Result<HookHandle, RegistryError> {
        self.record(RegistryCall::Add);
        if self.failures.lock().unwrap_or_else(|e| e.into_inner()).add {
            return Err(RegistryError::Injected("add".to_string()));
        }
        self.hooks.add(action)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
