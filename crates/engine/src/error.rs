// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the shutdown coordinator

use crate::CoordinatorState;
use linger_adapters::RegistryError;
use thiserror::Error;

/// Errors that abort a swap; the host's own exit path stays in effect
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("failed to enumerate exit hooks: {0}")]
    Enumerate(#[source] RegistryError),
    #[error("failed to install shutdown hook: {0}")]
    Install(#[source] RegistryError),
    #[error("exit hooks already intercepted (state: {0})")]
    AlreadyIntercepted(CoordinatorState),
}
