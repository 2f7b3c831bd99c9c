// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Linger daemon (lingerd) library: lifecycle and connection handling

pub mod lifecycle;
pub mod server;

pub use lifecycle::{startup, Config, DaemonState, LifecycleError};
