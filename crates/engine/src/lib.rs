// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Shutdown delay engine: intercepts exit hooks and runs them after a drain

mod coordinator;
mod error;

pub use coordinator::{CoordinatorState, ShutdownDelay};
pub use error::CoordinatorError;
