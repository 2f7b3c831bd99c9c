// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! linger-core: building blocks for delaying process shutdown
//!
//! This crate provides:
//! - [`ExitAction`], the zero-argument async action run at exit
//! - [`ActiveCount`], an in-flight work counter with a bounded wait for idle
//! - Configuration for drain timings and interception delay

pub mod action;
pub mod active;
pub mod config;

pub use action::{run_isolated, shared, ExitAction, SharedAction};
pub use active::{ActiveCount, ActiveGuard, WaitOutcome, WaitUntilIdle};
pub use config::{ConfigError, DrainConfig, ShutdownConfig};
