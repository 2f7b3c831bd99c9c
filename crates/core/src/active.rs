// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Active request counting with a bounded wait for idle
//!
//! Request handlers bump the count while work is in flight. At shutdown
//! [`ActiveCount::wait_until_idle`] first sleeps `initial_delay` (letting
//! DNS/router changes drain new traffic away) and then polls the count every
//! `pause_interval`, giving up after `max_pauses` checks so shutdown never
//! blocks forever.

use crate::action::ExitAction;
use crate::config::DrainConfig;
use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{info, warn};

/// How a wait for idle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Count reached zero after this many pauses
    Idle { pauses: u32 },
    /// Still busy after `max_pauses`; shutting down anyway
    Exhausted,
    /// Woken by [`ActiveCount::interrupt`]
    Interrupted,
}

#[derive(Debug)]
struct Inner {
    count: AtomicI64,
    config: DrainConfig,
    interrupt: Notify,
}

/// Counter of in-flight work.
///
/// Clones share the same count. The count is not clamped: decrementing
/// below zero is the caller's bug, not an error.
#[derive(Debug, Clone)]
pub struct ActiveCount {
    inner: Arc<Inner>,
}

impl ActiveCount {
    pub fn new(config: DrainConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                count: AtomicI64::new(0),
                config,
                interrupt: Notify::new(),
            }),
        }
    }

    /// Current number of active requests
    pub fn active(&self) -> i64 {
        self.inner.count.load(Ordering::SeqCst)
    }

    pub fn increment(&self) {
        self.inner.count.fetch_add(1, Ordering::SeqCst);
    }

    pub fn decrement(&self) {
        self.inner.count.fetch_sub(1, Ordering::SeqCst);
    }

    /// Increment now and decrement when the guard drops
    pub fn enter(&self) -> ActiveGuard {
        self.increment();
        ActiveGuard {
            count: self.clone(),
        }
    }

    /// Wake any in-progress [`wait_until_idle`](Self::wait_until_idle) so
    /// shutdown proceeds immediately
    pub fn interrupt(&self) {
        self.inner.interrupt.notify_waiters();
    }

    /// Callback form of [`wait_until_idle`](Self::wait_until_idle)
    pub fn as_callback(&self) -> WaitUntilIdle {
        WaitUntilIdle {
            count: self.clone(),
        }
    }

    /// Wait until idle, bounded by
    /// `initial_delay + pause_interval * max(max_pauses, 1)`.
    ///
    /// Never fails: exhaustion and interruption are logged and reported in
    /// the outcome, and the caller proceeds with shutdown either way.
    pub async fn wait_until_idle(&self) -> WaitOutcome {
        let interrupted = self.inner.interrupt.notified();
        tokio::pin!(interrupted);
        // Register before the first sleep so an interrupt is never missed
        interrupted.as_mut().enable();

        tokio::select! {
            outcome = self.until_idle() => outcome,
            _ = &mut interrupted => {
                warn!(active = self.active(), "interrupted while waiting to go idle");
                WaitOutcome::Interrupted
            }
        }
    }

    async fn until_idle(&self) -> WaitOutcome {
        let config = &self.inner.config;
        tokio::time::sleep(config.initial_delay).await;

        let mut pauses = 0;
        loop {
            let active = self.active();
            if active < 1 {
                return WaitOutcome::Idle { pauses };
            }
            pauses += 1;
            info!("WAIT for {} active requests", active);
            tokio::time::sleep(config.pause_interval).await;
            if pauses >= config.max_pauses {
                break;
            }
        }

        warn!(
            active = self.active(),
            pauses, "maximum wait, not idle but shutting down anyway"
        );
        WaitOutcome::Exhausted
    }
}

impl Default for ActiveCount {
    fn default() -> Self {
        Self::new(DrainConfig::default())
    }
}

/// Holds one unit of active work; decrements on drop
#[derive(Debug)]
pub struct ActiveGuard {
    count: ActiveCount,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.count.decrement();
    }
}

/// [`ExitAction`] that waits for an [`ActiveCount`] to go idle
#[derive(Debug, Clone)]
pub struct WaitUntilIdle {
    count: ActiveCount,
}

#[async_trait]
impl ExitAction for WaitUntilIdle {
    async fn run(&self) {
        self.count.wait_until_idle().await;
    }
}

#[cfg(test)]
#[path = "active_tests.rs"]
mod tests;
