// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing_subscriber::fmt::MakeWriter;

/// Paused-clock timings land on exact millisecond ticks; allow a little slack
fn assert_elapsed(start: Instant, expected: Duration) {
    let elapsed = start.elapsed();
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(5),
        "expected about {:?}, got {:?}",
        expected,
        elapsed
    );
}

fn test_config() -> DrainConfig {
    DrainConfig::default()
        .with_initial_delay(Duration::from_millis(1000))
        .with_pause_interval(Duration::from_millis(500))
        .with_max_pauses(4)
}

#[test]
fn new_count_is_zero() {
    let count = ActiveCount::default();
    assert_eq!(count.active(), 0);
}

#[test]
fn increment_and_decrement_net_out() {
    let count = ActiveCount::default();
    count.increment();
    count.increment();
    count.decrement();
    assert_eq!(count.active(), 1);
}

#[test]
fn decrement_below_zero_is_not_rejected() {
    let count = ActiveCount::default();
    count.decrement();
    assert_eq!(count.active(), -1);
}

#[test]
fn clones_share_the_count() {
    let count = ActiveCount::default();
    let other = count.clone();
    other.increment();
    assert_eq!(count.active(), 1);
}

#[test]
fn guard_decrements_on_drop() {
    let count = ActiveCount::default();
    {
        let _a = count.enter();
        let _b = count.enter();
        assert_eq!(count.active(), 2);
    }
    assert_eq!(count.active(), 0);
}

#[test]
fn concurrent_updates_are_not_lost() {
    let count = ActiveCount::default();
    let threads: Vec<_> = (0..8)
        .map(|i| {
            let count = count.clone();
            std::thread::spawn(move || {
                for _ in 0..10_000 {
                    if i % 2 == 0 {
                        count.increment();
                    } else {
                        count.increment();
                        count.decrement();
                    }
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }
    assert_eq!(count.active(), 4 * 10_000);
}

#[tokio::test(start_paused = true)]
async fn idle_count_returns_after_initial_delay() {
    let count = ActiveCount::new(test_config());
    let start = Instant::now();

    let outcome = count.wait_until_idle().await;

    assert_eq!(outcome, WaitOutcome::Idle { pauses: 0 });
    assert_elapsed(start, Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn busy_count_waits_for_every_pause_then_gives_up() {
    let count = ActiveCount::new(test_config());
    let _busy = count.enter();
    let start = Instant::now();

    let outcome = count.wait_until_idle().await;

    assert_eq!(outcome, WaitOutcome::Exhausted);
    assert_elapsed(start, Duration::from_millis(1000 + 500 * 4));
}

#[tokio::test(start_paused = true)]
async fn zero_max_pauses_still_pauses_once_when_busy() {
    let count = ActiveCount::new(test_config().with_max_pauses(0));
    let _busy = count.enter();
    let start = Instant::now();

    let outcome = count.wait_until_idle().await;

    assert_eq!(outcome, WaitOutcome::Exhausted);
    assert_elapsed(start, Duration::from_millis(1500));
}

async fn release_after(pauses: u32) {
    let count = ActiveCount::new(test_config());
    let guard = count.enter();
    // Release midway through pause number `pauses`
    let release_at = Duration::from_millis(1000 + 500 * u64::from(pauses) - 250);
    tokio::spawn(async move {
        tokio::time::sleep(release_at).await;
        drop(guard);
    });
    let start = Instant::now();

    let outcome = count.wait_until_idle().await;

    assert_eq!(outcome, WaitOutcome::Idle { pauses });
    assert_elapsed(start, Duration::from_millis(1000 + 500 * u64::from(pauses)));
}

#[tokio::test(start_paused = true)]
async fn returns_after_one_pause_once_idle() {
    release_after(1).await;
}

#[tokio::test(start_paused = true)]
async fn returns_after_three_pauses_once_idle() {
    release_after(3).await;
}

#[tokio::test(start_paused = true)]
async fn interrupt_ends_wait_early() {
    let count = ActiveCount::new(test_config());
    let _busy = count.enter();

    let waiter = {
        let count = count.clone();
        tokio::spawn(async move { count.wait_until_idle().await })
    };
    tokio::time::sleep(Duration::from_millis(1200)).await;
    count.interrupt();

    let outcome = waiter.await.unwrap();
    assert_eq!(outcome, WaitOutcome::Interrupted);
}

#[tokio::test(start_paused = true)]
async fn callback_waits_like_wait_until_idle() {
    let count = ActiveCount::new(test_config());
    let callback = count.as_callback();
    let start = Instant::now();

    callback.run().await;

    assert_elapsed(start, Duration::from_millis(1000));
}

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn exhaustion_is_logged() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .without_time()
        .finish();

    let outcome = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .start_paused(true)
            .build()
            .unwrap()
            .block_on(async {
                let count = ActiveCount::new(test_config().with_max_pauses(2));
                count.increment();
                count.increment();
                count.wait_until_idle().await
            })
    });

    assert_eq!(outcome, WaitOutcome::Exhausted);
    let logs = logs.contents();
    assert!(
        logs.contains("WAIT for 2 active requests"),
        "Should log each pause. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("not idle but shutting down anyway"),
        "Should log exhaustion. Logs:\n{}",
        logs
    );
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn active_is_net_sum(ops in proptest::collection::vec(any::<bool>(), 0..200)) {
            let count = ActiveCount::default();
            let mut expected = 0i64;
            for up in ops {
                if up {
                    count.increment();
                    expected += 1;
                } else {
                    count.decrement();
                    expected -= 1;
                }
            }
            prop_assert_eq!(count.active(), expected);
        }
    }
}
