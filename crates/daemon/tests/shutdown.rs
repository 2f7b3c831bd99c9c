// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Black-box tests for lingerd shutdown
//!
//! Start the daemon, send it SIGTERM and check that in-flight connections
//! hold up the exit hooks until they finish.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(deprecated)]

use assert_cmd::cargo::CommandCargoExt;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tempfile::TempDir;

const CONFIG: &str = r#"
register_delay = "50ms"

[drain]
initial_delay = "50ms"
pause_interval = "50ms"
max_pauses = 100
"#;

struct Daemon {
    child: Child,
    stdout: BufReader<ChildStdout>,
    addr: String,
    _dir: TempDir,
}

impl Daemon {
    fn start() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let config_path = dir.path().join("lingerd.toml");
        std::fs::write(&config_path, CONFIG).unwrap();

        let mut child = Command::cargo_bin("lingerd")
            .unwrap()
            .arg(&config_path)
            .env("RUST_LOG", "info")
            .env("NO_COLOR", "1")
            .env_remove("LINGER_BIND")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to start lingerd");

        let mut stdout = BufReader::new(child.stdout.take().unwrap());
        let mut ready = String::new();
        stdout.read_line(&mut ready).unwrap();
        let addr = ready
            .trim()
            .strip_prefix("READY ")
            .unwrap_or_else(|| panic!("unexpected first line: {:?}", ready))
            .to_string();

        // Let the delayed interception happen
        std::thread::sleep(Duration::from_millis(300));

        Self {
            child,
            stdout,
            addr,
            _dir: dir,
        }
    }

    fn terminate(&self) {
        kill(Pid::from_raw(self.child.id() as i32), Signal::SIGTERM).unwrap();
    }

    fn exited_within(&mut self, timeout: Duration) -> Option<ExitStatus> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Some(status) = self.child.try_wait().unwrap() {
                return Some(status);
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        None
    }

    /// Remaining stdout and all of stderr, after exit
    fn output(mut self) -> (String, String) {
        let mut stdout = String::new();
        self.stdout.read_to_string(&mut stdout).unwrap();
        let mut stderr = String::new();
        self.child
            .stderr
            .take()
            .unwrap()
            .read_to_string(&mut stderr)
            .unwrap();
        (stdout, stderr)
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[test]
fn sigterm_runs_exit_hooks_and_exits_cleanly() {
    let mut daemon = Daemon::start();
    daemon.terminate();

    let status = daemon
        .exited_within(Duration::from_secs(10))
        .expect("lingerd did not exit");
    assert!(status.success(), "exit status: {:?}", status);

    let (stdout, stderr) = daemon.output();
    assert!(stdout.contains("Daemon stopped"), "stdout:\n{}", stdout);
    assert!(
        stderr.contains("registered shutdown delay hook"),
        "stderr:\n{}",
        stderr
    );
    assert!(
        stderr.contains("executing normal exit hooks"),
        "stderr:\n{}",
        stderr
    );
    assert!(stderr.contains("listener closed"), "stderr:\n{}", stderr);
}

#[test]
fn open_connection_delays_exit_until_closed() {
    let mut daemon = Daemon::start();

    let mut conn = TcpStream::connect(&daemon.addr).unwrap();
    conn.write_all(b"ping\n").unwrap();
    let mut echoed = String::new();
    BufReader::new(conn.try_clone().unwrap())
        .read_line(&mut echoed)
        .unwrap();
    assert_eq!(echoed, "ping\n");

    daemon.terminate();

    // Still draining while the connection is open
    assert!(daemon.exited_within(Duration::from_millis(500)).is_none());

    drop(conn);
    let status = daemon
        .exited_within(Duration::from_secs(10))
        .expect("lingerd did not exit after connection closed");
    assert!(status.success(), "exit status: {:?}", status);

    let (stdout, stderr) = daemon.output();
    assert!(stdout.contains("Daemon stopped"), "stdout:\n{}", stdout);
    assert!(
        stderr.contains("WAIT for 1 active requests"),
        "stderr:\n{}",
        stderr
    );
    // Original hooks ran after the drain
    let waited = stderr.find("WAIT for 1 active requests").unwrap();
    let closed = stderr.find("listener closed").unwrap();
    assert!(waited < closed, "stderr:\n{}", stderr);
}
