// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the binary specs.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tempfile::TempDir;

pub const UNIQKEY: &str = "c7f0a2e8-4b3d-4a8e-9a55-6d1f2f0c9b71";
pub const START_CODE: u8 = b'0';
pub const STOP_CODE: u8 = b'9';
pub const SPEC_WAIT_MAX_MS: u64 = 10_000;

/// One isolated gantry installation: config, database, and fifos under
/// a temp directory.
pub struct Env {
    dir: TempDir,
}

impl Env {
    pub fn new() -> Self {
        Self::with_whitelist(None)
    }

    /// Environment with the whitelist gate enabled on `lines`.
    pub fn whitelisted(lines: &str) -> Self {
        Self::with_whitelist(Some(lines))
    }

    fn with_whitelist(lines: Option<&str>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let whitelist_section = match lines {
            Some(lines) => {
                let path = dir.path().join("whitelist");
                std::fs::write(&path, lines).unwrap();
                format!(
                    "[job.whitelist]\nenabled = true\npath = \"{}\"\n",
                    path.display()
                )
            }
            None => String::new(),
        };
        let config = format!(
            r#"
[env]
uniqkey = "{UNIQKEY}"
database = "{db}"

[job]
timeout_secs = 10
poll_interval_secs = 0

{whitelist_section}
[serial]
fifo_path = "{serial_fifo}"
interval_secs = 1

[parallel]
fifo_path = "{parallel_fifo}"
interval_secs = 1
pool_size = 2
"#,
            db = dir.path().join("gantry.db").display(),
            serial_fifo = dir.path().join("serial.fifo").display(),
            parallel_fifo = dir.path().join("parallel.fifo").display(),
        );
        std::fs::write(dir.path().join("gantry.toml"), config).unwrap();
        Self { dir }
    }

    /// Append extra sections to the generated config file.
    pub fn append_config(&self, extra: &str) {
        let mut file = OpenOptions::new()
            .append(true)
            .open(self.config_path())
            .unwrap();
        file.write_all(extra.as_bytes()).unwrap();
    }

    /// Replace the whitelist file contents in place.
    pub fn rewrite_whitelist(&self, lines: &str) {
        std::fs::write(self.path().join("whitelist"), lines).unwrap();
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("gantry.toml")
    }

    fn fifo_path(&self, mode: &str) -> PathBuf {
        self.path().join(format!("{mode}.fifo"))
    }

    /// A `gantry` invocation against this environment.
    pub fn gantry(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::cargo_bin("gantry").unwrap();
        cmd.arg("--config").arg(self.config_path());
        cmd
    }

    /// Enqueue one group, returning the printed group id.
    pub fn enqueue(&self, mode: &str, name: &str, jobs: &[&str]) -> String {
        let mut cmd = self.gantry();
        cmd.args(["enqueue", "--name", name, "--mode", mode]);
        for job in jobs {
            cmd.args(["--job", job]);
        }
        let output = cmd.assert().success().get_output().stdout.clone();
        String::from_utf8(output).unwrap().trim().to_string()
    }

    /// Launch a performer daemon for this environment.
    pub fn spawn_performer(&self, mode: &str) -> DaemonGuard {
        let child = std::process::Command::new(assert_cmd::cargo::cargo_bin("gantry"))
            .args(["performer", "--mode", mode])
            .arg("--config")
            .arg(self.config_path())
            .spawn()
            .unwrap();
        // The performer creates the fifo at startup.
        let fifo = self.fifo_path(mode);
        assert!(
            wait_for(SPEC_WAIT_MAX_MS, || fifo.exists()),
            "performer never created its fifo"
        );
        DaemonGuard { child }
    }

    /// Launch the observer daemon from `exe`, with its stderr captured
    /// in `observer.log`. Requires `[observer] pidfile_dir` pointing at
    /// this environment; returns once the scheduler children have
    /// written their pidfiles.
    pub fn spawn_observer(&self, exe: &Path) -> DaemonGuard {
        let log = std::fs::File::create(self.path().join("observer.log")).unwrap();
        let child = std::process::Command::new(exe)
            .arg("observer")
            .arg("--config")
            .arg(self.config_path())
            .stderr(log)
            .spawn()
            .unwrap();
        let serial = self.path().join("serial-scheduler.pid");
        let parallel = self.path().join("parallel-scheduler.pid");
        assert!(
            wait_for(SPEC_WAIT_MAX_MS, || serial.exists() && parallel.exists()),
            "observer never started its schedulers"
        );
        DaemonGuard { child }
    }

    /// Write one signal code into the mode's fifo. Blocks until the
    /// performer reads it.
    pub fn send_code(&self, mode: &str, code: u8) {
        let mut fifo = OpenOptions::new()
            .write(true)
            .open(self.fifo_path(mode))
            .unwrap();
        fifo.write_all(&[code]).unwrap();
    }
}

/// Kills the daemon on drop so a failing spec never leaks processes.
pub struct DaemonGuard {
    child: std::process::Child,
}

impl DaemonGuard {
    /// Wait for the daemon to exit on its own; panics on timeout.
    pub fn wait_exit(&mut self) -> std::process::ExitStatus {
        let deadline = Instant::now() + Duration::from_millis(SPEC_WAIT_MAX_MS);
        loop {
            if let Some(status) = self.child.try_wait().unwrap() {
                return status;
            }
            assert!(Instant::now() < deadline, "daemon did not exit in time");
            std::thread::sleep(Duration::from_millis(20));
        }
    }
}

impl Drop for DaemonGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Substring assertions over a finished command, chainable.
pub trait AssertExt: Sized {
    fn stdout_has(self, needle: &str) -> Self;
    fn stderr_has(self, needle: &str) -> Self;
}

impl AssertExt for assert_cmd::assert::Assert {
    fn stdout_has(self, needle: &str) -> Self {
        let stdout = String::from_utf8_lossy(&self.get_output().stdout).to_string();
        assert!(stdout.contains(needle), "stdout missing {needle:?}:\n{stdout}");
        self
    }

    fn stderr_has(self, needle: &str) -> Self {
        let stderr = String::from_utf8_lossy(&self.get_output().stderr).to_string();
        assert!(stderr.contains(needle), "stderr missing {needle:?}:\n{stderr}");
        self
    }
}

pub fn wait_for(max_ms: u64, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(max_ms);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    condition()
}
