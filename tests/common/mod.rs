//! Shared helpers for integration tests

#![allow(dead_code)]

use rust_diag_system::prelude::*;
use rust_diag_system::sinks::MemorySink;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Writes an executable mail transport that records its arguments and input.
pub fn fake_sendmail(dir: &Path, extra: &str) -> PathBuf {
    let script = dir.join("fake-sendmail");
    let body = format!(
        "#!/bin/sh\necho \"$@\" >> '{dir}/invocations'\ncat >> '{dir}/messages'\n{extra}\n",
        dir = dir.display(),
        extra = extra
    );
    fs::write(&script, body).expect("Failed to write fake sendmail");
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755))
        .expect("Failed to make fake sendmail executable");
    script
}

pub fn invocations(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join("invocations"))
        .map(|s| s.lines().map(String::from).collect())
        .unwrap_or_default()
}

pub fn messages(dir: &Path) -> String {
    fs::read_to_string(dir.join("messages")).unwrap_or_default()
}

/// Waits until `dir` has seen `n` transport runs or `timeout` passes.
pub fn wait_for_invocations(dir: &Path, n: usize, timeout: Duration) -> Vec<String> {
    let start = Instant::now();
    loop {
        let seen = invocations(dir);
        if seen.len() >= n || start.elapsed() >= timeout {
            return seen;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}

pub fn mail_config(sendmail: &Path) -> Config {
    Config {
        mail_to: "ops@example.com".to_string(),
        mail_from: "gatewayd@example.com".to_string(),
        sendmail: sendmail.display().to_string(),
        prog_name: "gatewayd".to_string(),
        ..Config::default()
    }
}

pub fn engine(config: Config) -> (Diagnostics, MemorySink) {
    let sink = MemorySink::new();
    let diag = Diagnostics::builder()
        .stderr_sink(sink.clone())
        .identity(ProcessIdentity::new("web01", 311, "gatewayd-bin"))
        .config(config)
        .build();
    (diag, sink)
}
