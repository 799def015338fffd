//! Exit status and output streams of the `metalfeed` binary.
//!
//! Only failures that stop the run before any request are exercised here.

use std::process::{Command, Output};

fn metalfeed(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_metalfeed"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn inverted_range_exits_1_with_error_on_stderr() {
    let tmp = tempfile::tempdir().unwrap();
    let out = metalfeed(&[
        "--start",
        "2024-02-01",
        "--end",
        "2024-01-01",
        "--output-dir",
        tmp.path().to_str().unwrap(),
    ]);

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stderr.contains("FATAL ERROR"), "stderr: {stderr}");
    assert!(stderr.contains("must be before end date"), "stderr: {stderr}");
    assert!(!stdout.contains("FATAL ERROR"), "stdout: {stdout}");
    assert!(!tmp.path().join("precious_metals_data.csv").exists());
}

#[test]
fn unreadable_config_exits_1() {
    let tmp = tempfile::tempdir().unwrap();
    let missing = tmp.path().join("missing.toml");
    let out = metalfeed(&["--config", missing.to_str().unwrap()]);

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("failed to load config"), "stderr: {stderr}");
}
