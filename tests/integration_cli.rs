use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn analyze(args: &[&Path]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_wsperf-analyze"))
        .args(args)
        .env("NO_COLOR", "1")
        .output()
        .expect("run wsperf-analyze")
}

fn write(dir: &TempDir, name: &str, json: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, json).expect("write fixture");
    path
}

#[test]
fn prints_progress_report_and_completion() {
    let dir = TempDir::new().expect("temp dir");
    let file = write(
        &dir,
        "run.json",
        r#"{"started": 1000000, "ended": 2000000, "total_duration": 900000, "connection_stats": [
            {"tcp_pre_init": 1, "open": 1000, "close": 2000, "failed": false},
            {"tcp_pre_init": 2, "open": 3000, "close": 4000, "failed": false},
            {"tcp_pre_init": 3, "open": 5000, "close": 6000, "failed": true}
        ]}"#,
    );

    let output = analyze(&[&file]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).expect("utf-8 stdout");
    let lines: Vec<&str> = stdout.lines().collect();
    assert!(lines[0].starts_with("Loading wsperf result file "));
    assert!(stdout.contains("Aggregate results (WebSocket Opening+Closing Handshake)"));
    assert!(stdout.contains("             Total:         3"));
    assert!(stdout.contains("    Handshakes/sec:         2"));
    assert!(stdout.contains("  Median:       3.0 ms"));
    assert_eq!(lines.last(), Some(&"Analyze done."));
}

#[test]
fn bad_file_exits_non_zero_without_report() {
    let dir = TempDir::new().expect("temp dir");
    let good = write(&dir, "good.json", r#"{"started": 1, "ended": 2, "total_duration": 1}"#);
    let bad = write(&dir, "bad.json", r#"{"started": 1, "ended": 2}"#);

    let output = analyze(&[&good, &bad]);
    assert!(!output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("Aggregate results"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("total_duration"), "stderr: {}", stderr);
}

#[test]
fn missing_file_exits_non_zero() {
    let output = analyze(&[Path::new("/nonexistent/wsperf-result.json")]);
    assert!(!output.status.success());
}

#[test]
fn percentile_option_before_files() {
    let dir = TempDir::new().expect("temp dir");
    let file = write(
        &dir,
        "run.json",
        r#"{"started": 1000000, "ended": 2000000, "total_duration": 900000, "connection_stats": [
            {"tcp_pre_init": 1, "open": 1000, "close": 2000}
        ]}"#,
    );

    let output = analyze(&[Path::new("-q"), Path::new("50,99"), &file]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).expect("utf-8 stdout");
    assert!(stdout.contains("     q50:"), "stdout: {}", stdout);
    assert!(stdout.contains("     q99:"), "stdout: {}", stdout);
    assert!(!stdout.contains("q99.9:"), "stdout: {}", stdout);
}
