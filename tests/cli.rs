//! Process-level behaviour of the `kokoro-bridge` binary.

use std::path::Path;
use std::process::{Command, Output};

fn bridge(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_kokoro-bridge"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .env_remove("KOKORO_BRIDGE_THREADS")
        .env_remove("KOKORO_BRIDGE_OPTIMIZED_MODEL")
        .env_remove("KOKORO_BRIDGE_ESPEAK_BIN")
        .env_remove("KOKORO_BRIDGE_ESPEAK_DATA")
        .output()
        .expect("binary should start")
}

fn assert_single_error_line(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    let lines: Vec<&str> = stderr.lines().collect();
    assert_eq!(lines.len(), 1, "stderr was {stderr:?}");
    assert!(lines[0].starts_with("Error: "), "stderr was {stderr:?}");
    assert!(lines[0].len() > "Error: ".len());
    lines[0].to_string()
}

#[test]
fn missing_text_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = bridge(&[], dir.path());

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let line = assert_single_error_line(&output);
    assert!(line.contains("--text"), "{line}");
}

#[test]
fn empty_text_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = bridge(&["--text", ""], dir.path());

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert_single_error_line(&output);
}

#[test]
fn blank_text_is_rejected_before_loading_the_model() {
    let dir = tempfile::tempdir().unwrap();
    let output = bridge(&["--text", "   "], dir.path());

    assert_eq!(output.status.code(), Some(1));
    let line = assert_single_error_line(&output);
    assert!(line.contains("text must not be empty"), "{line}");
}

#[test]
fn nonexistent_model_fails_with_one_line() {
    let dir = tempfile::tempdir().unwrap();
    let output = bridge(
        &["--text", "안녕하세요", "--model", "does-not-exist.onnx"],
        dir.path(),
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let line = assert_single_error_line(&output);
    assert!(line.contains("does-not-exist.onnx"), "{line}");
}

#[test]
fn default_model_path_is_resolved_in_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    let output = bridge(&["--text", "안녕하세요"], dir.path());

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let line = assert_single_error_line(&output);
    assert!(line.contains("kokoro-v0_19.onnx"), "{line}");
}

#[test]
fn missing_voice_bank_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("kokoro-v0_19.onnx"), b"placeholder").unwrap();
    let output = bridge(&["--text", "안녕하세요"], dir.path());

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let line = assert_single_error_line(&output);
    assert!(line.contains("voices.bin"), "{line}");
}

#[test]
fn help_exits_successfully() {
    let dir = tempfile::tempdir().unwrap();
    let output = bridge(&["--help"], dir.path());

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--voices"), "{stdout}");
}
