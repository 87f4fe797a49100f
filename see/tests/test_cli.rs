use std::process::Command;

use see_common::SENTINEL;

fn see() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_see"));
    cmd.env_remove("LIBSEE_LIBRARY").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_exit_code_matches_program() {
    let status = see()
        .args(["--skip-preflight", "--library", "/nonexistent/libsee.so"])
        .args(["sh", "-c", "exit 3"])
        .status()
        .expect("Failed to run see");
    assert_eq!(status.code(), Some(3));
}

#[test]
fn test_missing_library_fails_preflight() {
    let output = see()
        .args(["--library", "/nonexistent/libsee.so", "true"])
        .output()
        .expect("Failed to run see");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Preload library not found"), "stderr: {stderr}");
}

#[test]
fn test_unknown_program_exits_127() {
    let output = see()
        .args(["--skip-preflight", "--library", "/nonexistent/libsee.so"])
        .arg("definitely-not-a-real-program-name")
        .output()
        .expect("Failed to run see");
    assert_eq!(output.status.code(), Some(127));
}

#[test]
fn test_export_writes_rendered_reports() {
    let dir = tempfile::tempdir().unwrap();
    let export = dir.path().join("reports.json");
    let script = format!("echo '{SENTINEL}'; echo malloc,900,3; echo '{SENTINEL}'");

    let output = see()
        .args(["--skip-preflight", "--library", "/nonexistent/libsee.so", "--export"])
        .arg(&export)
        .args(["sh", "-c", &script])
        .output()
        .expect("Failed to run see");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Total CPU Cycles"));
    assert!(!stdout.contains("LIBSEE"));

    let json: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&export).unwrap()).expect("Invalid JSON");
    assert_eq!(json["reports"][0]["rows"][0][0], "malloc");
}

#[test]
fn test_malformed_report_warns_even_with_logging_off() {
    let script = format!("echo a; echo '{SENTINEL}'; echo beta,200; echo '{SENTINEL}'; echo b");

    let output = see()
        .env("RUST_LOG", "off")
        .args(["--skip-preflight", "--library", "/nonexistent/libsee.so"])
        .args(["sh", "-c", &script])
        .output()
        .expect("Failed to run see");
    assert!(output.status.success());

    // The loader's complaint about the fake library is relayed too
    let stdout = String::from_utf8_lossy(&output.stdout);
    let relayed: Vec<&str> = stdout.lines().filter(|line| !line.contains("ld.so")).collect();
    assert_eq!(relayed, ["a", "b"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("warning: malformed LibSee report: record 1 has 2 fields, expected 3"),
        "stderr: {stderr}"
    );
}

#[test]
fn test_non_utf8_program_path_is_run() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempfile::tempdir().unwrap();
    let program = dir.path().join(OsStr::from_bytes(b"prog\xff"));
    std::os::unix::fs::symlink("/bin/sh", &program).unwrap();

    let output = see()
        .args(["--skip-preflight", "--library", "/nonexistent/libsee.so"])
        .arg(&program)
        .args(["-c", "echo ran"])
        .output()
        .expect("Failed to run see");
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.lines().any(|line| line == "ran"), "stdout: {stdout}");
}
