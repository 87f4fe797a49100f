use std::ffi::{OsStr, OsString};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use see::demux::DemuxState;
use see::domain::ChildStatus;
use see::program_lookup::resolve_program;
use see::report::{HeaderSource, TableStyle};
use see::session::{run_session, SessionConfig, Transport};
use see_common::SENTINEL;

/// Output sink the test can read back after the session moved it away.
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// Captured output without the loader's complaints about the fake shim.
    fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .filter(|line| !line.contains("ld.so"))
            .map(ToString::to_string)
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn shell(script: &str, transport: Transport, library: &Path) -> SessionConfig {
    SessionConfig {
        library: library.to_path_buf(),
        program: resolve_program(OsStr::new("sh")).expect("sh must be on PATH"),
        program_name: OsString::from("sh"),
        args: vec![OsString::from("-c"), OsString::from(script)],
        transport,
        header: HeaderSource::FixedLabels,
        style: TableStyle::default(),
    }
}

fn fake_library(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("libsee.so")
}

fn report_script() -> String {
    format!(
        "echo before; echo '{SENTINEL}'; echo alpha,100,5; echo beta,200,3; echo '{SENTINEL}'; echo after"
    )
}

fn assert_scenario_output(lines: &[String]) {
    assert_eq!(lines.len(), 6, "unexpected output: {lines:#?}");
    assert_eq!(lines[0], "before");
    assert_eq!(lines[1], "Function Total CPU Cycles Total Calls");
    assert_eq!(lines[2], "-".repeat(37));
    assert!(lines[3].starts_with("alpha    100              5"));
    assert!(lines[4].starts_with("beta     200              3"));
    assert_eq!(lines[5], "after");
}

#[test]
fn test_pipe_transport_renders_report_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let out = SharedBuffer::default();
    let config = shell(&report_script(), Transport::Pipe, &fake_library(&dir));

    let report = run_session(&config, out.clone()).unwrap();

    assert_eq!(report.status, ChildStatus::Exited(0));
    assert_eq!(report.summary.reports.len(), 1);
    assert_scenario_output(&out.lines());
}

#[test]
fn test_fifo_transport_renders_report_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let fifo_path = dir.path().join("libsee.fifo");
    let out = SharedBuffer::default();
    let config =
        shell(&report_script(), Transport::Fifo(fifo_path.clone()), &fake_library(&dir));

    let report = run_session(&config, out.clone()).unwrap();

    assert_eq!(report.status, ChildStatus::Exited(0));
    assert_scenario_output(&out.lines());
    assert!(!fifo_path.exists(), "FIFO should be removed after the run");
}

#[test]
fn test_stderr_is_merged_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let out = SharedBuffer::default();
    let config = shell("echo one; echo two >&2; echo three", Transport::Pipe, &fake_library(&dir));

    run_session(&config, out.clone()).unwrap();

    assert_eq!(out.lines(), ["one", "two", "three"]);
}

#[test]
fn test_exit_code_is_propagated() {
    let dir = tempfile::tempdir().unwrap();
    for transport in [Transport::Pipe, Transport::Fifo(dir.path().join("exit.fifo"))] {
        let config = shell("echo bye; exit 7", transport, &fake_library(&dir));
        let report = run_session(&config, SharedBuffer::default()).unwrap();
        assert_eq!(report.status, ChildStatus::Exited(7));
        assert_eq!(report.status.exit_code(), 7);
    }
}

#[test]
fn test_signal_termination_is_propagated() {
    let dir = tempfile::tempdir().unwrap();
    let config = shell("kill -9 $$", Transport::Pipe, &fake_library(&dir));

    let report = run_session(&config, SharedBuffer::default()).unwrap();

    assert_eq!(report.status, ChildStatus::Signaled(9));
    assert_eq!(report.status.exit_code(), 137);
}

#[test]
fn test_preload_variable_reaches_child() {
    let dir = tempfile::tempdir().unwrap();
    let library = fake_library(&dir);
    let out = SharedBuffer::default();
    let config = shell("echo \"$LD_PRELOAD\"", Transport::Pipe, &library);

    run_session(&config, out.clone()).unwrap();

    let lines = out.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with(library.to_str().unwrap()));
}

#[test]
fn test_unterminated_report_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let out = SharedBuffer::default();
    let script = format!("echo start; echo '{SENTINEL}'; echo alpha,100,5");
    let config = shell(&script, Transport::Pipe, &fake_library(&dir));

    let report = run_session(&config, out.clone()).unwrap();

    assert_eq!(out.lines(), ["start"]);
    assert_eq!(report.summary.ended_in, DemuxState::Capturing);
    assert_eq!(report.summary.stats.regions_unterminated, 1);
}

#[test]
fn test_output_larger_than_pipe_buffer_is_streamed() {
    let dir = tempfile::tempdir().unwrap();
    let out = SharedBuffer::default();
    let script = format!(
        "i=0; while [ $i -lt 20000 ]; do echo \"line $i\"; i=$((i+1)); done; \
         echo '{SENTINEL}'; echo f,1,1; echo '{SENTINEL}'"
    );
    let config = shell(&script, Transport::Pipe, &fake_library(&dir));

    let report = run_session(&config, out.clone()).unwrap();

    let lines = out.lines();
    assert_eq!(report.summary.stats.regions_rendered, 1);
    assert_eq!(lines.len(), 20_000 + 3);
    assert_eq!(lines[19_999], "line 19999");
    assert_eq!(lines[20_000], "Function Total CPU Cycles Total Calls");
}

#[test]
fn test_missing_program_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = shell("true", Transport::Pipe, &fake_library(&dir));
    config.program = dir.path().join("vanished");
    config.program_name = OsString::from("vanished");

    let err = run_session(&config, SharedBuffer::default()).unwrap_err();
    assert!(err.to_string().contains("vanished"));
}
