//! Traced program sessions
//!
//! A session launches the program with the shim preloaded, wires its
//! combined stdout/stderr into one byte stream, runs that stream through a
//! [`Demultiplexer`] while the child is still running, and reports how the
//! child ended:
//!
//! - `launch`: preload variable handling and spawning
//! - `fifo`: named-pipe transport with its reader thread
//!
//! The anonymous-pipe transport needs no helper and lives here.

pub mod fifo;
pub mod launch;

use std::ffi::{OsStr, OsString};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command};

use anyhow::{Context, Result};
use log::info;

use crate::demux::{pump, Demultiplexer, DemuxSummary};
use crate::domain::{ChildStatus, Pid};
use crate::report::{HeaderSource, TableStyle};

pub use fifo::{Fifo, StreamReader};
pub use launch::{build_command, preload_value, spawn_child};

/// How the child's output reaches the demultiplexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// One anonymous pipe shared by stdout and stderr.
    Pipe,
    /// A named pipe at the given path, drained by a reader thread.
    Fifo(PathBuf),
}

/// Everything needed to run one traced program.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Preload library injected into the child.
    pub library: PathBuf,
    /// Resolved executable.
    pub program: PathBuf,
    /// Name as typed by the user, used as `argv[0]` and in messages.
    pub program_name: OsString,
    pub args: Vec<OsString>,
    pub transport: Transport,
    pub header: HeaderSource,
    pub style: TableStyle,
}

/// Outcome of a finished session.
#[derive(Debug)]
pub struct SessionReport {
    pub status: ChildStatus,
    pub summary: DemuxSummary,
}

/// Run the traced program to completion, writing pass-through output and
/// rendered reports to `out`.
///
/// # Errors
/// Returns an error if the program cannot be launched, the transport cannot
/// be set up, or reading the stream or writing `out` fails. A failing child
/// is not an error; its status is in the report.
pub fn run_session<W>(config: &SessionConfig, out: W) -> Result<SessionReport>
where
    W: Write + Send + 'static,
{
    let command =
        build_command(&config.program, &config.program_name, &config.args, &config.library);
    let demux = Demultiplexer::new(out, config.header, config.style.clone());

    let (status, summary) = match &config.transport {
        Transport::Pipe => run_over_pipe(command, &config.program_name, demux)?,
        Transport::Fifo(path) => run_over_fifo(command, &config.program_name, demux, path)?,
    };

    info!(
        "{} finished with {status}: {} lines forwarded, {} reports rendered",
        config.program_name.to_string_lossy(),
        summary.stats.lines_forwarded,
        summary.stats.regions_rendered
    );
    Ok(SessionReport { status, summary })
}

fn run_over_pipe<W: Write>(
    mut command: Command,
    name: &OsStr,
    mut demux: Demultiplexer<W>,
) -> Result<(ChildStatus, DemuxSummary)> {
    let (reader, writer) = io::pipe().context("Failed to create output pipe")?;
    command
        .stdout(writer.try_clone().context("Failed to duplicate output pipe")?)
        .stderr(writer);

    let spawned = spawn_child(&mut command, name);
    // Release our copies of the write end so EOF arrives when the child exits
    drop(command);
    let mut child = spawned?;
    log_launch(name, &child);

    // The reader is dropped before waiting so a child blocked on a full pipe
    // gets EPIPE instead of deadlocking us if pumping failed
    let pumped = pump(reader, &mut demux);
    let status = wait_child(&mut child)?;
    pumped.context("Failed to relay program output")?;

    let summary = demux.finish().context("Failed to flush program output")?;
    Ok((status, summary))
}

fn run_over_fifo<W>(
    mut command: Command,
    name: &OsStr,
    demux: Demultiplexer<W>,
    path: &Path,
) -> Result<(ChildStatus, DemuxSummary)>
where
    W: Write + Send + 'static,
{
    let fifo = Fifo::create(path)?;
    let source = fifo.open_reader()?;
    let writer = fifo.open_writer()?;
    command
        .stdout(writer.try_clone().context("Failed to duplicate FIFO handle")?)
        .stderr(writer);

    let reader = StreamReader::spawn(source, demux).context("Failed to start FIFO reader")?;

    let spawned = spawn_child(&mut command, name);
    drop(command);
    let mut child = match spawned {
        Ok(child) => child,
        Err(e) => {
            // Every writer is closed, so the reader ends on its own
            let _ = reader.stop_and_join();
            return Err(e.into());
        }
    };
    log_launch(name, &child);

    let waited = wait_child(&mut child);
    let summary = reader.stop_and_join()?;
    let status = waited?;

    drop(fifo);
    Ok((status, summary))
}

fn wait_child(child: &mut Child) -> Result<ChildStatus> {
    let status = child.wait().context("Failed to wait for traced program")?;
    Ok(ChildStatus::from_exit_status(status))
}

fn log_launch(name: &OsStr, child: &Child) {
    info!("launched {} ({})", name.to_string_lossy(), Pid(child.id()));
}
