//! Output stream demultiplexer
//!
//! Splits the traced program's combined output into pass-through lines and
//! captured reports. The stream is processed strictly in arrival order:
//!
//! ```text
//!            ┌──────────── sentinel ───────────┐
//!            │                                 ▼
//!     ┌─────────────┐                    ┌───────────┐
//!     │ Passthrough │                    │ Capturing │──▶ buffer line
//!     └─────────────┘                    └───────────┘
//!      │     ▲                                 │
//!      ▼     └── sentinel: render buffer ──────┘
//!   forward line
//! ```
//!
//! Sentinel lines are consumed and never forwarded or buffered. A region
//! still open when the stream ends is dropped without rendering.
//!
//! Regions that cannot be rendered are reported as `warning:` lines on a
//! separate diagnostic writer (stderr unless told otherwise), never in the
//! relayed output.

use std::io::{self, Read, Write};

use log::debug;
use see_common::SENTINEL;

use crate::report::{HeaderSource, Table, TableStyle};

/// Read size used when draining the child's output.
pub const READ_BUF_SIZE: usize = 16 * 1024; // 16 KiB

/// Where the demultiplexer currently routes non-sentinel lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemuxState {
    Passthrough,
    Capturing,
}

/// Counters collected over one stream.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DemuxStats {
    pub lines_forwarded: u64,
    pub lines_captured: u64,
    pub regions_rendered: u64,
    pub regions_empty: u64,
    pub regions_rejected: u64,
    pub regions_unterminated: u64,
}

/// Final state of a finished stream.
#[derive(Debug)]
pub struct DemuxSummary {
    /// State at end of stream; `Capturing` means a region was never closed.
    pub ended_in: DemuxState,
    pub stats: DemuxStats,
    /// Every table that was rendered, in order.
    pub reports: Vec<Table>,
}

pub struct Demultiplexer<W: Write, D: Write = io::Stderr> {
    out: W,
    diagnostics: D,
    state: DemuxState,
    buffer: Vec<Vec<u8>>,
    /// Bytes of a line whose terminator has not arrived yet.
    pending: Vec<u8>,
    header: HeaderSource,
    style: TableStyle,
    reports: Vec<Table>,
    stats: DemuxStats,
}

impl<W: Write> Demultiplexer<W> {
    pub fn new(out: W, header: HeaderSource, style: TableStyle) -> Self {
        Self::with_diagnostics(out, io::stderr(), header, style)
    }
}

impl<W: Write, D: Write> Demultiplexer<W, D> {
    /// Like [`new`](Demultiplexer::new), with warnings written to `diagnostics`.
    pub fn with_diagnostics(
        out: W,
        diagnostics: D,
        header: HeaderSource,
        style: TableStyle,
    ) -> Self {
        Self {
            out,
            diagnostics,
            state: DemuxState::Passthrough,
            buffer: Vec::new(),
            pending: Vec::new(),
            header,
            style,
            reports: Vec::new(),
            stats: DemuxStats::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> DemuxState {
        self.state
    }

    #[must_use]
    pub fn stats(&self) -> &DemuxStats {
        &self.stats
    }

    /// Feed an arbitrary chunk of the stream.
    ///
    /// Complete lines are processed immediately; a trailing partial line is
    /// held until its terminator arrives or [`finish`](Self::finish) runs.
    ///
    /// # Errors
    /// Returns an error if writing to the output fails.
    pub fn push_bytes(&mut self, mut chunk: &[u8]) -> io::Result<()> {
        while let Some(pos) = chunk.iter().position(|&b| b == b'\n') {
            let (line, rest) = chunk.split_at(pos + 1);
            if self.pending.is_empty() {
                self.push_line(line)?;
            } else {
                self.pending.extend_from_slice(line);
                let line = std::mem::take(&mut self.pending);
                self.push_line(&line)?;
            }
            chunk = rest;
        }
        self.pending.extend_from_slice(chunk);
        Ok(())
    }

    /// Process one line, terminator included.
    ///
    /// # Errors
    /// Returns an error if writing to the output fails.
    pub fn push_line(&mut self, line: &[u8]) -> io::Result<()> {
        if contains_sentinel(line) {
            return self.toggle();
        }

        match self.state {
            DemuxState::Passthrough => {
                self.out.write_all(line)?;
                self.out.flush()?;
                self.stats.lines_forwarded += 1;
            }
            DemuxState::Capturing => {
                self.buffer.push(line.to_vec());
                self.stats.lines_captured += 1;
            }
        }
        Ok(())
    }

    /// Signal end of stream.
    ///
    /// Flushes a trailing unterminated line, then drops any region that was
    /// opened but never closed.
    ///
    /// # Errors
    /// Returns an error if writing to the output fails.
    pub fn finish(mut self) -> io::Result<DemuxSummary> {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            self.push_line(&line)?;
        }

        if self.state == DemuxState::Capturing {
            let dropped = self.buffer.len();
            debug!("unterminated capture region with {dropped} lines");
            self.warn(format_args!(
                "LibSee report was never closed, dropped {dropped} captured lines"
            ));
            self.buffer.clear();
            self.stats.regions_unterminated += 1;
        }

        self.out.flush()?;
        Ok(DemuxSummary { ended_in: self.state, stats: self.stats, reports: self.reports })
    }

    fn toggle(&mut self) -> io::Result<()> {
        match self.state {
            DemuxState::Passthrough => {
                debug!("capture region opened");
                self.buffer.clear();
                self.state = DemuxState::Capturing;
            }
            DemuxState::Capturing => {
                self.state = DemuxState::Passthrough;
                let lines = std::mem::take(&mut self.buffer);
                debug!("capture region closed with {} lines", lines.len());
                self.render_region(&lines)?;
            }
        }
        Ok(())
    }

    fn render_region(&mut self, lines: &[Vec<u8>]) -> io::Result<()> {
        match Table::parse(lines, self.header) {
            Ok(Some(table)) => {
                // One write per table so pass-through never lands mid-report
                let rendered = table.render(&self.style);
                self.out.write_all(rendered.as_bytes())?;
                self.out.flush()?;
                self.stats.regions_rendered += 1;
                self.reports.push(table);
            }
            Ok(None) => {
                debug!("capture region had no records");
                self.stats.regions_empty += 1;
            }
            Err(e) => {
                debug!("rejected capture region: {e:?}");
                self.warn(format_args!("malformed LibSee report: {e}"));
                self.stats.regions_rejected += 1;
            }
        }
        Ok(())
    }

    fn warn(&mut self, message: std::fmt::Arguments<'_>) {
        // A broken diagnostic stream must not stop the relay
        if let Err(e) = writeln!(self.diagnostics, "warning: {message}") {
            debug!("failed to write diagnostic: {e}");
        }
    }
}

/// Drain a blocking reader into the demultiplexer until end of stream.
///
/// # Errors
/// Returns an error if reading the stream or writing the output fails.
pub fn pump<R, W, D>(mut reader: R, demux: &mut Demultiplexer<W, D>) -> io::Result<()>
where
    R: Read,
    W: Write,
    D: Write,
{
    let mut buf = vec![0u8; READ_BUF_SIZE];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => demux.push_bytes(&buf[..n])?,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}

fn contains_sentinel(line: &[u8]) -> bool {
    let sentinel = SENTINEL.as_bytes();
    line.windows(sentinel.len()).any(|window| window == sentinel)
}
