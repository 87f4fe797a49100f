//! CLI argument definitions

use clap::{Parser, ValueEnum};
use see_common::{DEFAULT_FIFO_PATH, DEFAULT_LIBRARY_PATH};
use std::ffi::OsString;
use std::path::PathBuf;

use crate::domain::LaunchError;
use crate::program_lookup::resolve_program;
use crate::report::{HeaderSource, TableStyle};
use crate::session::{SessionConfig, Transport};

#[derive(Parser)]
#[command(
    name = "see",
    version,
    about = "Run a program under the LibSee preload shim and tabulate its call report",
    after_help = "\
EXAMPLES:
    see ./my-app --flag                      Trace my-app, forward --flag to it
    see -l ./libsee.so python3 script.py     Use a specific shim build
    see --transport fifo --export r.json ls  Relay through a FIFO, save reports"
)]
pub struct Args {
    /// Preload library to inject into the program
    #[arg(short, long, env = "LIBSEE_LIBRARY", default_value = DEFAULT_LIBRARY_PATH)]
    pub library: PathBuf,

    /// How the program's output is relayed
    #[arg(short, long, value_enum, default_value_t = TransportKind::Pipe)]
    pub transport: TransportKind,

    /// Named pipe used by the fifo transport
    #[arg(long, value_name = "PATH", default_value = DEFAULT_FIFO_PATH)]
    pub fifo_path: PathBuf,

    /// Use the first captured record as the table header
    #[arg(long)]
    pub header_row: bool,

    /// Text placed between table columns
    #[arg(long, value_name = "STR", default_value = " ")]
    pub separator: String,

    /// Also write every rendered report to FILE as JSON
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Launch without validating the preload library
    #[arg(long)]
    pub skip_preflight: bool,

    /// Program to run, followed by its arguments
    #[arg(
        value_name = "PROGRAM",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<OsString>,
}

/// Byte-stream transport between the program and see
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    /// Anonymous pipe shared by stdout and stderr
    Pipe,
    /// Named pipe drained by a reader thread
    Fifo,
}

impl Args {
    /// Program name exactly as typed on the command line
    pub fn program_name(&self) -> OsString {
        self.command.first().cloned().unwrap_or_default()
    }

    /// Build the session for these arguments, resolving the program first.
    pub fn session_config(&self, library: PathBuf) -> Result<SessionConfig, LaunchError> {
        let program_name = self.program_name();
        let program = resolve_program(&program_name)?;

        let transport = match self.transport {
            TransportKind::Pipe => Transport::Pipe,
            TransportKind::Fifo => Transport::Fifo(self.fifo_path.clone()),
        };
        let header =
            if self.header_row { HeaderSource::FirstRecord } else { HeaderSource::FixedLabels };

        Ok(SessionConfig {
            library,
            program,
            program_name,
            args: self.command.iter().skip(1).cloned().collect(),
            transport,
            header,
            style: TableStyle { separator: self.separator.clone(), ..TableStyle::default() },
        })
    }
}
