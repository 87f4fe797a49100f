//! # Shared Constants (runner ↔ preload shim)
//!
//! Defines the literals both sides of the LibSee contract agree on: the line
//! the shim prints around its report, the loader variable used to inject it,
//! and the default locations the runner and the build task use.
//!
//! ## Report Framing
//!
//! The shim writes its report to the traced program's stdout as CSV wrapped
//! in two [`SENTINEL`] lines:
//!
//! ```text
//! ----------------------------------LIBSEE----------------------------------------
//! malloc,81234,112
//! strlen,4410,37
//! ----------------------------------LIBSEE----------------------------------------
//! ```
//!
//! Each record is `function name, total CPU cycles, total call count`.

#![no_std]

// ============================================================================
// Report Framing
// ============================================================================

/// Marks the start and the end of a captured report.
///
/// Recognised anywhere in a line; the rest of a sentinel line is ignored.
pub const SENTINEL: &str =
    "----------------------------------LIBSEE----------------------------------------";

/// Header labels rendered above a report whose records carry no header row.
pub const COLUMN_LABELS: [&str; 3] = ["Function", "Total CPU Cycles", "Total Calls"];

// ============================================================================
// Injection
// ============================================================================

/// Dynamic loader variable listing libraries to load before the program.
pub const PRELOAD_VAR: &str = "LD_PRELOAD";

/// Separator between entries of [`PRELOAD_VAR`].
pub const PRELOAD_SEPARATOR: &str = ":";

/// File name the build task gives the compiled shim.
pub const LIBRARY_FILE_NAME: &str = "libsee.so";

/// Where the runner looks for the shim unless told otherwise.
pub const DEFAULT_LIBRARY_PATH: &str = "/usr/local/lib/libsee.so";

// ============================================================================
// Transport
// ============================================================================

/// Fixed path of the named pipe used by the FIFO transport.
pub const DEFAULT_FIFO_PATH: &str = "/tmp/libsee.fifo";
