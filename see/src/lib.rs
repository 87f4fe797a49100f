//! # see - LibSee Report Runner
//!
//! `see` runs a program with the LibSee shim injected through `LD_PRELOAD`
//! and relays everything the program prints. The shim appends a CSV report
//! of per-function CPU cycles and call counts, framed by two sentinel lines;
//! `see` lifts that report out of the stream and prints it as an aligned
//! table in its place.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Traced Program (child)                      │
//! │              LD_PRELOAD=libsee.so:<existing entries>            │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ stdout + stderr (one byte stream)
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         see (This Crate)                        │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │   Session    │──▶│    Demux     │──▶│    Report    │         │
//! │  │ (pipe/FIFO)  │   │ (sentinels)  │   │   (table)    │         │
//! │  └──────────────┘   └──────┬───────┘   └──────────────┘         │
//! │                            │                                    │
//! │                            ▼                                    │
//! │                     ┌──────────────┐                            │
//! │                     │    Export    │                            │
//! │                     │ (report.json)│                            │
//! │                     └──────────────┘                            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`session`]: launch the program, wire its output, wait for it
//!   - `launch`: `LD_PRELOAD` composition and spawning
//!   - `fifo`: named-pipe transport and its reader thread
//! - [`demux`]: the pass-through / capture state machine
//! - [`report`]: CSV parsing, column widths, table rendering
//! - [`export`]: JSON output of every rendered report
//! - [`preflight`]: validate the preload library before launch
//! - [`program_lookup`]: resolve the program on `PATH`
//! - [`cli`]: command-line argument parsing
//! - [`domain`]: core domain types and errors
//!
//! ## Typical Usage
//!
//! ```bash
//! # Trace a program with the installed shim
//! see ./my-app --some-flag
//!
//! # Use a local shim build and keep the reports
//! see --library ./target/libsee.so --export report.json ./my-app
//! ```

pub mod cli;
pub mod demux;
pub mod domain;
pub mod export;
pub mod preflight;
pub mod program_lookup;
pub mod report;
pub mod session;
