//! Report export functionality
//!
//! This module provides functionality for writing the captured reports to
//! files next to the rendered terminal output.
//! Currently supports JSON for consumption by other tools.

pub mod json_report;

pub use json_report::JsonReportExporter;
