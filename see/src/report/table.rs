//! Captured report tables.
//!
//! A region captured between two sentinels is a block of CSV records. This
//! module parses such a block into a [`Table`], validates that every record
//! has the header's arity, and renders it as left-justified, padded columns:
//!
//! ```text
//! Function Total CPU Cycles Total Calls
//! -------------------------------------
//! alpha    100              5
//! beta     200              3
//! ```
//!
//! Column widths are derived from the header and the data together and are
//! recomputed for every table, so two reports in one run align independently.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use see_common::COLUMN_LABELS;

use crate::domain::TableError;

/// Where a table's header row comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeaderSource {
    /// Render [`COLUMN_LABELS`]; every captured record is data.
    #[default]
    FixedLabels,
    /// The first captured record is the header.
    FirstRecord,
}

/// Rendering knobs shared by every table in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStyle {
    /// Placed between adjacent cells.
    pub separator: String,
    /// Repeated to draw the line under the header.
    pub rule: char,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self { separator: " ".to_string(), rule: '-' }
    }
}

/// One parsed report: a header row plus data rows of the same arity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Parse the raw lines of one capture region.
    ///
    /// Lines keep their terminators, so a quoted field may span several of
    /// them. Returns `Ok(None)` when the header has to come from the data and
    /// there is none.
    ///
    /// # Errors
    /// [`TableError::ArityMismatch`] for the first record whose field count
    /// differs from the header's, [`TableError::Csv`] if the block cannot be
    /// read as CSV.
    pub fn parse(lines: &[Vec<u8>], header: HeaderSource) -> Result<Option<Self>, TableError> {
        let mut rows = parse_records(lines)?;

        // Records are numbered from 1 in the order they appeared in the region
        let first_data_record = match header {
            HeaderSource::FixedLabels => 1,
            HeaderSource::FirstRecord => 2,
        };
        let header = match header {
            HeaderSource::FixedLabels => COLUMN_LABELS.iter().map(ToString::to_string).collect(),
            HeaderSource::FirstRecord => {
                if rows.is_empty() {
                    return Ok(None);
                }
                rows.remove(0)
            }
        };

        let table = Self { header, rows };
        table.check_arity(first_data_record)?;
        Ok(Some(table))
    }

    /// Number of columns, as declared by the header.
    #[must_use]
    pub fn columns(&self) -> usize {
        self.header.len()
    }

    /// Widest cell of each column, header included, in characters.
    #[must_use]
    pub fn column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.header.iter().map(|cell| display_width(cell)).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(display_width(cell));
            }
        }
        widths
    }

    /// Render header, rule and rows, each line newline-terminated.
    #[must_use]
    pub fn render(&self, style: &TableStyle) -> String {
        let widths = self.column_widths();
        let mut out = String::new();

        push_row(&mut out, &self.header, &widths, &style.separator);

        let separators = display_width(&style.separator) * widths.len().saturating_sub(1);
        let rule_len = widths.iter().sum::<usize>() + separators;
        out.extend(std::iter::repeat_n(style.rule, rule_len));
        out.push('\n');

        for row in &self.rows {
            push_row(&mut out, row, &widths, &style.separator);
        }
        out
    }

    fn check_arity(&self, first_data_record: usize) -> Result<(), TableError> {
        let expected = self.columns();
        for (index, row) in self.rows.iter().enumerate() {
            if row.len() != expected {
                return Err(TableError::ArityMismatch {
                    record: index + first_data_record,
                    expected,
                    found: row.len(),
                });
            }
        }
        Ok(())
    }
}

fn parse_records(lines: &[Vec<u8>]) -> Result<Vec<Vec<String>>, TableError> {
    let data = lines.concat();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data.as_slice());

    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record?;
        rows.push(record.iter().map(|field| String::from_utf8_lossy(field).into_owned()).collect());
    }
    Ok(rows)
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize], separator: &str) {
    for (index, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if index > 0 {
            out.push_str(separator);
        }
        // Writing into a String cannot fail
        let _ = write!(out, "{cell:<width$}");
    }
    out.push('\n');
}

fn display_width(text: &str) -> usize {
    text.chars().count()
}
