//! Report rendering
//!
//! Turns the raw CSV lines of one captured region into an aligned table.
//! Pure logic: nothing in here touches the child process or the terminal.

pub mod table;

pub use table::{HeaderSource, Table, TableStyle};
