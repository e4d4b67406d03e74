//! Storage layer for lineup snapshots and history.
//!
//! Reading and writing the on-disk documents lives here; reconciliation
//! itself never touches the filesystem.

pub mod csv;
pub mod json;

// Re-export key types
pub use csv::{CSV_HEADERS, CsvExporter};
pub use json::JsonStore;
