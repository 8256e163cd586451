//! Serializers from a question table snapshot to downloadable files.
//!
//! Both exporters are pure: they read the table as it is at call time and
//! never mutate it.

pub mod csv;
pub mod exporter;
pub mod xlsx;

pub use self::csv::{export_csv, CSV_FILE_NAME, CSV_MIME};
pub use exporter::{ExportFormat, ExportReport, Exporter, SpreadsheetCapability};
pub use xlsx::{SHEET_NAME, XLSX_FILE_NAME, XLSX_MIME};
