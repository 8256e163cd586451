use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use esprobe_core::{EsprobeError, QuestionTable, Result};

use crate::csv::{export_csv, CSV_FILE_NAME, CSV_MIME};
use crate::xlsx::{write_workbook, XLSX_FILE_NAME, XLSX_MIME};

/// Whether this build can write spreadsheet workbooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum SpreadsheetCapability {
    Available,
    Unavailable(String),
}

impl SpreadsheetCapability {
    pub fn detect() -> Self {
        if cfg!(feature = "xlsx") {
            Self::Available
        } else {
            Self::Unavailable("built without the `xlsx` feature".to_string())
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

/// Output file kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [ExportFormat::Csv, ExportFormat::Xlsx];

    pub fn file_name(self) -> &'static str {
        match self {
            ExportFormat::Csv => CSV_FILE_NAME,
            ExportFormat::Xlsx => XLSX_FILE_NAME,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => CSV_MIME,
            ExportFormat::Xlsx => XLSX_MIME,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Csv => f.write_str("csv"),
            ExportFormat::Xlsx => f.write_str("xlsx"),
        }
    }
}

/// Files written by [`Exporter::write_all`] plus any non-fatal warnings.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

/// Front door for both exporters.
#[derive(Debug, Clone)]
pub struct Exporter {
    capability: SpreadsheetCapability,
}

impl Exporter {
    pub fn new() -> Self {
        Self::with_capability(SpreadsheetCapability::detect())
    }

    pub fn with_capability(capability: SpreadsheetCapability) -> Self {
        Self { capability }
    }

    pub fn capability(&self) -> &SpreadsheetCapability {
        &self.capability
    }

    pub fn csv(&self, table: &QuestionTable) -> Result<Vec<u8>> {
        export_csv(table)
    }

    /// Fails with `ExportCapability` when workbooks cannot be written here.
    pub fn xlsx(&self, table: &QuestionTable) -> Result<Vec<u8>> {
        match &self.capability {
            SpreadsheetCapability::Available => write_workbook(table),
            SpreadsheetCapability::Unavailable(reason) => {
                Err(EsprobeError::ExportCapability(reason.clone()))
            }
        }
    }

    pub fn render(&self, table: &QuestionTable, format: ExportFormat) -> Result<Vec<u8>> {
        match format {
            ExportFormat::Csv => self.csv(table),
            ExportFormat::Xlsx => self.xlsx(table),
        }
    }

    /// Write the requested formats into `dir`.
    ///
    /// A missing spreadsheet capability is recorded as a warning and the
    /// remaining formats are still written.
    pub async fn write_all(
        &self,
        table: &QuestionTable,
        dir: &Path,
        formats: &[ExportFormat],
    ) -> Result<ExportReport> {
        tokio::fs::create_dir_all(dir).await?;

        let mut report = ExportReport::default();
        for &format in formats {
            let bytes = match self.render(table, format) {
                Ok(bytes) => bytes,
                Err(e) if e.is_warning() => {
                    warn!(format = %format, error = %e, "Skipping export");
                    report.warnings.push(e.user_message());
                    continue;
                }
                Err(e) => return Err(e),
            };
            let path = dir.join(format.file_name());
            tokio::fs::write(&path, &bytes).await?;
            info!(format = %format, path = %path.display(), bytes = bytes.len(), "Exported question sheet");
            report.written.push(path);
        }
        Ok(report)
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new()
    }
}
