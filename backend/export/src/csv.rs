use ::csv::{QuoteStyle, Terminator, WriterBuilder};

use esprobe_core::{EsprobeError, QuestionTable, Result};

pub const CSV_FILE_NAME: &str = "interview_sheet.csv";
pub const CSV_MIME: &str = "text/csv";

/// Byte-order mark so spreadsheet applications detect UTF-8.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Serialize every column, header first, as BOM-prefixed comma-separated text.
pub fn export_csv(table: &QuestionTable) -> Result<Vec<u8>> {
    let mut buf = UTF8_BOM.to_vec();
    {
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(&mut buf);

        writer.write_record(table.headers()).map_err(csv_err)?;
        for record in table.records() {
            writer.write_record(record.cells()).map_err(csv_err)?;
        }
        writer
            .flush()
            .map_err(|e| EsprobeError::Export(format!("csv flush failed: {e}")))?;
    }
    Ok(buf)
}

fn csv_err(e: ::csv::Error) -> EsprobeError {
    EsprobeError::Export(format!("csv write failed: {e}"))
}
