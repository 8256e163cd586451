use esprobe_core::{EsprobeError, QuestionTable, Result};

pub const XLSX_FILE_NAME: &str = "interview_sheet.xlsx";
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Name of the single worksheet in the exported workbook.
pub const SHEET_NAME: &str = "質問リスト";

/// Write the table as a one-sheet workbook, header row first, every cell a string.
#[cfg(feature = "xlsx")]
pub(crate) fn write_workbook(table: &QuestionTable) -> Result<Vec<u8>> {
    use rust_xlsxwriter::{Format, Workbook, XlsxError};

    fn xlsx_err(e: XlsxError) -> EsprobeError {
        EsprobeError::Export(format!("xlsx write failed: {e}"))
    }

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME).map_err(xlsx_err)?;

    let bold = Format::new().set_bold();
    for (col, label) in table.headers().into_iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, label, &bold)
            .map_err(xlsx_err)?;
    }
    for (i, record) in table.records().iter().enumerate() {
        let row = (i + 1) as u32;
        for (col, value) in record.cells().into_iter().enumerate() {
            sheet.write_string(row, col as u16, value).map_err(xlsx_err)?;
        }
    }

    workbook.save_to_buffer().map_err(xlsx_err)
}

#[cfg(not(feature = "xlsx"))]
pub(crate) fn write_workbook(_table: &QuestionTable) -> Result<Vec<u8>> {
    Err(EsprobeError::ExportCapability(
        "built without the `xlsx` feature".to_string(),
    ))
}

#[cfg(all(test, feature = "xlsx"))]
mod tests {
    use super::*;
    use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
    use esprobe_core::{CellEdit, Record, COLUMN_LABELS};
    use std::io::Cursor;

    fn cell_text(cell: &Data) -> String {
        match cell {
            Data::Empty => String::new(),
            Data::String(s) => s.clone(),
            other => format!("{other:?}"),
        }
    }

    #[test]
    fn workbook_has_named_sheet_with_same_cells() {
        let mut table = QuestionTable::from_records(vec![
            Record::generated("志望動機", "Q1", "Q2", "C1"),
            Record::generated("5年後の姿", "Q3", "Q4", "C2"),
        ]);
        table.apply_edit(1, CellEdit::Rating("4".into())).unwrap();
        table
            .apply_edit(1, CellEdit::ResponseNotes("具体的なエピソードあり".into()))
            .unwrap();

        let bytes = write_workbook(&table).unwrap();
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec![SHEET_NAME.to_string()]);

        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], COLUMN_LABELS.to_vec());
        assert_eq!(rows[1][..4], ["志望動機", "Q1", "Q2", "C1"]);
        assert_eq!(rows[2][4], "具体的なエピソードあり");
        assert_eq!(rows[2][5], "4");
    }
}
