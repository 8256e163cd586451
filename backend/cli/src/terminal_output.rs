//! Terminal output: notes, ANSI styling, and question-table rendering.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use esprobe_core::{QuestionTable, COLUMN_LABELS};

// ---------------------------------------------------------------------------
// ANSI Color/Style helpers
// ---------------------------------------------------------------------------

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

/// Strip ANSI escape codes from a string.
pub fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

// ---------------------------------------------------------------------------
// Formatted notes
// ---------------------------------------------------------------------------

pub fn note_info(msg: &str) {
    if supports_color() {
        println!("{CYAN}{BOLD}ℹ{RESET} {msg}");
    } else {
        println!("INFO: {msg}");
    }
}

pub fn note_warn(msg: &str) {
    if supports_color() {
        println!("{YELLOW}{BOLD}⚠{RESET} {msg}");
    } else {
        println!("WARN: {msg}");
    }
}

pub fn note_error(msg: &str) {
    if supports_color() {
        eprintln!("{RED}{BOLD}✗{RESET} {msg}");
    } else {
        eprintln!("ERROR: {msg}");
    }
}

pub fn note_success(msg: &str) {
    if supports_color() {
        println!("{GREEN}{BOLD}✓{RESET} {msg}");
    } else {
        println!("OK: {msg}");
    }
}

// ---------------------------------------------------------------------------
// Table rendering
// ---------------------------------------------------------------------------

/// A table column definition.
pub struct Column {
    pub header: String,
    pub max_width: Option<usize>,
}

impl Column {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            max_width: None,
        }
    }

    pub fn capped(header: impl Into<String>, max_width: usize) -> Self {
        Self {
            header: header.into(),
            max_width: Some(max_width),
        }
    }
}

/// Terminal columns taken by `s`, ignoring ANSI codes. CJK characters count as two.
fn visible_width(s: &str) -> usize {
    UnicodeWidthStr::width(strip_ansi(s).as_str())
}

/// Cut a plain cell to at most `width` terminal columns, marking the cut with `…`.
fn truncate(s: &str, width: usize) -> String {
    if UnicodeWidthStr::width(s) <= width {
        return s.to_string();
    }
    let budget = width.saturating_sub(1);
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

/// Render a left-aligned table. Cells wider than their column cap are cut.
pub fn render_table(columns: &[Column], rows: &[Vec<String>]) -> String {
    let num_cols = columns.len();
    let mut widths: Vec<usize> = columns.iter().map(|c| visible_width(&c.header)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(num_cols) {
            let w = match columns[i].max_width {
                Some(max) => visible_width(cell).min(max),
                None => visible_width(cell),
            };
            widths[i] = widths[i].max(w);
        }
    }

    let mut out = String::new();

    let header_cells: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| pad_cell(&col.header, widths[i]))
        .collect();
    out.push_str(&format!("{BOLD}  {}  {RESET}\n", header_cells.join("  ")));

    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("  {}  \n", sep.join("  ")));

    for row in rows {
        let cells: Vec<String> = (0..num_cols)
            .map(|i| {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                let cell = match columns[i].max_width {
                    Some(max) => truncate(cell, max),
                    None => cell.to_string(),
                };
                pad_cell(&cell, widths[i])
            })
            .collect();
        out.push_str(&format!("  {}  \n", cells.join("  ")));
    }

    out
}

fn pad_cell(s: &str, width: usize) -> String {
    let pad = width.saturating_sub(visible_width(s));
    format!("{s}{}", " ".repeat(pad))
}

/// Render the question table with a leading row-number column.
pub fn render_question_table(table: &QuestionTable) -> String {
    let mut columns = vec![Column::new("#")];
    columns.extend(COLUMN_LABELS.iter().map(|label| Column::capped(*label, 28)));

    let rows: Vec<Vec<String>> = table
        .records()
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let mut row = vec![i.to_string()];
            row.extend(record.cells().iter().map(|c| c.replace('\n', " ")));
            row
        })
        .collect();

    render_table(&columns, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use esprobe_core::Record;

    #[test]
    fn strips_ansi() {
        let colored = format!("{GREEN}hello{RESET}");
        assert_eq!(strip_ansi(&colored), "hello");
    }

    #[test]
    fn long_cells_are_cut_to_the_column_cap() {
        let cols = vec![Column::capped("質問", 5)];
        let rows = vec![vec!["あいうえおかきくけこ".to_string()]];
        let table = strip_ansi(&render_table(&cols, &rows));
        assert!(table.contains("あい…"));
        assert!(!table.contains("う"));
    }

    #[test]
    fn mixed_width_rows_line_up() {
        let cols = vec![Column::new("セクション"), Column::capped("メイン質問", 12)];
        let rows = vec![
            vec!["志望動機".to_string(), "なぜ当社ですか、詳しく教えてください".to_string()],
            vec!["abcd".to_string(), "Q".to_string()],
            vec!["5年後".to_string(), "Why us?".to_string()],
        ];
        let out = strip_ansi(&render_table(&cols, &rows));
        let widths: Vec<usize> = out.lines().map(UnicodeWidthStr::width).collect();
        assert_eq!(widths.len(), 5);
        assert!(widths.iter().all(|w| *w == widths[0]), "{widths:?}\n{out}");
    }

    #[test]
    fn question_table_has_labels_and_rows() {
        let table = QuestionTable::from_records(vec![
            Record::generated("志望動機", "なぜ当社ですか", "他社との違いは", "一貫性"),
            Record::generated("5年後の姿", "5年後は", "そのために", "具体性"),
        ]);
        let out = strip_ansi(&render_question_table(&table));
        for label in COLUMN_LABELS {
            assert!(out.contains(label));
        }
        assert!(out.contains("なぜ当社ですか"));
        assert_eq!(out.lines().count(), 4);
    }
}
