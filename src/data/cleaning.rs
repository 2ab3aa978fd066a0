//! Auto-cleaning: drop duplicate rows and fill missing values.

use std::collections::HashSet;

use tracing::info;

use super::models::{ColumnKind, Table, Value};

/// Fill value for missing numeric cells
pub const NUMERIC_FILL: f64 = 0.0;

/// Fill value for missing text cells
pub const TEXT_FILL: &str = "Unknown";

/// What a cleaning pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningReport {
    pub rows_before: usize,
    pub duplicates_removed: usize,
    pub numeric_filled: usize,
    pub text_filled: usize,
}

impl CleaningReport {
    pub fn rows_after(&self) -> usize {
        self.rows_before - self.duplicates_removed
    }
}

/// Clean a table: duplicates first, then fills.
///
/// Spreadsheet date columns are left untouched; date strings from a CSV are
/// ordinary text and get the text fill.
pub fn auto_clean(table: &Table) -> (Table, CleaningReport) {
    let mut report = CleaningReport {
        rows_before: table.row_count(),
        ..Default::default()
    };

    let (columns, rows) = table.clone().into_parts();
    let (mut rows, removed) = drop_duplicates(rows);
    report.duplicates_removed = removed;

    for row in &mut rows {
        for (cell, column) in row.iter_mut().zip(&columns) {
            if !cell.is_null() {
                continue;
            }
            match column.kind {
                ColumnKind::Numeric => {
                    *cell = Value::Number(NUMERIC_FILL);
                    report.numeric_filled += 1;
                }
                ColumnKind::Text => {
                    *cell = Value::Text(TEXT_FILL.to_string());
                    report.text_filled += 1;
                }
                ColumnKind::Temporal => {}
            }
        }
    }

    info!(
        rows_before = report.rows_before,
        duplicates_removed = report.duplicates_removed,
        numeric_filled = report.numeric_filled,
        text_filled = report.text_filled,
        "auto-cleaned table"
    );

    (Table::new(columns, rows), report)
}

/// Keep the first occurrence of each distinct row, preserving order
fn drop_duplicates(rows: Vec<Vec<Value>>) -> (Vec<Vec<Value>>, usize) {
    let before = rows.len();
    let mut seen: HashSet<Vec<Value>> = HashSet::with_capacity(before);
    let kept: Vec<Vec<Value>> = rows
        .into_iter()
        .filter(|row| seen.insert(row.clone()))
        .collect();
    let removed = before - kept.len();
    (kept, removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::read_csv;
    use crate::data::models::parse_datetime;

    #[test]
    fn test_auto_clean_drops_duplicates_then_fills() {
        let data = "region,sales,day\nNorth,10,2024-01-01\nNorth,10,2024-01-01\n,,\nSouth,,2024-01-03\n";
        let table = read_csv(data.as_bytes()).unwrap();
        let (cleaned, report) = auto_clean(&table);

        assert_eq!(report.rows_before, 4);
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(report.rows_after(), 3);
        assert_eq!(report.numeric_filled, 2);
        assert_eq!(report.text_filled, 2);

        assert_eq!(cleaned.row_count(), 3);
        assert_eq!(cleaned.rows()[1][0], Value::Text("Unknown".into()));
        assert_eq!(cleaned.rows()[1][1], Value::Number(0.0));
        assert_eq!(cleaned.rows()[1][2], Value::Text("Unknown".into()));
        assert_eq!(cleaned.missing_count(), 0);
    }

    #[test]
    fn test_csv_date_strings_fill_as_text() {
        let data = "day,region,v\n2024-01-01,North,1\n,South,2\n";
        let table = read_csv(data.as_bytes()).unwrap();
        let kinds: Vec<ColumnKind> = table.columns().iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![ColumnKind::Text, ColumnKind::Text, ColumnKind::Numeric]);
        assert_eq!(table.text_columns(), vec!["day", "region"]);

        let (cleaned, report) = auto_clean(&table);
        assert_eq!(cleaned.rows()[1][0], Value::Text("Unknown".into()));
        assert_eq!(report.text_filled, 1);
        assert_eq!(cleaned.missing_count(), 0);
    }

    #[test]
    fn test_spreadsheet_dates_stay_missing() {
        let day = parse_datetime("2024-01-01").unwrap();
        let table = Table::from_cells(
            vec!["day".into(), "v".into()],
            vec![
                vec![Value::Date(day), Value::Number(1.0)],
                vec![Value::Null, Value::Null],
            ],
        );
        let (cleaned, report) = auto_clean(&table);
        assert_eq!(cleaned.columns()[0].kind, ColumnKind::Temporal);
        assert!(cleaned.rows()[1][0].is_null());
        assert_eq!(report.numeric_filled, 1);
        assert_eq!(report.text_filled, 0);
    }

    #[test]
    fn test_rows_differing_only_in_missing_stay_distinct() {
        // 0 and missing are compared before filling, so both rows survive
        let data = "a,b\nx,0\nx,\n";
        let table = read_csv(data.as_bytes()).unwrap();
        let (cleaned, report) = auto_clean(&table);
        assert_eq!(report.duplicates_removed, 0);
        assert_eq!(cleaned.row_count(), 2);
        assert_eq!(cleaned.rows()[0], cleaned.rows()[1]);
    }

    #[test]
    fn test_clean_table_is_noop() {
        let data = "a,b\nx,1\ny,2\n";
        let table = read_csv(data.as_bytes()).unwrap();
        let (cleaned, report) = auto_clean(&table);
        assert_eq!(report.duplicates_removed + report.numeric_filled + report.text_filled, 0);
        assert_eq!(cleaned.rows(), table.rows());
    }
}
