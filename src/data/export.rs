//! Writing tables back out: CSV download and plain-text previews.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::info;

use super::models::Table;
use crate::error::Result;

/// File name used for the cleaned-data download
pub const DEFAULT_EXPORT_NAME: &str = "cleaned_data.csv";

/// Write a table as CSV (header row, no index column)
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(table.column_names())?;
    for row in table.rows() {
        wtr.write_record(row.iter().map(|v| v.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save a table as a CSV file
pub fn save_csv(table: &Table, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_csv(table, file)?;
    info!(path = %path.display(), rows = table.row_count(), "wrote csv");
    Ok(())
}

/// Render a table as aligned text with a leading row index
pub fn render_text(table: &Table) -> String {
    let mut grid: Vec<Vec<String>> = Vec::with_capacity(table.row_count() + 1);

    let mut header = vec![String::new()];
    header.extend(table.column_names().iter().map(|n| n.to_string()));
    grid.push(header);

    for (i, row) in table.rows().iter().enumerate() {
        let mut line = vec![i.to_string()];
        line.extend(row.iter().map(|v| {
            if v.is_null() {
                "NaN".to_string()
            } else {
                v.to_string()
            }
        }));
        grid.push(line);
    }

    let widths: Vec<usize> = (0..grid[0].len())
        .map(|col| {
            grid.iter()
                .map(|line| line[col].chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    grid.iter()
        .map(|line| {
            line.iter()
                .zip(&widths)
                .map(|(cell, w)| format!("{cell:>w$}"))
                .collect::<Vec<_>>()
                .join("  ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::read_csv;

    #[test]
    fn test_write_csv_leaves_missing_empty() {
        let table = read_csv("name,score\nann,1.5\nbob,\n".as_bytes()).unwrap();
        let mut out = Vec::new();
        write_csv(&table, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "name,score\nann,1.5\nbob,\n");
    }

    #[test]
    fn test_save_csv_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_EXPORT_NAME);
        let table = read_csv("a\n1\n2\n".as_bytes()).unwrap();
        save_csv(&table, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "a\n1\n2\n");
    }

    #[test]
    fn test_render_text_aligns_columns() {
        let table = read_csv("city,pop\nRome,10\nOslo,\n".as_bytes()).unwrap();
        let text = render_text(&table);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "   city  pop");
        assert_eq!(lines[1], "0  Rome   10");
        assert_eq!(lines[2], "1  Oslo  NaN");
    }
}
