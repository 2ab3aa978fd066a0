//! Reading uploaded files into a [`Table`].
//!
//! Supported sources:
//! - `.csv`: first record is the header, every other record a row
//! - `.xlsx`: first worksheet, first row is the header

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use tracing::{debug, info};

use super::models::{parse_datetime, Table, Value};
use crate::error::{AnalystError, Result};

/// File formats accepted for upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Xlsx,
}

impl SourceFormat {
    /// Detect the format from the file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "xlsx" => Ok(SourceFormat::Xlsx),
            _ => Err(AnalystError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFormat::Csv => write!(f, "csv"),
            SourceFormat::Xlsx => write!(f, "xlsx"),
        }
    }
}

/// A loaded file and its raw (uncleaned) table
#[derive(Debug, Clone)]
pub struct Dataset {
    pub path: PathBuf,
    pub format: SourceFormat,
    pub table: Table,
}

impl Dataset {
    /// Load a CSV or XLSX file from disk
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = SourceFormat::from_path(path)?;

        let table = match format {
            SourceFormat::Csv => read_csv(File::open(path)?)?,
            SourceFormat::Xlsx => read_xlsx(path)?,
        };

        info!(
            path = %path.display(),
            %format,
            rows = table.row_count(),
            columns = table.column_count(),
            "loaded dataset"
        );

        Ok(Dataset {
            path: path.to_path_buf(),
            format,
            table,
        })
    }

    /// File name for display
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Parse CSV text into a table
pub fn read_csv<R: Read>(reader: R) -> Result<Table> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() || (headers.len() == 1 && headers[0].is_empty()) {
        return Err(AnalystError::EmptyData);
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if record.len() > headers.len() {
            return Err(AnalystError::RaggedRow {
                line: record.position().map(|p| p.line()).unwrap_or(0),
                expected: headers.len(),
                found: record.len(),
            });
        }
        // Blank lines are skipped rather than read as all-null rows
        if record.len() == 1 && record[0].is_empty() && headers.len() > 1 {
            continue;
        }
        rows.push(record.iter().map(Value::from_raw).collect());
    }

    debug!(rows = rows.len(), "parsed csv records");
    Ok(Table::from_cells(headers, rows))
}

/// Read the first worksheet of an Excel workbook
fn read_xlsx(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(AnalystError::EmptyWorkbook)??;

    let mut rows_iter = range.rows();
    let headers: Vec<String> = match rows_iter.next() {
        Some(header) => header.iter().map(header_text).collect(),
        None => return Err(AnalystError::EmptyData),
    };

    let rows: Vec<Vec<Value>> = rows_iter
        .map(|row| row.iter().map(cell_value).collect())
        .collect();

    Ok(Table::from_cells(headers, rows))
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(f) => Value::Number(*f).to_string(),
        other => other.to_string(),
    }
}

/// Map a spreadsheet cell onto a table value
fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::Int(i) => Value::Number(*i as f64),
        Data::Float(f) => Value::Number(*f),
        Data::String(s) => Value::from_raw(s),
        Data::Bool(b) => Value::Text(if *b { "True" } else { "False" }.to_string()),
        Data::DateTime(dt) => dt.as_datetime().map(Value::Date).unwrap_or(Value::Null),
        Data::DateTimeIso(s) => parse_datetime(s)
            .map(Value::Date)
            .unwrap_or_else(|| Value::from_raw(s)),
        Data::DurationIso(s) => Value::from_raw(s),
    }
}
