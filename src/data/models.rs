//! Data models for a loaded spreadsheet: cells, columns and tables.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{AnalystError, Result};

/// Tokens read as missing values, in addition to the empty string
const NA_TOKENS: &[&str] = &[
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "#N/A", "#NA",
    "<NA>", "-1.#IND", "1.#QNAN", "#N/A N/A",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// A single cell
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Number(f64),
    Text(String),
    Date(NaiveDateTime),
}

impl Value {
    /// Build a cell from raw text, mapping missing-value tokens to `Null`.
    ///
    /// The text is kept as-is; typing happens later during column inference.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || NA_TOKENS.contains(&trimmed) {
            Value::Null
        } else {
            Value::Text(raw.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Ordering used when sorting a column: nulls last, then natural order.
    ///
    /// Cells of different non-null types compare by type rank so sorting never panics.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Number(_) => 0,
            Value::Date(_) => 1,
            Value::Text(_) => 2,
            Value::Null => 3,
        }
    }

    /// Number with -0.0 folded into 0.0 so equal values hash equally
    fn number_bits(v: f64) -> u64 {
        if v == 0.0 {
            0.0f64.to_bits()
        } else {
            v.to_bits()
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Number(a), Value::Number(b)) => {
                Value::number_bits(*a) == Value::number_bits(*b)
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Null => {}
            Value::Number(v) => Value::number_bits(*v).hash(state),
            Value::Text(s) => s.hash(state),
            Value::Date(d) => d.hash(state),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Number(v) => {
                if v.fract() == 0.0 && v.abs() < 1e15 {
                    write!(f, "{}", *v as i64)
                } else {
                    write!(f, "{v}")
                }
            }
            Value::Text(s) => write!(f, "{s}"),
            Value::Date(d) => {
                if d.time() == NaiveTime::MIN {
                    write!(f, "{}", d.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S"))
                }
            }
        }
    }
}

/// Parse a date or datetime written in one of the common layouts
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Inferred type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Text,
    Temporal,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "number"),
            ColumnKind::Text => write!(f, "text"),
            ColumnKind::Temporal => write!(f, "date"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// A rectangular table of cells with typed columns
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create a table from already-typed columns and rows.
    ///
    /// Rows are padded or truncated to the column count.
    pub fn new(columns: Vec<Column>, mut rows: Vec<Vec<Value>>) -> Self {
        let width = columns.len();
        for row in &mut rows {
            row.resize(width, Value::Null);
        }
        Table { columns, rows }
    }

    /// Create a table from header names and untyped cells, inferring column kinds.
    pub fn from_cells(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let names = unique_headers(headers);
        let width = names.len();
        let mut rows = rows;
        for row in &mut rows {
            row.resize(width, Value::Null);
        }

        let mut columns = Vec::with_capacity(width);
        for (idx, name) in names.into_iter().enumerate() {
            let kind = infer_kind(rows.iter().map(|r| &r[idx]));
            for row in &mut rows {
                let cell = std::mem::replace(&mut row[idx], Value::Null);
                row[idx] = coerce(cell, kind);
            }
            columns.push(Column { name, kind });
        }

        Table { columns, rows }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Index of a column by name
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| AnalystError::UnknownColumn(name.to_string()))
    }

    /// Index of a numeric column by name
    pub fn numeric_index(&self, name: &str) -> Result<usize> {
        let idx = self.column_index(name)?;
        if self.columns[idx].kind != ColumnKind::Numeric {
            return Err(AnalystError::NotNumeric(name.to_string()));
        }
        Ok(idx)
    }

    /// Names of numeric columns, in column order
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns_of(ColumnKind::Numeric)
    }

    /// Names of text (categorical) columns, in column order
    pub fn text_columns(&self) -> Vec<String> {
        self.columns_of(ColumnKind::Text)
    }

    fn columns_of(&self, kind: ColumnKind) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.name.clone())
            .collect()
    }

    /// Iterate the cells of one column
    pub fn values(&self, idx: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |r| &r[idx])
    }

    /// Non-null numbers of one column
    pub fn numbers(&self, idx: usize) -> Vec<f64> {
        self.values(idx).filter_map(Value::as_f64).collect()
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Total number of null cells
    pub fn missing_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.iter().filter(|v| v.is_null()).count())
            .sum()
    }

    pub(crate) fn into_parts(self) -> (Vec<Column>, Vec<Vec<Value>>) {
        (self.columns, self.rows)
    }
}

/// Replace empty headers with `Unnamed: i` and suffix repeats with `.1`, `.2`, ...
fn unique_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(headers.len());

    for (i, header) in headers.into_iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {i}")
        } else {
            header
        };

        let mut name = base.clone();
        while let Some(count) = seen.get_mut(&name) {
            *count += 1;
            name = format!("{base}.{count}");
        }
        seen.insert(name.clone(), 0);
        seen.entry(base).or_insert(0);
        names.push(name);
    }

    names
}

fn infer_kind<'a>(cells: impl Iterator<Item = &'a Value>) -> ColumnKind {
    let mut numeric = true;
    let mut temporal = true;

    for cell in cells {
        match cell {
            Value::Null => {}
            Value::Number(_) => temporal = false,
            Value::Date(_) => numeric = false,
            // Date-looking strings stay text; only spreadsheet date cells are temporal
            Value::Text(s) => {
                temporal = false;
                if numeric && s.trim().parse::<f64>().is_err() {
                    numeric = false;
                }
            }
        }
        if !numeric && !temporal {
            return ColumnKind::Text;
        }
    }

    // An all-null column reads as numeric
    if numeric {
        ColumnKind::Numeric
    } else {
        ColumnKind::Temporal
    }
}

fn coerce(cell: Value, kind: ColumnKind) -> Value {
    match (kind, cell) {
        (_, Value::Null) => Value::Null,
        (ColumnKind::Numeric, Value::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Value::Number)
            .unwrap_or(Value::Null),
        (ColumnKind::Text, v @ (Value::Number(_) | Value::Date(_))) => Value::Text(v.to_string()),
        (_, v) => v,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::from_raw(s)
    }

    #[test]
    fn test_na_tokens_become_null() {
        for token in ["", "  ", "NA", "nan", "NULL", "#N/A", "None"] {
            assert!(text(token).is_null(), "{token:?} should be null");
        }
        assert!(!text("0").is_null());
    }

    #[test]
    fn test_infers_column_kinds() {
        let table = Table::from_cells(
            vec!["qty".into(), "region".into(), "day".into(), "empty".into()],
            vec![
                vec![text("3"), text("North"), text("2024-01-02"), text("")],
                vec![text("4.5"), text("South"), text("2024-01-03"), text("NA")],
                vec![text(""), text("12"), text(""), text("")],
            ],
        );

        let kinds: Vec<ColumnKind> = table.columns().iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ColumnKind::Numeric,
                ColumnKind::Text,
                ColumnKind::Text,
                ColumnKind::Numeric
            ]
        );
        assert_eq!(table.rows()[1][0], Value::Number(4.5));
        assert_eq!(table.rows()[2][1], Value::Text("12".into()));
        assert_eq!(table.rows()[0][2], Value::Text("2024-01-02".into()));
        assert_eq!(table.numeric_columns(), vec!["qty", "empty"]);
        assert_eq!(table.text_columns(), vec!["region", "day"]);
    }

    #[test]
    fn test_only_date_cells_infer_temporal() {
        let day = parse_datetime("2024-01-02").unwrap();
        let table = Table::from_cells(
            vec!["when".into(), "mixed".into()],
            vec![
                vec![Value::Date(day), Value::Date(day)],
                vec![Value::Null, text("later")],
            ],
        );

        let kinds: Vec<ColumnKind> = table.columns().iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![ColumnKind::Temporal, ColumnKind::Text]);
        assert_eq!(table.rows()[0][1], Value::Text("2024-01-02".into()));
        assert_eq!(table.text_columns(), vec!["mixed"]);
    }

    #[test]
    fn test_unique_headers() {
        let names = unique_headers(vec!["a".into(), "".into(), "a".into(), "a".into()]);
        assert_eq!(names, vec!["a", "Unnamed: 1", "a.1", "a.2"]);
    }

    #[test]
    fn test_value_equality_folds_negative_zero() {
        assert_eq!(Value::Number(0.0), Value::Number(-0.0));
        assert_ne!(Value::Number(1.0), Value::Text("1".into()));
    }

    #[test]
    fn test_sort_cmp_puts_nulls_last() {
        let mut cells = vec![Value::Null, Value::Number(2.0), Value::Number(-1.0)];
        cells.sort_by(|a, b| a.sort_cmp(b));
        assert_eq!(cells, vec![Value::Number(-1.0), Value::Number(2.0), Value::Null]);
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(Value::Number(10.0).to_string(), "10");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        let midnight = parse_datetime("2024-03-01").unwrap();
        assert_eq!(Value::Date(midnight).to_string(), "2024-03-01");
        let later = parse_datetime("2024-03-01 10:30:00").unwrap();
        assert_eq!(Value::Date(later).to_string(), "2024-03-01 10:30:00");
    }

    #[test]
    fn test_missing_count_and_head() {
        let table = Table::from_cells(
            vec!["x".into()],
            vec![vec![text("1")], vec![text("")], vec![text("3")]],
        );
        assert_eq!(table.missing_count(), 1);
        assert_eq!(table.head(2).row_count(), 2);
        assert!(matches!(
            table.numeric_index("y"),
            Err(AnalystError::UnknownColumn(_))
        ));
    }
}
