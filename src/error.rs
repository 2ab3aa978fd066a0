//! Error types shared by the data, analysis and chat layers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalystError {
    #[error("Unsupported file format: {0} (expected .csv or .xlsx)")]
    UnsupportedFormat(String),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No columns to parse from file")]
    EmptyData,

    #[error("Line {line}: expected {expected} fields, saw {found}")]
    RaggedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("Workbook has no worksheets")]
    EmptyWorkbook,

    #[error("Column '{0}' not found")]
    UnknownColumn(String),

    #[error("Column '{0}' is not numeric")]
    NotNumeric(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM request failed: {0}")]
    Llm(String),

    #[error("Could not understand the model's reply: {0}")]
    Plan(String),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

pub type Result<T> = std::result::Result<T, AnalystError>;
