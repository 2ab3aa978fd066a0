//! Data layer: loading uploaded files, cleaning them and writing them back out.

pub mod cleaning;
pub mod export;
mod loader;
mod models;

pub use cleaning::{auto_clean, CleaningReport};
pub use loader::{read_csv, Dataset};
pub use models::{ColumnKind, Table, Value};
