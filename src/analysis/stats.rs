//! Descriptive statistics: table overview, column profile, KPIs.

use std::collections::HashSet;

use crate::data::{ColumnKind, Table, Value};
use crate::error::Result;

/// Headline numbers shown on the home page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overview {
    pub rows: usize,
    pub columns: usize,
    pub missing: usize,
}

pub fn overview(table: &Table) -> Overview {
    Overview {
        rows: table.row_count(),
        columns: table.column_count(),
        missing: table.missing_count(),
    }
}

/// Per-column summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    pub missing: usize,
    pub distinct: usize,
}

pub fn profile(table: &Table) -> Vec<ColumnProfile> {
    table
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let mut distinct: HashSet<&Value> = HashSet::new();
            let mut missing = 0;
            for value in table.values(idx) {
                if value.is_null() {
                    missing += 1;
                } else {
                    distinct.insert(value);
                }
            }
            ColumnProfile {
                name: column.name.clone(),
                kind: column.kind,
                missing,
                distinct: distinct.len(),
            }
        })
        .collect()
}

/// Key performance indicators for one metric column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kpis {
    pub total: f64,
    pub average: Option<f64>,
    pub max: Option<f64>,
}

pub fn kpis(table: &Table, column: &str) -> Result<Kpis> {
    let idx = table.numeric_index(column)?;
    let values = table.numbers(idx);
    Ok(Kpis {
        total: values.iter().sum(),
        average: mean(&values),
        max: min_max(&values).map(|(_, max)| max),
    })
}

/// `describe()`-style summary of a numeric column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Description {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
    pub max: Option<f64>,
}

impl Description {
    /// Label/value pairs in display order
    pub fn entries(&self) -> Vec<(&'static str, Option<f64>)> {
        vec![
            ("count", Some(self.count as f64)),
            ("mean", self.mean),
            ("std", self.std),
            ("min", self.min),
            ("25%", self.q1),
            ("50%", self.median),
            ("75%", self.q3),
            ("max", self.max),
        ]
    }
}

pub fn describe(table: &Table, column: &str) -> Result<Description> {
    let idx = table.numeric_index(column)?;
    let mut values = table.numbers(idx);
    values.sort_by(|a, b| a.total_cmp(b));

    Ok(Description {
        count: values.len(),
        mean: mean(&values),
        std: sample_std(&values),
        min: values.first().copied(),
        q1: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q3: quantile(&values, 0.75),
        max: values.last().copied(),
    })
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Standard deviation with one degree of freedom removed
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Linear-interpolated quantile of an ascending slice
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let weight = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::read_csv;
    use crate::error::AnalystError;

    fn sample() -> Table {
        read_csv("region,sales\nNorth,10\nSouth,\nNorth,30\nEast,20\n".as_bytes()).unwrap()
    }

    #[test]
    fn test_overview() {
        let o = overview(&sample());
        assert_eq!(o, Overview { rows: 4, columns: 2, missing: 1 });
    }

    #[test]
    fn test_profile_counts_distinct_and_missing() {
        let p = profile(&sample());
        assert_eq!(p[0].distinct, 3);
        assert_eq!(p[0].missing, 0);
        assert_eq!(p[1].kind, ColumnKind::Numeric);
        assert_eq!(p[1].missing, 1);
    }

    #[test]
    fn test_kpis_skip_missing() {
        let k = kpis(&sample(), "sales").unwrap();
        assert_eq!(k.total, 60.0);
        assert_eq!(k.average, Some(20.0));
        assert_eq!(k.max, Some(30.0));
    }

    #[test]
    fn test_kpis_on_text_column_fails() {
        assert!(matches!(
            kpis(&sample(), "region"),
            Err(AnalystError::NotNumeric(_))
        ));
    }

    #[test]
    fn test_kpis_of_empty_column() {
        let table = read_csv("v\n\n".as_bytes()).unwrap();
        let k = kpis(&table, "v").unwrap();
        assert_eq!(k.total, 0.0);
        assert_eq!(k.average, None);
        assert_eq!(k.max, None);
    }

    #[test]
    fn test_describe_quantiles() {
        let table = read_csv("v\n1\n2\n3\n4\n".as_bytes()).unwrap();
        let d = describe(&table, "v").unwrap();
        assert_eq!(d.count, 4);
        assert_eq!(d.mean, Some(2.5));
        assert_eq!(d.min, Some(1.0));
        assert_eq!(d.q1, Some(1.75));
        assert_eq!(d.median, Some(2.5));
        assert_eq!(d.q3, Some(3.25));
        assert_eq!(d.max, Some(4.0));
        let std = d.std.unwrap();
        assert!((std - 1.2909944).abs() < 1e-6);
    }
}
