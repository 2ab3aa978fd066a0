//! Grouping, sorting and binning over table columns.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::stats::{mean, min_max};
use crate::data::{Table, Value};
use crate::error::Result;

/// Upper bound on automatically chosen histogram bins
const MAX_BINS: usize = 50;

/// Aggregation applied to a group of values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggFunc {
    Sum,
    Mean,
    Min,
    Max,
    Count,
}

impl AggFunc {
    pub fn apply(self, values: &[f64]) -> Option<f64> {
        match self {
            AggFunc::Sum => Some(values.iter().sum()),
            AggFunc::Mean => mean(values),
            AggFunc::Min => min_max(values).map(|(lo, _)| lo),
            AggFunc::Max => min_max(values).map(|(_, hi)| hi),
            AggFunc::Count => Some(values.len() as f64),
        }
    }
}

impl std::fmt::Display for AggFunc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AggFunc::Sum => "Total",
            AggFunc::Mean => "Average",
            AggFunc::Min => "Minimum",
            AggFunc::Max => "Maximum",
            AggFunc::Count => "Count",
        };
        write!(f, "{label}")
    }
}

/// One group of a group-by
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: Value,
    pub value: Option<f64>,
}

/// Aggregate `value` per distinct non-null `key`, ordered by key.
///
/// With no value column the groups are row counts.
pub fn group_by(table: &Table, key: &str, value: Option<&str>, func: AggFunc) -> Result<Vec<Group>> {
    let key_idx = table.column_index(key)?;
    let value_idx = match value {
        Some(name) if func == AggFunc::Count => Some(table.column_index(name)?),
        Some(name) => Some(table.numeric_index(name)?),
        None => None,
    };

    let mut order: Vec<&Value> = Vec::new();
    let mut buckets: HashMap<&Value, (usize, Vec<f64>)> = HashMap::new();

    for row in table.rows() {
        let k = &row[key_idx];
        if k.is_null() {
            continue;
        }
        let bucket = buckets.entry(k).or_insert_with(|| {
            order.push(k);
            (0, Vec::new())
        });
        match value_idx {
            Some(vi) => {
                let cell = &row[vi];
                if let Some(v) = cell.as_f64() {
                    bucket.1.push(v);
                } else if !cell.is_null() {
                    bucket.0 += 1;
                }
            }
            None => bucket.0 += 1,
        }
    }

    order.sort_by(|a, b| a.sort_cmp(b));

    Ok(order
        .into_iter()
        .map(|k| {
            let (others, numbers) = &buckets[k];
            let value = match (func, value_idx) {
                (AggFunc::Count, _) => Some((numbers.len() + others) as f64),
                _ => func.apply(numbers),
            };
            Group {
                key: k.clone(),
                value,
            }
        })
        .collect())
}

/// Aggregate a whole column
pub fn aggregate(table: &Table, column: &str, func: AggFunc) -> Result<Option<f64>> {
    if func == AggFunc::Count {
        let idx = table.column_index(column)?;
        return Ok(Some(table.values(idx).filter(|v| !v.is_null()).count() as f64));
    }
    let idx = table.numeric_index(column)?;
    Ok(func.apply(&table.numbers(idx)))
}

/// Row indices ordered by a column, nulls last, ties in original order
pub fn sorted_rows(table: &Table, column: &str) -> Result<Vec<usize>> {
    let idx = table.column_index(column)?;
    let rows = table.rows();
    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.sort_by(|&a, &b| rows[a][idx].sort_cmp(&rows[b][idx]));
    Ok(order)
}

/// A histogram bin covering `[lower, upper)`; the last bin also includes `upper`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Bin count from Sturges' rule
pub fn sturges_bins(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    ((n as f64).log2().ceil() as usize + 1).min(MAX_BINS)
}

/// Equal-width histogram of finite values
pub fn histogram(values: &[f64], bins: Option<usize>) -> Vec<Bin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let Some((lo, hi)) = min_max(&finite) else {
        return Vec::new();
    };

    if lo == hi {
        return vec![Bin {
            lower: lo,
            upper: hi,
            count: finite.len(),
        }];
    }

    let n_bins = bins.unwrap_or_else(|| sturges_bins(finite.len())).max(1);
    let width = (hi - lo) / n_bins as f64;
    let mut out: Vec<Bin> = (0..n_bins)
        .map(|i| Bin {
            lower: lo + width * i as f64,
            upper: if i + 1 == n_bins { hi } else { lo + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for v in finite {
        let slot = (((v - lo) / width) as usize).min(n_bins - 1);
        out[slot].count += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::read_csv;

    fn sales() -> Table {
        read_csv(
            "region,sales,day\nSouth,5,2024-01-03\nNorth,10,2024-01-01\n,7,\nNorth,,2024-01-02\nSouth,1,\n"
                .as_bytes(),
        )
        .unwrap()
    }

    #[test]
    fn test_group_sum_sorted_by_key_and_drops_null_keys() {
        let groups = group_by(&sales(), "region", Some("sales"), AggFunc::Sum).unwrap();
        assert_eq!(
            groups,
            vec![
                Group { key: Value::Text("North".into()), value: Some(10.0) },
                Group { key: Value::Text("South".into()), value: Some(6.0) },
            ]
        );
    }

    #[test]
    fn test_group_count_without_value_counts_rows() {
        let groups = group_by(&sales(), "region", None, AggFunc::Count).unwrap();
        assert_eq!(groups[0].value, Some(2.0));
        assert_eq!(groups[1].value, Some(2.0));
    }

    #[test]
    fn test_group_mean_of_empty_group_is_none() {
        let table = read_csv("k,v\na,\nb,4\n".as_bytes()).unwrap();
        let groups = group_by(&table, "k", Some("v"), AggFunc::Mean).unwrap();
        assert_eq!(groups[0].value, None);
        assert_eq!(groups[1].value, Some(4.0));
    }

    #[test]
    fn test_aggregate_scalar() {
        let table = sales();
        assert_eq!(aggregate(&table, "sales", AggFunc::Sum).unwrap(), Some(23.0));
        assert_eq!(aggregate(&table, "sales", AggFunc::Max).unwrap(), Some(10.0));
        assert_eq!(aggregate(&table, "region", AggFunc::Count).unwrap(), Some(4.0));
        assert!(aggregate(&table, "region", AggFunc::Sum).is_err());
    }

    #[test]
    fn test_sorted_rows_nulls_last() {
        let order = sorted_rows(&sales(), "day").unwrap();
        assert_eq!(order, vec![1, 3, 0, 2, 4]);
    }

    #[test]
    fn test_histogram_bins() {
        let bins = histogram(&[0.0, 1.0, 2.0, 3.0, 4.0], Some(2));
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].count, 2);
        assert_eq!(bins[1].count, 3);
        assert_eq!(bins[1].upper, 4.0);
    }

    #[test]
    fn test_histogram_single_value() {
        let bins = histogram(&[3.0, 3.0], None);
        assert_eq!(bins, vec![Bin { lower: 3.0, upper: 3.0, count: 2 }]);
        assert!(histogram(&[], None).is_empty());
    }

    #[test]
    fn test_sturges() {
        assert_eq!(sturges_bins(1), 1);
        assert_eq!(sturges_bins(8), 4);
        assert_eq!(sturges_bins(100), 8);
    }
}
