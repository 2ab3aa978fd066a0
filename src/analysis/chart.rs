//! Chart data built from a table, independent of how it is drawn.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use super::aggregate::{group_by, histogram, sorted_rows, AggFunc, Bin};
use crate::data::{ColumnKind, Table, Value};
use crate::error::Result;

/// Chart types offered by the custom report builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Scatter,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [ChartKind::Bar, ChartKind::Line, ChartKind::Scatter];
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartKind::Bar => write!(f, "Bar Chart"),
            ChartKind::Line => write!(f, "Line Chart"),
            ChartKind::Scatter => write!(f, "Scatter Plot"),
        }
    }
}

/// How x positions of a point series map back to labels
#[derive(Debug, Clone, PartialEq)]
pub enum XScale {
    Numeric,
    /// Seconds since the Unix epoch
    Temporal,
    /// Ordinal positions into these category names
    Categorical(Vec<String>),
}

impl XScale {
    /// Label for an x position
    pub fn label(&self, x: f64) -> String {
        match self {
            XScale::Numeric => super::format::format_axis(x),
            XScale::Temporal => DateTime::from_timestamp(x as i64, 0)
                .map(|dt| dt.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            XScale::Categorical(names) => {
                let idx = x.round();
                if idx < 0.0 {
                    return String::new();
                }
                names.get(idx as usize).cloned().unwrap_or_default()
            }
        }
    }
}

/// Share of one category in a categorical split
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub label: String,
    pub value: f64,
    /// Fraction of the positive total, 0.0 ..= 1.0
    pub share: f64,
}

/// Everything needed to draw a chart
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Bars {
        title: String,
        bars: Vec<(String, f64)>,
    },
    Series {
        title: String,
        kind: ChartKind,
        x_label: String,
        y_label: String,
        x_scale: XScale,
        points: Vec<(f64, f64)>,
    },
    Histogram {
        title: String,
        bins: Vec<Bin>,
    },
    Split {
        title: String,
        slices: Vec<Slice>,
    },
}

impl ChartData {
    pub fn title(&self) -> &str {
        match self {
            ChartData::Bars { title, .. }
            | ChartData::Series { title, .. }
            | ChartData::Histogram { title, .. }
            | ChartData::Split { title, .. } => title,
        }
    }

    /// Label/value pairs for plain-text output
    pub fn points_as_text(&self) -> Vec<(String, String)> {
        use super::format::format_amount;
        match self {
            ChartData::Bars { bars, .. } => bars
                .iter()
                .map(|(label, v)| (label.clone(), format_amount(*v)))
                .collect(),
            ChartData::Series { x_scale, points, .. } => points
                .iter()
                .map(|(x, y)| (x_scale.label(*x), format_amount(*y)))
                .collect(),
            ChartData::Histogram { bins, .. } => bins
                .iter()
                .map(|b| {
                    (
                        format!("{} - {}", format_amount(b.lower), format_amount(b.upper)),
                        b.count.to_string(),
                    )
                })
                .collect(),
            ChartData::Split { slices, .. } => slices
                .iter()
                .map(|s| {
                    (
                        s.label.clone(),
                        format!("{} ({:.1}%)", format_amount(s.value), s.share * 100.0),
                    )
                })
                .collect(),
        }
    }
}

/// Build the custom-report chart of `y` against `x`
pub fn build_chart(table: &Table, x: &str, y: &str, kind: ChartKind) -> Result<ChartData> {
    let x_idx = table.column_index(x)?;
    let y_idx = table.numeric_index(y)?;

    if kind == ChartKind::Bar {
        let bars = group_by(table, x, Some(y), AggFunc::Sum)?
            .into_iter()
            .map(|g| (g.key.to_string(), g.value.unwrap_or(0.0)))
            .collect();
        return Ok(ChartData::Bars {
            title: format!("{y} by {x}"),
            bars,
        });
    }

    let order: Vec<usize> = match kind {
        ChartKind::Line => sorted_rows(table, x)?,
        _ => (0..table.row_count()).collect(),
    };

    let x_kind = table.columns()[x_idx].kind;
    let mut categories: Vec<String> = Vec::new();
    let mut points = Vec::with_capacity(order.len());

    for row_idx in order {
        let row = &table.rows()[row_idx];
        let Some(y_val) = row[y_idx].as_f64() else {
            continue;
        };
        let x_val = match &row[x_idx] {
            Value::Null => continue,
            Value::Number(v) => *v,
            Value::Date(d) => d.and_utc().timestamp() as f64,
            other => {
                let label = other.to_string();
                match categories.iter().position(|c| *c == label) {
                    Some(pos) => pos as f64,
                    None => {
                        categories.push(label);
                        (categories.len() - 1) as f64
                    }
                }
            }
        };
        points.push((x_val, y_val));
    }

    let x_scale = match x_kind {
        ColumnKind::Numeric => XScale::Numeric,
        ColumnKind::Temporal => XScale::Temporal,
        ColumnKind::Text => XScale::Categorical(categories),
    };

    Ok(ChartData::Series {
        title: format!("{y} vs {x}"),
        kind,
        x_label: x.to_string(),
        y_label: y.to_string(),
        x_scale,
        points,
    })
}

/// Distribution of a metric
pub fn distribution(table: &Table, metric: &str) -> Result<ChartData> {
    let idx = table.numeric_index(metric)?;
    Ok(ChartData::Histogram {
        title: format!("Distribution of {metric}"),
        bins: histogram(&table.numbers(idx), None),
    })
}

/// Metric summed per category, with each category's share
pub fn category_split(table: &Table, category: &str, metric: &str) -> Result<ChartData> {
    let groups = group_by(table, category, Some(metric), AggFunc::Sum)?;
    let positive_total: f64 = groups
        .iter()
        .filter_map(|g| g.value)
        .filter(|v| *v > 0.0)
        .sum();

    let slices = groups
        .into_iter()
        .map(|g| {
            let value = g.value.unwrap_or(0.0);
            let share = if positive_total > 0.0 && value > 0.0 {
                value / positive_total
            } else {
                0.0
            };
            Slice {
                label: g.key.to_string(),
                value,
                share,
            }
        })
        .collect();

    Ok(ChartData::Split {
        title: format!("{metric} by {category}"),
        slices,
    })
}
