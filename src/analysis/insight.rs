//! Narrative insights for a custom report.

use super::aggregate::sorted_rows;
use super::format::format_optional;
use super::stats::min_max;
use crate::data::Table;
use crate::error::Result;

/// Direction of `y` across the ordered `x` axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
    Fluctuating,
}

impl Trend {
    pub fn symbol(&self) -> &'static str {
        match self {
            Trend::Increasing => "↑",
            Trend::Decreasing => "↓",
            Trend::Stable => "→",
            Trend::Fluctuating => "~",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Increasing => write!(f, "increasing"),
            Trend::Decreasing => write!(f, "decreasing"),
            Trend::Stable => write!(f, "stable"),
            Trend::Fluctuating => write!(f, "fluctuating"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insight {
    pub x: String,
    pub y: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub trend: Trend,
    /// `x` value on the row holding the maximum `y`
    pub peak_at: Option<String>,
}

impl Insight {
    /// Observation, trend and peak bullets
    pub fn bullets(&self) -> Vec<String> {
        let peak = match (&self.peak_at, self.max) {
            (Some(at), Some(max)) => format!(
                "Peak: {} reaches its highest value, {}, at {} = {}.",
                self.y,
                format_optional(Some(max)),
                self.x,
                at
            ),
            _ => format!("Peak: no values of {} to compare.", self.y),
        };

        vec![
            format!(
                "Observation: The values for {} range from {} to {}.",
                self.y,
                format_optional(self.min),
                format_optional(self.max)
            ),
            format!(
                "Trend: Over the course of {}, the data appears to be {} {}.",
                self.x,
                self.trend,
                self.trend.symbol()
            ),
            peak,
        ]
    }
}

/// Summarize `y` across `x`
pub fn generate(table: &Table, x: &str, y: &str) -> Result<Insight> {
    let x_idx = table.column_index(x)?;
    let y_idx = table.numeric_index(y)?;

    let values = table.numbers(y_idx);
    let range = min_max(&values);

    let order = sorted_rows(table, x)?;
    let rows = table.rows();
    let trend = match (order.first(), order.last()) {
        (Some(&first), Some(&last)) => {
            match (rows[first][y_idx].as_f64(), rows[last][y_idx].as_f64()) {
                (Some(start), Some(end)) if end > start => Trend::Increasing,
                (Some(start), Some(end)) if end < start => Trend::Decreasing,
                // a missing endpoint compares as neither larger nor smaller
                _ => Trend::Stable,
            }
        }
        _ => Trend::Fluctuating,
    };

    let peak_at = range.and_then(|(_, max)| {
        rows.iter()
            .find(|r| r[y_idx].as_f64() == Some(max))
            .map(|r| r[x_idx].to_string())
    });

    Ok(Insight {
        x: x.to_string(),
        y: y.to_string(),
        min: range.map(|(lo, _)| lo),
        max: range.map(|(_, hi)| hi),
        trend,
        peak_at,
    })
}
