//! Custom report builder state.
//!
//! Holds the X/Y/chart-type selection, keeps it valid across data changes,
//! and produces the generated chart plus its narrative insight.

use crate::analysis::{chart::build_chart, insight, ChartData, ChartKind, Insight};
use crate::data::Table;
use crate::error::{AnalystError, Result};

/// Which builder control has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuilderField {
    #[default]
    XAxis,
    YAxis,
    ChartType,
}

impl BuilderField {
    pub fn next(self) -> Self {
        match self {
            BuilderField::XAxis => BuilderField::YAxis,
            BuilderField::YAxis => BuilderField::ChartType,
            BuilderField::ChartType => BuilderField::XAxis,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            BuilderField::XAxis => BuilderField::ChartType,
            BuilderField::YAxis => BuilderField::XAxis,
            BuilderField::ChartType => BuilderField::YAxis,
        }
    }
}

/// A generated report
#[derive(Debug, Clone)]
pub struct Report {
    pub chart: ChartData,
    pub insight: Insight,
}

/// Selection state for the custom report builder
#[derive(Debug, Default)]
pub struct ReportBuilder {
    pub focus: BuilderField,
    /// Index into all columns
    x: usize,
    /// Index into numeric columns
    y: usize,
    kind: usize,
    report: Option<Report>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chart_kind(&self) -> ChartKind {
        ChartKind::ALL[self.kind % ChartKind::ALL.len()]
    }

    pub fn x_column<'a>(&self, table: &'a Table) -> Option<&'a str> {
        table.columns().get(self.x).map(|c| c.name.as_str())
    }

    pub fn y_column(&self, table: &Table) -> Option<String> {
        table.numeric_columns().into_iter().nth(self.y)
    }

    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    /// Step the focused control forward or back, wrapping around
    pub fn cycle(&mut self, table: &Table, forward: bool) {
        let (slot, len) = match self.focus {
            BuilderField::XAxis => (&mut self.x, table.column_count()),
            BuilderField::YAxis => (&mut self.y, table.numeric_columns().len()),
            BuilderField::ChartType => (&mut self.kind, ChartKind::ALL.len()),
        };
        if len == 0 {
            return;
        }
        *slot = if forward {
            (*slot + 1) % len
        } else {
            slot.checked_sub(1).unwrap_or(len - 1)
        };
    }

    /// Keep selections in range after the active table changes; drops a stale report
    pub fn clamp(&mut self, table: &Table) {
        let n_cols = table.column_count();
        let n_numeric = table.numeric_columns().len();
        if self.x >= n_cols {
            self.x = 0;
        }
        if self.y >= n_numeric {
            self.y = 0;
        }
        self.report = None;
    }

    /// Build the chart and insight for the current selection
    pub fn generate(&mut self, table: &Table) -> Result<&Report> {
        let x = self
            .x_column(table)
            .ok_or_else(|| AnalystError::UnknownColumn("x axis".into()))?
            .to_string();
        let y = self
            .y_column(table)
            .ok_or_else(|| AnalystError::UnknownColumn("y axis".into()))?;

        let chart = build_chart(table, &x, &y, self.chart_kind())?;
        let insight = insight::generate(table, &x, &y)?;
        Ok(&*self.report.insert(Report { chart, insight }))
    }
}
