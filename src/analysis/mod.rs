//! Analysis over a loaded table: statistics, grouping, chart data and narratives.

pub mod aggregate;
pub mod chart;
pub mod format;
pub mod insight;
pub mod stats;

pub use aggregate::AggFunc;
pub use chart::{ChartData, ChartKind};
pub use format::format_amount;
pub use insight::Insight;
