//! Terminal User Interface components for auto-analyst.

pub mod chart;
mod help;
pub mod selector;
mod theme;
pub mod widgets;

pub use help::{centered_rect, HelpOverlay};
pub use theme::Theme;
