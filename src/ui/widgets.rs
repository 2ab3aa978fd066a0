//! UI widgets for the analyst dashboard.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, List, ListItem, Paragraph, Row, Table as TableWidget, Tabs, Wrap},
    Frame,
};

use super::theme::Theme;
use crate::analysis::format::format_optional;
use crate::analysis::format_amount;
use crate::analysis::stats::{ColumnProfile, Kpis, Overview};
use crate::data::{CleaningReport, Table};

/// Widest a preview column is allowed to grow
const MAX_CELL_WIDTH: usize = 24;

fn panel<'a>(title: impl Into<String>, focused: bool, theme: &Theme) -> Block<'a> {
    Block::default()
        .title(format!(" {} ", title.into()))
        .borders(Borders::ALL)
        .border_type(if focused {
            BorderType::Double
        } else {
            BorderType::Plain
        })
        .border_style(theme.panel_border(focused))
        .title_style(theme.title_style())
}

/// Page tabs across the top of the screen
pub struct NavMenu<'a> {
    titles: &'a [&'a str],
    selected: usize,
    theme: &'a Theme,
}

impl<'a> NavMenu<'a> {
    pub fn new(titles: &'a [&'a str], selected: usize, theme: &'a Theme) -> Self {
        NavMenu {
            titles,
            selected,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = self
            .titles
            .iter()
            .enumerate()
            .map(|(i, t)| Line::from(format!("{} {}", i + 1, t)))
            .collect();

        let tabs = Tabs::new(titles)
            .block(panel("Navigation", false, self.theme))
            .select(self.selected)
            .style(self.theme.normal_style())
            .highlight_style(self.theme.highlight_style())
            .divider("|");

        frame.render_widget(tabs, area);
    }
}

/// Tabular preview of the first rows of a table
pub struct DataPreview<'a> {
    table: &'a Table,
    rows: usize,
    title: &'a str,
    theme: &'a Theme,
}

impl<'a> DataPreview<'a> {
    pub fn new(table: &'a Table, rows: usize, title: &'a str, theme: &'a Theme) -> Self {
        DataPreview {
            table,
            rows,
            title,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let head = self.table.head(self.rows);
        let body: Vec<Vec<String>> = head
            .rows()
            .iter()
            .map(|row| row.iter().map(|v| cell_text(&v.to_string())).collect())
            .collect();

        let widths: Vec<Constraint> = head
            .columns()
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let widest = body
                    .iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(c.name.chars().count()))
                    .max()
                    .unwrap_or(0);
                Constraint::Length(widest.min(MAX_CELL_WIDTH) as u16)
            })
            .collect();

        let header = Row::new(
            head.columns()
                .iter()
                .map(|c| Cell::from(c.name.clone()).style(self.theme.title_style())),
        );
        let rows = body.into_iter().map(|r| Row::new(r.into_iter().map(Cell::from)));

        let title = format!(
            "{} ({} of {} rows)",
            self.title,
            head.row_count(),
            self.table.row_count()
        );
        let widget = TableWidget::new(rows, widths)
            .header(header)
            .column_spacing(2)
            .block(panel(title, false, self.theme))
            .style(self.theme.normal_style());

        frame.render_widget(widget, area);
    }
}

fn cell_text(text: &str) -> String {
    if text.chars().count() <= MAX_CELL_WIDTH {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(MAX_CELL_WIDTH - 1).collect();
    cut.push('…');
    cut
}

/// Total Rows / Total Columns / Missing Values
pub struct OverviewPanel<'a> {
    overview: &'a Overview,
    theme: &'a Theme,
}

impl<'a> OverviewPanel<'a> {
    pub fn new(overview: &'a Overview, theme: &'a Theme) -> Self {
        OverviewPanel { overview, theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let cards = [
            ("Total Rows", self.overview.rows.to_string()),
            ("Total Columns", self.overview.columns.to_string()),
            ("Missing Values", self.overview.missing.to_string()),
        ];
        render_cards(frame, area, &cards, self.theme);
    }
}

/// Total Sum / Average / Max Value cards for the KPI metric
pub struct KpiCards<'a> {
    kpis: &'a Kpis,
    theme: &'a Theme,
}

impl<'a> KpiCards<'a> {
    pub fn new(kpis: &'a Kpis, theme: &'a Theme) -> Self {
        KpiCards { kpis, theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let cards = [
            ("Total Sum", format_amount(self.kpis.total)),
            ("Average", format_optional(self.kpis.average)),
            ("Max Value", format_optional(self.kpis.max)),
        ];
        render_cards(frame, area, &cards, self.theme);
    }
}

fn render_cards(frame: &mut Frame, area: Rect, cards: &[(&str, String)], theme: &Theme) {
    let n = cards.len() as u32;
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(cards.iter().map(|_| Constraint::Ratio(1, n)))
        .split(area);

    for ((label, value), chunk) in cards.iter().zip(chunks.iter()) {
        let card = Paragraph::new(Line::from(Span::styled(value.clone(), theme.kpi_style())))
            .block(panel(*label, false, theme));
        frame.render_widget(card, *chunk);
    }
}

/// Per-column kind, missing and distinct counts
pub struct ColumnList<'a> {
    profiles: &'a [ColumnProfile],
    theme: &'a Theme,
}

impl<'a> ColumnList<'a> {
    pub fn new(profiles: &'a [ColumnProfile], theme: &'a Theme) -> Self {
        ColumnList { profiles, theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let width = self
            .profiles
            .iter()
            .map(|p| p.name.chars().count())
            .max()
            .unwrap_or(0)
            .min(MAX_CELL_WIDTH);

        let items: Vec<ListItem> = self
            .profiles
            .iter()
            .map(|p| {
                let missing_style = if p.missing > 0 {
                    self.theme.warning_style()
                } else {
                    self.theme.dimmed_style()
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:<width$}  ", cell_text(&p.name)), self.theme.normal_style()),
                    Span::styled(format!("{:<6} ", p.kind.to_string()), self.theme.title_style()),
                    Span::styled(format!("missing {:>4}  ", p.missing), missing_style),
                    Span::styled(format!("distinct {:>4}", p.distinct), self.theme.dimmed_style()),
                ]))
            })
            .collect();

        let list = List::new(items).block(panel(format!("Columns ({})", self.profiles.len()), false, self.theme));
        frame.render_widget(list, area);
    }
}

/// What auto-cleaning did to the raw data
pub struct CleaningPanel<'a> {
    enabled: bool,
    report: Option<&'a CleaningReport>,
    theme: &'a Theme,
}

impl<'a> CleaningPanel<'a> {
    pub fn new(enabled: bool, report: Option<&'a CleaningReport>, theme: &'a Theme) -> Self {
        CleaningPanel {
            enabled,
            report,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let toggle = if self.enabled { "[x]" } else { "[ ]" };
        let mut lines = vec![Line::from(vec![
            Span::styled(format!("{toggle} "), self.theme.title_style()),
            Span::raw("Auto-clean (drop duplicates, fill missing)  "),
            Span::styled("[c] toggle  [w] save CSV", self.theme.dimmed_style()),
        ])];

        if let (true, Some(report)) = (self.enabled, self.report) {
            lines.push(Line::from(Span::styled(
                format!(
                    "Data Cleaned! {} duplicate rows removed, {} numeric and {} text cells filled, {} rows remain.",
                    report.duplicates_removed,
                    report.numeric_filled,
                    report.text_filled,
                    report.rows_after()
                ),
                self.theme.success_style(),
            )));
        }

        let paragraph = Paragraph::new(lines)
            .block(panel("Data Cleaning", false, self.theme))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

/// Bordered panel holding a single warning or hint
pub struct MessagePanel<'a> {
    title: &'a str,
    message: &'a str,
    style: Style,
}

impl<'a> MessagePanel<'a> {
    pub fn new(title: &'a str, message: &'a str, style: Style) -> Self {
        MessagePanel {
            title,
            message,
            style,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let paragraph = Paragraph::new(self.message)
            .style(self.style)
            .block(panel(self.title, false, theme))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

/// Single-line text input; masks its content when asked to
pub struct InputBox<'a> {
    prompt: &'a str,
    value: &'a str,
    masked: bool,
    active: bool,
    theme: &'a Theme,
}

impl<'a> InputBox<'a> {
    pub fn new(prompt: &'a str, value: &'a str, theme: &'a Theme) -> Self {
        InputBox {
            prompt,
            value,
            masked: false,
            active: true,
            theme,
        }
    }

    pub fn masked(mut self, masked: bool) -> Self {
        self.masked = masked;
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn display_text(&self) -> String {
        if self.masked {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.to_string()
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let text = self.display_text();
        let style = if self.active {
            self.theme.normal_style()
        } else {
            self.theme.dimmed_style()
        };
        let paragraph = Paragraph::new(text.clone())
            .style(style)
            .block(panel(self.prompt, self.active, self.theme));
        frame.render_widget(paragraph, area);

        if self.active && area.width > 2 && area.height > 2 {
            let offset = (text.chars().count() as u16).min(area.width - 3);
            frame.set_cursor_position((area.x + 1 + offset, area.y + 1));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Warning,
    Error,
}

/// Transient message shown in the status bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        StatusMessage {
            kind: StatusKind::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        StatusMessage {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        StatusMessage {
            kind: StatusKind::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        StatusMessage {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }
}

/// Status bar widget
pub struct StatusBar<'a> {
    file: Option<&'a str>,
    message: Option<&'a StatusMessage>,
    theme: &'a Theme,
}

impl<'a> StatusBar<'a> {
    pub fn new(file: Option<&'a str>, message: Option<&'a StatusMessage>, theme: &'a Theme) -> Self {
        StatusBar {
            file,
            message,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let line = match self.message {
            Some(m) => {
                let style = match m.kind {
                    StatusKind::Info => self.theme.normal_style(),
                    StatusKind::Success => self.theme.success_style(),
                    StatusKind::Warning => self.theme.warning_style(),
                    StatusKind::Error => self.theme.error_style(),
                };
                let text = match m.kind {
                    StatusKind::Error => format!("Error: {}", m.text),
                    _ => m.text.clone(),
                };
                Line::from(Span::styled(text, style))
            }
            None => {
                let name = self.file.unwrap_or("no file");
                Line::from(vec![
                    Span::styled(format!("auto-analyst: {name}"), self.theme.title_style()),
                    Span::styled(" | [o] Open [h] Help [q] Quit", self.theme.dimmed_style()),
                ])
            }
        };

        let paragraph = Paragraph::new(line).block(Block::default().borders(Borders::TOP));
        frame.render_widget(paragraph, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text_truncates_long_values() {
        assert_eq!(cell_text("short"), "short");
        let long = "x".repeat(40);
        let cut = cell_text(&long);
        assert_eq!(cut.chars().count(), MAX_CELL_WIDTH);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn test_input_box_masks_secret() {
        let theme = Theme::default();
        let input = InputBox::new("API key", "gsk_abc", &theme).masked(true);
        assert_eq!(input.display_text(), "*******");
        let input = InputBox::new("Question", "total?", &theme);
        assert_eq!(input.display_text(), "total?");
    }
}
