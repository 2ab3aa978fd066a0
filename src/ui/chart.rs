//! Chart widget for every `ChartData` shape.

use ratatui::{
    layout::{Alignment, Direction, Rect},
    style::{Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use super::theme::Theme;
use crate::analysis::chart::{ChartKind, Slice, XScale};
use crate::analysis::format::format_axis;
use crate::analysis::{aggregate::Bin, format_amount, ChartData};

/// Bar lengths are scaled into this many units
const BAR_RESOLUTION: u64 = 1000;

pub struct ChartView<'a> {
    data: Option<&'a ChartData>,
    theme: &'a Theme,
}

impl<'a> ChartView<'a> {
    pub fn new(data: Option<&'a ChartData>, theme: &'a Theme) -> Self {
        ChartView { data, theme }
    }

    fn block(&self, title: &str) -> Block<'static> {
        Block::default()
            .title(format!(" {title} "))
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title_style(self.theme.title_style())
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let Some(data) = self.data else {
            self.render_empty(frame, area, "Chart");
            return;
        };

        match data {
            ChartData::Bars { title, bars } if !bars.is_empty() => {
                let labelled: Vec<(String, f64, String)> = bars
                    .iter()
                    .map(|(label, v)| (label.clone(), *v, format_amount(*v)))
                    .collect();
                self.render_bars(frame, area, title, &labelled);
            }
            ChartData::Split { title, slices } if !slices.is_empty() => {
                self.render_bars(frame, area, title, &split_bars(slices));
            }
            ChartData::Histogram { title, bins } if !bins.is_empty() => {
                self.render_histogram(frame, area, title, bins);
            }
            ChartData::Series {
                title,
                kind,
                x_label,
                y_label,
                x_scale,
                points,
            } if !points.is_empty() => {
                self.render_series(frame, area, title, *kind, (x_label.as_str(), y_label.as_str()), x_scale, points);
            }
            other => self.render_empty(frame, area, other.title()),
        }
    }

    /// Horizontal bars, one per label, with the formatted value at the end
    fn render_bars(&self, frame: &mut Frame, area: Rect, title: &str, bars: &[(String, f64, String)]) {
        let peak = bars.iter().map(|(_, v, _)| *v).fold(0.0_f64, f64::max);
        let label_width = bars.iter().map(|(l, _, _)| l.chars().count()).max().unwrap_or(0);

        let bars: Vec<Bar> = bars
            .iter()
            .enumerate()
            .map(|(i, (label, value, text))| {
                Bar::default()
                    .label(Line::from(format!("{label:>label_width$}")))
                    .value(scale(*value, peak))
                    .text_value(text.clone())
                    .style(Style::default().fg(self.theme.chart_color(i)))
                    .value_style(self.theme.normal_style().add_modifier(Modifier::BOLD))
            })
            .collect();

        let chart = BarChart::default()
            .block(self.block(title))
            .direction(Direction::Horizontal)
            .bar_width(1)
            .bar_gap(0)
            .max(BAR_RESOLUTION)
            .label_style(self.theme.normal_style())
            .data(BarGroup::default().bars(&bars));

        frame.render_widget(chart, area);
    }

    fn render_histogram(&self, frame: &mut Frame, area: Rect, title: &str, bins: &[Bin]) {
        let inner_width = area.width.saturating_sub(2) as usize;
        let bar_width = (inner_width / bins.len().max(1)).saturating_sub(1).clamp(1, 12) as u16;

        let bars: Vec<Bar> = bins
            .iter()
            .map(|b| {
                Bar::default()
                    .value(b.count as u64)
                    .label(Line::from(format_axis(b.lower)))
                    .style(Style::default().fg(self.theme.chart_color(0)))
            })
            .collect();

        let chart = BarChart::default()
            .block(self.block(title))
            .bar_width(bar_width)
            .bar_gap(1)
            .label_style(self.theme.dimmed_style())
            .value_style(self.theme.normal_style().add_modifier(Modifier::BOLD))
            .data(BarGroup::default().bars(&bars));

        frame.render_widget(chart, area);
    }

    #[allow(clippy::too_many_arguments)]
    fn render_series(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        kind: ChartKind,
        (x_label, y_label): (&str, &str),
        x_scale: &XScale,
        points: &[(f64, f64)],
    ) {
        let (mut x_min, mut x_max) = bounds(points.iter().map(|p| p.0));
        let (mut y_min, mut y_max) = bounds(points.iter().map(|p| p.1));

        if x_min >= x_max {
            x_min -= 0.5;
            x_max += 0.5;
        }
        if y_min >= y_max {
            y_max = y_min + 1.0;
        }
        let y_range = y_max - y_min;
        y_min -= y_range * 0.05;
        y_max += y_range * 0.05;

        let graph_type = match kind {
            ChartKind::Scatter => GraphType::Scatter,
            _ => GraphType::Line,
        };
        let marker = match kind {
            ChartKind::Scatter => Marker::Dot,
            _ => Marker::Braille,
        };

        let dataset = Dataset::default()
            .name(y_label.to_string())
            .marker(marker)
            .graph_type(graph_type)
            .style(Style::default().fg(self.theme.chart_color(0)))
            .data(points);

        let x_labels = vec![
            Span::raw(x_scale.label(x_min)),
            Span::raw(x_scale.label((x_min + x_max) / 2.0)),
            Span::raw(x_scale.label(x_max)),
        ];
        let y_labels = vec![
            Span::raw(format_axis(y_min)),
            Span::raw(format_axis((y_min + y_max) / 2.0)),
            Span::raw(format_axis(y_max)),
        ];

        let chart = Chart::new(vec![dataset])
            .block(self.block(title))
            .x_axis(
                Axis::default()
                    .title(Span::styled(x_label.to_string(), Style::default().add_modifier(Modifier::DIM)))
                    .style(self.theme.normal_style())
                    .bounds([x_min, x_max])
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .style(self.theme.normal_style())
                    .bounds([y_min, y_max])
                    .labels(y_labels),
            );

        frame.render_widget(chart, area);
    }

    fn render_empty(&self, frame: &mut Frame, area: Rect, title: &str) {
        let block = self.block(title);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let message = Paragraph::new("No data available")
            .style(Style::default().add_modifier(Modifier::DIM))
            .alignment(Alignment::Center);

        frame.render_widget(message, inner);
    }
}

fn split_bars(slices: &[Slice]) -> Vec<(String, f64, String)> {
    slices
        .iter()
        .map(|s| {
            (
                s.label.clone(),
                s.value,
                format!("{} ({:.1}%)", format_amount(s.value), s.share * 100.0),
            )
        })
        .collect()
}

/// Bar length for `value` relative to the largest bar; negatives draw empty
fn scale(value: f64, peak: f64) -> u64 {
    if peak <= 0.0 || !value.is_finite() || value <= 0.0 {
        return 0;
    }
    ((value / peak) * BAR_RESOLUTION as f64).round() as u64
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_scale() {
        assert_eq!(scale(50.0, 100.0), 500);
        assert_eq!(scale(100.0, 100.0), BAR_RESOLUTION);
        assert_eq!(scale(-5.0, 100.0), 0);
        assert_eq!(scale(5.0, 0.0), 0);
    }

    #[test]
    fn test_bounds() {
        assert_eq!(bounds([3.0, -1.0, 7.5].into_iter()), (-1.0, 7.5));
    }

    #[test]
    fn test_split_bar_text() {
        let slices = vec![Slice {
            label: "North".into(),
            value: 1500.0,
            share: 0.75,
        }];
        assert_eq!(split_bars(&slices)[0].2, "1,500.00 (75.0%)");
    }

    fn draw(data: Option<&ChartData>) -> String {
        let theme = Theme::default();
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        terminal
            .draw(|f| ChartView::new(data, &theme).render(f, f.area()))
            .unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_chart_border_uses_plain_panel_style() {
        let theme = Theme::default();
        let mut terminal = Terminal::new(TestBackend::new(30, 6)).unwrap();
        terminal
            .draw(|f| ChartView::new(None, &theme).render(f, f.area()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        assert_eq!(buffer[(0, 0)].fg, theme.border);
        assert_eq!(buffer[(29, 5)].fg, theme.border);
    }

    #[test]
    fn test_empty_chart_shows_placeholder() {
        assert!(draw(None).contains("No data available"));
        let empty = ChartData::Bars {
            title: "Sales by Region".into(),
            bars: vec![],
        };
        let screen = draw(Some(&empty));
        assert!(screen.contains("Sales by Region"));
        assert!(screen.contains("No data available"));
    }

    #[test]
    fn test_bars_render_labels_and_values() {
        let data = ChartData::Bars {
            title: "sales by region".into(),
            bars: vec![("North".into(), 10.0), ("South".into(), 20.0)],
        };
        let screen = draw(Some(&data));
        assert!(screen.contains("North"));
        assert!(screen.contains("20.00"));
    }
}
