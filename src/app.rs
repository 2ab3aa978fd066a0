//! Main application logic and TUI event loop.

use std::io;
use std::mem;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use tracing::{error, info, warn};

use crate::analysis::chart::{category_split, distribution};
use crate::analysis::stats::{kpis, overview, profile, ColumnProfile, Kpis, Overview};
use crate::analysis::ChartData;
use crate::chat::{ChatModel, ChatSession, GroqClient, Role, NO_OUTPUT};
use crate::cli::AppConfig;
use crate::data::export::{save_csv, DEFAULT_EXPORT_NAME};
use crate::data::{auto_clean, CleaningReport, Dataset, Table};
use crate::report::{BuilderField, ReportBuilder};
use crate::ui::{
    centered_rect,
    chart::ChartView,
    selector::{SlotBar, SlotPicker},
    widgets::{
        CleaningPanel, ColumnList, DataPreview, InputBox, KpiCards, MessagePanel, NavMenu, OverviewPanel,
        StatusBar, StatusMessage,
    },
    HelpOverlay, Theme,
};

const NO_NUMERIC: &str = "No numeric columns found to generate dashboards.";
const NO_TEXT: &str = "No text columns found for categorical analysis.";

/// Top-level page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Dashboard,
    Custom,
    Chat,
}

impl Page {
    const ALL: [Page; 4] = [Page::Home, Page::Dashboard, Page::Custom, Page::Chat];

    fn title(self) -> &'static str {
        match self {
            Page::Home => "Home & Data Cleaning",
            Page::Dashboard => "Auto-Dashboard",
            Page::Custom => "Custom Analysis",
            Page::Chat => "Chat with Data",
        }
    }

    fn index(self) -> usize {
        Page::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Page::ALL[(self.index() + 1) % Page::ALL.len()]
    }

    fn prev(self) -> Self {
        Page::ALL[(self.index() + Page::ALL.len() - 1) % Page::ALL.len()]
    }
}

/// Where typed characters go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Normal,
    OpenFile,
    ApiKey,
    Chat,
}

/// Which dashboard picker the arrow keys drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DashboardFocus {
    #[default]
    Metric,
    Category,
}

/// Dashboard figures for the current picks, recomputed when they change
#[derive(Default)]
struct DashboardView {
    numeric: Vec<String>,
    text: Vec<String>,
    kpis: Option<Kpis>,
    distribution: Option<ChartData>,
    split: Option<ChartData>,
}

/// Overview of the raw data and profile of the active table
struct HomeView {
    overview: Overview,
    profiles: Vec<ColumnProfile>,
}

/// Cleaned when auto-cleaning is on, raw otherwise
fn select_table<'a>(
    dataset: Option<&'a Dataset>,
    cleaned: Option<&'a (Table, CleaningReport)>,
    clean_enabled: bool,
) -> Option<&'a Table> {
    match (clean_enabled, cleaned) {
        (true, Some((table, _))) => Some(table),
        _ => dataset.map(|d| &d.table),
    }
}

fn logged<T>(result: crate::error::Result<T>, what: &str) -> Option<T> {
    result.map_err(|e| warn!(error = %e, "{what} unavailable")).ok()
}

/// Application state
pub struct App {
    // Configuration
    config: AppConfig,
    theme: Theme,

    // Data
    dataset: Option<Dataset>,
    cleaned: Option<(Table, CleaningReport)>,
    clean_enabled: bool,
    home: Option<HomeView>,

    // Dashboard
    metric_picker: SlotPicker,
    category_picker: SlotPicker,
    dashboard_focus: DashboardFocus,
    dashboard: DashboardView,

    // Custom analysis and chat
    builder: ReportBuilder,
    session: ChatSession,
    model: Option<Arc<dyn ChatModel>>,
    queued_question: Option<String>,

    // UI state
    page: Page,
    input_mode: InputMode,
    input: String,
    show_help: bool,
    show_plan: bool,

    // Exit flag
    should_quit: bool,

    // Message to display (non-fatal)
    status: Option<StatusMessage>,
}

impl App {
    /// Create a new App instance, loading the configured file if any
    pub fn new(config: AppConfig) -> Self {
        let model = config.llm.api_key.clone().map(|key| Self::build_model(&config, key));

        let mut app = App {
            clean_enabled: config.clean_on_load,
            config,
            theme: Theme::default(),
            dataset: None,
            cleaned: None,
            home: None,
            metric_picker: SlotPicker::new(),
            category_picker: SlotPicker::new(),
            dashboard_focus: DashboardFocus::default(),
            dashboard: DashboardView::default(),
            builder: ReportBuilder::new(),
            session: ChatSession::new(),
            model,
            queued_question: None,
            page: Page::Home,
            input_mode: InputMode::Normal,
            input: String::new(),
            show_help: false,
            show_plan: false,
            should_quit: false,
            status: None,
        };

        if let Some(path) = app.config.file.clone() {
            if let Err(e) = app.open_file(path) {
                app.set_error(format!("{e:#}"));
            }
        }
        app
    }

    fn build_model(config: &AppConfig, api_key: String) -> Arc<dyn ChatModel> {
        Arc::new(
            GroqClient::new(api_key)
                .with_api_base(config.llm.api_base.clone())
                .with_model(config.llm.model.clone())
                .with_temperature(config.llm.temperature),
        )
    }

    fn active_table(&self) -> Option<&Table> {
        select_table(self.dataset.as_ref(), self.cleaned.as_ref(), self.clean_enabled)
    }

    /// Load a file, replacing the current dataset
    fn open_file(&mut self, path: PathBuf) -> Result<()> {
        let dataset = Dataset::open(&path).with_context(|| format!("Failed to load {path:?}"))?;
        let (cleaned, report) = auto_clean(&dataset.table);

        self.status = Some(StatusMessage::success(format!(
            "Loaded {}: {} rows, {} columns",
            dataset.name(),
            dataset.table.row_count(),
            dataset.table.column_count()
        )));
        self.cleaned = Some((cleaned, report));
        self.dataset = Some(dataset);
        self.on_table_changed();
        Ok(())
    }

    /// Re-read the current file from disk
    fn reload(&mut self) -> Result<()> {
        match self.dataset.as_ref().map(|d| d.path.clone()) {
            Some(path) => self.open_file(path),
            None => {
                self.status = Some(StatusMessage::warning("No file loaded. Press o to open one."));
                Ok(())
            }
        }
    }

    fn toggle_cleaning(&mut self) {
        self.clean_enabled = !self.clean_enabled;
        info!(enabled = self.clean_enabled, "auto-cleaning toggled");
        self.status = Some(StatusMessage::info(if self.clean_enabled {
            "Auto-cleaning on"
        } else {
            "Auto-cleaning off"
        }));
        self.on_table_changed();
    }

    /// Write the cleaned table to the output directory
    fn save_cleaned(&mut self) -> Result<()> {
        let Some((table, _)) = &self.cleaned else {
            self.status = Some(StatusMessage::warning("No file loaded. Press o to open one."));
            return Ok(());
        };
        let dir = &self.config.output_dir;
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {dir:?}"))?;
        let path = dir.join(DEFAULT_EXPORT_NAME);
        save_csv(table, &path).with_context(|| format!("Failed to write {path:?}"))?;

        info!(path = %path.display(), rows = table.row_count(), "cleaned data saved");
        self.status = Some(StatusMessage::success(format!("Saved cleaned data to {}", path.display())));
        Ok(())
    }

    /// Bring every view back in line with the active table
    fn on_table_changed(&mut self) {
        let Some(table) = select_table(self.dataset.as_ref(), self.cleaned.as_ref(), self.clean_enabled) else {
            self.home = None;
            self.dashboard = DashboardView::default();
            return;
        };

        self.home = self.dataset.as_ref().map(|d| HomeView {
            overview: overview(&d.table),
            profiles: profile(table),
        });
        self.metric_picker.clamp(table.numeric_columns().len());
        self.category_picker.clamp(table.text_columns().len());
        self.builder.clamp(table);
        self.refresh_dashboard();
    }

    fn refresh_dashboard(&mut self) {
        let mut view = DashboardView::default();
        if let Some(table) = self.active_table() {
            view.numeric = table.numeric_columns();
            view.text = table.text_columns();

            let metric = self.metric_picker.picked(view.numeric.len()).map(|i| view.numeric[i].as_str());
            let category = self.category_picker.picked(view.text.len()).map(|i| view.text[i].as_str());

            if let Some(metric) = metric {
                view.kpis = logged(kpis(table, metric), "kpis");
                view.distribution = logged(distribution(table, metric), "distribution");
                if let Some(category) = category {
                    view.split = logged(category_split(table, category, metric), "categorical split");
                }
            }
        }
        self.dashboard = view;
    }

    /// Send a chat question, asking for an API key first when none is set
    fn submit_question(&mut self, question: String) {
        let question = question.trim().to_string();
        if question.is_empty() {
            return;
        }
        if self.session.is_pending() {
            self.status = Some(StatusMessage::warning("Still waiting for the previous answer"));
            return;
        }
        let Some(model) = self.model.clone() else {
            self.queued_question = Some(question);
            self.input_mode = InputMode::ApiKey;
            self.input.clear();
            self.status = Some(StatusMessage::info("Enter your Groq API key to ask questions"));
            return;
        };
        let Some(table) = select_table(self.dataset.as_ref(), self.cleaned.as_ref(), self.clean_enabled) else {
            self.status = Some(StatusMessage::warning("Load a file before asking questions"));
            return;
        };
        self.session.submit(model, table, &question);
        self.status = None;
    }

    fn set_api_key(&mut self, key: String) {
        let key = key.trim().to_string();
        if key.is_empty() {
            self.queued_question = None;
            self.status = Some(StatusMessage::warning("No API key entered"));
            return;
        }
        self.model = Some(Self::build_model(&self.config, key));
        info!(model = %self.config.llm.model, "API key set");
        if let Some(question) = self.queued_question.take() {
            self.input_mode = InputMode::Chat;
            self.submit_question(question);
        }
    }

    /// Pick up a finished chat reply
    fn poll_chat(&mut self) {
        let Some(table) = select_table(self.dataset.as_ref(), self.cleaned.as_ref(), self.clean_enabled) else {
            return;
        };
        match self.session.poll(table) {
            Some(Ok(answer)) if answer.is_empty() => {
                self.status = Some(StatusMessage::warning(NO_OUTPUT));
            }
            Some(Ok(_)) => self.status = None,
            Some(Err(e)) => {
                error!(error = %e, "chat request failed");
                self.set_error(format!("Query Error: {e}"));
            }
            None => {}
        }
    }

    /// Set an error message to display (non-fatal)
    pub fn set_error(&mut self, message: String) {
        self.status = Some(StatusMessage::error(message));
    }

    /// Handle keyboard input
    fn handle_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> Result<()> {
        if modifiers.contains(KeyModifiers::CONTROL) && key == KeyCode::Char('c') {
            self.should_quit = true;
            return Ok(());
        }

        if self.input_mode != InputMode::Normal {
            self.handle_text_input(key);
            return Ok(());
        }

        // Global shortcuts
        match key {
            KeyCode::Char('q') => {
                self.should_quit = true;
                return Ok(());
            }
            KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::F(1) => {
                self.show_help = !self.show_help;
                return Ok(());
            }
            KeyCode::Esc if self.show_help => {
                self.show_help = false;
                return Ok(());
            }
            _ => {}
        }

        // If help is shown, don't process other keys
        if self.show_help {
            return Ok(());
        }

        match key {
            KeyCode::Tab => self.page = self.page.next(),
            KeyCode::BackTab => self.page = self.page.prev(),
            KeyCode::Char(c @ '1'..='4') => {
                let idx = c.to_digit(10).unwrap_or(1) as usize - 1;
                self.page = Page::ALL[idx];
            }
            KeyCode::Char('o') => {
                self.input = self
                    .dataset
                    .as_ref()
                    .map(|d| d.path.display().to_string())
                    .unwrap_or_default();
                self.input_mode = InputMode::OpenFile;
            }
            KeyCode::Char('r') => self.reload()?,
            KeyCode::Char('c') => self.toggle_cleaning(),
            KeyCode::Char('w') => self.save_cleaned()?,
            _ => match self.page {
                Page::Home => {}
                Page::Dashboard => self.handle_dashboard_keys(key),
                Page::Custom => self.handle_custom_keys(key),
                Page::Chat => self.handle_chat_keys(key),
            },
        }

        Ok(())
    }

    fn handle_dashboard_keys(&mut self, key: KeyCode) {
        let (picker, len) = match self.dashboard_focus {
            DashboardFocus::Metric => (&mut self.metric_picker, self.dashboard.numeric.len()),
            DashboardFocus::Category => (&mut self.category_picker, self.dashboard.text.len()),
        };
        match key {
            KeyCode::Up | KeyCode::Down | KeyCode::Char('k') | KeyCode::Char('j') => {
                self.dashboard_focus = match self.dashboard_focus {
                    DashboardFocus::Metric => DashboardFocus::Category,
                    DashboardFocus::Category => DashboardFocus::Metric,
                };
                return;
            }
            KeyCode::Right | KeyCode::Char('l') => picker.step(len, true),
            KeyCode::Left => picker.step(len, false),
            KeyCode::Char(']') => picker.rotate(len, true),
            KeyCode::Char('[') => picker.rotate(len, false),
            _ => return,
        }
        self.refresh_dashboard();
    }

    fn handle_custom_keys(&mut self, key: KeyCode) {
        let Some(table) = select_table(self.dataset.as_ref(), self.cleaned.as_ref(), self.clean_enabled) else {
            return;
        };
        match key {
            KeyCode::Down | KeyCode::Char('j') => self.builder.focus = self.builder.focus.next(),
            KeyCode::Up | KeyCode::Char('k') => self.builder.focus = self.builder.focus.prev(),
            KeyCode::Right | KeyCode::Char('l') => self.builder.cycle(table, true),
            KeyCode::Left => self.builder.cycle(table, false),
            KeyCode::Enter => match self.builder.generate(table) {
                Ok(report) => {
                    info!(chart = report.chart.title(), "report generated");
                    self.status = None;
                }
                Err(e) => {
                    warn!(error = %e, "report generation failed");
                    self.status = Some(StatusMessage::error(e.to_string()));
                }
            },
            _ => {}
        }
    }

    fn handle_chat_keys(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('i') | KeyCode::Enter => {
                self.input.clear();
                self.input_mode = InputMode::Chat;
            }
            KeyCode::Char('p') => self.show_plan = !self.show_plan,
            KeyCode::Char('x') => {
                self.session.clear();
                self.status = Some(StatusMessage::info("Conversation cleared"));
            }
            _ => {}
        }
    }

    fn handle_text_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                if self.input_mode == InputMode::ApiKey {
                    self.queued_question = None;
                }
                self.input.clear();
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Enter => {
                let text = mem::take(&mut self.input);
                let mode = mem::replace(&mut self.input_mode, InputMode::Normal);
                match mode {
                    InputMode::OpenFile if !text.trim().is_empty() => {
                        if let Err(e) = self.open_file(PathBuf::from(text.trim())) {
                            error!(error = %e, "open failed");
                            self.set_error(format!("{e:#}"));
                        }
                    }
                    InputMode::ApiKey => self.set_api_key(text),
                    InputMode::Chat => {
                        // keep typing follow-up questions
                        self.input_mode = InputMode::Chat;
                        self.submit_question(text);
                    }
                    _ => {}
                }
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
    }

    /// Render the UI
    fn render(&self, frame: &mut Frame) {
        let size = frame.area();

        // Main layout: navigation, body, status bar
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Navigation
                Constraint::Min(5),    // Body
                Constraint::Length(2), // Status bar
            ])
            .split(size);

        let titles: Vec<&str> = Page::ALL.iter().map(|p| p.title()).collect();
        NavMenu::new(&titles, self.page.index(), &self.theme).render(frame, main_chunks[0]);

        match self.active_table() {
            None => self.render_landing(frame, main_chunks[1]),
            Some(table) => match self.page {
                Page::Home => self.render_home(frame, main_chunks[1], table),
                Page::Dashboard => self.render_dashboard(frame, main_chunks[1]),
                Page::Custom => self.render_custom(frame, main_chunks[1], table),
                Page::Chat => self.render_chat(frame, main_chunks[1]),
            },
        }

        let file_name = self.dataset.as_ref().map(|d| d.name());
        StatusBar::new(file_name.as_deref(), self.status.as_ref(), &self.theme).render(frame, main_chunks[2]);

        match self.input_mode {
            InputMode::OpenFile => self.render_prompt(frame, size, "Open file (CSV or XLSX), Enter to load", false),
            InputMode::ApiKey => self.render_prompt(frame, size, "Groq API key, Enter to confirm", true),
            _ => {}
        }

        // Render help overlay if active
        if self.show_help {
            HelpOverlay::new(&self.theme).render(frame, size);
        }
    }

    fn render_landing(&self, frame: &mut Frame, area: Rect) {
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled("Excel Auto-Analyst", self.theme.title_style())),
            Line::from(""),
            Line::from("Load a spreadsheet to get a cleaned preview, a KPI dashboard,"),
            Line::from("custom charts with insights, and answers to plain-language questions."),
            Line::from(""),
            Line::from(Span::styled("Press o to open a CSV or XLSX file.", self.theme.kpi_style())),
        ];
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).border_style(self.theme.border_style()));
        frame.render_widget(paragraph, area);
    }

    fn render_home(&self, frame: &mut Frame, area: Rect, table: &Table) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Overview cards
                Constraint::Length(4), // Cleaning toggle and report
                Constraint::Min(6),    // Columns and previews
            ])
            .split(area);

        if let Some(home) = &self.home {
            OverviewPanel::new(&home.overview, &self.theme).render(frame, chunks[0]);
        }

        let report = self.cleaned.as_ref().map(|(_, r)| r);
        CleaningPanel::new(self.clean_enabled, report, &self.theme).render(frame, chunks[1]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(chunks[2]);

        if let Some(home) = &self.home {
            ColumnList::new(&home.profiles, &self.theme).render(frame, body[0]);
        }

        let rows = self.config.preview_rows;
        match (&self.dataset, self.clean_enabled) {
            (Some(dataset), true) => {
                let previews = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                    .split(body[1]);
                DataPreview::new(&dataset.table, rows, "Raw Data Preview", &self.theme).render(frame, previews[0]);
                DataPreview::new(table, rows, "Cleaned Data Preview", &self.theme).render(frame, previews[1]);
            }
            _ => DataPreview::new(table, rows, "Raw Data Preview", &self.theme).render(frame, body[1]),
        }
    }

    fn render_dashboard(&self, frame: &mut Frame, area: Rect) {
        let view = &self.dashboard;
        if view.numeric.is_empty() {
            MessagePanel::new("Auto-Dashboard", NO_NUMERIC, self.theme.warning_style()).render(frame, area, &self.theme);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Metric picker
                Constraint::Length(3), // KPI cards
                Constraint::Min(6),    // Charts
            ])
            .split(area);

        SlotBar::new("KPI metric", &view.numeric, &self.metric_picker, &self.theme).render(
            frame,
            chunks[0],
            self.dashboard_focus == DashboardFocus::Metric,
        );
        if let Some(kpis) = &view.kpis {
            KpiCards::new(kpis, &self.theme).render(frame, chunks[1]);
        }

        let charts = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[2]);

        ChartView::new(view.distribution.as_ref(), &self.theme).render(frame, charts[0]);

        if view.text.is_empty() {
            MessagePanel::new("Categorical Split", NO_TEXT, self.theme.warning_style()).render(
                frame,
                charts[1],
                &self.theme,
            );
            return;
        }

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(4)])
            .split(charts[1]);
        SlotBar::new("Category", &view.text, &self.category_picker, &self.theme).render(
            frame,
            right[0],
            self.dashboard_focus == DashboardFocus::Category,
        );
        ChartView::new(view.split.as_ref(), &self.theme).render(frame, right[1]);
    }

    fn render_custom(&self, frame: &mut Frame, area: Rect, table: &Table) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5), // Controls
                Constraint::Min(6),    // Chart
                Constraint::Length(6), // Insights
            ])
            .split(area);

        let x = self.builder.x_column(table).unwrap_or("n/a").to_string();
        let y = self.builder.y_column(table).unwrap_or_else(|| "n/a".to_string());
        let controls = [
            (BuilderField::XAxis, "X axis (any column)", x),
            (BuilderField::YAxis, "Y axis (numeric)", y),
            (BuilderField::ChartType, "Chart type", self.builder.chart_kind().to_string()),
        ];
        let lines: Vec<Line> = controls
            .into_iter()
            .map(|(field, label, value)| {
                let (value, style) = if field == self.builder.focus {
                    (format!("< {value} >"), self.theme.highlight_style())
                } else {
                    (format!("  {value}  "), self.theme.normal_style())
                };
                Line::from(vec![
                    Span::styled(format!("{label:<22}"), self.theme.dimmed_style()),
                    Span::styled(value, style),
                ])
            })
            .collect();
        let controls = Paragraph::new(lines).block(
            Block::default()
                .title(" Build Your Own Report  [Enter] Generate ")
                .borders(Borders::ALL)
                .border_style(self.theme.border_style())
                .title_style(self.theme.title_style()),
        );
        frame.render_widget(controls, chunks[0]);

        let report = self.builder.report();
        ChartView::new(report.map(|r| &r.chart), &self.theme).render(frame, chunks[1]);

        let bullets: Vec<Line> = match report {
            Some(r) => r
                .insight
                .bullets()
                .into_iter()
                .map(|b| Line::from(format!("• {b}")))
                .collect(),
            None => vec![Line::from(Span::styled(
                "Press Enter to generate the report.",
                self.theme.dimmed_style(),
            ))],
        };
        let insights = Paragraph::new(bullets)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title(" AI Insights ")
                    .borders(Borders::ALL)
                    .border_style(self.theme.border_style())
                    .title_style(self.theme.title_style()),
            );
        frame.render_widget(insights, chunks[2]);
    }

    fn render_chat(&self, frame: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);

        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(4), Constraint::Length(3)])
            .split(columns[0]);

        let mut lines: Vec<Line> = Vec::new();
        for message in self.session.history() {
            let (who, style) = match message.role {
                Role::User => ("You", self.theme.title_style()),
                Role::Assistant => ("Analyst", self.theme.kpi_style()),
                Role::System => continue,
            };
            lines.push(Line::from(Span::styled(format!("{who}:"), style)));
            lines.extend(message.content.lines().map(|l| Line::from(format!("  {l}"))));
            lines.push(Line::from(""));
        }
        if self.session.is_pending() {
            lines.push(Line::from(Span::styled("Thinking...", self.theme.dimmed_style())));
        }
        if lines.is_empty() {
            lines.push(Line::from(Span::styled(
                "Ask a question about your data, e.g. \"total sales by region\".",
                self.theme.dimmed_style(),
            )));
        }

        // Scroll so the newest line sits at the bottom, counting rows as the paragraph wraps them
        let inner_width = left[0].width.saturating_sub(2).max(1);
        let inner_height = left[0].height.saturating_sub(2) as usize;
        let history = Paragraph::new(lines).wrap(Wrap { trim: false });
        let scroll = history.line_count(inner_width).saturating_sub(inner_height);

        let history = history
            .scroll((scroll.min(u16::MAX as usize) as u16, 0))
            .block(
                Block::default()
                    .title(format!(
                        " Chat with Data ({}, {} answers) ",
                        self.config.llm.model,
                        self.session.assistant_turns()
                    ))
                    .borders(Borders::ALL)
                    .border_style(self.theme.border_style())
                    .title_style(self.theme.title_style()),
            );
        frame.render_widget(history, left[0]);

        let typing = self.input_mode == InputMode::Chat;
        let prompt = if typing {
            "Question (Enter to send, Esc to stop)"
        } else {
            "Press i to ask a question"
        };
        InputBox::new(prompt, &self.input, &self.theme)
            .active(typing)
            .render(frame, left[1]);

        if self.show_plan {
            let right = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(columns[1]);
            ChartView::new(self.session.last_chart(), &self.theme).render(frame, right[0]);

            let plan = Paragraph::new(self.session.last_plan().unwrap_or("No plan yet"))
                .wrap(Wrap { trim: false })
                .block(
                    Block::default()
                        .title(" Query Plan ")
                        .borders(Borders::ALL)
                        .border_style(self.theme.border_style())
                        .title_style(self.theme.title_style()),
                );
            frame.render_widget(plan, right[1]);
        } else {
            ChartView::new(self.session.last_chart(), &self.theme).render(frame, columns[1]);
        }
    }

    fn render_prompt(&self, frame: &mut Frame, area: Rect, title: &str, masked: bool) {
        let popup = prompt_rect(area);
        frame.render_widget(Clear, popup);
        InputBox::new(title, &self.input, &self.theme)
            .masked(masked)
            .render(frame, popup);
    }
}

/// Three-row popup, centered and 60% wide
fn prompt_rect(area: Rect) -> Rect {
    let column = centered_rect(60, 100, area);
    let height = 3.min(area.height);
    Rect::new(column.x, area.y + area.height.saturating_sub(height) / 2, column.width, height)
}

/// Restore terminal to normal state
fn restore_terminal() {
    // Best effort cleanup - ignore errors since we may be in a panic
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
}

/// Run the TUI application
pub fn run(config: AppConfig) -> Result<()> {
    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
        restore_terminal();
        return Err(e).context("Failed to setup terminal");
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(t) => t,
        Err(e) => {
            restore_terminal();
            return Err(e).context("Failed to create terminal");
        }
    };

    let mut app = App::new(config);

    let result = run_main_loop(&mut terminal, &mut app);

    // Always restore terminal, regardless of result
    restore_terminal();
    terminal.show_cursor().ok();

    result
}

/// Main application loop
fn run_main_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;

        app.poll_chat();

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Err(e) = app.handle_input(key.code, key.modifiers) {
                        error!(error = %e, "input handling failed");
                        app.set_error(format!("{e:#}"));
                    }
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
