use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Clear, Paragraph, Wrap};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

pub mod cache;
pub mod chart_data;
pub mod chart_export;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod insights;
pub mod logging;
pub mod metrics;
pub mod report;
pub mod schema;
pub mod source;
pub mod views;
pub mod widgets;

pub use cache::CacheManager;
pub use cli::{Args, CompressionFormat};
pub use config::{AppConfig, ColorParser, ConfigManager, Theme};
pub use dashboard::Dashboard;
pub use error::SalesError;
pub use metrics::{add_profit_margin, group_by, AggFn, AggregationSpec, GroupKey};
pub use views::{group_by_geography, Dimension, HeatValue, Metric};

use chart_data::BarSeries;
use chart_export::{export_bars, ChartExportFormat};
use widgets::bars::BarsWidget;
use widgets::controls::Controls;
use widgets::debug::DebugState;
use widgets::heatmap::HeatmapWidget;
use widgets::radio_block::RadioBlock;
use widgets::tables::SummaryTable;
use widgets::{centered_rect, panel, render_placeholder};

/// Application name used for cache directory and other app-specific paths
pub const APP_NAME: &str = "salesdash";

/// Dashboard page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Overview,
    Financial,
    Insights,
}

impl Page {
    pub const ALL: [Self; 3] = [Self::Overview, Self::Financial, Self::Insights];

    pub fn name(self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::Financial => "financial",
            Self::Insights => "insights",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Financial => "Financial",
            Self::Insights => "Insights",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name.trim()))
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OpenOptions {
    pub delimiter: Option<u8>,
    pub has_header: Option<bool>,
    pub skip_rows: Option<usize>,
    pub compression: Option<CompressionFormat>,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
        self.skip_rows = Some(skip_rows);
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_has_header(mut self, has_header: bool) -> Self {
        self.has_header = Some(has_header);
        self
    }

    pub fn with_compression(mut self, compression: CompressionFormat) -> Self {
        self.compression = Some(compression);
        self
    }

    /// Create OpenOptions from CLI args and config, with CLI args taking precedence
    pub fn from_args_and_config(args: &Args, config: &AppConfig) -> Self {
        let loading = &config.file_loading;
        Self {
            delimiter: args.delimiter.or(loading.delimiter),
            // CLI no_header flag overrides config
            has_header: match args.no_header {
                Some(no_header) => Some(!no_header),
                None => loading.has_header,
            },
            skip_rows: args.skip_rows.or(loading.skip_rows),
            compression: args.compression.or_else(|| {
                loading
                    .compression
                    .as_deref()
                    .and_then(CompressionFormat::from_name)
            }),
        }
    }
}

impl From<&Args> for OpenOptions {
    fn from(args: &Args) -> Self {
        Self::from_args_and_config(args, &AppConfig::default())
    }
}

pub enum AppEvent {
    Key(KeyEvent),
    Open(PathBuf, OpenOptions),
    Export(ChartExportFormat),
    Resize(u16, u16),
    Exit,
    Crash(String),
}

const OVERVIEW_KEYS: [(&str, &str); 6] = [
    ("1-3", "Page"),
    ("←→", "Metric"),
    ("e", "PNG"),
    ("E", "EPS"),
    ("?", "Help"),
    ("q", "Quit"),
];
const FINANCIAL_KEYS: [(&str, &str); 4] = [
    ("1-3", "Page"),
    ("t", "Heat value"),
    ("?", "Help"),
    ("q", "Quit"),
];
const INSIGHTS_KEYS: [(&str, &str); 3] = [("1-3", "Page"), ("?", "Help"), ("q", "Quit")];

const HELP_TEXT: &str = "\
1 / 2 / 3       Overview, Financial and Insights pages
Tab, Shift-Tab  Next / previous page
Left, h         Previous metric
Right, l        Next metric
t               Toggle heatmap value (quantity / profit)
e               Export the state chart as PNG
E               Export the state chart as EPS
?               Toggle this help
q, Esc          Quit";

pub struct App {
    pub dashboard: Option<Dashboard>,
    path: Option<PathBuf>,
    columns: config::ColumnsConfig,
    page: Page,
    metric: Metric,
    heat_value: HeatValue,
    show_help: bool,
    status: Option<String>,
    export_dir: PathBuf,
    debug: DebugState,
    theme: Theme,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> App {
        Self::new_with_config(&AppConfig::default())
    }

    pub fn new_with_config(config: &AppConfig) -> App {
        let theme = Theme::from_config(&config.theme).unwrap_or_default();
        App {
            dashboard: None,
            path: None,
            columns: config.columns.clone(),
            page: Page::from_name(&config.display.start_page).unwrap_or(Page::Overview),
            metric: Metric::from_name(&config.display.default_metric)
                .unwrap_or(Metric::Transactions),
            heat_value: HeatValue::from_name(&config.display.heat_value)
                .unwrap_or(HeatValue::Profit),
            show_help: false,
            status: None,
            export_dir: PathBuf::from("."),
            debug: DebugState::default(),
            theme,
        }
    }

    pub fn enable_debug(&mut self) {
        self.debug.enabled = true;
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    pub fn set_page(&mut self, page: Page) {
        self.page = page;
    }

    pub fn set_metric(&mut self, metric: Metric) {
        self.metric = metric;
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn heat_value(&self) -> HeatValue {
        self.heat_value
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    /// Last export result or request error shown in the status line.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn load(&mut self, path: &Path, options: &OpenOptions) -> error::Result<()> {
        let started = Instant::now();
        let dashboard = Dashboard::load(path, options, &self.columns)?;
        info!(
            path = %path.display(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "loaded dashboard"
        );
        self.dashboard = Some(dashboard);
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    /// State ranking chart for the current metric.
    fn state_series(&self) -> error::Result<BarSeries> {
        let dashboard = self.dashboard.as_ref().ok_or(SalesError::EmptyInput)?;
        let states = dashboard.states(self.metric)?;
        Ok(BarSeries::from_states(self.metric, &states))
    }

    fn export(&mut self, format: ChartExportFormat) {
        let result = self
            .state_series()
            .map_err(color_eyre::Report::from)
            .and_then(|series| export_bars(&self.export_dir, &series, format));
        self.status = Some(match result {
            Ok(path) => format!("Exported {}", path.display()),
            Err(e) => {
                error!(error = %e, "chart export failed");
                format!("Export failed: {}", e)
            }
        });
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        self.debug.on_key(event);
        if event.kind != KeyEventKind::Press {
            return None;
        }

        if self.show_help {
            match event.code {
                KeyCode::Char('?') | KeyCode::Esc => self.show_help = false,
                KeyCode::Char('q') => return Some(AppEvent::Exit),
                _ => {}
            }
            return None;
        }

        let action = match event.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Some(AppEvent::Exit),
            KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
                return Some(AppEvent::Exit)
            }
            KeyCode::Char('?') => {
                self.show_help = true;
                "help"
            }
            KeyCode::Char('1') => {
                self.page = Page::Overview;
                "page_overview"
            }
            KeyCode::Char('2') => {
                self.page = Page::Financial;
                "page_financial"
            }
            KeyCode::Char('3') => {
                self.page = Page::Insights;
                "page_insights"
            }
            KeyCode::Tab => {
                self.page = self.page.next();
                "next_page"
            }
            KeyCode::BackTab => {
                self.page = self.page.prev();
                "prev_page"
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.metric = self.metric.next();
                "next_metric"
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.metric = self.metric.prev();
                "prev_metric"
            }
            KeyCode::Char('t') => {
                self.heat_value = self.heat_value.toggle();
                "toggle_heat_value"
            }
            KeyCode::Char('e') => return Some(AppEvent::Export(ChartExportFormat::Png)),
            KeyCode::Char('E') => return Some(AppEvent::Export(ChartExportFormat::Eps)),
            _ => return None,
        };
        self.debug.last_action = action.to_string();
        debug!(action, page = self.page.name(), metric = self.metric.name(), "key");
        None
    }

    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        self.debug.num_events += 1;

        match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::Open(path, options) => match self.load(path, options) {
                Ok(()) => None,
                Err(e) if e.is_startup() => Some(AppEvent::Crash(format!(
                    "Failed to load {}: {}",
                    path.display(),
                    e
                ))),
                Err(e) => {
                    self.status = Some(e.to_string());
                    None
                }
            },
            AppEvent::Export(format) => {
                self.export(*format);
                None
            }
            _ => None,
        }
    }

    fn color(&self, name: &str) -> ratatui::style::Color {
        self.theme.get(name)
    }

    fn render_placeholder(&self, area: Rect, buf: &mut Buffer, title: &str, err: &SalesError) {
        render_placeholder(
            area,
            buf,
            title,
            &err.to_string(),
            self.color("border"),
            self.color("error"),
        );
    }

    fn render_bars(
        &self,
        area: Rect,
        buf: &mut Buffer,
        title: &str,
        series: error::Result<BarSeries>,
        horizontal: bool,
    ) {
        match series {
            Ok(series) => {
                let widget = BarsWidget::new(&series).with_colors(
                    self.color("border"),
                    self.color("bar"),
                    self.color("profit_negative"),
                );
                if horizontal {
                    widget.horizontal().render(area, buf)
                } else {
                    widget.render(area, buf)
                }
            }
            Err(e) => self.render_placeholder(area, buf, title, &e),
        }
    }

    fn render_header(&self, area: Rect, buf: &mut Buffer) {
        let mut spans = vec![Span::styled(
            format!(" {} ", APP_NAME),
            Style::default()
                .fg(self.color("primary"))
                .add_modifier(Modifier::BOLD),
        )];
        for (i, page) in Page::ALL.iter().enumerate() {
            let style = if *page == self.page {
                Style::default()
                    .fg(self.color("border_active"))
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::default().fg(self.color("text_secondary"))
            };
            spans.push(Span::styled(format!(" [{}] {} ", i + 1, page.title()), style));
        }
        if let Some(insights) = self.dashboard.as_ref().and_then(|d| d.insights()) {
            spans.push(Span::styled(
                format!(
                    "  Sales {:.2} | Profit {:.2} | Margin {:.2}%",
                    insights.total_sale, insights.total_profit, insights.margin
                ),
                Style::default().fg(self.color("text_primary")),
            ));
        }
        Paragraph::new(Line::from(spans)).render(area, buf);
    }

    fn render_overview(&self, dashboard: &Dashboard, area: Rect, buf: &mut Buffer) {
        let [selector, body] =
            Layout::vertical([Constraint::Length(3), Constraint::Fill(1)]).areas(area);
        let labels: Vec<&str> = Metric::ALL.iter().map(|m| m.label()).collect();
        let selected = Metric::ALL.iter().position(|m| *m == self.metric).unwrap_or(0);
        RadioBlock::new("Metric", &labels, selected)
            .with_colors(self.color("border"), self.color("border_active"))
            .render(selector, buf);

        let [charts, states] =
            Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
                .areas(body);
        let rows = Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(charts);
        for (i, dimension) in Dimension::ALL.iter().enumerate() {
            let cols =
                Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                    .split(rows[i / 2]);
            let series = dashboard
                .dimension_bars(*dimension, self.metric)
                .map(|bars| BarSeries::from_dimension(*dimension, self.metric, bars));
            self.render_bars(cols[i % 2], buf, dimension.label(), series, false);
        }

        let [ranking, table] =
            Layout::vertical([Constraint::Percentage(55), Constraint::Percentage(45)])
                .areas(states);
        self.render_bars(ranking, buf, "States", self.state_series(), true);
        if dashboard.is_empty() {
            self.render_placeholder(table, buf, "Margin by state", &SalesError::EmptyInput);
        } else {
            match SummaryTable::geography(dashboard.geography()) {
                Ok(t) => (&self.table_colors(t)).render(table, buf),
                Err(e) => self.render_placeholder(table, buf, "Margin by state", &e),
            }
        }
    }

    fn table_colors(&self, table: SummaryTable) -> SummaryTable {
        table.with_colors(
            self.color("border"),
            self.color("table_header"),
            self.color("profit_positive"),
            self.color("profit_negative"),
        )
    }

    fn render_financial(&self, dashboard: &Dashboard, area: Rect, buf: &mut Buffer) {
        let [top, bottom] =
            Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);
        match dashboard.heatmap(self.heat_value) {
            Ok(heatmap) => HeatmapWidget::new(&heatmap)
                .with_colors(
                    self.color("border"),
                    self.color("table_header"),
                    self.color("profit_positive"),
                    self.color("profit_negative"),
                )
                .render(top, buf),
            Err(e) => self.render_placeholder(top, buf, self.heat_value.label(), &e),
        }

        let [left, right] =
            Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)])
                .areas(bottom);
        match dashboard
            .categories()
            .and_then(|df| SummaryTable::categories(&df))
        {
            Ok(t) => (&self.table_colors(t)).render(left, buf),
            Err(e) => self.render_placeholder(left, buf, "Category breakdown", &e),
        }
        match dashboard.margin_bands() {
            Ok(bands) => (&self.table_colors(SummaryTable::margin_bands(&bands))).render(right, buf),
            Err(e) => self.render_placeholder(right, buf, "Margin % by discount", &e),
        }
    }

    fn render_insights(&self, dashboard: &Dashboard, area: Rect, buf: &mut Buffer) {
        let block = panel(" Insights ", self.color("border"));
        let lines: Vec<Line> = match dashboard.insights() {
            Some(insights) => insights
                .lines()
                .into_iter()
                .map(|l| Line::from(format!("• {}", l)))
                .collect(),
            None => vec![Line::from("No transactions loaded.")],
        };
        Paragraph::new(lines)
            .style(Style::default().fg(self.color("text_primary")))
            .wrap(Wrap { trim: true })
            .block(block)
            .render(area, buf);
    }

    fn render_help(&self, area: Rect, buf: &mut Buffer) {
        let popup = centered_rect(area, 60, 50, 50, 13);
        Clear.render(popup, buf);
        Paragraph::new(HELP_TEXT)
            .style(Style::default().fg(self.color("text_primary")))
            .block(panel(" Help ", self.color("border_active")))
            .render(popup, buf);
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let started = Instant::now();
        self.debug.num_frames += 1;

        let mut constraints = vec![Constraint::Length(1), Constraint::Fill(1)];
        if self.status.is_some() {
            constraints.push(Constraint::Length(1));
        }
        if self.debug.enabled {
            constraints.push(Constraint::Length(1));
        }
        constraints.push(Constraint::Length(1));
        let layout = Layout::new(Direction::Vertical, constraints).split(area);

        self.render_header(layout[0], buf);

        match self.dashboard.as_ref() {
            Some(dashboard) => match self.page {
                Page::Overview => self.render_overview(dashboard, layout[1], buf),
                Page::Financial => self.render_financial(dashboard, layout[1], buf),
                Page::Insights => self.render_insights(dashboard, layout[1], buf),
            },
            None => {
                let message = match &self.path {
                    Some(path) => format!("Loading {}…", path.display()),
                    None => "Loading…".to_string(),
                };
                Paragraph::new(message).centered().render(layout[1], buf);
            }
        }

        let mut next = 2;
        if let Some(status) = &self.status {
            Paragraph::new(status.as_str())
                .style(Style::default().fg(self.color("secondary")))
                .render(layout[next], buf);
            next += 1;
        }
        if self.debug.enabled {
            self.debug.last_frame_ms = started.elapsed().as_millis();
            (&self.debug).render(layout[next], buf);
            next += 1;
        }

        let keys: &'static [(&'static str, &'static str)] = match self.page {
            Page::Overview => &OVERVIEW_KEYS,
            Page::Financial => &FINANCIAL_KEYS,
            Page::Insights => &INSIGHTS_KEYS,
        };
        let mut controls =
            Controls::new(keys).with_colors(self.color("controls_bg"), self.color("text_primary"));
        if let Some(dashboard) = &self.dashboard {
            controls = controls.with_row_count(dashboard.base().height());
        }
        (&controls).render(layout[next], buf);

        if self.show_help {
            self.render_help(area, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    fn app() -> App {
        App::new()
    }

    fn press(app: &mut App, code: KeyCode) -> Option<AppEvent> {
        app.event(&AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    #[test]
    fn page_keys() {
        let mut app = app();
        assert_eq!(app.page(), Page::Overview);
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.page(), Page::Financial);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.page(), Page::Insights);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.page(), Page::Overview);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.page(), Page::Insights);
    }

    #[test]
    fn metric_cycles_both_ways() {
        let mut app = app();
        assert_eq!(app.metric(), Metric::Transactions);
        press(&mut app, KeyCode::Left);
        assert_eq!(app.metric(), Metric::Discount);
        press(&mut app, KeyCode::Char('l'));
        assert_eq!(app.metric(), Metric::Transactions);
    }

    #[test]
    fn help_swallows_keys_until_closed() {
        let mut app = app();
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help());
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.page(), Page::Overview);
        assert!(press(&mut app, KeyCode::Esc).is_none());
        assert!(!app.show_help());
        assert!(matches!(press(&mut app, KeyCode::Esc), Some(AppEvent::Exit)));
    }

    #[test]
    fn export_without_data_sets_status() {
        let mut app = app();
        let next = press(&mut app, KeyCode::Char('e'));
        assert!(matches!(next, Some(AppEvent::Export(ChartExportFormat::Png))));
        app.event(&AppEvent::Export(ChartExportFormat::Png));
        assert!(app.status().unwrap().starts_with("Export failed"));
    }

    #[test]
    fn page_names_round_trip() {
        for page in Page::ALL {
            assert_eq!(Page::from_name(page.name()), Some(page));
        }
        assert_eq!(Page::from_name("Financial"), Some(Page::Financial));
        assert_eq!(Page::from_name("charts"), None);
    }

    #[test]
    fn debug_strip_counts_rendered_frames() {
        let mut app = app();
        app.enable_debug();
        press(&mut app, KeyCode::Char('t'));
        let area = Rect::new(0, 0, 120, 10);
        let mut buf = Buffer::empty(area);
        (&mut app).render(area, &mut buf);
        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("last_action=toggle_heat_value"));
        assert!(text.contains("frames=1"));
    }

    #[test]
    fn renders_loading_screen_without_data() {
        let mut app = app();
        let area = Rect::new(0, 0, 80, 10);
        let mut buf = Buffer::empty(area);
        (&mut app).render(area, &mut buf);
        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Loading"));
        assert!(text.contains("[1] Overview"));
    }
}
