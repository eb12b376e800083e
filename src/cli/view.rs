use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::api::InventoryApi;
use crate::charts::{rgb, ChartData};
use crate::cli::Session;
use crate::error::Result;
use crate::models::{InventoryKind, Tab};
use crate::tui::{
    run_report_view, wrap_text, ReportView, ReportViewAction, ACTIVE_TAB_STYLE, ERROR_STYLE,
    FOOTER_STYLE, HEADER_STYLE, INACTIVE_TAB_STYLE, MUTED_ROW_STYLE,
};
use crate::viewer::{spawn_fetch, FetchOutcome, FetchTicket, ViewState, Viewer, FAILURE_MESSAGE};

const HEADER_ROW_STYLE: Style = Style::new().fg(Color::DarkGray);
const CELL_WIDTH: usize = 24;

pub fn run(session: &Session, kind: InventoryKind, page: u32, tab: Tab) -> Result<()> {
    let mut view = InventoryView::new(
        Viewer::new(kind, session.today.clone()).with_tab(tab),
        session.api(),
        session.page_size(),
        session.settings.export_path(),
    );
    view.start(page);
    run_report_view(&mut view)
}

pub(crate) struct InventoryView {
    viewer: Viewer,
    api: Arc<dyn InventoryApi>,
    limit: u32,
    export_dir: PathBuf,
    tx: Sender<FetchOutcome>,
    rx: Receiver<FetchOutcome>,
    offset: usize,
    visible_count: usize,
    show_charts: bool,
    status_message: Option<String>,
}

impl InventoryView {
    pub(crate) fn new(
        viewer: Viewer,
        api: Arc<dyn InventoryApi>,
        limit: u32,
        export_dir: PathBuf,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        let show_charts = viewer.kind() == InventoryKind::Waste;
        Self {
            viewer,
            api,
            limit,
            export_dir,
            tx,
            rx,
            offset: 0,
            visible_count: 10,
            show_charts,
            status_message: None,
        }
    }

    pub(crate) fn start(&mut self, page: u32) {
        let ticket = self.viewer.begin_fetch(page);
        self.dispatch(ticket);
    }

    fn dispatch(&mut self, ticket: FetchTicket) {
        self.offset = 0;
        spawn_fetch(
            Arc::clone(&self.api),
            self.viewer.kind(),
            self.limit,
            ticket,
            self.tx.clone(),
        );
    }

    fn export(&mut self) {
        self.status_message = Some(match self.viewer.export_csv(&self.export_dir, None) {
            Ok(path) => format!("Exported {}", path.display()),
            Err(e) => format!("Export failed: {e}"),
        });
    }

    fn draw_tabs(&self, frame: &mut Frame, area: Rect) {
        let mut spans = Vec::new();
        for tab in [Tab::Today, Tab::History] {
            let style = if tab == self.viewer.tab() {
                ACTIVE_TAB_STYLE
            } else {
                INACTIVE_TAB_STYLE
            };
            spans.push(Span::styled(format!(" {} ", tab.label()), style));
            spans.push(Span::raw(" "));
        }
        let pager = if self.viewer.total_pages() > 1 {
            format!("   {}", self.viewer.page_label())
        } else {
            String::new()
        };
        spans.push(Span::styled(pager, FOOTER_STYLE));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_table(&mut self, frame: &mut Frame, area: Rect) {
        match self.viewer.state() {
            ViewState::Idle | ViewState::Loading => {
                frame.render_widget(
                    Paragraph::new("  Loading inventory data...").style(FOOTER_STYLE),
                    area,
                );
                return;
            }
            ViewState::Failed { reason } => {
                let lines = vec![
                    Line::from(""),
                    Line::from(Span::styled(format!("  {FAILURE_MESSAGE}"), ERROR_STYLE)),
                    Line::from(Span::styled(format!("  {reason}"), FOOTER_STYLE)),
                    Line::from(""),
                    Line::from("  Press r to retry."),
                ];
                frame.render_widget(Paragraph::new(lines), area);
                return;
            }
            ViewState::Loaded | ViewState::Empty => {}
        }

        let Some(table) = self.viewer.table() else {
            frame.render_widget(
                Paragraph::new(format!("  {}", self.viewer.empty_message())).style(FOOTER_STYLE),
                area,
            );
            return;
        };

        let header_overhead = 2u16;
        let available = area.height.saturating_sub(header_overhead) as usize;
        let rows = table.filled_rows("-");
        let max_offset = rows.len().saturating_sub(1);
        self.offset = self.offset.min(max_offset);

        // Taken products are dimmed.
        let taken_idx = table.columns.iter().position(|c| c.key == "isTaken");
        let mut rendered = Vec::new();
        let mut used = 0usize;
        for row in rows.iter().skip(self.offset) {
            let cells: Vec<(String, u16)> = row.iter().map(|c| wrap_text(c, CELL_WIDTH)).collect();
            let height = cells.iter().map(|(_, h)| *h).max().unwrap_or(1);
            if used + height as usize > available && !rendered.is_empty() {
                break;
            }
            used += height as usize;
            let style = match taken_idx {
                Some(i) if row[i] == "true" => MUTED_ROW_STYLE,
                _ => Style::default(),
            };
            rendered.push(
                Row::new(cells.into_iter().map(|(text, _)| Cell::from(text)))
                    .height(height)
                    .style(style),
            );
        }
        self.visible_count = rendered.len().max(1);

        let widths: Vec<Constraint> = table
            .columns
            .iter()
            .map(|c| Constraint::Min(c.label.len().min(CELL_WIDTH) as u16))
            .collect();
        let widget = Table::new(rendered, widths)
            .header(Row::new(table.labels()).style(HEADER_ROW_STYLE).bottom_margin(1))
            .column_spacing(2);
        frame.render_widget(widget, area);
    }

    fn draw_charts(&self, frame: &mut Frame, area: Rect) {
        let Some(charts) = self.viewer.charts() else {
            return;
        };
        let [left, right] = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .areas(area);

        frame.render_widget(store_bars(&charts.store_totals), left);
        frame.render_widget(date_bars(&charts.date_totals), right);
    }
}

fn color_of(hex: &str) -> Color {
    rgb(hex)
        .map(|(r, g, b)| Color::Rgb(r, g, b))
        .unwrap_or(Color::Gray)
}

fn bar_value(v: i64) -> u64 {
    v.max(0) as u64
}

fn store_bars(chart: &ChartData) -> BarChart<'static> {
    let bars: Vec<Bar> = match chart.datasets.first() {
        Some(ds) => chart
            .labels
            .iter()
            .zip(&ds.data)
            .enumerate()
            .map(|(i, (label, value))| {
                let color = ds.background_color.get(i).map(|c| color_of(c)).unwrap_or(Color::Gray);
                Bar::default()
                    .label(Line::from(label.clone()))
                    .value(bar_value(*value))
                    .style(Style::new().fg(color))
            })
            .collect(),
        None => Vec::new(),
    };
    BarChart::default()
        .block(Block::bordered().title("Waste Quantities by Store"))
        .data(BarGroup::default().bars(&bars))
        .bar_width(9)
        .bar_gap(1)
}

fn date_bars(chart: &ChartData) -> BarChart<'static> {
    let mut widget = BarChart::default()
        .block(Block::bordered().title("Waste Quantities by Date"))
        .bar_width(3)
        .bar_gap(0)
        .group_gap(2);
    for (i, date) in chart.labels.iter().enumerate() {
        let bars: Vec<Bar> = chart
            .datasets
            .iter()
            .map(|ds| {
                let color = ds.background_color.first().map(|c| color_of(c)).unwrap_or(Color::Gray);
                Bar::default()
                    .value(bar_value(ds.data.get(i).copied().unwrap_or(0)))
                    .text_value(String::new())
                    .style(Style::new().fg(color))
            })
            .collect();
        let label = date.get(5..).unwrap_or(date).to_string();
        widget = widget.data(BarGroup::default().label(Line::from(label)).bars(&bars));
    }
    widget
}

impl ReportView for InventoryView {
    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let chart_height = if self.show_charts && self.viewer.state() == &ViewState::Loaded {
            12
        } else {
            0
        };
        let [header_area, tabs_area, sep_area, content_area, chart_area, footer_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Fill(1),
                Constraint::Length(chart_height),
                Constraint::Length(1),
            ])
            .areas(area);

        frame.render_widget(
            Paragraph::new(format!(" {}", self.viewer.kind().title())).style(HEADER_STYLE),
            header_area,
        );
        self.draw_tabs(frame, tabs_area);
        frame.render_widget(
            Paragraph::new("\u{2501}".repeat(area.width as usize)).style(FOOTER_STYLE),
            sep_area,
        );
        self.draw_table(frame, content_area);
        if chart_height > 0 {
            self.draw_charts(frame, chart_area);
        }

        let mut hints = vec!["Tab=today/history"];
        if self.viewer.has_prev() || self.viewer.has_next() {
            hints.push("\u{2190}/\u{2192}=page");
        }
        if self.viewer.can_retry() {
            hints.push("r=retry");
        }
        hints.push("e=export");
        if self.viewer.kind() == InventoryKind::Waste {
            hints.push("c=charts");
        }
        hints.push("\u{2191}/\u{2193}=scroll  q/Esc=close");
        let footer = match &self.status_message {
            Some(msg) => format!(" {}  | {msg}", hints.join("  ")),
            None => format!(" {}", hints.join("  ")),
        };
        frame.render_widget(Paragraph::new(footer).style(FOOTER_STYLE), footer_area);
    }

    fn handle_key(&mut self, code: KeyCode) -> ReportViewAction {
        self.status_message = None;
        let page = self.visible_count.max(1);
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return ReportViewAction::Close,
            KeyCode::Tab | KeyCode::Char('t') | KeyCode::Char('h') => {
                self.viewer.toggle_tab();
                self.offset = 0;
            }
            KeyCode::Right | KeyCode::Char('n') => {
                if let Some(ticket) = self.viewer.next_page() {
                    self.dispatch(ticket);
                }
            }
            KeyCode::Left | KeyCode::Char('p') => {
                if let Some(ticket) = self.viewer.prev_page() {
                    self.dispatch(ticket);
                }
            }
            KeyCode::Char('r') => {
                if let Some(ticket) = self.viewer.retry() {
                    self.dispatch(ticket);
                }
            }
            KeyCode::Char('e') => self.export(),
            KeyCode::Char('c') if self.viewer.kind() == InventoryKind::Waste => {
                self.show_charts = !self.show_charts;
            }
            KeyCode::Up | KeyCode::Char('k') => self.offset = self.offset.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.offset += 1,
            KeyCode::PageUp => self.offset = self.offset.saturating_sub(page),
            KeyCode::PageDown => self.offset += page,
            KeyCode::Home => self.offset = 0,
            _ => {}
        }
        ReportViewAction::Continue
    }

    fn tick(&mut self) {
        while let Ok((ticket, result)) = self.rx.try_recv() {
            self.viewer.complete(ticket, result);
        }
    }
}
