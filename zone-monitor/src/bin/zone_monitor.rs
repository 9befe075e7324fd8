/// Zone Monitor dashboard
///
/// Polls the trade monitor service and shows the latest snapshot as a
/// sortable crypto table, a telemetry tab with the per-zone charts and a
/// weather indicator summarising where the market sits.
use std::{error::Error, fs::File, io, path::Path, sync::Arc, time::Duration};

use crossterm::{
    cursor::Show,
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap},
    Frame, Terminal,
};
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;
use zone_monitor::{
    buy_pressure, record_pressure, seller_pressure,
    shared::telemetry::{render_telemetry, signed_bar},
    Highlight, MetricField, MonitorConfig, MonitorSnapshot, MonitorState, MonitorView, Palette,
    Poller, Snapshot, ThemeMode, TradeRecord,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tab {
    Cryptos,
    Telemetry,
    Assistant,
}

impl Tab {
    const ALL: [Tab; 3] = [Tab::Cryptos, Tab::Telemetry, Tab::Assistant];

    fn title(&self) -> &'static str {
        match self {
            Tab::Cryptos => "Cryptos",
            Tab::Telemetry => "Telemetry",
            Tab::Assistant => "Assistant",
        }
    }

    fn index(&self) -> usize {
        Tab::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    fn next(&self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    fn previous(&self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

/// UI-only state, never shared with the poller
struct App {
    tab: Tab,
    theme: ThemeMode,
    table: TableState,
    show_details: bool,
}

impl App {
    fn new() -> Self {
        Self {
            tab: Tab::Cryptos,
            theme: ThemeMode::default(),
            table: TableState::default(),
            show_details: false,
        }
    }

    /// Keep the selection inside the current record list
    fn clamp_selection(&mut self, len: usize) {
        if len == 0 {
            self.table.select(None);
            self.show_details = false;
            return;
        }
        let selected = self.table.selected().unwrap_or(0).min(len - 1);
        self.table.select(Some(selected));
    }

    fn move_selection(&mut self, delta: isize, len: usize) {
        if len == 0 {
            return;
        }
        let current = self.table.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1);
        self.table.select(Some(next as usize));
    }
}

/// Send `tracing` output to `path`. The terminal belongs to the UI.
fn init_logging(path: &Path) -> Result<(), Box<dyn Error>> {
    let file = File::create(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

/// Leave raw mode and the alternate screen; safe to call more than once
fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture, Show)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = MonitorConfig::from_env()?;
    if let Some(path) = &config.log_file {
        init_logging(path)?;
    }
    info!(
        url = %config.poller.url,
        interval = ?config.poller.poll_interval,
        "Starting zone monitor"
    );

    let state = Arc::new(Mutex::new(MonitorState::with_position_scale(
        config.position_scale,
    )));
    // Built before the terminal is touched so a bad client setup exits cleanly
    let handle = Poller::new(config.poller.clone(), Arc::clone(&state))?.start();

    // Setup panic hook to restore terminal on crash
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));

    let result = run_dashboard(&state).await;

    handle.shutdown().await;
    let restored = restore_terminal();
    result?;
    restored?;
    Ok(())
}

/// Draw and handle keys until the user quits
async fn run_dashboard(state: &Arc<Mutex<MonitorState>>) -> Result<(), Box<dyn Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new();
    let tick_rate = Duration::from_millis(250);

    loop {
        let snap = {
            let guard = state.lock().await;
            guard.snapshot()
        };
        let len = snap.snapshot.as_ref().map(|s| s.len()).unwrap_or(0);
        app.clamp_selection(len);

        terminal.draw(|f| render_ui(f, &mut app, &snap))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.show_details {
                    if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                        app.show_details = false;
                    }
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Tab | KeyCode::Right => app.tab = app.tab.next(),
                    KeyCode::BackTab | KeyCode::Left => app.tab = app.tab.previous(),
                    KeyCode::Char('1') => app.tab = Tab::Cryptos,
                    KeyCode::Char('2') => app.tab = Tab::Telemetry,
                    KeyCode::Char('3') => app.tab = Tab::Assistant,
                    KeyCode::Char('t') => app.theme = app.theme.toggle(),
                    KeyCode::Down | KeyCode::Char('j') => app.move_selection(1, len),
                    KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1, len),
                    KeyCode::Enter if app.tab == Tab::Cryptos && len > 0 => {
                        app.show_details = true
                    }
                    _ => {}
                }
            }
        }
    }

    terminal.show_cursor()?;
    Ok(())
}

fn render_ui(f: &mut Frame, app: &mut App, snap: &MonitorSnapshot) {
    let palette = app.theme.palette();
    f.render_widget(
        Block::default().style(Style::default().bg(palette.bg).fg(palette.fg)),
        f.area(),
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_header(f, app, snap, &palette, chunks[0]);
    render_content(f, app, snap, &palette, chunks[1]);
    render_footer(f, &palette, chunks[2]);
}

fn render_header(f: &mut Frame, app: &App, snap: &MonitorSnapshot, palette: &Palette, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(30), Constraint::Length(48)])
        .split(area);

    let tabs = Tabs::new(Tab::ALL.iter().map(|t| t.title()))
        .select(app.tab.index())
        .block(
            Block::default()
                .title(" ZONE MONITOR ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border)),
        )
        .style(Style::default().fg(palette.dim))
        .highlight_style(
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, columns[0]);

    let status_color = if snap.is_error() {
        palette.negative
    } else if snap.is_loading() {
        palette.dim
    } else {
        palette.positive
    };

    let mut spans = Vec::new();
    if let Some(weather) = snap.view.as_ref().and_then(|v| v.weather) {
        spans.push(Span::raw(format!("{} ", weather.icon())));
        spans.push(Span::styled(
            format!("{}  ", weather.label()),
            Style::default().fg(palette.fg),
        ));
    }
    spans.push(Span::styled(
        snap.status.label(),
        Style::default()
            .fg(status_color)
            .add_modifier(Modifier::BOLD),
    ));
    if let Some(at) = snap.last_success {
        spans.push(Span::styled(
            format!("  {}", at.format("%H:%M:%S")),
            Style::default().fg(palette.dim),
        ));
    }
    spans.push(Span::styled(
        format!("  [{}]", app.theme.label()),
        Style::default().fg(palette.dim),
    ));

    let status = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border)),
        );
    f.render_widget(status, columns[1]);
}

fn render_content(
    f: &mut Frame,
    app: &mut App,
    snap: &MonitorSnapshot,
    palette: &Palette,
    area: Rect,
) {
    if snap.is_error() {
        let message = snap
            .last_error
            .as_deref()
            .unwrap_or("unknown error");
        let lines = vec![
            Line::from(Span::styled(
                "Failed to load trade monitor data.",
                Style::default()
                    .fg(palette.negative)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(message.to_string(), Style::default().fg(palette.dim))),
        ];
        f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
        return;
    }

    let (Some(snapshot), Some(view)) = (&snap.snapshot, &snap.view) else {
        f.render_widget(
            Paragraph::new(Span::styled("Loading data...", Style::default().fg(palette.dim))),
            area,
        );
        return;
    };

    match app.tab {
        Tab::Cryptos => {
            render_table(f, app, snapshot, view, palette, area);
            if app.show_details {
                if let Some(record) = app.table.selected().and_then(|i| snapshot.records.get(i)) {
                    render_details(f, record, view, palette, area);
                }
            }
        }
        Tab::Telemetry => render_telemetry(f, area, snapshot, view, palette),
        Tab::Assistant => {
            let placeholder =
                Paragraph::new(Span::styled("Assistant", Style::default().fg(palette.dim)))
                    .alignment(Alignment::Center);
            f.render_widget(placeholder, area);
        }
    }
}

fn render_table(
    f: &mut Frame,
    app: &mut App,
    snapshot: &Snapshot,
    view: &MonitorView,
    palette: &Palette,
    area: Rect,
) {
    if snapshot.is_empty() {
        f.render_widget(
            Paragraph::new(Span::styled(
                "No trades in the latest snapshot",
                Style::default().fg(palette.dim),
            )),
            area,
        );
        return;
    }

    let header_cells = ["SYMBOL", "ZONE", "24H", "BTC", "PRESSURE"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(palette.dim)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = Row::new(header_cells).height(1);

    let rows = snapshot.records.iter().enumerate().map(|(i, record)| {
        let metric_cell = |field: MetricField| {
            let highlight = view.extrema.highlight(record, field);
            let mut style = Style::default().fg(palette.highlight(highlight));
            if matches!(highlight, Highlight::Max | Highlight::Min) {
                style = style.add_modifier(Modifier::BOLD);
            }
            Cell::from(format!("{:.2}", field.value(record))).style(style)
        };
        let pressure = record_pressure(record);

        let row = Row::new(vec![
            Cell::from(record.symbol.clone()).style(Style::default().add_modifier(Modifier::BOLD)),
            Cell::from(record.zone.clone()),
            metric_cell(MetricField::Performance24),
            metric_cell(MetricField::PerformanceBtc24),
            Cell::from(pressure.arrow()).style(Style::default().fg(palette.pressure(pressure))),
        ]);
        if i % 2 == 1 {
            row.style(Style::default().bg(palette.row_alt))
        } else {
            row
        }
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(16),
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .row_highlight_style(Style::default().fg(palette.accent).add_modifier(Modifier::REVERSED))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" CRYPTOS ({}) ", snapshot.len()))
            .border_style(Style::default().fg(palette.border)),
    );

    f.render_stateful_widget(table, area, &mut app.table);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_details(
    f: &mut Frame,
    record: &TradeRecord,
    view: &MonitorView,
    palette: &Palette,
    area: Rect,
) {
    let popup = centered(area, 64, 22);
    f.render_widget(Clear, popup);

    let label =
        |name: &str| Span::styled(format!("{:<10}", name), Style::default().fg(palette.dim));
    let mut lines = Vec::new();

    if let Some(logo) = &record.logo {
        lines.push(Line::from(vec![
            label("logo:"),
            Span::styled(logo.clone(), Style::default().fg(palette.accent)),
        ]));
    }

    if let Some(name) = &record.name {
        lines.push(Line::from(vec![label("name:"), Span::raw(name.clone())]));
    }
    if let Some(description) = &record.description {
        lines.push(Line::from(Span::styled(
            description.clone(),
            Style::default().fg(palette.dim),
        )));
    }
    lines.push(Line::from(vec![label("symbol:"), Span::raw(record.symbol.clone())]));
    lines.push(Line::from(vec![label("zone:"), Span::raw(record.zone.clone())]));
    lines.push(Line::from(vec![
        label("amplitude:"),
        Span::raw(format!("{:.2}%", record.log_amplitude * 100.0)),
    ]));
    lines.push(Line::from(vec![
        label("position:"),
        Span::raw(format!("{:.2}%", record.log_position * 100.0)),
    ]));
    let ma200 = view.extrema.highlight(record, MetricField::AmplitudeMa200);
    lines.push(Line::from(vec![
        label("MA200:"),
        Span::styled(
            format!("{:.2}%", record.amplitude_ma_200),
            Style::default().fg(palette.highlight(ma200)),
        ),
    ]));
    if let Some(date_added) = &record.date_added {
        lines.push(Line::from(vec![label("added:"), Span::raw(date_added.clone())]));
    }
    if let Some(website) = &record.website {
        lines.push(Line::from(vec![
            label("site:"),
            Span::styled(website.clone(), Style::default().fg(palette.accent)),
        ]));
    }
    if let Some(doc) = &record.technical_doc {
        lines.push(Line::from(vec![
            label("document:"),
            Span::styled(doc.clone(), Style::default().fg(palette.accent)),
        ]));
    }

    // Zero volume shows an empty split
    let (buyer, seller) = if record.volume == 0.0 {
        (0.0, 0.0)
    } else {
        (buy_pressure(record), seller_pressure(record))
    };
    let bar_width = popup.width.saturating_sub(4) as usize;
    let pressure = record_pressure(record);
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        label("pressure:"),
        Span::styled(
            format!("{} {}", pressure.arrow(), pressure.label()),
            Style::default()
                .fg(palette.pressure(pressure))
                .add_modifier(Modifier::BOLD),
        ),
    ]));
    lines.push(Line::from(vec![
        Span::styled(format!("Buyer {:.1}%", buyer * 100.0), Style::default().fg(palette.buyer)),
        Span::raw("  vs  "),
        Span::styled(format!("Seller {:.1}%", seller * 100.0), Style::default().fg(palette.seller)),
    ]));
    lines.push(Line::from(Span::styled(
        signed_bar(buyer - seller, 1.0, bar_width),
        Style::default().fg(if buyer >= seller { palette.buyer } else { palette.seller }),
    )));

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .style(Style::default().bg(palette.bg).fg(palette.fg))
        .block(
            Block::default()
                .title(format!(" {} details ", record.symbol))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.accent)),
        );
    f.render_widget(paragraph, popup);
}

fn render_footer(f: &mut Frame, palette: &Palette, area: Rect) {
    let help = Paragraph::new(Line::from(Span::styled(
        " q quit  tab/1-3 switch  j/k select  enter details  t theme",
        Style::default().fg(palette.dim),
    )));
    f.render_widget(help, area);
}
