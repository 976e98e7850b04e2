//! Terminal User Interface for sysdelta.
//!
//! This module provides a real-time dashboard using `ratatui` that displays:
//!
//! - Status bar with the current headline figures
//! - Four charts of recent history (CPU, memory, disk busy, network)
//! - A process table sortable by CPU or memory
//! - Detail panels for memory, the primary disk, the GPU and process owners
//!
//! It also hosts the two non-interactive outputs: the headless line logger
//! and the `--once` report.
//!
//! # Controls
//!
//! - `q` or `Esc`: Quit
//! - `Up`/`Down`: Select a process
//! - `s`: Toggle sort between CPU and memory
//! - `t`: Send SIGTERM to the selected process

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use humansize::{format_size, BINARY};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::Span,
    widgets::{
        Axis, Block, BorderType, Borders, Cell, Chart, Dataset, GraphType, List, ListItem,
        Paragraph, Row, Table, TableState,
    },
    Frame, Terminal,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::app::{App, ProcessRow, SortKey};
use crate::error::Result;
use crate::gpu::{GpuReading, GpuSource};
use crate::history::{RateHistory, RateSample};
use crate::host::{self, HostInfo, JournalTail};
use crate::rates::{OwnerTotals, RateResult};
use crate::snapshot::{DiskTotals, Snapshot};
use crate::thresholds::Severity;

fn bytes(value: u64) -> String {
    format_size(value, BINARY)
}

fn bytes_per_sec(value: f64) -> String {
    format!("{}/s", format_size(value.max(0.0) as u64, BINARY))
}

fn megabits(bits_per_sec: f64) -> f64 {
    bits_per_sec / 1_000_000.0
}

/// Interactive state that lives only as long as the dashboard.
#[derive(Default)]
struct UiState {
    table: TableState,
    sort: SortKey,
    /// Outcome of the last key action, shown in the status bar
    message: Option<String>,
}

/// Run the TUI event loop.
///
/// This takes ownership of the App and terminal, running until the user
/// presses `q` or `Esc`, or the `running` flag is set to false.
pub fn run(mut app: App, running: Arc<AtomicBool>, interval: Duration) -> Result<()> {
    enable_raw_mode()?;
    if let Err(e) = std::io::stdout().execute(EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(e.into());
    }

    let result = run_tui_loop(&mut app, &running, interval);

    // Always clean up terminal state
    let _ = disable_raw_mode();
    let _ = std::io::stdout().execute(LeaveAlternateScreen);

    result
}

/// Inner TUI loop - separated to ensure cleanup happens on any exit path.
fn run_tui_loop(app: &mut App, running: &Arc<AtomicBool>, interval: Duration) -> Result<()> {
    let backend = CrosstermBackend::new(std::io::stdout());
    let mut terminal = Terminal::new(backend)?;
    let mut state = UiState::default();
    state.table.select(Some(0));

    collect_reporting(app, &mut state);
    let mut last_collection = Instant::now();

    while running.load(Ordering::Relaxed) {
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => {
                            running.store(false, Ordering::Relaxed);
                        }
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            running.store(false, Ordering::Relaxed);
                        }
                        KeyCode::Up => state.table.select_previous(),
                        KeyCode::Down => state.table.select_next(),
                        KeyCode::Char('s') => state.sort = state.sort.toggle(),
                        KeyCode::Char('t') => terminate_selected(app, &mut state),
                        _ => {}
                    }
                }
            }
        }

        if last_collection.elapsed() >= interval {
            collect_reporting(app, &mut state);
            last_collection = Instant::now();
        }

        terminal.draw(|f| draw_ui(f, app, &mut state))?;
    }

    Ok(())
}

/// A failed pass keeps the dashboard alive; the previous figures stay up.
fn collect_reporting(app: &mut App, state: &mut UiState) {
    if let Err(err) = app.collect() {
        warn!(error = %err, "sampling pass failed");
        state.message = Some(format!("sampling failed: {err}"));
    }
}

fn terminate_selected(app: &App, state: &mut UiState) {
    let rows = app.top_processes(state.sort, app.config.top);
    let Some(row) = state.table.selected().and_then(|i| rows.get(i)) else {
        return;
    };
    state.message = Some(match app.terminate(row.pid, false) {
        Ok(()) => format!("SIGTERM sent to {} ({})", row.pid, row.name),
        Err(err) => format!("cannot signal {}: {err}", row.pid),
    });
}

/// Main UI drawing function.
fn draw_ui(f: &mut Frame, app: &App, state: &mut UiState) {
    let size = f.area();

    let warnings = app.availability.get_warnings();
    let has_warnings = !warnings.is_empty();

    let mut constraints = vec![Constraint::Length(3)]; // Status bar
    if has_warnings {
        constraints.push(Constraint::Length(3)); // Warnings bar
    }
    constraints.extend([
        Constraint::Length(10), // Charts
        Constraint::Min(8),     // Process table
        Constraint::Length(8),  // Details
    ]);

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(size);

    let mut chunk_idx = 0;

    draw_status_bar(f, app, state, main_chunks[chunk_idx]);
    chunk_idx += 1;

    if has_warnings {
        draw_warnings(f, &warnings, main_chunks[chunk_idx]);
        chunk_idx += 1;
    }

    draw_charts(f, app, main_chunks[chunk_idx]);
    chunk_idx += 1;

    draw_processes(f, app, state, main_chunks[chunk_idx]);
    chunk_idx += 1;

    draw_details(f, app, main_chunks[chunk_idx]);
}

/// Draw the top status bar.
fn draw_status_bar(f: &mut Frame, app: &App, state: &UiState, area: Rect) {
    let mut status_text = match (app.snapshot(), app.rates()) {
        (Some(snap), Some(rates)) => format!(
            " sysdelta | {} | CPU: {:.1}% | Mem: {}/{} | Load: {:.2} {:.2} {:.2} | Procs: {} Threads: {} | Sort: {} | [q]uit [s]ort [t]erm",
            snap.timestamp.format("%H:%M:%S"),
            rates.cpu_percent,
            bytes(snap.memory.used_kb() * 1024),
            bytes(snap.memory.total_kb * 1024),
            snap.load.one,
            snap.load.five,
            snap.load.fifteen,
            snap.process_count(),
            snap.total_threads(),
            state.sort.label(),
        ),
        _ => " sysdelta | Collecting baseline... | [q]uit".to_string(),
    };
    if let Some(message) = &state.message {
        status_text.push_str(" | ");
        status_text.push_str(message);
    }

    let mut title = format!("{} | {}", app.host.cpu_model, app.host.kernel_version);
    if let Some(mhz) = app.snapshot().and_then(|snap| snap.cpu_mhz) {
        title.push_str(&format!(" | {mhz:.0} MHz"));
    }

    let status = Paragraph::new(status_text)
        .style(Style::default().fg(Color::White).bg(Color::DarkGray))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title(title),
        );

    f.render_widget(status, area);
}

/// Draw the warnings bar for unavailable metrics.
fn draw_warnings(f: &mut Frame, warnings: &[String], area: Rect) {
    let text = warnings.join(" | ");
    let paragraph = Paragraph::new(text)
        .style(Style::default().fg(Color::Black).bg(Color::Yellow))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title("Limited Metrics")
                .border_style(Style::default().fg(Color::Yellow)),
        );
    f.render_widget(paragraph, area);
}

/// Draw the row of history charts.
fn draw_charts(f: &mut Frame, app: &App, area: Rect) {
    let history = &app.history;
    let Some(latest) = history.latest() else {
        let loading = Paragraph::new("Waiting for a second sample...").block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title("Charts"),
        );
        f.render_widget(loading, area);
        return;
    };
    let thresholds = &app.thresholds;

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
        ])
        .split(area);

    draw_line_chart(
        f,
        history,
        cols[0],
        "CPU % [/proc/stat]",
        |s| s.cpu_percent,
        ChartConfig {
            color: Color::Yellow,
            severity: thresholds.cpu_usage_severity(latest.cpu_percent),
            warning: Some(thresholds.cpu_usage_warning),
            critical: Some(thresholds.cpu_usage_critical),
        },
    );

    draw_line_chart(
        f,
        history,
        cols[1],
        "Mem used % [/proc/meminfo]",
        |s| s.memory_used_percent,
        ChartConfig {
            color: Color::Green,
            severity: thresholds.memory_used_severity(latest.memory_used_percent),
            warning: Some(thresholds.memory_used_warning),
            critical: Some(thresholds.memory_used_critical),
        },
    );

    let disk_title = format!(
        "Disk busy % R {} W {}",
        bytes_per_sec(latest.disk_read_bytes_per_sec),
        bytes_per_sec(latest.disk_write_bytes_per_sec)
    );
    draw_line_chart(
        f,
        history,
        cols[2],
        &disk_title,
        |s| s.disk_active_percent,
        ChartConfig {
            color: Color::Magenta,
            severity: thresholds.disk_active_severity(latest.disk_active_percent),
            warning: Some(thresholds.disk_active_warning),
            critical: Some(thresholds.disk_active_critical),
        },
    );

    let net_title = format!(
        "Net Mbit/s rx {:.1} tx {:.1}",
        megabits(latest.net_rx_bits_per_sec),
        megabits(latest.net_tx_bits_per_sec)
    );
    draw_line_chart(
        f,
        history,
        cols[3],
        &net_title,
        |s| megabits(s.net_rx_bits_per_sec + s.net_tx_bits_per_sec),
        ChartConfig {
            color: Color::Cyan,
            ..Default::default()
        },
    );
}

/// Series colour, current severity and threshold levels of one chart.
#[derive(Default)]
struct ChartConfig {
    color: Color,
    severity: Severity,
    warning: Option<f64>,
    critical: Option<f64>,
}

impl ChartConfig {
    /// Threshold levels worth drawing for a series peaking at `peak`.
    ///
    /// A level appears once the series has reached half of it.
    fn reference_lines(&self, peak: f64) -> Vec<(f64, Color)> {
        [(self.warning, Color::Yellow), (self.critical, Color::Red)]
            .into_iter()
            .filter_map(|(level, color)| Some((level?, color)))
            .filter(|(level, _)| peak >= level * 0.5)
            .collect()
    }

    /// Y-axis bounds covering the points and any drawn reference line.
    fn y_bounds(&self, points: &[(f64, f64)]) -> [f64; 2] {
        let (low, peak) = points
            .iter()
            .fold((0.0_f64, 0.0_f64), |(low, peak), &(_, y)| (low.min(y), peak.max(y)));
        let top = self
            .reference_lines(peak)
            .into_iter()
            .fold(peak, |top, (level, _)| top.max(level * 1.1));
        if top - low < 0.001 {
            [low, top + 1.0]
        } else {
            [low, top * 1.05]
        }
    }

    fn title_style(&self) -> Style {
        let style = Style::default().fg(severity_color(self.severity));
        match self.severity {
            Severity::Normal => style,
            _ => style.add_modifier(Modifier::BOLD),
        }
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Critical => Color::Red,
        Severity::Warning => Color::Yellow,
        Severity::Normal => Color::White,
    }
}

fn trace(points: &[(f64, f64)], color: Color) -> Dataset<'_> {
    Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(points)
}

/// Draw one history series with its threshold lines.
fn draw_line_chart<F>(
    f: &mut Frame,
    history: &RateHistory,
    area: Rect,
    title: &str,
    value_fn: F,
    config: ChartConfig,
) where
    F: Fn(&RateSample) -> f64,
{
    let points = history.series(value_fn);
    let Some(peak) = points.iter().map(|&(_, y)| y).reduce(f64::max) else {
        return;
    };
    let width = points.len() as f64;
    let levels: Vec<([(f64, f64); 2], Color)> = config
        .reference_lines(peak)
        .into_iter()
        .map(|(level, color)| ([(0.0, level), (width, level)], color))
        .collect();
    let datasets: Vec<Dataset> = std::iter::once(trace(&points, config.color))
        .chain(levels.iter().map(|(line, color)| trace(line, *color)))
        .collect();

    let [low, high] = config.y_bounds(&points);
    let axis = || Axis::default().style(Style::default().fg(Color::Gray));
    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title(Span::styled(title, config.title_style()))
                .border_style(Style::default().fg(severity_color(config.severity))),
        )
        .x_axis(axis().bounds([0.0, width]))
        .y_axis(
            axis()
                .labels(vec![
                    Span::raw(format!("{low:.0}")),
                    Span::raw(format!("{high:.0}")),
                ])
                .bounds([low, high]),
        );

    f.render_widget(chart, area);
}

/// Draw the process table.
fn draw_processes(f: &mut Frame, app: &App, state: &mut UiState, area: Rect) {
    let rows_data = app.top_processes(state.sort, app.config.top);
    if let Some(selected) = state.table.selected() {
        if selected >= rows_data.len() && !rows_data.is_empty() {
            state.table.select(Some(rows_data.len() - 1));
        }
    }

    let header = Row::new(["PID", "NAME", "USER", "S", "CPU%", "RSS", "READ", "WRITE", "THR"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = rows_data.iter().map(process_row).collect();
    let widths = [
        Constraint::Length(8),
        Constraint::Min(16),
        Constraint::Length(12),
        Constraint::Length(2),
        Constraint::Length(7),
        Constraint::Length(11),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Length(5),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ")
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title(format!("Processes [by {}]", state.sort.label())),
        );

    f.render_stateful_widget(table, area, &mut state.table);
}

fn process_row(row: &ProcessRow) -> Row<'static> {
    Row::new(vec![
        Cell::from(row.pid.to_string()),
        Cell::from(row.name.clone()),
        Cell::from(row.owner.clone()),
        Cell::from(row.state.clone()),
        Cell::from(format!("{:>5.1}", row.rate.cpu_percent)),
        Cell::from(bytes(row.rss_kb * 1024)),
        Cell::from(bytes_per_sec(row.rate.read_bytes_per_sec)),
        Cell::from(bytes_per_sec(row.rate.write_bytes_per_sec)),
        Cell::from(row.threads.to_string()),
    ])
}

/// Draw the bottom detail panels.
fn draw_details(f: &mut Frame, app: &App, area: Rect) {
    let Some(snap) = app.snapshot() else {
        return;
    };

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    // Column 1: Memory
    let mem = &snap.memory;
    let mem_items = vec![
        ListItem::new(format!("Used:      {:>10}", bytes(mem.used_kb() * 1024))),
        ListItem::new(format!("Available: {:>10}", bytes(mem.available_kb * 1024))),
        ListItem::new(format!("Buffers:   {:>10}", bytes(mem.buffers_kb * 1024))),
        ListItem::new(format!("Cached:    {:>10}", bytes(mem.cached_kb * 1024))),
        ListItem::new(format!(
            "Swap:      {:>10} / {}",
            bytes(mem.swap_used_kb() * 1024),
            bytes(mem.swap_total_kb * 1024)
        )),
        ListItem::new(format!("Uptime:    {:>9.1}h", snap.uptime_secs / 3600.0)),
    ];
    f.render_widget(panel(mem_items, "Memory"), cols[0]);

    // Column 2: Primary disk and network
    let rates = app.rates().cloned().unwrap_or_default();
    let totals = snap.disk_totals();
    let mut io_items = vec![
        ListItem::new(format!(
            "{}: R {} W {}",
            snap.disk_name,
            bytes_per_sec(rates.disk.read_bytes_per_sec),
            bytes_per_sec(rates.disk.write_bytes_per_sec)
        )),
        ListItem::new(format!("Busy:  {:>5.1}%", rates.disk.active_percent)),
        ListItem::new(format!(
            "Total: R {} W {}",
            bytes(totals.read_bytes),
            bytes(totals.written_bytes)
        )),
        ListItem::new(format!(
            "{}: rx {:.2} tx {:.2} Mbit/s",
            snap.interface,
            megabits(rates.net.rx_bits_per_sec),
            megabits(rates.net.tx_bits_per_sec)
        )),
    ];
    for fs in snap.filesystems.iter().take(3) {
        io_items.push(ListItem::new(format!(
            "{}: {} free of {}",
            fs.mount,
            bytes(fs.available_bytes),
            bytes(fs.total_bytes)
        )));
    }
    f.render_widget(panel(io_items, "Disk/Net"), cols[1]);

    // Column 3: GPU
    let gpu = app.gpu();
    let gpu_border = severity_color(
        app.thresholds
            .gpu_temp_severity(gpu.stats().temperature_celsius),
    );
    let gpu_panel = panel(gpu_items(&gpu), "GPU").block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title("GPU")
            .border_style(Style::default().fg(gpu_border)),
    );
    f.render_widget(gpu_panel, cols[2]);

    // Column 4: Owners by CPU
    let owner_items = top_owners(&rates, 6)
        .into_iter()
        .map(|(owner, t)| {
            ListItem::new(format!(
                "{:<10} {:>5.1}% {:>9} ({})",
                owner,
                t.cpu_percent,
                bytes(t.memory_kb * 1024),
                t.processes
            ))
        })
        .collect();
    f.render_widget(panel(owner_items, "Owners"), cols[3]);
}

fn panel<'a>(items: Vec<ListItem<'a>>, title: &'a str) -> List<'a> {
    List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(title),
    )
}

fn gpu_items(reading: &GpuReading) -> Vec<ListItem<'static>> {
    let source = match reading.source() {
        Some(GpuSource::Tool) => "rocm-smi",
        Some(GpuSource::Sysfs) => "sysfs",
        None => return vec![ListItem::new("N/A (no AMD GPU found)")],
    };
    let stats = reading.stats();
    let na = || "N/A".to_string();
    vec![
        ListItem::new(format!(
            "{} [{}]",
            stats.device_name.unwrap_or_else(na),
            source
        )),
        ListItem::new(format!(
            "Use:  {}",
            stats.usage_percent.map(|v| format!("{v:.0}%")).unwrap_or_else(na)
        )),
        ListItem::new(format!(
            "VRAM: {} / {}",
            stats.vram_used_bytes.map(bytes).unwrap_or_else(na),
            stats.vram_total_bytes.map(bytes).unwrap_or_else(na)
        )),
        ListItem::new(format!(
            "Temp: {}",
            stats
                .temperature_celsius
                .map(|v| format!("{v:.1}C"))
                .unwrap_or_else(na)
        )),
        ListItem::new(format!(
            "Fan:  {}",
            stats.fan_percent.map(|v| format!("{v:.0}%")).unwrap_or_else(na)
        )),
        ListItem::new(format!(
            "Power:{}",
            stats.power_watts.map(|v| format!("{v:.1}W")).unwrap_or_else(na)
        )),
    ]
}

/// Owners ordered by CPU share, then memory.
fn top_owners(rates: &RateResult, limit: usize) -> Vec<(&str, OwnerTotals)> {
    let mut owners: Vec<(&str, OwnerTotals)> = rates
        .owners
        .iter()
        .map(|(name, totals)| (name.as_str(), *totals))
        .collect();
    owners.sort_by(|a, b| {
        b.1.cpu_percent
            .total_cmp(&a.1.cpu_percent)
            .then(b.1.memory_kb.cmp(&a.1.memory_kb))
    });
    owners.truncate(limit);
    owners
}

/// Run in headless mode (no TUI, one summary line per pass).
pub fn run_headless(mut app: App, running: Arc<AtomicBool>, interval: Duration) -> Result<()> {
    println!("sysdelta - host metrics collector");
    println!("=================================");
    println!("CPU: {} | Kernel: {}", app.host.cpu_model, app.host.kernel_version);
    println!("Interval: {} seconds", interval.as_secs());
    println!("Press Ctrl+C to stop.\n");

    while running.load(Ordering::Relaxed) {
        app.collect()?;

        if let (Some(snap), Some(rates)) = (app.snapshot(), app.rates()) {
            println!("{}", summary_line(snap, rates, &app.gpu()));
        }

        std::thread::sleep(interval);
    }

    info!(passes = app.passes(), "stopped");
    Ok(())
}

fn summary_line(snap: &Snapshot, rates: &RateResult, gpu: &GpuReading) -> String {
    let gpu_use = gpu
        .stats()
        .usage_percent
        .map(|v| format!("{v:5.1}%"))
        .unwrap_or_else(|| "  N/A".to_string());
    let top = rates
        .busiest()
        .first()
        .and_then(|(pid, rate)| {
            snap.processes
                .get(pid)
                .map(|p| format!("{} ({}) {:.1}%", p.name, pid, rate.cpu_percent))
        })
        .unwrap_or_else(|| "-".to_string());
    format!(
        "[{}] CPU: {:5.1}% | Mem: {:5.1}% | {} R {} W {} busy {:5.1}% | {} rx {:.2} tx {:.2} Mbit/s | GPU: {} | Procs: {} | Top: {}",
        snap.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
        rates.cpu_percent,
        snap.memory.used_percent(),
        snap.disk_name,
        bytes_per_sec(rates.disk.read_bytes_per_sec),
        bytes_per_sec(rates.disk.write_bytes_per_sec),
        rates.disk.active_percent,
        snap.interface,
        megabits(rates.net.rx_bits_per_sec),
        megabits(rates.net.tx_bits_per_sec),
        gpu_use,
        snap.process_count(),
        top,
    )
}

/// Everything `--once` prints.
#[derive(Serialize)]
pub struct OnceReport<'a> {
    pub timestamp: DateTime<Utc>,
    pub host: &'a HostInfo,
    pub snapshot: &'a Snapshot,
    pub rates: &'a RateResult,
    pub disk_totals: DiskTotals,
    pub top_processes: Vec<ProcessRow>,
    pub gpu: GpuReading,
    pub logged_in_users: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal: Option<JournalTail>,
}

/// Assemble the report from the latest pass; `None` before rates exist.
///
/// Tools that were not found at startup are not spawned; their
/// sections read as unavailable.
pub fn build_report(app: &App) -> Result<Option<OnceReport<'_>>> {
    let (Some(snapshot), Some(rates)) = (app.snapshot(), app.rates()) else {
        return Ok(None);
    };
    let journal = match app.config.logs {
        Some(lines) if app.availability.journalctl => Some(host::journal_tail(lines)?),
        Some(_) => {
            warn!("journalctl not found, journal tail omitted");
            Some(JournalTail::Unavailable)
        }
        None => None,
    };
    let logged_in_users = if app.availability.who {
        host::logged_in_users()
    } else {
        Vec::new()
    };

    Ok(Some(OnceReport {
        timestamp: snapshot.timestamp,
        host: &app.host,
        snapshot,
        rates,
        disk_totals: snapshot.disk_totals(),
        top_processes: app.top_processes(SortKey::Cpu, app.config.top),
        gpu: app.gpu(),
        logged_in_users,
        journal,
    }))
}

/// Take two samples one interval apart and print the result.
pub fn run_once(mut app: App, interval: Duration, json: bool) -> Result<()> {
    app.collect()?;
    std::thread::sleep(interval);
    app.collect()?;

    let Some(report) = build_report(&app)? else {
        return Ok(());
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", format_report(&report));
    }
    Ok(())
}

/// Plain key-value rendering of a report.
pub fn format_report(report: &OnceReport<'_>) -> String {
    let snap = report.snapshot;
    let rates = report.rates;
    let mut out = String::new();
    let mut line = |key: &str, value: String| {
        out.push_str(&format!("{key:<18} {value}\n"));
    };

    line("timestamp", report.timestamp.to_rfc3339());
    line("cpu_model", report.host.cpu_model.clone());
    line(
        "cores",
        format!(
            "{} physical / {} logical",
            report.host.physical_cores, report.host.logical_cpus
        ),
    );
    line("kernel", report.host.kernel_version.clone());
    line(
        "cpu_mhz",
        snap.cpu_mhz
            .map(|mhz| format!("{mhz:.0}"))
            .unwrap_or_else(|| "N/A".into()),
    );
    line("uptime_hours", format!("{:.2}", snap.uptime_secs / 3600.0));
    line(
        "load",
        format!("{:.2} {:.2} {:.2}", snap.load.one, snap.load.five, snap.load.fifteen),
    );
    line("cpu_percent", format!("{:.1}", rates.cpu_percent));
    line(
        "memory_used",
        format!(
            "{} of {} ({:.1}%)",
            bytes(snap.memory.used_kb() * 1024),
            bytes(snap.memory.total_kb * 1024),
            snap.memory.used_percent()
        ),
    );
    line(
        "swap_used",
        format!(
            "{} of {}",
            bytes(snap.memory.swap_used_kb() * 1024),
            bytes(snap.memory.swap_total_kb * 1024)
        ),
    );
    line(
        "disk",
        format!(
            "{} read {} write {} busy {:.1}%",
            snap.disk_name,
            bytes_per_sec(rates.disk.read_bytes_per_sec),
            bytes_per_sec(rates.disk.write_bytes_per_sec),
            rates.disk.active_percent
        ),
    );
    line(
        "network",
        format!(
            "{} rx {:.3} tx {:.3} Mbit/s",
            snap.interface,
            megabits(rates.net.rx_bits_per_sec),
            megabits(rates.net.tx_bits_per_sec)
        ),
    );
    line(
        "disk_totals",
        format!(
            "read {} written {}",
            bytes(report.disk_totals.read_bytes),
            bytes(report.disk_totals.written_bytes)
        ),
    );
    for fs in &snap.filesystems {
        line(
            "filesystem",
            format!(
                "{} {} used of {}",
                fs.mount,
                bytes(fs.used_bytes()),
                bytes(fs.total_bytes)
            ),
        );
    }
    let gpu = report.gpu.stats();
    line(
        "gpu",
        if report.gpu.is_available() {
            format!(
                "{} use {} temp {}",
                gpu.device_name.unwrap_or_else(|| "N/A".into()),
                gpu.usage_percent
                    .map(|v| format!("{v:.0}%"))
                    .unwrap_or_else(|| "N/A".into()),
                gpu.temperature_celsius
                    .map(|v| format!("{v:.1}C"))
                    .unwrap_or_else(|| "N/A".into()),
            )
        } else {
            "N/A".to_string()
        },
    );
    line("users", report.logged_in_users.join(", "));
    for (owner, totals) in top_owners(rates, usize::MAX) {
        line(
            "owner",
            format!(
                "{owner} cpu {:.1}% mem {} procs {}",
                totals.cpu_percent,
                bytes(totals.memory_kb * 1024),
                totals.processes
            ),
        );
    }
    for row in &report.top_processes {
        line(
            "process",
            format!(
                "{} {} [{}] {} cpu {:.1}% rss {} exe {}",
                row.pid,
                row.name,
                row.owner,
                row.state,
                row.rate.cpu_percent,
                bytes(row.rss_kb * 1024),
                row.exe
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "-".to_string())
            ),
        );
    }
    match &report.journal {
        Some(JournalTail::Available { text }) => {
            out.push_str("\n--- journal ---\n");
            out.push_str(text);
        }
        Some(JournalTail::Unavailable) => out.push_str("\n--- journal ---\nN/A\n"),
        None => {}
    }
    out
}
