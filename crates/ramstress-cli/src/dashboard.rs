//! Live console views of a running stress test.
//!
//! [`TerminalDashboard`] redraws a full-screen ratatui view on the alternate
//! screen; [`LineDashboard`] prints one status line per tick for logs and
//! pipes. Raw mode is never enabled, so Ctrl+C still raises SIGINT.

use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table},
    Frame, Terminal,
};
use ramstress_core::units::{format_hms, gib, group_thousands};
use ramstress_core::{Dashboard, Error, Result, Snapshot};
use std::io::{self, Stdout, Write};

fn render_error(e: io::Error) -> Error {
    Error::Render(e.to_string())
}

/// Full-screen dashboard. Restores the primary screen when dropped.
pub struct TerminalDashboard<B: Backend = CrosstermBackend<Stdout>> {
    terminal: Terminal<B>,
    alternate: bool,
}

impl TerminalDashboard {
    /// Switch stdout to the alternate screen and hide the cursor.
    pub fn enter() -> io::Result<Self> {
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide)?;
        Ok(Self {
            terminal: Terminal::new(CrosstermBackend::new(stdout))?,
            alternate: true,
        })
    }
}

impl<B: Backend> TerminalDashboard<B> {
    #[cfg(test)]
    fn with_backend(backend: B) -> io::Result<Self> {
        Ok(Self {
            terminal: Terminal::new(backend)?,
            alternate: false,
        })
    }
}

impl<B: Backend + Send> Dashboard for TerminalDashboard<B> {
    fn render(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.terminal
            .draw(|f| ui(f, snapshot))
            .map(|_| ())
            .map_err(render_error)
    }
}

impl<B: Backend> Drop for TerminalDashboard<B> {
    fn drop(&mut self) {
        if self.alternate {
            let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
        }
    }
}

/// One status line per tick.
pub struct LineDashboard<W> {
    out: W,
}

impl<W: Write> LineDashboard<W> {
    /// Print into `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Dashboard for LineDashboard<W> {
    fn render(&mut self, snapshot: &Snapshot) -> Result<()> {
        writeln!(self.out, "{}", status_line(snapshot)).map_err(render_error)
    }
}

/// Compact single-line summary of a snapshot.
pub fn status_line(s: &Snapshot) -> String {
    let running = s.workers.iter().filter(|w| !w.stopped).count();
    format!(
        "{} | {:.2} GB | cycles {} | {:.2} GB processed | {:.2} GB/s | matrix {} | errors {} | workers {}/{}",
        format_hms(s.elapsed),
        gib(s.allocated),
        group_thousands(s.total_cycles),
        gib(s.bytes_processed),
        s.throughput_gbps,
        group_thousands(s.matrix_ops),
        group_thousands(s.total_errors),
        running,
        s.workers.len()
    )
}

fn ui(f: &mut Frame, snapshot: &Snapshot) {
    let errors_height = if snapshot.recent_errors.is_empty() {
        0
    } else {
        u16::try_from(snapshot.recent_errors.len() * 2 + 2).unwrap_or(u16::MAX)
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),             // Header
            Constraint::Length(9),             // Overview
            Constraint::Min(4),                // Threads
            Constraint::Length(errors_height), // Last errors
            Constraint::Length(1),             // Footer
        ])
        .split(f.area());

    render_header(f, chunks[0]);
    render_overview(f, chunks[1], snapshot);
    render_workers(f, chunks[2], snapshot);
    if errors_height > 0 {
        render_errors(f, chunks[3], snapshot);
    }
    render_footer(f, chunks[4]);
}

fn render_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(vec![Line::from(vec![
        Span::styled(
            " ramstress ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" RAM & CPU STRESS TEST DASHBOARD"),
    ])])
    .block(Block::default().borders(Borders::BOTTOM));

    f.render_widget(header, area);
}

fn stat(label: &str, value: String, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!("{label:<18}: ")),
        Span::styled(value, Style::default().fg(color)),
    ])
}

fn render_overview(f: &mut Frame, area: Rect, s: &Snapshot) {
    let error_color = if s.total_errors > 0 {
        Color::Red
    } else {
        Color::Green
    };
    let lines = vec![
        stat("ELAPSED TIME", format_hms(s.elapsed), Color::Yellow),
        stat("ACTIVE MEMORY", format!("{:.2} GB", gib(s.allocated)), Color::Yellow),
        stat("TOTAL CYCLES", group_thousands(s.total_cycles), Color::Yellow),
        stat(
            "DATA PROCESSED",
            format!("{:.2} GB", gib(s.bytes_processed)),
            Color::Yellow,
        ),
        stat("THROUGHPUT", format!("{:.2} GB/s", s.throughput_gbps), Color::Yellow),
        stat("MATRIX OPS", group_thousands(s.matrix_ops), Color::Yellow),
        stat("TOTAL ERRORS", group_thousands(s.total_errors), error_color),
    ];
    let overview =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Overview "));
    f.render_widget(overview, area);
}

fn render_workers(f: &mut Frame, area: Rect, s: &Snapshot) {
    let header = Row::new(vec!["", "Thread", "Activity", "Cycles", "GB", "Errors"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = s
        .workers
        .iter()
        .map(|w| {
            let (marker, style) = if w.errors == 0 {
                ("✓", Style::default().fg(Color::Green))
            } else {
                ("⚠", Style::default().fg(Color::Red))
            };
            Row::new(vec![
                marker.to_string(),
                format!("T{:>2}", w.id),
                w.status.clone(),
                w.cycles.to_string(),
                format!("{:.1}", gib(w.bytes_processed)),
                w.errors.to_string(),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Length(6),
            Constraint::Min(30),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(7),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Thread Status "),
    );

    f.render_widget(table, area);
}

fn render_errors(f: &mut Frame, area: Rect, s: &Snapshot) {
    let style = Style::default().fg(Color::Red);
    let mut lines = Vec::with_capacity(s.recent_errors.len() * 2);
    for e in &s.recent_errors {
        lines.push(Line::styled(
            format!(
                "{} T{} [{}] @ 0x{:08X}",
                e.timestamp.format("%H:%M:%S"),
                e.worker,
                e.test,
                e.address
            ),
            style,
        ));
        lines.push(Line::styled(
            format!(
                "  Expected: 0x{:02X}  Actual: 0x{:02X}  Diff: {}",
                e.expected, e.actual, e.bit_diff
            ),
            style,
        ));
    }
    let errors = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Last {} Errors ", s.recent_errors.len())),
    );
    f.render_widget(errors, area);
}

fn render_footer(f: &mut Frame, area: Rect) {
    let footer = Paragraph::new(Line::from(vec![Span::styled(
        "Run for at least 24-48 hours | Press CTRL+C to stop",
        Style::default().fg(Color::DarkGray),
    )]));
    f.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use ramstress_core::patterns::{names, Fault};
    use ramstress_core::{ErrorRecord, WorkerRow};
    use ratatui::backend::TestBackend;
    use std::time::Duration;

    fn snapshot(errors: bool) -> Snapshot {
        let recent_errors = if errors {
            let ts = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
            vec![ErrorRecord::new(
                ts,
                1,
                Fault {
                    test: names::MARCH[2],
                    address: 0xBEEF,
                    expected: 0xFF,
                    actual: 0xFB,
                    context: None,
                },
            )
            .unwrap()]
        } else {
            Vec::new()
        };
        Snapshot {
            elapsed: Duration::from_secs(61),
            allocated: 2 << 30,
            total_cycles: 1234,
            bytes_processed: 3 << 30,
            throughput_gbps: 0.05,
            matrix_ops: 5000,
            total_errors: recent_errors.len() as u64,
            workers: vec![
                WorkerRow {
                    id: 0,
                    status: "[T4] March C-".into(),
                    stopped: false,
                    cycles: 600,
                    bytes_processed: 3 << 29,
                    errors: 0,
                    matrix_ops: 2500,
                },
                WorkerRow {
                    id: 1,
                    status: "Stopped".into(),
                    stopped: true,
                    cycles: 634,
                    bytes_processed: 3 << 29,
                    errors: recent_errors.len() as u64,
                    matrix_ops: 2500,
                },
            ],
            recent_errors,
        }
    }

    fn screen(dashboard: &TerminalDashboard<TestBackend>) -> String {
        let buffer = dashboard.terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_status_line() {
        let line = status_line(&snapshot(false));
        assert_eq!(
            line,
            "00:01:01 | 2.00 GB | cycles 1,234 | 3.00 GB processed | 0.05 GB/s | matrix 5,000 | errors 0 | workers 1/2"
        );
    }

    #[test]
    fn test_line_dashboard_writes_one_line_per_frame() {
        let mut dashboard = LineDashboard::new(Vec::new());
        dashboard.render(&snapshot(false)).unwrap();
        dashboard.render(&snapshot(true)).unwrap();
        let text = String::from_utf8(dashboard.out).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().nth(1).unwrap().contains("errors 1"));
    }

    #[test]
    fn test_terminal_dashboard_draws_overview_and_threads() {
        let mut dashboard = TerminalDashboard::with_backend(TestBackend::new(90, 30)).unwrap();
        dashboard.render(&snapshot(false)).unwrap();
        let text = screen(&dashboard);

        assert!(text.contains("ELAPSED TIME      : 00:01:01"));
        assert!(text.contains("TOTAL CYCLES      : 1,234"));
        assert!(text.contains("[T4] March C-"));
        assert!(text.contains("T 1"));
        assert!(!text.contains("Last 1 Errors"));
    }

    #[test]
    fn test_terminal_dashboard_lists_recent_errors() {
        let mut dashboard = TerminalDashboard::with_backend(TestBackend::new(90, 30)).unwrap();
        dashboard.render(&snapshot(true)).unwrap();
        let text = screen(&dashboard);

        assert!(text.contains("Last 1 Errors"));
        assert!(text.contains("03:04:05 T1 [March C- S4] @ 0x0000BEEF"));
        assert!(text.contains("Expected: 0xFF  Actual: 0xFB  Diff: 00000100"));
    }
}
