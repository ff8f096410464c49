//! Status screen rendering.
//!
//! ```text
//! ┌ NETWORK STATUS ─────────────────────────────────────────────────────────┐
//! │ NANO | api.nanocrawler.cc | Updated 3s ago (cycle 12) | Idle            │
//! ├ ONLINE REPRESENTATIVES ─────────────┬ REBROADCASTING ───────────────────┤
//! │ 84 online                           │ 61 rebroadcasting                 │
//! │ ...                                 │ ...                               │
//! ├ PEER VERSIONS ─┬ BLOCKS BY TYPE ────┬ REPRESENTATIVES ──────────────────┤
//! └────────────────┴────────────────────┴───────────────────────────────────┘
//! ```

use super::app::App;
use super::format::{
    format_ago, format_amount, format_count, format_number, format_percent, short_address,
};
use crate::poller::PollerState;
use chrono::Utc;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};

/// Counters older than this are highlighted as stale.
const STALE_AFTER_SECS: u64 = 60;

/// Draw the whole status screen.
pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(8), // Headline panels
            Constraint::Min(8),    // Tables
            Constraint::Length(1), // Footer
        ])
        .split(frame.area());

    draw_header(frame, app, chunks[0]);

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    draw_online_panel(frame, app, panels[0]);
    draw_rebroadcast_panel(frame, app, panels[1]);

    let tables = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(22),
            Constraint::Percentage(22),
            Constraint::Percentage(56),
        ])
        .split(chunks[2]);
    draw_peer_versions(frame, app, tables[0]);
    draw_blocks(frame, app, tables[1]);
    draw_representatives(frame, app, tables[2]);

    draw_footer(frame, chunks[3]);
}

fn label(text: &str) -> Span<'static> {
    Span::styled(text.to_string(), Style::default().fg(Color::DarkGray))
}

fn value(text: String) -> Span<'static> {
    Span::styled(text, Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
}

fn header_cell(text: &'static str) -> Cell<'static> {
    Cell::from(text).style(Style::default().add_modifier(Modifier::BOLD))
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let report = &app.report;

    let (updated, updated_color) = match report.age_secs(Utc::now()) {
        Some(age) if age > STALE_AFTER_SECS => (
            format!("Updated {} (cycle {})", format_ago(age), report.snapshot_cycle),
            Color::Yellow,
        ),
        Some(age) => (
            format!("Updated {} (cycle {})", format_ago(age), report.snapshot_cycle),
            Color::Green,
        ),
        None => ("Waiting for first poll".to_string(), Color::DarkGray),
    };

    let (state_text, state_color) = match app.poller_state {
        PollerState::Idle => ("Idle", Color::Green),
        PollerState::Fetching => ("Fetching", Color::Cyan),
        PollerState::Stopped => ("Stopped", Color::Red),
    };

    let line = Line::from(vec![
        Span::styled(
            report.currency_short_name.clone(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        label(" | "),
        Span::raw(app.api_url.clone()),
        label(" | "),
        Span::styled(updated, Style::default().fg(updated_color)),
        label(" | "),
        Span::styled(state_text, Style::default().fg(state_color)),
    ]);

    let block = Block::default()
        .title(" NETWORK STATUS ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_online_panel(frame: &mut Frame, app: &App, area: Rect) {
    let m = &app.report.metrics;
    let unit = &app.report.currency_short_name;

    let lines = vec![
        Line::from(vec![
            value(format_count(m.online_rep_count as u64)),
            label(" representatives online"),
        ]),
        Line::from(vec![
            label("Online voting power: "),
            value(format_amount(m.online_weight, unit)),
        ]),
        Line::from(vec![
            value(format_percent(m.percent_represented)),
            label(" of total voting power"),
        ]),
        Line::from(vec![
            label("Official representatives: "),
            value(format_amount(m.official_weight, unit)),
        ]),
        Line::from(vec![
            value(format_percent(m.official_percent)),
            label(" of total, "),
            value(format_percent(m.official_online_percent)),
            label(" of online voting power"),
        ]),
    ];

    let block = Block::default()
        .title(" ONLINE REPRESENTATIVES ")
        .borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_rebroadcast_panel(frame: &mut Frame, app: &App, area: Rect) {
    let m = &app.report.metrics;
    let unit = &app.report.currency_short_name;

    let lines = vec![
        Line::from(vec![
            value(format_count(m.rebroadcasting_rep_count as u64)),
            label(" representatives rebroadcasting"),
        ]),
        Line::from(vec![
            label("Votes rebroadcast from reps with at least "),
            value(format_amount(m.rebroadcast_threshold, unit)),
        ]),
        Line::from(vec![
            label("Rebroadcasting weight: "),
            value(format_amount(m.online_rebroadcast_weight, unit)),
        ]),
        Line::from(vec![
            value(format_percent(m.rebroadcast_percent)),
            label(" of total, "),
            value(format_percent(m.online_rebroadcast_percent)),
            label(" of online voting power"),
        ]),
    ];

    let block = Block::default()
        .title(" REBROADCASTING ")
        .borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_peer_versions(frame: &mut Frame, app: &App, area: Rect) {
    let report = &app.report;

    let header = Row::new(vec![header_cell("Version"), header_cell("Peers")])
        .height(1)
        .style(Style::default().fg(Color::White));

    let rows: Vec<Row> = report
        .peer_versions
        .iter()
        .map(|v| {
            Row::new(vec![
                Cell::from(v.version.clone()),
                Cell::from(format_count(v.count as u64)),
            ])
        })
        .collect();

    let table = Table::new(rows, [Constraint::Min(8), Constraint::Length(8)])
        .header(header)
        .block(
            Block::default()
                .title(format!(
                    " PEER VERSIONS ({}) ",
                    format_count(report.metrics.peer_count as u64)
                ))
                .borders(Borders::ALL),
        );

    frame.render_widget(table, area);
}

fn draw_blocks(frame: &mut Frame, app: &App, area: Rect) {
    let report = &app.report;

    let header = Row::new(vec![header_cell("Type"), header_cell("Blocks")])
        .height(1)
        .style(Style::default().fg(Color::White));

    let mut rows: Vec<Row> = report
        .blocks_by_type
        .iter()
        .map(|b| {
            Row::new(vec![
                Cell::from(b.block_type.clone()),
                Cell::from(format_count(b.count)),
            ])
        })
        .collect();
    rows.push(
        Row::new(vec![
            Cell::from("total"),
            Cell::from(format_count(report.metrics.total_blocks)),
        ])
        .style(Style::default().add_modifier(Modifier::BOLD)),
    );

    let table = Table::new(rows, [Constraint::Min(8), Constraint::Length(14)])
        .header(header)
        .block(Block::default().title(" BLOCKS BY TYPE ").borders(Borders::ALL));

    frame.render_widget(table, area);
}

fn draw_representatives(frame: &mut Frame, app: &App, area: Rect) {
    let report = &app.report;
    let online_weight = report.metrics.online_weight;

    let header = Row::new(vec![
        header_cell("#"),
        header_cell("Representative"),
        header_cell("Weight"),
        header_cell("Share"),
    ])
    .height(1)
    .style(Style::default().fg(Color::White));

    // Borders and header row
    let visible = area.height.saturating_sub(3) as usize;
    let threshold = report.metrics.rebroadcast_threshold;

    let rows: Vec<Row> = report
        .representatives
        .iter()
        .enumerate()
        .skip(app.rep_offset)
        .take(visible)
        .map(|(i, rep)| {
            let style = if rep.weight >= threshold {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let share = if online_weight > 0.0 {
                rep.weight / online_weight * 100.0
            } else {
                0.0
            };
            Row::new(vec![
                Cell::from(format!("{}", i + 1)),
                Cell::from(short_address(&rep.address, 12)),
                Cell::from(format_number(rep.weight, 0)),
                Cell::from(format_percent(share)),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Min(20),
            Constraint::Length(16),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(format!(
                " REPRESENTATIVES ({}-{} of {}) ",
                (app.rep_offset + 1).min(report.representatives.len()),
                (app.rep_offset + visible).min(report.representatives.len()),
                report.representatives.len()
            ))
            .borders(Borders::ALL),
    );

    frame.render_widget(table, area);
}

fn draw_footer(frame: &mut Frame, area: Rect) {
    let line = Line::from(vec![
        Span::styled("[Q]", Style::default().fg(Color::Cyan)),
        label(" Quit  "),
        Span::styled("[↑/↓]", Style::default().fg(Color::Cyan)),
        label(" Scroll  "),
        Span::styled("[PgUp/PgDn]", Style::default().fg(Color::Cyan)),
        label(" Page"),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
