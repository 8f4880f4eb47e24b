//! Rendering of the browser: search box, result table, detail pane, download
//! path, status line and the confirmation dialog.

use idgames_core::api::Record;
use idgames_core::browser::{BrowserMode, BrowserState, DownloadProgress};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};

use super::app::{App, Focus};
use super::highlight::highlight_textfile;
use crate::output::{format_size, star_bar};

const CONFIRM_HEIGHT: u16 = 5;
const CONFIRM_WIDTH: u16 = 60;
const CONFIRM_X_OFFSET: u16 = 8;

fn label_style() -> Style {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}

fn focused_border(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn to_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

pub fn draw(frame: &mut Frame, app: &App) {
    let [search_area, body_area, path_area, status_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(5),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let state = app.controller().state();
    draw_search(frame, app, search_area);

    let detail = match state.mode() {
        BrowserMode::Empty | BrowserMode::Listed => None,
        _ => state.selected_record(),
    };
    let table_area = if let Some(record) = detail {
        let [table_area, detail_area] =
            Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)]).areas(body_area);
        draw_detail(frame, app, record, detail_area);
        table_area
    } else {
        body_area
    };
    let offset = draw_results(frame, app, table_area);

    draw_download_path(frame, app, path_area);
    draw_status(frame, state, status_area);

    if state.mode() == BrowserMode::ConfirmPending {
        if let (Some(row), Some(record)) = (state.confirm_row(), state.confirm_record()) {
            draw_confirm(frame, record, row, offset, table_area, body_area);
        }
    }
}

fn draw_search(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus() == Focus::Search;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(focused_border(focused))
        .title(" Search title/author (empty for latest) ");
    frame.render_widget(Paragraph::new(app.input()).block(block), area);

    if focused && app.controller().state().mode() != BrowserMode::ConfirmPending {
        let x = area.x + 1 + to_u16(app.input().chars().count());
        frame.set_cursor_position((x.min(area.right().saturating_sub(2)), area.y + 1));
    }
}

/// Draws the result table and returns the first visible row.
fn draw_results(frame: &mut Frame, app: &App, area: Rect) -> usize {
    let state = app.controller().state();
    let focused = app.focus() == Focus::Results;

    let mut title = format!(" Results ({}) ", state.records().len());
    if state.is_loading() {
        title.push_str("loading... ");
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(focused_border(focused))
        .title(title);

    let header = Row::new(["Rating", "Title", "Author", "Date"]).style(label_style());
    let rows = state.records().iter().map(|record| {
        Row::new([
            Cell::from(star_bar(record)),
            Cell::from(record.title.clone()),
            Cell::from(record.author.clone()),
            Cell::from(record.date.clone()),
        ])
    });
    let widths = [
        Constraint::Length(6),
        Constraint::Percentage(50),
        Constraint::Percentage(30),
        Constraint::Length(10),
    ];
    let highlight = if focused {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default().bg(Color::DarkGray)
    };
    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(highlight);

    let visible_rows = usize::from(area.height.saturating_sub(3)).max(1);
    let offset = app.cursor().saturating_sub(visible_rows - 1);
    let mut table_state = TableState::default().with_offset(offset);
    if !state.records().is_empty() {
        table_state.select(Some(app.cursor()));
    }
    frame.render_stateful_widget(table, area, &mut table_state);
    offset
}

fn detail_lines(record: &Record) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            record.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![Span::styled("by ", label_style()), Span::raw(record.author.clone())]),
        Line::from(format!(
            "{} {:.2} ({} votes)  {}  {}",
            star_bar(record),
            record.rating,
            record.votes,
            record.date,
            format_size(record.size)
        )),
        Line::default(),
    ];

    if !record.has_detail() {
        lines.push(Line::from(Span::styled(
            "Loading details...",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
        return lines;
    }

    lines.extend(highlight_textfile(&record.textfile));
    if !record.reviews.is_empty() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            format!("Reviews ({})", record.reviews.len()),
            label_style(),
        )));
        for review in &record.reviews {
            lines.push(Line::from(vec![
                Span::styled(format!("[{}] {}: ", review.vote, review.author()), label_style()),
                Span::raw(review.text.clone()),
            ]));
        }
    }
    lines
}

fn draw_detail(frame: &mut Frame, app: &App, record: &Record, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", record.archive_path()));
    let paragraph = Paragraph::new(detail_lines(record))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll(), 0));
    frame.render_widget(paragraph, area);
}

fn draw_download_path(frame: &mut Frame, app: &App, area: Rect) {
    let target = app.controller().download_path_preview().map_or_else(
        || app.controller().download_dir().display().to_string(),
        |path| path.display().to_string(),
    );
    let line = Line::from(vec![Span::styled("Download to: ", label_style()), Span::raw(target)]);
    frame.render_widget(Paragraph::new(line), area);
}

fn progress_text(download: &DownloadProgress) -> String {
    let mirror = download.mirror.as_deref().unwrap_or("connecting");
    match (download.expected, download.ratio()) {
        (Some(total), Some(ratio)) => format!(
            "Downloading {} from {mirror}: {} / {} ({:.0}%)",
            download.filename,
            format_size(download.bytes),
            format_size(total),
            ratio * 100.0
        ),
        _ => format!(
            "Downloading {} from {mirror}: {}",
            download.filename,
            format_size(download.bytes)
        ),
    }
}

fn draw_status(frame: &mut Frame, state: &BrowserState, area: Rect) {
    let text = if let Some(download) = state.download() {
        progress_text(download)
    } else if state.status().is_empty() {
        "/ search  enter open  d download  esc back  q quit".to_string()
    } else {
        state.status().to_string()
    };
    let style = match state.last_download() {
        Some(Err(_)) if state.download().is_none() => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::Gray),
    };
    frame.render_widget(Paragraph::new(Span::styled(text, style)), area);
}

/// Places the dialog just below the row being confirmed, or above it when it
/// would run off the body.
fn confirm_area(row: usize, offset: usize, table_area: Rect, body_area: Rect) -> Rect {
    let row_y = table_area.y + 2 + to_u16(row.saturating_sub(offset));
    let below = row_y + 1;
    let y = if below + CONFIRM_HEIGHT > body_area.bottom() {
        row_y.saturating_sub(CONFIRM_HEIGHT).max(body_area.y)
    } else {
        below
    };
    let x = table_area.x + CONFIRM_X_OFFSET.min(table_area.width / 4);
    let width = CONFIRM_WIDTH.min(body_area.right().saturating_sub(x));
    Rect::new(x, y, width, CONFIRM_HEIGHT.min(body_area.height))
}

fn draw_confirm(
    frame: &mut Frame,
    record: &Record,
    row: usize,
    offset: usize,
    table_area: Rect,
    body_area: Rect,
) {
    let area = confirm_area(row, offset, table_area, body_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .title(format!(" Download {}? ", record.title));
    let lines = vec![
        Line::from(record.archive_path()),
        Line::default(),
        Line::from(vec![
            Span::styled("[y]", label_style()),
            Span::raw(" Download   "),
            Span::styled("[n]", label_style()),
            Span::raw(" Cancel"),
        ]),
    ];
    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
