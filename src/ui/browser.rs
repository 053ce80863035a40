//! Single-pane remote directory browser.

use std::collections::VecDeque;

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::controller::ConnectionState;
use crate::listing::{DirectoryEntry, DirectoryListing, EntryKind, format_size};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Text of one listing row.
pub fn entry_label(entry: &DirectoryEntry) -> String {
    match entry.kind {
        EntryKind::ParentMarker => "       ..".to_string(),
        EntryKind::Directory => format!("[DIR]  {}", entry.name),
        EntryKind::File { size } => format!("[FILE] {}  ({})", entry.name, format_size(size)),
    }
}

fn state_style(state: ConnectionState) -> Style {
    let color = match state {
        ConnectionState::Connected => Color::Green,
        ConnectionState::Connecting | ConnectionState::Disconnecting => Color::Yellow,
        ConnectionState::Disconnected => Color::Red,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Connection state, endpoint, current path, and a spinner while an
/// operation is running (`spinner` carries the tick count).
pub fn draw_header(
    f: &mut Frame,
    area: Rect,
    state: ConnectionState,
    endpoint: &str,
    listing: Option<&DirectoryListing>,
    spinner: Option<u64>,
) {
    let path = listing.map(|l| l.path().as_str()).unwrap_or("-");
    let mut spans = vec![
        Span::styled(format!(" {state} "), state_style(state)),
        Span::raw(format!("| {endpoint} | ")),
        Span::styled(
            path.to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
    ];
    if let Some(tick) = spinner {
        let frame = SPINNER[(tick % SPINNER.len() as u64) as usize];
        spans.push(Span::styled(
            format!("  {frame} working"),
            Style::default().fg(Color::Yellow),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" FTP Browser ")
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(header, area);
}

pub fn draw_listing(f: &mut Frame, area: Rect, listing: Option<&DirectoryListing>, selected: usize) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Remote ")
        .border_style(Style::default().fg(Color::Cyan));

    let Some(listing) = listing else {
        let empty = Paragraph::new(Line::from(Span::styled(
            "Not connected. Press 'c' to connect.",
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        f.render_widget(empty, area);
        return;
    };

    let items: Vec<ListItem> = listing
        .entries()
        .iter()
        .map(|entry| {
            let style = match entry.kind {
                EntryKind::Directory => Style::default().fg(Color::LightBlue),
                EntryKind::ParentMarker => Style::default().fg(Color::Gray),
                EntryKind::File { .. } => Style::default().fg(Color::White),
            };
            ListItem::new(Line::from(Span::styled(entry_label(entry), style)))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(Color::White).bg(Color::Cyan))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !listing.is_empty() {
        state.select(Some(selected.min(listing.len() - 1)));
    }
    f.render_stateful_widget(list, area, &mut state);
}

/// Most recent lines at the bottom; older ones scroll off the top.
pub fn draw_log(f: &mut Frame, area: Rect, log: &VecDeque<String>) {
    let visible = area.height.saturating_sub(2) as usize;
    let skip = log.len().saturating_sub(visible);
    let lines: Vec<Line> = log
        .iter()
        .skip(skip)
        .map(|l| Line::from(l.as_str()))
        .collect();

    let para = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(" Log "));
    f.render_widget(para, area);
}

/// Draw the footer showing available keybindings
pub fn draw_footer(f: &mut Frame, area: Rect, state: ConnectionState) {
    let footer_text = if state == ConnectionState::Connected {
        "↑↓/jk: Move | Enter: Open/Download | b: Back | u: Up | r: Reload | a: Analyze | c: Disconnect | q: Quit"
    } else {
        "c: Connect | q: Quit"
    };

    let footer = Paragraph::new(Line::from(vec![Span::styled(
        footer_text,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::DIM),
    )]))
    .block(Block::default().borders(Borders::ALL));

    f.render_widget(footer, area);
}
