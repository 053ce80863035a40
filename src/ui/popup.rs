use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

const DISMISS_HINT: &str = "Press Enter or Esc to dismiss";

pub fn draw_error_popup(area: Rect, message: &str, frame: &mut ratatui::Frame<'_>) {
    draw_message_popup(area, "Error", message, Color::Red, frame);
}

pub fn draw_info_popup(area: Rect, message: &str, frame: &mut ratatui::Frame<'_>) {
    draw_message_popup(area, "Info", message, Color::Green, frame);
}

/// Centered box, full width minus a margin, tall enough for the wrapped
/// message plus the dismiss hint.
fn popup_rect(area: Rect, message: &str) -> Rect {
    let width = area.width.saturating_sub(4);
    let inner_w = width.saturating_sub(2).max(1);
    let message_lines: u16 = message
        .lines()
        .map(|l| (l.chars().count() as u16).div_ceil(inner_w).max(1))
        .sum();
    // borders + blank line + hint
    let height = (message_lines.max(1) + 4).min(area.height.saturating_sub(2));
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

fn draw_message_popup(
    area: Rect,
    title: &str,
    message: &str,
    color: Color,
    frame: &mut ratatui::Frame<'_>,
) {
    let popup = popup_rect(area, message);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(Line::from(Span::styled(
            title.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
    let mut lines: Vec<Line> = message
        .lines()
        .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(color))))
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        DISMISS_HINT,
        Style::default().fg(Color::White).add_modifier(Modifier::DIM),
    )));
    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(body, popup);
}
