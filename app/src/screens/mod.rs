//! Screen modules for the TUI.

pub mod agents;
pub mod bridge;
pub mod chat;
pub mod home;
pub mod settings;
pub mod wallets;

use crate::App;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Trait for TUI screens.
pub trait Screen {
    fn render(&self, frame: &mut Frame, area: Rect, app: &App);
}

/// Standard vertical split: title bar, content, footer.
pub fn screen_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(6),    // Content
            Constraint::Length(2), // Footer
        ])
        .split(area)
        .to_vec()
}

pub fn render_title(frame: &mut Frame, area: Rect, title: &str, subtitle: &str) {
    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", title),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled("│ ", Style::default().fg(Color::DarkGray)),
        Span::styled(subtitle.to_string(), Style::default().fg(Color::LightGreen)),
    ]);

    let title = Paragraph::new(line)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
    frame.render_widget(title, area);
}

/// Footer showing the latest error or status, falling back to key help.
pub fn render_footer(frame: &mut Frame, area: Rect, app: &App, help: &[(&str, &str)]) {
    let content = if let Some(err) = &app.error_message {
        Line::from(vec![
            Span::styled(" ✗ ", Style::default().fg(Color::Red)),
            Span::styled(err.as_str(), Style::default().fg(Color::Red)),
        ])
    } else if let Some(status) = &app.status_message {
        Line::from(vec![
            Span::styled(" ✓ ", Style::default().fg(Color::Green)),
            Span::styled(status.as_str(), Style::default().fg(Color::Green)),
        ])
    } else {
        let mut spans = Vec::new();
        for (i, (key, action)) in help.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw("  "));
            }
            spans.push(Span::styled(format!("[{}] ", key), Style::default().fg(Color::DarkGray)));
            spans.push(Span::styled(action.to_string(), Style::default().fg(Color::DarkGray)));
        }
        Line::from(spans)
    };

    frame.render_widget(Paragraph::new(content).alignment(Alignment::Center), area);
}

/// Bordered single-line text input.
pub fn input_box<'a>(value: &'a str, title: &'a str, focused: bool) -> Paragraph<'a> {
    let border = if focused { Color::LightGreen } else { Color::DarkGray };
    let cursor = if focused { "│" } else { "" };
    Paragraph::new(format!("{}{}", value, cursor))
        .style(Style::default().fg(Color::Cyan))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border))
                .title(Span::styled(format!(" {} ", title), Style::default().fg(Color::White))),
        )
}

/// Rectangle centered in `area` with the given percentage size.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

/// Modal dialog drawn over the current screen.
pub fn render_modal(frame: &mut Frame, area: Rect, title: &str, body: Vec<Line>, color: Color) {
    let rect = centered_rect(60, 40, area);
    frame.render_widget(Clear, rect);

    let modal = Paragraph::new(body)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .title(Span::styled(
                    format!(" {} ", title),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )),
        );
    frame.render_widget(modal, rect);
}

/// Truncate on a char boundary, adding an ellipsis.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
