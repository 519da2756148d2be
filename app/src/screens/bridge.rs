//! Base bridge form.

use crate::{
    app::{App, AppMessage, ScreenAction},
    bridge::{BridgeForm, BASE_TOKENS},
    client::ApiClient,
    screens::{input_box, render_footer, render_title, screen_layout, Screen},
};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeField {
    Token,
    Destination,
    Amount,
}

impl BridgeField {
    fn next(self) -> Self {
        match self {
            BridgeField::Token => BridgeField::Destination,
            BridgeField::Destination => BridgeField::Amount,
            BridgeField::Amount => BridgeField::Token,
        }
    }
}

pub struct BridgeScreen {
    pub form: BridgeForm,
    pub field: BridgeField,
    pub submitting: bool,
    pub error: Option<String>,
}

impl BridgeScreen {
    pub fn new() -> Self {
        Self {
            form: BridgeForm::default(),
            field: BridgeField::Amount,
            submitting: false,
            error: None,
        }
    }

    pub fn handle_done(&mut self) {
        self.submitting = false;
    }

    pub fn handle_key(
        &mut self,
        key: KeyCode,
        client: &ApiClient,
        tx: mpsc::Sender<AppMessage>,
    ) -> ScreenAction {
        self.error = None;
        match (self.field, key) {
            (_, KeyCode::Tab) | (_, KeyCode::Down) => self.field = self.field.next(),
            (BridgeField::Token, KeyCode::Right) => self.form.next_token(),
            (BridgeField::Token, KeyCode::Left) => self.form.prev_token(),
            (BridgeField::Destination, KeyCode::Left | KeyCode::Right) => {
                self.form.destination = self.form.destination.toggle()
            }
            (BridgeField::Amount, KeyCode::Char(c)) if c.is_ascii_digit() || c == '.' => {
                self.form.amount.push(c)
            }
            (BridgeField::Amount, KeyCode::Backspace) => {
                self.form.amount.pop();
            }
            (_, KeyCode::Enter) if !self.submitting => match self.form.to_request() {
                Ok(req) => {
                    self.submitting = true;
                    let client = client.clone();
                    tracing::info!(asset = %req.asset, amount = req.amount, destination = req.destination_bridge, "bridging");
                    tokio::spawn(async move {
                        let msg = match client.bridge(&req).await {
                            Ok(message) => AppMessage::BridgeDone(message),
                            Err(e) => AppMessage::BridgeFailed(e.to_string()),
                        };
                        let _ = tx.send(msg).await;
                    });
                }
                Err(e) => self.error = Some(e.to_string()),
            },
            (_, KeyCode::Esc) => return ScreenAction::GoHome,
            _ => {}
        }
        ScreenAction::None
    }
}

impl Screen for BridgeScreen {
    fn render(&self, frame: &mut Frame, area: Rect, app: &App) {
        let chunks = screen_layout(area);
        let subtitle = if self.submitting { "Bridging..." } else { "Move tokens off Base" };
        render_title(frame, chunks[0], "BASE BRIDGE", subtitle);

        let inner = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Token
                Constraint::Length(3), // Destination
                Constraint::Length(3), // Amount
                Constraint::Min(1),
            ])
            .split(chunks[1]);

        let selector = |label: &str, value: String, focused: bool| {
            let border = if focused { Color::LightGreen } else { Color::DarkGray };
            let arrows = if focused { "◀ ▶" } else { "" };
            Paragraph::new(Line::from(vec![
                Span::styled(value, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                Span::styled(format!("  {}", arrows), Style::default().fg(Color::DarkGray)),
            ]))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border))
                    .title(Span::styled(format!(" {} ", label), Style::default().fg(Color::White))),
            )
        };

        let (symbol, name) = BASE_TOKENS[self.form.token % BASE_TOKENS.len()];
        frame.render_widget(
            selector(
                "Token",
                format!("{} ({})", symbol.to_uppercase(), name),
                self.field == BridgeField::Token,
            ),
            inner[0],
        );
        frame.render_widget(
            selector(
                "Destination",
                format!(
                    "{} (chain {})",
                    self.form.destination.name(),
                    self.form.destination.chain_id()
                ),
                self.field == BridgeField::Destination,
            ),
            inner[1],
        );
        frame.render_widget(
            input_box(&self.form.amount, "Amount", self.field == BridgeField::Amount),
            inner[2],
        );

        if let Some(err) = &self.error {
            let line = Paragraph::new(Line::from(vec![
                Span::styled(" ✗ ", Style::default().fg(Color::Red)),
                Span::styled(err.as_str(), Style::default().fg(Color::Red)),
            ]));
            frame.render_widget(line, chunks[2]);
            return;
        }

        render_footer(
            frame,
            chunks[2],
            app,
            &[("Tab", "Next field"), ("←/→", "Change"), ("Enter", "Bridge"), ("Esc", "Home")],
        );
    }
}
