//! API key settings: X credentials and Coinbase Developer Platform keys.

use crate::{
    app::{App, AppMessage, ScreenAction},
    client::ApiClient,
    screens::{render_footer, render_title, screen_layout, Screen},
    store::{
        CoinbaseKeys, LocalStore, XCredentials, ACCESS_TOKEN, ACCESS_TOKEN_SECRET, API_KEY,
        API_SECRET, BEARER_TOKEN, CDP_API_KEY, CDP_API_SECRET,
    },
};
use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tokio::sync::mpsc;

/// `(label, store key)` for each editable field, X keys first.
const FIELDS: [(&str, &str); 7] = [
    ("API Key", API_KEY),
    ("API Secret", API_SECRET),
    ("Access Token", ACCESS_TOKEN),
    ("Access Token Secret", ACCESS_TOKEN_SECRET),
    ("Bearer Token", BEARER_TOKEN),
    ("CDP API Key", CDP_API_KEY),
    ("CDP API Secret", CDP_API_SECRET),
];

/// Fields before this index belong to the X group.
const X_FIELD_COUNT: usize = 5;

fn mask(value: &str) -> String {
    let n = value.chars().count();
    if n <= 4 {
        "•".repeat(n)
    } else {
        let tail: String = value.chars().skip(n - 4).collect();
        format!("{}{}", "•".repeat(n - 4), tail)
    }
}

pub struct SettingsScreen {
    pub values: Vec<String>,
    pub focus: usize,
    pub saving: bool,
    pub error: Option<String>,
}

impl SettingsScreen {
    /// Prefill every field from the local store.
    pub fn from_store(store: &LocalStore) -> Self {
        Self {
            values: FIELDS
                .iter()
                .map(|(_, key)| store.get(key).unwrap_or_default().to_string())
                .collect(),
            focus: 0,
            saving: false,
            error: None,
        }
    }

    fn x_credentials(&self) -> XCredentials {
        XCredentials {
            api_key: self.values[0].trim().to_string(),
            api_secret: self.values[1].trim().to_string(),
            access_token: self.values[2].trim().to_string(),
            access_token_secret: self.values[3].trim().to_string(),
            bearer_token: self.values[4].trim().to_string(),
        }
    }

    fn coinbase_keys(&self) -> CoinbaseKeys {
        CoinbaseKeys {
            cdp_api_key: self.values[5].trim().to_string(),
            cdp_api_secret: self.values[6].trim().to_string(),
        }
    }

    pub fn handle_saved(&mut self) {
        self.saving = false;
    }

    /// Save the group the focused field belongs to, locally and on the backend.
    fn save_group(
        &mut self,
        store: &mut LocalStore,
        client: &ApiClient,
        tx: mpsc::Sender<AppMessage>,
    ) -> Result<()> {
        let client = client.clone();
        self.saving = true;

        if self.focus < X_FIELD_COUNT {
            let keys = self.x_credentials();
            keys.save_to(store)?;
            tokio::spawn(async move {
                let result = client.set_x_api_keys(&keys).await.and_then(|r| r.into_result());
                let msg = match result {
                    Ok(_) => AppMessage::KeysSaved("X API keys saved".to_string()),
                    Err(e) => AppMessage::KeysFailed(e.to_string()),
                };
                let _ = tx.send(msg).await;
            });
        } else {
            let keys = self.coinbase_keys();
            keys.save_to(store)?;
            tokio::spawn(async move {
                let result = client
                    .set_coinbase_api_keys(&keys)
                    .await
                    .and_then(|r| r.into_result());
                let msg = match result {
                    Ok(_) => AppMessage::KeysSaved("Coinbase API keys saved".to_string()),
                    Err(e) => AppMessage::KeysFailed(e.to_string()),
                };
                let _ = tx.send(msg).await;
            });
        }
        tracing::info!(field = FIELDS[self.focus].1, "api keys stored locally");
        Ok(())
    }

    pub fn handle_key(
        &mut self,
        key: KeyCode,
        store: &mut LocalStore,
        client: &ApiClient,
        tx: mpsc::Sender<AppMessage>,
    ) -> Result<ScreenAction> {
        self.error = None;
        match key {
            KeyCode::Char(c) => self.values[self.focus].push(c),
            KeyCode::Backspace => {
                self.values[self.focus].pop();
            }
            KeyCode::Tab | KeyCode::Down => self.focus = (self.focus + 1) % FIELDS.len(),
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = (self.focus + FIELDS.len() - 1) % FIELDS.len()
            }
            KeyCode::Enter if !self.saving => {
                if let Err(e) = self.save_group(store, client, tx) {
                    self.saving = false;
                    self.error = Some(format!("Failed to store keys: {}", e));
                }
            }
            KeyCode::Esc => return Ok(ScreenAction::GoHome),
            _ => {}
        }
        Ok(ScreenAction::None)
    }

    fn render_group(&self, frame: &mut Frame, area: Rect, title: &str, range: std::ops::Range<usize>) {
        let mut lines = vec![Line::from("")];
        for i in range {
            let focused = i == self.focus;
            let value = if focused {
                format!("{}│", self.values[i])
            } else {
                mask(&self.values[i])
            };
            let label_style = if focused {
                Style::default().fg(Color::LightGreen).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            lines.push(Line::from(vec![
                Span::styled(format!(" {:<22}", FIELDS[i].0), label_style),
                Span::styled(value, Style::default().fg(Color::Cyan)),
            ]));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(format!(" {} ", title), Style::default().fg(Color::White)));
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

impl Screen for SettingsScreen {
    fn render(&self, frame: &mut Frame, area: Rect, app: &App) {
        let chunks = screen_layout(area);
        let subtitle = if self.saving { "Saving..." } else { "API Keys" };
        render_title(frame, chunks[0], "SETTINGS", subtitle);

        let groups = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(X_FIELD_COUNT as u16 + 3),
                Constraint::Length((FIELDS.len() - X_FIELD_COUNT) as u16 + 3),
                Constraint::Min(0),
            ])
            .split(chunks[1]);
        self.render_group(frame, groups[0], "X (Twitter)", 0..X_FIELD_COUNT);
        self.render_group(frame, groups[1], "Coinbase Developer Platform", X_FIELD_COUNT..FIELDS.len());

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
            &[("Tab", "Next field"), ("Enter", "Save group"), ("Esc", "Home")],
        );
    }
}
