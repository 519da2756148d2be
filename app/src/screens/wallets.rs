//! CDP wallet management screen.

use crate::{
    app::{App, AppMessage, ScreenAction},
    client::{ApiClient, ApiError, Wallet},
    screens::{input_box, render_footer, render_modal, render_title, screen_layout, Screen},
    wallets::{self, Network, WalletPanel},
};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use std::future::Future;
use std::path::PathBuf;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletMode {
    List,
    Create,
    Restore,
    ConfirmDelete,
}

/// Run a wallet mutation and report the refreshed list.
fn spawn_mutation<F>(tx: mpsc::Sender<AppMessage>, notice: String, flow: F)
where
    F: Future<Output = Result<Vec<Wallet>, ApiError>> + Send + 'static,
{
    tokio::spawn(async move {
        let msg = match flow.await {
            Ok(wallets) => AppMessage::WalletsChanged { notice, wallets },
            Err(e) => AppMessage::WalletFailed(e.to_string()),
        };
        let _ = tx.send(msg).await;
    });
}

pub struct WalletsScreen {
    pub panel: WalletPanel,
    pub mode: WalletMode,
    pub cursor: usize,
    pub name_input: String,
    pub network: Network,
    pub path_input: String,
    pub confirm_input: String,
    pub loading: bool,
    pub error: Option<String>,
}

impl WalletsScreen {
    pub fn new() -> Self {
        Self {
            panel: WalletPanel::new(),
            mode: WalletMode::List,
            cursor: 0,
            name_input: String::new(),
            network: Network::BaseSepolia,
            path_input: String::new(),
            confirm_input: String::new(),
            loading: false,
            error: None,
        }
    }

    fn selected_wallet(&self) -> Option<&Wallet> {
        self.panel.wallets.get(self.cursor)
    }

    pub fn handle_wallets(&mut self, wallets: Vec<Wallet>) {
        self.loading = false;
        self.panel.apply_list(wallets);
        self.cursor = self.cursor.min(self.panel.wallets.len().saturating_sub(1));
    }

    pub fn handle_failure(&mut self, error: String) {
        self.loading = false;
        self.error = Some(error);
    }

    /// Fetch the list in the background.
    pub fn start_fetch(&mut self, client: ApiClient, tx: mpsc::Sender<AppMessage>) {
        self.loading = true;
        tokio::spawn(async move {
            let msg = match client.list_wallets().await {
                Ok(wallets) => AppMessage::WalletsLoaded(wallets),
                Err(e) => AppMessage::WalletFailed(e.to_string()),
            };
            let _ = tx.send(msg).await;
        });
    }

    pub fn handle_key(
        &mut self,
        key: KeyCode,
        client: &ApiClient,
        download_dir: PathBuf,
        tx: mpsc::Sender<AppMessage>,
    ) -> ScreenAction {
        self.error = None;
        match self.mode {
            WalletMode::List => return self.handle_list_key(key, client, download_dir, tx),
            WalletMode::Create => match key {
                KeyCode::Char(c) => self.name_input.push(c),
                KeyCode::Backspace => {
                    self.name_input.pop();
                }
                KeyCode::Tab => self.network = self.network.next(),
                KeyCode::Enter if !self.loading => {
                    if self.name_input.trim().is_empty() {
                        self.error = Some("Please enter a wallet name".to_string());
                        return ScreenAction::None;
                    }
                    let client = client.clone();
                    let name = self.name_input.trim().to_string();
                    let network = self.network;
                    self.loading = true;
                    self.mode = WalletMode::List;
                    spawn_mutation(tx, format!("Wallet '{}' created", name), async move {
                        wallets::create_wallet(&client, &name, network).await
                    });
                }
                KeyCode::Esc => self.mode = WalletMode::List,
                _ => {}
            },
            WalletMode::Restore => match key {
                KeyCode::Char(c) => self.path_input.push(c),
                KeyCode::Backspace => {
                    self.path_input.pop();
                }
                KeyCode::Enter if !self.loading && !self.path_input.trim().is_empty() => {
                    let client = client.clone();
                    let path = PathBuf::from(self.path_input.trim());
                    self.loading = true;
                    self.mode = WalletMode::List;
                    spawn_mutation(tx, "Wallet restored".to_string(), async move {
                        wallets::restore_wallet(&client, &path).await
                    });
                }
                KeyCode::Esc => self.mode = WalletMode::List,
                _ => {}
            },
            WalletMode::ConfirmDelete => match key {
                KeyCode::Char(c) => self.confirm_input.push(c),
                KeyCode::Backspace => {
                    self.confirm_input.pop();
                }
                KeyCode::Enter if !self.loading => {
                    let typed = std::mem::take(&mut self.confirm_input);
                    match self.panel.confirm_delete(&typed) {
                        Ok(wallet_id) => {
                            let client = client.clone();
                            self.loading = true;
                            self.mode = WalletMode::List;
                            let notice = format!("Wallet '{}' deleted", wallet_id);
                            spawn_mutation(tx, notice, async move {
                                wallets::delete_wallet(&client, &wallet_id, &typed).await
                            });
                        }
                        Err(e) => self.error = Some(e.to_string()),
                    }
                }
                KeyCode::Esc => {
                    self.panel.cancel_delete();
                    self.confirm_input.clear();
                    self.mode = WalletMode::List;
                }
                _ => {}
            },
        }
        ScreenAction::None
    }

    fn handle_list_key(
        &mut self,
        key: KeyCode,
        client: &ApiClient,
        download_dir: PathBuf,
        tx: mpsc::Sender<AppMessage>,
    ) -> ScreenAction {
        match key {
            KeyCode::Char('j') | KeyCode::Down => {
                if self.cursor + 1 < self.panel.wallets.len() {
                    self.cursor += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Char('n') => {
                self.name_input.clear();
                self.mode = WalletMode::Create;
            }
            KeyCode::Char('r') => {
                self.path_input.clear();
                self.mode = WalletMode::Restore;
            }
            KeyCode::Char('l') if !self.loading => self.start_fetch(client.clone(), tx),
            KeyCode::Char('e') if !self.loading => {
                let Some(wallet_id) = self.selected_wallet().map(|w| w.wallet_id.clone()) else {
                    return ScreenAction::None;
                };
                let client = client.clone();
                tokio::spawn(async move {
                    let msg = match wallets::export_wallet(&client, &wallet_id, &download_dir).await
                    {
                        Ok(path) => AppMessage::WalletExported(path),
                        Err(e) => AppMessage::WalletFailed(e.to_string()),
                    };
                    let _ = tx.send(msg).await;
                });
            }
            KeyCode::Char('d') => {
                if let Some(wallet_id) = self.selected_wallet().map(|w| w.wallet_id.clone()) {
                    self.panel.request_delete(&wallet_id);
                    self.confirm_input.clear();
                    self.mode = WalletMode::ConfirmDelete;
                }
            }
            KeyCode::Esc => return ScreenAction::GoHome,
            _ => {}
        }
        ScreenAction::None
    }

    fn render_list(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(
                format!(" Wallets ({}) ", self.panel.wallets.len()),
                Style::default().fg(Color::White),
            ));

        if self.panel.wallets.is_empty() {
            let text = if self.loading {
                "  Loading wallets..."
            } else {
                "  No wallets yet. Press [n] to create one or [r] to restore."
            };
            let empty = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(text, Style::default().fg(Color::DarkGray))),
            ])
            .block(block);
            frame.render_widget(empty, area);
            return;
        }

        let items: Vec<ListItem> = self
            .panel
            .wallets
            .iter()
            .map(|w| {
                ListItem::new(Line::from(vec![
                    Span::styled(w.wallet_id.clone(), Style::default().fg(Color::White)),
                    Span::styled(format!("  {}", w.network_id), Style::default().fg(Color::DarkGray)),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(Color::LightGreen)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");
        let mut state = ListState::default().with_selected(Some(self.cursor));
        frame.render_stateful_widget(list, area, &mut state);
    }
}

impl Screen for WalletsScreen {
    fn render(&self, frame: &mut Frame, area: Rect, app: &App) {
        let chunks = screen_layout(area);
        let subtitle = match self.mode {
            WalletMode::List if self.loading => "Working...",
            WalletMode::List => "Coinbase Developer Platform",
            WalletMode::Create => "Create Wallet",
            WalletMode::Restore => "Restore Wallet",
            WalletMode::ConfirmDelete => "Delete Wallet",
        };
        render_title(frame, chunks[0], "CDP WALLETS", subtitle);

        match self.mode {
            WalletMode::Create => {
                let inner = Layout::default()
                    .direction(Direction::Vertical)
                    .margin(1)
                    .constraints([Constraint::Length(3), Constraint::Length(2), Constraint::Min(1)])
                    .split(chunks[1]);
                frame.render_widget(input_box(&self.name_input, "Wallet name", true), inner[0]);
                let network = Paragraph::new(Line::from(vec![
                    Span::styled(" Network: ", Style::default().fg(Color::DarkGray)),
                    Span::styled(self.network.id(), Style::default().fg(Color::Cyan)),
                    Span::styled("  [Tab] change", Style::default().fg(Color::DarkGray)),
                ]));
                frame.render_widget(network, inner[1]);
            }
            WalletMode::Restore => {
                let inner = Layout::default()
                    .direction(Direction::Vertical)
                    .margin(1)
                    .constraints([Constraint::Length(3), Constraint::Length(2), Constraint::Min(1)])
                    .split(chunks[1]);
                frame.render_widget(
                    input_box(&self.path_input, "Exported wallet file", true),
                    inner[0],
                );
                let hint = Paragraph::new(Span::styled(
                    " A JSON file previously exported from this screen.",
                    Style::default().fg(Color::DarkGray),
                ));
                frame.render_widget(hint, inner[1]);
            }
            WalletMode::List | WalletMode::ConfirmDelete => self.render_list(frame, chunks[1]),
        }

        if self.mode == WalletMode::ConfirmDelete {
            let target = self.panel.pending_delete.as_deref().unwrap_or_default();
            let mut body = vec![
                Line::from(""),
                Line::from(Span::styled(
                    "This cannot be undone. Export the wallet first if you need it.",
                    Style::default().fg(Color::White),
                )),
                Line::from(""),
                Line::from(vec![
                    Span::styled("Type ", Style::default().fg(Color::DarkGray)),
                    Span::styled(target, Style::default().fg(Color::Yellow)),
                    Span::styled(" to confirm:", Style::default().fg(Color::DarkGray)),
                ]),
                Line::from(Span::styled(
                    format!("> {}│", self.confirm_input),
                    Style::default().fg(Color::Cyan),
                )),
            ];
            if let Some(err) = &self.error {
                body.push(Line::from(""));
                body.push(Line::from(Span::styled(err.as_str(), Style::default().fg(Color::Red))));
            }
            render_modal(frame, area, "Delete Wallet", body, Color::Red);
        }

        if let (Some(err), false) = (&self.error, self.mode == WalletMode::ConfirmDelete) {
            let line = Paragraph::new(Line::from(vec![
                Span::styled(" ✗ ", Style::default().fg(Color::Red)),
                Span::styled(err.as_str(), Style::default().fg(Color::Red)),
            ]));
            frame.render_widget(line, chunks[2]);
            return;
        }

        let help: &[(&str, &str)] = match self.mode {
            WalletMode::List => &[
                ("n", "New"),
                ("r", "Restore"),
                ("e", "Export"),
                ("d", "Delete"),
                ("l", "Reload"),
                ("Esc", "Home"),
            ],
            WalletMode::Create => &[("Enter", "Create"), ("Tab", "Network"), ("Esc", "Cancel")],
            WalletMode::Restore => &[("Enter", "Restore"), ("Esc", "Cancel")],
            WalletMode::ConfirmDelete => &[("Enter", "Delete"), ("Esc", "Cancel")],
        };
        render_footer(frame, chunks[2], app, help);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(id: &str) -> Wallet {
        Wallet {
            wallet_id: id.to_string(),
            network_id: "base-sepolia".to_string(),
        }
    }

    #[tokio::test]
    async fn mismatched_confirmation_stays_in_dialog() {
        let (tx, mut rx) = mpsc::channel(4);
        let client = ApiClient::new("http://127.0.0.1:9");
        let mut screen = WalletsScreen::new();
        screen.handle_wallets(vec![wallet("main")]);

        screen.handle_key(KeyCode::Char('d'), &client, PathBuf::from("."), tx.clone());
        assert_eq!(screen.mode, WalletMode::ConfirmDelete);

        for c in "Main".chars() {
            screen.handle_key(KeyCode::Char(c), &client, PathBuf::from("."), tx.clone());
        }
        screen.handle_key(KeyCode::Enter, &client, PathBuf::from("."), tx.clone());

        assert_eq!(screen.mode, WalletMode::ConfirmDelete);
        assert_eq!(screen.error.as_deref(), Some("Wallet ID does not match"));
        assert_eq!(screen.panel.pending_delete.as_deref(), Some("main"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn cursor_clamps_to_new_list() {
        let mut screen = WalletsScreen::new();
        screen.handle_wallets(vec![wallet("a"), wallet("b"), wallet("c")]);
        screen.cursor = 2;
        screen.handle_wallets(vec![wallet("a")]);
        assert_eq!(screen.cursor, 0);
        assert_eq!(screen.selected_wallet().map(|w| w.wallet_id.as_str()), Some("a"));
    }
}
