//! Application state machine.

use crate::{
    chat::ChatContext,
    client::{AgentCatalog, ApiClient, ApiError, Wallet},
    config::AppConfig,
    message::{ChatMessage, ClaimTransaction},
    screens::{
        agents::AgentsScreen, bridge::BridgeScreen, chat::ChatScreen, home::HomeScreen,
        render_modal, settings::SettingsScreen, wallets::WalletsScreen, Screen,
    },
    store::LocalStore,
    swap::SwapPlan,
};
use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
    Frame,
};
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Messages for async operations.
#[derive(Debug, Clone)]
pub enum AppMessage {
    /// Fresh chat history from the server
    HistoryLoaded(Vec<ChatMessage>),
    /// The backend could not be reached
    BackendUnreachable(String),
    /// Wallet list fetched
    WalletsLoaded(Vec<Wallet>),
    /// A wallet was created, restored or deleted; carries the new list
    WalletsChanged { notice: String, wallets: Vec<Wallet> },
    /// Wallet export written to disk
    WalletExported(PathBuf),
    WalletFailed(String),
    AgentsLoaded(AgentCatalog),
    /// Selection saved; `reload` when the backend applied it
    AgentsSaved { reload: bool },
    AgentsFailed(String),
    TweetSent,
    TweetRegenerated(String),
    TweetFailed(String),
    /// Next transaction to sign for a swap proposal
    SwapPlanned(SwapPlan),
    ClaimPrepared(Vec<ClaimTransaction>),
    KeysSaved(String),
    KeysFailed(String),
    BridgeDone(String),
    BridgeFailed(String),
    /// Error occurred
    Error(String),
}

impl AppMessage {
    /// Outcome of any flow that ends with a history fetch.
    pub fn from_history(result: Result<Vec<ChatMessage>, ApiError>) -> Self {
        match result {
            Ok(history) => AppMessage::HistoryLoaded(history),
            Err(e) => AppMessage::from_chat_error(e),
        }
    }

    /// A failed chat page request. Anything past local validation blocks the
    /// page until the user retries or dismisses it.
    pub fn from_chat_error(e: ApiError) -> Self {
        match e {
            ApiError::InvalidInput(_) | ApiError::MissingCredential(_) => {
                AppMessage::Error(e.to_string())
            }
            e => AppMessage::BackendUnreachable(e.to_string()),
        }
    }
}

/// Application screen state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppScreen {
    Home,
    Chat,
    Wallets,
    Agents,
    Settings,
    Bridge,
}

/// Action returned from screen handlers.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenAction {
    None,
    GoHome,
    OpenBridge,
}

/// Result dialog shown over the current screen until dismissed.
#[derive(Debug, Clone)]
pub struct Notice {
    pub title: String,
    pub body: String,
    pub success: bool,
}

/// Main application state.
pub struct App {
    pub config: AppConfig,
    pub store: LocalStore,
    pub client: ApiClient,
    pub screen: AppScreen,
    pub quit: bool,

    // Screen states
    pub home: HomeScreen,
    pub chat: ChatScreen,
    pub wallets: WalletsScreen,
    pub agents: AgentsScreen,
    pub settings: SettingsScreen,
    pub bridge: BridgeScreen,

    // Transient state
    pub status_message: Option<String>,
    pub error_message: Option<String>,
    pub notice: Option<Notice>,
}

impl App {
    pub fn new(config: AppConfig, store: LocalStore) -> Self {
        let client = ApiClient::new(config.server_url.clone());
        let settings = SettingsScreen::from_store(&store);

        Self {
            config,
            store,
            client,
            screen: AppScreen::Home,
            quit: false,
            home: HomeScreen::new(),
            chat: ChatScreen::new(),
            wallets: WalletsScreen::new(),
            agents: AgentsScreen::new(),
            settings,
            bridge: BridgeScreen::new(),
            status_message: None,
            error_message: None,
            notice: None,
        }
    }

    /// Wallet context for chat and swap requests.
    pub fn chat_context(&self) -> ChatContext {
        ChatContext {
            chain_id: self.config.chain_id,
            wallet_address: self.config.wallet_address_or_empty().to_string(),
        }
    }

    /// Load the history, warm up the agent catalog and list wallets.
    pub fn init_session(&mut self, tx: mpsc::Sender<AppMessage>) {
        let client = self.client.clone();
        let history_tx = tx.clone();
        self.chat.pending = true;
        tokio::spawn(async move {
            let result = client.get_messages_history().await;
            let _ = history_tx.send(AppMessage::from_history(result)).await;
        });

        self.agents.start_fetch(self.client.clone(), tx.clone());
        self.wallets.start_fetch(self.client.clone(), tx);
    }

    /// Rebuild every screen from server state, as after an agent change.
    pub fn reload(&mut self, tx: mpsc::Sender<AppMessage>) {
        tracing::info!("reloading session");
        self.chat = ChatScreen::new();
        self.wallets = WalletsScreen::new();
        self.agents = AgentsScreen::new();
        self.settings = SettingsScreen::from_store(&self.store);
        self.bridge = BridgeScreen::new();
        self.notice = None;
        self.init_session(tx);
    }

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        match self.screen {
            AppScreen::Home => self.home.render(frame, area, self),
            AppScreen::Chat => self.chat.render(frame, area, self),
            AppScreen::Wallets => self.wallets.render(frame, area, self),
            AppScreen::Agents => self.agents.render(frame, area, self),
            AppScreen::Settings => self.settings.render(frame, area, self),
            AppScreen::Bridge => self.bridge.render(frame, area, self),
        }

        if self.chat.state.backend_unreachable {
            let body = vec![
                Line::from(""),
                Line::from(Span::styled(
                    format!("Request to the agents at {} failed:", self.client.base_url()),
                    Style::default().fg(Color::White),
                )),
                Line::from(Span::styled(
                    self.chat.state.backend_error.as_str(),
                    Style::default().fg(Color::Yellow),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Make sure the backend is running, then retry.",
                    Style::default().fg(Color::DarkGray),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "[r] Retry  [Esc] Dismiss",
                    Style::default().fg(Color::DarkGray),
                )),
            ];
            render_modal(frame, area, "Backend Unreachable", body, Color::Red);
        } else if let Some(notice) = &self.notice {
            let color = if notice.success { Color::Green } else { Color::Red };
            let mut body = vec![Line::from("")];
            body.extend(
                notice
                    .body
                    .lines()
                    .map(|l| Line::from(Span::styled(l, Style::default().fg(Color::White)))),
            );
            body.push(Line::from(""));
            body.push(Line::from(Span::styled(
                "[Enter] OK",
                Style::default().fg(Color::DarkGray),
            )));
            render_modal(frame, area, &notice.title, body, color);
        }
    }

    pub async fn handle_key(&mut self, key: KeyCode, tx: mpsc::Sender<AppMessage>) -> Result<()> {
        // Clear error message on any key
        self.error_message = None;

        if self.chat.state.backend_unreachable {
            match key {
                KeyCode::Char('r') => {
                    self.chat.state.dismiss_unreachable();
                    self.init_session(tx);
                }
                KeyCode::Esc | KeyCode::Enter => self.chat.state.dismiss_unreachable(),
                _ => {}
            }
            return Ok(());
        }

        if self.notice.is_some() {
            if matches!(key, KeyCode::Enter | KeyCode::Esc) {
                self.notice = None;
            }
            return Ok(());
        }

        let action = match self.screen {
            AppScreen::Home => {
                self.handle_home_key(key, tx);
                ScreenAction::None
            }
            AppScreen::Chat => {
                let ctx = self.chat_context();
                self.chat.handle_key(key, ctx, &self.client, &self.store, tx)
            }
            AppScreen::Wallets => {
                let download_dir = self.config.download_dir();
                self.wallets.handle_key(key, &self.client, download_dir, tx)
            }
            AppScreen::Agents => self.agents.handle_key(key, &self.client, tx),
            AppScreen::Settings => {
                self.settings
                    .handle_key(key, &mut self.store, &self.client, tx)?
            }
            AppScreen::Bridge => self.bridge.handle_key(key, &self.client, tx),
        };
        self.handle_screen_action(action);
        Ok(())
    }

    fn handle_screen_action(&mut self, action: ScreenAction) {
        match action {
            ScreenAction::None => {}
            ScreenAction::GoHome => {
                self.status_message = None;
                self.screen = AppScreen::Home;
            }
            ScreenAction::OpenBridge => {
                self.screen = AppScreen::Bridge;
            }
        }
    }

    fn handle_home_key(&mut self, key: KeyCode, tx: mpsc::Sender<AppMessage>) {
        match key {
            KeyCode::Char('1') => self.screen = AppScreen::Chat,
            KeyCode::Char('2') => {
                self.screen = AppScreen::Wallets;
                self.wallets.start_fetch(self.client.clone(), tx);
            }
            KeyCode::Char('3') => {
                self.screen = AppScreen::Agents;
                if self.agents.selection.available.is_empty() {
                    self.agents.start_fetch(self.client.clone(), tx);
                }
            }
            KeyCode::Char('4') => {
                self.settings = SettingsScreen::from_store(&self.store);
                self.screen = AppScreen::Settings;
            }
            KeyCode::Char('5') => self.screen = AppScreen::Bridge,
            KeyCode::Esc => self.quit = true,
            _ => {}
        }
    }

    pub async fn handle_message(&mut self, msg: AppMessage, tx: mpsc::Sender<AppMessage>) -> Result<()> {
        match msg {
            AppMessage::HistoryLoaded(history) => {
                // Last response wins; there is no ordering between requests.
                self.chat.handle_history(history);
            }
            AppMessage::BackendUnreachable(e) => {
                tracing::warn!(error = %e, "backend unreachable");
                self.chat.handle_failure();
                self.chat.state.mark_unreachable(e);
            }
            AppMessage::WalletsLoaded(wallets) => {
                self.wallets.handle_wallets(wallets);
            }
            AppMessage::WalletsChanged { notice, wallets } => {
                self.wallets.handle_wallets(wallets);
                self.status_message = Some(notice);
            }
            AppMessage::WalletExported(path) => {
                self.wallets.loading = false;
                self.notice = Some(Notice {
                    title: "Wallet Exported".to_string(),
                    body: format!("Saved to {}", path.display()),
                    success: true,
                });
            }
            AppMessage::WalletFailed(e) => {
                self.wallets.handle_failure(e);
            }
            AppMessage::AgentsLoaded(catalog) => {
                self.agents.handle_catalog(catalog);
            }
            AppMessage::AgentsSaved { reload: true } => {
                self.reload(tx);
                self.status_message = Some("Agent selection applied".to_string());
            }
            AppMessage::AgentsSaved { reload: false } => {
                self.agents
                    .handle_failure("The backend did not apply the selection".to_string());
            }
            AppMessage::AgentsFailed(e) => {
                self.agents.handle_failure(e);
            }
            AppMessage::TweetSent => {
                self.chat.handle_tweet_sent();
                self.notice = Some(Notice {
                    title: "Tweet Posted".to_string(),
                    body: "Your tweet was published".to_string(),
                    success: true,
                });
            }
            AppMessage::TweetRegenerated(draft) => {
                self.chat.handle_tweet_regenerated(draft);
            }
            AppMessage::TweetFailed(e) => {
                self.chat.handle_failure();
                self.notice = Some(Notice {
                    title: "Tweet Failed".to_string(),
                    body: e,
                    success: false,
                });
            }
            AppMessage::SwapPlanned(plan) => {
                self.status_message = Some(
                    match plan {
                        SwapPlan::Approve(_) => "Approval needed before swapping",
                        SwapPlan::Swap(_) => "Swap transaction ready to sign",
                    }
                    .to_string(),
                );
                self.chat.handle_swap_planned(plan);
            }
            AppMessage::ClaimPrepared(transactions) => {
                self.status_message =
                    Some(format!("{} claim transaction(s) ready to sign", transactions.len()));
                self.chat.handle_claim_prepared(transactions);
            }
            AppMessage::KeysSaved(message) => {
                self.settings.handle_saved();
                self.status_message = Some(message);
            }
            AppMessage::KeysFailed(e) => {
                self.settings.handle_saved();
                self.error_message = Some(format!("Keys stored locally, backend refused them: {}", e));
            }
            AppMessage::BridgeDone(message) => {
                self.bridge.handle_done();
                self.notice = Some(Notice {
                    title: "Bridge Submitted".to_string(),
                    body: if message.is_empty() {
                        "Bridge transaction submitted".to_string()
                    } else {
                        message
                    },
                    success: true,
                });
            }
            AppMessage::BridgeFailed(e) => {
                self.bridge.handle_done();
                self.notice = Some(Notice {
                    title: "Bridge Failed".to_string(),
                    body: e,
                    success: false,
                });
            }
            AppMessage::Error(e) => {
                self.chat.handle_failure();
                self.error_message = Some(e);
            }
        }
        Ok(())
    }

    pub fn can_quit(&self) -> bool {
        self.screen == AppScreen::Home && self.notice.is_none()
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> (tempfile::TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().join("store.json")).unwrap();
        let config = AppConfig {
            server_url: "http://127.0.0.1:9".to_string(),
            ..AppConfig::default()
        };
        (dir, App::new(config, store))
    }

    #[tokio::test]
    async fn latest_history_wins() {
        let (_dir, mut app) = app();
        let (tx, _rx) = mpsc::channel(4);

        let first = vec![ChatMessage::user("a")];
        let second = vec![ChatMessage::user("a"), ChatMessage::user("b")];
        app.handle_message(AppMessage::HistoryLoaded(second), tx.clone())
            .await
            .unwrap();
        app.handle_message(AppMessage::HistoryLoaded(first.clone()), tx)
            .await
            .unwrap();

        assert_eq!(app.chat.state.history, first);
    }

    #[tokio::test]
    async fn unreachable_modal_blocks_keys_until_dismissed() {
        let (_dir, mut app) = app();
        let (tx, _rx) = mpsc::channel(4);

        app.handle_message(AppMessage::BackendUnreachable("refused".into()), tx.clone())
            .await
            .unwrap();
        assert!(app.chat.state.backend_unreachable);

        app.handle_key(KeyCode::Char('1'), tx.clone()).await.unwrap();
        assert_eq!(app.screen, AppScreen::Home);

        app.handle_key(KeyCode::Esc, tx.clone()).await.unwrap();
        assert!(!app.chat.state.backend_unreachable);

        app.handle_key(KeyCode::Char('1'), tx).await.unwrap();
        assert_eq!(app.screen, AppScreen::Chat);
    }

    #[test]
    fn history_errors_split_by_kind() {
        let msg = AppMessage::from_history(Err(ApiError::InvalidInput("bad".into())));
        assert!(matches!(msg, AppMessage::Error(ref e) if e == "bad"));

        let msg = AppMessage::from_history(Err(ApiError::Server {
            status: 500,
            message: "boom".into(),
        }));
        assert!(matches!(msg, AppMessage::BackendUnreachable(ref e) if e.contains("boom")));

        let msg = AppMessage::from_chat_error(ApiError::Decode("expected value".into()));
        assert!(matches!(msg, AppMessage::BackendUnreachable(_)));

        let msg = AppMessage::from_history(Ok(vec![]));
        assert!(matches!(msg, AppMessage::HistoryLoaded(ref h) if h.is_empty()));
    }

    #[tokio::test]
    async fn server_error_on_history_blocks_the_page() {
        use crate::chat;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/chat/messages"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let (_dir, mut app) = app();
        let (tx, _rx) = mpsc::channel(4);
        let client = ApiClient::new(server.uri());
        let result = chat::submit_message(&client, &app.chat_context(), "gm", None).await;

        app.handle_message(AppMessage::from_history(result), tx)
            .await
            .unwrap();
        assert!(app.chat.state.backend_unreachable);
        assert!(app.chat.state.backend_error.contains("boom"));
        assert!(app.error_message.is_none());
    }

    #[tokio::test]
    async fn notice_must_be_dismissed_before_quitting() {
        let (_dir, mut app) = app();
        let (tx, _rx) = mpsc::channel(4);

        app.handle_message(AppMessage::BridgeFailed("Insufficient balance".into()), tx.clone())
            .await
            .unwrap();
        assert!(!app.can_quit());

        app.handle_key(KeyCode::Enter, tx).await.unwrap();
        assert!(app.can_quit());
    }

    #[tokio::test]
    async fn tweet_outcome_is_reported_in_a_modal() {
        let (_dir, mut app) = app();
        let (tx, _rx) = mpsc::channel(4);
        app.chat.pending = true;

        app.handle_message(
            AppMessage::TweetFailed("Missing credential: apiKey".into()),
            tx.clone(),
        )
        .await
        .unwrap();
        let notice = app.notice.clone().unwrap();
        assert!(!notice.success);
        assert_eq!(notice.title, "Tweet Failed");
        assert!(!app.chat.pending);

        app.handle_key(KeyCode::Enter, tx.clone()).await.unwrap();
        app.handle_message(AppMessage::TweetSent, tx).await.unwrap();
        assert!(app.notice.as_ref().is_some_and(|n| n.success));
    }
}
