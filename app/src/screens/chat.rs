//! Chat screen: history, composer and per-message actions.

use crate::{
    app::{App, AppMessage, ScreenAction},
    chat::{self, ChatContext, ChatState},
    client::{ApiClient, ApiError},
    message::{ChatMessage, ClaimTransaction, MessageBody, SwapProposal},
    render::{chart_url, render_kind, widget_for, RenderKind, Widget},
    screens::{input_box, render_footer, render_title, screen_layout, truncate, Screen},
    store::LocalStore,
    swap::{self, SwapAction, SwapPlan, DEFAULT_SLIPPAGE, DEFAULT_TOKEN_DECIMALS},
    tweet,
};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use std::future::Future;
use std::path::PathBuf;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatFocus {
    Input,
    Messages,
    EditTweet,
}

/// Right-hand panel contents.
#[derive(Debug, Clone, PartialEq)]
pub enum SidePanel {
    Widget(Widget),
    Swap(SwapPlan),
    Claim(Vec<ClaimTransaction>),
}

/// What a line typed into the composer asks for.
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Send(String),
    Upload(PathBuf),
    Clear,
}

fn parse_input(input: &str) -> Option<Command> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed == "/clear" {
        return Some(Command::Clear);
    }
    if let Some(path) = trimmed.strip_prefix("/upload ") {
        let path = path.trim();
        return (!path.is_empty()).then(|| Command::Upload(PathBuf::from(path)));
    }
    Some(Command::Send(trimmed.to_string()))
}

/// Greedy word wrap. Words longer than `width` are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();

    for raw in text.lines() {
        let mut line = String::new();
        for word in raw.split_whitespace() {
            let chars: Vec<char> = word.chars().collect();
            for chunk in chars.chunks(width) {
                let chunk: String = chunk.iter().collect();
                let current = line.chars().count();
                if current > 0 && current + 1 + chunk.chars().count() > width {
                    out.push(std::mem::take(&mut line));
                }
                if !line.is_empty() {
                    line.push(' ');
                }
                line.push_str(&chunk);
            }
        }
        out.push(line);
    }

    if out.is_empty() {
        out.push(String::new());
    }
    out
}

/// Run a history-producing flow and report the outcome to the app.
fn spawn_history<F>(tx: mpsc::Sender<AppMessage>, flow: F)
where
    F: Future<Output = Result<Vec<ChatMessage>, ApiError>> + Send + 'static,
{
    tokio::spawn(async move {
        let _ = tx.send(AppMessage::from_history(flow.await)).await;
    });
}

pub struct ChatScreen {
    pub state: ChatState,
    pub input: String,
    pub focus: ChatFocus,
    /// Index into the history while browsing messages.
    pub selected: Option<usize>,
    pub tweet_draft: String,
    pub side: Option<SidePanel>,
    /// A request is in flight.
    pub pending: bool,
    pub error: Option<String>,
}

impl ChatScreen {
    pub fn new() -> Self {
        Self {
            state: ChatState::new(),
            input: String::new(),
            focus: ChatFocus::Input,
            selected: None,
            tweet_draft: String::new(),
            side: None,
            pending: false,
            error: None,
        }
    }

    fn selected_message(&self) -> Option<&ChatMessage> {
        self.selected.and_then(|i| self.state.history.get(i))
    }

    /// The selected message if it is the newest swap proposal.
    fn selected_swap(&self) -> Option<&SwapProposal> {
        let idx = self.selected?;
        if self.state.last_swap_index() != Some(idx) {
            return None;
        }
        match &self.state.history.get(idx)?.body {
            MessageBody::Swap(proposal) => Some(proposal),
            _ => None,
        }
    }

    fn select_next(&mut self) {
        let len = self.state.history.len();
        if len == 0 {
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) => (i + 1).min(len - 1),
            None => len - 1,
        });
    }

    fn select_prev(&mut self) {
        if self.state.history.is_empty() {
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) => i.saturating_sub(1),
            None => self.state.history.len() - 1,
        });
    }

    /// New history arrived from the server.
    pub fn handle_history(&mut self, history: Vec<ChatMessage>) {
        self.pending = false;
        self.state.replace_history(history);
        if let Some(i) = self.selected {
            if i >= self.state.history.len() {
                self.selected = self.state.history.len().checked_sub(1);
            }
        }
    }

    pub fn handle_failure(&mut self) {
        self.pending = false;
    }

    pub fn handle_tweet_sent(&mut self) {
        self.pending = false;
        self.tweet_draft.clear();
        self.focus = ChatFocus::Messages;
    }

    pub fn handle_tweet_regenerated(&mut self, draft: String) {
        self.pending = false;
        self.tweet_draft = draft;
    }

    pub fn handle_swap_planned(&mut self, plan: SwapPlan) {
        self.pending = false;
        self.side = Some(SidePanel::Swap(plan));
    }

    pub fn handle_claim_prepared(&mut self, transactions: Vec<ClaimTransaction>) {
        self.pending = false;
        self.side = Some(SidePanel::Claim(transactions));
    }

    pub fn handle_key(
        &mut self,
        key: KeyCode,
        ctx: ChatContext,
        client: &ApiClient,
        store: &LocalStore,
        tx: mpsc::Sender<AppMessage>,
    ) -> ScreenAction {
        self.error = None;
        match self.focus {
            ChatFocus::Input => self.handle_input_key(key, ctx, client, tx),
            ChatFocus::Messages => self.handle_messages_key(key, ctx, client, tx),
            ChatFocus::EditTweet => {
                self.handle_tweet_key(key, client, store, tx);
                ScreenAction::None
            }
        }
    }

    fn handle_input_key(
        &mut self,
        key: KeyCode,
        ctx: ChatContext,
        client: &ApiClient,
        tx: mpsc::Sender<AppMessage>,
    ) -> ScreenAction {
        match key {
            KeyCode::Char(c) => self.input.push(c),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Tab => {
                self.focus = ChatFocus::Messages;
                if self.selected.is_none() {
                    self.selected = self.state.history.len().checked_sub(1);
                }
            }
            KeyCode::Enter if !self.pending => {
                let Some(command) = parse_input(&self.input) else {
                    return ScreenAction::None;
                };
                self.input.clear();
                self.pending = true;
                let client = client.clone();

                match command {
                    Command::Send(text) => {
                        self.state.push_optimistic(&text);
                        spawn_history(tx, async move {
                            chat::submit_message(&client, &ctx, &text, None).await
                        });
                    }
                    Command::Upload(path) => {
                        let name = path
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default();
                        self.state.push_optimistic(&format!("Uploaded {}", name));
                        spawn_history(tx, async move {
                            chat::submit_message(&client, &ctx, "", Some(path.as_path())).await
                        });
                    }
                    Command::Clear => {
                        self.selected = None;
                        self.side = None;
                        spawn_history(tx, async move { chat::clear_history(&client).await });
                    }
                }
            }
            KeyCode::Esc => return ScreenAction::GoHome,
            _ => {}
        }
        ScreenAction::None
    }

    fn handle_messages_key(
        &mut self,
        key: KeyCode,
        ctx: ChatContext,
        client: &ApiClient,
        tx: mpsc::Sender<AppMessage>,
    ) -> ScreenAction {
        match key {
            KeyCode::Char('j') | KeyCode::Down => self.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.select_prev(),
            KeyCode::Tab | KeyCode::Esc => self.focus = ChatFocus::Input,
            KeyCode::Char('e') => {
                let draft = match self.selected_message().map(render_kind) {
                    Some(RenderKind::TweetDraft(text)) => Some(text.to_string()),
                    _ => None,
                };
                match draft {
                    Some(text) => {
                        self.tweet_draft = text;
                        self.focus = ChatFocus::EditTweet;
                    }
                    None => self.error = Some("Only tweet drafts can be edited".to_string()),
                }
            }
            KeyCode::Char('w') => match self.selected_message().and_then(widget_for) {
                Some(widget) => self.side = Some(SidePanel::Widget(widget)),
                None => self.error = Some("This message has no widget".to_string()),
            },
            KeyCode::Char('o') => return self.open_widget(),
            KeyCode::Char('s') if !self.pending => {
                let Some(proposal) = self.selected_swap().cloned() else {
                    self.error = Some("Select the latest swap proposal".to_string());
                    return ScreenAction::None;
                };
                self.pending = true;
                let client = client.clone();
                tokio::spawn(async move {
                    let result = swap::plan_swap(
                        &client,
                        &ctx,
                        &proposal,
                        DEFAULT_TOKEN_DECIMALS,
                        DEFAULT_SLIPPAGE,
                    )
                    .await;
                    let msg = match result {
                        Ok(plan) => AppMessage::SwapPlanned(plan),
                        Err(e) => AppMessage::from_chat_error(e),
                    };
                    let _ = tx.send(msg).await;
                });
            }
            KeyCode::Char('c') if !self.pending => {
                if self.selected_swap().is_none() {
                    self.error = Some("Select the latest swap proposal".to_string());
                    return ScreenAction::None;
                }
                let action = match &self.side {
                    Some(SidePanel::Swap(plan)) => plan.action(),
                    _ => SwapAction::Swap,
                };
                self.pending = true;
                self.side = None;
                let client = client.clone();
                spawn_history(tx, async move {
                    chat::cancel_swap(&client, &ctx, action).await?.ok_or_else(|| {
                        ApiError::InvalidInput("Set a wallet address to cancel swaps".to_string())
                    })
                });
            }
            KeyCode::Char('l') if !self.pending => {
                let proposal = match self.selected_message().map(|m| &m.body) {
                    Some(MessageBody::Claim(proposal)) => proposal.clone(),
                    _ => {
                        self.error = Some("Select a claim proposal".to_string());
                        return ScreenAction::None;
                    }
                };
                self.pending = true;
                let client = client.clone();
                tokio::spawn(async move {
                    let msg = match swap::prepare_claim(&client, &proposal).await {
                        Ok(transactions) => AppMessage::ClaimPrepared(transactions),
                        Err(e) => AppMessage::from_chat_error(e),
                    };
                    let _ = tx.send(msg).await;
                });
            }
            KeyCode::Char('x') if !self.pending => {
                if !matches!(
                    self.selected_message().map(|m| &m.body),
                    Some(MessageBody::Claim(_))
                ) {
                    self.error = Some("Select a claim proposal".to_string());
                    return ScreenAction::None;
                }
                self.pending = true;
                self.side = None;
                let client = client.clone();
                spawn_history(tx, async move {
                    swap::cancel_claim(&client, &ctx).await
                });
            }
            _ => {}
        }
        ScreenAction::None
    }

    fn handle_tweet_key(
        &mut self,
        key: KeyCode,
        client: &ApiClient,
        store: &LocalStore,
        tx: mpsc::Sender<AppMessage>,
    ) {
        match key {
            KeyCode::Char(c) => self.tweet_draft.push(c),
            KeyCode::Backspace => {
                self.tweet_draft.pop();
            }
            KeyCode::Enter if !self.pending && !self.tweet_draft.trim().is_empty() => {
                self.pending = true;
                let client = client.clone();
                let store = store.clone();
                let draft = self.tweet_draft.clone();
                tokio::spawn(async move {
                    let msg = match tweet::submit_tweet(&client, &store, &draft).await {
                        Ok(()) => AppMessage::TweetSent,
                        Err(e) => AppMessage::TweetFailed(e.to_string()),
                    };
                    let _ = tx.send(msg).await;
                });
            }
            KeyCode::F(2) if !self.pending => {
                self.pending = true;
                let client = client.clone();
                tokio::spawn(async move {
                    let msg = match client.regenerate_tweet().await {
                        Ok(draft) => AppMessage::TweetRegenerated(draft),
                        Err(e) => AppMessage::TweetFailed(e.to_string()),
                    };
                    let _ = tx.send(msg).await;
                });
            }
            KeyCode::Esc => self.focus = ChatFocus::Messages,
            _ => {}
        }
    }

    fn open_widget(&mut self) -> ScreenAction {
        let url = match &self.side {
            Some(SidePanel::Widget(Widget::BaseBridge)) => return ScreenAction::OpenBridge,
            Some(SidePanel::Widget(Widget::Chart(symbol))) => chart_url(symbol),
            Some(SidePanel::Widget(Widget::Image(image))) if image.image.starts_with("http") => {
                image.image.clone()
            }
            Some(SidePanel::Widget(Widget::Image(_))) => {
                self.error = Some("This image has no link to open".to_string());
                return ScreenAction::None;
            }
            _ => {
                self.error = Some("Nothing to open".to_string());
                return ScreenAction::None;
            }
        };

        if let Err(e) = open::that(&url) {
            tracing::warn!(%url, error = %e, "failed to open browser");
            self.error = Some(format!("Could not open browser: {}", e));
        }
        ScreenAction::None
    }

    fn message_lines(&self, idx: usize, msg: &ChatMessage, width: usize) -> Vec<Line<'static>> {
        let selected = self.focus != ChatFocus::Input && self.selected == Some(idx);
        let marker = if selected { "▶ " } else { "  " };
        let (name, color) = if msg.is_user() {
            ("You".to_string(), Color::Cyan)
        } else if msg.agent_name.is_empty() {
            ("Agent".to_string(), Color::Magenta)
        } else {
            (msg.agent_name.clone(), Color::Magenta)
        };

        let mut lines = vec![Line::from(vec![
            Span::styled(marker, Style::default().fg(Color::LightGreen)),
            Span::styled(name, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        ])];

        let text = |lines: &mut Vec<Line<'static>>, body: &str, color: Color| {
            for l in wrap_text(body, width) {
                lines.push(Line::from(vec![
                    Span::styled("  │ ", Style::default().fg(Color::DarkGray)),
                    Span::styled(l, Style::default().fg(color)),
                ]));
            }
        };
        let hint = |lines: &mut Vec<Line<'static>>, hint: String, color: Color| {
            lines.push(Line::from(vec![
                Span::styled("  │ ", Style::default().fg(Color::DarkGray)),
                Span::styled(hint, Style::default().fg(color)),
            ]));
        };

        match render_kind(msg) {
            RenderKind::PlainText(body) => text(&mut lines, body, Color::White),
            RenderKind::TweetDraft(body) => {
                text(&mut lines, body, Color::White);
                if selected {
                    hint(&mut lines, "[e] edit and tweet".to_string(), Color::DarkGray);
                }
            }
            RenderKind::SwapProposal(p) => {
                hint(
                    &mut lines,
                    format!("⇄ Swap {} {} → {}", p.amount, p.src, p.dst),
                    Color::Yellow,
                );
                hint(
                    &mut lines,
                    format!("pay {} {}, receive ≈ {} {}", p.src_amount, p.src, p.dst_amount, p.dst),
                    Color::White,
                );
                if !p.quote.is_empty() {
                    text(&mut lines, &p.quote, Color::DarkGray);
                }
                if self.state.last_swap_index() == Some(idx) {
                    if selected {
                        hint(&mut lines, "[s] prepare swap  [c] cancel".to_string(), Color::DarkGray);
                    }
                } else {
                    hint(&mut lines, "(superseded)".to_string(), Color::DarkGray);
                }
            }
            RenderKind::ClaimProposal(c) => {
                hint(
                    &mut lines,
                    format!("⛏ Claim rewards from {} pool(s)", c.transactions.len()),
                    Color::Yellow,
                );
                for entry in &c.transactions {
                    hint(
                        &mut lines,
                        format!("pool {} → {}", entry.pool, truncate(&entry.transaction.to, 24)),
                        Color::White,
                    );
                }
                if selected {
                    hint(&mut lines, "[l] prepare claim  [x] cancel".to_string(), Color::DarkGray);
                }
            }
            RenderKind::Image(image) => {
                if image.success {
                    hint(&mut lines, format!("🖼 Image from {}", image.service), Color::Green);
                    hint(&mut lines, truncate(&image.image, width), Color::DarkGray);
                } else {
                    let reason = image.error.as_deref().unwrap_or("unknown error");
                    hint(&mut lines, format!("Image generation failed: {}", reason), Color::Red);
                }
            }
            RenderKind::CryptoData(data) => {
                text(&mut lines, &data.data, Color::White);
                if let Some(coin) = data.coin_id.as_deref().filter(|c| !c.is_empty()) {
                    if selected {
                        hint(
                            &mut lines,
                            format!("[w] chart for {}", coin.to_uppercase()),
                            Color::DarkGray,
                        );
                    }
                }
            }
            RenderKind::SystemNotice(body) => text(&mut lines, body, Color::Yellow),
        }

        lines.push(Line::from(""));
        lines
    }

    fn render_history(&self, frame: &mut Frame, area: Rect) {
        let width = area.width.saturating_sub(6) as usize;
        let mut lines: Vec<Line> = Vec::new();
        let mut selected_line = None;

        if self.state.history.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "  No messages yet. Ask an agent something below.",
                Style::default().fg(Color::DarkGray),
            )));
        }

        for (idx, msg) in self.state.history.iter().enumerate() {
            if self.selected == Some(idx) {
                selected_line = Some(lines.len() as u16);
            }
            lines.extend(self.message_lines(idx, msg, width));
        }

        if self.pending {
            lines.push(Line::from(vec![
                Span::styled("  ◐ ", Style::default().fg(Color::Magenta)),
                Span::styled("Waiting for the agents...", Style::default().fg(Color::Magenta)),
            ]));
        }

        // Stick to the bottom unless browsing.
        let view_height = area.height.saturating_sub(2);
        let max_scroll = (lines.len() as u16).saturating_sub(view_height);
        let scroll = match (self.focus, selected_line) {
            (ChatFocus::Input, _) | (_, None) => max_scroll,
            (_, Some(line)) => line.saturating_sub(1).min(max_scroll),
        };

        let border = if self.focus == ChatFocus::Messages {
            Color::LightGreen
        } else {
            Color::DarkGray
        };
        let content = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border))
                    .title(Span::styled(" Conversation ", Style::default().fg(Color::White))),
            )
            .scroll((scroll, 0));
        frame.render_widget(content, area);
    }

    fn render_side(&self, frame: &mut Frame, area: Rect, panel: &SidePanel) {
        let label = |k: &str, v: String| {
            Line::from(vec![
                Span::styled(format!("{:<10}", k), Style::default().fg(Color::DarkGray)),
                Span::styled(v, Style::default().fg(Color::White)),
            ])
        };
        let width = area.width.saturating_sub(14) as usize;

        let (title, lines) = match panel {
            SidePanel::Widget(Widget::Image(image)) => (
                " Image ",
                vec![
                    label("service", image.service.clone()),
                    label("link", truncate(&image.image, width)),
                    Line::from(""),
                    Line::from(Span::styled("[o] open in browser", Style::default().fg(Color::DarkGray))),
                ],
            ),
            SidePanel::Widget(Widget::Chart(symbol)) => (
                " Price Chart ",
                vec![
                    label("symbol", symbol.clone()),
                    label("url", truncate(&chart_url(symbol), width)),
                    Line::from(""),
                    Line::from(Span::styled("[o] open chart", Style::default().fg(Color::DarkGray))),
                ],
            ),
            SidePanel::Widget(Widget::Dca) => (
                " DCA ",
                vec![Line::from(Span::styled(
                    "Ask the DCA agent in chat to create or adjust a strategy.",
                    Style::default().fg(Color::White),
                ))],
            ),
            SidePanel::Widget(Widget::BaseBridge) => (
                " Base ",
                vec![
                    Line::from(Span::styled(
                        "Bridge tokens from Base to another network.",
                        Style::default().fg(Color::White),
                    )),
                    Line::from(""),
                    Line::from(Span::styled("[o] open bridge form", Style::default().fg(Color::DarkGray))),
                ],
            ),
            SidePanel::Swap(SwapPlan::Approve(p)) => (
                " Approval Required ",
                vec![
                    label("to", truncate(&p.to, width)),
                    label("data", truncate(&p.data, width)),
                    label("gas price", p.gas_price.clone()),
                    label("value", p.value.clone()),
                    Line::from(""),
                    Line::from(Span::styled(
                        "Sign the approval, then prepare the swap again.",
                        Style::default().fg(Color::Yellow),
                    )),
                ],
            ),
            SidePanel::Swap(SwapPlan::Swap(p)) => (
                " Swap Ready ",
                vec![
                    label("receive", p.dst_amount.clone()),
                    label("to", truncate(&p.tx.to, width)),
                    label("gas", p.tx.gas.to_string()),
                    label("gas price", p.tx.gas_price.clone()),
                    label("value", p.tx.value.clone()),
                    label("data", truncate(&p.tx.data, width)),
                ],
            ),
            SidePanel::Claim(transactions) => {
                let mut lines = Vec::new();
                for (i, t) in transactions.iter().enumerate() {
                    lines.push(Line::from(Span::styled(
                        format!("#{}", i + 1),
                        Style::default().fg(Color::Yellow),
                    )));
                    lines.push(label("to", truncate(&t.to, width)));
                    lines.push(label("chain", t.chain_id.clone()));
                    lines.push(label("gas", t.gas.clone()));
                }
                (" Claim Transactions ", lines)
            }
        };

        let panel = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(Span::styled(title, Style::default().fg(Color::White))),
        );
        frame.render_widget(panel, area);
    }
}

impl Screen for ChatScreen {
    fn render(&self, frame: &mut Frame, area: Rect, app: &App) {
        let chunks = screen_layout(area);
        let subtitle = format!("chain {} · {}", app.config.chain_id, app.client.base_url());
        render_title(frame, chunks[0], "CHAT", &subtitle);

        let body = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(3)])
            .split(chunks[1]);

        match &self.side {
            Some(panel) => {
                let columns = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
                    .split(body[0]);
                self.render_history(frame, columns[0]);
                self.render_side(frame, columns[1], panel);
            }
            None => self.render_history(frame, body[0]),
        }

        let input = match self.focus {
            ChatFocus::EditTweet => input_box(&self.tweet_draft, "Tweet draft", true),
            _ => input_box(&self.input, "Message  (/upload <path>, /clear)", self.focus == ChatFocus::Input),
        };
        frame.render_widget(input, body[1]);

        if let Some(err) = &self.error {
            let line = Paragraph::new(Line::from(vec![
                Span::styled(" ✗ ", Style::default().fg(Color::Red)),
                Span::styled(err.as_str(), Style::default().fg(Color::Red)),
            ]));
            frame.render_widget(line, chunks[2]);
            return;
        }

        let help: &[(&str, &str)] = match self.focus {
            ChatFocus::Input => &[("Enter", "Send"), ("Tab", "Browse"), ("Esc", "Home")],
            ChatFocus::Messages => &[
                ("j/k", "Select"),
                ("w", "Widget"),
                ("o", "Open"),
                ("e", "Edit tweet"),
                ("Tab", "Compose"),
            ],
            ChatFocus::EditTweet => &[("Enter", "Tweet"), ("F2", "Regenerate"), ("Esc", "Back")],
        };
        render_footer(frame, chunks[2], app, help);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn composer_commands() {
        assert_eq!(parse_input("   "), None);
        assert_eq!(parse_input(" gm "), Some(Command::Send("gm".into())));
        assert_eq!(parse_input("/clear"), Some(Command::Clear));
        assert_eq!(
            parse_input("/upload ./notes.pdf"),
            Some(Command::Upload(PathBuf::from("./notes.pdf")))
        );
        assert_eq!(parse_input("/upload "), None);
    }

    #[test]
    fn wrap_splits_on_words_and_long_tokens() {
        assert_eq!(wrap_text("hello world", 5), vec!["hello", "world"]);
        assert_eq!(wrap_text("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert_eq!(wrap_text("a\n\nb", 10), vec!["a", "", "b"]);
        assert_eq!(wrap_text("", 10), vec![""]);
    }

    #[test]
    fn only_latest_swap_is_actionable() {
        let swap: ChatMessage = serde_json::from_value(json!({
            "role": "swap",
            "agentName": "crypto swap agent",
            "content": {
                "amount": "1", "src": "ETH", "dst": "USDC",
                "src_address": "0xeeee", "dst_address": "0xa0b8",
                "src_amount": "1", "dst_amount": "2000", "quote": ""
            }
        }))
        .unwrap();

        let mut screen = ChatScreen::new();
        screen
            .state
            .replace_history(vec![swap.clone(), ChatMessage::user("again"), swap]);

        screen.selected = Some(0);
        assert!(screen.selected_swap().is_none());
        screen.selected = Some(2);
        assert!(screen.selected_swap().is_some());
    }

    #[test]
    fn selection_clamps_when_history_shrinks() {
        let mut screen = ChatScreen::new();
        screen.handle_history(vec![ChatMessage::user("a"), ChatMessage::user("b")]);
        screen.select_next();
        assert_eq!(screen.selected, Some(1));

        screen.handle_history(vec![]);
        assert_eq!(screen.selected, None);
    }
}
