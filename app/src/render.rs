//! Decide how a chat message is displayed and which widget it can open.

use crate::message::{ChatMessage, ClaimProposal, CryptoData, ImageResult, MessageBody, SwapProposal};
use crate::tweet::TWEET_AGENT_NAME;

/// Rendering strategy for one message. Every message maps to exactly one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderKind<'a> {
    PlainText(&'a str),
    /// Editable draft with a tweet action.
    TweetDraft(&'a str),
    SwapProposal(&'a SwapProposal),
    ClaimProposal(&'a ClaimProposal),
    Image(&'a ImageResult),
    CryptoData(&'a CryptoData),
    SystemNotice(&'a str),
}

pub fn render_kind(msg: &ChatMessage) -> RenderKind<'_> {
    match &msg.body {
        MessageBody::User(text) | MessageBody::Assistant(text)
            if msg.agent_name == TWEET_AGENT_NAME =>
        {
            RenderKind::TweetDraft(text)
        }
        MessageBody::User(text) | MessageBody::Assistant(text) => RenderKind::PlainText(text),
        MessageBody::Swap(swap) => RenderKind::SwapProposal(swap),
        MessageBody::Claim(claim) => RenderKind::ClaimProposal(claim),
        MessageBody::Image(image) => RenderKind::Image(image),
        MessageBody::CryptoData(data) => RenderKind::CryptoData(data),
        MessageBody::System(text) => RenderKind::SystemNotice(text),
    }
}

/// Agents whose messages can open a side widget.
pub const WIDGET_COMPATIBLE_AGENTS: [&str; 4] = ["imagen", "crypto data", "dca", "base"];

/// Side panel a message can open.
#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
    Image(ImageResult),
    /// Price chart for a coin symbol.
    Chart(String),
    Dca,
    BaseBridge,
}

pub fn widget_for(msg: &ChatMessage) -> Option<Widget> {
    if !WIDGET_COMPATIBLE_AGENTS.contains(&msg.agent_name.as_str()) {
        return None;
    }
    match (msg.agent_name.as_str(), &msg.body) {
        ("imagen", MessageBody::Image(image)) => Some(Widget::Image(image.clone())),
        ("crypto data", MessageBody::CryptoData(data)) => data
            .coin_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(|id| Widget::Chart(id.to_uppercase())),
        ("dca", _) => Some(Widget::Dca),
        ("base", _) => Some(Widget::BaseBridge),
        _ => None,
    }
}

/// TradingView page for a coin symbol.
pub fn chart_url(symbol: &str) -> String {
    format!(
        "https://www.tradingview.com/chart/?symbol={}",
        urlencoding::encode(symbol)
    )
}
