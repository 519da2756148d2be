//! Chat page state and the flows that reconcile it with the server.
//!
//! The server owns the history. Local state only ever holds the last history
//! fetched plus, briefly, the message the user just sent.

use crate::client::{ApiClient, ApiError, TxStatusRequest};
use crate::message::ChatMessage;
use crate::swap::{SwapAction, STATUS_CANCELLED};
use std::path::Path;

/// In-memory chat history for the chat screen.
#[derive(Debug, Default)]
pub struct ChatState {
    pub history: Vec<ChatMessage>,
    /// Set when a request to the backend failed; shown as a blocking modal.
    pub backend_unreachable: bool,
    /// What went wrong with the last failed request.
    pub backend_error: String,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the user's message right away, before the server echoes it back.
    pub fn push_optimistic(&mut self, content: &str) {
        self.history.push(ChatMessage::user(content));
    }

    /// Replace everything with the server's history.
    pub fn replace_history(&mut self, messages: Vec<ChatMessage>) {
        self.history = messages;
    }

    pub fn mark_unreachable(&mut self, reason: String) {
        self.backend_unreachable = true;
        self.backend_error = reason;
    }

    pub fn dismiss_unreachable(&mut self) {
        self.backend_unreachable = false;
    }

    /// Index of the newest swap proposal. Only that one accepts actions.
    pub fn last_swap_index(&self) -> Option<usize> {
        self.history.iter().rposition(ChatMessage::is_swap)
    }
}

/// Wallet context sent along with prompts and status updates.
#[derive(Debug, Clone)]
pub struct ChatContext {
    pub chain_id: u64,
    pub wallet_address: String,
}

/// Send a prompt (or upload a file) and return the server's history.
///
/// With a file attached the text is not posted; the upload replaces it. A
/// failed prompt post is logged and the history is still fetched, so the view
/// ends up matching the server either way.
pub async fn submit_message(
    client: &ApiClient,
    ctx: &ChatContext,
    message: &str,
    file: Option<&Path>,
) -> Result<Vec<ChatMessage>, ApiError> {
    match file {
        None => {
            if let Err(e) = client
                .post_chat(message, ctx.chain_id, &ctx.wallet_address)
                .await
            {
                tracing::warn!(error = %e, "prompt was not accepted, refreshing history anyway");
            }
        }
        Some(path) => client.upload_file(path).await?,
    }

    client.get_messages_history().await
}

/// Tell the backend the pending swap was cancelled, then refresh.
///
/// Returns `Ok(None)` without any request when no wallet is connected.
pub async fn cancel_swap(
    client: &ApiClient,
    ctx: &ChatContext,
    from_action: SwapAction,
) -> Result<Option<Vec<ChatMessage>>, ApiError> {
    if ctx.wallet_address.is_empty() {
        return Ok(None);
    }

    client
        .send_swap_status(&TxStatusRequest {
            chain_id: ctx.chain_id,
            wallet_address: ctx.wallet_address.clone(),
            status: STATUS_CANCELLED.to_string(),
            tx_hash: String::new(),
            tx_type: from_action.tx_type().to_string(),
        })
        .await?;

    Ok(Some(client.get_messages_history().await?))
}

/// Clear the server history and return what is left.
pub async fn clear_history(client: &ApiClient) -> Result<Vec<ChatMessage>, ApiError> {
    client.clear_messages_history().await?;
    client.get_messages_history().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageBody;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ctx() -> ChatContext {
        ChatContext {
            chain_id: 1,
            wallet_address: "0xabc".into(),
        }
    }

    fn history_body() -> serde_json::Value {
        json!({
            "messages": [
                {"role": "user", "content": "hi", "agentName": "user"},
                {"role": "assistant", "content": "hello", "agentName": "default"}
            ]
        })
    }

    async fn mount_history(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/chat/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(history_body()))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn text_submit_posts_once_then_fetches_history_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rag/upload"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        mount_history(&server).await;

        let client = ApiClient::new(server.uri());
        let history = submit_message(&client, &ctx(), "hi", None).await.unwrap();
        assert_eq!(history.len(), 2);
        server.verify().await;
    }

    #[tokio::test]
    async fn file_submit_uploads_instead_of_posting_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rag/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
            .expect(1)
            .mount(&server)
            .await;
        mount_history(&server).await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("whitepaper.txt");
        std::fs::write(&file, "tokenomics").unwrap();

        let client = ApiClient::new(server.uri());
        submit_message(&client, &ctx(), "summarize this", Some(&file))
            .await
            .unwrap();
        server.verify().await;
    }

    #[tokio::test]
    async fn rejected_prompt_still_reconciles_history() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        mount_history(&server).await;

        let client = ApiClient::new(server.uri());
        let history = submit_message(&client, &ctx(), "hi", None).await.unwrap();
        assert_eq!(history[1].body, MessageBody::Assistant("hello".into()));
        server.verify().await;
    }

    #[tokio::test]
    async fn cancel_swap_posts_status_then_refreshes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/swap/tx_status"))
            .and(body_json(json!({
                "chain_id": 1,
                "wallet_address": "0xabc",
                "status": "cancelled",
                "tx_hash": "",
                "tx_type": "swap"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"role": "assistant", "content": "Swap cancelled"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        mount_history(&server).await;

        let client = ApiClient::new(server.uri());
        let history = cancel_swap(&client, &ctx(), SwapAction::Swap).await.unwrap();
        assert_eq!(history.map(|h| h.len()), Some(2));
        server.verify().await;
    }

    #[tokio::test]
    async fn cancel_swap_without_wallet_does_nothing() {
        let server = MockServer::start().await;
        let client = ApiClient::new(server.uri());
        let ctx = ChatContext {
            chain_id: 1,
            wallet_address: String::new(),
        };

        assert!(cancel_swap(&client, &ctx, SwapAction::Approve)
            .await
            .unwrap()
            .is_none());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[test]
    fn server_history_replaces_optimistic_entry() {
        let mut state = ChatState::new();
        state.replace_history(vec![ChatMessage::user("earlier")]);
        state.push_optimistic("hi");
        assert_eq!(state.history.len(), 2);

        let canonical: Vec<ChatMessage> =
            serde_json::from_value(history_body()["messages"].clone()).unwrap();
        state.replace_history(canonical.clone());
        assert_eq!(state.history, canonical);
    }

    #[test]
    fn last_swap_index_finds_newest_proposal() {
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

        let mut state = ChatState::new();
        assert_eq!(state.last_swap_index(), None);
        state.replace_history(vec![swap.clone(), ChatMessage::user("again"), swap]);
        assert_eq!(state.last_swap_index(), Some(2));
    }
}
