//! HTTP client for the MORagents backend API.
//!
//! One method per endpoint. Every call is fire-once: failures are logged and
//! returned to the caller, which decides how to present them.

use crate::message::{ChatMessage, ClaimTransaction};
use crate::store::{CoinbaseKeys, XCredentials};
use reqwest::RequestBuilder;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response from the backend: {0}")]
    Decode(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Missing credential: {0}. Set it in the settings screen.")]
    MissingCredential(&'static str),

    #[error("{0}")]
    InvalidInput(String),
}

/// API client for the agents backend.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub wallet_id: String,
    pub network_id: String,
}

#[derive(Debug, Deserialize)]
struct WalletsResponse {
    #[serde(default)]
    wallets: Vec<Wallet>,
}

/// Generic `{status, message}` reply.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl StatusResponse {
    /// Turn a non-success status into an error carrying the server message.
    pub fn into_result(self) -> Result<String, ApiError> {
        if self.status == "success" {
            Ok(self.message)
        } else if self.message.is_empty() {
            Err(ApiError::Rejected(format!("status '{}'", self.status)))
        } else {
            Err(ApiError::Rejected(self.message))
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExportResponse {
    status: String,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

/// An agent the backend can enable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub human_readable_name: String,
}

#[derive(Debug, Deserialize)]
struct AgentDetails {
    #[serde(default)]
    description: String,
    #[serde(default)]
    human_readable_name: String,
}

/// Older backends send a list, newer ones a name-keyed map.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AvailableAgents {
    List(Vec<AgentInfo>),
    Map(BTreeMap<String, AgentDetails>),
}

#[derive(Debug, Deserialize)]
struct AgentsResponse {
    available_agents: AvailableAgents,
    #[serde(default)]
    selected_agents: Vec<String>,
}

/// Available agents and the currently selected subset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentCatalog {
    pub available: Vec<AgentInfo>,
    pub selected: Vec<String>,
}

impl From<AgentsResponse> for AgentCatalog {
    fn from(resp: AgentsResponse) -> Self {
        let available = match resp.available_agents {
            AvailableAgents::List(list) => list,
            AvailableAgents::Map(map) => map
                .into_iter()
                .map(|(name, d)| AgentInfo {
                    name,
                    description: d.description,
                    human_readable_name: d.human_readable_name,
                })
                .collect(),
        };
        Self {
            available,
            selected: resp.selected_agents,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectedAgentsResponse {
    pub status: String,
    #[serde(default)]
    pub agents: Vec<String>,
}

/// History is decoded per message so one unknown entry cannot hide the rest.
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    messages: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApproveTxPayload {
    pub data: String,
    #[serde(rename = "gasPrice")]
    pub gas_price: String,
    pub to: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SwapTx {
    pub data: String,
    pub from: String,
    pub gas: u64,
    #[serde(rename = "gasPrice")]
    pub gas_price: String,
    pub to: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SwapTxPayload {
    #[serde(rename = "dstAmount")]
    pub dst_amount: String,
    pub tx: SwapTx,
}

/// Parameters of a `/swap/swap` request. Amount is already in base units.
#[derive(Debug, Clone, Serialize)]
pub struct SwapRequest {
    pub src: String,
    pub dst: String,
    #[serde(rename = "walletAddress")]
    pub wallet_address: String,
    pub amount: String,
    pub slippage: f64,
    pub chain_id: u64,
}

/// Body of the swap/claim `tx_status` endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct TxStatusRequest {
    pub chain_id: u64,
    pub wallet_address: String,
    pub status: String,
    pub tx_hash: String,
    pub tx_type: String,
}

#[derive(Debug, Deserialize)]
struct ClaimPayloadResponse {
    transactions: Vec<ClaimTransaction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BridgeRequest {
    pub asset: String,
    pub amount: f64,
    pub destination_bridge: u64,
}

#[derive(Serialize)]
struct TweetRequest<'a> {
    post_content: &'a str,
    #[serde(flatten)]
    credentials: &'a XCredentials,
}

/// Pull a human readable message out of an error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("detail"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

fn logged<T>(endpoint: &str, result: Result<T, ApiError>) -> Result<T, ApiError> {
    if let Err(e) = &result {
        tracing::error!(endpoint, error = %e, "backend request failed");
    }
    result
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute(&self, req: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let resp = req.send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = match error_message(&body) {
                m if m.is_empty() => status.to_string(),
                m => m,
            };
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp)
    }

    async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        self.execute(req).await?.json().await.map_err(|e| {
            if e.is_decode() {
                ApiError::Decode(e.to_string())
            } else {
                ApiError::Transport(e)
            }
        })
    }

    async fn send(&self, req: RequestBuilder) -> Result<(), ApiError> {
        self.execute(req).await?;
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        logged(path, self.fetch(self.http.get(self.url(path))).await)
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        logged(path, self.fetch(self.http.post(self.url(path)).json(body)).await)
    }

    async fn post_unit<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        logged(path, self.send(self.http.post(self.url(path)).json(body)).await)
    }

    // ------------------------------------------------------------------
    // Wallets
    // ------------------------------------------------------------------

    pub async fn list_wallets(&self) -> Result<Vec<Wallet>, ApiError> {
        let resp: WalletsResponse = self.get("/wallets/list").await?;
        Ok(resp.wallets)
    }

    pub async fn create_wallet(&self, wallet_id: &str, network_id: &str) -> Result<(), ApiError> {
        self.post_unit(
            "/wallets/create",
            &json!({ "wallet_id": wallet_id, "network_id": network_id }),
        )
        .await
    }

    pub async fn restore_wallet(&self, wallet_id: &str, wallet_data: &Value) -> Result<(), ApiError> {
        self.post_unit(
            "/wallets/restore",
            &json!({ "wallet_id": wallet_id, "wallet_data": wallet_data }),
        )
        .await
    }

    /// Exported wallet document for `wallet_id`.
    pub async fn export_wallet(&self, wallet_id: &str) -> Result<Value, ApiError> {
        let path = format!("/wallets/export/{}", urlencoding::encode(wallet_id));
        let resp: ExportResponse = self.get(&path).await?;

        match (resp.status.as_str(), resp.data) {
            ("success", Some(data)) => Ok(data),
            _ => logged(
                &path,
                Err(ApiError::Rejected(
                    resp.message
                        .unwrap_or_else(|| "Failed to export wallet".to_string()),
                )),
            ),
        }
    }

    pub async fn delete_wallet(&self, wallet_id: &str) -> Result<(), ApiError> {
        let path = format!("/wallets/{}", urlencoding::encode(wallet_id));
        logged(&path, self.send(self.http.delete(self.url(&path))).await)
    }

    // ------------------------------------------------------------------
    // Agents
    // ------------------------------------------------------------------

    pub async fn get_available_agents(&self) -> Result<AgentCatalog, ApiError> {
        let resp: AgentsResponse = self.get("/agents/available").await?;
        Ok(resp.into())
    }

    pub async fn set_selected_agents(
        &self,
        agents: &[String],
    ) -> Result<SelectedAgentsResponse, ApiError> {
        self.post("/agents/selected", &json!({ "agents": agents })).await
    }

    // ------------------------------------------------------------------
    // Chat
    // ------------------------------------------------------------------

    pub async fn get_messages_history(&self) -> Result<Vec<ChatMessage>, ApiError> {
        let resp: MessagesResponse = self.get("/chat/messages").await?;
        let messages = resp
            .messages
            .into_iter()
            .enumerate()
            .filter_map(|(index, raw)| match serde_json::from_value(raw) {
                Ok(msg) => Some(msg),
                Err(e) => {
                    tracing::warn!(index, error = %e, "skipping undecodable chat message");
                    None
                }
            })
            .collect();
        Ok(messages)
    }

    pub async fn clear_messages_history(&self) -> Result<(), ApiError> {
        logged(
            "/chat/clear",
            self.send(self.http.get(self.url("/chat/clear"))).await,
        )
    }

    /// Send a user prompt. The reply lands in the server history.
    pub async fn post_chat(
        &self,
        content: &str,
        chain_id: u64,
        wallet_address: &str,
    ) -> Result<(), ApiError> {
        self.post_unit(
            "/chat",
            &json!({
                "prompt": { "role": "user", "content": content },
                "chain_id": chain_id.to_string(),
                "wallet_address": wallet_address,
            }),
        )
        .await
    }

    /// Upload a document for retrieval-augmented answers.
    pub async fn upload_file(&self, path: &Path) -> Result<(), ApiError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::InvalidInput(format!("Cannot read {}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        tracing::info!(file = %file_name, size = bytes.len(), "uploading file");
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("file", part);

        logged(
            "/rag/upload",
            self.send(self.http.post(self.url("/rag/upload")).multipart(form))
                .await,
        )
    }

    // ------------------------------------------------------------------
    // Swap and claim
    // ------------------------------------------------------------------

    pub async fn get_allowance(
        &self,
        chain_id: u64,
        token_address: &str,
        wallet_address: &str,
    ) -> Result<Value, ApiError> {
        self.post(
            "/swap/allowance",
            &json!({
                "chain_id": chain_id,
                "tokenAddress": token_address,
                "walletAddress": wallet_address,
            }),
        )
        .await
    }

    /// `amount` is in base units.
    pub async fn get_approval_tx_payload(
        &self,
        chain_id: u64,
        token_address: &str,
        amount: &str,
    ) -> Result<ApproveTxPayload, ApiError> {
        self.post(
            "/swap/approve",
            &json!({
                "chain_id": chain_id,
                "tokenAddress": token_address,
                "amount": amount,
            }),
        )
        .await
    }

    pub async fn get_swap_tx_payload(&self, req: &SwapRequest) -> Result<SwapTxPayload, ApiError> {
        self.post("/swap/swap", req).await
    }

    pub async fn send_swap_status(&self, req: &TxStatusRequest) -> Result<ChatMessage, ApiError> {
        self.post("/swap/tx_status", req).await
    }

    pub async fn get_claim_tx_payload(
        &self,
        transactions: &[ClaimTransaction],
    ) -> Result<Vec<ClaimTransaction>, ApiError> {
        let resp: ClaimPayloadResponse = self
            .post("/claim/claim", &json!({ "transactions": transactions }))
            .await?;
        Ok(resp.transactions)
    }

    pub async fn send_claim_status(&self, req: &TxStatusRequest) -> Result<ChatMessage, ApiError> {
        self.post("/claim/tx_status", req).await
    }

    // ------------------------------------------------------------------
    // Tweets and keys
    // ------------------------------------------------------------------

    pub async fn post_tweet(&self, credentials: &XCredentials, content: &str) -> Result<(), ApiError> {
        self.post_unit(
            "/tweet/post",
            &TweetRequest {
                post_content: content,
                credentials,
            },
        )
        .await
    }

    /// Ask the tweet agent for a fresh draft.
    pub async fn regenerate_tweet(&self) -> Result<String, ApiError> {
        let result = async {
            let resp = self.execute(self.http.post(self.url("/tweet/regenerate"))).await?;
            let body = resp.text().await?;
            Ok::<_, ApiError>(serde_json::from_str::<String>(&body).unwrap_or(body))
        }
        .await;
        logged("/tweet/regenerate", result)
    }

    pub async fn set_x_api_keys(&self, keys: &XCredentials) -> Result<StatusResponse, ApiError> {
        self.post("/keys/x", keys).await
    }

    pub async fn set_coinbase_api_keys(
        &self,
        keys: &CoinbaseKeys,
    ) -> Result<StatusResponse, ApiError> {
        self.post("/keys/coinbase", keys).await
    }

    // ------------------------------------------------------------------
    // Base bridge
    // ------------------------------------------------------------------

    /// Bridge tokens off Base. Returns the server's success message.
    pub async fn bridge(&self, req: &BridgeRequest) -> Result<String, ApiError> {
        let resp: StatusResponse = self.post("/base/bridge", req).await?;
        logged("/base/bridge", resp.into_result())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn list_wallets_defaults_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wallets/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        assert!(client.list_wallets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn server_error_carries_json_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/wallets/create"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"status": "error", "message": "Wallet already exists"})),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        match client.create_wallet("main", "base-mainnet").await {
            Err(ApiError::Server { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Wallet already exists");
            }
            other => panic!("expected server error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        // Nothing listens on the discard port.
        let client = ApiClient::new("http://127.0.0.1:9");
        let err = client.get_messages_history().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn history_skips_messages_it_cannot_decode() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chat/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": [
                    {"role": "user", "content": "hi"},
                    {"role": "assistant", "content": {"text": "structured"}},
                    {"role": "tool", "content": "x"},
                    {"role": "assistant", "content": "hello", "agentName": "base"}
                ]
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let history = client.get_messages_history().await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].is_user());
        assert_eq!(history[1].agent_name, "base");
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chat/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let err = client.get_messages_history().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn export_reports_rejection_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wallets/export/main"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "error", "message": "Wallet main not found"})),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let err = client.export_wallet("main").await.unwrap_err();
        assert_eq!(err.to_string(), "Request rejected: Wallet main not found");
    }

    #[tokio::test]
    async fn wallet_ids_are_percent_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/wallets/my%20wallet"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        client.delete_wallet("my wallet").await.unwrap();
        server.verify().await;
    }

    #[tokio::test]
    async fn chat_prompt_body_matches_backend_contract() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(body_json(json!({
                "prompt": {"role": "user", "content": "swap 1 eth"},
                "chain_id": "8453",
                "wallet_address": "0xabc"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(format!("{}/", server.uri()));
        client.post_chat("swap 1 eth", 8453, "0xabc").await.unwrap();
        server.verify().await;
    }

    #[tokio::test]
    async fn agents_decode_from_map_or_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/agents/available"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "available_agents": {
                    "imagen": {"description": "Generates images", "human_readable_name": "Image Generator"},
                    "base": {"description": "Base actions", "human_readable_name": "Base Agent"}
                },
                "selected_agents": ["base"]
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let catalog = client.get_available_agents().await.unwrap();
        assert_eq!(catalog.available.len(), 2);
        assert_eq!(catalog.available[0].name, "base");
        assert_eq!(catalog.available[1].human_readable_name, "Image Generator");
        assert_eq!(catalog.selected, vec!["base".to_string()]);

        let list: AgentsResponse = serde_json::from_value(json!({
            "available_agents": [{"name": "dca", "description": "DCA", "human_readable_name": "DCA Agent"}],
            "selected_agents": []
        }))
        .unwrap();
        let catalog = AgentCatalog::from(list);
        assert_eq!(catalog.available[0].name, "dca");
    }

    #[tokio::test]
    async fn tweet_body_flattens_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tweet/post"))
            .and(body_json(json!({
                "post_content": "gm",
                "api_key": "k",
                "api_secret": "s",
                "access_token": "t",
                "access_token_secret": "ts",
                "bearer_token": "b"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let creds = XCredentials {
            api_key: "k".into(),
            api_secret: "s".into(),
            access_token: "t".into(),
            access_token_secret: "ts".into(),
            bearer_token: "b".into(),
        };
        let client = ApiClient::new(server.uri());
        client.post_tweet(&creds, "gm").await.unwrap();
        server.verify().await;
    }

    #[tokio::test]
    async fn regenerate_accepts_json_string_or_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tweet/regenerate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("fresh take")))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        assert_eq!(client.regenerate_tweet().await.unwrap(), "fresh take");
    }

    #[tokio::test]
    async fn bridge_failure_status_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/base/bridge"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "error", "message": "Insufficient balance"})),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let err = client
            .bridge(&BridgeRequest {
                asset: "qsp".into(),
                amount: 2.0,
                destination_bridge: 84532,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Rejected(ref m) if m == "Insufficient balance"));
    }

    #[test]
    fn error_message_prefers_json_fields() {
        assert_eq!(error_message(r#"{"message": "nope"}"#), "nope");
        assert_eq!(error_message(r#"{"detail": "Not Found"}"#), "Not Found");
        assert_eq!(error_message("Internal Server Error\n"), "Internal Server Error");
    }
}
