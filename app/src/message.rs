//! Chat message model.
//!
//! The backend tags every message with a `role` and ships a `content` payload
//! whose shape depends on that role. Messages are decoded into a closed enum so
//! every consumer has to match on the variant before touching the payload.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Agent name carried by messages the user typed.
pub const USER_AGENT_NAME: &str = "user";

/// Errors produced while decoding a wire message.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("unknown message role: {0}")]
    UnknownRole(String),

    #[error("invalid content for role '{role}': {source}")]
    Content {
        role: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// A message in the chat history.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawMessage")]
pub struct ChatMessage {
    /// Agent that produced (or is addressed by) the message.
    pub agent_name: String,
    pub body: MessageBody,
}

/// Role-specific payload of a chat message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    User(String),
    Assistant(String),
    Swap(SwapProposal),
    Claim(ClaimProposal),
    Image(ImageResult),
    CryptoData(CryptoData),
    System(String),
}

/// Swap quote proposed by the swap agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapProposal {
    pub amount: String,
    pub src: String,
    pub dst: String,
    pub src_address: String,
    pub dst_address: String,
    pub src_amount: Amount,
    pub dst_amount: Amount,
    pub quote: String,
}

/// Amounts arrive either as decimal strings or as JSON numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Text(s) => f.write_str(s),
            Amount::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Reward claim transactions prepared by the claim agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimProposal {
    pub transactions: Vec<ClaimEntry>,
    pub claim_tx_cb: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimEntry {
    pub pool: u64,
    pub transaction: ClaimTransaction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimTransaction {
    pub to: String,
    pub data: String,
    pub value: String,
    pub gas: String,
    #[serde(rename = "chainId")]
    pub chain_id: String,
}

/// Result of an image generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResult {
    pub success: bool,
    pub service: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Market data answer, optionally tied to a coin for charting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoData {
    pub data: String,
    #[serde(rename = "coinId", default, skip_serializing_if = "Option::is_none")]
    pub coin_id: Option<String>,
}

/// Wire shape shared by all roles.
#[derive(Debug, Clone, Deserialize)]
struct RawMessage {
    role: String,
    content: Value,
    #[serde(rename = "agentName", default)]
    agent_name: Option<String>,
}

fn decode<T: serde::de::DeserializeOwned>(
    role: &'static str,
    content: Value,
) -> Result<T, MessageError> {
    serde_json::from_value(content).map_err(|source| MessageError::Content { role, source })
}

impl TryFrom<RawMessage> for ChatMessage {
    type Error = MessageError;

    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        let body = match raw.role.as_str() {
            "user" => MessageBody::User(decode("user", raw.content)?),
            "assistant" => MessageBody::Assistant(decode("assistant", raw.content)?),
            "swap" => MessageBody::Swap(decode("swap", raw.content)?),
            "claim" => MessageBody::Claim(decode("claim", raw.content)?),
            "image" => MessageBody::Image(decode("image", raw.content)?),
            "crypto_data" => MessageBody::CryptoData(decode("crypto_data", raw.content)?),
            "system" => MessageBody::System(decode("system", raw.content)?),
            _ => return Err(MessageError::UnknownRole(raw.role)),
        };

        Ok(Self {
            agent_name: raw.agent_name.unwrap_or_default(),
            body,
        })
    }
}

/// Outgoing wire shape, borrowing the payload so it serializes in place.
#[derive(Serialize)]
struct WireMessage<'a, C: Serialize> {
    role: &'static str,
    content: &'a C,
    #[serde(rename = "agentName")]
    agent_name: &'a str,
}

impl Serialize for ChatMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        fn wire<'a, C: Serialize, S: Serializer>(
            msg: &'a ChatMessage,
            content: &'a C,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            WireMessage {
                role: msg.role(),
                content,
                agent_name: &msg.agent_name,
            }
            .serialize(serializer)
        }

        match &self.body {
            MessageBody::User(s) | MessageBody::Assistant(s) | MessageBody::System(s) => {
                wire(self, s, serializer)
            }
            MessageBody::Swap(p) => wire(self, p, serializer),
            MessageBody::Claim(p) => wire(self, p, serializer),
            MessageBody::Image(p) => wire(self, p, serializer),
            MessageBody::CryptoData(p) => wire(self, p, serializer),
        }
    }
}

impl ChatMessage {
    /// A message typed by the user.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            agent_name: USER_AGENT_NAME.to_string(),
            body: MessageBody::User(content.into()),
        }
    }

    /// Wire value of the `role` discriminant.
    pub fn role(&self) -> &'static str {
        match self.body {
            MessageBody::User(_) => "user",
            MessageBody::Assistant(_) => "assistant",
            MessageBody::Swap(_) => "swap",
            MessageBody::Claim(_) => "claim",
            MessageBody::Image(_) => "image",
            MessageBody::CryptoData(_) => "crypto_data",
            MessageBody::System(_) => "system",
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self.body, MessageBody::User(_))
    }

    pub fn is_swap(&self) -> bool {
        matches!(self.body, MessageBody::Swap(_))
    }
}
