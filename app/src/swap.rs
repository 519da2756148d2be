//! Swap and claim transaction flows.
//!
//! Signing happens outside this client; these flows fetch the payloads the
//! wallet would sign and report status changes back to the agents.

use crate::chat::ChatContext;
use crate::client::{
    ApiClient, ApiError, ApproveTxPayload, SwapRequest, SwapTxPayload, TxStatusRequest,
};
use crate::message::{ChatMessage, ClaimProposal, ClaimTransaction, SwapProposal};
use serde_json::Value;
use std::cmp::Ordering;

/// Placeholder address aggregators use for the chain's native token.
pub const NATIVE_TOKEN_ADDRESS: &str = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";

/// Decimals assumed for proposal amounts when the token does not say otherwise.
pub const DEFAULT_TOKEN_DECIMALS: u32 = 18;

/// Slippage tolerance in percent.
pub const DEFAULT_SLIPPAGE: f64 = 0.1;

/// Status reported when the user abandons a pending swap or claim.
pub const STATUS_CANCELLED: &str = "cancelled";

/// Which step of a swap a status update refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapAction {
    Swap,
    Approve,
}

impl SwapAction {
    pub fn tx_type(self) -> &'static str {
        match self {
            SwapAction::Swap => "swap",
            SwapAction::Approve => "approve",
        }
    }
}

/// Convert a decimal amount into an integer count of base units.
///
/// `"1.5"` with 6 decimals is `"1500000"`. Fractional digits beyond `decimals`
/// are only accepted when they are zeros.
pub fn to_base_units(amount: &str, decimals: u32) -> Result<String, ApiError> {
    let amount = amount.trim();
    let invalid = || ApiError::InvalidInput(format!("Invalid amount: '{}'", amount));

    let (int_part, frac_part) = amount.split_once('.').unwrap_or((amount, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(int_part) || !all_digits(frac_part) {
        return Err(invalid());
    }

    let decimals = decimals as usize;
    let (kept, excess) = if frac_part.len() > decimals {
        frac_part.split_at(decimals)
    } else {
        (frac_part, "")
    };
    if excess.chars().any(|c| c != '0') {
        return Err(ApiError::InvalidInput(format!(
            "Amount '{}' has more than {} decimal places",
            amount, decimals
        )));
    }

    let mut units = String::with_capacity(int_part.len() + decimals);
    units.push_str(int_part);
    units.push_str(kept);
    units.extend(std::iter::repeat('0').take(decimals - kept.len()));

    let trimmed = units.trim_start_matches('0');
    Ok(if trimmed.is_empty() { "0" } else { trimmed }.to_string())
}

/// Compare two non-negative integers written in decimal.
fn cmp_units(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn allowance_units(value: &Value) -> String {
    match value.get("allowance") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "0".to_string(),
    }
}

/// What the wallet has to sign next for a swap proposal.
#[derive(Debug, Clone, PartialEq)]
pub enum SwapPlan {
    /// The router may not spend enough of the source token yet.
    Approve(ApproveTxPayload),
    Swap(SwapTxPayload),
}

impl SwapPlan {
    /// Step a cancellation of this plan refers to.
    pub fn action(&self) -> SwapAction {
        match self {
            SwapPlan::Approve(_) => SwapAction::Approve,
            SwapPlan::Swap(_) => SwapAction::Swap,
        }
    }
}

/// Fetch the transaction needed to execute `proposal`.
pub async fn plan_swap(
    client: &ApiClient,
    ctx: &ChatContext,
    proposal: &SwapProposal,
    decimals: u32,
    slippage: f64,
) -> Result<SwapPlan, ApiError> {
    if ctx.wallet_address.is_empty() {
        return Err(ApiError::InvalidInput(
            "Connect a wallet address before swapping".to_string(),
        ));
    }
    let amount = to_base_units(&proposal.amount, decimals)?;

    if !proposal.src_address.eq_ignore_ascii_case(NATIVE_TOKEN_ADDRESS) {
        let allowance = client
            .get_allowance(ctx.chain_id, &proposal.src_address, &ctx.wallet_address)
            .await?;
        let allowed = allowance_units(&allowance);
        if cmp_units(&allowed, &amount) == Ordering::Less {
            tracing::info!(token = %proposal.src, %allowed, %amount, "allowance too low, approval needed");
            let payload = client
                .get_approval_tx_payload(ctx.chain_id, &proposal.src_address, &amount)
                .await?;
            return Ok(SwapPlan::Approve(payload));
        }
    }

    let payload = client
        .get_swap_tx_payload(&SwapRequest {
            src: proposal.src_address.clone(),
            dst: proposal.dst_address.clone(),
            wallet_address: ctx.wallet_address.clone(),
            amount,
            slippage,
            chain_id: ctx.chain_id,
        })
        .await?;
    Ok(SwapPlan::Swap(payload))
}

/// Ask the claim agent for ready-to-sign claim transactions.
pub async fn prepare_claim(
    client: &ApiClient,
    proposal: &ClaimProposal,
) -> Result<Vec<ClaimTransaction>, ApiError> {
    let transactions: Vec<ClaimTransaction> = proposal
        .transactions
        .iter()
        .map(|entry| entry.transaction.clone())
        .collect();
    client.get_claim_tx_payload(&transactions).await
}

/// Tell the claim agent the pending claim was cancelled, then refresh.
pub async fn cancel_claim(
    client: &ApiClient,
    ctx: &ChatContext,
) -> Result<Vec<ChatMessage>, ApiError> {
    client
        .send_claim_status(&TxStatusRequest {
            chain_id: ctx.chain_id,
            wallet_address: ctx.wallet_address.clone(),
            status: STATUS_CANCELLED.to_string(),
            tx_hash: String::new(),
            tx_type: "claim".to_string(),
        })
        .await?;
    client.get_messages_history().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Amount;
    use serde_json::json;
    use wiremock::matchers::{body_json, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ctx() -> ChatContext {
        ChatContext {
            chain_id: 1,
            wallet_address: "0xwallet".into(),
        }
    }

    fn proposal(src_address: &str) -> SwapProposal {
        SwapProposal {
            amount: "1.5".into(),
            src: "USDC".into(),
            dst: "WETH".into(),
            src_address: src_address.into(),
            dst_address: "0xweth".into(),
            src_amount: Amount::Text("1.5".into()),
            dst_amount: Amount::Text("0.0007".into()),
            quote: String::new(),
        }
    }

    fn swap_payload() -> serde_json::Value {
        json!({
            "dstAmount": "700000000000000",
            "tx": {
                "data": "0x12aa",
                "from": "0xwallet",
                "gas": 180000,
                "gasPrice": "1000000000",
                "to": "0xrouter",
                "value": "0"
            }
        })
    }

    #[test]
    fn base_units_scale_exactly() {
        assert_eq!(to_base_units("1.5", 6).unwrap(), "1500000");
        assert_eq!(to_base_units("0.1", 18).unwrap(), "100000000000000000");
        assert_eq!(to_base_units("42", 0).unwrap(), "42");
        assert_eq!(to_base_units(".25", 2).unwrap(), "25");
        assert_eq!(to_base_units("0", 18).unwrap(), "0");
        assert_eq!(to_base_units("1.500", 1).unwrap(), "15");
    }

    #[test]
    fn base_units_reject_bad_input() {
        assert!(to_base_units("", 6).is_err());
        assert!(to_base_units(".", 6).is_err());
        assert!(to_base_units("-1", 6).is_err());
        assert!(to_base_units("1e6", 6).is_err());
        assert!(to_base_units("1.0000001", 6).is_err());
    }

    #[test]
    fn unit_comparison_ignores_leading_zeros() {
        assert_eq!(cmp_units("0010", "9"), Ordering::Greater);
        assert_eq!(cmp_units("1500000", "1500000"), Ordering::Equal);
        assert_eq!(cmp_units("0", "1"), Ordering::Less);
    }

    #[test]
    fn plan_step_maps_to_tx_type() {
        let approve = SwapPlan::Approve(ApproveTxPayload {
            data: "0x095e".into(),
            gas_price: "1".into(),
            to: "0xusdc".into(),
            value: "0".into(),
        });
        assert_eq!(approve.action().tx_type(), "approve");
        assert_eq!(SwapAction::Swap.tx_type(), "swap");
    }

    #[tokio::test]
    async fn low_allowance_requests_approval() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/swap/allowance"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"allowance": "1000"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/swap/approve"))
            .and(body_json(json!({
                "chain_id": 1,
                "tokenAddress": "0xusdc",
                "amount": "1500000"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": "0x095e", "gasPrice": "1", "to": "0xusdc", "value": "0"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/swap/swap"))
            .respond_with(ResponseTemplate::new(200).set_body_json(swap_payload()))
            .expect(0)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let plan = plan_swap(&client, &ctx(), &proposal("0xusdc"), 6, DEFAULT_SLIPPAGE)
            .await
            .unwrap();
        assert!(matches!(plan, SwapPlan::Approve(ref p) if p.to == "0xusdc"));
        server.verify().await;
    }

    #[tokio::test]
    async fn native_token_skips_allowance() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/swap/allowance"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/swap/swap"))
            .and(body_partial_json(json!({
                "src": NATIVE_TOKEN_ADDRESS,
                "walletAddress": "0xwallet",
                "amount": "1500000000000000000"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(swap_payload()))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let plan = plan_swap(
            &client,
            &ctx(),
            &proposal(NATIVE_TOKEN_ADDRESS),
            DEFAULT_TOKEN_DECIMALS,
            DEFAULT_SLIPPAGE,
        )
        .await
        .unwrap();
        let SwapPlan::Swap(payload) = plan else { panic!("expected swap payload") };
        assert_eq!(payload.tx.gas, 180000);
        server.verify().await;
    }

    #[tokio::test]
    async fn claim_cancel_reports_and_refreshes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/claim/tx_status"))
            .and(body_json(json!({
                "chain_id": 1,
                "wallet_address": "0xwallet",
                "status": "cancelled",
                "tx_hash": "",
                "tx_type": "claim"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"role": "assistant", "content": "Claim cancelled"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/chat/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"messages": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let history = cancel_claim(&client, &ctx()).await.unwrap();
        assert!(history.is_empty());
        server.verify().await;
    }
}
