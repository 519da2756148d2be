//! Base network bridge form.

use crate::client::{ApiError, BridgeRequest};

/// Tokens the Base agent can move, as `(symbol, name)`.
pub const BASE_TOKENS: [(&str, &str); 9] = [
    ("usdc", "USD Coin"),
    ("weth", "Wrapped Ethereum"),
    ("wbtc", "Wrapped Bitcoin"),
    ("dai", "Dai Stablecoin"),
    ("cbeth", "Coinbase Wrapped Staked ETH"),
    ("usdbc", "USD Base Coin"),
    ("qsp", "QuestSwap"),
    ("qsp2", "QuestSwap2"),
    ("usdt", "Tether USD"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeChain {
    BaseSepolia,
    ArbitrumSepolia,
}

impl BridgeChain {
    pub fn name(self) -> &'static str {
        match self {
            BridgeChain::BaseSepolia => "Base Sepolia",
            BridgeChain::ArbitrumSepolia => "Arbitrum Sepolia",
        }
    }

    pub fn chain_id(self) -> u64 {
        match self {
            BridgeChain::BaseSepolia => 84532,
            BridgeChain::ArbitrumSepolia => 421614,
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            BridgeChain::BaseSepolia => BridgeChain::ArbitrumSepolia,
            BridgeChain::ArbitrumSepolia => BridgeChain::BaseSepolia,
        }
    }
}

/// Editable bridge form state.
#[derive(Debug, Clone)]
pub struct BridgeForm {
    pub token: usize,
    pub destination: BridgeChain,
    pub amount: String,
}

impl Default for BridgeForm {
    fn default() -> Self {
        Self {
            // qsp
            token: 6,
            destination: BridgeChain::BaseSepolia,
            amount: String::new(),
        }
    }
}

impl BridgeForm {
    pub fn token_symbol(&self) -> &'static str {
        BASE_TOKENS[self.token % BASE_TOKENS.len()].0
    }

    pub fn next_token(&mut self) {
        self.token = (self.token + 1) % BASE_TOKENS.len();
    }

    pub fn prev_token(&mut self) {
        self.token = (self.token + BASE_TOKENS.len() - 1) % BASE_TOKENS.len();
    }

    /// Build the request, rejecting non-positive or unparsable amounts.
    pub fn to_request(&self) -> Result<BridgeRequest, ApiError> {
        let amount: f64 = self
            .amount
            .trim()
            .parse()
            .map_err(|_| ApiError::InvalidInput("Amount must be a number".to_string()))?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ApiError::InvalidInput(
                "Amount must be greater than 0".to_string(),
            ));
        }

        Ok(BridgeRequest {
            asset: self.token_symbol().to_string(),
            amount,
            destination_bridge: self.destination.chain_id(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_form_bridges_qsp_to_base_sepolia() {
        let form = BridgeForm {
            amount: "2.5".into(),
            ..BridgeForm::default()
        };
        let req = form.to_request().unwrap();
        assert_eq!(req.asset, "qsp");
        assert_eq!(req.amount, 2.5);
        assert_eq!(req.destination_bridge, 84532);
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        for amount in ["0", "-1", "", "abc", "NaN", "inf"] {
            let form = BridgeForm {
                amount: amount.into(),
                ..BridgeForm::default()
            };
            assert!(form.to_request().is_err(), "accepted {:?}", amount);
        }
    }

    #[test]
    fn token_cycle_wraps() {
        let mut form = BridgeForm {
            token: 0,
            ..BridgeForm::default()
        };
        form.prev_token();
        assert_eq!(form.token_symbol(), "usdt");
        form.next_token();
        assert_eq!(form.token_symbol(), "usdc");
        assert_eq!(BridgeChain::BaseSepolia.toggle().chain_id(), 421614);
    }
}
