//! Data Transfer Objects for API requests and responses
//!
//! Token amounts are decimal strings on the wire.

use amm::state::amount_string;
use amm::{TradeRecord, TraderStats};
use cosmo_core::{Address, Amount, Direction, TokenInfo};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Generic API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("bad_request", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", message)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenDto {
    pub symbol: String,
    pub address: Address,
    pub decimals: u8,
}

impl From<TokenInfo> for TokenDto {
    fn from(token: TokenInfo) -> Self {
        Self {
            symbol: token.symbol,
            address: token.address,
            decimals: token.decimals,
        }
    }
}

/// GET /config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub token_a: TokenDto,
    pub token_b: TokenDto,
    pub fee_numerator: u32,
    pub fee_denominator: u32,
    pub fee_bps: u32,
    pub trusted_forwarder: Option<Address>,
}

/// GET /pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolResponse {
    pub token_a: TokenDto,
    pub token_b: TokenDto,
    #[serde(with = "amount_string")]
    pub reserve_a: Amount,
    #[serde(with = "amount_string")]
    pub reserve_b: Amount,
    #[serde(with = "amount_string")]
    pub total_liquidity: Amount,
    pub trade_count: u64,
    /// Token B per token A, whole units
    pub price_a_in_b: f64,
    /// Token A per token B, whole units
    pub price_b_in_a: f64,
    /// Output for swapping one whole token A; absent while the pool is empty
    pub one_a_to_b: Option<String>,
    /// Output for swapping one whole token B; absent while the pool is empty
    pub one_b_to_a: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteKind {
    ExactIn,
    ExactOut,
}

/// POST /pool/quote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    /// `a`, `b` or a token address
    pub token_in: String,
    /// `a`, `b` or a token address
    pub token_out: String,
    /// Input amount for `exact_in`, desired output for `exact_out`
    #[serde(with = "amount_string")]
    pub amount: Amount,
    #[serde(default = "default_quote_kind")]
    pub kind: QuoteKind,
}

fn default_quote_kind() -> QuoteKind {
    QuoteKind::ExactIn
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub kind: QuoteKind,
    pub direction: Direction,
    #[serde(with = "amount_string")]
    pub amount_in: Amount,
    #[serde(with = "amount_string")]
    pub amount_out: Amount,
    #[serde(with = "amount_string")]
    pub fee_amount: Amount,
    pub price_impact: f64,
    pub spot_price: f64,
    #[serde(with = "amount_string")]
    pub min_output_suggested: Amount,
}

/// POST /liquidity/add
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddLiquidityRequest {
    #[serde(with = "amount_string")]
    pub amount_a: Amount,
    #[serde(with = "amount_string")]
    pub amount_b: Amount,
    #[serde(default, with = "amount_string")]
    pub min_liquidity: Amount,
}

/// POST /liquidity/remove
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveLiquidityRequest {
    #[serde(with = "amount_string")]
    pub liquidity: Amount,
    #[serde(default, with = "amount_string")]
    pub min_amount_a: Amount,
    #[serde(default, with = "amount_string")]
    pub min_amount_b: Amount,
}

/// POST /swap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapRequest {
    pub token_in: String,
    pub token_out: String,
    #[serde(with = "amount_string")]
    pub amount_in: Amount,
    #[serde(default, with = "amount_string")]
    pub min_amount_out: Amount,
}

/// POST /swap/triggered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggeredSwapRequest {
    /// Identity whose input is spent
    pub trader: Address,
    /// Receiver of the output; defaults to the trader
    #[serde(default)]
    pub recipient: Option<Address>,
    pub token_in: String,
    pub token_out: String,
    #[serde(with = "amount_string")]
    pub amount_in: Amount,
    #[serde(default, with = "amount_string")]
    pub min_amount_out: Amount,
}

/// Query string for paged trade listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TradesQuery {
    pub offset: Option<usize>,
    pub count: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradesResponse {
    pub trades: Vec<TradeRecord>,
    pub offset: usize,
    pub count: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeCountResponse {
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraderTradesResponse {
    pub trader: Address,
    pub trades: Vec<TradeRecord>,
    pub total: usize,
    pub stats: TraderStats,
}
