//! AMM State Types
//!
//! Data structures for operations, trades, events, and query results.

use cosmo_core::{Address, Amount, Direction, Side, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of pool mutations. Also the payload of journal entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    AddLiquidity {
        caller: Address,
        #[serde(with = "amount_string")]
        amount_a: Amount,
        #[serde(with = "amount_string")]
        amount_b: Amount,
        #[serde(with = "amount_string")]
        min_liquidity: Amount,
    },
    RemoveLiquidity {
        caller: Address,
        #[serde(with = "amount_string")]
        liquidity: Amount,
        #[serde(with = "amount_string")]
        min_amount_a: Amount,
        #[serde(with = "amount_string")]
        min_amount_b: Amount,
    },
    Swap {
        caller: Address,
        #[serde(with = "amount_string")]
        amount_in: Amount,
        #[serde(with = "amount_string")]
        min_amount_out: Amount,
        direction: Direction,
    },
    /// Privileged swap: `operator` spends `trader`'s input and the output
    /// goes to `recipient`
    TriggeredSwap {
        operator: Address,
        trader: Address,
        recipient: Address,
        #[serde(with = "amount_string")]
        amount_in: Amount,
        #[serde(with = "amount_string")]
        min_amount_out: Amount,
        direction: Direction,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddLiquidity { .. } => "add_liquidity",
            Self::RemoveLiquidity { .. } => "remove_liquidity",
            Self::Swap { .. } => "swap",
            Self::TriggeredSwap { .. } => "triggered_swap",
        }
    }
}

/// Immutable trade log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Position in the global trade log
    pub index: u64,
    pub trader: Address,
    pub token_in: Side,
    pub token_out: Side,
    #[serde(with = "amount_string")]
    pub amount_in: Amount,
    #[serde(with = "amount_string")]
    pub amount_out: Amount,
    /// Receiver of the output; the trader unless the swap was triggered
    pub recipient: Address,
    /// Operator that triggered the swap, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triggered_by: Option<Address>,
    pub timestamp: Timestamp,
}

/// Emitted by `add_liquidity`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityAdded {
    pub provider: Address,
    #[serde(with = "amount_string")]
    pub amount_a: Amount,
    #[serde(with = "amount_string")]
    pub amount_b: Amount,
    #[serde(with = "amount_string")]
    pub minted: Amount,
}

/// Emitted by `remove_liquidity`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityRemoved {
    pub provider: Address,
    #[serde(with = "amount_string")]
    pub amount_a: Amount,
    #[serde(with = "amount_string")]
    pub amount_b: Amount,
    #[serde(with = "amount_string")]
    pub burned: Amount,
}

/// Emitted by both swap variants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Swapped {
    pub trade: TradeRecord,
}

impl Swapped {
    pub fn amount_out(&self) -> Amount {
        self.trade.amount_out
    }
}

/// Pool events, published after each committed mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PoolEvent {
    AddLiquidity(LiquidityAdded),
    RemoveLiquidity(LiquidityRemoved),
    Swap(Swapped),
    TriggeredSwap(Swapped),
}

impl fmt::Display for PoolEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddLiquidity(e) => write!(
                f,
                "AddLiquidity {} | A: {} | B: {} | minted: {}",
                e.provider.short(),
                e.amount_a,
                e.amount_b,
                e.minted
            ),
            Self::RemoveLiquidity(e) => write!(
                f,
                "RemoveLiquidity {} | A: {} | B: {} | burned: {}",
                e.provider.short(),
                e.amount_a,
                e.amount_b,
                e.burned
            ),
            Self::Swap(e) | Self::TriggeredSwap(e) => write!(
                f,
                "Swap #{} {} | {} {} -> {} {}",
                e.trade.index,
                e.trade.trader.short(),
                e.trade.amount_in,
                e.trade.token_in,
                e.trade.amount_out,
                e.trade.token_out
            ),
        }
    }
}

/// Consistent view of pool state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    #[serde(with = "amount_string")]
    pub reserve_a: Amount,
    #[serde(with = "amount_string")]
    pub reserve_b: Amount,
    #[serde(with = "amount_string")]
    pub total_liquidity: Amount,
    pub trade_count: u64,
    /// Number of committed mutations
    pub sequence: u64,
}

impl PoolSnapshot {
    /// (reserve_in, reserve_out) for a swap direction
    pub fn reserves_for(&self, direction: Direction) -> (Amount, Amount) {
        match direction {
            Direction::AToB => (self.reserve_a, self.reserve_b),
            Direction::BToA => (self.reserve_b, self.reserve_a),
        }
    }
}

/// A holder's liquidity position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityPosition {
    pub holder: Address,
    #[serde(with = "amount_string")]
    pub shares: Amount,
    /// Token A released if the shares were burned now
    #[serde(with = "amount_string")]
    pub amount_a: Amount,
    /// Token B released if the shares were burned now
    #[serde(with = "amount_string")]
    pub amount_b: Amount,
    /// Share of the pool, percent
    pub pool_share: f64,
}

/// Swap quote with calculated values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapQuote {
    pub direction: Direction,
    #[serde(with = "amount_string")]
    pub amount_in: Amount,
    #[serde(with = "amount_string")]
    pub amount_out: Amount,
    /// Input retained by the pool as fee
    #[serde(with = "amount_string")]
    pub fee_amount: Amount,
    /// Price impact percentage
    pub price_impact: f64,
    /// Output whole tokens per input whole token before the trade
    pub spot_price: f64,
    /// Suggested min output with default slippage
    #[serde(with = "amount_string")]
    pub min_output_suggested: Amount,
}

/// Per-trader running totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraderStats {
    pub trade_count: u64,
    #[serde(with = "amount_string")]
    pub volume_in_a: Amount,
    #[serde(with = "amount_string")]
    pub volume_in_b: Amount,
    #[serde(with = "amount_string")]
    pub volume_out_a: Amount,
    #[serde(with = "amount_string")]
    pub volume_out_b: Amount,
}

/// Serialize `u128` amounts as decimal strings; JSON consumers lose
/// precision above 2^53.
pub mod amount_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
