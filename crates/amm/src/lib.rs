//! CosmoDEX constant-product pool engine
//!
//! A single two-token pool priced by `x * y = k` with a 0.3% swap fee that
//! stays in the reserves. Liquidity providers hold fungible shares; every
//! swap is appended to a queryable trade log. All state changes go through
//! [`PoolService`], which serializes them, journals them and settles token
//! movement with a [`Custody`] backend.

pub mod auth;
pub mod calculator;
pub mod constants;
pub mod custody;
pub mod journal;
pub mod ledger;
pub mod pool;
pub mod service;
pub mod state;
pub mod swap;
pub mod trade_log;

#[cfg(test)]
mod proptest_properties;

// Re-exports
pub use auth::OperatorSet;
pub use calculator::{
    apply_slippage, get_amount_in, get_amount_out, initial_liquidity, liquidity_to_mint,
    price_impact, redeem_amounts, spot_price, suggest_min_output,
};
pub use constants::{fees, slippage};
pub use custody::{BalanceBook, Custody, PreFunded, Transfer};
pub use journal::{FileJournal, Journal, JournalEntry, JournalFile, MemoryJournal};
pub use pool::{Pool, Transition};
pub use service::PoolService;
pub use state::{
    LiquidityAdded, LiquidityPosition, LiquidityRemoved, Operation, PoolEvent, PoolSnapshot,
    SwapQuote, Swapped, TradeRecord, TraderStats,
};
pub use trade_log::TradeLog;
