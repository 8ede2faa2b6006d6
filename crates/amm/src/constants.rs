//! AMM Constants
//!
//! Fee and pagination parameters for the CosmoDEX pool.

/// Fee constants
pub mod fees {
    /// Fee numerator applied to the input side (0.3% fee = 997/1000)
    pub const FEE_NUM: u32 = 997;

    /// Fee denominator
    pub const FEE_DENOM: u32 = 1000;

    /// Fee expressed in basis points, for display
    pub const FEE_BPS: u32 = 30;
}

/// Slippage defaults used when suggesting minimum outputs
pub mod slippage {
    /// Default slippage tolerance (0.5%)
    pub const DEFAULT_SLIPPAGE_BPS: u32 = 50;

    /// Basis point denominator
    pub const BPS_DENOM: u32 = 10_000;
}

/// Trade log pagination
pub mod trade_log {
    /// Largest page the query surface hands out in one call
    pub const MAX_BATCH: usize = 500;
}
