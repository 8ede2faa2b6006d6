//! Pool aggregate
//!
//! Owns the reserves, the share ledger and the trade log for one token
//! pair. Mutations are split in two steps: a `plan_*` method validates the
//! request against the current state and computes a [`Transition`] without
//! touching anything, and [`Pool::commit`] installs it. A failed plan
//! therefore leaves the pool exactly as it was.

use std::collections::BTreeMap;

use cosmo_core::{Address, Amount, Direction, PoolConfig, PoolError, Side, Timestamp, TokenInfo};

use crate::calculator;
use crate::custody::Transfer;
use crate::state::{
    LiquidityPosition, Operation, PoolEvent, PoolSnapshot, SwapQuote, TradeRecord, TraderStats,
};
use crate::trade_log::TradeLog;

/// Fully computed effect of one mutation, ready to commit
#[derive(Debug, Clone)]
pub struct Transition {
    pub(crate) base_sequence: u64,
    pub(crate) reserve_a: Amount,
    pub(crate) reserve_b: Amount,
    pub(crate) total_liquidity: Amount,
    /// Holder and their new share balance
    pub(crate) share_update: Option<(Address, Amount)>,
    pub(crate) trade: Option<TradeRecord>,
    pub(crate) event: PoolEvent,
    pub(crate) transfers: Vec<Transfer>,
}

impl Transition {
    pub fn event(&self) -> &PoolEvent {
        &self.event
    }

    /// Token movements custody must settle for this transition
    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    /// Sequence number the pool will have after commit
    pub fn sequence(&self) -> u64 {
        self.base_sequence + 1
    }
}

#[derive(Debug, Clone)]
pub struct Pool {
    token_a: TokenInfo,
    token_b: TokenInfo,
    pub(crate) reserve_a: Amount,
    pub(crate) reserve_b: Amount,
    pub(crate) total_liquidity: Amount,
    pub(crate) shares: BTreeMap<Address, Amount>,
    pub(crate) trades: TradeLog,
    pub(crate) sequence: u64,
}

impl Pool {
    /// Create an empty pool for a token pair
    pub fn new(token_a: TokenInfo, token_b: TokenInfo) -> Self {
        Self {
            token_a,
            token_b,
            reserve_a: 0,
            reserve_b: 0,
            total_liquidity: 0,
            shares: BTreeMap::new(),
            trades: TradeLog::new(),
            sequence: 0,
        }
    }

    pub fn from_config(config: &PoolConfig) -> cosmo_core::Result<Self> {
        let token_a = config.token_a.to_token_info()?;
        let token_b = config.token_b.to_token_info()?;
        if token_a.address == token_b.address {
            return Err(cosmo_core::Error::Config(format!(
                "token_a and token_b share address {}",
                token_a.address
            )));
        }
        Ok(Self::new(token_a, token_b))
    }

    pub fn token(&self, side: Side) -> &TokenInfo {
        match side {
            Side::A => &self.token_a,
            Side::B => &self.token_b,
        }
    }

    /// Map a token address to its side of the pair
    pub fn side_of(&self, token: &Address) -> Option<Side> {
        if *token == self.token_a.address {
            Some(Side::A)
        } else if *token == self.token_b.address {
            Some(Side::B)
        } else {
            None
        }
    }

    pub fn reserves(&self) -> (Amount, Amount) {
        (self.reserve_a, self.reserve_b)
    }

    pub fn total_liquidity(&self) -> Amount {
        self.total_liquidity
    }

    pub fn liquidity_of(&self, holder: &Address) -> Amount {
        self.shares.get(holder).copied().unwrap_or(0)
    }

    /// Holders with a non-zero share balance, in address order
    pub fn holders(&self) -> impl Iterator<Item = (&Address, &Amount)> {
        self.shares.iter()
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn trades(&self) -> &TradeLog {
        &self.trades
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            reserve_a: self.reserve_a,
            reserve_b: self.reserve_b,
            total_liquidity: self.total_liquidity,
            trade_count: self.trades.len() as u64,
            sequence: self.sequence,
        }
    }

    /// (reserve_in, reserve_out) for a swap direction
    pub fn reserves_for(&self, direction: Direction) -> (Amount, Amount) {
        self.snapshot().reserves_for(direction)
    }

    pub fn position(&self, holder: &Address) -> LiquidityPosition {
        let shares = self.liquidity_of(holder);
        let (amount_a, amount_b) = if shares == 0 {
            (0, 0)
        } else {
            calculator::redeem_amounts(
                self.reserve_a,
                self.reserve_b,
                self.total_liquidity,
                shares,
            )
        };
        LiquidityPosition {
            holder: *holder,
            shares,
            amount_a,
            amount_b,
            pool_share: calculator::pool_share(shares, self.total_liquidity),
        }
    }

    pub fn trader_stats(&self, trader: &Address) -> TraderStats {
        self.trades.stats(trader)
    }

    /// Output for an exact input at current reserves
    pub fn quote_out(&self, amount_in: Amount, direction: Direction) -> Result<Amount, PoolError> {
        let (reserve_in, reserve_out) = self.reserves_for(direction);
        calculator::get_amount_out(amount_in, reserve_in, reserve_out)
    }

    /// Input required for an exact output at current reserves
    pub fn quote_in(&self, amount_out: Amount, direction: Direction) -> Result<Amount, PoolError> {
        let (reserve_in, reserve_out) = self.reserves_for(direction);
        calculator::get_amount_in(amount_out, reserve_in, reserve_out)
    }

    /// Output for `amount_in` of `token_in` swapped into `token_out`
    pub fn expected_output(
        &self,
        amount_in: Amount,
        token_in: Side,
        token_out: Side,
    ) -> Result<Amount, PoolError> {
        self.quote_out(amount_in, Direction::from_sides(token_in, token_out)?)
    }

    /// Full quote with fee, impact and a suggested slippage bound
    pub fn quote(&self, amount_in: Amount, direction: Direction) -> Result<SwapQuote, PoolError> {
        let (reserve_in, reserve_out) = self.reserves_for(direction);
        let amount_out = calculator::get_amount_out(amount_in, reserve_in, reserve_out)?;
        let token_in = self.token(direction.input_side());
        let token_out = self.token(direction.output_side());

        Ok(SwapQuote {
            direction,
            amount_in,
            amount_out,
            fee_amount: calculator::fee_amount(amount_in),
            price_impact: calculator::price_impact(reserve_in, reserve_out, amount_in, amount_out),
            spot_price: calculator::spot_price(
                reserve_in,
                reserve_out,
                token_in.decimals,
                token_out.decimals,
            ),
            min_output_suggested: calculator::suggest_min_output(amount_out),
        })
    }

    /// Validate and compute any operation without mutating the pool
    pub fn plan(&self, operation: &Operation, timestamp: Timestamp) -> Result<Transition, PoolError> {
        match *operation {
            Operation::AddLiquidity {
                caller,
                amount_a,
                amount_b,
                min_liquidity,
            } => self.plan_add_liquidity(caller, amount_a, amount_b, min_liquidity),
            Operation::RemoveLiquidity {
                caller,
                liquidity,
                min_amount_a,
                min_amount_b,
            } => self.plan_remove_liquidity(caller, liquidity, min_amount_a, min_amount_b),
            Operation::Swap {
                caller,
                amount_in,
                min_amount_out,
                direction,
            } => self.plan_swap(caller, amount_in, min_amount_out, direction, timestamp),
            Operation::TriggeredSwap {
                operator,
                trader,
                recipient,
                amount_in,
                min_amount_out,
                direction,
            } => self.plan_triggered_swap(
                operator,
                trader,
                recipient,
                amount_in,
                min_amount_out,
                direction,
                timestamp,
            ),
        }
    }

    /// Install a transition planned against the current state
    pub fn commit(&mut self, transition: Transition) -> PoolEvent {
        debug_assert_eq!(
            transition.base_sequence, self.sequence,
            "transition planned against a stale pool"
        );

        self.reserve_a = transition.reserve_a;
        self.reserve_b = transition.reserve_b;
        self.total_liquidity = transition.total_liquidity;

        if let Some((holder, balance)) = transition.share_update {
            if balance == 0 {
                self.shares.remove(&holder);
            } else {
                self.shares.insert(holder, balance);
            }
        }

        if let Some(trade) = transition.trade {
            self.trades.push(trade);
        }

        self.sequence += 1;
        transition.event
    }

    /// Plan and commit in one step
    pub fn apply(
        &mut self,
        operation: &Operation,
        timestamp: Timestamp,
    ) -> Result<PoolEvent, PoolError> {
        let transition = self.plan(operation, timestamp)?;
        Ok(self.commit(transition))
    }

    /// Verify ledger invariants; returns a description of the first violation
    pub fn check_invariants(&self) -> Result<(), String> {
        let sum = self
            .shares
            .values()
            .try_fold(0u128, |acc, s| acc.checked_add(*s))
            .ok_or("share sum overflows")?;
        if sum != self.total_liquidity {
            return Err(format!(
                "share sum {} != total liquidity {}",
                sum, self.total_liquidity
            ));
        }
        if self.shares.values().any(|s| *s == 0) {
            return Err("zero share entry retained".to_string());
        }

        let empty_reserves = self.reserve_a == 0 && self.reserve_b == 0;
        let no_liquidity = self.total_liquidity == 0;
        if empty_reserves != no_liquidity {
            return Err(format!(
                "reserves ({}, {}) inconsistent with total liquidity {}",
                self.reserve_a, self.reserve_b, self.total_liquidity
            ));
        }
        if !no_liquidity && (self.reserve_a == 0 || self.reserve_b == 0) {
            return Err(format!(
                "one-sided reserves ({}, {})",
                self.reserve_a, self.reserve_b
            ));
        }
        Ok(())
    }
}

pub(crate) fn checked_add(a: Amount, b: Amount, what: &str) -> Result<Amount, PoolError> {
    a.checked_add(b)
        .ok_or_else(|| PoolError::invalid(format!("{} overflows the amount range", what)))
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_new_pool_is_empty() {
        let pool = icecream_usdc();
        assert_eq!(pool.reserves(), (0, 0));
        assert_eq!(pool.total_liquidity(), 0);
        assert_eq!(pool.sequence(), 0);
        assert!(pool.check_invariants().is_ok());
        assert!(pool.quote_out(1, Direction::AToB).is_err());
    }

    #[test]
    fn test_side_of_token_address() {
        let pool = icecream_usdc();
        assert_eq!(pool.side_of(&addr(0xa0)), Some(Side::A));
        assert_eq!(pool.side_of(&addr(0xb0)), Some(Side::B));
        assert_eq!(pool.side_of(&addr(0xc0)), None);
        assert_eq!(pool.token(Side::B).symbol, "USDC");
    }

    #[test]
    fn test_from_config_rejects_same_token() {
        let mut config = PoolConfig::default();
        config.token_b.address = config.token_a.address.to_lowercase();
        assert!(matches!(
            Pool::from_config(&config),
            Err(cosmo_core::Error::Config(_))
        ));
        assert!(Pool::from_config(&PoolConfig::default()).is_ok());
    }

    #[test]
    fn test_plan_does_not_mutate() {
        let pool = seeded();
        let before = pool.snapshot();
        let op = Operation::Swap {
            caller: addr(2),
            amount_in: 100 * E18,
            min_amount_out: 0,
            direction: Direction::AToB,
        };
        let transition = pool.plan(&op, 1).unwrap();
        assert_eq!(transition.sequence(), before.sequence + 1);
        assert_eq!(pool.snapshot(), before);
    }

    #[test]
    fn test_apply_dispatches_operations() {
        let mut pool = seeded();
        let event = pool
            .apply(
                &Operation::Swap {
                    caller: addr(2),
                    amount_in: 100 * E18,
                    min_amount_out: 0,
                    direction: Direction::AToB,
                },
                1_700_000_000,
            )
            .unwrap();
        match event {
            PoolEvent::Swap(s) => assert_eq!(s.amount_out(), 90_661_089),
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(pool.sequence(), 2);
        assert!(pool.check_invariants().is_ok());
    }

    #[test]
    fn test_quote_matches_swap_math() {
        let pool = seeded();
        let quote = pool.quote(100 * E18, Direction::AToB).unwrap();
        assert_eq!(quote.amount_out, 90_661_089);
        assert_eq!(quote.fee_amount, 300_000_000_000_000_000);
        assert!((quote.spot_price - 1.0).abs() < 1e-9);
        assert!(quote.price_impact > 9.0 && quote.price_impact < 10.0);
        assert_eq!(quote.min_output_suggested, 90_207_783);

        assert_eq!(
            pool.expected_output(100 * E18, Side::A, Side::B).unwrap(),
            90_661_089
        );
        assert!(pool.expected_output(1, Side::B, Side::B).is_err());
    }

    #[test]
    fn test_quote_in_round_trips() {
        let pool = seeded();
        let required = pool.quote_in(50 * E6, Direction::AToB).unwrap();
        assert!(pool.quote_out(required, Direction::AToB).unwrap() >= 50 * E6);
        assert!(pool.quote_in(1000 * E6, Direction::AToB).is_err());
    }

    #[test]
    fn test_position_reports_redeemable_amounts() {
        let mut pool = seeded();
        pool.add_liquidity(addr(2), 500 * E18, 500 * E6, 0).unwrap();

        let position = pool.position(&addr(2));
        assert_eq!(position.shares, pool.total_liquidity() / 3);
        assert_eq!(position.amount_a, 500 * E18);
        assert_eq!(position.amount_b, 500 * E6);
        assert!((position.pool_share - 100.0 / 3.0).abs() < 1e-9);

        let nobody = pool.position(&addr(9));
        assert_eq!(nobody.shares, 0);
        assert_eq!(nobody.amount_a, 0);
    }
}
