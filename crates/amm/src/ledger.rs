//! Liquidity ledger: minting and burning pool shares

use cosmo_core::{Address, Amount, PoolError, Side};

use crate::calculator;
use crate::custody::Transfer;
use crate::pool::{checked_add, Pool, Transition};
use crate::state::{LiquidityAdded, LiquidityRemoved, PoolEvent};

impl Pool {
    /// Plan a deposit of `amount_a` and `amount_b`.
    ///
    /// The first deposit mints `floor(sqrt(a * b))` shares; later deposits
    /// mint the smaller of the two proportional amounts. Reserves grow by the
    /// literal deposited amounts, so any imbalance accrues to existing holders.
    pub fn plan_add_liquidity(
        &self,
        caller: Address,
        amount_a: Amount,
        amount_b: Amount,
        min_liquidity: Amount,
    ) -> Result<Transition, PoolError> {
        if amount_a == 0 || amount_b == 0 {
            return Err(PoolError::invalid(
                "both deposit amounts must be greater than 0",
            ));
        }

        let minted = if self.total_liquidity == 0 {
            calculator::initial_liquidity(amount_a, amount_b)
        } else {
            calculator::liquidity_to_mint(
                amount_a,
                amount_b,
                self.reserve_a,
                self.reserve_b,
                self.total_liquidity,
            )?
        };

        if minted == 0 {
            return Err(PoolError::invalid("deposit too small to mint any shares"));
        }
        if minted < min_liquidity {
            return Err(PoolError::SlippageExceeded {
                quantity: "minted_liquidity",
                got: minted,
                bound: min_liquidity,
            });
        }

        let reserve_a = checked_add(self.reserve_a, amount_a, "reserve_a")?;
        let reserve_b = checked_add(self.reserve_b, amount_b, "reserve_b")?;
        let total_liquidity = checked_add(self.total_liquidity, minted, "total liquidity")?;
        let holder_balance = checked_add(self.liquidity_of(&caller), minted, "holder shares")?;

        Ok(Transition {
            base_sequence: self.sequence,
            reserve_a,
            reserve_b,
            total_liquidity,
            share_update: Some((caller, holder_balance)),
            trade: None,
            event: PoolEvent::AddLiquidity(LiquidityAdded {
                provider: caller,
                amount_a,
                amount_b,
                minted,
            }),
            transfers: vec![
                Transfer::In {
                    side: Side::A,
                    from: caller,
                    amount: amount_a,
                },
                Transfer::In {
                    side: Side::B,
                    from: caller,
                    amount: amount_b,
                },
            ],
        })
    }

    /// Plan burning `liquidity` of the caller's shares.
    ///
    /// Payouts round down; burning the entire supply pays out the entire
    /// reserves.
    pub fn plan_remove_liquidity(
        &self,
        caller: Address,
        liquidity: Amount,
        min_amount_a: Amount,
        min_amount_b: Amount,
    ) -> Result<Transition, PoolError> {
        if liquidity == 0 {
            return Err(PoolError::invalid("liquidity must be greater than 0"));
        }
        let held = self.liquidity_of(&caller);
        if liquidity > held {
            return Err(PoolError::InsufficientBalance {
                required: liquidity,
                available: held,
            });
        }

        let (amount_a, amount_b) = calculator::redeem_amounts(
            self.reserve_a,
            self.reserve_b,
            self.total_liquidity,
            liquidity,
        );

        if amount_a < min_amount_a {
            return Err(PoolError::SlippageExceeded {
                quantity: "amount_a",
                got: amount_a,
                bound: min_amount_a,
            });
        }
        if amount_b < min_amount_b {
            return Err(PoolError::SlippageExceeded {
                quantity: "amount_b",
                got: amount_b,
                bound: min_amount_b,
            });
        }

        let mut transfers = Vec::with_capacity(2);
        if amount_a > 0 {
            transfers.push(Transfer::Out {
                side: Side::A,
                to: caller,
                amount: amount_a,
            });
        }
        if amount_b > 0 {
            transfers.push(Transfer::Out {
                side: Side::B,
                to: caller,
                amount: amount_b,
            });
        }

        Ok(Transition {
            base_sequence: self.sequence,
            reserve_a: self.reserve_a - amount_a,
            reserve_b: self.reserve_b - amount_b,
            total_liquidity: self.total_liquidity - liquidity,
            share_update: Some((caller, held - liquidity)),
            trade: None,
            event: PoolEvent::RemoveLiquidity(LiquidityRemoved {
                provider: caller,
                amount_a,
                amount_b,
                burned: liquidity,
            }),
            transfers,
        })
    }

    /// Deposit and mint shares for `caller`
    pub fn add_liquidity(
        &mut self,
        caller: Address,
        amount_a: Amount,
        amount_b: Amount,
        min_liquidity: Amount,
    ) -> Result<LiquidityAdded, PoolError> {
        let transition = self.plan_add_liquidity(caller, amount_a, amount_b, min_liquidity)?;
        match self.commit(transition) {
            PoolEvent::AddLiquidity(added) => Ok(added),
            _ => unreachable!("add_liquidity plans an AddLiquidity event"),
        }
    }

    /// Burn shares and release the caller's portion of the reserves
    pub fn remove_liquidity(
        &mut self,
        caller: Address,
        liquidity: Amount,
        min_amount_a: Amount,
        min_amount_b: Amount,
    ) -> Result<LiquidityRemoved, PoolError> {
        let transition =
            self.plan_remove_liquidity(caller, liquidity, min_amount_a, min_amount_b)?;
        match self.commit(transition) {
            PoolEvent::RemoveLiquidity(removed) => Ok(removed),
            _ => unreachable!("remove_liquidity plans a RemoveLiquidity event"),
        }
    }
}
