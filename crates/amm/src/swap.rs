//! Swap engine

use cosmo_core::{Address, Amount, Direction, PoolError, Timestamp};

use crate::calculator;
use crate::custody::Transfer;
use crate::pool::{checked_add, Pool, Transition};
use crate::state::{PoolEvent, Swapped, TradeRecord};

impl Pool {
    /// Plan a swap of `amount_in` paid by the caller, output to the caller
    pub fn plan_swap(
        &self,
        caller: Address,
        amount_in: Amount,
        min_amount_out: Amount,
        direction: Direction,
        timestamp: Timestamp,
    ) -> Result<Transition, PoolError> {
        self.plan_trade(
            caller,
            caller,
            None,
            amount_in,
            min_amount_out,
            direction,
            timestamp,
        )
    }

    /// Plan a swap executed by `operator` on behalf of `trader`, with the
    /// output sent to `recipient`. Authorization of the operator happens
    /// before this is called; pricing is identical to [`Pool::plan_swap`].
    #[allow(clippy::too_many_arguments)]
    pub fn plan_triggered_swap(
        &self,
        operator: Address,
        trader: Address,
        recipient: Address,
        amount_in: Amount,
        min_amount_out: Amount,
        direction: Direction,
        timestamp: Timestamp,
    ) -> Result<Transition, PoolError> {
        self.plan_trade(
            trader,
            recipient,
            Some(operator),
            amount_in,
            min_amount_out,
            direction,
            timestamp,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn plan_trade(
        &self,
        trader: Address,
        recipient: Address,
        operator: Option<Address>,
        amount_in: Amount,
        min_amount_out: Amount,
        direction: Direction,
        timestamp: Timestamp,
    ) -> Result<Transition, PoolError> {
        let (reserve_in, reserve_out) = self.reserves_for(direction);
        let amount_out = calculator::get_amount_out(amount_in, reserve_in, reserve_out)?;

        if amount_out == 0 {
            return Err(PoolError::invalid(format!(
                "amount_in {} is too small to produce any output",
                amount_in
            )));
        }
        if amount_out < min_amount_out {
            return Err(PoolError::SlippageExceeded {
                quantity: "amount_out",
                got: amount_out,
                bound: min_amount_out,
            });
        }

        let new_reserve_in = checked_add(reserve_in, amount_in, "input reserve")?;
        let new_reserve_out = reserve_out - amount_out;
        let (reserve_a, reserve_b) = match direction {
            Direction::AToB => (new_reserve_in, new_reserve_out),
            Direction::BToA => (new_reserve_out, new_reserve_in),
        };

        let trade = TradeRecord {
            index: self.trades.next_index(),
            trader,
            token_in: direction.input_side(),
            token_out: direction.output_side(),
            amount_in,
            amount_out,
            recipient,
            triggered_by: operator,
            timestamp,
        };
        let swapped = Swapped {
            trade: trade.clone(),
        };
        let event = match operator {
            Some(_) => PoolEvent::TriggeredSwap(swapped),
            None => PoolEvent::Swap(swapped),
        };

        Ok(Transition {
            base_sequence: self.sequence,
            reserve_a,
            reserve_b,
            total_liquidity: self.total_liquidity,
            share_update: None,
            trade: Some(trade),
            event,
            transfers: vec![
                Transfer::In {
                    side: direction.input_side(),
                    from: trader,
                    amount: amount_in,
                },
                Transfer::Out {
                    side: direction.output_side(),
                    to: recipient,
                    amount: amount_out,
                },
            ],
        })
    }

    /// Swap for the caller and append the trade to the log
    pub fn swap(
        &mut self,
        caller: Address,
        amount_in: Amount,
        min_amount_out: Amount,
        direction: Direction,
        timestamp: Timestamp,
    ) -> Result<Swapped, PoolError> {
        let transition = self.plan_swap(caller, amount_in, min_amount_out, direction, timestamp)?;
        Ok(Self::into_swapped(self.commit(transition)))
    }

    /// Privileged swap on behalf of `trader`, paying out to `recipient`
    #[allow(clippy::too_many_arguments)]
    pub fn triggered_swap(
        &mut self,
        operator: Address,
        trader: Address,
        recipient: Address,
        amount_in: Amount,
        min_amount_out: Amount,
        direction: Direction,
        timestamp: Timestamp,
    ) -> Result<Swapped, PoolError> {
        let transition = self.plan_triggered_swap(
            operator,
            trader,
            recipient,
            amount_in,
            min_amount_out,
            direction,
            timestamp,
        )?;
        Ok(Self::into_swapped(self.commit(transition)))
    }

    fn into_swapped(event: PoolEvent) -> Swapped {
        match event {
            PoolEvent::Swap(swapped) | PoolEvent::TriggeredSwap(swapped) => swapped,
            _ => unreachable!("swap plans a Swap event"),
        }
    }
}
