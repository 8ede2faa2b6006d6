//! Property-based checks of the pool ledger.
//!
//! Random sequences of deposits, withdrawals and swaps are run against a
//! fresh pool; after every step the ledger invariants must hold, and swaps
//! must never shrink the reserve product.

use num_bigint::BigUint;
use proptest::prelude::*;

use cosmo_core::{Address, Amount, Direction};

use crate::calculator;
use crate::pool::test_support::{addr, icecream_usdc};
use crate::pool::Pool;

#[derive(Debug, Clone)]
enum Step {
    Add { holder: u8, a: Amount, b: Amount },
    Remove { holder: u8, percent: u8 },
    Swap { a_to_b: bool, amount: Amount },
}

fn amount_strategy() -> impl Strategy<Value = Amount> {
    prop_oneof![1u128..=1_000u128, 1_000u128..=1_000_000_000_000_000_000_000_000u128,]
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0u8..4, amount_strategy(), amount_strategy())
            .prop_map(|(holder, a, b)| Step::Add { holder, a, b }),
        (0u8..4, 1u8..=100).prop_map(|(holder, percent)| Step::Remove { holder, percent }),
        (any::<bool>(), amount_strategy()).prop_map(|(a_to_b, amount)| Step::Swap { a_to_b, amount }),
    ]
}

fn holder(index: u8) -> Address {
    addr(index + 1)
}

fn product(pool: &Pool) -> BigUint {
    let (a, b) = pool.reserves();
    BigUint::from(a) * b
}

fn run(pool: &mut Pool, step: &Step) -> Result<(), TestCaseError> {
    match *step {
        Step::Add { holder: h, a, b } => {
            let _ = pool.add_liquidity(holder(h), a, b, 0);
        }
        Step::Remove { holder: h, percent } => {
            let held = pool.liquidity_of(&holder(h));
            let burn = held * Amount::from(percent) / 100;
            if burn > 0 {
                let before = pool.reserves();
                let removed = pool
                    .remove_liquidity(holder(h), burn, 0, 0)
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
                prop_assert!(removed.amount_a <= before.0 && removed.amount_b <= before.1);
            }
        }
        Step::Swap { a_to_b, amount } => {
            let direction = if a_to_b {
                Direction::AToB
            } else {
                Direction::BToA
            };
            let k_before = product(pool);
            if pool.swap(addr(9), amount, 0, direction, 0).is_ok() {
                prop_assert!(
                    product(pool) >= k_before,
                    "reserve product shrank after swap"
                );
            }
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_ledger_invariants_hold(steps in prop::collection::vec(step_strategy(), 1..40)) {
        let mut pool = icecream_usdc();
        for step in &steps {
            run(&mut pool, step)?;
            if let Err(violation) = pool.check_invariants() {
                return Err(TestCaseError::fail(format!("{} after {:?}", violation, step)));
            }
        }
    }

    #[test]
    fn prop_full_withdrawal_empties_pool(steps in prop::collection::vec(step_strategy(), 1..40)) {
        let mut pool = icecream_usdc();
        for step in &steps {
            run(&mut pool, step)?;
        }

        let holders: Vec<(Address, Amount)> =
            pool.holders().map(|(h, s)| (*h, *s)).collect();
        for (h, shares) in holders {
            pool.remove_liquidity(h, shares, 0, 0)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
        }
        prop_assert_eq!(pool.reserves(), (0, 0));
        prop_assert_eq!(pool.total_liquidity(), 0);
    }

    #[test]
    fn prop_quote_round_trip_covers_output(
        reserve_in in 1_000u128..=1_000_000_000_000_000_000_000_000u128,
        reserve_out in 1_000u128..=1_000_000_000_000_000_000_000_000u128,
        fraction in 1u32..=9_999u32,
    ) {
        let amount_out = (reserve_out * Amount::from(fraction) / 10_000).max(1);
        prop_assume!(amount_out < reserve_out);

        let amount_in = calculator::get_amount_in(amount_out, reserve_in, reserve_out)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let got = calculator::get_amount_out(amount_in, reserve_in, reserve_out)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert!(got >= amount_out, "paid {} for {} but got {}", amount_in, amount_out, got);
        prop_assert!(got < reserve_out);
    }

    #[test]
    fn prop_first_deposit_mints_geometric_mean(
        a in 1u128..=u64::MAX as u128,
        b in 1u128..=u64::MAX as u128,
    ) {
        let minted = calculator::initial_liquidity(a, b);
        let lower = BigUint::from(minted) * minted;
        let upper = BigUint::from(minted + 1) * (minted + 1);
        let k = BigUint::from(a) * b;
        prop_assert!(lower <= k && k < upper);
    }
}
