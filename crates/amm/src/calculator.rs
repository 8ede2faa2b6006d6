//! AMM Calculator
//!
//! Pool math using the constant product formula (x * y = k) with a 0.3% fee
//! taken from the input side. All state-affecting results use floor
//! division on arbitrary-precision intermediates; the `f64` helpers at the
//! bottom are for display only and never feed back into pool state.

use cosmo_core::{Amount, PoolError};
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

use crate::constants::{fees, slippage};

fn big(value: Amount) -> BigUint {
    BigUint::from(value)
}

fn narrow(value: BigUint, what: &str) -> Result<Amount, PoolError> {
    value
        .to_u128()
        .ok_or_else(|| PoolError::invalid(format!("{} overflows the amount range", what)))
}

/// Calculate swap output for an exact input.
///
/// Formula: output = (amount_in * 997 * reserve_out) / (reserve_in * 1000 + amount_in * 997)
///
/// The result is always strictly below `reserve_out`.
pub fn get_amount_out(
    amount_in: Amount,
    reserve_in: Amount,
    reserve_out: Amount,
) -> Result<Amount, PoolError> {
    if amount_in == 0 {
        return Err(PoolError::invalid("amount_in must be greater than 0"));
    }
    if reserve_in == 0 || reserve_out == 0 {
        return Err(PoolError::invalid("pool has no liquidity"));
    }

    let amount_in_with_fee = big(amount_in) * fees::FEE_NUM;
    let numerator = &amount_in_with_fee * big(reserve_out);
    let denominator = big(reserve_in) * fees::FEE_DENOM + amount_in_with_fee;

    narrow(numerator / denominator, "amount_out")
}

/// Calculate the input required for an exact output (reverse calculation).
///
/// Formula: input = (reserve_in * amount_out * 1000) / ((reserve_out - amount_out) * 997) + 1
///
/// The `+ 1` rounds up so that feeding the result back through
/// [`get_amount_out`] yields at least `amount_out`.
pub fn get_amount_in(
    amount_out: Amount,
    reserve_in: Amount,
    reserve_out: Amount,
) -> Result<Amount, PoolError> {
    if amount_out == 0 {
        return Err(PoolError::invalid("amount_out must be greater than 0"));
    }
    if amount_out >= reserve_out {
        return Err(PoolError::invalid(format!(
            "amount_out {} would drain reserve {}",
            amount_out, reserve_out
        )));
    }
    if reserve_in == 0 {
        return Err(PoolError::invalid("pool has no liquidity"));
    }

    let numerator = big(reserve_in) * big(amount_out) * fees::FEE_DENOM;
    let denominator = big(reserve_out - amount_out) * fees::FEE_NUM;

    narrow(numerator / denominator + 1u32, "amount_in")
}

/// Shares minted by the first deposit: floor(sqrt(amount_a * amount_b)).
///
/// Never overflows, the square root of a product of two `u128`s fits in a `u128`.
pub fn initial_liquidity(amount_a: Amount, amount_b: Amount) -> Amount {
    let root = (big(amount_a) * big(amount_b)).sqrt();
    root.to_u128().unwrap_or(Amount::MAX)
}

/// Shares minted by a deposit into a live pool.
///
/// reward = min(amount_a * total / reserve_a, amount_b * total / reserve_b)
pub fn liquidity_to_mint(
    amount_a: Amount,
    amount_b: Amount,
    reserve_a: Amount,
    reserve_b: Amount,
    total_liquidity: Amount,
) -> Result<Amount, PoolError> {
    if reserve_a == 0 || reserve_b == 0 || total_liquidity == 0 {
        return Err(PoolError::invalid("pool has no liquidity"));
    }
    let total = big(total_liquidity);
    let by_a = big(amount_a) * &total / big(reserve_a);
    let by_b = big(amount_b) * &total / big(reserve_b);
    narrow(by_a.min(by_b), "minted liquidity")
}

/// Token amounts released by burning `liquidity` shares.
///
/// amount_x = reserve_x * liquidity / total, except that burning the whole
/// supply releases the whole reserves so no dust is left behind.
pub fn redeem_amounts(
    reserve_a: Amount,
    reserve_b: Amount,
    total_liquidity: Amount,
    liquidity: Amount,
) -> (Amount, Amount) {
    if total_liquidity == 0 {
        return (0, 0);
    }
    if liquidity >= total_liquidity {
        return (reserve_a, reserve_b);
    }
    let total = big(total_liquidity);
    let share = big(liquidity);
    // Both quotients are below the reserve they scale.
    let out_a = (big(reserve_a) * &share / &total).to_u128().unwrap_or(0);
    let out_b = (big(reserve_b) * &share / &total).to_u128().unwrap_or(0);
    (out_a, out_b)
}

/// Portion of the input retained by the pool as fee
pub fn fee_amount(amount_in: Amount) -> Amount {
    let after_fee = big(amount_in) * fees::FEE_NUM / fees::FEE_DENOM;
    amount_in - after_fee.to_u128().unwrap_or(amount_in)
}

/// Apply a slippage tolerance (basis points) to an output amount, rounding down
pub fn apply_slippage(amount: Amount, slippage_bps: u32) -> Amount {
    let keep = slippage::BPS_DENOM.saturating_sub(slippage_bps);
    let scaled = big(amount) * keep / slippage::BPS_DENOM;
    scaled.to_u128().unwrap_or(0)
}

/// Suggest minimum output with default slippage (0.5%)
pub fn suggest_min_output(amount: Amount) -> Amount {
    apply_slippage(amount, slippage::DEFAULT_SLIPPAGE_BPS)
}

/// Output whole-token units per input whole-token unit
pub fn spot_price(
    reserve_in: Amount,
    reserve_out: Amount,
    decimals_in: u8,
    decimals_out: u8,
) -> f64 {
    if reserve_in == 0 || reserve_out == 0 {
        return 0.0;
    }
    let scale = 10f64.powi(decimals_in as i32 - decimals_out as i32);
    reserve_out as f64 / reserve_in as f64 * scale
}

/// Calculate price impact as percentage
pub fn price_impact(
    reserve_in: Amount,
    reserve_out: Amount,
    amount_in: Amount,
    amount_out: Amount,
) -> f64 {
    if reserve_in == 0 || amount_in == 0 || amount_out == 0 {
        return 0.0;
    }

    let spot = reserve_out as f64 / reserve_in as f64;
    let execution = amount_out as f64 / amount_in as f64;

    if spot == 0.0 {
        return 0.0;
    }

    ((spot - execution) / spot).abs() * 100.0
}

/// Share of the pool held by `shares`, in percent
pub fn pool_share(shares: Amount, total_liquidity: Amount) -> f64 {
    if total_liquidity.is_zero() {
        return 0.0;
    }
    shares as f64 / total_liquidity as f64 * 100.0
}
