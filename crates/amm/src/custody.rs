//! Token custody seam
//!
//! The engine never moves tokens itself. Each planned mutation carries the
//! transfers it implies and the service hands them to a [`Custody`]
//! implementation, which must apply all of them or none.

use std::collections::HashMap;
use std::sync::Mutex;

use cosmo_core::{Address, Amount, PoolError, Side};
use serde::{Deserialize, Serialize};

/// One token movement between an account and the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transfer {
    /// Tokens moved from `from` into pool custody
    In {
        side: Side,
        from: Address,
        #[serde(with = "crate::state::amount_string")]
        amount: Amount,
    },
    /// Tokens released from pool custody to `to`
    Out {
        side: Side,
        to: Address,
        #[serde(with = "crate::state::amount_string")]
        amount: Amount,
    },
}

impl Transfer {
    pub fn amount(&self) -> Amount {
        match self {
            Self::In { amount, .. } | Self::Out { amount, .. } => *amount,
        }
    }
}

/// Custody collaborator. `settle` is all-or-nothing; `reverse` undoes a
/// previously settled batch.
pub trait Custody: Send + Sync {
    fn settle(&self, transfers: &[Transfer]) -> Result<(), PoolError>;

    fn reverse(&self, transfers: &[Transfer]);
}

/// For callers that moved tokens into the pool before invoking it
#[derive(Debug, Clone, Copy, Default)]
pub struct PreFunded;

impl Custody for PreFunded {
    fn settle(&self, _transfers: &[Transfer]) -> Result<(), PoolError> {
        Ok(())
    }

    fn reverse(&self, _transfers: &[Transfer]) {}
}

/// In-memory balances per (side, account)
#[derive(Debug, Default)]
pub struct BalanceBook {
    balances: Mutex<HashMap<(Side, Address), Amount>>,
}

impl BalanceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn credit(&self, side: Side, account: Address, amount: Amount) {
        let mut balances = self.lock();
        let entry = balances.entry((side, account)).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    pub fn balance_of(&self, side: Side, account: &Address) -> Amount {
        self.lock().get(&(side, *account)).copied().unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(Side, Address), Amount>> {
        // Balances stay consistent across a poisoned lock: every update is a
        // single insert.
        self.balances
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Custody for BalanceBook {
    fn settle(&self, transfers: &[Transfer]) -> Result<(), PoolError> {
        let mut balances = self.lock();

        // Check every inbound leg (aggregated per account) before touching anything.
        let mut debits: HashMap<(Side, Address), Amount> = HashMap::new();
        for transfer in transfers {
            if let Transfer::In { side, from, amount } = *transfer {
                let total = debits.entry((side, from)).or_insert(0);
                *total = total.saturating_add(amount);
            }
        }
        for (&(side, from), &required) in &debits {
            let available = balances.get(&(side, from)).copied().unwrap_or(0);
            if available < required {
                return Err(PoolError::Custody {
                    message: format!(
                        "{} holds {} of token {}, needs {}",
                        from, available, side, required
                    ),
                });
            }
        }

        for transfer in transfers {
            match *transfer {
                Transfer::In { side, from, amount } => {
                    if let Some(balance) = balances.get_mut(&(side, from)) {
                        *balance -= amount;
                    }
                }
                Transfer::Out { side, to, amount } => {
                    let balance = balances.entry((side, to)).or_insert(0);
                    *balance = balance.saturating_add(amount);
                }
            }
        }
        Ok(())
    }

    fn reverse(&self, transfers: &[Transfer]) {
        let mut balances = self.lock();
        for transfer in transfers.iter().rev() {
            match *transfer {
                Transfer::In { side, from, amount } => {
                    let balance = balances.entry((side, from)).or_insert(0);
                    *balance = balance.saturating_add(amount);
                }
                Transfer::Out { side, to, amount } => {
                    let balance = balances.entry((side, to)).or_insert(0);
                    *balance = balance.saturating_sub(amount);
                }
            }
        }
    }
}
