//! Operators allowed to trigger swaps for other identities

use std::collections::HashSet;

use cosmo_core::{Address, PoolError};

#[derive(Debug, Clone, Default)]
pub struct OperatorSet {
    operators: HashSet<Address>,
}

impl OperatorSet {
    pub fn new(operators: impl IntoIterator<Item = Address>) -> Self {
        Self {
            operators: operators.into_iter().collect(),
        }
    }

    pub fn contains(&self, caller: &Address) -> bool {
        self.operators.contains(caller)
    }

    pub fn authorize(&self, caller: &Address) -> Result<(), PoolError> {
        if self.contains(caller) {
            Ok(())
        } else {
            Err(PoolError::Unauthorized {
                caller: caller.to_string(),
            })
        }
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}
