//! Error types for CosmoDEX

use thiserror::Error;

/// Core errors that can occur in CosmoDEX
#[derive(Debug, Error)]
pub enum Error {
    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid address: {address}")]
    InvalidAddress { address: String },
}

/// Pool engine errors. Every one of them aborts the operation with no
/// state change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Insufficient balance: need {required}, have {available}")]
    InsufficientBalance { required: u128, available: u128 },

    #[error("Slippage exceeded on {quantity}: got {got}, bound {bound}")]
    SlippageExceeded {
        quantity: &'static str,
        got: u128,
        bound: u128,
    },

    #[error("Caller {caller} is not authorized")]
    Unauthorized { caller: String },

    #[error("Custody transfer failed: {message}")]
    Custody { message: String },
}

/// Journal and recovery errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt journal entry at line {line}: {message}")]
    Corrupt { line: usize, message: String },

    #[error("Journal replay failed at sequence {sequence}: {source}")]
    Replay {
        sequence: u64,
        #[source]
        source: PoolError,
    },
}

/// Result type alias for CosmoDEX operations
pub type Result<T> = std::result::Result<T, Error>;

impl PoolError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::InsufficientBalance { .. } => "insufficient_balance",
            Self::SlippageExceeded { .. } => "slippage_exceeded",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Custody { .. } => "custody_failed",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput { .. } => 400,
            Self::Unauthorized { .. } => 403,
            Self::Custody { .. } => 409,
            Self::InsufficientBalance { .. } | Self::SlippageExceeded { .. } => 422,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_error_codes() {
        let err = PoolError::invalid("zero amount");
        assert_eq!(err.error_code(), "invalid_input");
        assert_eq!(err.status_code(), 400);

        let err = PoolError::SlippageExceeded {
            quantity: "amount_out",
            got: 90,
            bound: 100,
        };
        assert_eq!(err.error_code(), "slippage_exceeded");
        assert_eq!(err.status_code(), 422);
        assert_eq!(
            err.to_string(),
            "Slippage exceeded on amount_out: got 90, bound 100"
        );

        let err = PoolError::Unauthorized {
            caller: "0xabc".into(),
        };
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn test_error_wraps_pool_error() {
        let err: Error = PoolError::InsufficientBalance {
            required: 10,
            available: 5,
        }
        .into();
        assert!(matches!(err, Error::Pool(PoolError::InsufficientBalance { .. })));
    }
}
