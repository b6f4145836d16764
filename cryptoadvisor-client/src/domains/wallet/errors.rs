//! Wallet domain errors

use thiserror::Error;

use crate::infra::errors::ApiError;

/// Why a deposit was refused locally. Never sent to the network.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DepositRejection {
    #[error("Please enter a valid amount")]
    InvalidAmount,

    #[error("The maximum per deposit is ${cap}")]
    ExceedsPerTransactionCap { cap: f64 },

    #[error("You can only deposit ${headroom} more (limit ${cap})")]
    ExceedsAccountCap { headroom: f64, cap: f64 },
}

impl DepositRejection {
    /// Remaining room under the account cap, when that is the violated rule.
    pub fn headroom(&self) -> Option<f64> {
        match self {
            DepositRejection::ExceedsAccountCap { headroom, .. } => {
                Some(*headroom)
            }
            _ => None,
        }
    }
}

/// Failure of a user-initiated wallet action.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WalletError {
    #[error(transparent)]
    Rejected(#[from] DepositRejection),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl WalletError {
    /// The UI should offer a retry affordance.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WalletError::Api(err) if err.is_transient())
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, WalletError::Api(ApiError::RateLimited))
    }

    /// Not recoverable locally; the caller should route to login.
    pub fn requires_login(&self) -> bool {
        matches!(self, WalletError::Api(ApiError::Unauthorized))
    }
}
