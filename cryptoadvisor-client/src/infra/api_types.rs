//! Wire types for the advisory backend's wallet endpoints

use cryptoadvisor_model::OwnerId;
use serde::{Deserialize, Serialize};

/// `GET /balance/{owner}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub balance: f64,
}

/// Body of `POST /deposit/{owner}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepositBody {
    pub amount: f64,
}

/// Successful `POST /deposit/{owner}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepositResponse {
    pub new_balance: f64,
}

/// Error payload the backend attaches to 4xx responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

pub mod routes {
    use super::OwnerId;

    pub fn balance(owner: &OwnerId) -> String {
        format!("/balance/{}", owner)
    }

    pub fn deposit(owner: &OwnerId) -> String {
        format!("/deposit/{}", owner)
    }
}
