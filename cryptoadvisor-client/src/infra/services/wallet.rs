//! Wallet service trait
//!
//! The remote authority for a user's balance. `ApiClient` is the production
//! implementation; `infra::testing::stubs::StubWalletApi` drives tests.

use async_trait::async_trait;
use cryptoadvisor_model::OwnerId;

use crate::infra::errors::ApiError;

#[async_trait]
pub trait WalletApi: Send + Sync + std::fmt::Debug {
    /// Authoritative balance for `owner`.
    async fn fetch_balance(&self, owner: &OwnerId) -> Result<f64, ApiError>;

    /// Credit `amount` to `owner`; returns the balance after the deposit.
    async fn deposit(
        &self,
        owner: &OwnerId,
        amount: f64,
    ) -> Result<f64, ApiError>;
}
