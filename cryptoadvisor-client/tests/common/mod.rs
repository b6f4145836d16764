//! Shared fixtures for the client integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use cryptoadvisor_client::domains::wallet::BalanceStore;
use cryptoadvisor_client::infra::testing::StubWalletApi;
use cryptoadvisor_model::{Balance, OwnerId};

pub fn owner() -> OwnerId {
    OwnerId::new("1").unwrap()
}

/// A store for [`owner`] backed by `stub`, seeded at sequence zero.
pub fn store(stub: &StubWalletApi, seed: f64) -> Arc<BalanceStore> {
    Arc::new(BalanceStore::new(
        owner(),
        Arc::new(stub.clone()),
        Balance::seeded(seed),
    ))
}

/// Poll `condition` on real time until it holds or `limit` elapses.
pub async fn eventually(limit: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
