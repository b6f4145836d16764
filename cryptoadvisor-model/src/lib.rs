//! Core data model definitions shared across CryptoAdvisor crates.
#![allow(missing_docs)]

#[cfg(feature = "chrono")]
pub use ::chrono;

pub mod balance;
pub mod error;
pub mod ids;
pub mod market;
pub mod session;

pub use balance::{Balance, BalanceSource, MAX_BALANCE, Sequence};
pub use error::{ModelError, Result as ModelResult};
pub use ids::OwnerId;
pub use market::{MarketCard, RiskLevel};
pub use session::SessionRecord;
