//! Wallet domain
//!
//! Deposit validation, the session balance store and its background poller.

pub mod errors;
pub mod poller;
pub mod store;
pub mod validator;

pub use errors::{DepositRejection, WalletError};
pub use poller::{PollError, PollScheduler, PollStats};
pub use store::{BalanceStore, RefreshOutcome};
pub use validator::{DepositRequest, DepositValidator, validate};
