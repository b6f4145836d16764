//! Domain modules for the CryptoAdvisor client
//!
//! - `wallet`: deposit validation, the balance store and its poller
//! - `session`: per-login ownership of the wallet plus the persisted seed
//! - `ui`: view controllers that are independent of the wallet

pub mod session;
pub mod ui;
pub mod wallet;
