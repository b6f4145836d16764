//! Session domain
//!
//! Owns the per-user balance store and its poller for the lifetime of a
//! login, and keeps the locally stored seed record current.

pub mod manager;
pub mod storage;

pub use manager::{Session, SessionError};
pub use storage::SessionStorage;
