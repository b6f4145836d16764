//! CryptoAdvisor client library
//!
//! This crate contains the client-side state layer used by the executable in
//! `src/main.rs`: the session wallet (balance store, poller, deposit
//! validation), the cross-component event bus and the carousel controllers
//! that back the home and portfolio views.
//!
//! Notes
//! - Public items are subject to change while the views stabilize.
//! - The library is exposed mainly to enable testing and internal reuse.

pub mod app;
/// Listener registries and the event bus shared across domains
pub mod common;
pub mod domains;
pub mod infra;
