//! Test doubles shared by unit and integration tests
//!
//! Time-dependent behavior is driven with tokio's paused clock
//! (`#[tokio::test(start_paused = true)]`) rather than a custom provider.

pub mod recorder;
pub mod stubs;

pub use recorder::Recorder;
pub use stubs::StubWalletApi;
