//! Application wiring shared by the binary and integration tests

pub mod bootstrap;

pub use bootstrap::{ClientConfig, ConfigError};

use env_logger::{Builder, Target};
use log::LevelFilter;

/// Initialize logging: `RUST_LOG` when set, otherwise warnings globally and
/// debug output for this crate.
pub fn init_logger() {
    if std::env::var("RUST_LOG").is_ok() {
        env_logger::init();
        log::debug!("Initialized logger from env");
    } else {
        Builder::new()
            .target(Target::Stdout)
            .filter_level(LevelFilter::Warn)
            .filter_module("cryptoadvisor_client", LevelFilter::Debug)
            .filter_module("cryptoadvisor", LevelFilter::Debug)
            .init();
    }
}
