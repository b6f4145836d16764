// Service abstractions over the remote backend. Domains hold these as trait
// objects so tests can swap in the stubs from `infra::testing`.

pub mod wallet;

pub use wallet::WalletApi;
