pub mod wallet;

pub use wallet::StubWalletApi;
