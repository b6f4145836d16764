//! Infrastructure module containing the HTTP client and shared utilities
//!
//! This module provides foundational services used across all domains

pub mod api_client;
pub mod api_types;
pub mod constants;
pub mod errors;
pub mod services;

pub mod testing;

// Re-export commonly used items
pub use api_client::ApiClient;
pub use errors::ApiError;
pub use services::WalletApi;
