//! Common module containing shared utilities and types
//!
//! This module provides common functionality used across multiple domains

pub mod listeners;
pub mod messages;

// Re-export commonly used items
pub use listeners::{Listeners, Subscription};
pub use messages::{CrossDomainEvent, EventBus, Topic};
