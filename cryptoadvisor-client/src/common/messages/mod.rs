//! Cross-component notifications
//!
//! Observers that do not share a reference to the balance store (a header
//! badge and a dashboard panel mounted independently, say) meet here.

pub mod event_bus;

pub use event_bus::EventBus;

use cryptoadvisor_model::{Balance, OwnerId};

/// Delivery channel on the [`EventBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Every balance mutation applied by a store.
    Balance,
    /// Session start and end.
    Session,
    /// Failures of background work the user did not initiate.
    BackgroundErrors,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CrossDomainEvent {
    BalanceChanged { owner: OwnerId, balance: Balance },
    SessionStarted { owner: OwnerId },
    SessionEnded { owner: OwnerId },
    RefreshFailed { owner: OwnerId, message: String },
}

impl CrossDomainEvent {
    /// The topic this event is routed to by [`EventBus::emit`].
    pub fn topic(&self) -> Topic {
        match self {
            CrossDomainEvent::BalanceChanged { .. } => Topic::Balance,
            CrossDomainEvent::SessionStarted { .. }
            | CrossDomainEvent::SessionEnded { .. } => Topic::Session,
            CrossDomainEvent::RefreshFailed { .. } => Topic::BackgroundErrors,
        }
    }

    pub fn owner(&self) -> &OwnerId {
        match self {
            CrossDomainEvent::BalanceChanged { owner, .. }
            | CrossDomainEvent::SessionStarted { owner }
            | CrossDomainEvent::SessionEnded { owner }
            | CrossDomainEvent::RefreshFailed { owner, .. } => owner,
        }
    }
}
