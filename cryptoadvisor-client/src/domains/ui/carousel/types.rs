//! Shared types for the carousel module

use std::cmp::Ordering;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use cryptoadvisor_model::MarketCard;
use thiserror::Error;

use crate::infra::constants::carousel::AUTOPLAY_INTERVAL;

/// Unique key for identifying carousels throughout the app.
/// At most one keyboard listener is registered per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CarouselKey {
    TopMarkets,
    Portfolio,
    Custom(&'static str),
}

/// Something a carousel can show. The key identifies an item across
/// refreshes of the collection, so expansion survives a reload.
pub trait CarouselItem: Clone + Send + Sync + 'static {
    type Key: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    fn key(&self) -> Self::Key;
}

impl CarouselItem for MarketCard {
    type Key = String;

    fn key(&self) -> String {
        self.symbol.clone()
    }
}

pub type Filter<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;
pub type Comparator<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Static configuration for a carousel instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarouselConfig {
    pub page_size: usize,
    pub autoplay_interval: Duration,
    /// Enable autoplay as soon as the carousel mounts.
    pub autoplay_on_mount: bool,
}

impl CarouselConfig {
    /// One card at a time, advancing on its own.
    pub const fn top_markets() -> Self {
        Self {
            page_size: 1,
            autoplay_interval: AUTOPLAY_INTERVAL,
            autoplay_on_mount: true,
        }
    }

    pub const fn grid(page_size: usize) -> Self {
        Self {
            page_size,
            autoplay_interval: AUTOPLAY_INTERVAL,
            autoplay_on_mount: false,
        }
    }
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self::grid(3)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CarouselError {
    #[error("Page size must be at least 1")]
    InvalidPageSize,
}
