//! Tuning constants shared across domains. Adjust here so every consumer
//! picks up the same values.

use std::time::Duration;

pub mod wallet {
    use super::Duration;

    /// Background balance refresh cadence.
    pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

    /// Preset deposit shortcuts offered next to the amount field.
    pub const QUICK_AMOUNTS: [f64; 5] =
        [100.0, 500.0, 1_000.0, 2_500.0, 5_000.0];
}

pub mod carousel {
    use super::Duration;

    /// Delay between autoplay page advances.
    pub const AUTOPLAY_INTERVAL: Duration = Duration::from_secs(5);

    /// Cards shown by the home page's top-markets carousel.
    pub const TOP_MARKETS_LEN: usize = 5;
}

pub mod http {
    use super::Duration;

    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
}
