//! Wallet balance snapshot and the ordering metadata used to reconcile it.

/// Upper bound for a wallet balance, and for any single deposit.
pub const MAX_BALANCE: f64 = 10_000.0;

/// Monotonic counter ordering balance mutations by the moment they were
/// *initiated*, independent of when their network responses arrive.
///
/// `Sequence::ZERO` is reserved for the seed value a session starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sequence(pub u64);

impl Sequence {
    pub const ZERO: Sequence = Sequence(0);

    pub fn next(self) -> Sequence {
        Sequence(self.0 + 1)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where the currently displayed value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum BalanceSource {
    /// Applied locally before the remote authority confirmed it.
    Optimistic,
    /// Reported by the remote authority (or restored from the persisted seed).
    Confirmed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Balance {
    pub value: f64,
    pub sequence: Sequence,
    pub source: BalanceSource,
}

impl Balance {
    /// Initial balance for a session. Non-finite or negative seeds become
    /// zero and oversized seeds are clamped to [`MAX_BALANCE`].
    pub fn seeded(value: f64) -> Self {
        Self {
            value: clamp_value(value),
            sequence: Sequence::ZERO,
            source: BalanceSource::Confirmed,
        }
    }

    pub fn optimistic(value: f64, sequence: Sequence) -> Self {
        Self {
            value: clamp_value(value),
            sequence,
            source: BalanceSource::Optimistic,
        }
    }

    pub fn confirmed(value: f64, sequence: Sequence) -> Self {
        Self {
            value: clamp_value(value),
            sequence,
            source: BalanceSource::Confirmed,
        }
    }

    pub fn is_optimistic(&self) -> bool {
        self.source == BalanceSource::Optimistic
    }

    /// Remaining room below `cap`, never negative.
    pub fn headroom(&self, cap: f64) -> f64 {
        (cap - self.value).max(0.0)
    }
}

impl Default for Balance {
    fn default() -> Self {
        Self::seeded(0.0)
    }
}

fn clamp_value(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, MAX_BALANCE)
    } else {
        0.0
    }
}
