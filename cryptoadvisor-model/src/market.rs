//! Market summary cards shown in the home carousel.

use std::cmp::Ordering;

use crate::error::{ModelError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarketCard {
    pub symbol: String,
    pub name: String,
    pub price_usd: f64,
    pub change_24h_pct: f64,
    pub market_cap: f64,
    pub risk: RiskLevel,
}

impl MarketCard {
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        price_usd: f64,
        market_cap: f64,
    ) -> Result<Self> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return Err(ModelError::InvalidMarketCard(
                "symbol must not be empty".into(),
            ));
        }
        if !price_usd.is_finite() || !market_cap.is_finite() {
            return Err(ModelError::InvalidMarketCard(format!(
                "{symbol}: non-finite price or market cap"
            )));
        }
        Ok(Self {
            symbol: symbol.to_ascii_uppercase(),
            name: name.into(),
            price_usd,
            change_24h_pct: 0.0,
            market_cap,
            risk: RiskLevel::Medium,
        })
    }

    pub fn with_change(mut self, change_24h_pct: f64) -> Self {
        self.change_24h_pct = change_24h_pct;
        self
    }

    pub fn with_risk(mut self, risk: RiskLevel) -> Self {
        self.risk = risk;
        self
    }

    /// Largest market cap first; ties fall back to symbol for stability.
    pub fn by_market_cap_desc(a: &MarketCard, b: &MarketCard) -> Ordering {
        b.market_cap
            .total_cmp(&a.market_cap)
            .then_with(|| a.symbol.cmp(&b.symbol))
    }

    pub fn is_gaining(&self) -> bool {
        self.change_24h_pct > 0.0
    }
}
