use serde::{Deserialize, Serialize};
use std::fmt;

/// Five ordered rating tiers, weakest first so that `Ord` follows conviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "Strong Sell")]
    StrongSell,
    Sell,
    Hold,
    Buy,
    #[serde(rename = "Strong Buy")]
    StrongBuy,
}

impl Rating {
    /// Tiers are closed on the lower edge: 80 is Strong Buy, 79.99 is Buy.
    /// Out-of-range input is clamped to [0, 100] first.
    pub fn classify(score: f64) -> Self {
        let s = score.clamp(0.0, 100.0);
        if s >= 80.0 {
            Rating::StrongBuy
        } else if s >= 60.0 {
            Rating::Buy
        } else if s >= 40.0 {
            Rating::Hold
        } else if s >= 20.0 {
            Rating::Sell
        } else {
            Rating::StrongSell
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Rating::StrongBuy => "Strong Buy",
            Rating::Buy => "Buy",
            Rating::Hold => "Hold",
            Rating::Sell => "Sell",
            Rating::StrongSell => "Strong Sell",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Rating::StrongBuy => "🟢",
            Rating::Buy => "🔵",
            Rating::Hold => "⚪",
            Rating::Sell => "🟠",
            Rating::StrongSell => "🔴",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
