use crate::domain::score::{hundredths, Score};
use crate::domain::weights::WeightVector;
use crate::scoring::summary::RunSummary;
use crate::time::market_date::Market;
use anyhow::ensure;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub rank: u32,
    #[serde(flatten)]
    pub score: Score,
}

impl Recommendation {
    pub fn ticker(&self) -> &str {
        &self.score.ticker
    }
}

/// Ranked, size-bounded output of one run. Ranks are 1..=k.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecommendationList {
    items: Vec<Recommendation>,
}

impl RecommendationList {
    pub(crate) fn from_ranked(items: Vec<Recommendation>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[Recommendation] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn tickers(&self) -> Vec<&str> {
        self.items.iter().map(Recommendation::ticker).collect()
    }

    /// Checks the list invariants: contiguous ranks from 1, unique tickers,
    /// composite never increasing down the list.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut seen = BTreeSet::<&str>::new();
        for (i, item) in self.items.iter().enumerate() {
            let expected = i as u32 + 1;
            ensure!(
                item.rank == expected,
                "rank gap at position {i}: expected {expected}, got {}",
                item.rank
            );
            ensure!(
                seen.insert(item.ticker()),
                "duplicate ticker: {}",
                item.ticker()
            );
            if i > 0 {
                let prev = &self.items[i - 1].score;
                ensure!(
                    hundredths(prev.composite) >= hundredths(item.score.composite),
                    "composite increases at rank {}",
                    item.rank
                );
            }
        }
        Ok(())
    }
}

/// Everything handed to report/persistence collaborators for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationReport {
    pub as_of_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub market: Market,
    pub weights: WeightVector,
    pub requested_top_n: i64,
    pub recommendations: RecommendationList,
    pub summary: RunSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::factor::PerCategory;
    use crate::domain::rating::Rating;

    fn item(rank: u32, ticker: &str, composite: f64) -> Recommendation {
        Recommendation {
            rank,
            score: Score {
                ticker: ticker.to_string(),
                name: None,
                sector: None,
                composite,
                rating: Rating::classify(composite),
                subscores: PerCategory::from_fn(|_| composite),
                contributions: PerCategory::from_fn(|_| composite / 5.0),
                signals: vec![],
            },
        }
    }

    #[test]
    fn validate_accepts_well_formed_list() {
        let list = RecommendationList::from_ranked(vec![
            item(1, "AAPL", 70.0),
            item(2, "MSFT", 70.0),
            item(3, "NVDA", 55.0),
        ]);
        list.validate().unwrap();
        assert_eq!(list.tickers(), vec!["AAPL", "MSFT", "NVDA"]);
    }

    #[test]
    fn validate_rejects_rank_gap() {
        let list = RecommendationList::from_ranked(vec![item(1, "AAPL", 70.0), item(3, "MSFT", 60.0)]);
        assert!(list.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_ticker() {
        let list = RecommendationList::from_ranked(vec![item(1, "AAPL", 70.0), item(2, "AAPL", 60.0)]);
        assert!(list.validate().is_err());
    }

    #[test]
    fn validate_rejects_increasing_composite() {
        let list = RecommendationList::from_ranked(vec![item(1, "AAPL", 50.0), item(2, "MSFT", 60.0)]);
        assert!(list.validate().is_err());
    }

    #[test]
    fn entries_serialize_flat() {
        let list = RecommendationList::from_ranked(vec![item(1, "AAPL", 65.5)]);
        let v = serde_json::to_value(&list).unwrap();
        assert_eq!(v[0]["rank"], serde_json::json!(1));
        assert_eq!(v[0]["ticker"], serde_json::json!("AAPL"));
        assert_eq!(v[0]["rating"], serde_json::json!("Buy"));
    }
}
