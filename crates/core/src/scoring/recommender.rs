use crate::domain::factor::Category;
use crate::domain::recommendation::{Recommendation, RecommendationList};
use crate::domain::score::{hundredths, Score};
use crate::error::RecommendError;
use std::cmp::Ordering;
use std::collections::HashSet;

pub const DEFAULT_TOP_N: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recommender {
    /// Requested list size. Zero or negative yields an empty list.
    pub top_n: i64,
    /// Fail instead of returning an empty list when nothing could be scored.
    pub strict: bool,
}

impl Default for Recommender {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            strict: false,
        }
    }
}

impl Recommender {
    pub fn new(top_n: i64, strict: bool) -> Self {
        Self { top_n, strict }
    }

    /// Ranks every scored ticker and keeps the best `min(top_n, scored)`.
    ///
    /// Input order is irrelevant: the same set of scores always produces the
    /// same list. Duplicate tickers keep only their best-ranked entry.
    pub fn recommend(&self, mut scores: Vec<Score>) -> Result<RecommendationList, RecommendError> {
        if scores.is_empty() {
            if self.strict {
                return Err(RecommendError::EmptyCandidateSet);
            }
            tracing::warn!("no scored tickers; recommendation list is empty");
            return Ok(RecommendationList::default());
        }

        scores.sort_by(rank_order);

        let limit = usize::try_from(self.top_n).unwrap_or(0);
        let mut seen = HashSet::with_capacity(scores.len());
        let mut items = Vec::with_capacity(limit.min(scores.len()));
        for score in scores {
            if items.len() >= limit {
                break;
            }
            if !seen.insert(score.ticker.clone()) {
                tracing::warn!(ticker = %score.ticker, "duplicate ticker in score set; keeping best entry");
                continue;
            }
            items.push(Recommendation {
                rank: items.len() as u32 + 1,
                score,
            });
        }

        Ok(RecommendationList::from_ranked(items))
    }
}

/// Composite descending, then sentiment sub-score descending, then ticker ascending.
///
/// Both scores are compared at two-decimal resolution, the precision they are
/// reported at.
pub fn rank_order(a: &Score, b: &Score) -> Ordering {
    hundredths(b.composite)
        .cmp(&hundredths(a.composite))
        .then_with(|| {
            hundredths(b.subscore(Category::Sentiment)).cmp(&hundredths(a.subscore(Category::Sentiment)))
        })
        .then_with(|| a.ticker.cmp(&b.ticker))
}
