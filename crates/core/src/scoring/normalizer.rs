use crate::domain::factor::{Category, FactorSet, NormalizedFactorSet, PerCategory, NEUTRAL_SUBSCORE};

/// Maps each category's raw analyzer output onto [0, 100].
///
/// Absent and non-finite values fall back to the neutral sub-score. Finite
/// values outside the category's raw domain are clipped.
pub fn normalize(factors: &FactorSet) -> NormalizedFactorSet {
    PerCategory::from_fn(|category| match factors.raw(category) {
        None => {
            tracing::debug!(
                ticker = %factors.ticker,
                %category,
                reason = factors.provenance.get(&category).map(String::as_str).unwrap_or("not reported"),
                "factor absent; using neutral sub-score"
            );
            NEUTRAL_SUBSCORE
        }
        Some(raw) => match scale(category, raw) {
            Some(subscore) => subscore,
            None => {
                tracing::warn!(
                    ticker = %factors.ticker,
                    %category,
                    raw,
                    "non-finite factor value; using neutral sub-score"
                );
                NEUTRAL_SUBSCORE
            }
        },
    })
}

/// Category-specific monotonic mapping into [0, 100]. `None` for NaN/±inf.
pub fn scale(category: Category, raw: f64) -> Option<f64> {
    if !raw.is_finite() {
        return None;
    }

    let mapped = match category {
        // Analyzer composites already on 0..100.
        Category::Technical | Category::Fundamental | Category::Macro => raw,
        // Decayed news sentiment, -1 (bearish) .. 1 (bullish).
        Category::Sentiment => (raw + 1.0) / 2.0 * 100.0,
        // Price stability, 0 (volatile) .. 1 (calm).
        Category::Risk => raw * 100.0,
    };

    Some(mapped.clamp(0.0, 100.0))
}
