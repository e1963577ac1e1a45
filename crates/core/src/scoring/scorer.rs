use crate::domain::factor::{FactorSet, NormalizedFactorSet, PerCategory};
use crate::domain::rating::Rating;
use crate::domain::score::{round2, Score};
use crate::domain::weights::WeightVector;
use crate::error::ScoringError;
use crate::scoring::normalizer::normalize;

/// Weighted sum of sub-scores, clamped to [0, 100], plus the per-category terms.
///
/// The composite is quantized to hundredths, so sums that only differ by float
/// noise come out identical and fall through to the tie-breakers.
pub fn composite(subscores: &NormalizedFactorSet, weights: &WeightVector) -> (f64, PerCategory<f64>) {
    let contributions = subscores.map(|category, s| weights.get(category) * s);
    let sum: f64 = contributions.iter().map(|(_, c)| *c).sum();
    if !sum.is_finite() {
        return (sum, contributions);
    }
    (round2(sum.clamp(0.0, 100.0)), contributions)
}

/// Normalize, weight and classify one ticker.
pub fn score_ticker(factors: &FactorSet, weights: &WeightVector) -> Result<Score, ScoringError> {
    let ticker = factors.ticker.trim();
    if ticker.is_empty() {
        return Err(ScoringError::EmptyTicker);
    }

    let subscores = normalize(factors);
    let (composite, contributions) = composite(&subscores, weights);
    if !composite.is_finite() {
        return Err(ScoringError::NonFiniteComposite(ticker.to_string()));
    }

    Ok(Score {
        ticker: ticker.to_string(),
        name: factors.name.clone(),
        sector: factors.sector.clone(),
        composite,
        rating: Rating::classify(composite),
        subscores,
        contributions,
        signals: factors.signals.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::factor::Category;

    fn subscores(t: f64, s: f64, f: f64, m: f64, r: f64) -> NormalizedFactorSet {
        PerCategory {
            technical: t,
            sentiment: s,
            fundamental: f,
            macro_: m,
            risk: r,
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn weighted_sum_matches_worked_example() {
        let (c, contrib) = composite(&subscores(80.0, 60.0, 70.0, 50.0, 40.0), &WeightVector::default());
        assert!(approx(c, 65.5));
        assert!(approx(contrib.technical, 24.0));
        assert!(approx(contrib.sentiment, 15.0));
        assert!(approx(contrib.fundamental, 17.5));
        assert!(approx(contrib.macro_, 5.0));
        assert!(approx(contrib.risk, 4.0));
        assert_eq!(Rating::classify(c), Rating::Buy);
    }

    #[test]
    fn all_max_subscores_is_strong_buy() {
        let (c, _) = composite(&subscores(100.0, 100.0, 100.0, 100.0, 100.0), &WeightVector::default());
        assert!(approx(c, 100.0));
        assert!(c <= 100.0);
        assert_eq!(Rating::classify(c), Rating::StrongBuy);
    }

    #[test]
    fn absent_categories_score_as_neutral() {
        let fs = FactorSet::empty("8035.T")
            .with(Category::Technical, 90.0)
            .with(Category::Sentiment, 0.4)
            .with(Category::Risk, 0.3);
        let score = score_ticker(&fs, &WeightVector::default()).unwrap();
        assert_eq!(score.subscore(Category::Fundamental), 50.0);
        assert_eq!(score.subscore(Category::Macro), 50.0);
        assert!(approx(score.subscore(Category::Sentiment), 70.0));
        assert!(approx(score.composite, 65.0));
        assert_eq!(score.rating, Rating::Buy);
    }

    #[test]
    fn contributions_sum_to_composite() {
        let fs = FactorSet::empty("6861.T")
            .with(Category::Technical, 33.0)
            .with(Category::Fundamental, 71.2)
            .with(Category::Sentiment, -0.35);
        let score = score_ticker(&fs, &WeightVector::default()).unwrap();
        let sum: f64 = score.contributions.iter().map(|(_, c)| *c).sum();
        assert!((sum - score.composite).abs() <= 0.005 + 1e-9);
    }

    #[test]
    fn equal_sums_produce_identical_composites() {
        let w = WeightVector::default();
        let (a, _) = composite(&subscores(50.0, 63.3, 64.6, 55.0, 48.0), &w);
        let (b, _) = composite(&subscores(51.5, 61.2, 64.9, 55.0, 48.0), &w);
        assert_eq!(a.to_bits(), b.to_bits());
        assert_eq!(a, 57.28);
    }

    #[test]
    fn signals_carry_through_to_score() {
        let fs: FactorSet = serde_json::from_value(serde_json::json!({
            "ticker": "9984.T",
            "technical": 72.0,
            "signals": ["golden cross on 50/200 MA", "volume 2.1x 20-day average"]
        }))
        .unwrap();
        let score = score_ticker(&fs, &WeightVector::default()).unwrap();
        assert_eq!(score.signals, fs.signals);

        let v = serde_json::to_value(&score).unwrap();
        assert_eq!(
            v["signals"],
            serde_json::json!(["golden cross on 50/200 MA", "volume 2.1x 20-day average"])
        );

        let bare = score_ticker(&FactorSet::empty("9984.T"), &WeightVector::default()).unwrap();
        assert!(bare.signals.is_empty());
    }

    #[test]
    fn raising_one_subscore_never_lowers_composite() {
        let w = WeightVector::default();
        let base = subscores(35.0, 62.0, 48.0, 51.0, 20.0);
        let (c0, _) = composite(&base, &w);
        for category in Category::ALL {
            for bump in [0.0, 0.01, 5.0, 40.0] {
                let mut raised = base;
                let slot = raised.get_mut(category);
                *slot = (*slot + bump).min(100.0);
                let (c1, _) = composite(&raised, &w);
                assert!(c1 >= c0, "{category} +{bump}: {c1} < {c0}");
            }
        }
    }

    #[test]
    fn composite_stays_in_bounds() {
        let w = WeightVector::default();
        for t in [0.0, 25.0, 100.0] {
            for s in [0.0, 50.0, 100.0] {
                for r in [0.0, 100.0] {
                    let (c, _) = composite(&subscores(t, s, 100.0 - t, s, r), &w);
                    assert!((0.0..=100.0).contains(&c));
                }
            }
        }
    }

    #[test]
    fn trims_ticker_and_rejects_empty() {
        let score = score_ticker(&FactorSet::empty("  AAPL "), &WeightVector::default()).unwrap();
        assert_eq!(score.ticker, "AAPL");
        assert_eq!(
            score_ticker(&FactorSet::empty("   "), &WeightVector::default()).unwrap_err(),
            ScoringError::EmptyTicker
        );
    }
}
