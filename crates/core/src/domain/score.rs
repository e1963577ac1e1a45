use crate::domain::factor::{Category, NormalizedFactorSet, PerCategory};
use crate::domain::rating::Rating;
use serde::{Deserialize, Serialize, Serializer};

/// Scoring outcome for one ticker.
///
/// `contributions` holds weight × sub-score per category. The composite is
/// their clamped sum quantized to hundredths, so equal scores compare equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub ticker: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(serialize_with = "two_decimals")]
    pub composite: f64,
    pub rating: Rating,
    #[serde(serialize_with = "two_decimals_per_category")]
    pub subscores: NormalizedFactorSet,
    #[serde(serialize_with = "two_decimals_per_category")]
    pub contributions: PerCategory<f64>,
    /// Analyzer explanations carried through from the factor set.
    #[serde(default)]
    pub signals: Vec<String>,
}

impl Score {
    pub fn subscore(&self, category: Category) -> f64 {
        *self.subscores.get(category)
    }
}

/// Value in integer hundredths, rounding half up.
///
/// Snaps to micro-units first so that float noise around a .xx5 boundary
/// cannot split two equal sums into different hundredths.
pub(crate) fn hundredths(v: f64) -> i64 {
    let micro = (v * 1e6).round() as i64;
    (micro + 5_000).div_euclid(10_000)
}

pub(crate) fn round2(v: f64) -> f64 {
    hundredths(v) as f64 / 100.0
}

fn two_decimals<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(round2(*v))
}

fn two_decimals_per_category<S: Serializer>(
    v: &PerCategory<f64>,
    s: S,
) -> Result<S::Ok, S::Error> {
    v.map(|_, x| round2(*x)).serialize(s)
}
