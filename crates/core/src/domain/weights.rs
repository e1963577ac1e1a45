use crate::domain::factor::{Category, PerCategory};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Validated per-category weights. Non-negative, finite, summing to 1.0.
///
/// The only way to obtain one is through [`WeightVector::new`] (or the
/// loaders built on it), so holders may assume validity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWeights", into = "RawWeights")]
pub struct WeightVector(PerCategory<f64>);

impl WeightVector {
    pub fn new(weights: PerCategory<f64>) -> Result<Self, ConfigError> {
        for (category, &weight) in weights.iter() {
            if !weight.is_finite() {
                return Err(ConfigError::NonFiniteWeight { category });
            }
            if weight < 0.0 {
                return Err(ConfigError::NegativeWeight { category, weight });
            }
        }

        let sum: f64 = weights.iter().map(|(_, w)| *w).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightSum { sum });
        }

        Ok(Self(weights))
    }

    pub fn get(&self, category: Category) -> f64 {
        *self.0.get(category)
    }

    pub fn as_per_category(&self) -> &PerCategory<f64> {
        &self.0
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let raw: RawWeights =
            serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::try_from(raw)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    /// Defaults overridden by `SCORING_WEIGHT_<CATEGORY>` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut weights = DEFAULT_WEIGHTS;
        for category in Category::ALL {
            let key = env_key(category);
            if let Some(s) = lookup(&key) {
                let v = s.trim().parse::<f64>().map_err(|_| ConfigError::InvalidValue {
                    key: key.clone(),
                    value: s.clone(),
                })?;
                *weights.get_mut(category) = v;
            }
        }
        Self::new(weights)
    }
}

impl Default for WeightVector {
    fn default() -> Self {
        Self(DEFAULT_WEIGHTS)
    }
}

const DEFAULT_WEIGHTS: PerCategory<f64> = PerCategory {
    technical: 0.30,
    sentiment: 0.25,
    fundamental: 0.25,
    macro_: 0.10,
    risk: 0.10,
};

fn env_key(category: Category) -> String {
    format!("SCORING_WEIGHT_{}", category.as_str().to_ascii_uppercase())
}

/// Wire shape for weights. Every category must be present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawWeights {
    technical: Option<f64>,
    sentiment: Option<f64>,
    fundamental: Option<f64>,
    #[serde(rename = "macro")]
    macro_: Option<f64>,
    risk: Option<f64>,
}

impl TryFrom<RawWeights> for WeightVector {
    type Error = ConfigError;

    fn try_from(raw: RawWeights) -> Result<Self, Self::Error> {
        let slots = PerCategory {
            technical: raw.technical,
            sentiment: raw.sentiment,
            fundamental: raw.fundamental,
            macro_: raw.macro_,
            risk: raw.risk,
        };
        let mut weights = PerCategory::<f64>::default();
        for (category, slot) in slots.iter() {
            let w = slot.ok_or(ConfigError::MissingCategory(category))?;
            *weights.get_mut(category) = w;
        }
        WeightVector::new(weights)
    }
}

impl From<WeightVector> for RawWeights {
    fn from(w: WeightVector) -> Self {
        Self {
            technical: Some(w.0.technical),
            sentiment: Some(w.0.sentiment),
            fundamental: Some(w.0.fundamental),
            macro_: Some(w.0.macro_),
            risk: Some(w.0.risk),
        }
    }
}
