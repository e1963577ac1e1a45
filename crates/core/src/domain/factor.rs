use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Neutral sub-score substituted when a category has no usable value.
pub const NEUTRAL_SUBSCORE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Technical,
    Sentiment,
    Fundamental,
    Macro,
    Risk,
}

impl Category {
    /// Fixed evaluation order. Summation always walks categories in this order.
    pub const ALL: [Category; 5] = [
        Category::Technical,
        Category::Sentiment,
        Category::Fundamental,
        Category::Macro,
        Category::Risk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Technical => "technical",
            Category::Sentiment => "sentiment",
            Category::Fundamental => "fundamental",
            Category::Macro => "macro",
            Category::Risk => "risk",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per factor category.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerCategory<T> {
    pub technical: T,
    pub sentiment: T,
    pub fundamental: T,
    #[serde(rename = "macro")]
    pub macro_: T,
    pub risk: T,
}

impl<T> PerCategory<T> {
    pub fn get(&self, category: Category) -> &T {
        match category {
            Category::Technical => &self.technical,
            Category::Sentiment => &self.sentiment,
            Category::Fundamental => &self.fundamental,
            Category::Macro => &self.macro_,
            Category::Risk => &self.risk,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut T {
        match category {
            Category::Technical => &mut self.technical,
            Category::Sentiment => &mut self.sentiment,
            Category::Fundamental => &mut self.fundamental,
            Category::Macro => &mut self.macro_,
            Category::Risk => &mut self.risk,
        }
    }

    pub fn from_fn(mut f: impl FnMut(Category) -> T) -> Self {
        Self {
            technical: f(Category::Technical),
            sentiment: f(Category::Sentiment),
            fundamental: f(Category::Fundamental),
            macro_: f(Category::Macro),
            risk: f(Category::Risk),
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(Category, &T) -> U) -> PerCategory<U> {
        PerCategory::from_fn(|c| f(c, self.get(c)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &T)> + '_ {
        Category::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

/// Raw analyzer output for one ticker, as handed over by the upstream collectors.
///
/// `None` means the collector reported nothing for that category (no news that
/// day, no financials, ...). `provenance` optionally explains why, or where a
/// value came from; it is only used for logging. `signals` are the analyzers'
/// human-readable notes and are passed through to the score untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorSet {
    pub ticker: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub technical: Option<f64>,
    #[serde(default)]
    pub sentiment: Option<f64>,
    #[serde(default)]
    pub fundamental: Option<f64>,
    #[serde(default, rename = "macro")]
    pub macro_: Option<f64>,
    #[serde(default)]
    pub risk: Option<f64>,
    #[serde(default)]
    pub provenance: BTreeMap<Category, String>,
    #[serde(default)]
    pub signals: Vec<String>,
}

impl FactorSet {
    /// A factor set with every category absent.
    pub fn empty(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            name: None,
            sector: None,
            technical: None,
            sentiment: None,
            fundamental: None,
            macro_: None,
            risk: None,
            provenance: BTreeMap::new(),
            signals: Vec::new(),
        }
    }

    pub fn raw(&self, category: Category) -> Option<f64> {
        match category {
            Category::Technical => self.technical,
            Category::Sentiment => self.sentiment,
            Category::Fundamental => self.fundamental,
            Category::Macro => self.macro_,
            Category::Risk => self.risk,
        }
    }

    pub fn with(mut self, category: Category, value: f64) -> Self {
        let slot = match category {
            Category::Technical => &mut self.technical,
            Category::Sentiment => &mut self.sentiment,
            Category::Fundamental => &mut self.fundamental,
            Category::Macro => &mut self.macro_,
            Category::Risk => &mut self.risk,
        };
        *slot = Some(value);
        self
    }

    pub fn with_signal(mut self, signal: impl Into<String>) -> Self {
        self.signals.push(signal.into());
        self
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }
}

/// Sub-scores in [0, 100], one per category.
pub type NormalizedFactorSet = PerCategory<f64>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_with_missing_categories_as_absent() {
        let v = json!({
            "ticker": "7203.T",
            "technical": 62.5,
            "macro": 48.0,
            "provenance": {"sentiment": "no articles in window"}
        });
        let fs: FactorSet = serde_json::from_value(v).unwrap();
        assert_eq!(fs.raw(Category::Technical), Some(62.5));
        assert_eq!(fs.raw(Category::Macro), Some(48.0));
        assert_eq!(fs.raw(Category::Sentiment), None);
        assert_eq!(
            fs.provenance.get(&Category::Sentiment).map(String::as_str),
            Some("no articles in window")
        );
        assert!(fs.signals.is_empty());
    }

    #[test]
    fn signals_keep_insertion_order() {
        let fs = FactorSet::empty("6501.T")
            .with_signal("MACD bullish crossover")
            .with_signal("PER below sector median");
        assert_eq!(fs.signals, vec!["MACD bullish crossover", "PER below sector median"]);
        let v = serde_json::to_value(&fs).unwrap();
        assert_eq!(v["signals"][1], json!("PER below sector median"));
    }

    #[test]
    fn per_category_serializes_macro_key() {
        let p = PerCategory::from_fn(|c| c.as_str().len());
        let v = serde_json::to_value(p).unwrap();
        assert_eq!(v["macro"], json!(5));
        assert!(v.get("macro_").is_none());
    }

    #[test]
    fn iter_walks_fixed_order() {
        let p = PerCategory::from_fn(|c| c);
        let order: Vec<Category> = p.iter().map(|(c, _)| c).collect();
        assert_eq!(order, Category::ALL.to_vec());
    }
}
