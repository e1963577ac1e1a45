use crate::domain::factor::Category;
use crate::domain::score::Score;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

const UNKNOWN_SECTOR: &str = "Unknown";
const BULLISH_SECTOR_MIN: f64 = 55.0;
const BEARISH_SECTOR_MAX: f64 = 45.0;
const SECTOR_PICKS: usize = 3;
const LOW_AVERAGE_WARNING: f64 = 40.0;

/// A ticker left out of the candidate set, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedTicker {
    pub ticker: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketTone {
    Bullish,
    #[serde(rename = "Slightly Bullish")]
    SlightlyBullish,
    Neutral,
    #[serde(rename = "Slightly Bearish")]
    SlightlyBearish,
    Bearish,
}

impl MarketTone {
    pub fn from_macro_score(score: f64) -> Self {
        if score >= 70.0 {
            MarketTone::Bullish
        } else if score >= 55.0 {
            MarketTone::SlightlyBullish
        } else if score >= 45.0 {
            MarketTone::Neutral
        } else if score >= 30.0 {
            MarketTone::SlightlyBearish
        } else {
            MarketTone::Bearish
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SectorAnalysis {
    /// Mean composite per sector, one decimal.
    pub sector_scores: BTreeMap<String, f64>,
    pub bullish_sectors: Vec<String>,
    pub bearish_sectors: Vec<String>,
}

/// Run-wide context reported next to the recommendation list. Covers every
/// scored ticker, not only the selected ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub scored: usize,
    pub excluded: Vec<ExcludedTicker>,
    pub sectors: SectorAnalysis,
    pub market_tone: MarketTone,
    pub warnings: Vec<String>,
}

impl RunSummary {
    pub fn build(scores: &[Score], excluded: Vec<ExcludedTicker>) -> Self {
        let mut warnings = Vec::new();
        if let Some(avg) = mean(scores.iter().map(|s| s.composite)) {
            if avg < LOW_AVERAGE_WARNING {
                warnings.push(format!(
                    "average composite score {avg:.1} is below {LOW_AVERAGE_WARNING}; market conditions look weak"
                ));
            }
        }

        let market_tone = mean(scores.iter().map(|s| s.subscore(Category::Macro)))
            .map(MarketTone::from_macro_score)
            .unwrap_or(MarketTone::Neutral);

        Self {
            scored: scores.len(),
            excluded,
            sectors: analyze_sectors(scores),
            market_tone,
            warnings,
        }
    }
}

pub fn analyze_sectors(scores: &[Score]) -> SectorAnalysis {
    let mut by_sector: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for s in scores {
        let sector = s
            .sector
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(UNKNOWN_SECTOR);
        by_sector.entry(sector.to_string()).or_default().push(s.composite);
    }

    let sector_scores: BTreeMap<String, f64> = by_sector
        .into_iter()
        .filter_map(|(sector, v)| mean(v.into_iter()).map(|m| (sector, round1(m))))
        .collect();

    let mut ranked: Vec<(&String, f64)> = sector_scores.iter().map(|(k, v)| (k, *v)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let bullish_sectors = ranked
        .iter()
        .take(SECTOR_PICKS)
        .filter(|(_, m)| *m >= BULLISH_SECTOR_MIN)
        .map(|(s, _)| (*s).clone())
        .collect();
    let bearish_sectors = ranked
        .iter()
        .skip(ranked.len().saturating_sub(SECTOR_PICKS))
        .filter(|(_, m)| *m <= BEARISH_SECTOR_MAX)
        .map(|(s, _)| (*s).clone())
        .collect();

    SectorAnalysis {
        sector_scores,
        bullish_sectors,
        bearish_sectors,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Stable ordering for excluded tickers so reports diff cleanly.
pub(crate) fn sort_excluded(excluded: &mut [ExcludedTicker]) {
    excluded.sort_by(|a, b| match a.ticker.cmp(&b.ticker) {
        Ordering::Equal => a.reason.cmp(&b.reason),
        other => other,
    });
}
