use crate::ingest::types::FactorSnapshot;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::Path;

pub fn load_snapshot(path: &Path, expected: Option<NaiveDate>) -> Result<FactorSnapshot> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read factor snapshot {}", path.display()))?;
    parse_snapshot(&text, expected)
        .with_context(|| format!("invalid factor snapshot {}", path.display()))
}

/// Parses a snapshot document and checks its date when the run's date is known.
///
/// Per-item problems (blank or duplicate tickers) are left to the scoring
/// stage, which excludes the offending ticker instead of failing the run.
pub fn parse_snapshot(text: &str, expected: Option<NaiveDate>) -> Result<FactorSnapshot> {
    let parsed = serde_json::from_str::<FactorSnapshot>(text)
        .context("factor snapshot is not valid JSON for the snapshot schema")?;

    if let Some(expected) = expected {
        anyhow::ensure!(
            parsed.as_of_date == expected,
            "snapshot as_of_date mismatch: expected {expected}, got {}",
            parsed.as_of_date
        );
    }

    let blank = parsed
        .items
        .iter()
        .filter(|item| item.ticker.trim().is_empty())
        .count();
    if blank > 0 {
        tracing::warn!(as_of_date = %parsed.as_of_date, blank, "snapshot contains items without a ticker");
    }

    Ok(parsed)
}
