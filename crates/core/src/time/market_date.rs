use anyhow::Context;
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Market {
    #[default]
    Jp,
    Us,
}

impl Market {
    // US offset ignores daylight saving; the cutoff leaves enough slack either way.
    fn utc_offset_secs(&self) -> i32 {
        match self {
            Market::Jp => 9 * 3600,
            Market::Us => -5 * 3600,
        }
    }

    /// Local (hour, minute) after which today's close is considered final.
    fn close_cutoff(&self) -> (u32, u32) {
        match self {
            Market::Jp => (16, 0),
            Market::Us => (17, 0),
        }
    }

    /// Fixed-date exchange holidays. Movable ones come from `MARKET_HOLIDAYS`.
    fn fixed_holidays(&self, year: i32) -> Vec<NaiveDate> {
        let days: &[(u32, u32)] = match self {
            Market::Jp => &[(1, 1), (1, 2), (1, 3), (12, 31)],
            Market::Us => &[(1, 1), (7, 4), (12, 25)],
        };
        days.iter()
            .filter_map(|&(m, d)| NaiveDate::from_ymd_opt(year, m, d))
            .collect()
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Market::Jp => f.write_str("JP"),
            Market::Us => f.write_str("US"),
        }
    }
}

impl FromStr for Market {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "JP" => Ok(Market::Jp),
            "US" => Ok(Market::Us),
            other => anyhow::bail!("unsupported market {other:?} (expected JP or US)"),
        }
    }
}

/// Market date a run reports on.
///
/// An explicit `YYYY-MM-DD` wins. Otherwise take the market-local date, step
/// back a day if the close cutoff has not passed, then skip weekends and
/// holidays.
pub fn resolve_as_of_date(
    as_of_date_arg: Option<&str>,
    market: Market,
    now_utc: DateTime<Utc>,
) -> anyhow::Result<NaiveDate> {
    resolve_with_holidays(as_of_date_arg, market, now_utc, &extra_holidays_from_env())
}

fn resolve_with_holidays(
    as_of_date_arg: Option<&str>,
    market: Market,
    now_utc: DateTime<Utc>,
    extra_holidays: &HashSet<NaiveDate>,
) -> anyhow::Result<NaiveDate> {
    if let Some(s) = as_of_date_arg {
        return NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid as-of date {s:?} (expected YYYY-MM-DD)"));
    }

    let offset = FixedOffset::east_opt(market.utc_offset_secs()).context("invalid market offset")?;
    let now_local = now_utc.with_timezone(&offset);

    let mut date = now_local.date_naive();
    if (now_local.hour(), now_local.minute()) < market.close_cutoff() {
        date -= Duration::days(1);
    }

    while is_weekend(date)
        || extra_holidays.contains(&date)
        || market.fixed_holidays(date.year()).contains(&date)
    {
        date -= Duration::days(1);
    }

    Ok(date)
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun)
}

// MARKET_HOLIDAYS="YYYY-MM-DD,YYYY-MM-DD"; unparseable entries are skipped.
fn extra_holidays_from_env() -> HashSet<NaiveDate> {
    std::env::var("MARKET_HOLIDAYS")
        .map(|s| parse_holidays(&s))
        .unwrap_or_default()
}

fn parse_holidays(s: &str) -> HashSet<NaiveDate> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .filter_map(|p| NaiveDate::parse_from_str(p, "%Y-%m-%d").ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn explicit_date_wins() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap();
        let d = resolve_with_holidays(Some("2026-10-14"), Market::Jp, now, &HashSet::new()).unwrap();
        assert_eq!(d, ymd(2026, 10, 14));
        assert!(resolve_with_holidays(Some("14/10/2026"), Market::Jp, now, &HashSet::new()).is_err());
    }

    #[test]
    fn jp_uses_same_day_after_cutoff() {
        // 2026-10-16 08:00 UTC = 17:00 JST, Friday.
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 8, 0, 0).unwrap();
        let d = resolve_with_holidays(None, Market::Jp, now, &HashSet::new()).unwrap();
        assert_eq!(d, ymd(2026, 10, 16));
    }

    #[test]
    fn jp_rolls_back_before_cutoff_and_over_weekend() {
        // 2026-10-19 05:00 UTC = 14:00 JST Monday; previous day is Sunday.
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 5, 0, 0).unwrap();
        let d = resolve_with_holidays(None, Market::Jp, now, &HashSet::new()).unwrap();
        assert_eq!(d, ymd(2026, 10, 16));
    }

    #[test]
    fn us_local_date_lags_utc() {
        // 2026-10-17 02:00 UTC = 2026-10-16 21:00 US Eastern (fixed -5).
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 2, 0, 0).unwrap();
        let d = resolve_with_holidays(None, Market::Us, now, &HashSet::new()).unwrap();
        assert_eq!(d, ymd(2026, 10, 16));
    }

    #[test]
    fn skips_fixed_and_configured_holidays() {
        // 2027-01-04 08:00 UTC = 17:00 JST Monday; Jan 1-3 are closed, Dec 31 too.
        let now = Utc.with_ymd_and_hms(2027, 1, 4, 8, 0, 0).unwrap();
        let extra = parse_holidays("2027-01-04, bogus,");
        let d = resolve_with_holidays(None, Market::Jp, now, &extra).unwrap();
        assert_eq!(d, ymd(2026, 12, 30));
    }

    #[test]
    fn parses_market_names() {
        assert_eq!("jp".parse::<Market>().unwrap(), Market::Jp);
        assert_eq!(" US ".parse::<Market>().unwrap(), Market::Us);
        assert!("KR".parse::<Market>().is_err());
        assert_eq!(serde_json::to_value(Market::Us).unwrap(), serde_json::json!("US"));
    }
}
