pub mod domain;
pub mod error;
pub mod ingest;
pub mod scoring;
pub mod time;

pub mod config {
    use crate::domain::weights::WeightVector;
    use crate::error::ConfigError;
    use crate::scoring::pipeline::{RunOptions, DEFAULT_CONCURRENCY};
    use crate::scoring::recommender::DEFAULT_TOP_N;
    use crate::time::market_date::Market;
    use anyhow::Context;
    use std::path::PathBuf;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub top_n: i64,
        pub require_non_empty: bool,
        pub concurrency: usize,
        pub market: Market,
        pub factor_snapshot_path: Option<PathBuf>,
        pub scoring_weights_path: Option<PathBuf>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
            let top_n = match lookup("TOP_N_RECOMMENDATIONS") {
                Some(s) => s
                    .trim()
                    .parse::<i64>()
                    .with_context(|| format!("TOP_N_RECOMMENDATIONS must be an integer (got {s:?})"))?,
                None => DEFAULT_TOP_N,
            };

            let require_non_empty = lookup("REQUIRE_NON_EMPTY")
                .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false);

            let concurrency = match lookup("SCORING_CONCURRENCY") {
                Some(s) => s
                    .trim()
                    .parse::<usize>()
                    .with_context(|| format!("SCORING_CONCURRENCY must be a positive integer (got {s:?})"))?,
                None => DEFAULT_CONCURRENCY,
            };
            anyhow::ensure!(concurrency >= 1, "SCORING_CONCURRENCY must be >= 1");

            let market = match lookup("MARKET") {
                Some(s) => s.parse::<Market>()?,
                None => Market::default(),
            };

            let path = |key: &str| {
                lookup(key)
                    .filter(|s| !s.trim().is_empty())
                    .map(PathBuf::from)
            };

            Ok(Self {
                top_n,
                require_non_empty,
                concurrency,
                market,
                factor_snapshot_path: path("FACTOR_SNAPSHOT_PATH"),
                scoring_weights_path: path("SCORING_WEIGHTS_PATH"),
                sentry_dsn: lookup("SENTRY_DSN").filter(|s| !s.trim().is_empty()),
            })
        }

        pub fn require_factor_snapshot_path(&self) -> anyhow::Result<&PathBuf> {
            self.factor_snapshot_path
                .as_ref()
                .context("FACTOR_SNAPSHOT_PATH (or --input) is required")
        }

        /// Weight file when configured, otherwise defaults plus env overrides.
        pub fn load_weights(&self) -> Result<WeightVector, ConfigError> {
            match &self.scoring_weights_path {
                Some(path) => WeightVector::from_json_file(path),
                None => WeightVector::from_env(),
            }
        }

        pub fn run_options(&self) -> RunOptions {
            RunOptions {
                top_n: self.top_n,
                strict: self.require_non_empty,
                concurrency: self.concurrency,
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::collections::HashMap;

        fn settings(vars: &[(&str, &str)]) -> anyhow::Result<Settings> {
            let vars: HashMap<String, String> = vars
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            Settings::from_lookup(|k| vars.get(k).cloned())
        }

        #[test]
        fn defaults_when_unset() {
            let s = settings(&[]).unwrap();
            assert_eq!(s.top_n, 10);
            assert!(!s.require_non_empty);
            assert_eq!(s.concurrency, 8);
            assert_eq!(s.market, Market::Jp);
            assert!(s.scoring_weights_path.is_none());
            assert!(s.require_factor_snapshot_path().is_err());
        }

        #[test]
        fn reads_overrides() {
            let s = settings(&[
                ("TOP_N_RECOMMENDATIONS", "5"),
                ("REQUIRE_NON_EMPTY", "true"),
                ("SCORING_CONCURRENCY", "2"),
                ("MARKET", "us"),
                ("FACTOR_SNAPSHOT_PATH", "/tmp/factors.json"),
            ])
            .unwrap();
            let opts = s.run_options();
            assert_eq!(opts.top_n, 5);
            assert!(opts.strict);
            assert_eq!(opts.concurrency, 2);
            assert_eq!(s.market, Market::Us);
            assert!(s.require_factor_snapshot_path().is_ok());
        }

        #[test]
        fn rejects_bad_values() {
            assert!(settings(&[("SCORING_CONCURRENCY", "0")]).is_err());
            assert!(settings(&[("TOP_N_RECOMMENDATIONS", "ten")]).is_err());
            assert!(settings(&[("MARKET", "KR")]).is_err());
        }

        #[test]
        fn negative_top_n_is_allowed() {
            assert_eq!(settings(&[("TOP_N_RECOMMENDATIONS", "-1")]).unwrap().top_n, -1);
        }

        #[test]
        fn missing_weights_file_is_a_config_error() {
            let s = settings(&[("SCORING_WEIGHTS_PATH", "/nonexistent/weights.json")]).unwrap();
            assert!(matches!(s.load_weights(), Err(ConfigError::Parse(_))));
        }
    }
}
