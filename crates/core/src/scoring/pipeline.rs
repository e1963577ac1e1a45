use crate::domain::factor::FactorSet;
use crate::domain::recommendation::RecommendationList;
use crate::domain::score::Score;
use crate::domain::weights::WeightVector;
use crate::error::{ConfigError, RunError, ScoringError};
use crate::scoring::recommender::{rank_order, Recommender, DEFAULT_TOP_N};
use crate::scoring::scorer::score_ticker;
use crate::scoring::summary::{sort_excluded, ExcludedTicker, RunSummary};
use std::any::Any;
use std::collections::{BTreeMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;

pub const DEFAULT_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub top_n: i64,
    pub strict: bool,
    /// Upper bound on tickers scored at the same time.
    pub concurrency: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            strict: false,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Per-ticker results gathered behind the join barrier.
#[derive(Debug, Clone, Default)]
pub struct ScoringRun {
    /// In rank order.
    pub scores: Vec<Score>,
    /// Sorted by ticker.
    pub excluded: Vec<ExcludedTicker>,
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub recommendations: RecommendationList,
    pub summary: RunSummary,
}

/// Scores every ticker, ranks them and builds the run summary.
pub async fn run(
    factor_sets: Vec<FactorSet>,
    weights: &WeightVector,
    opts: RunOptions,
) -> Result<RunOutput, RunError> {
    run_with(factor_sets, weights, opts, score_ticker).await
}

pub async fn run_with<F>(
    factor_sets: Vec<FactorSet>,
    weights: &WeightVector,
    opts: RunOptions,
    score_fn: F,
) -> Result<RunOutput, RunError>
where
    F: Fn(&FactorSet, &WeightVector) -> Result<Score, ScoringError> + Send + Sync + 'static,
{
    if opts.concurrency == 0 {
        return Err(ConfigError::InvalidValue {
            key: "concurrency".to_string(),
            value: "0".to_string(),
        }
        .into());
    }

    let candidates = factor_sets.len();
    let ScoringRun { scores, excluded } =
        score_all_with(factor_sets, weights, opts.concurrency, score_fn).await;

    tracing::info!(
        candidates,
        scored = scores.len(),
        excluded = excluded.len(),
        "scoring finished"
    );

    let summary = RunSummary::build(&scores, excluded);
    let recommendations = Recommender::new(opts.top_n, opts.strict).recommend(scores)?;

    Ok(RunOutput {
        recommendations,
        summary,
    })
}

pub async fn score_all(
    factor_sets: Vec<FactorSet>,
    weights: &WeightVector,
    concurrency: usize,
) -> ScoringRun {
    score_all_with(factor_sets, weights, concurrency, score_ticker).await
}

/// Fans tickers out over a bounded set of tasks and waits for all of them.
///
/// Each task owns its input and returns one immutable result; nothing is
/// shared mutably between tasks. A failing or panicking ticker is logged and
/// moved to `excluded` without affecting the others. Every candidate ends up
/// in exactly one of `scores` or `excluded`.
pub async fn score_all_with<F>(
    factor_sets: Vec<FactorSet>,
    weights: &WeightVector,
    concurrency: usize,
    score_fn: F,
) -> ScoringRun
where
    F: Fn(&FactorSet, &WeightVector) -> Result<Score, ScoringError> + Send + Sync + 'static,
{
    let weights = Arc::new(*weights);
    let score_fn = Arc::new(score_fn);
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));

    let mut excluded = Vec::new();
    let mut seen = HashSet::with_capacity(factor_sets.len());
    // Spawned but not yet reported back, keyed by input position.
    let mut pending = BTreeMap::new();
    let mut tasks = JoinSet::new();

    for (slot, factors) in factor_sets.into_iter().enumerate() {
        let ticker = factors.ticker.trim().to_string();
        if !ticker.is_empty() && !seen.insert(ticker.clone()) {
            let err = ScoringError::DuplicateTicker(ticker.clone());
            tracing::warn!(%ticker, error = %err, "excluding ticker");
            excluded.push(ExcludedTicker {
                ticker,
                reason: err.to_string(),
            });
            continue;
        }

        let permit = match acquire_slot(&semaphore, &ticker).await {
            Ok(permit) => permit,
            Err(err) => {
                tracing::error!(%ticker, error = %err, "no scoring slot; excluding");
                excluded.push(ExcludedTicker {
                    ticker,
                    reason: err.to_string(),
                });
                continue;
            }
        };
        pending.insert(slot, ticker.clone());
        let weights = Arc::clone(&weights);
        let score_fn = Arc::clone(&score_fn);

        tasks.spawn(async move {
            let _permit = permit;
            let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| score_fn(&factors, &weights)));
            let result = outcome.unwrap_or_else(|payload| {
                Err(ScoringError::Panicked {
                    ticker: ticker.clone(),
                    message: panic_message(payload.as_ref()),
                })
            });
            (slot, ticker, result)
        });
    }

    let mut scores = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((slot, ticker, result)) => {
                pending.remove(&slot);
                match result {
                    Ok(score) => scores.push(score),
                    Err(err) => {
                        tracing::warn!(%ticker, error = %err, "ticker scoring failed; excluding");
                        excluded.push(ExcludedTicker {
                            ticker,
                            reason: err.to_string(),
                        });
                    }
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "scoring task did not complete");
            }
        }
    }

    // A task that died outside `catch_unwind` never reported its ticker.
    for ticker in pending.into_values() {
        let err = ScoringError::TaskFailed {
            ticker: ticker.clone(),
            message: "task panicked or was cancelled".to_string(),
        };
        tracing::warn!(%ticker, error = %err, "ticker scoring failed; excluding");
        excluded.push(ExcludedTicker {
            ticker,
            reason: err.to_string(),
        });
    }

    // Completion order is arbitrary; fix it so downstream sums are reproducible.
    scores.sort_by(rank_order);
    sort_excluded(&mut excluded);

    ScoringRun { scores, excluded }
}

async fn acquire_slot(
    semaphore: &Arc<Semaphore>,
    ticker: &str,
) -> Result<OwnedSemaphorePermit, ScoringError> {
    Arc::clone(semaphore)
        .acquire_owned()
        .await
        .map_err(|err| ScoringError::TaskFailed {
            ticker: ticker.to_string(),
            message: err.to_string(),
        })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
