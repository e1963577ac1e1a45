use crate::domain::factor::Category;
use thiserror::Error;

/// Fatal, run-level configuration problems. Raised before any ticker is scored.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("weights must sum to 1.0 (got {sum})")]
    WeightSum { sum: f64 },

    #[error("weight for {category} must be >= 0 (got {weight})")]
    NegativeWeight { category: Category, weight: f64 },

    #[error("weight for {category} is not a finite number")]
    NonFiniteWeight { category: Category },

    #[error("weight for {0} is missing")]
    MissingCategory(Category),

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// Failure while scoring a single ticker. Never escapes the recommender boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("ticker identifier is empty")]
    EmptyTicker,

    #[error("duplicate ticker {0}")]
    DuplicateTicker(String),

    #[error("composite score for {0} is not finite")]
    NonFiniteComposite(String),

    #[error("scoring {ticker} panicked: {message}")]
    Panicked { ticker: String, message: String },

    #[error("scoring task for {ticker} did not complete: {message}")]
    TaskFailed { ticker: String, message: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecommendError {
    #[error("no tickers could be scored")]
    EmptyCandidateSet,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Recommend(#[from] RecommendError),
}
