//! Factor normalization, weighting, rating and ranking.

pub mod normalizer;
pub mod pipeline;
pub mod recommender;
pub mod scorer;
pub mod summary;

pub use pipeline::{run, RunOptions, RunOutput};
pub use recommender::Recommender;
pub use scorer::score_ticker;
