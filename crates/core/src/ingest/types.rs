use crate::domain::factor::FactorSet;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Per-ticker factor values collected upstream for one market date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorSnapshot {
    pub as_of_date: NaiveDate,
    #[serde(default)]
    pub items: Vec<FactorSet>,
}
