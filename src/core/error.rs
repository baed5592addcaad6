//! Error taxonomy for the pricing, selection and backtesting core

use thiserror::Error;

/// Errors raised by the core computations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Malformed input at a function boundary (length mismatch, empty odds set, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A price or probability that cannot produce defined odds
    #[error("Degenerate market: {0}")]
    DegenerateMarket(String),

    #[error("Unknown stake method: {0} (expected \"flat\" or \"kelly\")")]
    UnknownStakeMethod(String),

    #[error("Unknown ranking method: {0} (expected \"edge\", \"ev\" or \"composite\")")]
    UnknownRankingMethod(String),

    #[error("Unknown margin method: {0} (expected \"proportional\" or \"equal\")")]
    UnknownMarginMethod(String),
}

impl CoreError {
    pub fn degenerate_odds(odds: f64) -> Self {
        CoreError::DegenerateMarket(format!("odds must be > 1.0, got {}", odds))
    }

    pub fn degenerate_probability(probability: f64) -> Self {
        CoreError::DegenerateMarket(format!(
            "probability must be in (0, 1), got {}",
            probability
        ))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
