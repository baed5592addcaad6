//! Value metrics used to order candidates

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::CoreError;
use crate::models::Candidate;

/// Ranking metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum RankingMethod {
    /// Raw edge
    Edge,
    /// Expected value: edge × market odds
    Ev,
    /// Edge × confidence
    #[default]
    Composite,
}

impl RankingMethod {
    pub fn score(&self, candidate: &Candidate) -> f64 {
        match self {
            RankingMethod::Edge => candidate.edge,
            RankingMethod::Ev => candidate.edge * candidate.market_odds,
            RankingMethod::Composite => candidate.edge * candidate.confidence,
        }
    }

    /// Parse an optional method name; `None` selects the default
    pub fn resolve(name: Option<&str>) -> Result<Self, CoreError> {
        match name {
            Some(name) => name.parse(),
            None => Ok(Self::default()),
        }
    }
}

impl FromStr for RankingMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "edge" => Ok(RankingMethod::Edge),
            "ev" => Ok(RankingMethod::Ev),
            "composite" => Ok(RankingMethod::Composite),
            other => Err(CoreError::UnknownRankingMethod(other.to_string())),
        }
    }
}

impl TryFrom<String> for RankingMethod {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for RankingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankingMethod::Edge => write!(f, "edge"),
            RankingMethod::Ev => write!(f, "ev"),
            RankingMethod::Composite => write!(f, "composite"),
        }
    }
}

/// Sort best value first. The sort is stable: ties keep their input order.
pub fn rank_candidates(candidates: &mut [Candidate], method: RankingMethod) {
    candidates.sort_by(|a, b| {
        method
            .score(b)
            .partial_cmp(&method.score(a))
            .unwrap_or(Ordering::Equal)
    });
}
