//! Edge engine
//!
//! Edge = (market_odds / fair_odds) - 1, positive when the bookmaker pays
//! more than the modelled fair price.

use serde::{Deserialize, Serialize};

use super::error::{CoreError, CoreResult};
use crate::models::Classification;

/// Edge at or above which a selection is a high-confidence value bet
pub const STRONG_VALUE_EDGE: f64 = 0.10;
/// Edge at or above which a selection is a value bet at all
pub const VALUE_EDGE: f64 = 0.05;

/// Signed edge of a market price over a fair price
///
/// Total for positive inputs; excluding quotes ≤ 1.0 is the caller's job.
///
/// # Examples
/// ```
/// use propscore::core::edge::calculate_edge;
/// assert!((calculate_edge(2.5, 3.0) - 0.2).abs() < 1e-12);
/// ```
pub fn calculate_edge(fair_odds: f64, market_odds: f64) -> f64 {
    (market_odds / fair_odds) - 1.0
}

/// Edge with both prices checked for being finite and > 1.0
pub fn checked_edge(fair_odds: f64, market_odds: f64) -> CoreResult<f64> {
    for odds in [fair_odds, market_odds] {
        if !odds.is_finite() || odds <= 1.0 {
            return Err(CoreError::degenerate_odds(odds));
        }
    }
    Ok(calculate_edge(fair_odds, market_odds))
}

/// Classification of an edge with its confidence score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeAssessment {
    pub edge: f64,
    pub classification: Classification,
    pub confidence: f64,
}

/// Classify an edge
///
/// Strong VALUE edges saturate at 0.95 confidence; marginal ones climb
/// from 0.65.
pub fn classify_edge(edge: f64) -> EdgeAssessment {
    let (classification, confidence) = if edge >= STRONG_VALUE_EDGE {
        (Classification::Value, (0.7 + edge).min(0.95))
    } else if edge >= VALUE_EDGE {
        (Classification::Value, 0.6 + edge)
    } else if edge >= 0.0 {
        (Classification::NoValue, 0.5)
    } else {
        (Classification::Avoid, (0.4 + edge).max(0.2))
    };

    EdgeAssessment {
        edge,
        classification,
        confidence: confidence.clamp(0.0, 1.0),
    }
}

/// Edge and classification for a fair/market price pair
pub fn assess(fair_odds: f64, market_odds: f64) -> CoreResult<EdgeAssessment> {
    checked_edge(fair_odds, market_odds).map(classify_edge)
}
