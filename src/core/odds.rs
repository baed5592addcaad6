//! Decimal odds utilities
//!
//! Conversions between decimal odds and implied probability, bookmaker
//! margin (overround) removal, and best-price lookup across bookmakers.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{CoreError, CoreResult};
use crate::models::{Market, MarketQuote};

/// Implied probability of a decimal price
///
/// # Examples
/// ```
/// use propscore::core::odds::implied_probability;
/// let p = implied_probability(2.5).unwrap();
/// assert!((p - 0.4).abs() < 1e-12);
/// ```
pub fn implied_probability(odds: f64) -> CoreResult<f64> {
    if !odds.is_finite() || odds <= 1.0 {
        return Err(CoreError::degenerate_odds(odds));
    }
    Ok(1.0 / odds)
}

/// Decimal odds for a probability in (0, 1)
pub fn probability_to_odds(probability: f64) -> CoreResult<f64> {
    if !probability.is_finite() || probability <= 0.0 || probability >= 1.0 {
        return Err(CoreError::degenerate_probability(probability));
    }
    Ok(1.0 / probability)
}

/// Total implied probability of a full odds set (1.0 = no margin)
pub fn overround(odds: &[f64]) -> CoreResult<f64> {
    if odds.is_empty() {
        return Err(CoreError::InvalidInput("odds set is empty".to_string()));
    }
    odds.iter().map(|&o| implied_probability(o)).sum()
}

/// Margin removal method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginMethod {
    /// Scale every price by the overround
    #[default]
    Proportional,
    /// Subtract an equal share of the margin from each implied probability
    Equal,
}

impl FromStr for MarginMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "proportional" => Ok(MarginMethod::Proportional),
            "equal" => Ok(MarginMethod::Equal),
            other => Err(CoreError::UnknownMarginMethod(other.to_string())),
        }
    }
}

impl fmt::Display for MarginMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginMethod::Proportional => write!(f, "proportional"),
            MarginMethod::Equal => write!(f, "equal"),
        }
    }
}

/// Strip the bookmaker margin from a complete odds set
///
/// The returned prices have implied probabilities summing to 1.0.
/// Fails on an empty set, on any price ≤ 1.0, and (equal method only) when a
/// selection's implied probability is smaller than its share of the margin.
pub fn remove_margin(odds: &[f64], method: MarginMethod) -> CoreResult<Vec<f64>> {
    let total = overround(odds)?;

    match method {
        MarginMethod::Proportional => Ok(odds.iter().map(|&o| o * total).collect()),
        MarginMethod::Equal => {
            let share = (total - 1.0) / odds.len() as f64;
            odds.iter()
                .map(|&o| {
                    let fair_prob = 1.0 / o - share;
                    if fair_prob <= 0.0 || fair_prob >= 1.0 {
                        Err(CoreError::degenerate_probability(fair_prob))
                    } else {
                        Ok(1.0 / fair_prob)
                    }
                })
                .collect()
        }
    }
}

/// Normalize a bookmaker selection name for matching
///
/// "K. Mbappe" and "k mbappe" both become "k-mbappe".
pub fn normalize_selection_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '.' | ',' | '\''))
        .flat_map(char::to_lowercase)
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Key identifying one selection across bookmakers
pub type SelectionKey = (String, String, Market);

/// Best (highest) price per (fixture, normalized player, market)
pub fn find_best_quotes(quotes: &[MarketQuote]) -> HashMap<SelectionKey, MarketQuote> {
    let mut best: HashMap<SelectionKey, MarketQuote> = HashMap::new();

    for quote in quotes {
        let key = (
            quote.fixture_id.clone(),
            normalize_selection_name(&quote.player),
            quote.market,
        );
        match best.get(&key) {
            Some(current) if current.odds >= quote.odds => {}
            _ => {
                best.insert(key, quote.clone());
            }
        }
    }

    best
}

/// Best quote for one selection, if any bookmaker prices it
pub fn best_quote<'a>(
    quotes: &'a [MarketQuote],
    fixture_id: &str,
    player: &str,
    market: Market,
) -> Option<&'a MarketQuote> {
    let wanted = normalize_selection_name(player);
    quotes
        .iter()
        .filter(|q| {
            q.fixture_id == fixture_id
                && q.market == market
                && normalize_selection_name(&q.player) == wanted
        })
        .fold(None, |best: Option<&MarketQuote>, q| match best {
            Some(b) if b.odds >= q.odds => Some(b),
            _ => Some(q),
        })
}
