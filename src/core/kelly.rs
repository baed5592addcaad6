//! Kelly Criterion Bet Sizing
//!
//! Optimal bet sizing based on edge and odds using Kelly criterion.
//!
//! The Kelly criterion formula:
//!     f* = (b*p - q) / b
//!
//! Where:
//!     f* = fraction of bankroll to bet
//!     b = odds - 1 (net odds)
//!     p = probability of winning
//!     q = 1 - p (probability of losing)

use serde::{Deserialize, Serialize};

/// Bet sizing recommendation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetSizing {
    pub probability: f64,
    pub odds: f64,
    pub expected_value: f64,
    pub edge: f64,                 // EV - 1
    pub kelly_fraction: f64,       // Full Kelly
    pub recommended_fraction: f64, // After applying Kelly multiplier
    pub stake: f64,
}

/// Calculate full Kelly fraction for a single bet
///
/// # Arguments
/// * `probability` - Estimated probability of winning (0-1)
/// * `odds` - Decimal odds
///
/// # Returns
/// Kelly fraction (negative when the bet has no edge, 0 for invalid inputs)
///
/// # Examples
/// ```
/// use propscore::core::kelly::calculate_kelly_fraction;
/// let kelly = calculate_kelly_fraction(0.40, 3.0);
/// assert!((kelly - 0.1).abs() < 1e-12);
/// ```
pub fn calculate_kelly_fraction(probability: f64, odds: f64) -> f64 {
    if !odds.is_finite() || odds <= 1.0 {
        return 0.0;
    }
    if !probability.is_finite() || probability <= 0.0 || probability >= 1.0 {
        return 0.0;
    }

    let b = odds - 1.0;
    let q = 1.0 - probability;
    (b * probability - q) / b
}

/// Fractional Kelly stake
///
/// # Arguments
/// * `probability` - Modelled probability
/// * `odds` - Decimal odds offered
/// * `bankroll` - Current bankroll
/// * `fraction` - Kelly multiplier (0.25 = quarter Kelly)
/// * `max_stake` - Optional cap on a single stake
///
/// # Returns
/// Stake rounded to cents, 0 when the bet has no edge
pub fn calculate_kelly_stake(
    probability: f64,
    odds: f64,
    bankroll: f64,
    fraction: f64,
    max_stake: Option<f64>,
) -> f64 {
    let kelly = calculate_kelly_fraction(probability, odds);

    if kelly <= 0.0 || fraction <= 0.0 || bankroll <= 0.0 {
        return 0.0;
    }

    let mut stake = kelly * fraction * bankroll;

    if let Some(cap) = max_stake {
        stake = stake.min(cap.max(0.0));
    }

    round_cents(stake)
}

pub(crate) fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Kelly criterion calculator for bet sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KellyCalculator {
    pub bankroll: f64,
    pub kelly_multiplier: f64,
    pub max_stake: Option<f64>,
}

impl KellyCalculator {
    pub fn new(bankroll: f64, kelly_multiplier: f64, max_stake: Option<f64>) -> Self {
        Self {
            bankroll,
            kelly_multiplier,
            max_stake,
        }
    }

    /// Quarter Kelly, no stake cap
    pub fn with_defaults(bankroll: f64) -> Self {
        Self {
            bankroll,
            kelly_multiplier: 0.25,
            max_stake: None,
        }
    }

    /// Calculate bet sizing for a single bet
    pub fn calculate_single(&self, probability: f64, odds: f64) -> BetSizing {
        let ev = probability * odds;
        let kelly = calculate_kelly_fraction(probability, odds);
        let recommended = (kelly * self.kelly_multiplier).max(0.0);

        let stake = calculate_kelly_stake(
            probability,
            odds,
            self.bankroll,
            self.kelly_multiplier,
            self.max_stake,
        );

        BetSizing {
            probability,
            odds,
            expected_value: ev,
            edge: ev - 1.0,
            kelly_fraction: kelly,
            recommended_fraction: recommended,
            stake,
        }
    }
}

impl Default for KellyCalculator {
    fn default() -> Self {
        Self::with_defaults(1000.0)
    }
}
