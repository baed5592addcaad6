//! Anytime goalscorer pricing
//!
//! λ = (xG/90 × expected_mins/90) × conversion_rate × opponent_xga_factor × form_factor

use serde::{Deserialize, Serialize};

use super::poisson::{price, PricingInput, PricingResult};
use crate::models::Market;

/// Goalscorer model inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalscorerInput {
    /// Expected goals per 90 minutes
    pub xg_per_90: f64,
    pub expected_minutes: f64,
    /// Finishing skill: actual goals / npxG over recent matches
    pub conversion_rate: f64,
    /// Opponent xGA relative to league average
    pub opponent_xga_factor: f64,
    pub form_factor: f64,
}

impl GoalscorerInput {
    /// A full 90 minutes at league-average adjustments
    pub fn new(xg_per_90: f64) -> Self {
        Self {
            xg_per_90,
            expected_minutes: 90.0,
            conversion_rate: 1.0,
            opponent_xga_factor: 1.0,
            form_factor: 1.0,
        }
    }

    pub fn to_pricing_input(&self) -> PricingInput {
        PricingInput::new(Market::Goalscorer, self.xg_per_90, self.expected_minutes)
            .with_rate_name("xg_per_90")
            .with_factor("conversion_rate", self.conversion_rate)
            .with_factor("opponent_xga_factor", self.opponent_xga_factor)
            .with_factor("form_factor", self.form_factor)
    }
}

/// Fair price for the anytime goalscorer market
///
/// # Examples
/// ```
/// use propscore::pricing::{calculate_goalscorer_price, GoalscorerInput};
/// let result = calculate_goalscorer_price(&GoalscorerInput::new(0.5));
/// assert_eq!(result.fair_odds, 2.54);
/// ```
pub fn calculate_goalscorer_price(input: &GoalscorerInput) -> PricingResult {
    price(&input.to_pricing_input())
}
