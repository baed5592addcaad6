//! Anytime assist pricing
//!
//! The assist model multiplies the xA base rate by a composite creation
//! score built from several chance-creation metrics, each normalized against
//! a league average (1.0 = average).
//!
//! λ = (xA/90 × expected_mins/90) × creation_score × teammate_finishing × opponent_defense × form

use serde::{Deserialize, Serialize};

use super::poisson::{price, round_to, PricingInput, PricingResult};
use crate::models::Market;

/// Weights of the creation components; they sum to 1.0
pub const CREATION_WEIGHTS: CreationMetrics = CreationMetrics {
    xa: 0.35,
    key_passes: 0.20,
    sca: 0.15,
    crosses: 0.10,
    passes_into_box: 0.10,
    progressive_passes: 0.10,
};

/// Per-90 chance-creation metrics (also used for league baselines and weights)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CreationMetrics {
    pub xa: f64,
    #[serde(default)]
    pub key_passes: f64,
    /// Shot-creating actions
    #[serde(default)]
    pub sca: f64,
    #[serde(default)]
    pub crosses: f64,
    #[serde(default)]
    pub passes_into_box: f64,
    #[serde(default)]
    pub progressive_passes: f64,
}

impl CreationMetrics {
    fn components(&self) -> [(&'static str, f64); 6] {
        [
            ("xa", self.xa),
            ("key_passes", self.key_passes),
            ("sca", self.sca),
            ("crosses", self.crosses),
            ("passes_into_box", self.passes_into_box),
            ("progressive_passes", self.progressive_passes),
        ]
    }
}

/// League-average baselines for the creation metrics
pub type LeagueAverages = CreationMetrics;

impl Default for CreationMetrics {
    /// Approximate top-flight averages per 90
    fn default() -> Self {
        Self {
            xa: 0.15,
            key_passes: 1.5,
            sca: 2.5,
            crosses: 2.0,
            passes_into_box: 1.0,
            progressive_passes: 4.0,
        }
    }
}

/// One component of the creation score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreationComponent {
    pub metric: String,
    pub raw: f64,
    pub normalized: f64,
    pub weight: f64,
    pub contribution: f64,
}

/// Composite creation score with its breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreationScore {
    pub score: f64,
    pub components: Vec<CreationComponent>,
}

/// Weighted, league-normalized creation score
///
/// A metric whose league baseline is zero (or unset) contributes as exactly
/// average instead of dividing by zero.
pub fn calculate_creation_score(metrics: &CreationMetrics, averages: &LeagueAverages) -> CreationScore {
    let weights = CREATION_WEIGHTS.components();
    let baselines = averages.components();

    let mut score = 0.0;
    let mut components = Vec::with_capacity(weights.len());

    for (((metric, raw), (_, baseline)), (_, weight)) in metrics
        .components()
        .into_iter()
        .zip(baselines)
        .zip(weights)
    {
        let normalized = if baseline > 0.0 && raw.is_finite() {
            raw / baseline
        } else {
            1.0
        };
        let contribution = normalized * weight;
        score += contribution;

        components.push(CreationComponent {
            metric: metric.to_string(),
            raw,
            normalized: round_to(normalized, 3),
            weight,
            contribution: round_to(contribution, 3),
        });
    }

    CreationScore { score, components }
}

/// Assist model inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistInput {
    /// Expected assists per 90 minutes
    pub xa_per_90: f64,
    pub expected_minutes: f64,
    /// Composite creation score (1.0 = league average)
    pub creation_score: f64,
    /// Team finishing quality (goals / xG)
    pub teammate_finishing_factor: f64,
    /// Opponent defensive weakness (xGA / league average)
    pub opponent_defense_factor: f64,
    pub form_factor: f64,
}

impl AssistInput {
    pub fn new(xa_per_90: f64) -> Self {
        Self {
            xa_per_90,
            expected_minutes: 90.0,
            creation_score: 1.0,
            teammate_finishing_factor: 1.0,
            opponent_defense_factor: 1.0,
            form_factor: 1.0,
        }
    }

    /// Inputs with the creation score derived from raw metrics
    pub fn from_metrics(metrics: &CreationMetrics, averages: &LeagueAverages) -> Self {
        Self {
            creation_score: calculate_creation_score(metrics, averages).score,
            ..Self::new(metrics.xa)
        }
    }

    pub fn to_pricing_input(&self) -> PricingInput {
        PricingInput::new(Market::Assist, self.xa_per_90, self.expected_minutes)
            .with_rate_name("xa_per_90")
            .with_factor("creation_score", self.creation_score)
            .with_factor("teammate_finishing_factor", self.teammate_finishing_factor)
            .with_factor("opponent_defense_factor", self.opponent_defense_factor)
            .with_factor("form_factor", self.form_factor)
    }
}

/// Fair price for the anytime assist market
pub fn calculate_assist_price(input: &AssistInput) -> PricingResult {
    price(&input.to_pricing_input())
}
