//! Poisson "at least one occurrence" pricing
//!
//! λ = rate_per_90 × minutes/90 × Π factors, clamped to [0.001, market ceiling]
//! P(X ≥ 1) = 1 - e^(-λ)
//! fair_odds = 1 / P

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::Market;

/// Lower clamp for λ; keeps probabilities strictly positive
pub const LAMBDA_MIN: f64 = 0.001;

const LAMBDA_DECIMALS: i32 = 4;
const PROBABILITY_DECIMALS: i32 = 4;
const ODDS_DECIMALS: i32 = 2;

/// A named multiplicative adjustment, 1.0 = league average
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    pub name: String,
    pub value: f64,
}

impl Factor {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Value used in the product; unknown (non-finite) factors are neutral
    fn effective(&self) -> f64 {
        if self.value.is_finite() {
            self.value.max(0.0)
        } else {
            1.0
        }
    }
}

/// Inputs for one pricing call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingInput {
    pub market: Market,
    /// Base event rate per 90 minutes (xG/90, xA/90, ...)
    pub rate_per_90: f64,
    pub expected_minutes: f64,
    pub factors: Vec<Factor>,
    /// Name under which the base rate is echoed in the explanation
    #[serde(default = "default_rate_name")]
    pub rate_name: String,
}

fn default_rate_name() -> String {
    "rate_per_90".to_string()
}

impl PricingInput {
    pub fn new(market: Market, rate_per_90: f64, expected_minutes: f64) -> Self {
        Self {
            market,
            rate_per_90,
            expected_minutes,
            factors: Vec::new(),
            rate_name: default_rate_name(),
        }
    }

    pub fn with_rate_name(mut self, name: impl Into<String>) -> Self {
        self.rate_name = name.into();
        self
    }

    pub fn with_factor(mut self, name: impl Into<String>, value: f64) -> Self {
        self.factors.push(Factor::new(name, value));
        self
    }
}

/// Qualitative band of an at-least-one probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbabilityTier {
    Elite,
    High,
    Moderate,
    Low,
    Minimal,
}

impl ProbabilityTier {
    /// Tier thresholds differ per market since assists are rarer than goals
    pub fn for_probability(market: Market, probability: f64) -> Self {
        let bands: [f64; 4] = match market {
            Market::Goalscorer => [0.5, 0.3, 0.15, 0.05],
            Market::Assist | Market::Unknown => [0.4, 0.25, 0.12, 0.05],
        };

        if probability >= bands[0] {
            ProbabilityTier::Elite
        } else if probability >= bands[1] {
            ProbabilityTier::High
        } else if probability >= bands[2] {
            ProbabilityTier::Moderate
        } else if probability >= bands[3] {
            ProbabilityTier::Low
        } else {
            ProbabilityTier::Minimal
        }
    }

    pub fn interpretation(&self, market: Market) -> &'static str {
        match (market, self) {
            (Market::Goalscorer, ProbabilityTier::Elite) => {
                "Strong scoring threat - expected to score more often than not"
            }
            (Market::Goalscorer, ProbabilityTier::High) => {
                "Solid scoring chance - reasonable probability of finding the net"
            }
            (Market::Goalscorer, ProbabilityTier::Moderate) => {
                "Moderate chance - typical for mid-tier forwards/midfielders"
            }
            (Market::Goalscorer, ProbabilityTier::Low) => {
                "Low probability - supplementary attacking threat"
            }
            (Market::Goalscorer, ProbabilityTier::Minimal) => {
                "Very unlikely - defensive player or limited minutes expected"
            }
            (_, ProbabilityTier::Elite) => {
                "Elite creator - primary chance generator for the team"
            }
            (_, ProbabilityTier::High) => "High assist threat - key playmaker role",
            (_, ProbabilityTier::Moderate) => {
                "Moderate creator - contributes to attack regularly"
            }
            (_, ProbabilityTier::Low) => "Occasional assists - secondary creative role",
            (_, ProbabilityTier::Minimal) => {
                "Rarely assists - defensive or limited creative duties"
            }
        }
    }
}

/// Intermediate values of the calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calculation {
    pub base_lambda: f64,
    pub adjusted_lambda: f64,
    pub formula: String,
}

/// Structured explanation attached to every price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingExplanation {
    pub market: Market,
    pub inputs: BTreeMap<String, f64>,
    pub calculation: Calculation,
    pub tier: ProbabilityTier,
    pub interpretation: String,
}

/// Result of one pricing call, rounded for presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingResult {
    pub lambda_intensity: f64,
    pub probability: f64,
    pub fair_odds: f64,
    pub explanation: PricingExplanation,
}

/// Round to a fixed number of decimals
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Match intensity before clamping: rate × minutes/90 × Π factors
pub fn adjusted_intensity(rate_per_90: f64, expected_minutes: f64, factors: &[Factor]) -> (f64, f64) {
    let rate = sanitize(rate_per_90);
    let minutes = sanitize(expected_minutes);
    let base = rate * (minutes / 90.0);
    let product: f64 = factors.iter().map(Factor::effective).product();
    (base, base * product)
}

/// Clamp λ into [LAMBDA_MIN, ceiling]
pub fn clamp_intensity(lambda: f64, ceiling: f64) -> f64 {
    if lambda.is_nan() {
        return LAMBDA_MIN;
    }
    lambda.clamp(LAMBDA_MIN, ceiling.max(LAMBDA_MIN))
}

/// P(X ≥ 1) for a Poisson count with intensity λ
pub fn at_least_one(lambda: f64) -> f64 {
    1.0 - (-lambda).exp()
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

/// Price an at-least-one market
///
/// Always yields a probability in (0, 1) and finite odds: λ is clamped before
/// conversion, so the degenerate zero-probability case cannot occur here.
pub fn price(input: &PricingInput) -> PricingResult {
    let (base_lambda, raw_lambda) =
        adjusted_intensity(input.rate_per_90, input.expected_minutes, &input.factors);
    let lambda = clamp_intensity(raw_lambda, input.market.lambda_ceiling());

    let probability = at_least_one(lambda);
    let fair_odds = 1.0 / probability;
    let tier = ProbabilityTier::for_probability(input.market, probability);

    let mut inputs = BTreeMap::new();
    inputs.insert(input.rate_name.clone(), input.rate_per_90);
    inputs.insert("expected_minutes".to_string(), input.expected_minutes);
    for factor in &input.factors {
        inputs.insert(factor.name.clone(), factor.value);
    }

    let formula = match input.market {
        Market::Goalscorer => "P(score) = 1 - e^(-λ)",
        Market::Assist => "P(assist) = 1 - e^(-λ)",
        Market::Unknown => "P(X >= 1) = 1 - e^(-λ)",
    };

    PricingResult {
        lambda_intensity: round_to(lambda, LAMBDA_DECIMALS),
        probability: round_to(probability, PROBABILITY_DECIMALS),
        fair_odds: round_to(fair_odds, ODDS_DECIMALS),
        explanation: PricingExplanation {
            market: input.market,
            inputs,
            calculation: Calculation {
                base_lambda: round_to(base_lambda, LAMBDA_DECIMALS),
                adjusted_lambda: round_to(lambda, LAMBDA_DECIMALS),
                formula: formula.to_string(),
            },
            tier,
            interpretation: tier.interpretation(input.market).to_string(),
        },
    }
}
