use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::backtesting::{BacktestConfig, BacktestReport, BacktestResult};
use crate::core::error::CoreError;
use crate::core::odds::MarginMethod;
use crate::pricing::PricingExplanation;
use crate::strategy::{RecommendationFilterConfig, SelectionParams};

/// Player-prop market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    /// Anytime goalscorer
    Goalscorer,
    /// Anytime assist
    Assist,
    /// Unrecognized market string from an external feed
    #[serde(other)]
    Unknown,
}

impl Market {
    /// Realistic single-match ceiling for the event intensity
    pub fn lambda_ceiling(&self) -> f64 {
        match self {
            Market::Goalscorer => 3.0,
            Market::Assist => 2.0,
            Market::Unknown => 2.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Goalscorer => "goalscorer",
            Market::Assist => "assist",
            Market::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "goalscorer" => Ok(Market::Goalscorer),
            "assist" => Ok(Market::Assist),
            other => Err(CoreError::InvalidInput(format!("unknown market: {}", other))),
        }
    }
}

/// Edge classification tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Value,
    NoValue,
    Avoid,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Value => write!(f, "VALUE"),
            Classification::NoValue => write!(f, "NO_VALUE"),
            Classification::Avoid => write!(f, "AVOID"),
        }
    }
}

/// One bookmaker's price for one selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub fixture_id: String,
    pub player: String,
    pub market: Market,
    pub bookmaker: String,
    pub odds: f64,
    pub timestamp: DateTime<Utc>,
}

impl MarketQuote {
    pub fn implied_probability(&self) -> Option<f64> {
        crate::core::odds::implied_probability(self.odds).ok()
    }
}

/// A priced selection joined with its best market price
///
/// Deserialization is lenient: numeric fields that are missing or not numbers
/// become 0.0 so the candidate is rejected by the filter or sized to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub fixture_id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub player: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub team: String,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub league: Option<String>,
    #[serde(default = "unknown_market", deserialize_with = "lenient::market")]
    pub market: Market,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub fair_probability: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub fair_odds: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub market_odds: f64,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub bookmaker: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub edge: f64,
    #[serde(default = "avoid", deserialize_with = "lenient::classification")]
    pub classification: Classification,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub confidence: f64,
}

fn unknown_market() -> Market {
    Market::Unknown
}

fn avoid() -> Classification {
    Classification::Avoid
}

/// One realized historical observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    pub date: NaiveDate,
    pub fixture_id: String,
    pub player: String,
    pub market: Market,
    #[serde(default)]
    pub league: Option<String>,
    /// Probability estimated at the time
    pub fair_prob: f64,
    pub market_odds: f64,
    pub edge: f64,
    #[serde(default = "full_confidence")]
    pub confidence: f64,
    #[serde(deserialize_with = "lenient::outcome")]
    pub outcome: bool,
}

fn full_confidence() -> f64 {
    1.0
}

impl HistoricalRecord {
    /// Boundary validation for data entering the backtester
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.fair_prob.is_finite() || !(0.0..=1.0).contains(&self.fair_prob) {
            return Err(CoreError::InvalidInput(format!(
                "{} / {}: fair_prob must be in [0, 1], got {}",
                self.fixture_id, self.player, self.fair_prob
            )));
        }
        if !self.market_odds.is_finite() || self.market_odds <= 0.0 {
            return Err(CoreError::InvalidInput(format!(
                "{} / {}: market_odds must be positive, got {}",
                self.fixture_id, self.player, self.market_odds
            )));
        }
        if !self.edge.is_finite() {
            return Err(CoreError::InvalidInput(format!(
                "{} / {}: edge must be finite",
                self.fixture_id, self.player
            )));
        }
        Ok(())
    }
}

/// Deserializers that never reject a candidate row
mod lenient {
    use super::*;

    pub fn f64_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        let value = Value::deserialize(d)?;
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        Ok(parsed.filter(|v| v.is_finite()).unwrap_or(0.0))
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(optional_string(d)?.unwrap_or_default())
    }

    pub fn optional_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(match value {
            Value::String(s) if !s.trim().is_empty() => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn market<'de, D: Deserializer<'de>>(d: D) -> Result<Market, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(value
            .as_str()
            .and_then(|s| s.parse::<Market>().ok())
            .unwrap_or(Market::Unknown))
    }

    pub fn classification<'de, D: Deserializer<'de>>(d: D) -> Result<Classification, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(match value.as_str().map(|s| s.trim().to_ascii_uppercase()) {
            Some(s) if s == "VALUE" => Classification::Value,
            Some(s) if s == "NO_VALUE" => Classification::NoValue,
            _ => Classification::Avoid,
        })
    }

    /// Accepts `true`/`false`, `1`/`0`, or their string forms
    pub fn outcome<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        use serde::de::Error;

        let value = Value::deserialize(d)?;
        match &value {
            Value::Bool(b) => Ok(*b),
            Value::Number(n) if n.as_f64() == Some(1.0) => Ok(true),
            Value::Number(n) if n.as_f64() == Some(0.0) => Ok(false),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" => Ok(true),
                "0" | "false" => Ok(false),
                _ => Err(D::Error::custom(format!("invalid outcome: {}", s))),
            },
            _ => Err(D::Error::custom(format!("invalid outcome: {}", value))),
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP request / response bodies
// ---------------------------------------------------------------------------

fn ninety() -> f64 {
    90.0
}

fn neutral() -> f64 {
    1.0
}

/// Anytime goalscorer pricing request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalscorerPriceRequest {
    pub player_id: String,
    pub fixture_id: String,
    pub xg_per_90: f64,
    #[serde(default = "ninety")]
    pub expected_minutes: f64,
    #[serde(default = "neutral")]
    pub conversion_rate: f64,
    #[serde(default = "neutral")]
    pub opponent_xga_factor: f64,
    #[serde(default = "neutral")]
    pub form_factor: f64,
}

/// Anytime assist pricing request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistPriceRequest {
    pub player_id: String,
    pub fixture_id: String,
    pub xa_per_90: f64,
    #[serde(default = "ninety")]
    pub expected_minutes: f64,
    #[serde(default = "neutral")]
    pub creation_score: f64,
    #[serde(default = "neutral")]
    pub teammate_finishing_factor: f64,
    #[serde(default = "neutral")]
    pub opponent_defense_factor: f64,
    #[serde(default = "neutral")]
    pub form_factor: f64,
}

/// Pricing response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceResponse {
    pub player_id: String,
    pub fixture_id: String,
    pub market_type: Market,
    pub lambda_intensity: f64,
    pub probability: f64,
    pub fair_odds: f64,
    pub explanation: PricingExplanation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveMarginRequest {
    pub odds: Vec<f64>,
    #[serde(default)]
    pub method: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveMarginResponse {
    pub method: MarginMethod,
    pub overround: f64,
    pub fair_odds: Vec<f64>,
}

/// Selection request: candidates plus optional overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionRequest {
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub filter: Option<RecommendationFilterConfig>,
    #[serde(default)]
    pub params: Option<SelectionParams>,
    /// Ranking method name; absent means the default
    #[serde(default)]
    pub ranking: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestRequest {
    pub records: Vec<HistoricalRecord>,
    #[serde(default)]
    pub config: Option<BacktestConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResponse {
    pub result: BacktestResult,
    pub report: BacktestReport,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
