//! Propscore - Player-prop pricing and betting strategy
//!
//! This library provides:
//! - Poisson pricing of anytime goalscorer and anytime assist markets
//! - Margin removal, best-odds lookup and edge classification
//! - Bet selection: filtering, ranking, fractional Kelly sizing and exposure caps
//! - Walk-forward backtesting with Brier score and calibration metrics
//!
//! # Example
//!
//! ```no_run
//! use propscore::pricing::{calculate_goalscorer_price, GoalscorerInput};
//! use propscore::core::kelly::KellyCalculator;
//!
//! // Price a striker playing the full match
//! let result = calculate_goalscorer_price(&GoalscorerInput::new(0.55));
//! println!("Fair odds: {}", result.fair_odds);
//!
//! // Size a bet against a bookmaker price of 2.60
//! let calc = KellyCalculator::with_defaults(1000.0);
//! let sizing = calc.calculate_single(result.probability, 2.60);
//! println!("Recommended stake: {}", sizing.stake);
//! ```

pub mod backtesting;
pub mod config;
pub mod core;
pub mod data;
pub mod models;
pub mod pricing;
pub mod strategy;

// API-specific modules (only available with api feature)
#[cfg(feature = "api")]
pub mod error;

// Re-export commonly used types
pub use backtesting::{BacktestConfig, BacktestEngine, BacktestResult};
pub use config::{load_strategy_config, ServerConfig, StrategyConfig};
pub use core::{CoreError, CoreResult, MarginMethod};
pub use models::{Candidate, Classification, HistoricalRecord, Market, MarketQuote};
pub use pricing::{calculate_assist_price, calculate_goalscorer_price, PricingResult};
pub use strategy::{select_bets, RankingMethod, SelectionParams, SelectionResult};
