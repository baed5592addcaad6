//! Configuration
//!
//! `StrategyConfig` is read from a TOML file and handed to the core as
//! explicit arguments. `ServerConfig` is read from the environment by the
//! HTTP binary only.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backtesting::BacktestConfig;
use crate::pricing::form::{ASSIST_DECAY, GOALSCORER_DECAY};
use crate::pricing::LeagueAverages;
use crate::strategy::{RecommendationFilterConfig, SelectionParams};

/// Pricing defaults that are not part of a single request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub goalscorer_decay: f64,
    pub assist_decay: f64,
    /// Baselines for the assist creation score
    pub league_averages: LeagueAverages,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            goalscorer_decay: GOALSCORER_DECAY,
            assist_decay: ASSIST_DECAY,
            league_averages: LeagueAverages::default(),
        }
    }
}

/// Strategy configuration; every section is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub filter: RecommendationFilterConfig,
    pub selection: SelectionParams,
    pub backtest: BacktestConfig,
    pub pricing: PricingConfig,
}

/// Parse and validate a strategy TOML document
pub fn parse_strategy_config(content: &str) -> Result<StrategyConfig> {
    let config: StrategyConfig =
        toml::from_str(content).context("Failed to parse strategy config")?;
    validate_strategy_config(&config)?;
    Ok(config)
}

/// Load and validate a strategy TOML file
///
/// # Errors
/// Returns a detailed error if the file cannot be read, the TOML does not
/// parse, or a validation rule is violated.
pub fn load_strategy_config<P: AsRef<Path>>(path: P) -> Result<StrategyConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_strategy_config(&content)
        .with_context(|| format!("Invalid strategy config: {}", path.display()))?;

    info!(
        path = %path.display(),
        min_edge = config.filter.min_edge,
        bankroll = config.selection.bankroll,
        kelly = config.selection.kelly_fraction,
        stake_method = %config.backtest.stake_method,
        "Strategy configuration loaded"
    );

    Ok(config)
}

fn validate_strategy_config(config: &StrategyConfig) -> Result<()> {
    // Filter validation
    let filter = &config.filter;
    anyhow::ensure!(
        filter.min_edge <= filter.max_edge,
        "filter.min_edge ({}) must not exceed filter.max_edge ({})",
        filter.min_edge,
        filter.max_edge
    );
    anyhow::ensure!(
        (0.0..=1.0).contains(&filter.min_confidence),
        "filter.min_confidence must be in [0, 1], got {}",
        filter.min_confidence
    );
    anyhow::ensure!(
        filter.min_odds <= filter.max_odds,
        "filter.min_odds ({}) must not exceed filter.max_odds ({})",
        filter.min_odds,
        filter.max_odds
    );

    // Selection validation
    let selection = &config.selection;
    anyhow::ensure!(
        selection.bankroll > 0.0,
        "selection.bankroll must be positive, got {}",
        selection.bankroll
    );
    anyhow::ensure!(
        selection.kelly_fraction > 0.0 && selection.kelly_fraction <= 1.0,
        "selection.kelly_fraction must be in (0, 1], got {}",
        selection.kelly_fraction
    );
    if let Some(max_stake) = selection.max_stake {
        anyhow::ensure!(max_stake > 0.0, "selection.max_stake must be positive");
    }
    for (name, cap) in [
        ("max_per_match", selection.limits.max_per_match),
        ("max_per_team", selection.limits.max_per_team),
        ("max_per_day", selection.limits.max_per_day),
    ] {
        anyhow::ensure!(cap >= 0.0, "selection.{} must not be negative, got {}", name, cap);
    }

    // Backtest validation
    let backtest = &config.backtest;
    anyhow::ensure!(
        backtest.kelly_fraction > 0.0 && backtest.kelly_fraction <= 1.0,
        "backtest.kelly_fraction must be in (0, 1], got {}",
        backtest.kelly_fraction
    );
    anyhow::ensure!(
        backtest.flat_stake > 0.0,
        "backtest.flat_stake must be positive"
    );
    anyhow::ensure!(
        backtest.train_days > 0 && backtest.test_days > 0 && backtest.step_days > 0,
        "backtest windows must be positive (train={}, test={}, step={})",
        backtest.train_days,
        backtest.test_days,
        backtest.step_days
    );
    anyhow::ensure!(
        backtest.calibration_buckets > 0,
        "backtest.calibration_buckets must be positive"
    );

    // Pricing validation
    anyhow::ensure!(
        config.pricing.goalscorer_decay >= 0.0 && config.pricing.assist_decay >= 0.0,
        "form decay rates must not be negative"
    );

    Ok(())
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Optional strategy TOML
    pub strategy_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            strategy_path: None,
        }
    }
}

impl ServerConfig {
    /// Read `HOST`, `PORT` and `PROPSCORE_CONFIG`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("Invalid PORT: {}", raw))?,
            None => defaults.port,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            strategy_path: lookup("PROPSCORE_CONFIG")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        })
    }

    /// Strategy from `strategy_path`, or the defaults when unset
    pub fn load_strategy(&self) -> Result<StrategyConfig> {
        match &self.strategy_path {
            Some(path) => load_strategy_config(path),
            None => Ok(StrategyConfig::default()),
        }
    }
}
