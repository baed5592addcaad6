//! Backtest Engine
//!
//! Replays historical priced-bet records through the selection filter and
//! stake sizing, settles them against realized outcomes and aggregates
//! calibration and profitability metrics.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::metrics::{
    calculate_metrics, calibration_for_bets, BacktestMetrics, CalibrationBucket, SettledBet,
};
use super::walk_forward::{walk_forward_split, DateRange};
use crate::core::error::{CoreError, CoreResult};
use crate::core::kelly::{calculate_kelly_stake, round_cents};
use crate::models::{HistoricalRecord, Market};
use crate::strategy::RecommendationFilterConfig;

/// Stake sizing method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum StakeMethod {
    /// Fixed amount per bet
    #[default]
    Flat,
    /// Fractional Kelly on the record's fair probability
    Kelly,
}

impl FromStr for StakeMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(StakeMethod::Flat),
            "kelly" => Ok(StakeMethod::Kelly),
            other => Err(CoreError::UnknownStakeMethod(other.to_string())),
        }
    }
}

impl TryFrom<String> for StakeMethod {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for StakeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StakeMethod::Flat => write!(f, "flat"),
            StakeMethod::Kelly => write!(f, "kelly"),
        }
    }
}

/// Backtest configuration
///
/// The filter thresholds have the same shape as [`RecommendationFilterConfig`]
/// but defaults suited to historical replay: no upper edge bound and no
/// market or league restriction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    // Filters
    pub min_edge: f64,
    pub max_edge: f64,
    pub min_confidence: f64,
    pub min_odds: f64,
    pub max_odds: f64,
    pub markets: Vec<Market>,
    pub leagues: Vec<String>,

    // Stake sizing
    pub stake_method: StakeMethod,
    pub flat_stake: f64,
    pub kelly_fraction: f64,
    /// Assumed bankroll for Kelly sizing
    pub bankroll: f64,
    pub max_stake: f64,

    // Validation
    pub train_days: u32,
    pub test_days: u32,
    pub step_days: u32,
    pub calibration_buckets: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            min_edge: 0.05,
            max_edge: f64::MAX,
            min_confidence: 0.5,
            min_odds: 1.2,
            max_odds: 15.0,
            markets: Vec::new(),
            leagues: Vec::new(),
            stake_method: StakeMethod::Flat,
            flat_stake: 10.0,
            kelly_fraction: 0.25,
            bankroll: 1000.0,
            max_stake: 100.0,
            train_days: 90,
            test_days: 30,
            step_days: 30,
            calibration_buckets: 10,
        }
    }
}

impl BacktestConfig {
    pub fn filter(&self) -> RecommendationFilterConfig {
        RecommendationFilterConfig {
            min_edge: self.min_edge,
            max_edge: self.max_edge,
            min_confidence: self.min_confidence,
            min_odds: self.min_odds,
            max_odds: self.max_odds,
            markets: self.markets.clone(),
            leagues: self.leagues.clone(),
        }
    }

    /// Stake for one record; 0 means the record is not bet
    pub fn stake_for(&self, record: &HistoricalRecord) -> f64 {
        match self.stake_method {
            StakeMethod::Flat => self.flat_stake.max(0.0),
            StakeMethod::Kelly => calculate_kelly_stake(
                record.fair_prob,
                record.market_odds,
                self.bankroll,
                self.kelly_fraction,
                Some(self.max_stake),
            ),
        }
    }
}

/// Individual bet record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestBet {
    pub date: NaiveDate,
    pub fixture_id: String,
    pub player: String,
    pub market: Market,
    pub fair_prob: f64,
    pub market_odds: f64,
    pub edge: f64,
    pub stake: f64,
    pub won: bool,
    pub pnl: f64,
}

impl BacktestBet {
    /// Settle a record at the given stake
    pub fn settle(record: &HistoricalRecord, stake: f64) -> Self {
        let pnl = if record.outcome {
            stake * (record.market_odds - 1.0)
        } else {
            -stake
        };

        Self {
            date: record.date,
            fixture_id: record.fixture_id.clone(),
            player: record.player.clone(),
            market: record.market,
            fair_prob: record.fair_prob,
            market_odds: record.market_odds,
            edge: record.edge,
            stake,
            won: record.outcome,
            pnl,
        }
    }

    pub fn returns(&self) -> f64 {
        if self.won {
            self.stake * self.market_odds
        } else {
            0.0
        }
    }

    pub fn settled(&self) -> SettledBet {
        SettledBet {
            stake: self.stake,
            odds: self.market_odds,
            won: self.won,
        }
    }
}

/// Backtest result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub total_bets: usize,
    pub wins: usize,
    pub losses: usize,
    pub total_staked: f64,
    pub total_returns: f64,
    pub profit: f64,
    pub metrics: BacktestMetrics,
    pub bets: Vec<BacktestBet>,
    pub calibration: Vec<CalibrationBucket>,
    /// Test window this result covers (walk-forward runs only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_window: Option<DateRange>,
}

impl BacktestResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bet: BacktestBet) {
        self.total_staked += bet.stake;
        self.total_returns += bet.returns();
        if bet.won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        self.bets.push(bet);
    }

    pub fn win_rate(&self) -> f64 {
        if self.total_bets == 0 {
            0.0
        } else {
            self.wins as f64 / self.total_bets as f64
        }
    }

    pub fn roi(&self) -> f64 {
        if self.total_staked <= 0.0 {
            0.0
        } else {
            self.profit / self.total_staked
        }
    }

    /// Fill in totals, metrics and calibration from the bet log
    pub fn finalize(&mut self, calibration_buckets: usize) {
        self.total_bets = self.bets.len();
        self.total_staked = round_cents(self.total_staked);
        self.total_returns = round_cents(self.total_returns);
        self.profit = round_cents(self.total_returns - self.total_staked);
        self.metrics = calculate_metrics(&self.bets);
        self.calibration = calibration_for_bets(&self.bets, calibration_buckets);
    }
}

/// Engine for running backtests on historical records
#[derive(Debug, Clone, Default)]
pub struct BacktestEngine {
    pub config: BacktestConfig,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig) -> Self {
        Self { config }
    }

    /// Filter, size and settle every record
    ///
    /// Records that fail the filter or size to a zero stake are not bet.
    /// An empty input yields an all-zero result.
    pub fn run(&self, records: &[HistoricalRecord]) -> BacktestResult {
        let filter = self.config.filter();
        let mut result = BacktestResult::new();
        let mut filtered_out = 0usize;
        let mut zero_stake = 0usize;

        for record in records {
            if !filter.accepts(record) {
                filtered_out += 1;
                continue;
            }

            let stake = self.config.stake_for(record);
            if stake <= 0.0 {
                zero_stake += 1;
                continue;
            }

            result.push(BacktestBet::settle(record, stake));
        }

        result.finalize(self.config.calibration_buckets);

        debug!(
            records = records.len(),
            filtered_out,
            zero_stake,
            bets = result.total_bets,
            "Backtest run"
        );

        result
    }

    /// Run on each walk-forward test window
    ///
    /// Train windows only enforce chronological separation; nothing is fitted.
    pub fn run_walk_forward(
        &self,
        records: &[HistoricalRecord],
    ) -> CoreResult<Vec<BacktestResult>> {
        let dates: Vec<NaiveDate> = records.iter().map(|r| r.date).collect();
        let splits = walk_forward_split(
            &dates,
            self.config.train_days,
            self.config.test_days,
            self.config.step_days,
        )?;

        let mut results = Vec::with_capacity(splits.len());

        for split in splits {
            let window: Vec<HistoricalRecord> = records
                .iter()
                .filter(|r| split.test_range.contains(r.date))
                .cloned()
                .collect();

            if window.is_empty() {
                continue;
            }

            let mut result = self.run(&window);
            result.test_window = Some(split.test_range);

            info!(
                start = %split.test_range.start,
                end = %split.test_range.end,
                bets = result.total_bets,
                roi = result.roi(),
                "Walk-forward window"
            );

            results.push(result);
        }

        Ok(results)
    }
}
