//! Human-readable backtest report

use serde::{Deserialize, Serialize};

use super::engine::{BacktestBet, BacktestResult};
use super::metrics::{
    analyze_by_market, analyze_by_odds_range, CalibrationBucket, DimensionAnalysis,
};

/// Bet counts per edge band; anything under 10% lands in the first band
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeHistogram {
    #[serde(rename = "5-10%")]
    pub edge_5_10: usize,
    #[serde(rename = "10-15%")]
    pub edge_10_15: usize,
    #[serde(rename = "15-20%")]
    pub edge_15_20: usize,
    #[serde(rename = "20%+")]
    pub edge_20_plus: usize,
}

impl EdgeHistogram {
    pub fn from_bets(bets: &[BacktestBet]) -> Self {
        bets.iter().fold(Self::default(), |mut h, bet| {
            if bet.edge >= 0.20 {
                h.edge_20_plus += 1;
            } else if bet.edge >= 0.15 {
                h.edge_15_20 += 1;
            } else if bet.edge >= 0.10 {
                h.edge_10_15 += 1;
            } else {
                h.edge_5_10 += 1;
            }
            h
        })
    }

    pub fn total(&self) -> usize {
        self.edge_5_10 + self.edge_10_15 + self.edge_15_20 + self.edge_20_plus
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_bets: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: String,
    pub roi: String,
    pub profit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetrics {
    pub brier_score: String,
    pub avg_odds: String,
    pub avg_edge: String,
    pub profit_factor: String,
    pub max_drawdown: String,
}

/// Formatted summary of a backtest run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub summary: ReportSummary,
    pub metrics: ReportMetrics,
    pub calibration: Vec<CalibrationBucket>,
    pub bet_count_by_edge: EdgeHistogram,
    pub by_market: Vec<DimensionAnalysis>,
    pub by_odds_range: Vec<DimensionAnalysis>,
}

/// Format a ratio as a percentage with one decimal (0.125 -> "12.5%")
pub fn format_percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

fn format_factor(value: Option<f64>, gross_profit: f64) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None if gross_profit > 0.0 => "inf".to_string(),
        None => "n/a".to_string(),
    }
}

/// Render a result into display strings, the edge histogram and breakdowns
pub fn generate_backtest_report(result: &BacktestResult) -> BacktestReport {
    BacktestReport {
        summary: ReportSummary {
            total_bets: result.total_bets,
            wins: result.wins,
            losses: result.losses,
            win_rate: format_percent(result.win_rate()),
            roi: format_percent(result.roi()),
            profit: format!("{:.2}", result.profit),
        },
        metrics: ReportMetrics {
            brier_score: format!("{:.4}", result.metrics.brier_score),
            avg_odds: format!("{:.2}", result.metrics.avg_odds),
            avg_edge: format_percent(result.metrics.avg_edge),
            profit_factor: format_factor(
                result.metrics.profit_factor,
                result.metrics.gross_profit,
            ),
            max_drawdown: format!("{:.2}", result.metrics.max_drawdown),
        },
        calibration: result.calibration.clone(),
        bet_count_by_edge: EdgeHistogram::from_bets(&result.bets),
        by_market: analyze_by_market(&result.bets),
        by_odds_range: analyze_by_odds_range(&result.bets),
    }
}
