//! Backtesting engine for validating the selection strategy on history

pub mod engine;
pub mod metrics;
pub mod report;
pub mod walk_forward;

pub use engine::{BacktestBet, BacktestConfig, BacktestEngine, BacktestResult, StakeMethod};
pub use metrics::{
    calculate_brier_score, calculate_calibration, calculate_metrics, calculate_roi,
    BacktestMetrics, CalibrationBucket, DimensionAnalysis, SettledBet,
};
pub use report::{generate_backtest_report, BacktestReport, EdgeHistogram};
pub use walk_forward::{walk_forward_split, DateRange, WalkForwardSplit};
