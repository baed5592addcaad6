//! Backtest Metrics
//!
//! Calibration (Brier score, calibration buckets) and profitability metrics
//! (ROI, hit rate, drawdown, profit factor) over settled bets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::engine::BacktestBet;
use crate::core::error::{CoreError, CoreResult};

fn check_lengths(predictions: usize, outcomes: usize) -> CoreResult<()> {
    if predictions != outcomes {
        return Err(CoreError::InvalidInput(format!(
            "predictions and outcomes must have the same length ({} vs {})",
            predictions, outcomes
        )));
    }
    Ok(())
}

fn outcome_value(occurred: bool) -> f64 {
    if occurred {
        1.0
    } else {
        0.0
    }
}

fn brier<I: Iterator<Item = (f64, bool)>>(pairs: I) -> f64 {
    let (sum, n) = pairs.fold((0.0, 0usize), |(sum, n), (p, o)| {
        (sum + (p - outcome_value(o)).powi(2), n + 1)
    });
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Mean squared error between predicted probabilities and outcomes
///
/// 0.0 is perfect, 0.25 is a coin flip on 50/50 outcomes, 1.0 is always wrong.
/// Empty input scores 0.0.
///
/// # Examples
/// ```
/// use propscore::backtesting::calculate_brier_score;
/// let score = calculate_brier_score(&[0.5, 0.5], &[true, false]).unwrap();
/// assert!((score - 0.25).abs() < 1e-12);
/// ```
pub fn calculate_brier_score(predictions: &[f64], outcomes: &[bool]) -> CoreResult<f64> {
    check_lengths(predictions.len(), outcomes.len())?;
    Ok(brier(predictions.iter().copied().zip(outcomes.iter().copied())))
}

/// One equal-width probability bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationBucket {
    pub bucket: usize,
    /// [lower, upper) bounds
    pub range: (f64, f64),
    pub predicted_mean: f64,
    pub actual_rate: f64,
    pub count: usize,
}

fn bucketize<I: Iterator<Item = (f64, bool)>>(pairs: I, n_buckets: usize) -> Vec<CalibrationBucket> {
    let width = 1.0 / n_buckets as f64;
    // (sum of predictions, occurrences, count)
    let mut acc = vec![(0.0, 0usize, 0usize); n_buckets];

    for (p, occurred) in pairs {
        // Float-to-int casts saturate, so negatives and NaN land in bucket 0
        let idx = ((p / width).floor() as usize).min(n_buckets - 1);
        let slot = &mut acc[idx];
        slot.0 += p;
        slot.1 += usize::from(occurred);
        slot.2 += 1;
    }

    acc.into_iter()
        .enumerate()
        .filter(|(_, (_, _, count))| *count > 0)
        .map(|(i, (sum, hits, count))| CalibrationBucket {
            bucket: i,
            range: (i as f64 / n_buckets as f64, (i + 1) as f64 / n_buckets as f64),
            predicted_mean: sum / count as f64,
            actual_rate: hits as f64 / count as f64,
            count,
        })
        .collect()
}

/// Group predictions into `n_buckets` equal-width buckets over [0, 1)
///
/// Only non-empty buckets are returned. A prediction of exactly 1.0 falls
/// into the last bucket.
pub fn calculate_calibration(
    predictions: &[f64],
    outcomes: &[bool],
    n_buckets: usize,
) -> CoreResult<Vec<CalibrationBucket>> {
    check_lengths(predictions.len(), outcomes.len())?;
    if n_buckets == 0 {
        return Err(CoreError::InvalidInput(
            "calibration needs at least one bucket".to_string(),
        ));
    }
    Ok(bucketize(
        predictions.iter().copied().zip(outcomes.iter().copied()),
        n_buckets,
    ))
}

/// A settled bet, enough to compute returns
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SettledBet {
    pub stake: f64,
    pub odds: f64,
    pub won: bool,
}

/// (total returns - total staked) / total staked; 0.0 when nothing was staked
pub fn calculate_roi(bets: &[SettledBet]) -> f64 {
    let staked: f64 = bets.iter().map(|b| b.stake).sum();
    if staked <= 0.0 {
        return 0.0;
    }
    let returns: f64 = bets
        .iter()
        .filter(|b| b.won)
        .map(|b| b.stake * b.odds)
        .sum();
    (returns - staked) / staked
}

/// Backtest evaluation metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktestMetrics {
    // Calibration
    pub brier_score: f64,

    // Basic metrics
    pub roi: f64,
    pub win_rate: f64,
    pub avg_odds: f64,
    pub avg_edge: f64,
    pub avg_probability: f64,

    // Risk metrics
    /// `None` when no bet lost
    pub profit_factor: Option<f64>,
    pub max_drawdown: f64,
    pub max_drawdown_pct: f64,
    pub sharpe_ratio: f64,

    // Win/Loss
    pub gross_profit: f64,
    pub gross_loss: f64,
}

/// Largest peak-to-trough fall of cumulative PnL, starting from zero
pub fn calculate_max_drawdown(pnls: &[f64]) -> f64 {
    let mut cumulative = 0.0;
    let mut peak = 0.0_f64;
    let mut max_drawdown = 0.0_f64;

    for &pnl in pnls {
        cumulative += pnl;
        peak = peak.max(cumulative);
        max_drawdown = max_drawdown.max(peak - cumulative);
    }

    max_drawdown
}

/// Gross profit over gross loss, undefined when nothing was lost
pub fn calculate_profit_factor(gross_profit: f64, gross_loss: f64) -> Option<f64> {
    (gross_loss > 0.0).then(|| gross_profit / gross_loss)
}

/// Sharpe ratio over per-bet returns (PnL / stake)
pub fn calculate_sharpe_ratio(bets: &[BacktestBet], risk_free_rate: f64) -> f64 {
    let returns: Vec<f64> = bets
        .iter()
        .filter(|b| b.stake > 0.0)
        .map(|b| b.pnl / b.stake)
        .collect();

    if returns.is_empty() {
        return 0.0;
    }

    let mean_return: f64 = returns.iter().sum::<f64>() / returns.len() as f64;

    let variance: f64 = returns
        .iter()
        .map(|r| (r - mean_return).powi(2))
        .sum::<f64>()
        / returns.len() as f64;

    let std_return = variance.sqrt();

    if std_return == 0.0 {
        return 0.0;
    }

    (mean_return - risk_free_rate) / std_return
}

/// Calculate metrics from bet records
pub fn calculate_metrics(bets: &[BacktestBet]) -> BacktestMetrics {
    if bets.is_empty() {
        return BacktestMetrics::default();
    }

    let n = bets.len() as f64;
    let wins = bets.iter().filter(|b| b.won).count();

    let total_staked: f64 = bets.iter().map(|b| b.stake).sum();
    let settled: Vec<SettledBet> = bets.iter().map(BacktestBet::settled).collect();

    let pnls: Vec<f64> = bets.iter().map(|b| b.pnl).collect();
    let gross_profit = pnls.iter().filter(|&&p| p > 0.0).fold(0.0, |acc, p| acc + p);
    let gross_loss = pnls.iter().filter(|&&p| p < 0.0).fold(0.0, |acc, p| acc - p);

    let max_drawdown = calculate_max_drawdown(&pnls);
    let max_drawdown_pct = if total_staked > 0.0 {
        max_drawdown / total_staked
    } else {
        0.0
    };

    BacktestMetrics {
        brier_score: brier(bets.iter().map(|b| (b.fair_prob, b.won))),
        roi: calculate_roi(&settled),
        win_rate: wins as f64 / n,
        avg_odds: bets.iter().map(|b| b.market_odds).sum::<f64>() / n,
        avg_edge: bets.iter().map(|b| b.edge).sum::<f64>() / n,
        avg_probability: bets.iter().map(|b| b.fair_prob).sum::<f64>() / n,
        profit_factor: calculate_profit_factor(gross_profit, gross_loss),
        max_drawdown,
        max_drawdown_pct,
        sharpe_ratio: calculate_sharpe_ratio(bets, 0.0),
        gross_profit,
        gross_loss,
    }
}

/// Calibration buckets for the bets of a run
pub fn calibration_for_bets(bets: &[BacktestBet], n_buckets: usize) -> Vec<CalibrationBucket> {
    if n_buckets == 0 {
        return Vec::new();
    }
    bucketize(bets.iter().map(|b| (b.fair_prob, b.won)), n_buckets)
}

/// Analysis results by dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionAnalysis {
    pub key: String,
    pub bets: usize,
    pub wins: usize,
    pub hit_rate: f64,
    pub stake: f64,
    pub profit: f64,
    pub roi: f64,
}

fn analyze_by<F>(bets: &[BacktestBet], key_fn: F) -> Vec<DimensionAnalysis>
where
    F: Fn(&BacktestBet) -> String,
{
    let mut grouped: BTreeMap<String, Vec<&BacktestBet>> = BTreeMap::new();
    for bet in bets {
        grouped.entry(key_fn(bet)).or_default().push(bet);
    }

    grouped
        .into_iter()
        .map(|(key, group)| {
            let total = group.len();
            let wins = group.iter().filter(|b| b.won).count();
            let stake: f64 = group.iter().map(|b| b.stake).sum();
            let profit: f64 = group.iter().map(|b| b.pnl).sum();

            DimensionAnalysis {
                key,
                bets: total,
                wins,
                hit_rate: if total > 0 {
                    wins as f64 / total as f64
                } else {
                    0.0
                },
                stake,
                profit,
                roi: if stake > 0.0 { profit / stake } else { 0.0 },
            }
        })
        .collect()
}

/// Analyze bet results by market
pub fn analyze_by_market(bets: &[BacktestBet]) -> Vec<DimensionAnalysis> {
    analyze_by(bets, |b| b.market.to_string())
}

/// Analyze bet results by odds range
pub fn analyze_by_odds_range(bets: &[BacktestBet]) -> Vec<DimensionAnalysis> {
    analyze_by(bets, |b| {
        if b.market_odds < 2.0 {
            "short (<2)".to_string()
        } else if b.market_odds < 5.0 {
            "mid (2-5)".to_string()
        } else {
            "long (5+)".to_string()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Market;
    use chrono::NaiveDate;

    fn bet(market: Market, odds: f64, stake: f64, won: bool) -> BacktestBet {
        BacktestBet {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            fixture_id: "f1".to_string(),
            player: "Salah".to_string(),
            market,
            fair_prob: 0.4,
            market_odds: odds,
            edge: 0.1,
            stake,
            won,
            pnl: if won { stake * (odds - 1.0) } else { -stake },
        }
    }

    fn settled(stake: f64, odds: f64, won: bool) -> SettledBet {
        SettledBet { stake, odds, won }
    }

    #[test]
    fn test_brier_perfect_and_worst() {
        let outcomes = [true, false, true, false];
        assert_eq!(
            calculate_brier_score(&[1.0, 0.0, 1.0, 0.0], &outcomes).unwrap(),
            0.0
        );
        assert_eq!(
            calculate_brier_score(&[0.0, 1.0, 0.0, 1.0], &outcomes).unwrap(),
            1.0
        );
    }

    #[test]
    fn test_brier_coin_flip() {
        let score = calculate_brier_score(&[0.5; 4], &[true, false, true, false]).unwrap();
        assert!((score - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_brier_typical_goalscorer_range() {
        let score = calculate_brier_score(
            &[0.35, 0.28, 0.42, 0.31, 0.38],
            &[true, false, true, false, false],
        )
        .unwrap();
        assert!((0.1..=0.3).contains(&score));
    }

    #[test]
    fn test_brier_length_mismatch() {
        assert!(matches!(
            calculate_brier_score(&[0.5, 0.5], &[true]),
            Err(CoreError::InvalidInput(_))
        ));
        assert_eq!(calculate_brier_score(&[], &[]).unwrap(), 0.0);
    }

    #[test]
    fn test_calibration_well_calibrated() {
        let outcomes: Vec<bool> = (0..10).map(|i| i < 3).collect();
        let buckets = calculate_calibration(&[0.3; 10], &outcomes, 5).unwrap();

        assert_eq!(buckets.len(), 1);
        let b = &buckets[0];
        assert_eq!(b.bucket, 1);
        assert_eq!(b.count, 10);
        assert!((b.predicted_mean - 0.3).abs() < 1e-12);
        assert!((b.actual_rate - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_calibration_structure() {
        let buckets = calculate_calibration(
            &[0.1, 0.2, 0.5, 0.8, 0.9, 1.0],
            &[false, false, true, true, true, true],
            3,
        )
        .unwrap();

        assert!(buckets.len() <= 3);
        assert_eq!(buckets.iter().map(|b| b.count).sum::<usize>(), 6);
        let last = buckets.last().unwrap();
        assert_eq!(last.bucket, 2);
        assert_eq!(last.count, 3);
    }

    #[test]
    fn test_calibration_bounds_are_exact() {
        let buckets = calculate_calibration(&[0.55, 0.75], &[true, false], 10).unwrap();

        assert_eq!(buckets[0].range, (0.5, 0.6));
        assert_eq!(buckets[1].range, (0.7, 0.8));
    }

    #[test]
    fn test_calibration_errors() {
        assert!(calculate_calibration(&[0.1], &[], 10).is_err());
        assert!(calculate_calibration(&[0.1], &[true], 0).is_err());
        assert!(calculate_calibration(&[], &[], 10).unwrap().is_empty());
    }

    #[test]
    fn test_roi() {
        let bets = [
            settled(10.0, 2.5, true),
            settled(10.0, 2.0, true),
            settled(10.0, 3.0, false),
            settled(10.0, 2.5, false),
        ];
        assert!((calculate_roi(&bets) - 0.125).abs() < 1e-12);

        let losers = [settled(10.0, 2.0, false), settled(10.0, 2.0, false)];
        assert_eq!(calculate_roi(&losers), -1.0);

        let even = [settled(10.0, 2.0, true), settled(10.0, 2.0, false)];
        assert!(calculate_roi(&even).abs() < 1e-12);

        assert_eq!(calculate_roi(&[]), 0.0);
    }

    #[test]
    fn test_calculate_metrics() {
        let bets = vec![
            bet(Market::Goalscorer, 2.5, 10.0, true),
            bet(Market::Goalscorer, 2.0, 10.0, true),
            bet(Market::Assist, 3.0, 10.0, false),
            bet(Market::Assist, 2.5, 10.0, false),
        ];
        let metrics = calculate_metrics(&bets);

        assert!((metrics.roi - 0.125).abs() < 1e-12);
        assert_eq!(metrics.win_rate, 0.5);
        assert!((metrics.avg_odds - 2.5).abs() < 1e-12);
        assert!((metrics.gross_profit - 25.0).abs() < 1e-12);
        assert!((metrics.gross_loss - 20.0).abs() < 1e-12);
        assert!((metrics.profit_factor.unwrap() - 1.25).abs() < 1e-12);
        // Cumulative: 15, 25, 15, 5
        assert!((metrics.max_drawdown - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_calculate_metrics_empty() {
        assert_eq!(calculate_metrics(&[]), BacktestMetrics::default());
    }

    #[test]
    fn test_max_drawdown_counts_from_zero() {
        assert_eq!(calculate_max_drawdown(&[-10.0, -5.0, 20.0]), 15.0);
        assert_eq!(calculate_max_drawdown(&[900.0, -100.0, -100.0]), 200.0);
        assert_eq!(calculate_max_drawdown(&[]), 0.0);
    }

    #[test]
    fn test_profit_factor_edges() {
        assert_eq!(calculate_profit_factor(10.0, 0.0), None);
        assert_eq!(calculate_profit_factor(0.0, 0.0), None);
        assert_eq!(calculate_profit_factor(0.0, 5.0), Some(0.0));
    }

    #[test]
    fn test_calculate_metrics_without_losses() {
        let bets = vec![
            bet(Market::Goalscorer, 2.5, 10.0, true),
            bet(Market::Assist, 3.0, 10.0, true),
        ];
        let metrics = calculate_metrics(&bets);

        assert_eq!(metrics.profit_factor, None);
        assert_eq!(metrics.gross_loss, 0.0);
        assert!(metrics.gross_loss.is_sign_positive());

        let json = serde_json::to_string(&metrics).unwrap();
        let restored: BacktestMetrics = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, metrics);
    }

    #[test]
    fn test_sharpe_ratio() {
        let bets = vec![
            bet(Market::Goalscorer, 8.0, 10.0, true),
            bet(Market::Goalscorer, 8.0, 10.0, false),
            bet(Market::Goalscorer, 10.0, 10.0, true),
        ];
        // Returns: 7.0, -1.0, 9.0
        assert!(calculate_sharpe_ratio(&bets, 0.0) > 0.0);
        assert_eq!(calculate_sharpe_ratio(&[], 0.0), 0.0);
    }

    #[test]
    fn test_analyze_by_market() {
        let bets = vec![
            bet(Market::Goalscorer, 2.5, 10.0, true),
            bet(Market::Assist, 3.0, 10.0, false),
            bet(Market::Assist, 6.0, 10.0, true),
        ];
        let analysis = analyze_by_market(&bets);

        assert_eq!(analysis.len(), 2);
        let assist = analysis.iter().find(|a| a.key == "assist").unwrap();
        assert_eq!(assist.bets, 2);
        assert_eq!(assist.wins, 1);
        assert!((assist.profit - 40.0).abs() < 1e-12);
    }

    #[test]
    fn test_analyze_by_odds_range() {
        let bets = vec![
            bet(Market::Goalscorer, 1.8, 10.0, true),
            bet(Market::Goalscorer, 3.0, 10.0, false),
            bet(Market::Goalscorer, 4.5, 10.0, false),
            bet(Market::Goalscorer, 9.0, 10.0, false),
        ];
        let analysis = analyze_by_odds_range(&bets);

        assert_eq!(analysis.len(), 3);
        let mid = analysis.iter().find(|a| a.key == "mid (2-5)").unwrap();
        assert_eq!(mid.bets, 2);
        assert_eq!(mid.roi, -1.0);
    }
}
