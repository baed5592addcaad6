//! Greedy exposure capping
//!
//! Bets are walked in rank order. Each stake is clamped to the headroom left
//! under the per-match, per-team and per-day caps; a bet whose clamped stake
//! is not positive is dropped. The walk is sequential because every commit
//! shrinks the headroom of the bets behind it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::correlation::check_correlation;
use super::selector::SelectedBet;

/// Grouping key for candidates with no fixture or team
const UNKNOWN_GROUP: &str = "unknown";

/// Stake caps; the day cap bounds the whole batch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExposureLimits {
    pub max_per_match: f64,
    pub max_per_team: f64,
    pub max_per_day: f64,
}

impl Default for ExposureLimits {
    fn default() -> Self {
        Self {
            max_per_match: 100.0,
            max_per_team: 200.0,
            max_per_day: 500.0,
        }
    }
}

fn group_key(id: &str) -> &str {
    let id = id.trim();
    if id.is_empty() {
        UNKNOWN_GROUP
    } else {
        id
    }
}

/// Round down to cents without letting float noise eat a cent
fn floor_cents(amount: f64) -> f64 {
    ((amount + 1e-9) * 100.0).floor() / 100.0
}

/// Running totals per fixture, per team and for the day
#[derive(Debug, Default)]
pub struct ExposureTracker {
    limits: ExposureLimits,
    per_match: HashMap<String, f64>,
    per_team: HashMap<String, f64>,
    day_total: f64,
}

impl ExposureTracker {
    pub fn new(limits: ExposureLimits) -> Self {
        Self {
            limits,
            ..Default::default()
        }
    }

    /// Largest stake that still fits under all three caps
    pub fn headroom(&self, fixture_id: &str, team: &str) -> f64 {
        let used_match = self.per_match.get(group_key(fixture_id)).copied().unwrap_or(0.0);
        let used_team = self.per_team.get(group_key(team)).copied().unwrap_or(0.0);

        (self.limits.max_per_match - used_match)
            .min(self.limits.max_per_team - used_team)
            .min(self.limits.max_per_day - self.day_total)
    }

    pub fn commit(&mut self, fixture_id: &str, team: &str, stake: f64) {
        *self
            .per_match
            .entry(group_key(fixture_id).to_string())
            .or_insert(0.0) += stake;
        *self.per_team.entry(group_key(team).to_string()).or_insert(0.0) += stake;
        self.day_total += stake;
    }

    pub fn day_total(&self) -> f64 {
        self.day_total
    }
}

/// Bets committed by the exposure stage and what it dropped
#[derive(Debug, Clone, Default)]
pub struct ExposureOutcome {
    pub committed: Vec<SelectedBet>,
    pub dropped_exposure: usize,
    pub dropped_correlation: usize,
}

/// Walk ranked bets and clamp each stake to the remaining headroom
///
/// # Arguments
/// * `ranked` - Sized bets, best value first
/// * `limits` - Per-match, per-team and per-day caps
/// * `max_correlation` - When set, a bet whose correlation with any
///   already-committed bet exceeds this value is dropped
pub fn apply_exposure_limits(
    ranked: Vec<SelectedBet>,
    limits: &ExposureLimits,
    max_correlation: Option<f64>,
) -> ExposureOutcome {
    let mut tracker = ExposureTracker::new(*limits);
    let mut outcome = ExposureOutcome::default();

    for mut bet in ranked {
        if let Some(threshold) = max_correlation {
            let correlated = outcome
                .committed
                .iter()
                .any(|kept| check_correlation(&kept.candidate, &bet.candidate) > threshold);
            if correlated {
                debug!(id = %bet.candidate.id, "Dropped: correlated with a committed bet");
                outcome.dropped_correlation += 1;
                continue;
            }
        }

        let headroom = tracker.headroom(&bet.candidate.fixture_id, &bet.candidate.team);
        let stake = floor_cents(bet.stake.min(headroom));

        if stake <= 0.0 {
            debug!(id = %bet.candidate.id, headroom, "Dropped: exposure caps exhausted");
            outcome.dropped_exposure += 1;
            continue;
        }

        tracker.commit(&bet.candidate.fixture_id, &bet.candidate.team, stake);
        bet.stake = stake;
        outcome.committed.push(bet);
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Candidate, Classification, Market};

    fn bet(id: &str, fixture: &str, team: &str, stake: f64) -> SelectedBet {
        SelectedBet {
            candidate: Candidate {
                id: id.to_string(),
                fixture_id: fixture.to_string(),
                player: id.to_string(),
                team: team.to_string(),
                league: None,
                market: Market::Goalscorer,
                fair_probability: 0.4,
                fair_odds: 2.5,
                market_odds: 2.8,
                bookmaker: None,
                edge: 0.12,
                classification: Classification::Value,
                confidence: 0.8,
            },
            kelly_stake: stake,
            stake,
        }
    }

    fn stakes(outcome: &ExposureOutcome) -> Vec<f64> {
        outcome.committed.iter().map(|b| b.stake).collect()
    }

    #[test]
    fn test_match_cap_clamps_then_drops() {
        let limits = ExposureLimits {
            max_per_match: 100.0,
            max_per_team: 1000.0,
            max_per_day: 1000.0,
        };
        let bets = vec![
            bet("a", "f1", "PSG", 60.0),
            bet("b", "f1", "OM", 60.0),
            bet("c", "f1", "PSG", 10.0),
        ];
        let outcome = apply_exposure_limits(bets, &limits, None);

        assert_eq!(stakes(&outcome), vec![60.0, 40.0]);
        assert_eq!(outcome.dropped_exposure, 1);
    }

    #[test]
    fn test_team_cap_across_fixtures() {
        let limits = ExposureLimits {
            max_per_match: 1000.0,
            max_per_team: 50.0,
            max_per_day: 1000.0,
        };
        let bets = vec![
            bet("a", "f1", "PSG", 30.0),
            bet("b", "f2", "PSG", 30.0),
            bet("c", "f3", "Lyon", 30.0),
        ];
        let outcome = apply_exposure_limits(bets, &limits, None);
        assert_eq!(stakes(&outcome), vec![30.0, 20.0, 30.0]);
    }

    #[test]
    fn test_day_cap_bounds_batch() {
        let limits = ExposureLimits {
            max_per_match: 100.0,
            max_per_team: 100.0,
            max_per_day: 120.0,
        };
        let bets = vec![
            bet("a", "f1", "A", 50.0),
            bet("b", "f2", "B", 50.0),
            bet("c", "f3", "C", 50.0),
            bet("d", "f4", "D", 50.0),
        ];
        let outcome = apply_exposure_limits(bets, &limits, None);

        assert_eq!(stakes(&outcome), vec![50.0, 50.0, 20.0]);
        assert_eq!(outcome.dropped_exposure, 1);
        let total: f64 = stakes(&outcome).iter().sum();
        assert!(total <= 120.0 + 1e-9);
    }

    #[test]
    fn test_missing_identifiers_share_unknown_group() {
        let limits = ExposureLimits {
            max_per_match: 25.0,
            max_per_team: 1000.0,
            max_per_day: 1000.0,
        };
        let bets = vec![bet("a", "", "A", 20.0), bet("b", " ", "B", 20.0)];
        let outcome = apply_exposure_limits(bets, &limits, None);
        assert_eq!(stakes(&outcome), vec![20.0, 5.0]);
    }

    #[test]
    fn test_correlation_gate() {
        let bets = vec![
            bet("a", "f1", "PSG", 10.0),
            bet("b", "f1", "PSG", 10.0),
            bet("c", "f2", "Lyon", 10.0),
        ];
        let outcome = apply_exposure_limits(bets, &ExposureLimits::default(), Some(0.6));

        assert_eq!(outcome.committed.len(), 2);
        assert_eq!(outcome.dropped_correlation, 1);
        assert_eq!(outcome.committed[1].candidate.id, "c");
    }

    #[test]
    fn test_tracker_headroom() {
        let mut tracker = ExposureTracker::new(ExposureLimits::default());
        assert_eq!(tracker.headroom("f1", "PSG"), 100.0);
        tracker.commit("f1", "PSG", 70.0);
        assert_eq!(tracker.headroom("f1", "Lyon"), 30.0);
        assert_eq!(tracker.headroom("f2", "PSG"), 100.0);
        assert_eq!(tracker.day_total(), 70.0);

        // 150 on PSG leaves 50 under the team cap
        tracker.commit("f3", "PSG", 80.0);
        assert_eq!(tracker.headroom("f2", "PSG"), 50.0);
        assert_eq!(tracker.headroom("f2", "Lyon"), 100.0);
    }
}
