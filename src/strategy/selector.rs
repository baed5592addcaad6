//! Four-stage bet selection: filter, rank, stake, cap exposure

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::exposure::{apply_exposure_limits, ExposureLimits};
use super::filter::{filter_candidates, RecommendationFilterConfig, RejectionCounts};
use super::ranking::{rank_candidates, RankingMethod};
use crate::core::kelly::{calculate_kelly_stake, round_cents};
use crate::models::Candidate;

/// Bankroll, sizing and cap parameters for one selection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionParams {
    pub bankroll: f64,
    /// Kelly multiplier (0.25 = quarter Kelly)
    pub kelly_fraction: f64,
    /// Cap on any single stake
    pub max_stake: Option<f64>,
    #[serde(flatten)]
    pub limits: ExposureLimits,
    pub ranking: RankingMethod,
    /// Drop bets correlated above this level with an already-selected bet
    pub max_correlation: Option<f64>,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            bankroll: 1000.0,
            kelly_fraction: 0.25,
            max_stake: None,
            limits: ExposureLimits::default(),
            ranking: RankingMethod::default(),
            max_correlation: None,
        }
    }
}

/// A committed bet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedBet {
    pub candidate: Candidate,
    /// Stake before exposure capping
    pub kelly_stake: f64,
    /// Final stake
    pub stake: f64,
}

/// Outcome of a selection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    /// Committed bets in rank order
    pub selected: Vec<SelectedBet>,
    /// Candidates removed by the quality filter
    pub filtered_out: usize,
    pub total_stake: f64,
    pub rejections: RejectionCounts,
}

impl SelectionResult {
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

/// Stake for one candidate from its own fair price
///
/// The win probability is taken as 1 / fair_odds; a candidate with no
/// usable fair price sizes to zero.
pub fn size_candidate(candidate: &Candidate, params: &SelectionParams) -> f64 {
    if !(candidate.fair_odds > 0.0) {
        return 0.0;
    }
    calculate_kelly_stake(
        1.0 / candidate.fair_odds,
        candidate.market_odds,
        params.bankroll,
        params.kelly_fraction,
        params.max_stake,
    )
}

/// Select and size bets from a batch of candidates
///
/// # Arguments
/// * `candidates` - Priced candidates in any order
/// * `filter` - Quality thresholds
/// * `params` - Bankroll, Kelly fraction, caps and ranking method
///
/// # Returns
/// Committed bets in rank order with their final stakes
pub fn select_bets(
    candidates: &[Candidate],
    filter: &RecommendationFilterConfig,
    params: &SelectionParams,
) -> SelectionResult {
    // Stage 1: filter
    let (mut kept, mut rejections) = filter_candidates(candidates, filter);
    let filtered_out = rejections.filtered();
    debug!(kept = kept.len(), filtered_out, "Filter stage");

    // Stage 2: rank
    rank_candidates(&mut kept, params.ranking);

    // Stage 3: stake
    let sized: Vec<SelectedBet> = kept
        .into_iter()
        .filter_map(|candidate| {
            let stake = size_candidate(&candidate, params);
            if stake <= 0.0 {
                debug!(id = %candidate.id, "Dropped: no positive Kelly stake");
                rejections.zero_stake += 1;
                return None;
            }
            Some(SelectedBet {
                candidate,
                kelly_stake: stake,
                stake,
            })
        })
        .collect();

    // Stage 4: exposure caps, in rank order
    let outcome = apply_exposure_limits(sized, &params.limits, params.max_correlation);
    rejections.exposure = outcome.dropped_exposure;
    rejections.correlation = outcome.dropped_correlation;

    let total_stake = round_cents(outcome.committed.iter().map(|b| b.stake).sum());

    info!(
        candidates = candidates.len(),
        selected = outcome.committed.len(),
        total_stake,
        ranking = %params.ranking,
        "Selection complete"
    );

    SelectionResult {
        selected: outcome.committed,
        filtered_out,
        total_stake,
        rejections,
    }
}
