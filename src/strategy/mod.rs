//! Selection and staking engine
//!
//! Filters priced candidates by quality thresholds, ranks them by a value
//! metric, sizes stakes with fractional Kelly and enforces per-match,
//! per-team and per-day exposure caps.

pub mod candidate;
pub mod correlation;
pub mod exposure;
pub mod filter;
pub mod ranking;
pub mod selector;

pub use candidate::{build_candidate, build_candidates, CandidateContext};
pub use correlation::check_correlation;
pub use exposure::{apply_exposure_limits, ExposureLimits, ExposureOutcome, ExposureTracker};
pub use filter::{filter_candidates, RecommendationFilterConfig, RejectionCounts, Screenable};
pub use ranking::{rank_candidates, RankingMethod};
pub use selector::{select_bets, size_candidate, SelectedBet, SelectionParams, SelectionResult};
