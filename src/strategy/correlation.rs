//! Pairwise correlation heuristic between two selections

use crate::core::odds::normalize_selection_name;
use crate::models::Candidate;

pub const SAME_PLAYER: f64 = 0.9;
pub const SAME_FIXTURE_AND_TEAM: f64 = 0.7;
pub const SAME_FIXTURE: f64 = 0.5;
pub const SAME_TEAM: f64 = 0.3;
pub const UNRELATED: f64 = 0.1;

fn same(a: &str, b: &str) -> bool {
    !a.trim().is_empty() && a.trim() == b.trim()
}

/// Estimated outcome correlation of two bets
///
/// Goalscorer and assist on the same player are strongly linked; teammates in
/// the same match share the team's scoring; anything in the same match shares
/// the game state. Empty identifiers never match.
pub fn check_correlation(a: &Candidate, b: &Candidate) -> f64 {
    let player_a = normalize_selection_name(&a.player);
    if !player_a.is_empty() && player_a == normalize_selection_name(&b.player) {
        return SAME_PLAYER;
    }

    let same_fixture = same(&a.fixture_id, &b.fixture_id);
    let same_team = same(&a.team, &b.team);

    match (same_fixture, same_team) {
        (true, true) => SAME_FIXTURE_AND_TEAM,
        (true, false) => SAME_FIXTURE,
        (false, true) => SAME_TEAM,
        (false, false) => UNRELATED,
    }
}
