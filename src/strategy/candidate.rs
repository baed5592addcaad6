//! Joining fair prices with bookmaker quotes

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::edge::{checked_edge, classify_edge};
use crate::core::error::{CoreError, CoreResult};
use crate::core::odds::{best_quote, normalize_selection_name};
use crate::models::{Candidate, MarketQuote};
use crate::pricing::PricingResult;

/// Who and where a priced selection refers to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateContext {
    /// Explicit id; derived from fixture, player and market when absent
    #[serde(default)]
    pub id: Option<String>,
    pub fixture_id: String,
    pub player: String,
    pub team: String,
    #[serde(default)]
    pub league: Option<String>,
}

/// Build a candidate from a fair price and the best available quote
///
/// # Returns
/// * `Ok(None)` when no bookmaker quotes the selection
/// * `Err(DegenerateMarket)` when either price cannot produce an edge
pub fn build_candidate(
    context: &CandidateContext,
    pricing: &PricingResult,
    quotes: &[MarketQuote],
) -> CoreResult<Option<Candidate>> {
    let market = pricing.explanation.market;

    let Some(quote) = best_quote(quotes, &context.fixture_id, &context.player, market) else {
        debug!(player = %context.player, %market, "No quote available");
        return Ok(None);
    };

    let edge = checked_edge(pricing.fair_odds, quote.odds)?;
    let assessment = classify_edge(edge);

    let id = context.id.clone().unwrap_or_else(|| {
        format!(
            "{}:{}:{}",
            context.fixture_id,
            normalize_selection_name(&context.player),
            market
        )
    });

    Ok(Some(Candidate {
        id,
        fixture_id: context.fixture_id.clone(),
        player: context.player.clone(),
        team: context.team.clone(),
        league: context.league.clone(),
        market,
        fair_probability: pricing.probability,
        fair_odds: pricing.fair_odds,
        market_odds: quote.odds,
        bookmaker: Some(quote.bookmaker.clone()),
        edge: assessment.edge,
        classification: assessment.classification,
        confidence: assessment.confidence,
    }))
}

/// Build candidates for a batch, skipping unquoted and degenerate selections
///
/// # Returns
/// Candidates in input order and the number of degenerate selections skipped
pub fn build_candidates(
    priced: &[(CandidateContext, PricingResult)],
    quotes: &[MarketQuote],
) -> (Vec<Candidate>, usize) {
    let mut candidates = Vec::with_capacity(priced.len());
    let mut skipped = 0;

    for (context, pricing) in priced {
        match build_candidate(context, pricing, quotes) {
            Ok(Some(candidate)) => candidates.push(candidate),
            Ok(None) => {}
            Err(CoreError::DegenerateMarket(reason)) => {
                warn!(player = %context.player, %reason, "Skipping degenerate selection");
                skipped += 1;
            }
            Err(e) => {
                warn!(player = %context.player, error = %e, "Skipping selection");
                skipped += 1;
            }
        }
    }

    (candidates, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Classification, Market};
    use crate::pricing::{calculate_goalscorer_price, GoalscorerInput};
    use chrono::{TimeZone, Utc};

    fn context(player: &str) -> CandidateContext {
        CandidateContext {
            id: None,
            fixture_id: "psg-om".to_string(),
            player: player.to_string(),
            team: "PSG".to_string(),
            league: Some("ligue1".to_string()),
        }
    }

    fn quote(player: &str, bookmaker: &str, odds: f64) -> MarketQuote {
        MarketQuote {
            fixture_id: "psg-om".to_string(),
            player: player.to_string(),
            market: Market::Goalscorer,
            bookmaker: bookmaker.to_string(),
            odds,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 2, 18, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_build_candidate_uses_best_quote() {
        // fair odds 2.54
        let pricing = calculate_goalscorer_price(&GoalscorerInput::new(0.5));
        let quotes = vec![
            quote("O. Dembélé", "winamax", 2.80),
            quote("o dembélé", "betclic", 3.00),
            quote("Hakimi", "betclic", 9.00),
        ];

        let candidate = build_candidate(&context("O. Dembélé"), &pricing, &quotes)
            .unwrap()
            .unwrap();

        assert_eq!(candidate.market_odds, 3.0);
        assert_eq!(candidate.bookmaker.as_deref(), Some("betclic"));
        assert!((candidate.edge - (3.0 / 2.54 - 1.0)).abs() < 1e-12);
        assert_eq!(candidate.classification, Classification::Value);
        assert_eq!(candidate.id, "psg-om:o-dembélé:goalscorer");
    }

    #[test]
    fn test_build_candidate_without_quote() {
        let pricing = calculate_goalscorer_price(&GoalscorerInput::new(0.5));
        let result = build_candidate(&context("Barcola"), &pricing, &[]).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_build_candidate_degenerate_quote() {
        let pricing = calculate_goalscorer_price(&GoalscorerInput::new(0.5));
        let quotes = vec![quote("Barcola", "winamax", 1.0)];
        let result = build_candidate(&context("Barcola"), &pricing, &quotes);
        assert!(matches!(result, Err(CoreError::DegenerateMarket(_))));
    }

    #[test]
    fn test_build_candidates_batch() {
        let pricing = calculate_goalscorer_price(&GoalscorerInput::new(0.5));
        let priced = vec![
            (context("Barcola"), pricing.clone()),
            (context("Dembele"), pricing.clone()),
            (context("Ramos"), pricing),
        ];
        let quotes = vec![quote("Barcola", "winamax", 1.0), quote("Dembele", "winamax", 2.2)];

        let (candidates, skipped) = build_candidates(&priced, &quotes);
        assert_eq!(candidates.len(), 1);
        assert_eq!(skipped, 1);
        assert_eq!(candidates[0].classification, Classification::Avoid);
    }
}
