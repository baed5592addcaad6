//! Quality filter shared by live selection and backtesting

use serde::{Deserialize, Serialize};

use crate::models::{Candidate, HistoricalRecord, Market};

/// Anything that can be screened by edge, confidence, price and market
pub trait Screenable {
    fn edge(&self) -> f64;
    fn confidence(&self) -> f64;
    fn market_odds(&self) -> f64;
    fn market(&self) -> Market;
    fn league(&self) -> Option<&str>;
}

impl Screenable for Candidate {
    fn edge(&self) -> f64 {
        self.edge
    }
    fn confidence(&self) -> f64 {
        self.confidence
    }
    fn market_odds(&self) -> f64 {
        self.market_odds
    }
    fn market(&self) -> Market {
        self.market
    }
    fn league(&self) -> Option<&str> {
        self.league.as_deref()
    }
}

impl Screenable for HistoricalRecord {
    fn edge(&self) -> f64 {
        self.edge
    }
    fn confidence(&self) -> f64 {
        self.confidence
    }
    fn market_odds(&self) -> f64 {
        self.market_odds
    }
    fn market(&self) -> Market {
        self.market
    }
    fn league(&self) -> Option<&str> {
        self.league.as_deref()
    }
}

/// Filter thresholds and allow-sets (empty set = no restriction)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationFilterConfig {
    pub min_edge: f64,
    /// Upper sanity bound; larger edges usually mean a stale or wrong price
    pub max_edge: f64,
    pub min_confidence: f64,
    pub min_odds: f64,
    pub max_odds: f64,
    pub markets: Vec<Market>,
    pub leagues: Vec<String>,
}

impl Default for RecommendationFilterConfig {
    fn default() -> Self {
        Self {
            min_edge: 0.05,
            max_edge: 1.0,
            min_confidence: 0.50,
            min_odds: 1.3,
            max_odds: 15.0,
            markets: vec![Market::Goalscorer, Market::Assist],
            leagues: vec!["ligue1".to_string(), "premier_league".to_string()],
        }
    }
}

/// Why an item left the selection pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Edge,
    Confidence,
    Odds,
    Market,
    League,
}

impl RecommendationFilterConfig {
    /// First failed criterion, or `None` when the item passes
    pub fn check<T: Screenable + ?Sized>(&self, item: &T) -> Option<Rejection> {
        let edge = item.edge();
        if !(edge >= self.min_edge && edge <= self.max_edge) {
            return Some(Rejection::Edge);
        }

        if !(item.confidence() >= self.min_confidence) {
            return Some(Rejection::Confidence);
        }

        let odds = item.market_odds();
        if !(odds >= self.min_odds && odds <= self.max_odds) {
            return Some(Rejection::Odds);
        }

        if !self.markets.is_empty() && !self.markets.contains(&item.market()) {
            return Some(Rejection::Market);
        }

        // Items without a league are not restricted by the league allow-set
        if let Some(league) = item.league() {
            if !self.leagues.is_empty() && !self.leagues.iter().any(|l| l == league) {
                return Some(Rejection::League);
            }
        }

        None
    }

    pub fn accepts<T: Screenable + ?Sized>(&self, item: &T) -> bool {
        self.check(item).is_none()
    }
}

/// Counts of items removed at each stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionCounts {
    pub edge: usize,
    pub confidence: usize,
    pub odds: usize,
    pub market: usize,
    pub league: usize,
    pub zero_stake: usize,
    pub exposure: usize,
    pub correlation: usize,
}

impl RejectionCounts {
    pub fn record(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::Edge => self.edge += 1,
            Rejection::Confidence => self.confidence += 1,
            Rejection::Odds => self.odds += 1,
            Rejection::Market => self.market += 1,
            Rejection::League => self.league += 1,
        }
    }

    /// Items removed by the quality filter
    pub fn filtered(&self) -> usize {
        self.edge + self.confidence + self.odds + self.market + self.league
    }
}

/// Order-preserving filter
pub fn filter_candidates<T: Screenable + Clone>(
    items: &[T],
    config: &RecommendationFilterConfig,
) -> (Vec<T>, RejectionCounts) {
    let mut counts = RejectionCounts::default();
    let mut kept = Vec::with_capacity(items.len());

    for item in items {
        match config.check(item) {
            Some(rejection) => counts.record(rejection),
            None => kept.push(item.clone()),
        }
    }

    (kept, counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Classification;

    fn candidate(id: &str, edge: f64, odds: f64, confidence: f64) -> Candidate {
        Candidate {
            id: id.to_string(),
            fixture_id: format!("f{}", id),
            player: format!("player-{}", id),
            team: format!("team-{}", id),
            league: Some("ligue1".to_string()),
            market: Market::Goalscorer,
            fair_probability: 1.0 / (odds / (1.0 + edge)),
            fair_odds: odds / (1.0 + edge),
            market_odds: odds,
            bookmaker: Some("betclic".to_string()),
            edge,
            classification: Classification::Value,
            confidence,
        }
    }

    fn sample() -> Vec<Candidate> {
        vec![
            candidate("1", 0.12, 2.80, 0.85),
            candidate("2", 0.08, 3.80, 0.75),
            candidate("3", 0.15, 2.50, 0.90),
            candidate("4", 0.03, 5.20, 0.60),
        ]
    }

    #[test]
    fn test_filters_by_min_edge() {
        let config = RecommendationFilterConfig {
            min_edge: 0.10,
            ..Default::default()
        };
        let (kept, counts) = filter_candidates(&sample(), &config);

        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].id, "1");
        assert_eq!(kept[1].id, "3");
        assert_eq!(counts.edge, 2);
        assert_eq!(counts.filtered(), 2);
    }

    #[test]
    fn test_filters_by_min_confidence() {
        let config = RecommendationFilterConfig {
            min_edge: 0.0,
            min_confidence: 0.80,
            ..Default::default()
        };
        let (kept, _) = filter_candidates(&sample(), &config);
        assert!(kept.iter().all(|c| c.confidence >= 0.80));
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_filters_by_odds_range() {
        let config = RecommendationFilterConfig {
            min_edge: 0.0,
            min_odds: 2.0,
            max_odds: 3.0,
            ..Default::default()
        };
        let (kept, counts) = filter_candidates(&sample(), &config);
        assert!(kept.iter().all(|c| (2.0..=3.0).contains(&c.market_odds)));
        assert_eq!(counts.odds, 2);
    }

    #[test]
    fn test_max_edge_sanity_bound() {
        let config = RecommendationFilterConfig {
            max_edge: 0.10,
            ..Default::default()
        };
        assert!(!config.accepts(&candidate("x", 0.5, 3.0, 0.9)));
        assert!(config.accepts(&candidate("y", 0.07, 3.0, 0.9)));
    }

    #[test]
    fn test_market_allow_set() {
        let config = RecommendationFilterConfig {
            markets: vec![Market::Assist],
            ..Default::default()
        };
        assert_eq!(
            config.check(&candidate("1", 0.12, 2.8, 0.85)),
            Some(Rejection::Market)
        );

        let open = RecommendationFilterConfig {
            markets: vec![],
            ..Default::default()
        };
        assert!(open.accepts(&candidate("1", 0.12, 2.8, 0.85)));
    }

    #[test]
    fn test_league_allow_set() {
        let mut c = candidate("1", 0.12, 2.8, 0.85);
        c.league = Some("serie_a".to_string());
        let config = RecommendationFilterConfig::default();
        assert_eq!(config.check(&c), Some(Rejection::League));

        c.league = None;
        assert!(config.accepts(&c));

        let open = RecommendationFilterConfig {
            leagues: vec![],
            ..Default::default()
        };
        c.league = Some("serie_a".to_string());
        assert!(open.accepts(&c));
    }

    #[test]
    fn test_zeroed_candidate_is_rejected() {
        let c: Candidate = serde_json::from_str(r#"{"id":"broken","edge":"n/a"}"#).unwrap();
        let config = RecommendationFilterConfig::default();
        assert_eq!(config.check(&c), Some(Rejection::Edge));
    }

    #[test]
    fn test_nan_never_passes() {
        let mut c = candidate("1", 0.12, 2.8, 0.85);
        c.edge = f64::NAN;
        assert_eq!(
            RecommendationFilterConfig::default().check(&c),
            Some(Rejection::Edge)
        );
    }

    #[test]
    fn test_empty_input() {
        let (kept, counts) =
            filter_candidates::<Candidate>(&[], &RecommendationFilterConfig::default());
        assert!(kept.is_empty());
        assert_eq!(counts, RejectionCounts::default());
    }
}
