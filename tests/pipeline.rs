//! End-to-end flows: pricing to selection, and history to backtest report

use chrono::{DateTime, Duration, NaiveDate, Utc};

use propscore::backtesting::{generate_backtest_report, BacktestEngine};
use propscore::config::parse_strategy_config;
use propscore::models::{Candidate, Classification, HistoricalRecord, Market, MarketQuote};
use propscore::pricing::{
    calculate_assist_price, calculate_goalscorer_price, AssistInput, GoalscorerInput,
};
use propscore::strategy::{
    build_candidates, select_bets, CandidateContext, RecommendationFilterConfig, SelectionParams,
};

fn quote(player: &str, market: Market, bookmaker: &str, odds: f64) -> MarketQuote {
    let timestamp: DateTime<Utc> = "2024-03-02T18:00:00Z".parse().unwrap();
    MarketQuote {
        fixture_id: "psg-om".to_string(),
        player: player.to_string(),
        market,
        bookmaker: bookmaker.to_string(),
        odds,
        timestamp,
    }
}

fn context(player: &str) -> CandidateContext {
    CandidateContext {
        id: None,
        fixture_id: "psg-om".to_string(),
        player: player.to_string(),
        team: "PSG".to_string(),
        league: Some("ligue1".to_string()),
    }
}

#[test]
fn test_price_build_and_select() {
    let priced = vec![
        (
            context("Kylian Mbappe"),
            calculate_goalscorer_price(&GoalscorerInput::new(0.6)),
        ),
        (
            context("Ousmane Dembele"),
            calculate_assist_price(&AssistInput::new(0.3)),
        ),
        (
            context("Bradley Barcola"),
            calculate_goalscorer_price(&GoalscorerInput::new(0.3)),
        ),
    ];
    let quotes = vec![
        quote("Kylian Mbappe", Market::Goalscorer, "betclic", 2.5),
        quote("kylian mbappe", Market::Goalscorer, "winamax", 2.6),
        quote("Ousmane Dembele", Market::Assist, "unibet", 4.0),
    ];

    let (candidates, skipped) = build_candidates(&priced, &quotes);
    assert_eq!(skipped, 0);
    // Barcola has no quote
    assert_eq!(candidates.len(), 2);

    let mbappe = &candidates[0];
    assert_eq!(mbappe.fair_odds, 2.22);
    assert_eq!(mbappe.market_odds, 2.6);
    assert_eq!(mbappe.bookmaker.as_deref(), Some("winamax"));
    assert_eq!(mbappe.classification, Classification::Value);
    assert!(mbappe.id.starts_with("psg-om:"));

    let dembele = &candidates[1];
    assert_eq!(dembele.classification, Classification::NoValue);
    assert_eq!(dembele.confidence, 0.5);

    let result = select_bets(
        &candidates,
        &RecommendationFilterConfig::default(),
        &SelectionParams::default(),
    );

    assert_eq!(result.len(), 1);
    assert_eq!(result.filtered_out, 1);
    assert_eq!(result.rejections.edge, 1);
    let selected = &result.selected[0];
    assert_eq!(selected.candidate.player, "Kylian Mbappe");
    assert!((selected.stake - 26.75).abs() < 0.011);
    assert_eq!(result.total_stake, selected.stake);
}

fn candidate(id: &str, edge: f64) -> Candidate {
    Candidate {
        id: id.to_string(),
        fixture_id: format!("fx-{}", id),
        player: id.to_string(),
        team: format!("team-{}", id),
        league: Some("premier_league".to_string()),
        market: Market::Goalscorer,
        fair_probability: 0.4,
        fair_odds: 2.5,
        market_odds: 2.5 * (1.0 + edge),
        bookmaker: None,
        edge,
        classification: Classification::Value,
        confidence: 0.8,
    }
}

#[test]
fn test_configured_selection() {
    let config = parse_strategy_config(
        r#"
        [filter]
        min_edge = 0.10

        [selection]
        bankroll = 2000.0
        max_per_day = 60.0
        ranking = "edge"
        "#,
    )
    .unwrap();

    let candidates = vec![
        candidate("a", 0.12),
        candidate("b", 0.08),
        candidate("c", 0.15),
        candidate("d", 0.03),
    ];
    let result = select_bets(&candidates, &config.filter, &config.selection);

    assert_eq!(result.filtered_out, 2);
    let ids: Vec<&str> = result.selected.iter().map(|b| b.candidate.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "a"]);
    assert!(result.total_stake <= 60.0 + 1e-9);
}

fn history(days: i64) -> Vec<HistoricalRecord> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..days)
        .map(|i| HistoricalRecord {
            date: start + Duration::days(i),
            fixture_id: format!("fx-{}", i),
            player: if i % 3 == 0 { "Salah" } else { "Saka" }.to_string(),
            market: if i % 4 == 0 { Market::Assist } else { Market::Goalscorer },
            league: Some("premier_league".to_string()),
            fair_prob: 0.4,
            market_odds: 2.8,
            edge: 0.12,
            confidence: 0.9,
            outcome: i % 5 < 2,
        })
        .collect()
}

#[test]
fn test_backtest_roi_example() {
    let date = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
    let records: Vec<HistoricalRecord> = [(2.5, true), (2.0, true), (3.0, false), (2.5, false)]
        .iter()
        .enumerate()
        .map(|(i, &(odds, outcome))| HistoricalRecord {
            date,
            fixture_id: format!("fx-{}", i),
            player: "Saka".to_string(),
            market: Market::Goalscorer,
            league: None,
            fair_prob: 0.45,
            market_odds: odds,
            edge: 0.10,
            confidence: 1.0,
            outcome,
        })
        .collect();

    let result = BacktestEngine::default().run(&records);
    assert_eq!(result.total_bets, 4);
    assert_eq!(result.total_staked, 40.0);
    assert!((result.profit - 5.0).abs() < 1e-9);
    assert!((result.roi() - 0.125).abs() < 1e-9);

    let report = generate_backtest_report(&result);
    assert_eq!(report.summary.roi, "12.5%");
}

#[test]
fn test_walk_forward_report_per_window() {
    let records = history(200);
    let results = BacktestEngine::default().run_walk_forward(&records).unwrap();

    // 200 days with 90/30/30 windows
    assert_eq!(results.len(), 3);

    let mut previous_end = None;
    for result in &results {
        let window = result.test_window.unwrap();
        assert_eq!(result.total_bets, 30);
        assert!(result.bets.iter().all(|b| window.contains(b.date)));
        if let Some(end) = previous_end {
            assert!(window.start > end);
        }
        previous_end = Some(window.end);

        let report = generate_backtest_report(result);
        assert_eq!(report.bet_count_by_edge.edge_10_15, 30);
        assert!(report.by_market.iter().any(|m| m.key == "assist"));
    }
}
