//! Propscore CLI - Command-line interface for player-prop pricing and backtests

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use propscore::backtesting::{
    generate_backtest_report, BacktestEngine, BacktestReport, BacktestResult, StakeMethod,
};
use propscore::config::{load_strategy_config, StrategyConfig};
use propscore::core::edge::assess;
use propscore::core::kelly::KellyCalculator;
use propscore::core::odds::{overround, remove_margin, MarginMethod};
use propscore::data::{load_candidates, load_historical_records, load_quotes};
use propscore::models::Classification;
use propscore::pricing::{
    calculate_assist_price, calculate_creation_score, calculate_form_factor,
    calculate_goalscorer_price, AssistInput, CreationMetrics, GoalscorerInput, PricingResult,
};
use propscore::strategy::{
    build_candidates, select_bets, CandidateContext, RankingMethod, SelectionResult,
};

#[derive(Parser)]
#[command(name = "propscore")]
#[command(author, version, about = "Player-prop pricing and betting strategy CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Strategy TOML (filter, selection, backtest and pricing sections)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Price an anytime goalscorer or assist market
    Price {
        #[command(subcommand)]
        market: PriceMarket,
    },

    /// Remove the bookmaker margin from a complete odds set
    Devig {
        /// Decimal odds, comma separated (e.g. 1.9,1.9)
        #[arg(long, value_delimiter = ',', required = true)]
        odds: Vec<f64>,

        /// Margin method: proportional or equal
        #[arg(long)]
        method: Option<String>,
    },

    /// Price players and join them with bookmaker quotes into candidates (JSON on stdout)
    Candidates {
        /// Player entries (.json): fixture_id, player, team, league, xg_per_90, xa_per_90
        #[arg(short, long)]
        players: PathBuf,

        /// Bookmaker quotes (.json or .csv)
        #[arg(short, long)]
        quotes: PathBuf,
    },

    /// Select and size bets from a candidate file
    Select {
        /// Candidates (.json or .csv)
        #[arg(short, long)]
        input: PathBuf,

        /// Ranking method: edge, ev or composite
        #[arg(long)]
        ranking: Option<String>,

        /// Override the configured bankroll
        #[arg(long)]
        bankroll: Option<f64>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a backtest over historical records
    Backtest {
        /// Historical records (.json or .csv)
        #[arg(short, long)]
        input: PathBuf,

        /// Evaluate each walk-forward test window separately
        #[arg(long)]
        walk_forward: bool,

        /// Stake method: flat or kelly
        #[arg(long)]
        stake_method: Option<String>,

        /// Print the result and report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PriceMarket {
    /// Anytime goalscorer
    Goalscorer {
        /// Expected goals per 90 minutes
        #[arg(long)]
        xg: f64,

        #[arg(long, default_value = "90")]
        minutes: f64,

        /// Goals / npxG over recent matches
        #[arg(long, default_value = "1.0")]
        conversion: f64,

        /// Opponent xGA relative to league average
        #[arg(long, default_value = "1.0")]
        opponent: f64,

        #[arg(long, default_value = "1.0")]
        form: f64,

        /// Recent per-match xG, most recent first; replaces --form
        #[arg(long, value_delimiter = ',')]
        recent: Vec<f64>,

        /// Bookmaker odds to compare against
        #[arg(long)]
        odds: Option<f64>,
    },

    /// Anytime assist
    Assist {
        /// Expected assists per 90 minutes
        #[arg(long)]
        xa: f64,

        #[arg(long, default_value = "90")]
        minutes: f64,

        /// Composite creation score (1.0 = league average)
        #[arg(long, default_value = "1.0")]
        creation: f64,

        /// Per-90 key passes, SCA, crosses, passes into box and progressive
        /// passes; derives the creation score from the configured league averages
        #[arg(long, value_delimiter = ',', conflicts_with = "creation")]
        creation_metrics: Option<Vec<f64>>,

        /// Team finishing quality (goals / xG)
        #[arg(long, default_value = "1.0")]
        teammates: f64,

        /// Opponent defensive weakness
        #[arg(long, default_value = "1.0")]
        opponent: f64,

        #[arg(long, default_value = "1.0")]
        form: f64,

        /// Recent per-match xA, most recent first; replaces --form
        #[arg(long, value_delimiter = ',')]
        recent: Vec<f64>,

        /// Bookmaker odds to compare against
        #[arg(long)]
        odds: Option<f64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for reports and JSON
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .compact()
        .init();

    let strategy = match &cli.config {
        Some(path) => load_strategy_config(path)?,
        None => StrategyConfig::default(),
    };

    match cli.command {
        Commands::Price { market } => run_price(market, &strategy),
        Commands::Devig { odds, method } => run_devig(&odds, method.as_deref()),
        Commands::Candidates { players, quotes } => run_candidates(&players, &quotes),
        Commands::Select {
            input,
            ranking,
            bankroll,
            json,
        } => run_select(&input, ranking.as_deref(), bankroll, json, &strategy),
        Commands::Backtest {
            input,
            walk_forward,
            stake_method,
            json,
        } => run_backtest(&input, walk_forward, stake_method.as_deref(), json, &strategy),
    }
}

fn run_price(market: PriceMarket, strategy: &StrategyConfig) -> Result<()> {
    let (result, odds) = match market {
        PriceMarket::Goalscorer {
            xg,
            minutes,
            conversion,
            opponent,
            form,
            recent,
            odds,
        } => {
            let form_factor = if recent.is_empty() {
                form
            } else {
                calculate_form_factor(&recent, strategy.pricing.goalscorer_decay, None)
            };
            let input = GoalscorerInput {
                xg_per_90: xg,
                expected_minutes: minutes,
                conversion_rate: conversion,
                opponent_xga_factor: opponent,
                form_factor,
            };
            (calculate_goalscorer_price(&input), odds)
        }
        PriceMarket::Assist {
            xa,
            minutes,
            creation,
            creation_metrics,
            teammates,
            opponent,
            form,
            recent,
            odds,
        } => {
            let creation_score = match creation_metrics.as_deref() {
                Some(&[key_passes, sca, crosses, passes_into_box, progressive_passes]) => {
                    let metrics = CreationMetrics {
                        xa,
                        key_passes,
                        sca,
                        crosses,
                        passes_into_box,
                        progressive_passes,
                    };
                    calculate_creation_score(&metrics, &strategy.pricing.league_averages).score
                }
                Some(values) => anyhow::bail!(
                    "--creation-metrics expects 5 values, got {}",
                    values.len()
                ),
                None => creation,
            };
            let form_factor = if recent.is_empty() {
                form
            } else {
                calculate_form_factor(&recent, strategy.pricing.assist_decay, None)
            };
            let input = AssistInput {
                xa_per_90: xa,
                expected_minutes: minutes,
                creation_score,
                teammate_finishing_factor: teammates,
                opponent_defense_factor: opponent,
                form_factor,
            };
            (calculate_assist_price(&input), odds)
        }
    };

    print_pricing(&result);

    if let Some(market_odds) = odds {
        let assessment = assess(result.fair_odds, market_odds)
            .with_context(|| format!("Cannot compare against odds {}", market_odds))?;
        let label = match assessment.classification {
            Classification::Value => assessment.classification.to_string().green().bold(),
            Classification::NoValue => assessment.classification.to_string().yellow(),
            Classification::Avoid => assessment.classification.to_string().red(),
        };
        println!("{}", "-".repeat(60));
        println!("Market odds: {:.2}", market_odds);
        println!("Edge: {:+.1}%", assessment.edge * 100.0);
        println!("Classification: {} (confidence {:.2})", label, assessment.confidence);

        let selection = &strategy.selection;
        let calc = KellyCalculator::new(
            selection.bankroll,
            selection.kelly_fraction,
            selection.max_stake,
        );
        let sizing = calc.calculate_single(1.0 / result.fair_odds, market_odds);
        println!(
            "Kelly stake: {:.2} of {:.2} ({:.2}% of bankroll)",
            sizing.stake,
            selection.bankroll,
            sizing.recommended_fraction * 100.0
        );
    }
    println!("{}", "=".repeat(60));

    Ok(())
}

fn print_pricing(result: &PricingResult) {
    let explanation = &result.explanation;
    println!("\n{}", "=".repeat(60));
    println!("{} PRICE", explanation.market.as_str().to_uppercase().cyan().bold());
    println!("{}", "=".repeat(60));
    for (name, value) in &explanation.inputs {
        println!("{:<28} {:>10.3}", name, value);
    }
    println!("{}", "-".repeat(60));
    println!("Base λ: {:.4}", explanation.calculation.base_lambda);
    println!("Adjusted λ: {:.4}", explanation.calculation.adjusted_lambda);
    println!("Intensity used: {:.4}", result.lambda_intensity);
    println!("{}", explanation.calculation.formula.dimmed());
    println!("{}", "-".repeat(60));
    println!("Probability: {:.2}%", result.probability * 100.0);
    println!("Fair odds: {}", format!("{:.2}", result.fair_odds).green().bold());
    println!("Tier: {:?} - {}", explanation.tier, explanation.interpretation);
}

fn run_devig(odds: &[f64], method: Option<&str>) -> Result<()> {
    let method = match method {
        Some(name) => name.parse::<MarginMethod>()?,
        None => MarginMethod::default(),
    };
    let total = overround(odds).context("Invalid odds set")?;
    let fair = remove_margin(odds, method).context("Margin removal failed")?;

    println!("\n{}", "=".repeat(60));
    println!("MARGIN REMOVAL ({})", method);
    println!("{}", "=".repeat(60));
    println!("Overround: {:.4} (margin {:.2}%)", total, (total - 1.0) * 100.0);
    println!("{}", "-".repeat(60));
    println!("{:>10} {:>12} {:>10} {:>12}", "Odds", "Implied", "Fair", "Fair prob");
    for (raw, fair) in odds.iter().zip(&fair) {
        println!(
            "{:>10.2} {:>11.2}% {:>10.3} {:>11.2}%",
            raw,
            100.0 / raw,
            fair,
            100.0 / fair
        );
    }
    println!("{}", "=".repeat(60));

    Ok(())
}

fn ninety() -> f64 {
    90.0
}

/// One player to price for a fixture
#[derive(Debug, Deserialize)]
struct PlayerEntry {
    #[serde(flatten)]
    context: CandidateContext,
    #[serde(default)]
    xg_per_90: Option<f64>,
    #[serde(default)]
    xa_per_90: Option<f64>,
    #[serde(default = "ninety")]
    expected_minutes: f64,
}

fn run_candidates(players: &Path, quotes: &Path) -> Result<()> {
    let file = File::open(players)
        .with_context(|| format!("Failed to open {}", players.display()))?;
    let entries: Vec<PlayerEntry> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", players.display()))?;
    let quotes = load_quotes(quotes)?;

    let mut priced = Vec::new();
    for entry in entries {
        if let Some(xg) = entry.xg_per_90 {
            let input = GoalscorerInput {
                expected_minutes: entry.expected_minutes,
                ..GoalscorerInput::new(xg)
            };
            priced.push((entry.context.clone(), calculate_goalscorer_price(&input)));
        }
        if let Some(xa) = entry.xa_per_90 {
            let input = AssistInput {
                expected_minutes: entry.expected_minutes,
                ..AssistInput::new(xa)
            };
            priced.push((entry.context.clone(), calculate_assist_price(&input)));
        }
    }

    let (candidates, skipped) = build_candidates(&priced, &quotes);
    eprintln!(
        "{} {} candidates from {} priced selections ({} skipped)",
        "Built".green(),
        candidates.len(),
        priced.len(),
        skipped
    );
    println!("{}", serde_json::to_string_pretty(&candidates)?);

    Ok(())
}

fn run_select(
    input: &Path,
    ranking: Option<&str>,
    bankroll: Option<f64>,
    json: bool,
    strategy: &StrategyConfig,
) -> Result<()> {
    let candidates = load_candidates(input)?;

    let mut params = strategy.selection.clone();
    if ranking.is_some() {
        params.ranking = RankingMethod::resolve(ranking)?;
    }
    if let Some(bankroll) = bankroll {
        anyhow::ensure!(bankroll > 0.0, "--bankroll must be positive, got {}", bankroll);
        params.bankroll = bankroll;
    }

    let result = select_bets(&candidates, &strategy.filter, &params);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_selection(&result, candidates.len(), params.bankroll);
    }

    Ok(())
}

fn print_selection(result: &SelectionResult, total: usize, bankroll: f64) {
    println!("\n{}", "=".repeat(60));
    println!("SELECTION");
    println!("{}", "=".repeat(60));
    println!("Candidates: {}", total);
    println!("Bankroll: {:.2}", bankroll);
    println!("Filtered out: {}", result.filtered_out);

    let r = &result.rejections;
    println!(
        "  edge {} / confidence {} / odds {} / market {} / league {}",
        r.edge, r.confidence, r.odds, r.market, r.league
    );
    println!(
        "Dropped after sizing: zero stake {} / exposure {} / correlation {}",
        r.zero_stake, r.exposure, r.correlation
    );
    println!("{}", "-".repeat(60));

    if result.is_empty() {
        println!("{}", "No bets selected.".red());
    } else {
        println!(
            "{:<22} {:>10} {:>7} {:>7} {:>9} {:>9}",
            "Player", "Market", "Odds", "Edge", "Kelly", "Stake"
        );
        for bet in &result.selected {
            let c = &bet.candidate;
            println!(
                "{:<22} {:>10} {:>7.2} {:>6.1}% {:>9.2} {:>9}",
                truncate_name(&c.player, 22),
                c.market.as_str(),
                c.market_odds,
                c.edge * 100.0,
                bet.kelly_stake,
                format!("{:.2}", bet.stake).green()
            );
        }
    }

    println!("{}", "-".repeat(60));
    println!("Total stake: {:.2}", result.total_stake);
    println!("{}", "=".repeat(60));
}

fn run_backtest(
    input: &Path,
    walk_forward: bool,
    stake_method: Option<&str>,
    json: bool,
    strategy: &StrategyConfig,
) -> Result<()> {
    let records = load_historical_records(input)?;

    let mut config = strategy.backtest.clone();
    if let Some(name) = stake_method {
        config.stake_method = name.parse::<StakeMethod>()?;
    }
    let engine = BacktestEngine::new(config);

    let results = if walk_forward {
        engine
            .run_walk_forward(&records)
            .context("Walk-forward backtest failed")?
    } else {
        vec![engine.run(&records)]
    };

    if json {
        let output: Vec<serde_json::Value> = results
            .iter()
            .map(|result| {
                serde_json::json!({
                    "result": result,
                    "report": generate_backtest_report(result),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if results.is_empty() {
        println!(
            "{}",
            "No walk-forward window fits the data range.".red()
        );
        return Ok(());
    }

    for result in &results {
        print_backtest(result, &generate_backtest_report(result), &engine);
    }

    Ok(())
}

fn print_backtest(result: &BacktestResult, report: &BacktestReport, engine: &BacktestEngine) {
    let config = &engine.config;
    println!("\n{}", "=".repeat(60));
    match &result.test_window {
        Some(window) => println!("BACKTEST RESULTS ({} to {})", window.start, window.end),
        None => println!("BACKTEST RESULTS"),
    }
    println!("{}", "=".repeat(60));
    println!("Stake method: {}", config.stake_method);
    println!("Min edge: {:.1}%", config.min_edge * 100.0);
    println!("{}", "-".repeat(60));

    let summary = &report.summary;
    println!("Total bets: {}", summary.total_bets);
    println!("Wins / losses: {} / {}", summary.wins, summary.losses);
    println!("Win rate: {}", summary.win_rate);
    println!("{}", "-".repeat(60));
    println!("Total staked: {:.2}", result.total_staked);
    println!("Total returns: {:.2}", result.total_returns);
    let profit = if result.profit >= 0.0 {
        summary.profit.green()
    } else {
        summary.profit.red()
    };
    println!("Profit: {}", profit);
    println!("ROI: {}", summary.roi);

    let metrics = &report.metrics;
    println!("{}", "-".repeat(60));
    println!("Brier score: {}", metrics.brier_score);
    println!("Average odds: {}", metrics.avg_odds);
    println!("Average edge: {}", metrics.avg_edge);
    println!("Profit factor: {}", metrics.profit_factor);
    println!("Max drawdown: {}", metrics.max_drawdown);

    let edges = &report.bet_count_by_edge;
    println!("{}", "-".repeat(60));
    println!(
        "Bets by edge: 5-10% {} | 10-15% {} | 15-20% {} | 20%+ {}",
        edges.edge_5_10, edges.edge_10_15, edges.edge_15_20, edges.edge_20_plus
    );

    if !result.bets.is_empty() {
        println!("\n{}", "Calibration:".yellow().bold());
        println!(
            "{:>14} {:>10} {:>10} {:>8}",
            "Range", "Predicted", "Actual", "Bets"
        );
        for bucket in report.calibration.iter().filter(|b| b.count > 0) {
            println!(
                "{:>6.2}-{:<7.2} {:>9.1}% {:>9.1}% {:>8}",
                bucket.range.0,
                bucket.range.1,
                bucket.predicted_mean * 100.0,
                bucket.actual_rate * 100.0,
                bucket.count
            );
        }

        for (title, rows) in [
            ("Analysis by Market:", &report.by_market),
            ("Analysis by Odds Range:", &report.by_odds_range),
        ] {
            println!("\n{}", title.yellow().bold());
            println!(
                "{:>12} {:>8} {:>8} {:>10} {:>12} {:>10}",
                "Key", "Bets", "Wins", "Hit Rate", "Profit", "ROI"
            );
            println!("{}", "-".repeat(65));
            for a in rows.iter() {
                println!(
                    "{:>12} {:>8} {:>8} {:>9.1}% {:>12.2} {:>9.1}%",
                    a.key,
                    a.bets,
                    a.wins,
                    a.hit_rate * 100.0,
                    a.profit,
                    a.roi * 100.0
                );
            }
        }
    }

    println!("{}", "=".repeat(60));
}

fn truncate_name(name: &str, max_len: usize) -> String {
    if name.chars().count() <= max_len {
        name.to_string()
    } else {
        let truncated: String = name.chars().take(max_len - 1).collect();
        format!("{}…", truncated)
    }
}
