use actix_web::{web, HttpResponse};
use std::sync::Arc;
use tracing::{info, warn};

use crate::AppState;
use propscore::backtesting::{generate_backtest_report, BacktestEngine, BacktestResult};
use propscore::error::{validate_records, AppError};
use propscore::models::{BacktestRequest, BacktestResponse};

fn engine_for(state: &AppState, req: &BacktestRequest) -> Result<BacktestEngine, AppError> {
    validate_records(&req.records).map_err(|e| {
        warn!(records = req.records.len(), "Rejected backtest request: {}", e);
        e
    })?;

    let config = req
        .config
        .clone()
        .unwrap_or_else(|| state.strategy.backtest.clone());
    Ok(BacktestEngine::new(config))
}

fn respond(result: BacktestResult) -> BacktestResponse {
    let report = generate_backtest_report(&result);
    BacktestResponse { result, report }
}

/// Backtest over every record at once
pub async fn run_backtest(
    state: web::Data<Arc<AppState>>,
    req: web::Json<BacktestRequest>,
) -> Result<HttpResponse, AppError> {
    let engine = engine_for(&state, &req)?;
    let result = engine.run(&req.records);

    info!(
        records = req.records.len(),
        bets = result.total_bets,
        profit = result.profit,
        "Backtest complete"
    );

    Ok(HttpResponse::Ok().json(respond(result)))
}

/// Backtest each walk-forward test window separately
pub async fn run_walk_forward(
    state: web::Data<Arc<AppState>>,
    req: web::Json<BacktestRequest>,
) -> Result<HttpResponse, AppError> {
    let engine = engine_for(&state, &req)?;
    let windows: Vec<BacktestResponse> = engine
        .run_walk_forward(&req.records)?
        .into_iter()
        .map(respond)
        .collect();

    info!(
        records = req.records.len(),
        windows = windows.len(),
        "Walk-forward backtest complete"
    );

    Ok(HttpResponse::Ok().json(windows))
}
