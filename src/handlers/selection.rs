use actix_web::{web, HttpResponse};
use std::sync::Arc;
use tracing::warn;

use crate::AppState;
use propscore::error::AppError;
use propscore::models::SelectionRequest;
use propscore::strategy::{select_bets, RankingMethod, SelectionParams};

fn validate_params(params: &SelectionParams) -> Result<(), AppError> {
    if !params.bankroll.is_finite() || params.bankroll <= 0.0 {
        return Err(AppError::ValidationError(format!(
            "bankroll must be positive, got {}",
            params.bankroll
        )));
    }
    if !(params.kelly_fraction > 0.0 && params.kelly_fraction <= 1.0) {
        return Err(AppError::ValidationError(format!(
            "kelly_fraction must be in (0, 1], got {}",
            params.kelly_fraction
        )));
    }
    Ok(())
}

/// Run the selection pipeline over a candidate batch
///
/// `filter` and `params` replace the server defaults when present; a
/// `ranking` name overrides the ranking of whichever params apply.
pub async fn select(
    state: web::Data<Arc<AppState>>,
    req: web::Json<SelectionRequest>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();

    let filter = req.filter.unwrap_or_else(|| state.strategy.filter.clone());
    let mut params = req
        .params
        .unwrap_or_else(|| state.strategy.selection.clone());
    if let Some(name) = req.ranking.as_deref() {
        params.ranking = RankingMethod::resolve(Some(name))?;
    }

    validate_params(&params).map_err(|e| {
        warn!("Rejected selection request: {}", e);
        e
    })?;

    let result = select_bets(&req.candidates, &filter, &params);

    Ok(HttpResponse::Ok().json(result))
}

#[cfg(test)]
mod tests {
    use super::super::{configure, test_state};
    use actix_web::{http::StatusCode, test, App};
    use propscore::strategy::SelectionResult;
    use serde_json::{json, Value};

    fn candidate(id: &str, player: &str, fixture: &str, edge: f64, confidence: f64) -> Value {
        json!({
            "id": id,
            "fixture_id": fixture,
            "player": player,
            "team": "PSG",
            "league": "ligue1",
            "market": "goalscorer",
            "fair_probability": 0.4,
            "fair_odds": 2.5,
            "market_odds": 2.5 * (1.0 + edge),
            "edge": edge,
            "classification": "VALUE",
            "confidence": confidence
        })
    }

    #[actix_web::test]
    async fn test_select_with_defaults() {
        let app = test::init_service(App::new().app_data(test_state()).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/selection")
            .set_json(json!({
                "candidates": [
                    candidate("a", "Dembele", "psg-om", 0.12, 0.82),
                    candidate("b", "Barcola", "psg-ol", 0.02, 0.52),
                    candidate("c", "Ramos", "psg-rcl", 0.20, 0.90)
                ]
            }))
            .to_request();
        let resp: SelectionResult = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp.selected.len(), 2);
        assert_eq!(resp.filtered_out, 1);
        assert_eq!(resp.rejections.edge, 1);
        // composite: 0.20 * 0.90 ranks ahead of 0.12 * 0.82
        assert_eq!(resp.selected[0].candidate.id, "c");
        assert!(resp.total_stake > 0.0);
    }

    #[actix_web::test]
    async fn test_select_unknown_ranking() {
        let app = test::init_service(App::new().app_data(test_state()).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/selection")
            .set_json(json!({"candidates": [], "ranking": "sharpe"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_select_rejects_bad_bankroll() {
        let app = test::init_service(App::new().app_data(test_state()).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/selection")
            .set_json(json!({"candidates": [], "params": {"bankroll": -10.0}}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
