use actix_web::{web, HttpResponse};
use tracing::warn;

use propscore::error::{validate_factor, validate_minutes, validate_rate, AppError};
use propscore::models::{AssistPriceRequest, GoalscorerPriceRequest, Market, PriceResponse};
use propscore::pricing::{
    calculate_assist_price, calculate_goalscorer_price, AssistInput, GoalscorerInput,
    PricingResult,
};

fn validate_goalscorer(req: &GoalscorerPriceRequest) -> Result<(), AppError> {
    validate_rate("xg_per_90", req.xg_per_90)?;
    validate_minutes(req.expected_minutes)?;
    validate_factor("conversion_rate", req.conversion_rate)?;
    validate_factor("opponent_xga_factor", req.opponent_xga_factor)?;
    validate_factor("form_factor", req.form_factor)
}

fn validate_assist(req: &AssistPriceRequest) -> Result<(), AppError> {
    validate_rate("xa_per_90", req.xa_per_90)?;
    validate_minutes(req.expected_minutes)?;
    validate_factor("creation_score", req.creation_score)?;
    validate_factor("teammate_finishing_factor", req.teammate_finishing_factor)?;
    validate_factor("opponent_defense_factor", req.opponent_defense_factor)?;
    validate_factor("form_factor", req.form_factor)
}

fn to_response(
    player_id: &str,
    fixture_id: &str,
    market: Market,
    result: PricingResult,
) -> PriceResponse {
    PriceResponse {
        player_id: player_id.to_string(),
        fixture_id: fixture_id.to_string(),
        market_type: market,
        lambda_intensity: result.lambda_intensity,
        probability: result.probability,
        fair_odds: result.fair_odds,
        explanation: result.explanation,
    }
}

/// Price the anytime goalscorer market
pub async fn price_goalscorer(
    req: web::Json<GoalscorerPriceRequest>,
) -> Result<HttpResponse, AppError> {
    validate_goalscorer(&req).map_err(|e| {
        warn!(player = %req.player_id, "Rejected goalscorer request: {}", e);
        e
    })?;

    let input = GoalscorerInput {
        xg_per_90: req.xg_per_90,
        expected_minutes: req.expected_minutes,
        conversion_rate: req.conversion_rate,
        opponent_xga_factor: req.opponent_xga_factor,
        form_factor: req.form_factor,
    };
    let result = calculate_goalscorer_price(&input);

    Ok(HttpResponse::Ok().json(to_response(
        &req.player_id,
        &req.fixture_id,
        Market::Goalscorer,
        result,
    )))
}

/// Price the anytime assist market
pub async fn price_assist(req: web::Json<AssistPriceRequest>) -> Result<HttpResponse, AppError> {
    validate_assist(&req).map_err(|e| {
        warn!(player = %req.player_id, "Rejected assist request: {}", e);
        e
    })?;

    let input = AssistInput {
        xa_per_90: req.xa_per_90,
        expected_minutes: req.expected_minutes,
        creation_score: req.creation_score,
        teammate_finishing_factor: req.teammate_finishing_factor,
        opponent_defense_factor: req.opponent_defense_factor,
        form_factor: req.form_factor,
    };
    let result = calculate_assist_price(&input);

    Ok(HttpResponse::Ok().json(to_response(
        &req.player_id,
        &req.fixture_id,
        Market::Assist,
        result,
    )))
}

#[cfg(test)]
mod tests {
    use super::super::{configure, test_state};
    use actix_web::{http::StatusCode, test, App};
    use propscore::models::{ErrorResponse, Market, PriceResponse};
    use serde_json::json;

    #[actix_web::test]
    async fn test_price_goalscorer_defaults() {
        let app = test::init_service(App::new().app_data(test_state()).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/price/goalscorer")
            .set_json(json!({"player_id": "mbappe", "fixture_id": "psg-om", "xg_per_90": 0.5}))
            .to_request();
        let resp: PriceResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp.market_type, Market::Goalscorer);
        assert_eq!(resp.lambda_intensity, 0.5);
        assert_eq!(resp.probability, 0.3935);
        assert_eq!(resp.fair_odds, 2.54);
        assert_eq!(resp.explanation.inputs["expected_minutes"], 90.0);
    }

    #[actix_web::test]
    async fn test_price_assist_clamps_intensity() {
        let app = test::init_service(App::new().app_data(test_state()).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/price/assist")
            .set_json(json!({
                "player_id": "dembele",
                "fixture_id": "psg-om",
                "xa_per_90": 1.5,
                "creation_score": 2.0
            }))
            .to_request();
        let resp: PriceResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp.market_type, Market::Assist);
        assert_eq!(resp.lambda_intensity, 2.0);
        assert!(resp.probability < 1.0);
    }

    #[actix_web::test]
    async fn test_price_rejects_invalid_minutes() {
        let app = test::init_service(App::new().app_data(test_state()).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/price/goalscorer")
            .set_json(json!({
                "player_id": "kane",
                "fixture_id": "bay-bvb",
                "xg_per_90": 0.7,
                "expected_minutes": 150.0
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "validation_error");
    }

    #[actix_web::test]
    async fn test_price_rejects_malformed_body() {
        let app = test::init_service(App::new().app_data(test_state()).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/price/goalscorer")
            .set_json(json!({"player_id": "kane"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "validation_error");
    }
}
