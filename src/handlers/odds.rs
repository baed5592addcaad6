use actix_web::{web, HttpResponse};
use tracing::warn;

use propscore::core::odds::{overround, remove_margin as strip_margin, MarginMethod};
use propscore::error::{validate_odds, AppError};
use propscore::models::{RemoveMarginRequest, RemoveMarginResponse};
use propscore::pricing::poisson::round_to;

/// Convert a complete bookmaker odds set into fair odds
pub async fn remove_margin(req: web::Json<RemoveMarginRequest>) -> Result<HttpResponse, AppError> {
    let method = match req.method.as_deref() {
        Some(name) => name.parse::<MarginMethod>()?,
        None => MarginMethod::default(),
    };

    if req.odds.is_empty() {
        return Err(AppError::ValidationError("odds must not be empty".to_string()));
    }
    for &odds in &req.odds {
        validate_odds(odds).map_err(|e| {
            warn!("Rejected odds set: {}", e);
            e
        })?;
    }

    let total = overround(&req.odds)?;
    let fair_odds = strip_margin(&req.odds, method)?;

    Ok(HttpResponse::Ok().json(RemoveMarginResponse {
        method,
        overround: round_to(total, 4),
        fair_odds: fair_odds.into_iter().map(|o| round_to(o, 4)).collect(),
    }))
}
