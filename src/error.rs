use actix_web::{error::JsonPayloadError, http::StatusCode, HttpRequest, HttpResponse, ResponseError};
use std::fmt;

use crate::core::error::CoreError;
use crate::models::{ErrorResponse, HistoricalRecord};

/// Application error types
#[derive(Debug)]
pub enum AppError {
    /// Invalid request data
    ValidationError(String),
    /// Prices that cannot produce defined odds
    PricingError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::PricingError(msg) => write!(f, "Pricing error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DegenerateMarket(_) => AppError::PricingError(err.to_string()),
            CoreError::InvalidInput(_)
            | CoreError::UnknownStakeMethod(_)
            | CoreError::UnknownRankingMethod(_)
            | CoreError::UnknownMarginMethod(_) => AppError::ValidationError(err.to_string()),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn error_response(&self) -> HttpResponse {
        let (error_code, message) = match self {
            AppError::ValidationError(msg) => ("validation_error", msg.clone()),
            AppError::PricingError(msg) => ("pricing_error", msg.clone()),
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: error_code.to_string(),
            message,
        })
    }
}

/// Render malformed JSON bodies as a `validation_error` response
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::ValidationError(err.to_string()).into()
}

/// Validation functions
pub fn validate_minutes(minutes: f64) -> Result<(), AppError> {
    if !minutes.is_finite() || !(0.0..=120.0).contains(&minutes) {
        return Err(AppError::ValidationError(format!(
            "Expected minutes must be between 0 and 120, got {}",
            minutes
        )));
    }
    Ok(())
}

pub fn validate_rate(name: &str, rate: f64) -> Result<(), AppError> {
    if !rate.is_finite() || rate < 0.0 {
        return Err(AppError::ValidationError(format!(
            "{} must be a non-negative number, got {}",
            name, rate
        )));
    }
    Ok(())
}

pub fn validate_factor(name: &str, factor: f64) -> Result<(), AppError> {
    if !factor.is_finite() || factor < 0.0 {
        return Err(AppError::ValidationError(format!(
            "{} must be a non-negative multiplier, got {}",
            name, factor
        )));
    }
    Ok(())
}

pub fn validate_odds(odds: f64) -> Result<(), AppError> {
    if !odds.is_finite() || odds <= 1.0 {
        return Err(AppError::ValidationError(format!(
            "Odds must be greater than 1.0, got {}",
            odds
        )));
    }
    Ok(())
}

pub fn validate_records(records: &[HistoricalRecord]) -> Result<(), AppError> {
    for (i, record) in records.iter().enumerate() {
        record.validate().map_err(|e| {
            AppError::ValidationError(format!("record #{}: {}", i + 1, e))
        })?;
    }
    Ok(())
}
