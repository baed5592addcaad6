pub mod backtest;
pub mod health;
pub mod odds;
pub mod pricing;
pub mod selection;

use actix_web::web;

use propscore::error::json_error_handler;

/// Register every route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .route("/health", web::get().to(health::health_check))
        .route("/price/goalscorer", web::post().to(pricing::price_goalscorer))
        .route("/price/assist", web::post().to(pricing::price_assist))
        .route("/odds/remove-margin", web::post().to(odds::remove_margin))
        .route("/selection", web::post().to(selection::select))
        .route("/backtest", web::post().to(backtest::run_backtest))
        .route(
            "/backtest/walk-forward",
            web::post().to(backtest::run_walk_forward),
        );
}

#[cfg(test)]
pub(crate) fn test_state() -> web::Data<std::sync::Arc<crate::AppState>> {
    web::Data::new(std::sync::Arc::new(crate::AppState::default()))
}
