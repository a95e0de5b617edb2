//! Health check endpoint.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use minilend_reader::{PositionSource, PriceSource};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Liveness plus whether each risk input has been published yet.
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "minilend-api",
        "version": env!("CARGO_PKG_VERSION"),
        "position_available": state.positions.read_position().is_some(),
        "price_available": state.prices.current_price().is_some(),
    }))
}
