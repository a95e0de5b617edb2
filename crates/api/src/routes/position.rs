//! Position and price publishing, plus metrics for the current observation.
//!
//! The wallet layer pushes what it read from chain; the UI polls metrics.

use std::str::FromStr;

use alloy::primitives::U256;
use axum::extract::State;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use minilend_common::error::AppError;
use minilend_common::types::{PositionSnapshot, PriceQuote, RiskMetrics};
use minilend_engine::classifier::{RiskClassifier, TierPresentation};
use minilend_engine::risk_calculator::RiskCalculator;
use minilend_engine::simulator::ActionSimulator;
use minilend_reader::decoder::RawPosition;
use minilend_reader::{PositionSource, PriceSource};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/position", put(publish_position).delete(clear_position))
        .route("/api/price", put(publish_price).delete(clear_price))
        .route("/api/position/metrics", get(position_metrics))
}

/// Raw contract values as decimal or `0x`-prefixed hex strings.
#[derive(Debug, Deserialize)]
pub struct PublishPositionRequest {
    pub collateral: String,
    pub debt: String,
    pub liquidation_threshold: String,
}

#[derive(Debug, Deserialize)]
pub struct PublishPriceRequest {
    pub price: f64,
    /// Defaults to the configured collateral asset
    pub asset: Option<String>,
}

/// Everything a dashboard needs to render the position, or nulls when no
/// observation is available yet.
#[derive(Debug, Serialize)]
pub struct PositionMetricsResponse {
    pub observed_at: Option<DateTime<Utc>>,
    pub snapshot: Option<PositionSnapshot>,
    pub price: Option<PriceQuote>,
    pub metrics: Option<RiskMetrics>,
    pub presentation: Option<TierPresentation>,
    pub gauge_percent: Option<f64>,
    pub max_safe_withdraw: Option<f64>,
}

/// PUT /api/position: Publish the latest raw position.
async fn publish_position(
    State(state): State<AppState>,
    Json(req): Json<PublishPositionRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let raw = RawPosition {
        collateral: parse_u256("collateral", &req.collateral)?,
        debt: parse_u256("debt", &req.debt)?,
        liquidation_threshold: parse_u256("liquidation_threshold", &req.liquidation_threshold)?,
    };

    // Reject positions that could never be decoded or valued before they reach the store
    let snapshot = state.decoder.decode(&raw)?;
    if let Some(price) = state.prices.current_price() {
        RiskCalculator::compute(&snapshot, &price)?;
    }

    state.positions.publish(raw);
    Ok(Json(json!({ "published": true })))
}

/// DELETE /api/position: Mark the position as not available.
async fn clear_position(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.positions.clear();
    Json(json!({ "cleared": true }))
}

/// PUT /api/price: Publish the latest collateral price.
async fn publish_price(
    State(state): State<AppState>,
    Json(req): Json<PublishPriceRequest>,
) -> Result<Json<PriceQuote>, AppError> {
    let asset = req
        .asset
        .unwrap_or_else(|| state.config.collateral_asset.clone());
    let quote = PriceQuote::new(asset, req.price)?;
    if let Some(raw) = state.positions.read_position() {
        let snapshot = state.decoder.decode(&raw)?;
        RiskCalculator::compute(&snapshot, &quote)?;
    }
    state.prices.publish(quote.clone());
    Ok(Json(quote))
}

/// DELETE /api/price: Mark the price as not available.
async fn clear_price(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.prices.clear();
    Json(json!({ "cleared": true }))
}

/// GET /api/position/metrics: Metrics, tier and withdraw cap for the current observation.
async fn position_metrics(
    State(state): State<AppState>,
) -> Result<Json<PositionMetricsResponse>, AppError> {
    let Some(observation) = state.reader.observe()? else {
        return Ok(Json(PositionMetricsResponse {
            observed_at: None,
            snapshot: None,
            price: None,
            metrics: None,
            presentation: None,
            gauge_percent: None,
            max_safe_withdraw: None,
        }));
    };

    let metrics = RiskCalculator::compute(&observation.snapshot, &observation.price)?;
    let max_safe_withdraw = ActionSimulator::max_safe_withdraw(
        &metrics,
        observation.snapshot.collateral_amount(),
        &observation.price,
    );

    Ok(Json(PositionMetricsResponse {
        observed_at: Some(observation.observed_at),
        snapshot: Some(observation.snapshot),
        price: Some(observation.price),
        presentation: Some(RiskClassifier::present(metrics.health_factor)),
        gauge_percent: Some(RiskClassifier::gauge_percent(metrics.health_factor)),
        max_safe_withdraw: Some(max_safe_withdraw),
        metrics: Some(metrics),
    }))
}

fn parse_u256(field: &str, value: &str) -> Result<U256, AppError> {
    U256::from_str(value.trim())
        .map_err(|e| AppError::Validation(format!("Invalid {} '{}': {}", field, value, e)))
}
