//! Stateless risk calculations for callers that already hold the inputs.

use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use minilend_common::error::AppError;
use minilend_common::types::{PositionSnapshot, PriceQuote, RiskMetrics, health_factor_serde};
use minilend_engine::classifier::{RiskClassifier, TierPresentation};
use minilend_engine::risk_calculator::RiskCalculator;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/risk/metrics", post(compute_metrics))
        .route("/api/risk/classify", post(classify))
}

#[derive(Debug, Deserialize)]
pub struct MetricsRequest {
    pub collateral_amount: f64,
    pub debt_amount: f64,
    pub liquidation_threshold_ratio: f64,
    pub asset: String,
    pub price: f64,
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub metrics: RiskMetrics,
    pub presentation: TierPresentation,
}

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    #[serde(with = "health_factor_serde")]
    pub health_factor: f64,
}

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub presentation: TierPresentation,
    pub gauge_percent: f64,
}

/// POST /api/risk/metrics: Compute metrics from explicit inputs.
async fn compute_metrics(
    Json(req): Json<MetricsRequest>,
) -> Result<Json<MetricsResponse>, AppError> {
    let snapshot = PositionSnapshot::new(
        req.collateral_amount,
        req.debt_amount,
        req.liquidation_threshold_ratio,
    )?;
    let price = PriceQuote::new(req.asset, req.price)?;

    let metrics = RiskCalculator::compute(&snapshot, &price)?;
    Ok(Json(MetricsResponse {
        presentation: RiskClassifier::present(metrics.health_factor),
        metrics,
    }))
}

/// POST /api/risk/classify: Tier, display hints and gauge fill for a health factor.
async fn classify(Json(req): Json<ClassifyRequest>) -> Json<ClassifyResponse> {
    Json(ClassifyResponse {
        presentation: RiskClassifier::present(req.health_factor),
        gauge_percent: RiskClassifier::gauge_percent(req.health_factor),
    })
}
