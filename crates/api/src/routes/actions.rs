//! Action simulation and pre-submission gating against the current observation.

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use minilend_common::error::AppError;
use minilend_common::types::{ActionKind, ActionProjection, ActionRequest, GateDecision};
use minilend_engine::classifier::{RiskClassifier, TierPresentation};
use minilend_engine::gate::ActionGate;
use minilend_engine::risk_calculator::RiskCalculator;
use minilend_engine::simulator::ActionSimulator;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/simulate/{action}", post(simulate))
        .route("/api/actions/gate", post(gate))
}

#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    pub amount: f64,
    /// External withdraw limit; ignored for other actions
    pub withdraw_cap: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SimulateResponse {
    pub projection: Option<ActionProjection>,
    pub presentation: Option<TierPresentation>,
}

#[derive(Debug, Deserialize)]
pub struct GateRequest {
    pub action: ActionKind,
    pub amount: f64,
    pub withdraw_cap: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct GateResponse {
    pub decision: Option<GateDecision>,
}

/// POST /api/simulate/:action: Project an action; `null` when no observation exists.
async fn simulate(
    State(state): State<AppState>,
    Path(action): Path<ActionKind>,
    Json(req): Json<SimulateRequest>,
) -> Result<Json<SimulateResponse>, AppError> {
    let Some(observation) = state.reader.observe()? else {
        return Ok(Json(SimulateResponse {
            projection: None,
            presentation: None,
        }));
    };

    let metrics = RiskCalculator::compute(&observation.snapshot, &observation.price)?;
    let collateral_amount = observation.snapshot.collateral_amount();

    let projection = match action {
        ActionKind::Borrow => ActionSimulator::simulate_borrow(&metrics, req.amount),
        ActionKind::Repay => ActionSimulator::simulate_repay(&metrics, req.amount),
        ActionKind::Withdraw => ActionSimulator::simulate_withdraw(
            &metrics,
            collateral_amount,
            req.amount,
            &observation.price,
            req.withdraw_cap,
        ),
        ActionKind::Stake => ActionSimulator::simulate_stake(
            &metrics,
            collateral_amount,
            req.amount,
            &observation.price,
        ),
    };

    Ok(Json(SimulateResponse {
        presentation: Some(RiskClassifier::presentation(projection.projected_tier)),
        projection: Some(projection),
    }))
}

/// POST /api/actions/gate: Decide whether an action may be submitted.
async fn gate(
    State(state): State<AppState>,
    Json(req): Json<GateRequest>,
) -> Result<Json<GateResponse>, AppError> {
    let observation = state.reader.observe()?;
    let request = ActionRequest {
        action: req.action,
        amount: req.amount,
    };

    let decision =
        ActionGate::evaluate_observed(observation.as_ref(), &request, req.withdraw_cap)?;
    if let Some(decision) = &decision {
        tracing::info!(
            action = %decision.action,
            amount = decision.amount,
            allowed = decision.allowed,
            "Action gated"
        );
    }

    Ok(Json(GateResponse { decision }))
}
