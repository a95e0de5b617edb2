//! Pre-submission gate: decides whether a proposed action may be submitted.
//!
//! The gate never submits anything. It clamps the amount through the
//! simulator and reports whether the transaction layer should accept it:
//! 1. Zero (or invalid) amounts are never allowed
//! 2. Borrows up to the available capacity are allowed whatever the tier; a
//!    non-safe tier only adds a warning
//! 3. Withdrawals that would drop the HF below 1.2 are blocked

use minilend_common::error::AppError;
use minilend_common::types::{
    ActionKind, ActionProjection, ActionRequest, GateDecision, Observation, PositionSnapshot,
    PriceQuote, RiskTier,
};

use crate::classifier::RiskClassifier;
use crate::risk_calculator::RiskCalculator;
use crate::simulator::ActionSimulator;

pub struct ActionGate;

impl ActionGate {
    /// Evaluate a request against one snapshot and price.
    ///
    /// `withdraw_cap` is an optional external limit on withdrawals; it is
    /// ignored for other actions.
    pub fn evaluate(
        snapshot: &PositionSnapshot,
        price: &PriceQuote,
        request: &ActionRequest,
        withdraw_cap: Option<f64>,
    ) -> Result<GateDecision, AppError> {
        let metrics = RiskCalculator::compute(snapshot, price)?;
        let collateral_amount = snapshot.collateral_amount();

        let projection = match request.action {
            ActionKind::Stake => {
                ActionSimulator::simulate_stake(&metrics, collateral_amount, request.amount, price)
            }
            ActionKind::Borrow => ActionSimulator::simulate_borrow(&metrics, request.amount),
            ActionKind::Repay => ActionSimulator::simulate_repay(&metrics, request.amount),
            ActionKind::Withdraw => ActionSimulator::simulate_withdraw(
                &metrics,
                collateral_amount,
                request.amount,
                price,
                withdraw_cap,
            ),
        };

        let (allowed, reason) = Self::verdict(&projection, metrics.available_borrow_value);

        tracing::debug!(
            action = %request.action,
            requested = request.amount,
            amount = projection.proposed_amount,
            allowed,
            projected_tier = %projection.projected_tier,
            "Gate decision"
        );
        if request.action == ActionKind::Withdraw && !projection.is_safe {
            tracing::warn!(
                amount = projection.proposed_amount,
                projected_health_factor = projection.projected_health_factor,
                "Withdrawal blocked: projected health factor below threshold"
            );
        }

        Ok(GateDecision {
            action: request.action,
            requested_amount: request.amount,
            amount: projection.proposed_amount,
            allowed,
            projection,
            reason,
        })
    }

    /// Evaluate against an observation, or `None` when no observation exists yet.
    pub fn evaluate_observed(
        observation: Option<&Observation>,
        request: &ActionRequest,
        withdraw_cap: Option<f64>,
    ) -> Result<Option<GateDecision>, AppError> {
        observation
            .map(|o| Self::evaluate(&o.snapshot, &o.price, request, withdraw_cap))
            .transpose()
    }

    fn verdict(projection: &ActionProjection, available_borrow: f64) -> (bool, Option<String>) {
        if projection.proposed_amount == 0.0 {
            let reason = match projection.action {
                ActionKind::Borrow if available_borrow <= 0.0 => "No borrowing power available",
                ActionKind::Repay if projection.resulting_value == 0.0 => "No debt to repay",
                _ => "Amount must be greater than zero",
            };
            return (false, Some(reason.to_string()));
        }

        match projection.action {
            ActionKind::Withdraw if !projection.is_safe => (
                false,
                Some("Withdrawal would put position at liquidation risk".to_string()),
            ),
            ActionKind::Borrow if projection.projected_tier != RiskTier::Safe => {
                let presentation = RiskClassifier::presentation(projection.projected_tier);
                (true, presentation.confirm_warning.map(str::to_string))
            }
            _ => (true, None),
        }
    }
}
