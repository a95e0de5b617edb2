//! Risk calculator: derives position metrics from a snapshot and a price.
//!
//! HF = collateral_value × liquidation_threshold_ratio / debt_value
//!
//! A position without debt has an infinite health factor: it cannot be
//! liquidated regardless of its collateral.

use minilend_common::error::AppError;
use minilend_common::types::{PositionSnapshot, PriceQuote, RiskMetrics};

/// Stateless calculator. Safe to call on every render without caching.
pub struct RiskCalculator;

impl RiskCalculator {
    /// Compute metrics for one snapshot at one price.
    ///
    /// Each input is finite on its own, but their product can still overflow;
    /// such a pair is rejected rather than reported as an infinite value.
    pub fn compute(
        snapshot: &PositionSnapshot,
        price: &PriceQuote,
    ) -> Result<RiskMetrics, AppError> {
        let ratio = snapshot.liquidation_threshold_ratio();
        let collateral_value = snapshot.collateral_amount() * price.price();
        if !collateral_value.is_finite() {
            return Err(AppError::Validation(format!(
                "collateral value overflows: {} {} at {}",
                snapshot.collateral_amount(),
                price.asset(),
                price.price()
            )));
        }
        let debt_value = snapshot.debt_amount();

        Ok(RiskMetrics {
            collateral_value,
            debt_value,
            health_factor: health_factor(collateral_value, ratio, debt_value),
            available_borrow_value: (collateral_value * ratio - debt_value).max(0.0),
            liquidation_threshold_ratio: ratio,
        })
    }

    /// Like [`RiskCalculator::compute`], but propagates a missing input as `None`.
    pub fn compute_optional(
        snapshot: Option<&PositionSnapshot>,
        price: Option<&PriceQuote>,
    ) -> Result<Option<RiskMetrics>, AppError> {
        match (snapshot, price) {
            (Some(snapshot), Some(price)) => Self::compute(snapshot, price).map(Some),
            _ => Ok(None),
        }
    }
}

/// Health factor for a collateral value against a debt value.
///
/// Returns `f64::INFINITY` when `debt_value` is zero.
pub fn health_factor(
    collateral_value: f64,
    liquidation_threshold_ratio: f64,
    debt_value: f64,
) -> f64 {
    if debt_value == 0.0 {
        f64::INFINITY
    } else {
        collateral_value * liquidation_threshold_ratio / debt_value
    }
}
