//! Risk tier classifier and the single tier → presentation lookup.
//!
//! Every renderer (stats card, health bar, borrow confirmation) goes through
//! [`RiskClassifier`] so the thresholds live in exactly one place.

use serde::Serialize;

use minilend_common::types::RiskTier;

/// Health factors strictly above this are `Safe`.
pub const SAFE_THRESHOLD: f64 = 1.5;

/// Health factors at or above this (and not `Safe`) are `Caution`.
pub const CAUTION_THRESHOLD: f64 = 1.2;

/// Health factor at which the gauge is drawn full.
const GAUGE_MAX: f64 = 2.0;

/// Display hints for a tier. Pure lookup, no logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierPresentation {
    pub tier: RiskTier,
    pub label: &'static str,
    pub color: &'static str,
    /// Shown under the health bar
    pub warning: Option<&'static str>,
    /// Shown when confirming a borrow that lands in this tier
    pub confirm_warning: Option<&'static str>,
}

pub struct RiskClassifier;

impl RiskClassifier {
    /// Classify a health factor.
    ///
    /// `1.5` is `Caution` and `1.2` is `Caution`. NaN is treated as `LiquidationRisk`.
    pub fn classify(health_factor: f64) -> RiskTier {
        if health_factor > SAFE_THRESHOLD {
            RiskTier::Safe
        } else if health_factor >= CAUTION_THRESHOLD {
            RiskTier::Caution
        } else {
            RiskTier::LiquidationRisk
        }
    }

    pub fn presentation(tier: RiskTier) -> TierPresentation {
        match tier {
            RiskTier::Safe => TierPresentation {
                tier,
                label: "Safe",
                color: "green",
                warning: None,
                confirm_warning: None,
            },
            RiskTier::Caution => TierPresentation {
                tier,
                label: "Caution",
                color: "yellow",
                warning: Some("Borrowing more will increase liquidation risk."),
                confirm_warning: Some("Borrowing more increases liquidation risk."),
            },
            RiskTier::LiquidationRisk => TierPresentation {
                tier,
                label: "Liquidation Risk",
                color: "red",
                warning: Some("High risk of liquidation. Borrowing is unsafe."),
                confirm_warning: Some("This position is close to liquidation."),
            },
        }
    }

    /// Classify and look up presentation in one step.
    pub fn present(health_factor: f64) -> TierPresentation {
        Self::presentation(Self::classify(health_factor))
    }

    /// Fill percentage of the health bar: HF clamped to `[0, 2]`, scaled to `[0, 100]`.
    pub fn gauge_percent(health_factor: f64) -> f64 {
        if health_factor.is_nan() {
            return 0.0;
        }
        health_factor.clamp(0.0, GAUGE_MAX) / GAUGE_MAX * 100.0
    }
}
