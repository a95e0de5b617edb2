use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Raw position figures as observed from the lending contract, already
/// converted from on-chain integer units.
///
/// Fields are private so every snapshot goes through [`PositionSnapshot::new`]
/// (or the equivalent `Deserialize` path) and is known to be finite and in range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PositionSnapshotFields")]
pub struct PositionSnapshot {
    collateral_amount: f64,
    debt_amount: f64,
    liquidation_threshold_ratio: f64,
}

#[derive(Deserialize)]
struct PositionSnapshotFields {
    collateral_amount: f64,
    debt_amount: f64,
    liquidation_threshold_ratio: f64,
}

impl TryFrom<PositionSnapshotFields> for PositionSnapshot {
    type Error = AppError;

    fn try_from(fields: PositionSnapshotFields) -> Result<Self, Self::Error> {
        Self::new(
            fields.collateral_amount,
            fields.debt_amount,
            fields.liquidation_threshold_ratio,
        )
    }
}

impl PositionSnapshot {
    /// Build a snapshot, rejecting NaN, infinite, negative or out-of-range figures.
    ///
    /// - `collateral_amount`: collateral in base asset units (e.g. ETH)
    /// - `debt_amount`: outstanding debt, already in value units
    /// - `liquidation_threshold_ratio`: fraction in `[0, 1]`
    pub fn new(
        collateral_amount: f64,
        debt_amount: f64,
        liquidation_threshold_ratio: f64,
    ) -> Result<Self, AppError> {
        ensure_non_negative("collateral_amount", collateral_amount)?;
        ensure_non_negative("debt_amount", debt_amount)?;
        if !(0.0..=1.0).contains(&liquidation_threshold_ratio) {
            return Err(AppError::Validation(format!(
                "liquidation_threshold_ratio must be within [0, 1], got {}",
                liquidation_threshold_ratio
            )));
        }

        Ok(Self {
            collateral_amount,
            debt_amount,
            liquidation_threshold_ratio,
        })
    }

    pub fn collateral_amount(&self) -> f64 {
        self.collateral_amount
    }

    pub fn debt_amount(&self) -> f64 {
        self.debt_amount
    }

    pub fn liquidation_threshold_ratio(&self) -> f64 {
        self.liquidation_threshold_ratio
    }
}

/// Current price of the collateral asset, in value units per base unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PriceQuoteFields")]
pub struct PriceQuote {
    asset: String,
    price: f64,
}

#[derive(Deserialize)]
struct PriceQuoteFields {
    asset: String,
    price: f64,
}

impl TryFrom<PriceQuoteFields> for PriceQuote {
    type Error = AppError;

    fn try_from(fields: PriceQuoteFields) -> Result<Self, Self::Error> {
        Self::new(fields.asset, fields.price)
    }
}

impl PriceQuote {
    /// Build a quote. The price must be finite and strictly positive.
    pub fn new(asset: impl Into<String>, price: f64) -> Result<Self, AppError> {
        if !price.is_finite() || price <= 0.0 {
            return Err(AppError::Validation(format!(
                "price must be a positive finite number, got {}",
                price
            )));
        }
        Ok(Self {
            asset: asset.into(),
            price,
        })
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn price(&self) -> f64 {
        self.price
    }
}

fn ensure_non_negative(field: &str, value: f64) -> Result<(), AppError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "{} must be a non-negative finite number, got {}",
            field, value
        )))
    }
}

/// Risk metrics derived from one snapshot and one price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// collateral_amount × price
    pub collateral_value: f64,
    /// Outstanding debt in value units
    pub debt_value: f64,
    /// Risk-weighted collateral over debt; `+inf` when there is no debt
    #[serde(with = "health_factor_serde")]
    pub health_factor: f64,
    /// Extra debt that can be taken on before breaching the threshold, never negative
    pub available_borrow_value: f64,
    /// Carried along so projections can recompute the health factor
    pub liquidation_threshold_ratio: f64,
}

/// Discrete risk classification of a health factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    LiquidationRisk,
    Caution,
    Safe,
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskTier::Safe => write!(f, "safe"),
            RiskTier::Caution => write!(f, "caution"),
            RiskTier::LiquidationRisk => write!(f, "liquidation_risk"),
        }
    }
}

/// State-changing actions a user can submit against their position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Stake,
    Borrow,
    Repay,
    Withdraw,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionKind::Stake => write!(f, "stake"),
            ActionKind::Borrow => write!(f, "borrow"),
            ActionKind::Repay => write!(f, "repay"),
            ActionKind::Withdraw => write!(f, "withdraw"),
        }
    }
}

/// Projected outcome of a proposed action. Transient, recomputed on every change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionProjection {
    pub action: ActionKind,
    /// Amount as requested by the caller, before clamping
    pub requested_amount: f64,
    /// Amount actually simulated after clamping to the allowed range
    pub proposed_amount: f64,
    /// Projected debt value (borrow/repay) or projected collateral value (withdraw/stake)
    pub resulting_value: f64,
    #[serde(with = "health_factor_serde")]
    pub projected_health_factor: f64,
    pub projected_tier: RiskTier,
    pub is_safe: bool,
}

/// A proposed action, as sent by the UI before submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: ActionKind,
    pub amount: f64,
}

/// Pre-submission verdict on a proposed action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDecision {
    pub action: ActionKind,
    pub requested_amount: f64,
    /// Clamped amount that should be submitted
    pub amount: f64,
    pub allowed: bool,
    pub projection: ActionProjection,
    /// Why the action is blocked, or an advisory warning when it is allowed
    pub reason: Option<String>,
}

/// A snapshot and a price read together at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub snapshot: PositionSnapshot,
    pub price: PriceQuote,
    pub observed_at: DateTime<Utc>,
}

/// Serde adapter for health factors.
///
/// JSON has no infinity literal and `null` already means "not available",
/// so `+inf` is written as the string `"Infinity"`.
pub mod health_factor_serde {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const INFINITY_LITERAL: &str = "Infinity";

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if *value == f64::INFINITY {
            serializer.serialize_str(INFINITY_LITERAL)
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(v),
            Repr::Text(s) if s == INFINITY_LITERAL || s == "inf" => Ok(f64::INFINITY),
            Repr::Text(other) => Err(D::Error::custom(format!(
                "invalid health factor: {}",
                other
            ))),
        }
    }
}
