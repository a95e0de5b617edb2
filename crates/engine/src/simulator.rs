//! Action simulator: projects the health factor after a proposed action.
//!
//! Requested amounts are clamped into the allowed range *before* simulating, so
//! a projection never describes an action the UI could not submit.
//!
//! Gating differs by direction:
//! - borrow, repay, stake: `is_safe` is advisory (tier is not `LiquidationRisk`)
//! - withdraw: `is_safe` is a hard gate (projected HF >= 1.2)

use minilend_common::types::{ActionKind, ActionProjection, PriceQuote, RiskMetrics, RiskTier};

use crate::classifier::{CAUTION_THRESHOLD, RiskClassifier};
use crate::risk_calculator::health_factor;

/// Upper bound on the ulp steps taken to pull the max safe withdraw under the gate.
const MAX_WITHDRAW_STEPS: usize = 64;

pub struct ActionSimulator;

impl ActionSimulator {
    /// Project borrowing `requested` more value units.
    ///
    /// The amount is clamped to `[0, available_borrow_value]`.
    pub fn simulate_borrow(metrics: &RiskMetrics, requested: f64) -> ActionProjection {
        let proposed = clamp_amount(requested, metrics.available_borrow_value);
        log_clamp(ActionKind::Borrow, requested, proposed);

        let projected_debt = metrics.debt_value + proposed;
        let projected_hf = health_factor(
            metrics.collateral_value,
            metrics.liquidation_threshold_ratio,
            projected_debt,
        );

        advisory(ActionKind::Borrow, requested, proposed, projected_debt, projected_hf)
    }

    /// Project withdrawing `requested` collateral units.
    ///
    /// The amount is clamped to `[0, collateral_amount]` and to `cap` when given
    /// (e.g. an available-to-withdraw limit reported by the contract).
    pub fn simulate_withdraw(
        metrics: &RiskMetrics,
        collateral_amount: f64,
        requested: f64,
        price: &PriceQuote,
        cap: Option<f64>,
    ) -> ActionProjection {
        let mut upper = collateral_amount.max(0.0);
        if let Some(cap) = cap {
            upper = upper.min(cap.max(0.0));
        }
        let proposed = clamp_amount(requested, upper);
        log_clamp(ActionKind::Withdraw, requested, proposed);

        let (projected_collateral_value, projected_hf) =
            withdraw_projection(metrics, collateral_amount, proposed, price);

        ActionProjection {
            action: ActionKind::Withdraw,
            requested_amount: requested,
            proposed_amount: proposed,
            resulting_value: projected_collateral_value,
            projected_health_factor: projected_hf,
            projected_tier: RiskClassifier::classify(projected_hf),
            is_safe: projected_hf >= CAUTION_THRESHOLD,
        }
    }

    /// Project repaying `requested` value units, clamped to `[0, debt_value]`.
    pub fn simulate_repay(metrics: &RiskMetrics, requested: f64) -> ActionProjection {
        let proposed = clamp_amount(requested, metrics.debt_value);
        log_clamp(ActionKind::Repay, requested, proposed);

        let projected_debt = (metrics.debt_value - proposed).max(0.0);
        let projected_hf = health_factor(
            metrics.collateral_value,
            metrics.liquidation_threshold_ratio,
            projected_debt,
        );

        advisory(ActionKind::Repay, requested, proposed, projected_debt, projected_hf)
    }

    /// Project staking `requested` more collateral units.
    ///
    /// Unbounded requests become 0; finite ones are capped so the projected
    /// collateral value cannot overflow.
    pub fn simulate_stake(
        metrics: &RiskMetrics,
        collateral_amount: f64,
        requested: f64,
        price: &PriceQuote,
    ) -> ActionProjection {
        // Half the representable range keeps the projected value finite after rounding
        let headroom = (f64::MAX / price.price() / 2.0 - collateral_amount).max(0.0);
        let proposed = clamp_amount(requested, f64::INFINITY).min(headroom);
        log_clamp(ActionKind::Stake, requested, proposed);

        let projected_collateral_value = (collateral_amount + proposed) * price.price();
        let projected_hf = health_factor(
            projected_collateral_value,
            metrics.liquidation_threshold_ratio,
            metrics.debt_value,
        );

        advisory(
            ActionKind::Stake,
            requested,
            proposed,
            projected_collateral_value,
            projected_hf,
        )
    }

    /// Largest withdraw amount that keeps the projected HF at or above 1.2.
    ///
    /// Without debt the whole collateral can be withdrawn. The closed-form
    /// bound is stepped down until [`ActionSimulator::simulate_withdraw`]
    /// reports it safe, so the result always passes the withdraw gate.
    pub fn max_safe_withdraw(
        metrics: &RiskMetrics,
        collateral_amount: f64,
        price: &PriceQuote,
    ) -> f64 {
        let collateral_amount = collateral_amount.max(0.0);
        if metrics.debt_value == 0.0 {
            return collateral_amount;
        }
        if metrics.liquidation_threshold_ratio == 0.0 {
            return 0.0;
        }

        let min_collateral_value =
            CAUTION_THRESHOLD * metrics.debt_value / metrics.liquidation_threshold_ratio;
        let min_collateral_amount = min_collateral_value / price.price();
        let mut amount = (collateral_amount - min_collateral_amount).clamp(0.0, collateral_amount);

        // One ulp of the collateral moves the remaining amount by at least one ulp
        let step = collateral_amount * f64::EPSILON;
        for _ in 0..MAX_WITHDRAW_STEPS {
            if amount <= 0.0 {
                return 0.0;
            }
            let (_, projected_hf) = withdraw_projection(metrics, collateral_amount, amount, price);
            if projected_hf >= CAUTION_THRESHOLD {
                return amount;
            }
            amount = (amount - step).max(0.0);
        }

        tracing::debug!(
            collateral_amount,
            debt_value = metrics.debt_value,
            "Max safe withdraw did not converge"
        );
        0.0
    }
}

/// Projected collateral value and HF after withdrawing `amount`.
fn withdraw_projection(
    metrics: &RiskMetrics,
    collateral_amount: f64,
    amount: f64,
    price: &PriceQuote,
) -> (f64, f64) {
    let projected_collateral_value = (collateral_amount - amount) * price.price();
    let projected_hf = health_factor(
        projected_collateral_value,
        metrics.liquidation_threshold_ratio,
        metrics.debt_value,
    );
    (projected_collateral_value, projected_hf)
}

/// Clamp a requested amount into `[0, upper]`. NaN, negative and unbounded requests become 0.
fn clamp_amount(requested: f64, upper: f64) -> f64 {
    if requested.is_nan() || requested <= 0.0 {
        return 0.0;
    }
    let bounded = requested.min(upper.max(0.0));
    if bounded.is_finite() { bounded } else { 0.0 }
}

fn log_clamp(action: ActionKind, requested: f64, proposed: f64) {
    if requested != proposed {
        tracing::debug!(%action, requested, proposed, "Proposed amount clamped");
    }
}

fn advisory(
    action: ActionKind,
    requested: f64,
    proposed: f64,
    resulting_value: f64,
    projected_hf: f64,
) -> ActionProjection {
    let projected_tier = RiskClassifier::classify(projected_hf);
    ActionProjection {
        action,
        requested_amount: requested,
        proposed_amount: proposed,
        resulting_value,
        projected_health_factor: projected_hf,
        projected_tier,
        is_safe: projected_tier != RiskTier::LiquidationRisk,
    }
}

#[cfg(test)]
mod tests {
    use minilend_common::types::PositionSnapshot;

    use super::*;
    use crate::risk_calculator::RiskCalculator;

    fn price() -> PriceQuote {
        PriceQuote::new("ETH", 3000.0).unwrap()
    }

    /// 0.4 ETH at 3000 = 1200 collateral, 400 debt, 0.67 threshold (HF ≈ 2.01)
    fn reference() -> (RiskMetrics, f64) {
        let snapshot = PositionSnapshot::new(0.4, 400.0, 0.67).unwrap();
        (RiskCalculator::compute(&snapshot, &price()).unwrap(), 0.4)
    }

    #[test]
    fn test_borrow_projection() {
        let (metrics, _) = reference();
        let projection = ActionSimulator::simulate_borrow(&metrics, 100.0);

        assert_eq!(projection.proposed_amount, 100.0);
        assert_eq!(projection.resulting_value, 500.0);
        assert!((projection.projected_health_factor - 1200.0 * 0.67 / 500.0).abs() < 1e-12);
        assert_eq!(projection.projected_tier, RiskTier::Safe);
        assert!(projection.is_safe);
    }

    #[test]
    fn test_borrow_clamped_to_available() {
        let (metrics, _) = reference();
        let projection = ActionSimulator::simulate_borrow(&metrics, 10_000.0);

        assert_eq!(projection.requested_amount, 10_000.0);
        assert_eq!(projection.proposed_amount, metrics.available_borrow_value);
        assert_eq!(
            projection.resulting_value,
            metrics.debt_value + metrics.available_borrow_value
        );
        // Full utilization lands on HF = 1
        assert!((projection.projected_health_factor - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_borrow_into_liquidation_risk_is_advisory_only() {
        let (metrics, _) = reference();
        let projection = ActionSimulator::simulate_borrow(&metrics, 350.0);

        assert_eq!(projection.proposed_amount, 350.0);
        assert_eq!(projection.projected_tier, RiskTier::LiquidationRisk);
        assert!(!projection.is_safe);
    }

    #[test]
    fn test_borrow_invalid_amounts_clamp_to_zero() {
        let (metrics, _) = reference();
        for requested in [f64::NAN, -50.0, 0.0] {
            let projection = ActionSimulator::simulate_borrow(&metrics, requested);
            assert_eq!(projection.proposed_amount, 0.0);
            assert_eq!(projection.resulting_value, metrics.debt_value);
            assert_eq!(projection.projected_health_factor, metrics.health_factor);
        }
    }

    #[test]
    fn test_borrow_infinite_request_clamps_to_available() {
        let (metrics, _) = reference();
        let projection = ActionSimulator::simulate_borrow(&metrics, f64::INFINITY);
        assert_eq!(projection.proposed_amount, metrics.available_borrow_value);
    }

    #[test]
    fn test_borrow_without_debt_or_amount_is_infinite() {
        let snapshot = PositionSnapshot::new(1.0, 0.0, 0.67).unwrap();
        let metrics = RiskCalculator::compute(&snapshot, &price()).unwrap();
        let projection = ActionSimulator::simulate_borrow(&metrics, 0.0);
        assert_eq!(projection.projected_health_factor, f64::INFINITY);
        assert_eq!(projection.projected_tier, RiskTier::Safe);
    }

    #[test]
    fn test_withdraw_small_amount_is_safe() {
        let (metrics, collateral) = reference();
        let projection =
            ActionSimulator::simulate_withdraw(&metrics, collateral, 0.05, &price(), None);

        assert_eq!(projection.proposed_amount, 0.05);
        assert!((projection.resulting_value - 1050.0).abs() < 1e-9);
        assert!(projection.projected_health_factor >= 1.2);
        assert!(projection.is_safe);
    }

    #[test]
    fn test_withdraw_below_threshold_is_unsafe() {
        // Leaves 0.2 ETH = 600, HF = 600 × 0.67 / 400 ≈ 1.005
        let (metrics, collateral) = reference();
        let projection =
            ActionSimulator::simulate_withdraw(&metrics, collateral, 0.2, &price(), None);

        assert!(projection.projected_health_factor < 1.2);
        assert_eq!(projection.projected_tier, RiskTier::LiquidationRisk);
        assert!(!projection.is_safe);
    }

    #[test]
    fn test_withdraw_clamped_to_collateral_and_cap() {
        let (metrics, collateral) = reference();

        let all = ActionSimulator::simulate_withdraw(&metrics, collateral, 5.0, &price(), None);
        assert_eq!(all.proposed_amount, collateral);
        assert_eq!(all.resulting_value, 0.0);
        assert_eq!(all.projected_health_factor, 0.0);
        assert!(!all.is_safe);

        let capped =
            ActionSimulator::simulate_withdraw(&metrics, collateral, 5.0, &price(), Some(0.1));
        assert_eq!(capped.proposed_amount, 0.1);
    }

    #[test]
    fn test_withdraw_without_debt_always_safe() {
        let snapshot = PositionSnapshot::new(1.0, 0.0, 0.67).unwrap();
        let metrics = RiskCalculator::compute(&snapshot, &price()).unwrap();
        let projection = ActionSimulator::simulate_withdraw(&metrics, 1.0, 1.0, &price(), None);

        assert_eq!(projection.projected_health_factor, f64::INFINITY);
        assert!(projection.is_safe);
    }

    #[test]
    fn test_caution_tier_withdraw_still_allowed() {
        // Leaves 0.24 ETH = 720, HF = 720 × 0.67 / 400 = 1.206
        let (metrics, collateral) = reference();
        let projection =
            ActionSimulator::simulate_withdraw(&metrics, collateral, 0.16, &price(), None);

        assert_eq!(projection.projected_tier, RiskTier::Caution);
        assert!(projection.is_safe);
    }

    #[test]
    fn test_repay_clamped_to_debt() {
        let (metrics, _) = reference();
        let projection = ActionSimulator::simulate_repay(&metrics, 1_000.0);

        assert_eq!(projection.proposed_amount, 400.0);
        assert_eq!(projection.resulting_value, 0.0);
        assert_eq!(projection.projected_health_factor, f64::INFINITY);
        assert!(projection.is_safe);
    }

    #[test]
    fn test_partial_repay_improves_health() {
        let (metrics, _) = reference();
        let projection = ActionSimulator::simulate_repay(&metrics, 100.0);
        assert_eq!(projection.resulting_value, 300.0);
        assert!(projection.projected_health_factor > metrics.health_factor);
    }

    #[test]
    fn test_stake_adds_collateral_value() {
        let (metrics, collateral) = reference();
        let projection = ActionSimulator::simulate_stake(&metrics, collateral, 0.1, &price());

        assert!((projection.resulting_value - 1500.0).abs() < 1e-9);
        assert!(projection.projected_health_factor > metrics.health_factor);
    }

    #[test]
    fn test_stake_rejects_unbounded_amounts() {
        let (metrics, collateral) = reference();
        let projection =
            ActionSimulator::simulate_stake(&metrics, collateral, f64::INFINITY, &price());
        assert_eq!(projection.proposed_amount, 0.0);
    }

    #[test]
    fn test_max_safe_withdraw() {
        let (metrics, collateral) = reference();
        let max = ActionSimulator::max_safe_withdraw(&metrics, collateral, &price());

        // Must keep 1.2 × 400 / 0.67 / 3000 ETH
        let keep = 1.2 * 400.0 / 0.67 / 3000.0;
        assert!((max - (collateral - keep)).abs() < 1e-12);

        let projection =
            ActionSimulator::simulate_withdraw(&metrics, collateral, max, &price(), None);
        assert!((projection.projected_health_factor - 1.2).abs() < 1e-9);
        assert!(projection.is_safe);

        let beyond =
            ActionSimulator::simulate_withdraw(&metrics, collateral, max + 0.001, &price(), None);
        assert!(!beyond.is_safe);
    }

    #[test]
    fn test_max_safe_withdraw_edges() {
        let no_debt = PositionSnapshot::new(0.8, 0.0, 0.67).unwrap();
        let metrics = RiskCalculator::compute(&no_debt, &price()).unwrap();
        assert_eq!(ActionSimulator::max_safe_withdraw(&metrics, 0.8, &price()), 0.8);

        let underwater = PositionSnapshot::new(0.1, 400.0, 0.67).unwrap();
        let metrics = RiskCalculator::compute(&underwater, &price()).unwrap();
        assert_eq!(ActionSimulator::max_safe_withdraw(&metrics, 0.1, &price()), 0.0);

        let zero_ratio = PositionSnapshot::new(1.0, 10.0, 0.0).unwrap();
        let metrics = RiskCalculator::compute(&zero_ratio, &price()).unwrap();
        assert_eq!(ActionSimulator::max_safe_withdraw(&metrics, 1.0, &price()), 0.0);
    }

    #[test]
    fn test_max_safe_withdraw_always_passes_withdraw_gate() {
        let mut checked = 0;
        for collateral in [0.013, 0.4, 1.0, 2.5, 17.3, 250.0] {
            for debt in [0.5, 7.3, 400.0, 1337.0, 9_999.99] {
                for ratio in [0.1, 0.5, 0.67, 0.8, 0.95] {
                    for price in [0.07, 1.0, 1811.5, 3000.0, 64_000.0] {
                        let quote = PriceQuote::new("ETH", price).unwrap();
                        let snapshot = PositionSnapshot::new(collateral, debt, ratio).unwrap();
                        let metrics = RiskCalculator::compute(&snapshot, &quote).unwrap();

                        let max = ActionSimulator::max_safe_withdraw(&metrics, collateral, &quote);
                        assert!((0.0..=collateral).contains(&max));
                        if max == 0.0 {
                            continue;
                        }

                        let projection = ActionSimulator::simulate_withdraw(
                            &metrics,
                            collateral,
                            max,
                            &quote,
                            Some(max),
                        );
                        assert_eq!(projection.proposed_amount, max);
                        assert!(
                            projection.is_safe,
                            "({}, {}, {}, {}) max={} hf={}",
                            collateral,
                            debt,
                            ratio,
                            price,
                            max,
                            projection.projected_health_factor
                        );
                        checked += 1;
                    }
                }
            }
        }
        assert!(checked > 100);
    }

    #[test]
    fn test_stake_projection_stays_finite() {
        let snapshot = PositionSnapshot::new(1.0, 400.0, 0.0).unwrap();
        let quote = PriceQuote::new("ETH", 1e10).unwrap();
        let metrics = RiskCalculator::compute(&snapshot, &quote).unwrap();

        let projection = ActionSimulator::simulate_stake(&metrics, 1.0, 1e300, &quote);
        assert!(projection.proposed_amount > 0.0);
        assert!(projection.proposed_amount < 1e300);
        assert!(projection.resulting_value.is_finite());
        assert!(!projection.projected_health_factor.is_nan());
    }
}
