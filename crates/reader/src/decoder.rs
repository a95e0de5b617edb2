use alloy::primitives::U256;
use alloy::primitives::utils::format_units;

use minilend_common::config::AppConfig;
use minilend_common::error::AppError;
use minilend_common::types::PositionSnapshot;

/// Position figures exactly as the lending contract returns them.
///
/// - `collateral`: `getUserCollateral` in wei
/// - `debt`: `getUserDebt` in the debt token's smallest unit
/// - `liquidation_threshold`: `LIQUIDATION_THRESHOLD` in basis points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawPosition {
    pub collateral: U256,
    pub debt: U256,
    pub liquidation_threshold: U256,
}

/// Converts on-chain integers into a [`PositionSnapshot`].
///
/// Debt is taken to be denominated in a value-pegged token, so it is scaled by
/// its decimals only and never multiplied by the collateral price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionDecoder {
    collateral_decimals: u8,
    debt_decimals: u8,
    threshold_denominator: u64,
}

impl PositionDecoder {
    pub fn new(collateral_decimals: u8, debt_decimals: u8, threshold_denominator: u64) -> Self {
        Self {
            collateral_decimals,
            debt_decimals,
            threshold_denominator,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.collateral_decimals,
            config.debt_decimals,
            config.liquidation_threshold_denominator,
        )
    }

    /// Decode a raw position. Fails on unit overflow or an out-of-range threshold.
    pub fn decode(&self, raw: &RawPosition) -> Result<PositionSnapshot, AppError> {
        let collateral_amount = scale(raw.collateral, self.collateral_decimals)?;
        let debt_amount = scale(raw.debt, self.debt_decimals)?;

        if self.threshold_denominator == 0 {
            return Err(AppError::Config(
                "liquidation threshold denominator must be greater than zero".to_string(),
            ));
        }
        let threshold = u64::try_from(raw.liquidation_threshold).map_err(|_| {
            AppError::Decode(format!(
                "liquidation threshold {} does not fit in u64",
                raw.liquidation_threshold
            ))
        })?;
        let ratio = threshold as f64 / self.threshold_denominator as f64;

        PositionSnapshot::new(collateral_amount, debt_amount, ratio)
    }
}

impl Default for PositionDecoder {
    fn default() -> Self {
        Self::new(18, 18, 10_000)
    }
}

/// Scale an integer amount down by `decimals` into a float.
fn scale(amount: U256, decimals: u8) -> Result<f64, AppError> {
    let formatted = format_units(amount, decimals).map_err(|e| {
        AppError::Decode(format!(
            "cannot format {} with {} decimals: {}",
            amount, decimals, e
        ))
    })?;
    formatted.parse::<f64>().map_err(|e| {
        AppError::Decode(format!("cannot parse formatted amount {}: {}", formatted, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_ETHER: u128 = 1_000_000_000_000_000_000;

    fn raw(collateral: u128, debt: u128, threshold: u64) -> RawPosition {
        RawPosition {
            collateral: U256::from(collateral),
            debt: U256::from(debt),
            liquidation_threshold: U256::from(threshold),
        }
    }

    #[test]
    fn test_decode_wei_and_basis_points() {
        let decoder = PositionDecoder::default();
        let snapshot = decoder
            .decode(&raw(ONE_ETHER * 2 / 5, ONE_ETHER * 400, 6_700))
            .unwrap();

        assert!((snapshot.collateral_amount() - 0.4).abs() < 1e-12);
        assert!((snapshot.debt_amount() - 400.0).abs() < 1e-9);
        assert!((snapshot.liquidation_threshold_ratio() - 0.67).abs() < 1e-12);
    }

    #[test]
    fn test_decode_zero_position() {
        let snapshot = PositionDecoder::default().decode(&raw(0, 0, 8_000)).unwrap();
        assert_eq!(snapshot.collateral_amount(), 0.0);
        assert_eq!(snapshot.debt_amount(), 0.0);
        assert_eq!(snapshot.liquidation_threshold_ratio(), 0.8);
    }

    #[test]
    fn test_decode_respects_debt_decimals() {
        // 6-decimal stablecoin debt
        let decoder = PositionDecoder::new(18, 6, 10_000);
        let snapshot = decoder.decode(&raw(ONE_ETHER, 250_500_000, 7_500)).unwrap();
        assert!((snapshot.debt_amount() - 250.5).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_above_denominator_rejected() {
        let err = PositionDecoder::default()
            .decode(&raw(ONE_ETHER, 0, 10_001))
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_huge_threshold_rejected() {
        let position = RawPosition {
            collateral: U256::ZERO,
            debt: U256::ZERO,
            liquidation_threshold: U256::MAX,
        };
        let err = PositionDecoder::default().decode(&position).unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));
    }

    #[test]
    fn test_zero_denominator_rejected() {
        let err = PositionDecoder::new(18, 18, 0)
            .decode(&raw(ONE_ETHER, 0, 5_000))
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
