pub mod decoder;
pub mod store;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use minilend_common::error::AppError;
use minilend_common::types::{Observation, PriceQuote};

use crate::decoder::{PositionDecoder, RawPosition};

/// Source of the user's raw on-chain position.
///
/// Returns `None` while the position has not been read yet.
pub trait PositionSource: Send + Sync {
    fn read_position(&self) -> Option<RawPosition>;
}

/// Source of the current collateral price.
pub trait PriceSource: Send + Sync {
    fn current_price(&self) -> Option<PriceQuote>;
}

/// Pairs one position read with one price read into an [`Observation`].
#[derive(Clone)]
pub struct SnapshotReader {
    decoder: PositionDecoder,
    positions: Arc<dyn PositionSource>,
    prices: Arc<dyn PriceSource>,
}

impl SnapshotReader {
    pub fn new(
        decoder: PositionDecoder,
        positions: Arc<dyn PositionSource>,
        prices: Arc<dyn PriceSource>,
    ) -> Self {
        Self {
            decoder,
            positions,
            prices,
        }
    }

    /// Observe the position now.
    pub fn observe(&self) -> Result<Option<Observation>, AppError> {
        self.observe_at(Utc::now())
    }

    /// Read each source exactly once and decode.
    ///
    /// Returns `Ok(None)` when either input is not yet available; a missing
    /// input is never substituted with zero.
    pub fn observe_at(&self, observed_at: DateTime<Utc>) -> Result<Option<Observation>, AppError> {
        let Some(raw) = self.positions.read_position() else {
            tracing::debug!("No position available yet");
            return Ok(None);
        };
        let Some(price) = self.prices.current_price() else {
            tracing::debug!("No price available yet");
            return Ok(None);
        };

        let snapshot = self.decoder.decode(&raw)?;

        Ok(Some(Observation {
            snapshot,
            price,
            observed_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::U256;

    use super::*;
    use crate::store::{LatestPosition, LatestPrice};

    const ONE_ETHER: u64 = 1_000_000_000_000_000_000;

    fn reader() -> (SnapshotReader, Arc<LatestPosition>, Arc<LatestPrice>) {
        let positions = Arc::new(LatestPosition::new());
        let prices = Arc::new(LatestPrice::new());
        let reader = SnapshotReader::new(
            PositionDecoder::default(),
            positions.clone(),
            prices.clone(),
        );
        (reader, positions, prices)
    }

    fn publish_default_position(positions: &LatestPosition) {
        positions.publish(RawPosition {
            collateral: U256::from(ONE_ETHER),
            debt: U256::from(ONE_ETHER) * U256::from(400u64),
            liquidation_threshold: U256::from(6_700u64),
        });
    }

    #[test]
    fn test_missing_position_is_absent() {
        let (reader, _, prices) = reader();
        prices.publish(PriceQuote::new("ETH", 1200.0).unwrap());
        assert!(reader.observe().unwrap().is_none());
    }

    #[test]
    fn test_missing_price_is_absent() {
        let (reader, positions, _) = reader();
        publish_default_position(&positions);
        assert!(reader.observe().unwrap().is_none());
    }

    #[test]
    fn test_observation_pairs_inputs() {
        let (reader, positions, prices) = reader();
        publish_default_position(&positions);
        prices.publish(PriceQuote::new("ETH", 1200.0).unwrap());

        let at = Utc::now();
        let observation = reader.observe_at(at).unwrap().unwrap();
        assert_eq!(observation.observed_at, at);
        assert_eq!(observation.snapshot.collateral_amount(), 1.0);
        assert_eq!(observation.snapshot.debt_amount(), 400.0);
        assert_eq!(observation.price.price(), 1200.0);
    }

    #[test]
    fn test_invalid_raw_position_is_an_error() {
        let (reader, positions, prices) = reader();
        positions.publish(RawPosition {
            collateral: U256::from(ONE_ETHER),
            debt: U256::ZERO,
            liquidation_threshold: U256::from(20_000u64),
        });
        prices.publish(PriceQuote::new("ETH", 1200.0).unwrap());
        assert!(reader.observe().is_err());
    }
}
