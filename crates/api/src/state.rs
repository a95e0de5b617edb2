//! Shared application state for the Axum API server.

use std::sync::Arc;

use minilend_common::config::AppConfig;
use minilend_common::error::AppError;
use minilend_common::types::PriceQuote;
use minilend_reader::SnapshotReader;
use minilend_reader::decoder::PositionDecoder;
use minilend_reader::store::{LatestPosition, LatestPrice};

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub positions: Arc<LatestPosition>,
    pub prices: Arc<LatestPrice>,
    pub decoder: PositionDecoder,
    pub reader: SnapshotReader,
}

impl AppState {
    /// Build state from config, seeding the price store when a price is configured.
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        let positions = Arc::new(LatestPosition::new());
        let prices = Arc::new(match config.collateral_price_usd {
            Some(price) => LatestPrice::seeded(PriceQuote::new(
                config.collateral_asset.clone(),
                price,
            )?),
            None => LatestPrice::new(),
        });
        let decoder = PositionDecoder::from_config(&config);
        let reader = SnapshotReader::new(decoder, positions.clone(), prices.clone());

        Ok(Self {
            config,
            positions,
            prices,
            decoder,
            reader,
        })
    }
}
