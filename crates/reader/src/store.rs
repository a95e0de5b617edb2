//! Latest-value stores fed by the external wallet/RPC layer.
//!
//! The wallet layer publishes whatever it last read; the reader only ever sees
//! the most recent value, or `None` when nothing has been read yet (or the
//! publisher marked the value stale).

use std::sync::RwLock;

use minilend_common::types::PriceQuote;

use crate::decoder::RawPosition;
use crate::{PositionSource, PriceSource};

/// Most recently published raw position.
#[derive(Debug, Default)]
pub struct LatestPosition {
    inner: RwLock<Option<RawPosition>>,
}

impl LatestPosition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, position: RawPosition) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = Some(position);
        tracing::info!(
            collateral = %position.collateral,
            debt = %position.debt,
            liquidation_threshold = %position.liquidation_threshold,
            "Position published"
        );
    }

    /// Mark the position as not available (e.g. wallet disconnected).
    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = None;
        tracing::info!("Position cleared");
    }
}

impl PositionSource for LatestPosition {
    fn read_position(&self) -> Option<RawPosition> {
        *self.inner.read().unwrap_or_else(|e| e.into_inner())
    }
}

/// Most recently published collateral price.
#[derive(Debug, Default)]
pub struct LatestPrice {
    inner: RwLock<Option<PriceQuote>>,
}

impl LatestPrice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a known price, e.g. the configured seed price.
    pub fn seeded(quote: PriceQuote) -> Self {
        Self {
            inner: RwLock::new(Some(quote)),
        }
    }

    pub fn publish(&self, quote: PriceQuote) {
        tracing::info!(asset = quote.asset(), price = quote.price(), "Price published");
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = Some(quote);
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

impl PriceSource for LatestPrice {
    fn current_price(&self) -> Option<PriceQuote> {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
