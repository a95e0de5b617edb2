//! MiniLend risk API.
//!
//! Endpoints:
//! - PUT/DELETE /api/position: Publish or clear the raw on-chain position
//! - PUT/DELETE /api/price: Publish or clear the collateral price
//! - GET /api/position/metrics: Metrics and tier for the current observation
//! - POST /api/risk/metrics, /api/risk/classify: Stateless calculations
//! - POST /api/simulate/{action}: Project an action against the current observation
//! - POST /api/actions/gate: Pre-submission decision for an action

pub mod routes;
pub mod state;
