pub mod actions;
pub mod health;
pub mod position;
pub mod risk;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(position::router())
        .merge(risk::router())
        .merge(actions::router())
        .with_state(state)
}
