//! Router builder utilities for search routes

use crate::server::handlers::{AppState, health_check, list_entities, search_entities};
use axum::{
    Router,
    routing::{get, post},
};

/// Build search routes
///
/// These routes are generic and work for all registered entities:
/// - GET /health - Liveness and registered entities
/// - GET /{plural} - List with the entity's default sort
/// - POST /{plural}/search - Search with a filter document body
pub fn build_search_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/{plural}", get(list_entities))
        .route("/{plural}/search", post(search_entities))
        .with_state(state)
}
