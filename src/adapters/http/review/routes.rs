//! Axum routes for review endpoints.

use axum::routing::{get, patch, post};
use axum::Router;

use super::super::AppState;
use super::handlers::{delete_review, seller_stats, submit_review, update_review};

/// Creates routes for review endpoints.
///
/// REST Endpoints:
/// - POST   /conversations/{id}/review - submit the one-time review
/// - PATCH  /reviews/{id} - author-only update
/// - DELETE /reviews/{id} - author-only deletion
/// - GET    /sellers/{id}/stats - seller reputation aggregates
pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/conversations/{conversation_id}/review", post(submit_review))
        .route("/reviews/{review_id}", patch(update_review).delete(delete_review))
        .route("/sellers/{seller_id}/stats", get(seller_stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_routes_creates_valid_router() {
        let _routes = review_routes();
    }
}
