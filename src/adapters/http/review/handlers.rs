//! HTTP handlers for review endpoints.

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::{ReviewChanges, ReviewDraft};
use crate::domain::foundation::{ConversationId, ReviewId, UserId};

use super::super::error::ApiError;
use super::super::middleware::RequireAuth;
use super::super::AppState;
use super::dto::{ReviewView, SubmitReviewRequest, UpdateReviewRequest};

// ════════════════════════════════════════════════════════════════════════════════
// POST /api/conversations/{id}/review
// ════════════════════════════════════════════════════════════════════════════════

/// Submits the one-time seller review for a completed conversation.
pub async fn submit_review(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(conversation_id): Path<String>,
    Json(body): Json<SubmitReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation_id: ConversationId = conversation_id
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid conversation ID format"))?;

    let draft = ReviewDraft {
        conversation_id,
        reviewer_id: user.id,
        seller_id: body.seller_id,
        rating: body.rating,
        communication: body.communication_rating,
        description_accuracy: body.description_accuracy_rating,
        meetup: body.meetup_rating,
        comment: body.comment,
    };

    let review = state.reviews.submit(draft).await?;
    Ok((StatusCode::CREATED, Json(ReviewView::from(&review))))
}

// ════════════════════════════════════════════════════════════════════════════════
// PATCH /api/reviews/{id}
// ════════════════════════════════════════════════════════════════════════════════

/// Author-only partial update.
pub async fn update_review(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(review_id): Path<String>,
    Json(body): Json<UpdateReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let review_id = parse_review_id(&review_id)?;

    let changes = ReviewChanges {
        rating: body.rating,
        communication: body.communication_rating,
        description_accuracy: body.description_accuracy_rating,
        meetup: body.meetup_rating,
        comment: body.comment,
    };

    let review = state.reviews.update(review_id, &user.id, changes).await?;
    Ok((StatusCode::OK, Json(ReviewView::from(&review))))
}

// ════════════════════════════════════════════════════════════════════════════════
// DELETE /api/reviews/{id}
// ════════════════════════════════════════════════════════════════════════════════

/// Author-only deletion. Admin deletion goes through the dashboard service,
/// which calls the same application operation with admin rights.
pub async fn delete_review(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(review_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let review_id = parse_review_id(&review_id)?;

    state.reviews.delete(review_id, &user.id, false).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ════════════════════════════════════════════════════════════════════════════════
// GET /api/sellers/{id}/stats
// ════════════════════════════════════════════════════════════════════════════════

/// Seller reputation: averages, histogram, completed sales.
pub async fn seller_stats(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(seller_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let seller =
        UserId::new(seller_id).map_err(|_| ApiError::bad_request("Invalid seller ID"))?;

    let stats = state.reviews.seller_stats(&seller).await?;
    Ok((StatusCode::OK, Json(stats)))
}

fn parse_review_id(raw: &str) -> Result<ReviewId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request("Invalid review ID format"))
}
