//! Review endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::{OrderId, Role, UserId};
use domain::NewReview;
use serde::{Deserialize, Serialize};
use store::Store;

use super::{AppState, parse_uuid};
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateReviewRequest {
    pub order_id: String,
    pub reviewer_id: String,
    pub target_id: String,
    pub role: Role,
    pub rating: i16,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Serialize)]
pub struct ReviewRecordedResponse {
    pub success: bool,
    pub new_average: f64,
}

#[derive(Debug, Deserialize)]
pub struct ReviewStatusQuery {
    pub user_id: String,
}

#[derive(Serialize)]
pub struct ReviewStatusResponse {
    pub has_reviewed: bool,
}

/// POST /reviews — submit a review; returns the target's recomputed average.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateReviewRequest>,
) -> Result<Json<ReviewRecordedResponse>, ApiError> {
    let new_review = NewReview {
        order_id: OrderId::from_uuid(parse_uuid("order", &req.order_id)?),
        reviewer_id: UserId::from_uuid(parse_uuid("user", &req.reviewer_id)?),
        target_id: UserId::from_uuid(parse_uuid("user", &req.target_id)?),
        role: req.role,
        rating: req.rating,
        comment: req.comment,
    };
    let new_average = state.reviews.submit(new_review).await?;
    Ok(Json(ReviewRecordedResponse {
        success: true,
        new_average,
    }))
}

/// GET /orders/{id}/review-status — whether the user already reviewed the order.
#[tracing::instrument(skip(state))]
pub async fn status<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Query(query): Query<ReviewStatusQuery>,
) -> Result<Json<ReviewStatusResponse>, ApiError> {
    let order_id = OrderId::from_uuid(parse_uuid("order", &id)?);
    let user_id = UserId::from_uuid(parse_uuid("user", &query.user_id)?);
    let has_reviewed = state.reviews.has_reviewed(order_id, user_id).await?;
    Ok(Json(ReviewStatusResponse { has_reviewed }))
}
