//! Notification endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use common::{NotificationId, UserId};
use serde::Deserialize;
use store::{Notification, Store};

use super::{AppState, parse_uuid};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    pub user_id: String,
}

#[derive(Deserialize)]
pub struct MarkReadRequest {
    pub id: String,
}

/// GET /notifications — the user's notifications, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let user_id = UserId::from_uuid(parse_uuid("user", &query.user_id)?);
    Ok(Json(state.notifier.list(user_id).await?))
}

/// POST /notifications/mark-read — mark one notification as read.
#[tracing::instrument(skip(state, req))]
pub async fn mark_read<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<MarkReadRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = NotificationId::from_uuid(parse_uuid("notification", &req.id)?);
    state.notifier.mark_read(id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
