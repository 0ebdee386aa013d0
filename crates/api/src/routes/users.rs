//! Mock-auth user endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::UserId;
use domain::{NewUser, UserProfile};
use serde::Deserialize;
use store::{Store, User};

use super::{AppState, parse_uuid};
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub nickname: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub nickname: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdatePreferencesRequest {
    pub preferences: serde_json::Value,
}

/// POST /users — create a mock user.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(axum::http::StatusCode, Json<User>), ApiError> {
    let user = state
        .users
        .create(NewUser {
            nickname: req.nickname,
            avatar_url: req.avatar_url,
        })
        .await?;
    Ok((axum::http::StatusCode::CREATED, Json(user)))
}

/// GET /users — most recently created users.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.users.list_recent(10).await?))
}

/// GET /users/{id} — profile with derived activity counts.
#[tracing::instrument(skip(state))]
pub async fn profile<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    let id = UserId::from_uuid(parse_uuid("user", &id)?);
    Ok(Json(state.users.profile(id).await?))
}

/// PATCH /users/{id}/profile — update display fields.
#[tracing::instrument(skip(state, req))]
pub async fn update_profile<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = UserId::from_uuid(parse_uuid("user", &id)?);
    state
        .users
        .update_profile(id, req.nickname, req.avatar_url)
        .await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// PATCH /users/{id}/preferences — replace the stored preference blob.
#[tracing::instrument(skip(state, req))]
pub async fn update_preferences<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePreferencesRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = UserId::from_uuid(parse_uuid("user", &id)?);
    state.users.update_preferences(id, req.preferences).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
