//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::{OrderId, OrderStatus, OrderType, Role, UserId};
use domain::NewOrder;
use rust_decimal::Decimal;
use serde::Deserialize;
use store::{Order, OrderFilter, OrderSummary, Store};

use super::{AppState, parse_uuid};
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub requester_id: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub description: String,
    pub pickup_location: String,
    pub delivery_location: String,
    pub price: Decimal,
    pub requester_wechat: String,
    #[serde(default)]
    pub time_requirement: Option<String>,
    #[serde(default)]
    pub extra_needs: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Deserialize)]
pub struct SetStatusRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub runner_id: Option<String>,
}

#[derive(Deserialize)]
pub struct CancelAcceptanceRequest {
    pub runner_id: String,
}

/// POST /orders — publish a new order and fan out recommendations.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(axum::http::StatusCode, Json<Order>), ApiError> {
    let requester_id = UserId::from_uuid(parse_uuid("user", &req.requester_id)?);
    let order = state
        .orders
        .create(NewOrder {
            requester_id,
            order_type: req.order_type,
            description: req.description,
            pickup_location: req.pickup_location,
            delivery_location: req.delivery_location,
            price: req.price,
            requester_wechat: req.requester_wechat,
            time_requirement: req.time_requirement,
            extra_needs: req.extra_needs,
        })
        .await?;
    Ok((axum::http::StatusCode::CREATED, Json(order)))
}

/// GET /orders — list orders with requester display fields.
///
/// `status` filters by lifecycle state; `role` plus `user_id` restricts to
/// orders where that user is the requester or the runner.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<OrderSummary>>, ApiError> {
    let participant = match (query.role, query.user_id) {
        (Some(role), Some(user_id)) => {
            Some((role, UserId::from_uuid(parse_uuid("user", &user_id)?)))
        }
        _ => None,
    };
    let filter = OrderFilter {
        status: query.status,
        participant,
    };
    Ok(Json(state.orders.list(&filter).await?))
}

/// GET /orders/{id} — load one order.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let id = OrderId::from_uuid(parse_uuid("order", &id)?);
    Ok(Json(state.orders.get(id).await?))
}

/// PATCH /orders/{id}/status — apply a lifecycle transition.
#[tracing::instrument(skip(state, req))]
pub async fn set_status<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<SetStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let id = OrderId::from_uuid(parse_uuid("order", &id)?);
    let runner_id = match req.runner_id {
        Some(raw) => Some(UserId::from_uuid(parse_uuid("user", &raw)?)),
        None => None,
    };
    Ok(Json(state.orders.set_status(id, req.status, runner_id).await?))
}

/// PATCH /orders/{id}/cancel-acceptance — the assigned runner withdraws.
#[tracing::instrument(skip(state, req))]
pub async fn cancel_acceptance<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<CancelAcceptanceRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = OrderId::from_uuid(parse_uuid("order", &id)?);
    let runner_id = UserId::from_uuid(parse_uuid("user", &req.runner_id)?);
    state.orders.cancel_acceptance(id, runner_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
