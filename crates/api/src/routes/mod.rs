//! Route handlers.

pub mod health;
pub mod metrics;
pub mod notifications;
pub mod orders;
pub mod reviews;
pub mod users;

use domain::{Notifier, OrderService, ReviewService, UserService};
use store::Store;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub users: UserService<S>,
    pub orders: OrderService<S>,
    pub reviews: ReviewService<S>,
    pub notifier: Notifier<S>,
}

pub(crate) fn parse_uuid(kind: &'static str, raw: &str) -> Result<uuid::Uuid, ApiError> {
    uuid::Uuid::parse_str(raw)
        .map_err(|e| ApiError::BadRequest(format!("invalid {kind} id: {e}")))
}
