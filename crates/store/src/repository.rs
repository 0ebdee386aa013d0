//! Repository traits, one narrow interface per entity.

use async_trait::async_trait;
use common::{NotificationId, OrderId, OrderStatus, UserId};

use crate::Result;
use crate::model::{
    MatchCandidate, Notification, Order, OrderChange, OrderFilter, OrderSummary, Review, User,
    UserStats,
};

/// User rows and the derived reads built on them.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert_user(&self, user: &User) -> Result<()>;

    async fn find_user(&self, id: UserId) -> Result<Option<User>>;

    /// Most recently created users first.
    async fn list_recent_users(&self, limit: i64) -> Result<Vec<User>>;

    /// Returns false when the user does not exist.
    async fn update_profile(
        &self,
        id: UserId,
        nickname: &str,
        avatar_url: Option<&str>,
    ) -> Result<bool>;

    /// Replaces the stored preference blob. Returns false when the user does
    /// not exist.
    async fn update_preferences(
        &self,
        id: UserId,
        preferences: &serde_json::Value,
    ) -> Result<bool>;

    /// Every user other than `exclude`, with their raw preference blobs, for
    /// a notification matching pass.
    async fn match_candidates(&self, exclude: UserId) -> Result<Vec<MatchCandidate>>;

    /// Activity counts computed from orders and reviews at read time.
    async fn user_stats(&self, id: UserId) -> Result<UserStats>;
}

/// Order rows, including the guarded state-machine update.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert_order(&self, order: &Order) -> Result<()>;

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Orders joined with requester display fields, newest first.
    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<OrderSummary>>;

    /// Conditionally applies `change` while the row is still in one of the
    /// `from` states (and the runner guard holds, if set). Returns the
    /// updated order, or None when the guard did not match; the caller
    /// decides what losing the guard means. Concurrent callers racing on the
    /// same row see exactly one success.
    async fn transition_order(
        &self,
        id: OrderId,
        from: &[OrderStatus],
        change: OrderChange,
    ) -> Result<Option<Order>>;
}

/// Review rows plus the rating aggregation tied to them.
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Inserts the review and recomputes the target's per-role average as
    /// the unweighted mean over the full review set, atomically. Returns the
    /// recomputed average. Fails with [`StoreError::DuplicateReview`] when a
    /// review for this (order, reviewer) pair already exists.
    ///
    /// [`StoreError::DuplicateReview`]: crate::StoreError::DuplicateReview
    async fn record_review(&self, review: &Review) -> Result<f64>;

    async fn has_reviewed(&self, order_id: OrderId, reviewer_id: UserId) -> Result<bool>;
}

/// Notification rows.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert_notification(&self, notification: &Notification) -> Result<()>;

    /// Newest first.
    async fn list_notifications(&self, user_id: UserId) -> Result<Vec<Notification>>;

    /// Returns false when the notification does not exist.
    async fn mark_notification_read(&self, id: NotificationId) -> Result<bool>;
}

/// A full store: one cloneable handle implementing every repository.
pub trait Store:
    UserRepository
    + OrderRepository
    + ReviewRepository
    + NotificationRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> Store for T where
    T: UserRepository
        + OrderRepository
        + ReviewRepository
        + NotificationRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}
