use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{NotificationId, OrderId, OrderStatus, Role, UserId};
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::model::{
    MatchCandidate, Notification, Order, OrderChange, OrderFilter, OrderSummary, Review,
    RunnerChange, User, UserStats,
};
use crate::repository::{
    NotificationRepository, OrderRepository, ReviewRepository, UserRepository,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    orders: Vec<Order>,
    reviews: Vec<Review>,
    notifications: Vec<Notification>,
}

/// In-memory store implementation for tests and local development.
///
/// A single lock guards all tables, so multi-table operations (review insert
/// plus rating recompute, guarded order transitions) are atomic the same way
/// a database transaction makes them atomic in [`PostgresStore`].
///
/// [`PostgresStore`]: crate::PostgresStore
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of stored notifications.
    pub async fn notification_count(&self) -> usize {
        self.tables.read().await.notifications.len()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        self.tables.write().await.users.push(user.clone());
        Ok(())
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn list_recent_users(&self, limit: i64) -> Result<Vec<User>> {
        let tables = self.tables.read().await;
        let mut users = tables.users.clone();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        users.truncate(limit.max(0) as usize);
        Ok(users)
    }

    async fn update_profile(
        &self,
        id: UserId,
        nickname: &str,
        avatar_url: Option<&str>,
    ) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.nickname = nickname.to_string();
                user.avatar_url = avatar_url.map(String::from);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_preferences(
        &self,
        id: UserId,
        preferences: &serde_json::Value,
    ) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.preferences = preferences.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn match_candidates(&self, exclude: UserId) -> Result<Vec<MatchCandidate>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .filter(|u| u.id != exclude)
            .map(|u| MatchCandidate {
                user_id: u.id,
                preferences: u.preferences.clone(),
            })
            .collect())
    }

    async fn user_stats(&self, id: UserId) -> Result<UserStats> {
        let tables = self.tables.read().await;
        let requester_order_count = tables
            .orders
            .iter()
            .filter(|o| o.requester_id == id)
            .count() as i64;
        // A runner's order only counts once it has actually been delivered.
        let runner_order_count = tables
            .orders
            .iter()
            .filter(|o| {
                o.runner_id == Some(id)
                    && matches!(
                        o.status,
                        OrderStatus::CompletedByRunner | OrderStatus::Confirmed
                    )
            })
            .count() as i64;
        let review_count = |role| {
            tables
                .reviews
                .iter()
                .filter(|r| r.target_id == id && r.role == role)
                .count() as i64
        };
        Ok(UserStats {
            requester_order_count,
            runner_order_count,
            requester_review_count: review_count(Role::Requester),
            runner_review_count: review_count(Role::Runner),
        })
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn insert_order(&self, order: &Order) -> Result<()> {
        self.tables.write().await.orders.push(order.clone());
        Ok(())
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>> {
        let tables = self.tables.read().await;
        Ok(tables.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<OrderSummary>> {
        let tables = self.tables.read().await;
        let mut summaries: Vec<OrderSummary> = tables
            .orders
            .iter()
            .filter(|o| {
                if let Some(status) = filter.status
                    && o.status != status
                {
                    return false;
                }
                if let Some((role, user_id)) = filter.participant {
                    let matches_role = match role {
                        Role::Requester => o.requester_id == user_id,
                        Role::Runner => o.runner_id == Some(user_id),
                    };
                    if !matches_role {
                        return false;
                    }
                }
                true
            })
            .filter_map(|o| {
                // Mirrors the SQL inner join: an order with no requester row
                // is not listed.
                let requester = tables.users.iter().find(|u| u.id == o.requester_id)?;
                Some(OrderSummary {
                    order: o.clone(),
                    requester_name: requester.nickname.clone(),
                    requester_avatar: requester.avatar_url.clone(),
                })
            })
            .collect();
        summaries.sort_by(|a, b| b.order.created_at.cmp(&a.order.created_at));
        Ok(summaries)
    }

    async fn transition_order(
        &self,
        id: OrderId,
        from: &[OrderStatus],
        change: OrderChange,
    ) -> Result<Option<Order>> {
        let mut tables = self.tables.write().await;
        let Some(order) = tables.orders.iter_mut().find(|o| o.id == id) else {
            return Ok(None);
        };
        if !from.contains(&order.status) {
            return Ok(None);
        }
        if let Some(expected) = change.expected_runner
            && order.runner_id != Some(expected)
        {
            return Ok(None);
        }

        order.status = change.status;
        match change.runner {
            RunnerChange::Keep => {}
            RunnerChange::Assign(runner) => order.runner_id = Some(runner),
            RunnerChange::Clear => order.runner_id = None,
        }
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn record_review(&self, review: &Review) -> Result<f64> {
        let mut tables = self.tables.write().await;
        let duplicate = tables
            .reviews
            .iter()
            .any(|r| r.order_id == review.order_id && r.reviewer_id == review.reviewer_id);
        if duplicate {
            return Err(StoreError::DuplicateReview);
        }

        tables.reviews.push(review.clone());

        // Unweighted mean over the full review set, including the new one.
        let ratings: Vec<i16> = tables
            .reviews
            .iter()
            .filter(|r| r.target_id == review.target_id && r.role == review.role)
            .map(|r| r.rating)
            .collect();
        let average = ratings.iter().map(|r| f64::from(*r)).sum::<f64>() / ratings.len() as f64;

        if let Some(target) = tables.users.iter_mut().find(|u| u.id == review.target_id) {
            match review.role {
                Role::Requester => target.rating_as_requester = average,
                Role::Runner => target.rating_as_runner = average,
            }
        }
        Ok(average)
    }

    async fn has_reviewed(&self, order_id: OrderId, reviewer_id: UserId) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .iter()
            .any(|r| r.order_id == order_id && r.reviewer_id == reviewer_id))
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn insert_notification(&self, notification: &Notification) -> Result<()> {
        self.tables
            .write()
            .await
            .notifications
            .push(notification.clone());
        Ok(())
    }

    async fn list_notifications(&self, user_id: UserId) -> Result<Vec<Notification>> {
        let tables = self.tables.read().await;
        let mut notifications: Vec<Notification> = tables
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    async fn mark_notification_read(&self, id: NotificationId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.notifications.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
