//! Entity models persisted by the repositories.

use chrono::{DateTime, Utc};
use common::{NotificationId, OrderId, OrderStatus, OrderType, ReviewId, Role, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A registered user with per-role reputation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub nickname: String,
    pub avatar_url: Option<String>,
    pub rating_as_requester: f64,
    pub rating_as_runner: f64,
    /// Raw preference blob exactly as stored. The matcher parses it lazily;
    /// an unreadable blob must not make the user row unreadable.
    pub preferences: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a user with default reputation and empty (legacy) preferences.
    pub fn new(nickname: impl Into<String>, avatar_url: Option<String>) -> Self {
        Self {
            id: UserId::new(),
            nickname: nickname.into(),
            avatar_url,
            rating_as_requester: 5.0,
            rating_as_runner: 5.0,
            preferences: serde_json::Value::Array(Vec::new()),
            created_at: Utc::now(),
        }
    }
}

/// An errand order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub requester_id: UserId,
    /// Assigned runner; None until the order is accepted.
    pub runner_id: Option<UserId>,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub description: String,
    pub pickup_location: String,
    pub delivery_location: String,
    pub price: Decimal,
    pub requester_wechat: String,
    pub status: OrderStatus,
    pub time_requirement: Option<String>,
    pub extra_needs: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order joined with the requester's display fields, for list views.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    #[serde(flatten)]
    pub order: Order,
    pub requester_name: String,
    pub requester_avatar: Option<String>,
}

/// Filter for order list queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Restrict to orders where the given user acts in the given role.
    pub participant: Option<(Role, UserId)>,
}

/// A review of one order participant by the other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub order_id: OrderId,
    pub reviewer_id: UserId,
    pub target_id: UserId,
    /// The target's role on the order at review time.
    pub role: Role,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A user-facing message created by lifecycle and matching events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Creates an unread notification for a user.
    pub fn new(user_id: UserId, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: NotificationId::new(),
            user_id,
            title: title.into(),
            message: message.into(),
            is_read: false,
            created_at: Utc::now(),
        }
    }
}

/// Activity counts derived from orders and reviews on read, never stored.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct UserStats {
    pub requester_order_count: i64,
    pub runner_order_count: i64,
    pub requester_review_count: i64,
    pub runner_review_count: i64,
}

/// A user considered for notification matching, with their raw preference
/// blob. Parsing is deferred to the matcher so one bad blob cannot abort a
/// whole matching pass.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub user_id: UserId,
    pub preferences: serde_json::Value,
}

/// How a guarded transition updates the runner column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerChange {
    /// Leave the runner assignment untouched.
    Keep,
    /// Assign the given runner.
    Assign(UserId),
    /// Clear the assignment.
    Clear,
}

/// A status transition applied only while the row is still in an expected
/// prior state. Status and runner always change in the same update so an
/// order is never observably accepted without a runner.
#[derive(Debug, Clone, Copy)]
pub struct OrderChange {
    pub status: OrderStatus,
    pub runner: RunnerChange,
    /// When set, the update additionally requires the row's current runner
    /// to be this user.
    pub expected_runner: Option<UserId>,
}

impl OrderChange {
    /// A plain status change that keeps the runner assignment.
    pub fn to(status: OrderStatus) -> Self {
        Self {
            status,
            runner: RunnerChange::Keep,
            expected_runner: None,
        }
    }

    /// Assigns a runner and moves the order to accepted.
    pub fn accept(runner: UserId) -> Self {
        Self {
            status: OrderStatus::Accepted,
            runner: RunnerChange::Assign(runner),
            expected_runner: None,
        }
    }

    /// Clears the runner and returns the order to the lobby. Only applies
    /// while the given runner still holds the assignment.
    pub fn release(runner: UserId) -> Self {
        Self {
            status: OrderStatus::Pending,
            runner: RunnerChange::Clear,
            expected_runner: Some(runner),
        }
    }
}
