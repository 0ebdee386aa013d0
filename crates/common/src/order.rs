//! Order categories and the lifecycle state machine.

use serde::{Deserialize, Serialize};

/// Category of an errand order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Food pickup from a campus takeout point.
    Takeout,
    /// Parcel collection from an express station.
    Express,
    /// Sending something out on the requester's behalf.
    Send,
    /// General errand.
    Errand,
    /// Anything that does not fit the other categories.
    Other,
}

impl OrderType {
    /// Returns the type name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Takeout => "takeout",
            OrderType::Express => "express",
            OrderType::Send => "send",
            OrderType::Errand => "errand",
            OrderType::Other => "other",
        }
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing a stored order type fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order type: {0}")]
pub struct ParseOrderTypeError(pub String);

impl std::str::FromStr for OrderType {
    type Err = ParseOrderTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "takeout" => Ok(OrderType::Takeout),
            "express" => Ok(OrderType::Express),
            "send" => Ok(OrderType::Send),
            "errand" => Ok(OrderType::Errand),
            "other" => Ok(OrderType::Other),
            other => Err(ParseOrderTypeError(other.to_string())),
        }
    }
}

/// Lifecycle state of an order.
///
/// State transitions:
/// ```text
/// Pending ──► Accepted ──► CompletedByRunner ──► Confirmed
///    │            │
///    │            ├──► Pending  (runner withdraws)
///    └────────────┴──► Cancelled
/// ```
///
/// `Confirmed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Published and waiting for a runner.
    #[default]
    Pending,

    /// A runner has taken the task.
    Accepted,

    /// The runner marked the task delivered, awaiting confirmation.
    CompletedByRunner,

    /// The requester confirmed completion (terminal state).
    Confirmed,

    /// The order was cancelled (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if a runner can accept the order in this state.
    pub fn can_accept(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if the runner can mark the order delivered in this state.
    pub fn can_complete(&self) -> bool {
        matches!(self, OrderStatus::Accepted)
    }

    /// Returns true if the requester can confirm completion in this state.
    pub fn can_confirm(&self) -> bool {
        matches!(self, OrderStatus::CompletedByRunner)
    }

    /// Returns true if the assigned runner can give the task back in this state.
    pub fn can_release(&self) -> bool {
        matches!(self, OrderStatus::Accepted)
    }

    /// Returns true if the order can be cancelled in this state.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Accepted)
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Confirmed | OrderStatus::Cancelled)
    }

    /// Returns the state name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::CompletedByRunner => "completed_by_runner",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing a stored order status fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct ParseOrderStatusError(pub String);

impl std::str::FromStr for OrderStatus {
    type Err = ParseOrderStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "accepted" => Ok(OrderStatus::Accepted),
            "completed_by_runner" => Ok(OrderStatus::CompletedByRunner),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(ParseOrderStatusError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn only_pending_can_be_accepted() {
        assert!(OrderStatus::Pending.can_accept());
        assert!(!OrderStatus::Accepted.can_accept());
        assert!(!OrderStatus::CompletedByRunner.can_accept());
        assert!(!OrderStatus::Confirmed.can_accept());
        assert!(!OrderStatus::Cancelled.can_accept());
    }

    #[test]
    fn only_accepted_can_be_completed() {
        assert!(!OrderStatus::Pending.can_complete());
        assert!(OrderStatus::Accepted.can_complete());
        assert!(!OrderStatus::CompletedByRunner.can_complete());
        assert!(!OrderStatus::Confirmed.can_complete());
        assert!(!OrderStatus::Cancelled.can_complete());
    }

    #[test]
    fn only_completed_can_be_confirmed() {
        assert!(!OrderStatus::Pending.can_confirm());
        assert!(!OrderStatus::Accepted.can_confirm());
        assert!(OrderStatus::CompletedByRunner.can_confirm());
        assert!(!OrderStatus::Confirmed.can_confirm());
        assert!(!OrderStatus::Cancelled.can_confirm());
    }

    #[test]
    fn release_only_from_accepted() {
        assert!(OrderStatus::Accepted.can_release());
        assert!(!OrderStatus::Pending.can_release());
        assert!(!OrderStatus::CompletedByRunner.can_release());
    }

    #[test]
    fn cancel_from_pending_or_accepted_only() {
        assert!(OrderStatus::Pending.can_cancel());
        assert!(OrderStatus::Accepted.can_cancel());
        assert!(!OrderStatus::CompletedByRunner.can_cancel());
        assert!(!OrderStatus::Confirmed.can_cancel());
        assert!(!OrderStatus::Cancelled.can_cancel());
    }

    #[test]
    fn terminal_states() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Accepted.is_terminal());
        assert!(!OrderStatus::CompletedByRunner.is_terminal());
        assert!(OrderStatus::Confirmed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn status_roundtrips_through_str() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Accepted,
            OrderStatus::CompletedByRunner,
            OrderStatus::Confirmed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&OrderStatus::CompletedByRunner).unwrap();
        assert_eq!(json, "\"completed_by_runner\"");
        let back: OrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, OrderStatus::CompletedByRunner);
    }

    #[test]
    fn order_type_roundtrips_through_str() {
        for ty in [
            OrderType::Takeout,
            OrderType::Express,
            OrderType::Send,
            OrderType::Errand,
            OrderType::Other,
        ] {
            assert_eq!(ty.as_str().parse::<OrderType>(), Ok(ty));
        }
    }
}
