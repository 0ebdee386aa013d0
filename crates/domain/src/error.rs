//! Domain error taxonomy.

use common::OrderStatus;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A required field is missing or out of range.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The acting user may not perform this operation.
    #[error("not authorized: {0}")]
    Unauthorized(&'static str),

    /// A review for this (order, reviewer) pair already exists.
    #[error("review already submitted for this order")]
    DuplicateReview,

    /// The order is not in a state that allows the requested transition.
    /// Also what the loser of a concurrent accept race sees.
    #[error("cannot {action} an order that is {current}")]
    Conflict {
        current: OrderStatus,
        action: &'static str,
    },

    /// The underlying store failed.
    #[error("storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateReview => DomainError::DuplicateReview,
            other => DomainError::Store(other),
        }
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
