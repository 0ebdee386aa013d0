//! Persistence layer for the errand service.
//!
//! All reads and writes go through one narrow repository interface per
//! entity, so the lifecycle and matching logic stay storage-agnostic and
//! unit-testable without a real database. Two implementations are provided:
//! [`MemoryStore`] for tests and local development, and [`PostgresStore`]
//! backed by sqlx.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod repository;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use model::{
    MatchCandidate, Notification, Order, OrderChange, OrderFilter, OrderSummary, Review,
    RunnerChange, User, UserStats,
};
pub use postgres::PostgresStore;
pub use repository::{
    NotificationRepository, OrderRepository, ReviewRepository, Store, UserRepository,
};
