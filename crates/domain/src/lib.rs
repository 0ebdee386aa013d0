//! Business logic for the errand service.
//!
//! This crate provides the core behavior behind the HTTP surface:
//! - OrderService drives the lifecycle state machine and the notification
//!   fan-out that runs when an order is published
//! - ReviewService records reviews and keeps per-role averages consistent
//! - Preference is the tagged-union preference matcher
//! - Notifier creates best-effort user notifications
//! - UserService covers the mock-auth user management
//!
//! Everything is generic over [`store::Store`], so tests run against the
//! in-memory store and production runs against PostgreSQL.

pub mod error;
pub mod matching;
pub mod notify;
pub mod orders;
pub mod reviews;
pub mod users;

pub use error::DomainError;
pub use matching::{Preference, PreferenceFilter};
pub use notify::Notifier;
pub use orders::{NewOrder, OrderService};
pub use reviews::{NewReview, ReviewService};
pub use users::{NewUser, UserProfile, UserService};
