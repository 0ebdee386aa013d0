//! Mock-auth user management and profile reads.
//!
//! Real authentication is out of scope; users are created directly and
//! addressed by id, which is what the client's user-switch flow relies on.

use common::UserId;
use serde::Serialize;
use store::{Store, User, UserStats};

use crate::error::{DomainError, Result};
use crate::matching::Preference;

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub nickname: String,
    pub avatar_url: Option<String>,
}

/// A user joined with activity counts derived on read.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    #[serde(flatten)]
    pub stats: UserStats,
}

/// User creation, profiles and preference updates.
pub struct UserService<S> {
    store: S,
}

impl<S: Store> UserService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a user with default reputation and empty preferences.
    #[tracing::instrument(skip(self, new_user))]
    pub async fn create(&self, new_user: NewUser) -> Result<User> {
        if new_user.nickname.trim().is_empty() {
            return Err(DomainError::Validation(
                "nickname must not be empty".to_string(),
            ));
        }
        let user = User::new(new_user.nickname, new_user.avatar_url);
        self.store.insert_user(&user).await?;
        Ok(user)
    }

    /// Loads a user together with their derived activity counts.
    ///
    /// The counts come from aggregate queries at read time; nothing is
    /// stored, so they cannot drift from the orders and reviews tables.
    pub async fn profile(&self, id: UserId) -> Result<UserProfile> {
        let user = self
            .store
            .find_user(id)
            .await?
            .ok_or(DomainError::NotFound("user"))?;
        let stats = self.store.user_stats(id).await?;
        Ok(UserProfile { user, stats })
    }

    /// Most recently created users first.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<User>> {
        Ok(self.store.list_recent_users(limit).await?)
    }

    /// Updates display fields.
    pub async fn update_profile(
        &self,
        id: UserId,
        nickname: String,
        avatar_url: Option<String>,
    ) -> Result<()> {
        if nickname.trim().is_empty() {
            return Err(DomainError::Validation(
                "nickname must not be empty".to_string(),
            ));
        }
        if self
            .store
            .update_profile(id, &nickname, avatar_url.as_deref())
            .await?
        {
            Ok(())
        } else {
            Err(DomainError::NotFound("user"))
        }
    }

    /// Replaces the stored preference blob.
    ///
    /// The new blob must parse as one of the two preference shapes so later
    /// matching passes can read it; blobs already stored stay readable as-is
    /// and are simply skipped by matching when unreadable.
    pub async fn update_preferences(
        &self,
        id: UserId,
        preferences: serde_json::Value,
    ) -> Result<()> {
        Preference::parse(&preferences)
            .map_err(|e| DomainError::Validation(format!("unrecognized preference shape: {e}")))?;
        if self.store.update_preferences(id, &preferences).await? {
            Ok(())
        } else {
            Err(DomainError::NotFound("user"))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use store::{MemoryStore, UserRepository};

    use super::*;

    #[tokio::test]
    async fn create_applies_defaults() {
        let service = UserService::new(MemoryStore::new());
        let user = service
            .create(NewUser {
                nickname: "alice".to_string(),
                avatar_url: None,
            })
            .await
            .unwrap();

        assert_eq!(user.rating_as_requester, 5.0);
        assert_eq!(user.rating_as_runner, 5.0);
        assert_eq!(user.preferences, json!([]));
    }

    #[tokio::test]
    async fn create_rejects_blank_nickname() {
        let service = UserService::new(MemoryStore::new());
        let result = service
            .create(NewUser {
                nickname: "  ".to_string(),
                avatar_url: None,
            })
            .await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn profile_includes_derived_counts() {
        let store = MemoryStore::new();
        let service = UserService::new(store.clone());
        let user = service
            .create(NewUser {
                nickname: "alice".to_string(),
                avatar_url: None,
            })
            .await
            .unwrap();

        let profile = service.profile(user.id).await.unwrap();
        assert_eq!(profile.user.nickname, "alice");
        assert_eq!(profile.stats.requester_order_count, 0);
        assert_eq!(profile.stats.runner_order_count, 0);

        let missing = service.profile(UserId::new()).await;
        assert!(matches!(missing, Err(DomainError::NotFound("user"))));
    }

    #[tokio::test]
    async fn update_preferences_accepts_both_shapes() {
        let store = MemoryStore::new();
        let service = UserService::new(store.clone());
        let user = service
            .create(NewUser {
                nickname: "alice".to_string(),
                avatar_url: None,
            })
            .await
            .unwrap();

        service
            .update_preferences(user.id, json!({"types": ["takeout"], "priceMax": 30}))
            .await
            .unwrap();
        service
            .update_preferences(user.id, json!(["legacy-tag"]))
            .await
            .unwrap();

        let stored = store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(stored.preferences, json!(["legacy-tag"]));
    }

    #[tokio::test]
    async fn update_preferences_rejects_malformed_blob() {
        let store = MemoryStore::new();
        let service = UserService::new(store.clone());
        let user = service
            .create(NewUser {
                nickname: "alice".to_string(),
                avatar_url: None,
            })
            .await
            .unwrap();

        let result = service.update_preferences(user.id, json!(42)).await;
        assert!(matches!(result, Err(DomainError::Validation(_))));

        // The stored blob is untouched.
        let stored = store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(stored.preferences, json!([]));
    }

    #[tokio::test]
    async fn update_profile_requires_existing_user() {
        let service = UserService::new(MemoryStore::new());
        let result = service
            .update_profile(UserId::new(), "new name".to_string(), None)
            .await;
        assert!(matches!(result, Err(DomainError::NotFound("user"))));
    }
}
