//! Best-effort user notifications.

use common::{NotificationId, UserId};
use store::{Notification, NotificationRepository};

use crate::error::{DomainError, Result};

/// Creates and reads user-facing notifications.
///
/// Creation is best-effort, at-most-once: a failed insert is logged and
/// swallowed so the caller's primary operation (order creation, a status
/// change) never fails because a convenience message could not be recorded.
#[derive(Clone)]
pub struct Notifier<S> {
    store: S,
}

impl<S: NotificationRepository> Notifier<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Fire-and-forget creation of a notification.
    pub async fn send(&self, user_id: UserId, title: &str, message: &str) {
        let notification = Notification::new(user_id, title, message);
        if let Err(error) = self.store.insert_notification(&notification).await {
            tracing::warn!(%user_id, %error, "failed to record notification");
        }
    }

    /// Returns the user's notifications, newest first.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Notification>> {
        Ok(self.store.list_notifications(user_id).await?)
    }

    /// Marks one notification as read.
    pub async fn mark_read(&self, id: NotificationId) -> Result<()> {
        if self.store.mark_notification_read(id).await? {
            Ok(())
        } else {
            Err(DomainError::NotFound("notification"))
        }
    }
}

#[cfg(test)]
mod tests {
    use store::{MemoryStore, NotificationRepository};

    use super::*;

    #[tokio::test]
    async fn send_records_an_unread_notification() {
        let store = MemoryStore::new();
        let notifier = Notifier::new(store.clone());
        let user = UserId::new();

        notifier.send(user, "Order published", "it is live").await;

        let listed = store.list_notifications(user).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Order published");
        assert!(!listed[0].is_read);
    }

    #[tokio::test]
    async fn mark_read_flags_the_row() {
        let store = MemoryStore::new();
        let notifier = Notifier::new(store.clone());
        let user = UserId::new();
        notifier.send(user, "t", "m").await;

        let id = notifier.list(user).await.unwrap()[0].id;
        notifier.mark_read(id).await.unwrap();

        assert!(notifier.list(user).await.unwrap()[0].is_read);
    }

    #[tokio::test]
    async fn mark_read_unknown_id_is_not_found() {
        let notifier = Notifier::new(MemoryStore::new());
        let result = notifier.mark_read(NotificationId::new()).await;
        assert!(matches!(result, Err(DomainError::NotFound("notification"))));
    }
}
