//! Review submission and rating aggregation.

use chrono::Utc;
use common::{OrderId, ReviewId, Role, UserId};
use store::{Review, Store};

use crate::error::{DomainError, Result};

/// Input for submitting a review.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub order_id: OrderId,
    pub reviewer_id: UserId,
    pub target_id: UserId,
    /// The target's role on the order.
    pub role: Role,
    pub rating: i16,
    pub comment: Option<String>,
}

/// Records reviews and keeps per-role average ratings consistent.
pub struct ReviewService<S> {
    store: S,
}

impl<S: Store> ReviewService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Records a review and returns the target's recomputed average.
    ///
    /// The insert and the rating recompute are one atomic unit in the store;
    /// the average is always the unweighted mean over the full review set.
    #[tracing::instrument(skip(self, new_review), fields(order_id = %new_review.order_id))]
    pub async fn submit(&self, new_review: NewReview) -> Result<f64> {
        if !(1..=5).contains(&new_review.rating) {
            return Err(DomainError::Validation(
                "rating must be between 1 and 5".to_string(),
            ));
        }
        if self.store.find_order(new_review.order_id).await?.is_none() {
            return Err(DomainError::NotFound("order"));
        }

        let review = Review {
            id: ReviewId::new(),
            order_id: new_review.order_id,
            reviewer_id: new_review.reviewer_id,
            target_id: new_review.target_id,
            role: new_review.role,
            rating: new_review.rating,
            comment: new_review.comment,
            created_at: Utc::now(),
        };
        let average = self.store.record_review(&review).await?;
        metrics::counter!("reviews_recorded_total").increment(1);
        Ok(average)
    }

    /// Whether the user has already reviewed this order.
    pub async fn has_reviewed(&self, order_id: OrderId, user_id: UserId) -> Result<bool> {
        Ok(self.store.has_reviewed(order_id, user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use common::{OrderStatus, OrderType};
    use rust_decimal::Decimal;
    use store::{MemoryStore, Order, OrderRepository, User, UserRepository};

    use super::*;

    async fn seed_order(store: &MemoryStore, requester: UserId) -> OrderId {
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(),
            requester_id: requester,
            runner_id: None,
            order_type: OrderType::Errand,
            description: "print and deliver slides".to_string(),
            pickup_location: "print shop".to_string(),
            delivery_location: "room 204".to_string(),
            price: Decimal::from(6),
            requester_wechat: "wx".to_string(),
            status: OrderStatus::Confirmed,
            time_requirement: None,
            extra_needs: None,
            created_at: now,
            updated_at: now,
        };
        store.insert_order(&order).await.unwrap();
        order.id
    }

    fn review(order_id: OrderId, reviewer: UserId, target: UserId, rating: i16) -> NewReview {
        NewReview {
            order_id,
            reviewer_id: reviewer,
            target_id: target,
            role: Role::Runner,
            rating,
            comment: None,
        }
    }

    #[tokio::test]
    async fn average_is_the_exact_mean_of_all_ratings() {
        let store = MemoryStore::new();
        let service = ReviewService::new(store.clone());
        let target = User::new("bob", None);
        store.insert_user(&target).await.unwrap();
        let reviewer = UserId::new();

        let ratings: [i16; 4] = [5, 3, 4, 1];
        let mut last_average = 0.0;
        for rating in ratings {
            let order_id = seed_order(&store, reviewer).await;
            last_average = service
                .submit(review(order_id, reviewer, target.id, rating))
                .await
                .unwrap();
        }

        let expected = ratings.iter().map(|r| f64::from(*r)).sum::<f64>() / ratings.len() as f64;
        assert_eq!(last_average, expected);

        let stored = store.find_user(target.id).await.unwrap().unwrap();
        assert_eq!(stored.rating_as_runner, expected);
        assert_eq!(stored.rating_as_requester, 5.0);
    }

    #[tokio::test]
    async fn second_review_for_same_order_and_reviewer_is_rejected() {
        let store = MemoryStore::new();
        let service = ReviewService::new(store.clone());
        let target = User::new("bob", None);
        store.insert_user(&target).await.unwrap();
        let reviewer = UserId::new();
        let order_id = seed_order(&store, reviewer).await;

        service
            .submit(review(order_id, reviewer, target.id, 5))
            .await
            .unwrap();
        let result = service.submit(review(order_id, reviewer, target.id, 1)).await;
        assert!(matches!(result, Err(DomainError::DuplicateReview)));

        // The first review's effect is unchanged.
        let stored = store.find_user(target.id).await.unwrap().unwrap();
        assert_eq!(stored.rating_as_runner, 5.0);
    }

    #[tokio::test]
    async fn rating_outside_range_is_invalid() {
        let store = MemoryStore::new();
        let service = ReviewService::new(store.clone());
        let reviewer = UserId::new();
        let order_id = seed_order(&store, reviewer).await;

        for rating in [0, 6, -1] {
            let result = service
                .submit(review(order_id, reviewer, UserId::new(), rating))
                .await;
            assert!(matches!(result, Err(DomainError::Validation(_))));
        }
    }

    #[tokio::test]
    async fn review_requires_existing_order() {
        let service = ReviewService::new(MemoryStore::new());
        let result = service
            .submit(review(OrderId::new(), UserId::new(), UserId::new(), 4))
            .await;
        assert!(matches!(result, Err(DomainError::NotFound("order"))));
    }

    #[tokio::test]
    async fn has_reviewed_reflects_submissions() {
        let store = MemoryStore::new();
        let service = ReviewService::new(store.clone());
        let target = User::new("bob", None);
        store.insert_user(&target).await.unwrap();
        let reviewer = UserId::new();
        let order_id = seed_order(&store, reviewer).await;

        assert!(!service.has_reviewed(order_id, reviewer).await.unwrap());
        service
            .submit(review(order_id, reviewer, target.id, 4))
            .await
            .unwrap();
        assert!(service.has_reviewed(order_id, reviewer).await.unwrap());
        assert!(!service.has_reviewed(order_id, target.id).await.unwrap());
    }
}
