//! Integration tests driving the services together over the in-memory store.

use common::{OrderStatus, OrderType, Role, UserId};
use domain::{NewOrder, NewReview, NewUser, OrderService, ReviewService, UserService};
use rust_decimal::Decimal;
use serde_json::json;
use store::{MemoryStore, NotificationRepository, OrderFilter};

struct World {
    store: MemoryStore,
    users: UserService<MemoryStore>,
    orders: OrderService<MemoryStore>,
    reviews: ReviewService<MemoryStore>,
}

impl World {
    fn new() -> Self {
        let store = MemoryStore::new();
        Self {
            users: UserService::new(store.clone()),
            orders: OrderService::new(store.clone()),
            reviews: ReviewService::new(store.clone()),
            store,
        }
    }

    async fn user(&self, nickname: &str) -> UserId {
        self.users
            .create(NewUser {
                nickname: nickname.to_string(),
                avatar_url: None,
            })
            .await
            .unwrap()
            .id
    }

    fn order_input(&self, requester_id: UserId, price: Decimal) -> NewOrder {
        NewOrder {
            requester_id,
            order_type: OrderType::Takeout,
            description: "bubble tea, no ice".to_string(),
            pickup_location: "canteen 1".to_string(),
            delivery_location: "dorm 7-302".to_string(),
            price,
            requester_wechat: "wx_req".to_string(),
            time_requirement: Some("within the hour".to_string()),
            extra_needs: None,
        }
    }
}

#[tokio::test]
async fn full_run_with_reviews_on_both_sides() {
    let world = World::new();
    let requester = world.user("alice").await;
    let runner = world.user("bob").await;

    let order = world
        .orders
        .create(world.order_input(requester, Decimal::new(1550, 2)))
        .await
        .unwrap();

    world.orders.accept(order.id, runner).await.unwrap();
    world.orders.complete(order.id).await.unwrap();
    let confirmed = world.orders.confirm(order.id).await.unwrap();
    assert_eq!(confirmed.status, OrderStatus::Confirmed);

    // Requester rates the runner, runner rates the requester.
    let runner_avg = world
        .reviews
        .submit(NewReview {
            order_id: order.id,
            reviewer_id: requester,
            target_id: runner,
            role: Role::Runner,
            rating: 4,
            comment: Some("fast".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(runner_avg, 4.0);

    let requester_avg = world
        .reviews
        .submit(NewReview {
            order_id: order.id,
            reviewer_id: runner,
            target_id: requester,
            role: Role::Requester,
            rating: 5,
            comment: None,
        })
        .await
        .unwrap();
    assert_eq!(requester_avg, 5.0);

    // Both submissions are visible, and each party's profile reflects them.
    assert!(world.reviews.has_reviewed(order.id, requester).await.unwrap());
    assert!(world.reviews.has_reviewed(order.id, runner).await.unwrap());

    let runner_profile = world.users.profile(runner).await.unwrap();
    assert_eq!(runner_profile.user.rating_as_runner, 4.0);
    assert_eq!(runner_profile.stats.runner_order_count, 1);
    assert_eq!(runner_profile.stats.runner_review_count, 1);

    let requester_profile = world.users.profile(requester).await.unwrap();
    assert_eq!(requester_profile.user.rating_as_requester, 5.0);
    assert_eq!(requester_profile.stats.requester_order_count, 1);
}

#[tokio::test]
async fn averages_track_every_review_exactly() {
    let world = World::new();
    let runner = world.user("bob").await;

    let ratings: [i16; 5] = [5, 5, 3, 2, 4];
    let mut last = 0.0;
    for (i, rating) in ratings.iter().enumerate() {
        let requester = world.user(&format!("req{i}")).await;
        let order = world
            .orders
            .create(world.order_input(requester, Decimal::from(10)))
            .await
            .unwrap();
        world.orders.accept(order.id, runner).await.unwrap();
        world.orders.complete(order.id).await.unwrap();
        world.orders.confirm(order.id).await.unwrap();

        last = world
            .reviews
            .submit(NewReview {
                order_id: order.id,
                reviewer_id: requester,
                target_id: runner,
                role: Role::Runner,
                rating: *rating,
                comment: None,
            })
            .await
            .unwrap();
    }

    let expected = ratings.iter().map(|r| f64::from(*r)).sum::<f64>() / ratings.len() as f64;
    assert_eq!(last, expected);
    let profile = world.users.profile(runner).await.unwrap();
    assert_eq!(profile.user.rating_as_runner, expected);
}

#[tokio::test]
async fn published_order_reaches_matching_runners_and_the_lobby() {
    let world = World::new();
    let requester = world.user("alice").await;
    let matching = world.user("bob").await;
    let indifferent = world.user("carol").await;

    world
        .users
        .update_preferences(matching, json!({"types": ["takeout"], "priceMin": 10, "priceMax": 30}))
        .await
        .unwrap();

    let order = world
        .orders
        .create(world.order_input(requester, Decimal::new(1550, 2)))
        .await
        .unwrap();

    // Lobby listing carries the requester display fields.
    let lobby = world
        .orders
        .list(&OrderFilter {
            status: Some(OrderStatus::Pending),
            participant: None,
        })
        .await
        .unwrap();
    assert_eq!(lobby.len(), 1);
    assert_eq!(lobby[0].order.id, order.id);
    assert_eq!(lobby[0].requester_name, "alice");
    assert_eq!(lobby[0].order.price, Decimal::new(1550, 2));

    let matched_inbox = world.store.list_notifications(matching).await.unwrap();
    assert!(matched_inbox.iter().any(|n| n.title == "New task recommendation"));
    assert!(world.store.list_notifications(indifferent).await.unwrap().is_empty());

    // After an accept, the runner's task list shows the order.
    world.orders.accept(order.id, matching).await.unwrap();
    let runs = world
        .orders
        .list(&OrderFilter {
            status: None,
            participant: Some((Role::Runner, matching)),
        })
        .await
        .unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].order.status, OrderStatus::Accepted);
}

#[tokio::test]
async fn withdrawal_and_cancellation_round_trip() {
    let world = World::new();
    let requester = world.user("alice").await;
    let runner = world.user("bob").await;

    let order = world
        .orders
        .create(world.order_input(requester, Decimal::from(12)))
        .await
        .unwrap();

    world.orders.accept(order.id, runner).await.unwrap();
    world.orders.cancel_acceptance(order.id, runner).await.unwrap();

    // Back in the lobby; a later cancel is final.
    let reopened = world.orders.get(order.id).await.unwrap();
    assert_eq!(reopened.status, OrderStatus::Pending);
    assert_eq!(reopened.runner_id, None);

    world.orders.cancel(order.id).await.unwrap();
    let result = world.orders.accept(order.id, runner).await;
    assert!(result.is_err());
}
