//! Order lifecycle operations and the notification fan-out.

use chrono::Utc;
use common::{OrderId, OrderStatus, OrderType, UserId};
use rust_decimal::Decimal;
use store::{Order, OrderChange, OrderFilter, OrderSummary, Store};

use crate::error::{DomainError, Result};
use crate::matching::Preference;
use crate::notify::Notifier;

/// Input for publishing an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub requester_id: UserId,
    pub order_type: OrderType,
    pub description: String,
    pub pickup_location: String,
    pub delivery_location: String,
    pub price: Decimal,
    pub requester_wechat: String,
    pub time_requirement: Option<String>,
    pub extra_needs: Option<String>,
}

/// Drives orders through their lifecycle.
///
/// Every transition is a conditional update in the store: it only succeeds
/// against a row that is still in the expected prior state, which is what
/// resolves concurrent accepts without explicit locking. Status and runner
/// assignment always change together.
pub struct OrderService<S> {
    store: S,
    notifier: Notifier<S>,
}

impl<S: Store> OrderService<S> {
    /// Creates a new order service over the given store.
    pub fn new(store: S) -> Self {
        let notifier = Notifier::new(store.clone());
        Self { store, notifier }
    }

    /// Publishes a new order and notifies matching runners.
    #[tracing::instrument(skip(self, new_order), fields(requester_id = %new_order.requester_id))]
    pub async fn create(&self, new_order: NewOrder) -> Result<Order> {
        validate(&new_order)?;

        if self.store.find_user(new_order.requester_id).await?.is_none() {
            return Err(DomainError::NotFound("requester"));
        }

        let now = Utc::now();
        let order = Order {
            id: OrderId::new(),
            requester_id: new_order.requester_id,
            runner_id: None,
            order_type: new_order.order_type,
            description: new_order.description,
            pickup_location: new_order.pickup_location,
            delivery_location: new_order.delivery_location,
            price: new_order.price,
            requester_wechat: new_order.requester_wechat,
            status: OrderStatus::Pending,
            time_requirement: new_order.time_requirement,
            extra_needs: new_order.extra_needs,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_order(&order).await?;
        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %order.id, "order published");

        self.notifier
            .send(
                order.requester_id,
                "Order published",
                &format!(
                    "Your order \"{}\" is live. Waiting for a runner to accept it.",
                    order.description
                ),
            )
            .await;

        self.recommend_to_runners(&order).await;

        Ok(order)
    }

    /// Loads one order.
    pub async fn get(&self, id: OrderId) -> Result<Order> {
        self.store
            .find_order(id)
            .await?
            .ok_or(DomainError::NotFound("order"))
    }

    /// Orders joined with requester display fields, newest first.
    pub async fn list(&self, filter: &OrderFilter) -> Result<Vec<OrderSummary>> {
        Ok(self.store.list_orders(filter).await?)
    }

    /// Applies a caller-requested status change, dispatching to the matching
    /// lifecycle operation.
    pub async fn set_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        runner_id: Option<UserId>,
    ) -> Result<Order> {
        match status {
            OrderStatus::Accepted => {
                let runner_id = runner_id.ok_or_else(|| {
                    DomainError::Validation("runner_id is required to accept an order".to_string())
                })?;
                self.accept(id, runner_id).await
            }
            OrderStatus::CompletedByRunner => self.complete(id).await,
            OrderStatus::Confirmed => self.confirm(id).await,
            OrderStatus::Cancelled => self.cancel(id).await,
            OrderStatus::Pending => Err(DomainError::Validation(
                "orders cannot be reset to pending directly".to_string(),
            )),
        }
    }

    /// Assigns a runner to a pending order.
    ///
    /// The update only succeeds against a still-pending row, so of two
    /// concurrent accepts exactly one wins; the loser gets [`DomainError::Conflict`].
    #[tracing::instrument(skip(self))]
    pub async fn accept(&self, id: OrderId, runner_id: UserId) -> Result<Order> {
        let runner = self
            .store
            .find_user(runner_id)
            .await?
            .ok_or(DomainError::NotFound("runner"))?;

        let updated = self
            .store
            .transition_order(id, &[OrderStatus::Pending], OrderChange::accept(runner_id))
            .await?;
        let Some(order) = updated else {
            return Err(self.transition_conflict(id, "accept").await?);
        };
        metrics::counter!("orders_accepted_total").increment(1);

        self.notifier
            .send(
                order.requester_id,
                "Order accepted",
                &format!("{} accepted your order.", runner.nickname),
            )
            .await;
        Ok(order)
    }

    /// Runner marks the order delivered.
    #[tracing::instrument(skip(self))]
    pub async fn complete(&self, id: OrderId) -> Result<Order> {
        let updated = self
            .store
            .transition_order(
                id,
                &[OrderStatus::Accepted],
                OrderChange::to(OrderStatus::CompletedByRunner),
            )
            .await?;
        let Some(order) = updated else {
            return Err(self.transition_conflict(id, "complete").await?);
        };

        self.notifier
            .send(
                order.requester_id,
                "Order delivered",
                "The runner marked your order as delivered. Please confirm completion.",
            )
            .await;
        Ok(order)
    }

    /// Requester confirms completion; the order reaches its happy terminal
    /// state.
    #[tracing::instrument(skip(self))]
    pub async fn confirm(&self, id: OrderId) -> Result<Order> {
        let updated = self
            .store
            .transition_order(
                id,
                &[OrderStatus::CompletedByRunner],
                OrderChange::to(OrderStatus::Confirmed),
            )
            .await?;
        let Some(order) = updated else {
            return Err(self.transition_conflict(id, "confirm").await?);
        };
        metrics::counter!("orders_confirmed_total").increment(1);

        if let Some(runner_id) = order.runner_id {
            self.notifier
                .send(
                    runner_id,
                    "Order completed",
                    "The requester confirmed completion. Contact them to settle the payment.",
                )
                .await;
        }
        Ok(order)
    }

    /// Cancels a pending or accepted order.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, id: OrderId) -> Result<Order> {
        let updated = self
            .store
            .transition_order(
                id,
                &[OrderStatus::Pending, OrderStatus::Accepted],
                OrderChange::to(OrderStatus::Cancelled),
            )
            .await?;
        let Some(order) = updated else {
            return Err(self.transition_conflict(id, "cancel").await?);
        };
        metrics::counter!("orders_cancelled_total").increment(1);

        if let Some(runner_id) = order.runner_id {
            self.notifier
                .send(
                    runner_id,
                    "Order cancelled",
                    "The requester cancelled the order.",
                )
                .await;
        }
        self.notifier
            .send(
                order.requester_id,
                "Order cancelled",
                "Your order has been cancelled.",
            )
            .await;
        Ok(order)
    }

    /// The assigned runner gives the task back; the order returns to the
    /// lobby with the runner cleared.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_acceptance(&self, id: OrderId, runner_id: UserId) -> Result<Order> {
        let updated = self
            .store
            .transition_order(id, &[OrderStatus::Accepted], OrderChange::release(runner_id))
            .await?;
        let Some(order) = updated else {
            // Work out which guard failed.
            return Err(match self.store.find_order(id).await? {
                None => DomainError::NotFound("order"),
                Some(order)
                    if order.status == OrderStatus::Accepted
                        && order.runner_id != Some(runner_id) =>
                {
                    DomainError::Unauthorized("only the assigned runner can cancel an acceptance")
                }
                Some(order) => DomainError::Conflict {
                    current: order.status,
                    action: "release",
                },
            });
        };

        self.notifier
            .send(
                order.requester_id,
                "Runner withdrew",
                "The runner gave up the task. Your order is back in the lobby.",
            )
            .await;
        Ok(order)
    }

    /// Runs the preference matcher over every other user and notifies the
    /// matches. Failures are isolated per candidate: one unreadable blob or
    /// failed insert never stops the rest of the pass.
    async fn recommend_to_runners(&self, order: &Order) {
        let candidates = match self.store.match_candidates(order.requester_id).await {
            Ok(candidates) => candidates,
            Err(error) => {
                tracing::warn!(%error, "failed to load candidates for matching");
                return;
            }
        };

        for candidate in candidates {
            let preference = match Preference::parse(&candidate.preferences) {
                Ok(preference) => preference,
                Err(error) => {
                    tracing::debug!(
                        user_id = %candidate.user_id,
                        %error,
                        "skipping candidate with unreadable preference blob"
                    );
                    continue;
                }
            };

            if preference.matches(order.order_type, order.price) {
                self.notifier
                    .send(
                        candidate.user_id,
                        "New task recommendation",
                        &format!(
                            "A task matching your preferences was just posted: {}",
                            order.description
                        ),
                    )
                    .await;
                metrics::counter!("orders_match_notifications_total").increment(1);
            }
        }
    }

    /// Explains a failed guarded update: the order is either gone or in the
    /// wrong state.
    async fn transition_conflict(&self, id: OrderId, action: &'static str) -> Result<DomainError> {
        Ok(match self.store.find_order(id).await? {
            None => DomainError::NotFound("order"),
            Some(order) => DomainError::Conflict {
                current: order.status,
                action,
            },
        })
    }
}

fn validate(new_order: &NewOrder) -> Result<()> {
    if new_order.price <= Decimal::ZERO {
        return Err(DomainError::Validation(
            "price must be positive".to_string(),
        ));
    }
    for (field, value) in [
        ("description", &new_order.description),
        ("pickup_location", &new_order.pickup_location),
        ("delivery_location", &new_order.delivery_location),
        ("requester_wechat", &new_order.requester_wechat),
    ] {
        if value.trim().is_empty() {
            return Err(DomainError::Validation(format!(
                "{field} must not be empty"
            )));
        }
    }
    Ok(())
}
