use async_trait::async_trait;
use common::{NotificationId, OrderId, OrderStatus, Role, UserId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::model::{
    MatchCandidate, Notification, Order, OrderChange, OrderFilter, OrderSummary, Review,
    RunnerChange, User, UserStats,
};
use crate::repository::{
    NotificationRepository, OrderRepository, ReviewRepository, UserRepository,
};

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_user(row: &PgRow) -> Result<User> {
        Ok(User {
            id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
            nickname: row.try_get("nickname")?,
            avatar_url: row.try_get("avatar_url")?,
            rating_as_requester: row.try_get("rating_as_requester")?,
            rating_as_runner: row.try_get("rating_as_runner")?,
            preferences: row.try_get("preferences")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_order(row: &PgRow) -> Result<Order> {
        let order_type: String = row.try_get("order_type")?;
        let status: String = row.try_get("status")?;
        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            requester_id: UserId::from_uuid(row.try_get::<Uuid, _>("requester_id")?),
            runner_id: row
                .try_get::<Option<Uuid>, _>("runner_id")?
                .map(UserId::from_uuid),
            order_type: order_type
                .parse()
                .map_err(|e: common::ParseOrderTypeError| StoreError::Decode(e.to_string()))?,
            description: row.try_get("description")?,
            pickup_location: row.try_get("pickup_location")?,
            delivery_location: row.try_get("delivery_location")?,
            price: row.try_get("price")?,
            requester_wechat: row.try_get("requester_wechat")?,
            status: status
                .parse()
                .map_err(|e: common::ParseOrderStatusError| StoreError::Decode(e.to_string()))?,
            time_requirement: row.try_get("time_requirement")?,
            extra_needs: row.try_get("extra_needs")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_notification(row: &PgRow) -> Result<Notification> {
        Ok(Notification {
            id: NotificationId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            title: row.try_get("title")?,
            message: row.try_get("message")?,
            is_read: row.try_get("is_read")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl UserRepository for PostgresStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, nickname, avatar_url, rating_as_requester, rating_as_runner, preferences, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.nickname)
        .bind(&user.avatar_url)
        .bind(user.rating_as_requester)
        .bind(user.rating_as_runner)
        .bind(&user.preferences)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn list_recent_users(&self, limit: i64) -> Result<Vec<User>> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY created_at DESC LIMIT $1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Self::row_to_user).collect()
    }

    async fn update_profile(
        &self,
        id: UserId,
        nickname: &str,
        avatar_url: Option<&str>,
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET nickname = $1, avatar_url = $2 WHERE id = $3")
            .bind(nickname)
            .bind(avatar_url)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_preferences(
        &self,
        id: UserId,
        preferences: &serde_json::Value,
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET preferences = $1 WHERE id = $2")
            .bind(preferences)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn match_candidates(&self, exclude: UserId) -> Result<Vec<MatchCandidate>> {
        let rows = sqlx::query("SELECT id, preferences FROM users WHERE id != $1")
            .bind(exclude.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| {
                Ok(MatchCandidate {
                    user_id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
                    preferences: row.try_get("preferences")?,
                })
            })
            .collect()
    }

    async fn user_stats(&self, id: UserId) -> Result<UserStats> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM orders WHERE requester_id = $1) AS requester_order_count,
                (SELECT COUNT(*) FROM orders
                    WHERE runner_id = $1 AND status IN ('completed_by_runner', 'confirmed')
                ) AS runner_order_count,
                (SELECT COUNT(*) FROM reviews WHERE target_id = $1 AND role = 'requester') AS requester_review_count,
                (SELECT COUNT(*) FROM reviews WHERE target_id = $1 AND role = 'runner') AS runner_review_count
            "#,
        )
        .bind(id.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        Ok(UserStats {
            requester_order_count: row.try_get("requester_order_count")?,
            runner_order_count: row.try_get("runner_order_count")?,
            requester_review_count: row.try_get("requester_review_count")?,
            runner_review_count: row.try_get("runner_review_count")?,
        })
    }
}

#[async_trait]
impl OrderRepository for PostgresStore {
    async fn insert_order(&self, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, requester_id, runner_id, order_type, description,
                                pickup_location, delivery_location, price, requester_wechat,
                                status, time_requirement, extra_needs, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.requester_id.as_uuid())
        .bind(order.runner_id.as_ref().map(UserId::as_uuid))
        .bind(order.order_type.as_str())
        .bind(&order.description)
        .bind(&order.pickup_location)
        .bind(&order.delivery_location)
        .bind(order.price)
        .bind(&order.requester_wechat)
        .bind(order.status.as_str())
        .bind(&order.time_requirement)
        .bind(&order.extra_needs)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_order).transpose()
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<OrderSummary>> {
        let mut sql = String::from(
            "SELECT orders.*, users.nickname AS requester_name, users.avatar_url AS requester_avatar \
             FROM orders JOIN users ON users.id = orders.requester_id WHERE 1=1",
        );
        let mut param_count = 0;

        if filter.status.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND orders.status = ${param_count}"));
        }
        if let Some((role, _)) = filter.participant {
            param_count += 1;
            match role {
                Role::Requester => sql.push_str(&format!(" AND orders.requester_id = ${param_count}")),
                Role::Runner => sql.push_str(&format!(" AND orders.runner_id = ${param_count}")),
            }
        }
        sql.push_str(" ORDER BY orders.created_at DESC");

        let mut query = sqlx::query(&sql);
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }
        if let Some((_, user_id)) = filter.participant {
            query = query.bind(user_id.as_uuid());
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                Ok(OrderSummary {
                    order: Self::row_to_order(row)?,
                    requester_name: row.try_get("requester_name")?,
                    requester_avatar: row.try_get("requester_avatar")?,
                })
            })
            .collect()
    }

    async fn transition_order(
        &self,
        id: OrderId,
        from: &[OrderStatus],
        change: OrderChange,
    ) -> Result<Option<Order>> {
        let mut sql = String::from("UPDATE orders SET updated_at = now(), status = $1");
        let mut param_count = 1;

        match change.runner {
            RunnerChange::Keep => {}
            RunnerChange::Assign(_) => {
                param_count += 1;
                sql.push_str(&format!(", runner_id = ${param_count}"));
            }
            RunnerChange::Clear => sql.push_str(", runner_id = NULL"),
        }

        param_count += 1;
        sql.push_str(&format!(" WHERE id = ${param_count}"));
        param_count += 1;
        sql.push_str(&format!(" AND status = ANY(${param_count})"));
        if change.expected_runner.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND runner_id = ${param_count}"));
        }
        sql.push_str(" RETURNING *");

        let from_states: Vec<String> = from.iter().map(|s| s.as_str().to_string()).collect();

        let mut query = sqlx::query(&sql).bind(change.status.as_str());
        if let RunnerChange::Assign(runner) = change.runner {
            query = query.bind(runner.as_uuid());
        }
        query = query.bind(id.as_uuid()).bind(from_states);
        if let Some(expected) = change.expected_runner {
            query = query.bind(expected.as_uuid());
        }

        let row = query.fetch_optional(&self.pool).await?;
        row.as_ref().map(Self::row_to_order).transpose()
    }
}

#[async_trait]
impl ReviewRepository for PostgresStore {
    async fn record_review(&self, review: &Review) -> Result<f64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO reviews (id, order_id, reviewer_id, target_id, role, rating, comment, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(review.id.as_uuid())
        .bind(review.order_id.as_uuid())
        .bind(review.reviewer_id.as_uuid())
        .bind(review.target_id.as_uuid())
        .bind(review.role.as_str())
        .bind(review.rating)
        .bind(&review.comment)
        .bind(review.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            // The unique index on (order_id, reviewer_id) is the duplicate check.
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("reviews_order_reviewer_key")
            {
                return StoreError::DuplicateReview;
            }
            StoreError::Database(e)
        })?;

        let average: f64 = sqlx::query_scalar(
            "SELECT AVG(rating)::float8 FROM reviews WHERE target_id = $1 AND role = $2",
        )
        .bind(review.target_id.as_uuid())
        .bind(review.role.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let column = match review.role {
            Role::Requester => "rating_as_requester",
            Role::Runner => "rating_as_runner",
        };
        sqlx::query(&format!("UPDATE users SET {column} = $1 WHERE id = $2"))
            .bind(average)
            .bind(review.target_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(average)
    }

    async fn has_reviewed(&self, order_id: OrderId, reviewer_id: UserId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reviews WHERE order_id = $1 AND reviewer_id = $2)",
        )
        .bind(order_id.as_uuid())
        .bind(reviewer_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

#[async_trait]
impl NotificationRepository for PostgresStore {
    async fn insert_notification(&self, notification: &Notification) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, title, message, is_read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(notification.id.as_uuid())
        .bind(notification.user_id.as_uuid())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.is_read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_notifications(&self, user_id: UserId) -> Result<Vec<Notification>> {
        let rows = sqlx::query(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_notification).collect()
    }

    async fn mark_notification_read(&self, id: NotificationId) -> Result<bool> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
