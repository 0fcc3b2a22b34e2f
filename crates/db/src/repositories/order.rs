//! Order repository.

use std::sync::Arc;

use crate::entities::{Order, OrderItem, order, order_item};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tienda_common::{AppError, AppResult};

/// Order repository for database operations.
#[derive(Clone)]
pub struct OrderRepository {
    db: Arc<DatabaseConnection>,
}

impl OrderRepository {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an order by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<order::Model>> {
        Order::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an order by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<order::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {id}")))
    }

    /// Find an order by owner and gateway payment ID.
    pub async fn find_by_user_and_payment(
        &self,
        user_id: &str,
        payment_id: &str,
    ) -> AppResult<Option<order::Model>> {
        Order::find()
            .filter(order::Column::UserId.eq(user_id))
            .filter(order::Column::PaymentId.eq(payment_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a user's orders, newest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<order::Model>> {
        Order::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List every order, newest first.
    pub async fn find_all(&self) -> AppResult<Vec<order::Model>> {
        Order::find()
            .order_by_desc(order::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new order.
    pub async fn create(&self, model: order::ActiveModel) -> AppResult<order::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an order.
    pub async fn update(&self, model: order::ActiveModel) -> AppResult<order::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Set the order status.
    pub async fn set_status(
        &self,
        order: order::Model,
        status: order::OrderStatus,
    ) -> AppResult<order::Model> {
        let mut active: order::ActiveModel = order.into();
        active.status = Set(status);
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert the snapshot line items for an order.
    pub async fn insert_items(&self, items: Vec<order_item::ActiveModel>) -> AppResult<()> {
        if items.is_empty() {
            return Ok(());
        }

        OrderItem::insert_many(items)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List an order's snapshot line items, oldest first.
    pub async fn find_items(&self, order_id: &str) -> AppResult<Vec<order_item::Model>> {
        OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_item::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::order::OrderStatus;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;
    use std::sync::Arc;

    fn create_test_order(id: &str, user_id: &str, status: OrderStatus) -> order::Model {
        order::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            shipping_address: json!({"city": "CDMX"}),
            total: Decimal::new(30000, 2),
            payment_intent: None,
            payment_id: Some("PAY-1".to_string()),
            status,
            stock_reconciled: false,
            captured_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_user_and_payment_found() {
        let order = create_test_order("o1", "user1", OrderStatus::Pendiente);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[order.clone()]])
                .into_connection(),
        );

        let repo = OrderRepository::new(db);
        let result = repo
            .find_by_user_and_payment("user1", "PAY-1")
            .await
            .unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().id, "o1");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found_returns_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<order::Model>::new()])
                .into_connection(),
        );

        let repo = OrderRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_set_status() {
        let order = create_test_order("o1", "user1", OrderStatus::Pendiente);
        let mut updated = order.clone();
        updated.status = OrderStatus::Cancelado;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[updated]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = OrderRepository::new(db);
        let result = repo.set_status(order, OrderStatus::Cancelado).await.unwrap();

        assert_eq!(result.status, OrderStatus::Cancelado);
    }

    #[tokio::test]
    async fn test_insert_items_empty_skips_query() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let repo = OrderRepository::new(db);
        repo.insert_items(vec![]).await.unwrap();
    }
}
