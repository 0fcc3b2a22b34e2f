//! Order service.
//!
//! Checkout snapshots the cart's selected lines into order rows, holds the
//! money through the payment gateway, and applies stock in a second phase
//! after capture. The two phases are durable: a crash between them leaves a
//! `Procesando` order with `stock_reconciled = false`, and `reconcile` can be
//! re-run until it succeeds.

use sea_orm::Set;
use tienda_common::{AppError, AppResult, IdGenerator};
use tienda_db::{
    entities::{
        order::{self, OrderStatus},
        order_item,
    },
    repositories::{AddressRepository, CartRepository, OrderRepository, ProductRepository, StockDelta},
};

use crate::services::payment::PaymentService;

/// Order service for business logic.
#[derive(Clone)]
pub struct OrderService {
    order_repo: OrderRepository,
    cart_repo: CartRepository,
    address_repo: AddressRepository,
    product_repo: ProductRepository,
    gateway: PaymentService,
    currency: String,
    id_gen: IdGenerator,
}

/// An order with its snapshot line items.
#[derive(Debug)]
pub struct OrderView {
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

impl OrderService {
    /// Create a new order service.
    #[must_use]
    pub fn new(
        order_repo: OrderRepository,
        cart_repo: CartRepository,
        address_repo: AddressRepository,
        product_repo: ProductRepository,
        gateway: PaymentService,
        currency: String,
    ) -> Self {
        Self {
            order_repo,
            cart_repo,
            address_repo,
            product_repo,
            gateway,
            currency,
            id_gen: IdGenerator::new(),
        }
    }

    /// Start checkout: snapshot the cart's selected lines and create a
    /// payment hold for their total.
    ///
    /// Requires a default shipping address and at least one selected line.
    /// Stock is untouched until the payment is captured.
    pub async fn create(&self, user_id: &str) -> AppResult<OrderView> {
        let address = self
            .address_repo
            .find_default(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("default shipping address".to_string()))?;

        let cart = self
            .cart_repo
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("cart".to_string()))?;

        let selected: Vec<_> = self
            .cart_repo
            .find_items(&cart.id)
            .await?
            .into_iter()
            .filter(|item| item.selected)
            .collect();

        if selected.is_empty() {
            return Err(AppError::Validation(
                "No items selected for checkout".to_string(),
            ));
        }

        let total = selected.iter().map(|item| item.subtotal).sum();
        let intent = self.gateway.create_intent(total, &self.currency).await?;

        let now = chrono::Utc::now();
        let order_id = self.id_gen.generate();

        let order = self
            .order_repo
            .create(order::ActiveModel {
                id: Set(order_id.clone()),
                user_id: Set(user_id.to_string()),
                shipping_address: Set(serde_json::to_value(&address)
                    .map_err(|e| AppError::Internal(format!("Failed to snapshot address: {e}")))?),
                total: Set(total),
                payment_intent: Set(Some(intent.raw)),
                payment_id: Set(Some(intent.id)),
                status: Set(OrderStatus::Pendiente),
                stock_reconciled: Set(false),
                captured_at: Set(None),
                created_at: Set(now.into()),
                ..Default::default()
            })
            .await?;

        let items: Vec<order_item::ActiveModel> = selected
            .iter()
            .map(|item| order_item::ActiveModel {
                id: Set(self.id_gen.generate()),
                order_id: Set(order_id.clone()),
                product_id: Set(item.product_id.clone()),
                price: Set(item.price),
                color: Set(item.color.clone()),
                quantity: Set(item.quantity),
                subtotal: Set(item.subtotal),
                created_at: Set(now.into()),
            })
            .collect();
        self.order_repo.insert_items(items).await?;

        let items = self.order_repo.find_items(&order.id).await?;

        tracing::info!(order_id = %order.id, user_id, %total, "Order created");
        Ok(OrderView { order, items })
    }

    /// Capture the payment for an order, then reconcile stock.
    ///
    /// Orders already `Pagado` are rejected with a conflict so repeated
    /// captures never double-apply stock.
    pub async fn capture(&self, user_id: &str, payment_id: &str) -> AppResult<order::Model> {
        let order = self.get_by_payment(user_id, payment_id).await?;

        if order.status == OrderStatus::Pagado {
            return Err(AppError::Conflict(format!(
                "order {} is already paid",
                order.id
            )));
        }

        // Phase 1: capture the money and durably record it before touching
        // stock. Skipped if a previous attempt already got this far.
        let order = if order.captured_at.is_none() {
            let result = self.gateway.capture(payment_id).await?;
            tracing::info!(order_id = %order.id, status = %result.status, "Payment captured");

            let mut active: order::ActiveModel = order.into();
            active.status = Set(OrderStatus::Procesando);
            active.captured_at = Set(Some(chrono::Utc::now().into()));
            active.updated_at = Set(Some(chrono::Utc::now().into()));
            self.order_repo.update(active).await?
        } else {
            order
        };

        // Phase 2
        self.reconcile(&order.id).await
    }

    /// Apply stock/sold counters from an order's snapshot lines and mark it
    /// `Pagado`. Idempotent per order; re-runnable after a crash between the
    /// capture phases.
    pub async fn reconcile(&self, order_id: &str) -> AppResult<order::Model> {
        let order = self.order_repo.get_by_id(order_id).await?;

        if order.stock_reconciled {
            return Ok(order);
        }

        let deltas: Vec<StockDelta> = self
            .order_repo
            .find_items(order_id)
            .await?
            .into_iter()
            .map(|item| StockDelta {
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect();

        self.product_repo.adjust_stock_bulk(&deltas).await?;

        let mut active: order::ActiveModel = order.into();
        active.stock_reconciled = Set(true);
        active.status = Set(OrderStatus::Pagado);
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        let order = self.order_repo.update(active).await?;

        tracing::info!(order_id = %order.id, "Order reconciled");
        Ok(order)
    }

    /// Cancel an order. The gateway cancel is best-effort; a failure there is
    /// logged and the order is still marked `Cancelado`.
    pub async fn cancel(&self, user_id: &str, payment_id: &str) -> AppResult<order::Model> {
        let order = self.get_by_payment(user_id, payment_id).await?;

        if order.status == OrderStatus::Pagado {
            return Err(AppError::Conflict(format!(
                "order {} is already paid",
                order.id
            )));
        }

        if let Err(e) = self.gateway.cancel(payment_id).await {
            tracing::warn!(order_id = %order.id, error = %e, "Gateway cancel failed");
        }

        self.order_repo.set_status(order, OrderStatus::Cancelado).await
    }

    /// Admin: set any order of a user to any status.
    pub async fn update_status(
        &self,
        user_id: &str,
        payment_id: &str,
        status: OrderStatus,
    ) -> AppResult<order::Model> {
        let order = self.get_by_payment(user_id, payment_id).await?;
        self.order_repo.set_status(order, status).await
    }

    /// Get one of the caller's orders with its items.
    pub async fn get(&self, user_id: &str, order_id: &str) -> AppResult<OrderView> {
        let order = self.order_repo.get_by_id(order_id).await?;
        if order.user_id != user_id {
            return Err(AppError::Forbidden(
                "Order belongs to another user".to_string(),
            ));
        }
        let items = self.order_repo.find_items(&order.id).await?;
        Ok(OrderView { order, items })
    }

    /// List the caller's orders, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<order::Model>> {
        self.order_repo.find_by_user(user_id).await
    }

    /// Admin: list any user's orders.
    pub async fn list_by_user_id(&self, user_id: &str) -> AppResult<Vec<order::Model>> {
        self.order_repo.find_by_user(user_id).await
    }

    /// Admin: list every order.
    pub async fn list_all(&self) -> AppResult<Vec<order::Model>> {
        self.order_repo.find_all().await
    }

    async fn get_by_payment(&self, user_id: &str, payment_id: &str) -> AppResult<order::Model> {
        self.order_repo
            .find_by_user_and_payment(user_id, payment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order with payment {payment_id}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::payment::NoOpGateway;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;
    use std::sync::Arc;
    use tienda_db::entities::{address, cart, cart_item};

    fn create_test_address(id: &str, user_id: &str) -> address::Model {
        address::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            address_name: "home".to_string(),
            address_line1: "Av. Siempre Viva 742".to_string(),
            address_line2: None,
            city: "CDMX".to_string(),
            state: "CDMX".to_string(),
            country: "MX".to_string(),
            zipcode: "01000".to_string(),
            is_default: true,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_cart(id: &str, user_id: &str) -> cart::Model {
        cart::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            name: "Ana".to_string(),
            total: Decimal::new(20000, 2),
            version: 0,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_cart_item(id: &str, selected: bool) -> cart_item::Model {
        cart_item::Model {
            id: id.to_string(),
            cart_id: "cart1".to_string(),
            product_id: "p1".to_string(),
            price: Decimal::new(10000, 2),
            color: "rojo".to_string(),
            quantity: 2,
            selected,
            subtotal: Decimal::new(20000, 2),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_order(id: &str, status: OrderStatus, reconciled: bool) -> order::Model {
        order::Model {
            id: id.to_string(),
            user_id: "user1".to_string(),
            shipping_address: json!({"city": "CDMX"}),
            total: Decimal::new(20000, 2),
            payment_intent: None,
            payment_id: Some("PAY-1".to_string()),
            status,
            stock_reconciled: reconciled,
            captured_at: if status == OrderStatus::Pendiente {
                None
            } else {
                Some(Utc::now().into())
            },
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_order_item(id: &str, order_id: &str) -> order_item::Model {
        order_item::Model {
            id: id.to_string(),
            order_id: order_id.to_string(),
            product_id: "p1".to_string(),
            price: Decimal::new(10000, 2),
            color: "rojo".to_string(),
            quantity: 2,
            subtotal: Decimal::new(20000, 2),
            created_at: Utc::now().into(),
        }
    }

    fn create_service(db: Arc<sea_orm::DatabaseConnection>) -> OrderService {
        OrderService::new(
            OrderRepository::new(db.clone()),
            CartRepository::new(db.clone()),
            AddressRepository::new(db.clone()),
            ProductRepository::new(db),
            Arc::new(NoOpGateway),
            "MXN".to_string(),
        )
    }

    #[tokio::test]
    async fn test_create_without_default_address_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<address::Model>::new()])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service.create("user1").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_without_selected_items_rejected() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_address("a1", "user1")]])
                .append_query_results([[create_test_cart("cart1", "user1")]])
                .append_query_results([[create_test_cart_item("i1", false)]])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service.create("user1").await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_snapshots_selected_items() {
        let mut created = create_test_order("o1", OrderStatus::Pendiente, false);
        created.payment_intent = Some(json!({"status": "CREATED"}));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_address("a1", "user1")]])
                .append_query_results([[create_test_cart("cart1", "user1")]])
                .append_query_results([vec![
                    create_test_cart_item("i1", true),
                    create_test_cart_item("i2", false),
                ]])
                .append_query_results([[created]])
                .append_query_results([[create_test_order_item("oi1", "o1")]])
                .append_exec_results([
                    // order insert
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    // order_item insert_many
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );
        let service = create_service(db);

        let view = service.create("user1").await.unwrap();

        assert_eq!(view.order.status, OrderStatus::Pendiente);
        assert!(!view.order.stock_reconciled);
        assert_eq!(view.items.len(), 1);
    }

    #[tokio::test]
    async fn test_capture_paid_order_conflicts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_order("o1", OrderStatus::Pagado, true)]])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service.capture("user1", "PAY-1").await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_capture_runs_both_phases() {
        let pending = create_test_order("o1", OrderStatus::Pendiente, false);
        let processing = create_test_order("o1", OrderStatus::Procesando, false);
        let mut paid = create_test_order("o1", OrderStatus::Pagado, true);
        paid.stock_reconciled = true;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // capture: find_by_user_and_payment
                .append_query_results([[pending]])
                // phase 1 update returning
                .append_query_results([[processing.clone()]])
                // reconcile: get_by_id
                .append_query_results([[processing]])
                // reconcile: find_items
                .append_query_results([[create_test_order_item("oi1", "o1")]])
                // reconcile: update returning
                .append_query_results([[paid]])
                .append_exec_results([
                    // phase 1 order update
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    // adjust_stock_bulk
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    // reconcile order update
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );
        let service = create_service(db);

        let order = service.capture("user1", "PAY-1").await.unwrap();

        assert_eq!(order.status, OrderStatus::Pagado);
        assert!(order.stock_reconciled);
    }

    #[tokio::test]
    async fn test_reconcile_already_reconciled_is_noop() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_order("o1", OrderStatus::Pagado, true)]])
                .into_connection(),
        );
        let service = create_service(db);

        let order = service.reconcile("o1").await.unwrap();

        assert_eq!(order.status, OrderStatus::Pagado);
    }

    #[tokio::test]
    async fn test_cancel_marks_cancelled() {
        let pending = create_test_order("o1", OrderStatus::Pendiente, false);
        let mut cancelled = pending.clone();
        cancelled.status = OrderStatus::Cancelado;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending]])
                .append_query_results([[cancelled]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let service = create_service(db);

        let order = service.cancel("user1", "PAY-1").await.unwrap();

        assert_eq!(order.status, OrderStatus::Cancelado);
    }

    #[tokio::test]
    async fn test_get_foreign_order_forbidden() {
        let mut other = create_test_order("o1", OrderStatus::Pendiente, false);
        other.user_id = "user2".to_string();

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[other]])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service.get("user1", "o1").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
