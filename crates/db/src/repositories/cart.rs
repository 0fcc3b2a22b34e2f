//! Cart repository.

use std::sync::Arc;

use crate::entities::{Cart, CartItem, cart, cart_item};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, sea_query::Expr,
};
use tienda_common::{AppError, AppResult};

/// Cart repository for database operations.
///
/// Covers carts and their line items. Total/version writes go through
/// [`Self::save_total`], which enforces optimistic concurrency.
#[derive(Clone)]
pub struct CartRepository {
    db: Arc<DatabaseConnection>,
}

impl CartRepository {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a cart by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<cart::Model>> {
        Cart::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a cart by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<cart::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("cart {id}")))
    }

    /// Find a user's shopping cart (the oldest one).
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Option<cart::Model>> {
        Cart::find()
            .filter(cart::Column::UserId.eq(user_id))
            .order_by_asc(cart::Column::CreatedAt)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all of a user's carts, oldest first.
    pub async fn find_all_by_user(&self, user_id: &str) -> AppResult<Vec<cart::Model>> {
        Cart::find()
            .filter(cart::Column::UserId.eq(user_id))
            .order_by_asc(cart::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user's cart by name.
    pub async fn find_by_user_and_name(
        &self,
        user_id: &str,
        name: &str,
    ) -> AppResult<Option<cart::Model>> {
        Cart::find()
            .filter(cart::Column::UserId.eq(user_id))
            .filter(cart::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new cart.
    pub async fn create(&self, model: cart::ActiveModel) -> AppResult<cart::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a cart (rename).
    pub async fn update(&self, model: cart::ActiveModel) -> AppResult<cart::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a cart. Line items cascade.
    pub async fn delete(&self, cart: cart::Model) -> AppResult<()> {
        cart.delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Persist a recomputed total, guarded by the version the caller read.
    ///
    /// Bumps `version` in the same UPDATE; a concurrent writer that got there
    /// first leaves the filter matching zero rows, which surfaces as
    /// [`AppError::Conflict`].
    pub async fn save_total(
        &self,
        cart_id: &str,
        expected_version: i32,
        total: Decimal,
    ) -> AppResult<()> {
        let result = Cart::update_many()
            .col_expr(cart::Column::Total, Expr::value(total))
            .col_expr(
                cart::Column::Version,
                Expr::col(cart::Column::Version).add(1),
            )
            .col_expr(
                cart::Column::UpdatedAt,
                Expr::value(chrono::Utc::now()),
            )
            .filter(cart::Column::Id.eq(cart_id))
            .filter(cart::Column::Version.eq(expected_version))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::Conflict(format!(
                "cart {cart_id} was modified concurrently"
            )));
        }
        Ok(())
    }

    // === Line items ===

    /// List a cart's line items, oldest first.
    pub async fn find_items(&self, cart_id: &str) -> AppResult<Vec<cart_item::Model>> {
        CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .order_by_asc(cart_item::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count a cart's line items.
    pub async fn count_items(&self, cart_id: &str) -> AppResult<u64> {
        CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the line item for a product/color pair.
    pub async fn find_item(
        &self,
        cart_id: &str,
        product_id: &str,
        color: &str,
    ) -> AppResult<Option<cart_item::Model>> {
        CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .filter(cart_item::Column::Color.eq(color))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a line item.
    pub async fn insert_item(&self, model: cart_item::ActiveModel) -> AppResult<cart_item::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a line item.
    pub async fn update_item(&self, model: cart_item::ActiveModel) -> AppResult<cart_item::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete all line items for a product, regardless of color. Returns the
    /// number of removed lines.
    pub async fn delete_items_by_product(
        &self,
        cart_id: &str,
        product_id: &str,
    ) -> AppResult<u64> {
        let result = CartItem::delete_many()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}
