//! Address repository.

use std::sync::Arc;

use crate::entities::{Address, address};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, sea_query::Expr,
};
use tienda_common::{AppError, AppResult};

/// Address repository for database operations.
#[derive(Clone)]
pub struct AddressRepository {
    db: Arc<DatabaseConnection>,
}

impl AddressRepository {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an address by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<address::Model>> {
        Address::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an address by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<address::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("address {id}")))
    }

    /// List a user's addresses, newest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<address::Model>> {
        Address::find()
            .filter(address::Column::UserId.eq(user_id))
            .order_by_desc(address::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user's default address.
    pub async fn find_default(&self, user_id: &str) -> AppResult<Option<address::Model>> {
        Address::find()
            .filter(address::Column::UserId.eq(user_id))
            .filter(address::Column::IsDefault.eq(true))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user's address by label.
    pub async fn find_by_name(
        &self,
        user_id: &str,
        address_name: &str,
    ) -> AppResult<Option<address::Model>> {
        Address::find()
            .filter(address::Column::UserId.eq(user_id))
            .filter(address::Column::AddressName.eq(address_name))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Clear the default flag on all of a user's addresses
    /// (single UPDATE query, no fetch).
    pub async fn clear_defaults(&self, user_id: &str) -> AppResult<()> {
        Address::update_many()
            .col_expr(address::Column::IsDefault, Expr::value(false))
            .filter(address::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Create a new address.
    pub async fn create(&self, model: address::ActiveModel) -> AppResult<address::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an address.
    pub async fn update(&self, model: address::ActiveModel) -> AppResult<address::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark one address as the default.
    pub async fn set_default(&self, address: address::Model) -> AppResult<address::Model> {
        let mut active: address::ActiveModel = address.into();
        active.is_default = Set(true);
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete an address.
    pub async fn delete(&self, address: address::Model) -> AppResult<()> {
        address
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
