//! Product repository.

use std::sync::Arc;

use crate::entities::{Product, product};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};
use tienda_common::{AppError, AppResult};

/// A stock adjustment applied when an order is captured.
#[derive(Debug, Clone)]
pub struct StockDelta {
    /// Product to adjust.
    pub product_id: String,
    /// Units to subtract from stock and add to sold.
    pub quantity: i32,
}

/// Catalog search criteria. Every field is optional; set fields are ANDed.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<String>,
    pub brand: Option<String>,
    /// Matched against the `colors` JSON array.
    pub color: Option<String>,
    /// Matched against the `tags` JSON array.
    pub tag: Option<String>,
    /// Substring match on name or description.
    pub keyword: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

/// Product repository for database operations.
#[derive(Clone)]
pub struct ProductRepository {
    db: Arc<DatabaseConnection>,
}

impl ProductRepository {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a product by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<product::Model>> {
        Product::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a product by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<product::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ProductNotFound(id.to_string()))
    }

    /// Find a product by name and brand.
    pub async fn find_by_name_and_brand(
        &self,
        name: &str,
        brand: &str,
    ) -> AppResult<Option<product::Model>> {
        Product::find()
            .filter(product::Column::Name.eq(name))
            .filter(product::Column::Brand.eq(brand))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List products matching the filter, newest first (paginated).
    pub async fn find_filtered(
        &self,
        filter: &ProductFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<product::Model>> {
        let mut query = Product::find();

        if let Some(category_id) = &filter.category_id {
            query = query.filter(product::Column::CategoryId.eq(category_id.as_str()));
        }
        if let Some(brand) = &filter.brand {
            query = query.filter(product::Column::Brand.eq(brand.as_str()));
        }
        if let Some(color) = &filter.color {
            query = query.filter(Expr::cust_with_values(
                "colors @> ?::jsonb",
                [serde_json::json!([color]).to_string()],
            ));
        }
        if let Some(tag) = &filter.tag {
            query = query.filter(Expr::cust_with_values(
                "tags @> ?::jsonb",
                [serde_json::json!([tag]).to_string()],
            ));
        }
        if let Some(keyword) = &filter.keyword {
            query = query.filter(
                Condition::any()
                    .add(product::Column::Name.contains(keyword))
                    .add(product::Column::Description.contains(keyword)),
            );
        }
        if let Some(min_price) = filter.min_price {
            query = query.filter(product::Column::Price.gte(min_price));
        }
        if let Some(max_price) = filter.max_price {
            query = query.filter(product::Column::Price.lte(max_price));
        }

        query
            .order_by_desc(product::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new product.
    pub async fn create(&self, model: product::ActiveModel) -> AppResult<product::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a product.
    pub async fn update(&self, model: product::ActiveModel) -> AppResult<product::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a product. Ratings and cart items cascade.
    pub async fn delete(&self, product: product::Model) -> AppResult<()> {
        product
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Apply stock adjustments for captured order lines, one atomic UPDATE per
    /// product (`stock - qty`, `sold + qty`), no fetch.
    pub async fn adjust_stock_bulk(&self, deltas: &[StockDelta]) -> AppResult<()> {
        for delta in deltas {
            Product::update_many()
                .col_expr(
                    product::Column::Stock,
                    Expr::col(product::Column::Stock).sub(delta.quantity),
                )
                .col_expr(
                    product::Column::Sold,
                    Expr::col(product::Column::Sold).add(delta.quantity),
                )
                .filter(product::Column::Id.eq(delta.product_id.as_str()))
                .exec(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }
}
