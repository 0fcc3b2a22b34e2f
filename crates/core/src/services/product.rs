//! Product service.

use rust_decimal::Decimal;
use sea_orm::Set;
use serde::Deserialize;
use tienda_common::{AppError, AppResult, IdGenerator};
use tienda_db::{
    entities::{
        product::{self, ProductState},
        rating,
    },
    repositories::{CategoryRepository, ProductFilter, ProductRepository, RatingRepository},
};
use validator::Validate;

/// Default page size for product listings.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Upper bound on a listing page.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Product service for business logic.
#[derive(Clone)]
pub struct ProductService {
    product_repo: ProductRepository,
    category_repo: CategoryRepository,
    rating_repo: RatingRepository,
    id_gen: IdGenerator,
}

/// Input for creating a product.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 128))]
    pub name: String,

    #[validate(length(min = 1, max = 4096))]
    pub description: String,

    pub price: Decimal,

    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default)]
    pub colors: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    pub category_id: String,

    #[validate(length(min = 1, max = 64))]
    pub brand: String,

    pub stock: i32,
}

/// Input for updating a product.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 4096))]
    pub description: Option<String>,

    pub price: Option<Decimal>,

    pub images: Option<Vec<String>>,

    pub colors: Option<Vec<String>>,

    pub tags: Option<Vec<String>>,

    pub category_id: Option<String>,

    #[validate(length(min = 1, max = 64))]
    pub brand: Option<String>,

    pub stock: Option<i32>,

    pub state: Option<ProductState>,
}

impl ProductService {
    /// Create a new product service.
    #[must_use]
    pub fn new(
        product_repo: ProductRepository,
        category_repo: CategoryRepository,
        rating_repo: RatingRepository,
    ) -> Self {
        Self {
            product_repo,
            category_repo,
            rating_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a product. `(name, brand)` is unique, the category must exist,
    /// and price and stock must be non-negative.
    pub async fn create(&self, input: CreateProductInput) -> AppResult<product::Model> {
        input.validate()?;

        if input.price < Decimal::ZERO {
            return Err(AppError::Validation(
                "Price must not be negative".to_string(),
            ));
        }
        if input.stock < 0 {
            return Err(AppError::Validation(
                "Stock must not be negative".to_string(),
            ));
        }

        self.category_repo.get_by_id(&input.category_id).await?;

        if self
            .product_repo
            .find_by_name_and_brand(&input.name, &input.brand)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "Product '{}' by '{}' already exists",
                input.name, input.brand
            )));
        }

        let model = product::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name),
            description: Set(input.description),
            price: Set(input.price),
            images: Set(serde_json::json!(input.images)),
            colors: Set(serde_json::json!(input.colors)),
            tags: Set(serde_json::json!(input.tags)),
            category_id: Set(input.category_id),
            brand: Set(input.brand),
            stock: Set(input.stock),
            sold: Set(0),
            state: Set(ProductState::Activo),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        self.product_repo.create(model).await
    }

    /// Get a product by ID.
    pub async fn get(&self, id: &str) -> AppResult<product::Model> {
        self.product_repo.get_by_id(id).await
    }

    /// Get a product along with its ratings.
    pub async fn get_with_ratings(
        &self,
        id: &str,
    ) -> AppResult<(product::Model, Vec<rating::Model>)> {
        let product = self.product_repo.get_by_id(id).await?;
        let ratings = self.rating_repo.find_by_product(id).await?;
        Ok((product, ratings))
    }

    /// List products matching the filter, newest first. Page numbers start
    /// at 1. An empty filter lists the whole catalog.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        page: u64,
        page_size: u64,
    ) -> AppResult<Vec<product::Model>> {
        if let (Some(min), Some(max)) = (filter.min_price, filter.max_price)
            && min > max
        {
            return Err(AppError::Validation(
                "Minimum price must not exceed maximum price".to_string(),
            ));
        }

        let page = page.max(1);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self.product_repo
            .find_filtered(filter, page_size, (page - 1) * page_size)
            .await
    }

    /// Update a product.
    pub async fn update(&self, id: &str, input: UpdateProductInput) -> AppResult<product::Model> {
        input.validate()?;

        if matches!(input.price, Some(p) if p < Decimal::ZERO) {
            return Err(AppError::Validation(
                "Price must not be negative".to_string(),
            ));
        }
        if matches!(input.stock, Some(s) if s < 0) {
            return Err(AppError::Validation(
                "Stock must not be negative".to_string(),
            ));
        }

        let product = self.product_repo.get_by_id(id).await?;

        if let Some(category_id) = &input.category_id {
            self.category_repo.get_by_id(category_id).await?;
        }

        let name = input.name.clone().unwrap_or_else(|| product.name.clone());
        let brand = input.brand.clone().unwrap_or_else(|| product.brand.clone());
        if (name != product.name || brand != product.brand)
            && self
                .product_repo
                .find_by_name_and_brand(&name, &brand)
                .await?
                .is_some()
        {
            return Err(AppError::Conflict(format!(
                "Product '{name}' by '{brand}' already exists"
            )));
        }

        let mut active: product::ActiveModel = product.into();

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(images) = input.images {
            active.images = Set(serde_json::json!(images));
        }
        if let Some(colors) = input.colors {
            active.colors = Set(serde_json::json!(colors));
        }
        if let Some(tags) = input.tags {
            active.tags = Set(serde_json::json!(tags));
        }
        if let Some(category_id) = input.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(brand) = input.brand {
            active.brand = Set(brand);
        }
        if let Some(stock) = input.stock {
            active.stock = Set(stock);
        }
        if let Some(state) = input.state {
            active.state = Set(state);
        }

        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.product_repo.update(active).await
    }

    /// Delete a product. Cart items and ratings referencing it cascade; order
    /// lines keep their snapshot.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let product = self.product_repo.get_by_id(id).await?;
        self.product_repo.delete(product).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;
    use std::sync::Arc;
    use tienda_db::entities::category;

    fn create_test_product(id: &str, name: &str) -> product::Model {
        product::Model {
            id: id.to_string(),
            name: name.to_string(),
            description: "desc".to_string(),
            price: Decimal::new(10000, 2),
            images: json!([]),
            colors: json!(["rojo"]),
            tags: json!([]),
            category_id: "c1".to_string(),
            brand: "Acme".to_string(),
            stock: 10,
            sold: 0,
            state: ProductState::Activo,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_category(id: &str) -> category::Model {
        category::Model {
            id: id.to_string(),
            name: "Laptops".to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_service(db: Arc<sea_orm::DatabaseConnection>) -> ProductService {
        ProductService::new(
            ProductRepository::new(db.clone()),
            CategoryRepository::new(db.clone()),
            RatingRepository::new(db),
        )
    }

    fn create_input() -> CreateProductInput {
        CreateProductInput {
            name: "Telefono".to_string(),
            description: "desc".to_string(),
            price: Decimal::new(10000, 2),
            images: vec![],
            colors: vec!["rojo".to_string()],
            tags: vec![],
            category_id: "c1".to_string(),
            brand: "Acme".to_string(),
            stock: 10,
        }
    }

    #[tokio::test]
    async fn test_create_negative_price_rejected() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = create_service(db);

        let mut input = create_input();
        input.price = Decimal::new(-1, 0);
        let result = service.create(input).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_missing_category_rejected() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<category::Model>::new()])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service.create(create_input()).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_duplicate_name_brand_conflicts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_category("c1")]])
                .append_query_results([[create_test_product("p1", "Telefono")]])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service.create(create_input()).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_ok() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_category("c1")]])
                .append_query_results([Vec::<product::Model>::new()])
                .append_query_results([[create_test_product("p1", "Telefono")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let service = create_service(db);

        let product = service.create(create_input()).await.unwrap();

        assert_eq!(product.name, "Telefono");
        assert_eq!(product.state, ProductState::Activo);
    }

    #[tokio::test]
    async fn test_update_negative_stock_rejected() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = create_service(db);

        let input = UpdateProductInput {
            stock: Some(-5),
            ..Default::default()
        };
        let result = service.update("p1", input).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_inverted_price_range_rejected() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = create_service(db);

        let filter = ProductFilter {
            min_price: Some(Decimal::new(50000, 2)),
            max_price: Some(Decimal::new(10000, 2)),
            ..Default::default()
        };
        let result = service.list(&filter, 1, 20).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_by_brand() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_product("p1", "Telefono")]])
                .into_connection(),
        );
        let service = create_service(db);

        let filter = ProductFilter {
            brand: Some("Acme".to_string()),
            ..Default::default()
        };
        let result = service.list(&filter, 1, 20).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].brand, "Acme");
    }

    #[test]
    fn test_page_clamping() {
        assert_eq!(0_u64.max(1), 1);
        assert_eq!(500_u64.clamp(1, MAX_PAGE_SIZE), MAX_PAGE_SIZE);
    }
}
