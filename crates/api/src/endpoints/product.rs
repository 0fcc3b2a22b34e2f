//! Product endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tienda_common::{AppError, AppResult};
use tienda_core::{CreateProductInput, UpdateProductInput, product::DEFAULT_PAGE_SIZE};
use tienda_db::{
    entities::{
        product::{self, ProductState},
        rating,
    },
    repositories::ProductFilter,
};

use crate::{
    endpoints::rating::RatingResponse, extractors::AdminUser, middleware::AppState,
    response::ApiResponse,
};

/// Product response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub images: serde_json::Value,
    pub colors: serde_json::Value,
    pub tags: serde_json::Value,
    pub category_id: String,
    pub brand: String,
    pub stock: i32,
    pub sold: i32,
    pub state: ProductState,
    pub created_at: String,
}

impl From<product::Model> for ProductResponse {
    fn from(product: product::Model) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            images: product.images,
            colors: product.colors,
            tags: product.tags,
            category_id: product.category_id,
            brand: product.brand,
            stock: product.stock,
            sold: product.sold,
            state: product.state,
            created_at: product.created_at.to_rfc3339(),
        }
    }
}

/// Product with its ratings.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailResponse {
    #[serde(flatten)]
    pub product: ProductResponse,
    pub ratings: Vec<RatingResponse>,
}

impl ProductDetailResponse {
    fn new(product: product::Model, ratings: Vec<rating::Model>) -> Self {
        Self {
            product: product.into(),
            ratings: ratings.into_iter().map(Into::into).collect(),
        }
    }
}

/// Create product request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub category_id: String,
    pub brand: String,
    pub stock: i32,
}

async fn create(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<CreateProductRequest>,
) -> AppResult<ApiResponse<ProductResponse>> {
    let product = state
        .product_service
        .create(CreateProductInput {
            name: req.name,
            description: req.description,
            price: req.price,
            images: req.images,
            colors: req.colors,
            tags: req.tags,
            category_id: req.category_id,
            brand: req.brand,
            stock: req.stock,
        })
        .await?;

    Ok(ApiResponse::ok(product.into()))
}

/// Listing query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

async fn search(
    state: &AppState,
    filter: ProductFilter,
    query: ListQuery,
) -> AppResult<ApiResponse<Vec<ProductResponse>>> {
    let products = state
        .product_service
        .list(
            &filter,
            query.page.unwrap_or(1),
            query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await?;

    Ok(ApiResponse::ok(
        products.into_iter().map(Into::into).collect(),
    ))
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<ProductResponse>>> {
    search(&state, ProductFilter::default(), query).await
}

async fn list_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<ProductResponse>>> {
    let filter = ProductFilter {
        category_id: Some(category_id),
        ..Default::default()
    };
    search(&state, filter, query).await
}

async fn list_by_brand(
    State(state): State<AppState>,
    Path(brand): Path<String>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<ProductResponse>>> {
    let filter = ProductFilter {
        brand: Some(brand),
        ..Default::default()
    };
    search(&state, filter, query).await
}

async fn list_by_color(
    State(state): State<AppState>,
    Path(color): Path<String>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<ProductResponse>>> {
    let filter = ProductFilter {
        color: Some(color),
        ..Default::default()
    };
    search(&state, filter, query).await
}

async fn list_by_tag(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<ProductResponse>>> {
    let filter = ProductFilter {
        tag: Some(tag),
        ..Default::default()
    };
    search(&state, filter, query).await
}

async fn list_by_keyword(
    State(state): State<AppState>,
    Path(keyword): Path<String>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<ProductResponse>>> {
    let filter = ProductFilter {
        keyword: Some(keyword),
        ..Default::default()
    };
    search(&state, filter, query).await
}

async fn list_by_price_range(
    State(state): State<AppState>,
    Path(range): Path<String>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<ProductResponse>>> {
    let (min_price, max_price) = parse_price_range(&range)?;
    let filter = ProductFilter {
        min_price: Some(min_price),
        max_price: Some(max_price),
        ..Default::default()
    };
    search(&state, filter, query).await
}

/// Parse a `min-max` price range path segment, e.g. `100-500`.
fn parse_price_range(range: &str) -> AppResult<(Decimal, Decimal)> {
    range
        .split_once('-')
        .and_then(|(min, max)| {
            let min = min.trim().parse().ok()?;
            let max = max.trim().parse().ok()?;
            Some((min, max))
        })
        .ok_or_else(|| {
            AppError::BadRequest("Price range must look like <min>-<max>, e.g. 100-500".to_string())
        })
}

async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ProductDetailResponse>> {
    let (product, ratings) = state.product_service.get_with_ratings(&id).await?;
    Ok(ApiResponse::ok(ProductDetailResponse::new(product, ratings)))
}

/// Update product request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub images: Option<Vec<String>>,
    pub colors: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub category_id: Option<String>,
    pub brand: Option<String>,
    pub stock: Option<i32>,
    pub state: Option<ProductState>,
}

async fn update(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> AppResult<ApiResponse<ProductResponse>> {
    let product = state
        .product_service
        .update(
            &id,
            UpdateProductInput {
                name: req.name,
                description: req.description,
                price: req.price,
                images: req.images,
                colors: req.colors,
                tags: req.tags,
                category_id: req.category_id,
                brand: req.brand,
                stock: req.stock,
                state: req.state,
            },
        )
        .await?;

    Ok(ApiResponse::ok(product.into()))
}

async fn delete(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.product_service.delete(&id).await?;
    Ok(ApiResponse::ok(()))
}

/// Create the product router. Catalog reads are public; writes are admin.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create).get(list))
        .route("/category/{id}", get(list_by_category))
        .route("/brand/{brand}", get(list_by_brand))
        .route("/color/{color}", get(list_by_color))
        .route("/tag/{tag}", get(list_by_tag))
        .route("/keyword/{keyword}", get(list_by_keyword))
        .route("/price-range/{range}", get(list_by_price_range))
        .route("/{id}", get(show).patch(update).delete(delete))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_range() {
        let (min, max) = parse_price_range("100-500").unwrap();
        assert_eq!(min, Decimal::new(100, 0));
        assert_eq!(max, Decimal::new(500, 0));

        let (min, max) = parse_price_range("99.50-120.75").unwrap();
        assert_eq!(min, Decimal::new(9950, 2));
        assert_eq!(max, Decimal::new(12075, 2));
    }

    #[test]
    fn test_parse_price_range_malformed() {
        assert!(parse_price_range("100").is_err());
        assert!(parse_price_range("abc-def").is_err());
        assert!(parse_price_range("-").is_err());
    }
}
