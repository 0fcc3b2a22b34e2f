//! Cart service.
//!
//! A user's shopping cart is created lazily on the first `add_item` and named
//! after their first name. Lines merge on `(product_id, color)`. The cart
//! total covers SELECTED lines only; every mutation recomputes it under the
//! cart's version guard, so concurrent writers lose with a conflict instead
//! of clobbering each other's totals.

use rust_decimal::Decimal;
use sea_orm::Set;
use serde::Deserialize;
use tienda_common::{AppError, AppResult, IdGenerator};
use tienda_db::{
    entities::{
        cart, cart_item,
        product::{self, ProductState},
        user,
    },
    repositories::{CartRepository, ProductRepository},
};
use validator::Validate;

/// Maximum quantity per cart line.
pub const MAX_LINE_QUANTITY: i32 = 10;

/// Compute the total of a cart's selected lines.
#[must_use]
pub fn selected_total(items: &[cart_item::Model]) -> Decimal {
    items
        .iter()
        .filter(|item| item.selected)
        .map(|item| item.subtotal)
        .sum()
}

/// Cart service for business logic.
#[derive(Clone)]
pub struct CartService {
    cart_repo: CartRepository,
    product_repo: ProductRepository,
    id_gen: IdGenerator,
}

/// Input for adding an item to the cart.
#[derive(Debug, Deserialize, Validate)]
pub struct AddItemInput {
    pub product_id: String,

    #[validate(length(min = 1, max = 64))]
    pub color: String,

    #[validate(range(min = 1, max = 10))]
    pub quantity: i32,
}

/// Input for creating or renaming a named cart.
#[derive(Debug, Deserialize, Validate)]
pub struct CartNameInput {
    #[validate(length(min = 3, max = 50))]
    pub name: String,
}

/// A cart with its line items.
#[derive(Debug)]
pub struct CartView {
    pub cart: cart::Model,
    pub items: Vec<cart_item::Model>,
}

impl CartService {
    /// Create a new cart service.
    #[must_use]
    pub fn new(cart_repo: CartRepository, product_repo: ProductRepository) -> Self {
        Self {
            cart_repo,
            product_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add a product to the user's cart, creating the cart on first use.
    ///
    /// If a line for the same `(product_id, color)` already exists, the
    /// quantities merge; a merge that would exceed [`MAX_LINE_QUANTITY`] is
    /// rejected and the line keeps its original price snapshot. The product
    /// must be active, have enough stock, and actually offer the requested
    /// color.
    pub async fn add_item(&self, user: &user::Model, input: AddItemInput) -> AppResult<CartView> {
        input.validate()?;

        let product = self.product_repo.get_by_id(&input.product_id).await?;

        if product.state != ProductState::Activo {
            return Err(AppError::Conflict(format!(
                "Product '{}' is not available",
                product.name
            )));
        }
        if !offers_color(&product, &input.color) {
            return Err(AppError::Validation(format!(
                "Product '{}' is not offered in '{}'",
                product.name, input.color
            )));
        }
        if product.stock < input.quantity {
            return Err(AppError::Conflict(format!(
                "Not enough stock for '{}'",
                product.name
            )));
        }

        let cart = match self.cart_repo.find_by_user(&user.id).await? {
            Some(cart) => cart,
            None => self.create_cart(&user.id, &user.firstname).await?,
        };

        match self
            .cart_repo
            .find_item(&cart.id, &input.product_id, &input.color)
            .await?
        {
            Some(existing) => {
                let quantity = existing.quantity + input.quantity;
                if quantity > MAX_LINE_QUANTITY {
                    return Err(AppError::Validation(format!(
                        "Line quantity must not exceed {MAX_LINE_QUANTITY}"
                    )));
                }
                let price = existing.price;
                let mut active: cart_item::ActiveModel = existing.into();
                active.quantity = Set(quantity);
                active.subtotal = Set(price * Decimal::from(quantity));
                active.updated_at = Set(Some(chrono::Utc::now().into()));
                self.cart_repo.update_item(active).await?;
            }
            None => {
                let model = cart_item::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    cart_id: Set(cart.id.clone()),
                    product_id: Set(input.product_id),
                    price: Set(product.price),
                    color: Set(input.color),
                    quantity: Set(input.quantity),
                    selected: Set(true),
                    subtotal: Set(product.price * Decimal::from(input.quantity)),
                    created_at: Set(chrono::Utc::now().into()),
                    ..Default::default()
                };
                self.cart_repo.insert_item(model).await?;
            }
        }

        self.refresh_total(&cart).await
    }

    /// Remove every line for a product (all colors), then recompute.
    pub async fn remove_item(&self, user_id: &str, product_id: &str) -> AppResult<CartView> {
        let cart = self.get_user_cart(user_id).await?;

        let removed = self
            .cart_repo
            .delete_items_by_product(&cart.id, product_id)
            .await?;
        if removed == 0 {
            return Err(AppError::NotFound(format!(
                "product {product_id} is not in the cart"
            )));
        }

        self.refresh_total(&cart).await
    }

    /// Change the quantity of a line (1..=10), then recompute.
    pub async fn set_quantity(
        &self,
        user_id: &str,
        cart_id: &str,
        product_id: &str,
        color: &str,
        quantity: i32,
    ) -> AppResult<CartView> {
        if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
            return Err(AppError::Validation(format!(
                "Quantity must be between 1 and {MAX_LINE_QUANTITY}"
            )));
        }

        let cart = self.get_owned_cart(user_id, cart_id).await?;
        let item = self.get_item(&cart.id, product_id, color).await?;

        let price = item.price;
        let mut active: cart_item::ActiveModel = item.into();
        active.quantity = Set(quantity);
        active.subtotal = Set(price * Decimal::from(quantity));
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        self.cart_repo.update_item(active).await?;

        self.refresh_total(&cart).await
    }

    /// Toggle whether a line counts toward the total, then recompute.
    pub async fn toggle_selected(
        &self,
        user_id: &str,
        product_id: &str,
        color: &str,
    ) -> AppResult<CartView> {
        let cart = self.get_user_cart(user_id).await?;
        let item = self.get_item(&cart.id, product_id, color).await?;

        let selected = !item.selected;
        let mut active: cart_item::ActiveModel = item.into();
        active.selected = Set(selected);
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        self.cart_repo.update_item(active).await?;

        self.refresh_total(&cart).await
    }

    /// Get the user's shopping cart with its items.
    pub async fn get(&self, user_id: &str) -> AppResult<CartView> {
        let cart = self.get_user_cart(user_id).await?;
        let items = self.cart_repo.find_items(&cart.id).await?;
        Ok(CartView { cart, items })
    }

    /// Get one of the user's carts by ID, with its items.
    pub async fn get_by_id(&self, user_id: &str, cart_id: &str) -> AppResult<CartView> {
        let cart = self.get_owned_cart(user_id, cart_id).await?;
        let items = self.cart_repo.find_items(&cart.id).await?;
        Ok(CartView { cart, items })
    }

    /// List all of the user's carts.
    pub async fn list(&self, user_id: &str) -> AppResult<Vec<cart::Model>> {
        self.cart_repo.find_all_by_user(user_id).await
    }

    /// Create an additional named cart (e.g. a wishlist).
    pub async fn create_named(&self, user_id: &str, input: CartNameInput) -> AppResult<cart::Model> {
        input.validate()?;

        if self
            .cart_repo
            .find_by_user_and_name(user_id, &input.name)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "A cart named '{}' already exists",
                input.name
            )));
        }

        self.create_cart(user_id, &input.name).await
    }

    /// Rename one of the user's carts.
    pub async fn rename(
        &self,
        user_id: &str,
        cart_id: &str,
        input: CartNameInput,
    ) -> AppResult<cart::Model> {
        input.validate()?;

        let cart = self.get_owned_cart(user_id, cart_id).await?;

        if input.name != cart.name
            && self
                .cart_repo
                .find_by_user_and_name(user_id, &input.name)
                .await?
                .is_some()
        {
            return Err(AppError::Conflict(format!(
                "A cart named '{}' already exists",
                input.name
            )));
        }

        let mut active: cart::ActiveModel = cart.into();
        active.name = Set(input.name);
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        self.cart_repo.update(active).await
    }

    /// Delete one of the user's carts. Refused while it still has items.
    pub async fn delete(&self, user_id: &str, cart_id: &str) -> AppResult<()> {
        let cart = self.get_owned_cart(user_id, cart_id).await?;

        let items = self.cart_repo.count_items(&cart.id).await?;
        if items > 0 {
            return Err(AppError::Conflict(format!(
                "Cart '{}' still has {items} items",
                cart.name
            )));
        }

        self.cart_repo.delete(cart).await
    }

    async fn create_cart(&self, user_id: &str, name: &str) -> AppResult<cart::Model> {
        let model = cart::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            name: Set(name.to_string()),
            total: Set(Decimal::ZERO),
            version: Set(0),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };
        self.cart_repo.create(model).await
    }

    async fn get_user_cart(&self, user_id: &str) -> AppResult<cart::Model> {
        self.cart_repo
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("cart".to_string()))
    }

    async fn get_owned_cart(&self, user_id: &str, cart_id: &str) -> AppResult<cart::Model> {
        let cart = self.cart_repo.get_by_id(cart_id).await?;
        if cart.user_id != user_id {
            return Err(AppError::Forbidden(
                "Cart belongs to another user".to_string(),
            ));
        }
        Ok(cart)
    }

    async fn get_item(
        &self,
        cart_id: &str,
        product_id: &str,
        color: &str,
    ) -> AppResult<cart_item::Model> {
        self.cart_repo
            .find_item(cart_id, product_id, color)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("product {product_id} ({color}) is not in the cart"))
            })
    }

    /// Recompute the selected-lines total and persist it under the version
    /// the cart was read at.
    async fn refresh_total(&self, cart: &cart::Model) -> AppResult<CartView> {
        let items = self.cart_repo.find_items(&cart.id).await?;
        let total = selected_total(&items);

        self.cart_repo
            .save_total(&cart.id, cart.version, total)
            .await?;

        let cart = self.cart_repo.get_by_id(&cart.id).await?;
        Ok(CartView { cart, items })
    }
}

fn offers_color(product: &product::Model, color: &str) -> bool {
    product
        .colors
        .as_array()
        .is_some_and(|colors| colors.iter().any(|c| c.as_str() == Some(color)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;
    use std::sync::Arc;
    use tienda_db::entities::user::UserRole;

    fn create_test_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            firstname: "Ana".to_string(),
            lastname: "Lopez".to_string(),
            email: "ana@example.com".to_string(),
            mobile: None,
            password_hash: "hash".to_string(),
            role: UserRole::User,
            is_blocked: false,
            password_reset_token: None,
            password_reset_expires: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_product(id: &str, stock: i32) -> product::Model {
        product::Model {
            id: id.to_string(),
            name: "Telefono".to_string(),
            description: "desc".to_string(),
            price: Decimal::new(10000, 2),
            images: json!([]),
            colors: json!(["rojo", "negro"]),
            tags: json!([]),
            category_id: "c1".to_string(),
            brand: "Acme".to_string(),
            stock,
            sold: 0,
            state: ProductState::Activo,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_cart(id: &str, user_id: &str, version: i32) -> cart::Model {
        cart::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            name: "Ana".to_string(),
            total: Decimal::ZERO,
            version,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_item(id: &str, quantity: i32, selected: bool) -> cart_item::Model {
        let price = Decimal::new(10000, 2);
        cart_item::Model {
            id: id.to_string(),
            cart_id: "cart1".to_string(),
            product_id: "p1".to_string(),
            price,
            color: "rojo".to_string(),
            quantity,
            selected,
            subtotal: price * Decimal::from(quantity),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_service(db: Arc<sea_orm::DatabaseConnection>) -> CartService {
        CartService::new(CartRepository::new(db.clone()), ProductRepository::new(db))
    }

    #[test]
    fn test_selected_total_ignores_unselected() {
        // 100.00 x 2 selected + 100.00 x 3 unselected = 200.00
        let items = vec![create_test_item("i1", 2, true), create_test_item("i2", 3, false)];
        assert_eq!(selected_total(&items), Decimal::new(20000, 2));
    }

    #[test]
    fn test_selected_total_empty_is_zero() {
        assert_eq!(selected_total(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_selected_total_sums_lines() {
        // 100.00 x 2 + 100.00 x 1 = 300.00
        let items = vec![create_test_item("i1", 2, true), create_test_item("i2", 1, true)];
        assert_eq!(selected_total(&items), Decimal::new(30000, 2));
    }

    #[tokio::test]
    async fn test_add_item_zero_quantity_rejected() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = create_service(db);

        let result = service
            .add_item(
                &create_test_user("user1"),
                AddItemInput {
                    product_id: "p1".to_string(),
                    color: "rojo".to_string(),
                    quantity: 0,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_add_item_eleven_rejected() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = create_service(db);

        let result = service
            .add_item(
                &create_test_user("user1"),
                AddItemInput {
                    product_id: "p1".to_string(),
                    color: "rojo".to_string(),
                    quantity: 11,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_add_item_unknown_color_rejected() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_product("p1", 10)]])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service
            .add_item(
                &create_test_user("user1"),
                AddItemInput {
                    product_id: "p1".to_string(),
                    color: "verde".to_string(),
                    quantity: 1,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_add_item_insufficient_stock_conflicts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_product("p1", 2)]])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service
            .add_item(
                &create_test_user("user1"),
                AddItemInput {
                    product_id: "p1".to_string(),
                    color: "rojo".to_string(),
                    quantity: 5,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_add_item_inactive_product_conflicts() {
        let mut inactive = create_test_product("p1", 10);
        inactive.state = ProductState::Inactivo;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[inactive]])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service
            .add_item(
                &create_test_user("user1"),
                AddItemInput {
                    product_id: "p1".to_string(),
                    color: "rojo".to_string(),
                    quantity: 1,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_add_item_merges_existing_line() {
        // Existing line: qty 2 at 100.00. Adding 1 more of the same
        // (product, color) merges to qty 3, total 300.00.
        let existing = create_test_item("i1", 2, true);
        let merged = create_test_item("i1", 3, true);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_product("p1", 10)]])
                .append_query_results([[create_test_cart("cart1", "user1", 0)]])
                .append_query_results([[existing]])
                .append_query_results([[merged.clone()]])
                .append_query_results([[merged.clone()]])
                .append_query_results([{
                    let mut refreshed = create_test_cart("cart1", "user1", 1);
                    refreshed.total = Decimal::new(30000, 2);
                    [refreshed]
                }])
                .append_exec_results([
                    // update_item
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    // save_total
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );
        let service = create_service(db);

        let view = service
            .add_item(
                &create_test_user("user1"),
                AddItemInput {
                    product_id: "p1".to_string(),
                    color: "rojo".to_string(),
                    quantity: 1,
                },
            )
            .await
            .unwrap();

        assert_eq!(view.cart.total, Decimal::new(30000, 2));
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_add_item_merge_over_limit_rejected() {
        // Existing line holds 8; adding 5 more would exceed the 10-unit cap.
        let existing = create_test_item("i1", 8, true);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_product("p1", 20)]])
                .append_query_results([[create_test_cart("cart1", "user1", 0)]])
                .append_query_results([[existing]])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service
            .add_item(
                &create_test_user("user1"),
                AddItemInput {
                    product_id: "p1".to_string(),
                    color: "rojo".to_string(),
                    quantity: 5,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_returns_user_carts() {
        let carts = vec![
            create_test_cart("cart1", "user1", 0),
            create_test_cart("cart2", "user1", 0),
        ];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([carts])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service.list("user1").await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, "cart1");
    }

    #[tokio::test]
    async fn test_remove_item_not_in_cart() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_cart("cart1", "user1", 0)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service.remove_item("user1", "p9").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_set_quantity_out_of_range_rejected() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = create_service(db);

        let result = service
            .set_quantity("user1", "cart1", "p1", "rojo", 0)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = service
            .set_quantity("user1", "cart1", "p1", "rojo", 11)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_set_quantity_max_accepted() {
        let item = create_test_item("i1", 2, true);
        let updated = create_test_item("i1", 10, true);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_cart("cart1", "user1", 0)]])
                .append_query_results([[item]])
                .append_query_results([[updated.clone()]])
                .append_query_results([[updated.clone()]])
                .append_query_results([{
                    let mut refreshed = create_test_cart("cart1", "user1", 1);
                    refreshed.total = Decimal::new(100_000, 2);
                    [refreshed]
                }])
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );
        let service = create_service(db);

        let view = service
            .set_quantity("user1", "cart1", "p1", "rojo", 10)
            .await
            .unwrap();

        // 100.00 x 10 = 1000.00
        assert_eq!(view.cart.total, Decimal::new(100_000, 2));
    }

    #[tokio::test]
    async fn test_delete_cart_with_items_conflicts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_cart("cart1", "user1", 0)]])
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(2)),
                }]])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service.delete("user1", "cart1").await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_rename_foreign_cart_forbidden() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_cart("cart1", "user2", 0)]])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service
            .rename(
                "user1",
                "cart1",
                CartNameInput {
                    name: "regalos".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_create_named_short_name_rejected() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = create_service(db);

        let result = service
            .create_named(
                "user1",
                CartNameInput {
                    name: "ab".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
