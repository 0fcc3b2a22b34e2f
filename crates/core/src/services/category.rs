//! Category service.

use sea_orm::Set;
use serde::Deserialize;
use tienda_common::{AppError, AppResult, IdGenerator};
use tienda_db::{entities::category, repositories::CategoryRepository};
use validator::Validate;

/// Category service for business logic.
#[derive(Clone)]
pub struct CategoryService {
    category_repo: CategoryRepository,
    id_gen: IdGenerator,
}

/// Input for creating or renaming a category.
#[derive(Debug, Deserialize, Validate)]
pub struct CategoryInput {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
}

impl CategoryService {
    /// Create a new category service.
    #[must_use]
    pub fn new(category_repo: CategoryRepository) -> Self {
        Self {
            category_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a category. Names are unique across the catalog.
    pub async fn create(&self, input: CategoryInput) -> AppResult<category::Model> {
        input.validate()?;

        if self.category_repo.find_by_name(&input.name).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "A category named '{}' already exists",
                input.name
            )));
        }

        let model = category::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        self.category_repo.create(model).await
    }

    /// Get a category by ID.
    pub async fn get(&self, id: &str) -> AppResult<category::Model> {
        self.category_repo.get_by_id(id).await
    }

    /// List all categories, newest first.
    pub async fn list(&self) -> AppResult<Vec<category::Model>> {
        self.category_repo.find_all().await
    }

    /// Rename a category.
    pub async fn rename(&self, id: &str, input: CategoryInput) -> AppResult<category::Model> {
        input.validate()?;

        let category = self.category_repo.get_by_id(id).await?;

        if input.name != category.name
            && self.category_repo.find_by_name(&input.name).await?.is_some()
        {
            return Err(AppError::Conflict(format!(
                "A category named '{}' already exists",
                input.name
            )));
        }

        let mut active: category::ActiveModel = category.into();
        active.name = Set(input.name);
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.category_repo.update(active).await
    }

    /// Delete a category. Refused while products still reference it.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let category = self.category_repo.get_by_id(id).await?;

        let in_use = self.category_repo.count_products(id).await?;
        if in_use > 0 {
            return Err(AppError::Conflict(format!(
                "Category '{}' still has {in_use} products",
                category.name
            )));
        }

        self.category_repo.delete(category).await
    }
}
