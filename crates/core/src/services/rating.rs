//! Rating service.

use sea_orm::Set;
use serde::Deserialize;
use tienda_common::{AppError, AppResult, IdGenerator};
use tienda_db::{
    entities::rating,
    repositories::{ProductRepository, RatingRepository},
};
use validator::Validate;

/// Rating service for business logic.
#[derive(Clone)]
pub struct RatingService {
    rating_repo: RatingRepository,
    product_repo: ProductRepository,
    id_gen: IdGenerator,
}

/// Input for creating a rating.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRatingInput {
    pub product_id: String,

    /// Score from 1 to 10.
    #[validate(range(min = 1, max = 10))]
    pub score: i16,

    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

/// Input for updating a rating.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateRatingInput {
    #[validate(range(min = 1, max = 10))]
    pub score: Option<i16>,

    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

impl RatingService {
    /// Create a new rating service.
    #[must_use]
    pub fn new(rating_repo: RatingRepository, product_repo: ProductRepository) -> Self {
        Self {
            rating_repo,
            product_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Rate a product. One rating per user per product.
    pub async fn create(&self, user_id: &str, input: CreateRatingInput) -> AppResult<rating::Model> {
        input.validate()?;

        self.product_repo.get_by_id(&input.product_id).await?;

        if self
            .rating_repo
            .find_by_user_and_product(user_id, &input.product_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "You have already rated this product".to_string(),
            ));
        }

        let model = rating::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            product_id: Set(input.product_id),
            score: Set(input.score),
            comment: Set(input.comment),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        self.rating_repo.create(model).await
    }

    /// Get a rating by ID.
    pub async fn get(&self, id: &str) -> AppResult<rating::Model> {
        self.rating_repo.get_by_id(id).await
    }

    /// List all ratings, newest first.
    pub async fn list(&self) -> AppResult<Vec<rating::Model>> {
        self.rating_repo.find_all().await
    }

    /// List ratings for a product.
    pub async fn list_for_product(&self, product_id: &str) -> AppResult<Vec<rating::Model>> {
        self.rating_repo.find_by_product(product_id).await
    }

    /// List the caller's ratings.
    pub async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<rating::Model>> {
        self.rating_repo.find_by_user(user_id).await
    }

    /// Update one of the caller's ratings.
    pub async fn update(
        &self,
        user_id: &str,
        id: &str,
        input: UpdateRatingInput,
    ) -> AppResult<rating::Model> {
        input.validate()?;

        let rating = self.rating_repo.get_by_id(id).await?;
        if rating.user_id != user_id {
            return Err(AppError::Forbidden(
                "Rating belongs to another user".to_string(),
            ));
        }

        let mut active: rating::ActiveModel = rating.into();

        if let Some(score) = input.score {
            active.score = Set(score);
        }
        if let Some(comment) = input.comment {
            active.comment = Set(Some(comment));
        }

        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.rating_repo.update(active).await
    }

    /// Delete one of the caller's ratings.
    pub async fn delete(&self, user_id: &str, id: &str) -> AppResult<()> {
        let rating = self.rating_repo.get_by_id(id).await?;
        if rating.user_id != user_id {
            return Err(AppError::Forbidden(
                "Rating belongs to another user".to_string(),
            ));
        }

        self.rating_repo.delete(rating).await
    }
}
