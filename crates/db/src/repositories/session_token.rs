//! Session token repository.

use std::sync::Arc;

use crate::entities::{SessionToken, session_token};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tienda_common::{AppError, AppResult};

/// Session token repository for database operations.
#[derive(Clone)]
pub struct SessionTokenRepository {
    db: Arc<DatabaseConnection>,
}

impl SessionTokenRepository {
    /// Create a new session token repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a session by its token string.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<session_token::Model>> {
        SessionToken::find()
            .filter(session_token::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all active sessions for a user.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<session_token::Model>> {
        SessionToken::find()
            .filter(session_token::Column::UserId.eq(user_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new session.
    pub async fn create(
        &self,
        model: session_token::ActiveModel,
    ) -> AppResult<session_token::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a session by its token string. Deleting a token that is already
    /// gone is not an error.
    pub async fn delete_by_token(&self, token: &str) -> AppResult<u64> {
        let result = SessionToken::delete_many()
            .filter(session_token::Column::Token.eq(token))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Delete all sessions for a user.
    pub async fn delete_by_user(&self, user_id: &str) -> AppResult<u64> {
        let result = SessionToken::delete_many()
            .filter(session_token::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Delete sessions past their expiry.
    pub async fn delete_expired(&self) -> AppResult<u64> {
        let result = SessionToken::delete_many()
            .filter(session_token::Column::ExpiresAt.lt(chrono::Utc::now()))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}
