//! Session service.
//!
//! Session tokens are HS256 JWTs backed by a `session_token` row. Validation
//! requires both: a valid signature/expiry AND a live row. Revocation deletes
//! the row, so stolen-but-revoked tokens die immediately.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tienda_common::{AppError, AppResult, AuthConfig, IdGenerator};
use tienda_db::{
    entities::{session_token, user},
    repositories::{SessionTokenRepository, UserRepository},
};

/// JWT claims for a session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User ID.
    pub sub: String,
    /// Unique token ID.
    pub jti: String,
    /// Expiry (seconds since epoch).
    pub exp: i64,
}

/// Sign a session token.
pub fn sign_token(secret: &str, user_id: &str, jti: &str, expires_at: i64) -> AppResult<String> {
    let claims = SessionClaims {
        sub: user_id.to_string(),
        jti: jti.to_string(),
        exp: expires_at,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
}

/// Decode and verify a session token's signature and expiry.
///
/// Any failure collapses to [`AppError::Unauthorized`] so callers leak
/// nothing about why a token was rejected.
pub fn decode_token(secret: &str, token: &str) -> AppResult<SessionClaims> {
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized)
}

/// Session service for issuing, validating and revoking tokens.
#[derive(Clone)]
pub struct SessionService {
    session_repo: SessionTokenRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
    jwt_secret: String,
    token_ttl: Duration,
}

impl SessionService {
    /// Create a new session service.
    #[must_use]
    pub fn new(
        session_repo: SessionTokenRepository,
        user_repo: UserRepository,
        config: &AuthConfig,
    ) -> Self {
        Self {
            session_repo,
            user_repo,
            id_gen: IdGenerator::new(),
            jwt_secret: config.jwt_secret.clone(),
            token_ttl: Duration::minutes(config.token_ttl_minutes),
        }
    }

    /// Issue a new session token for a user. Each call creates an independent
    /// session, so the same account can be signed in on several devices.
    pub async fn issue(&self, user_id: &str) -> AppResult<String> {
        let expires_at = Utc::now() + self.token_ttl;
        let jti = self.id_gen.generate_token();
        let token = sign_token(&self.jwt_secret, user_id, &jti, expires_at.timestamp())?;

        let model = session_token::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            token: Set(token.clone()),
            expires_at: Set(expires_at.into()),
            created_at: Set(Utc::now().into()),
        };
        self.session_repo.create(model).await?;

        Ok(token)
    }

    /// Validate a session token and resolve its user.
    ///
    /// The signature must verify, the token row must still exist, and the
    /// account must not be blocked.
    pub async fn validate(&self, token: &str) -> AppResult<user::Model> {
        let claims = decode_token(&self.jwt_secret, token)?;

        self.session_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let user = self
            .user_repo
            .find_by_id(&claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if user.is_blocked {
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }

    /// Revoke a single session (sign out of one device).
    pub async fn revoke(&self, token: &str) -> AppResult<()> {
        self.session_repo.delete_by_token(token).await?;
        Ok(())
    }

    /// Revoke every session of a user (sign out everywhere).
    pub async fn revoke_all(&self, user_id: &str) -> AppResult<u64> {
        self.session_repo.delete_by_user(user_id).await
    }

    /// Delete sessions past their expiry. Housekeeping, safe to re-run.
    pub async fn purge_expired(&self) -> AppResult<u64> {
        let purged = self.session_repo.delete_expired().await?;
        if purged > 0 {
            tracing::debug!(purged, "Purged expired sessions");
        }
        Ok(purged)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;
    use tienda_db::entities::user::UserRole;

    const SECRET: &str = "test_secret";

    fn create_test_user(id: &str, email: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            firstname: "Ana".to_string(),
            lastname: "Lopez".to_string(),
            email: email.to_string(),
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

    fn create_test_session(token: &str) -> session_token::Model {
        session_token::Model {
            id: "s1".to_string(),
            user_id: "user1".to_string(),
            token: token.to_string(),
            expires_at: (Utc::now() + Duration::hours(1)).into(),
            created_at: Utc::now().into(),
        }
    }

    fn create_service(db: Arc<sea_orm::DatabaseConnection>) -> SessionService {
        let config = AuthConfig {
            jwt_secret: SECRET.to_string(),
            token_ttl_minutes: 60,
        };
        SessionService::new(
            SessionTokenRepository::new(db.clone()),
            UserRepository::new(db),
            &config,
        )
    }

    #[test]
    fn test_sign_and_decode_round_trip() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let token = sign_token(SECRET, "user1", "jti1", exp).unwrap();
        let claims = decode_token(SECRET, &token).unwrap();

        assert_eq!(claims.sub, "user1");
        assert_eq!(claims.jti, "jti1");
        assert_eq!(claims.exp, exp);
    }

    #[test]
    fn test_decode_expired_token_rejected() {
        let exp = (Utc::now() - Duration::hours(1)).timestamp();
        let token = sign_token(SECRET, "user1", "jti1", exp).unwrap();
        let result = decode_token(SECRET, &token);

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_decode_wrong_secret_rejected() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let token = sign_token(SECRET, "user1", "jti1", exp).unwrap();
        let result = decode_token("other_secret", &token);

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_validate_happy_path() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let token = sign_token(SECRET, "user1", "jti1", exp).unwrap();

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_session(&token)]])
                .append_query_results([[create_test_user("user1", "ana@example.com")]])
                .into_connection(),
        );

        let service = create_service(db);
        let user = service.validate(&token).await.unwrap();

        assert_eq!(user.id, "user1");
    }

    #[tokio::test]
    async fn test_validate_revoked_token_rejected() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let token = sign_token(SECRET, "user1", "jti1", exp).unwrap();

        // Signature is fine but no session row exists
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<session_token::Model>::new()])
                .into_connection(),
        );

        let service = create_service(db);
        let result = service.validate(&token).await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_validate_blocked_user_rejected() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let token = sign_token(SECRET, "user1", "jti1", exp).unwrap();

        let mut blocked = create_test_user("user1", "ana@example.com");
        blocked.is_blocked = true;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_session(&token)]])
                .append_query_results([[blocked]])
                .into_connection(),
        );

        let service = create_service(db);
        let result = service.validate(&token).await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_validate_garbage_token_rejected() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_service(db);
        let result = service.validate("not-a-jwt").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_revoke_all_reports_count() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .into_connection(),
        );

        let service = create_service(db);
        let revoked = service.revoke_all("user1").await.unwrap();

        assert_eq!(revoked, 2);
    }
}
