//! User service.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::Set;
use serde::Deserialize;
use tienda_common::{AppError, AppResult, IdGenerator};
use tienda_db::{entities::user, repositories::UserRepository};
use validator::Validate;

use super::email::{EmailMessage, EmailService};
use super::session::SessionService;

/// How long a password reset token stays valid.
const RESET_TOKEN_TTL_MINUTES: i64 = 30;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    sessions: SessionService,
    email: EmailService,
    id_gen: IdGenerator,
}

/// Input for creating a new account.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupInput {
    #[validate(length(min = 1, max = 64))]
    pub firstname: String,

    #[validate(length(min = 1, max = 64))]
    pub lastname: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(max = 32))]
    pub mobile: Option<String>,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Input for signing in.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Input for updating an account. Only these fields may change.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserInput {
    #[validate(length(min = 1, max = 64))]
    pub firstname: Option<String>,

    #[validate(length(min = 1, max = 64))]
    pub lastname: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(length(max = 32))]
    pub mobile: Option<String>,

    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(user_repo: UserRepository, sessions: SessionService, email: EmailService) -> Self {
        Self {
            user_repo,
            sessions,
            email,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a new account and issue its first session token.
    pub async fn signup(&self, input: SignupInput) -> AppResult<(user::Model, String)> {
        input.validate()?;
        validate_password_strength(&input.password)?;

        let email = input.email.to_lowercase();

        // Check if the email is taken
        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        let password_hash = hash_password(&input.password)?;

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            firstname: Set(input.firstname),
            lastname: Set(input.lastname),
            email: Set(email),
            mobile: Set(input.mobile),
            password_hash: Set(password_hash),
            role: Set(user::UserRole::User),
            is_blocked: Set(false),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        let user = self.user_repo.create(model).await?;
        let token = self.sessions.issue(&user.id).await?;

        // Welcome mail is best-effort; failures are logged, not surfaced
        self.email
            .send_fire_and_forget(EmailMessage::welcome(&user.email, &user.firstname));

        Ok((user, token))
    }

    /// Authenticate by email and password, issuing a session token.
    pub async fn login(&self, input: LoginInput) -> AppResult<(user::Model, String)> {
        input.validate()?;

        let user = self
            .user_repo
            .find_by_email(&input.email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        if user.is_blocked {
            return Err(AppError::Unauthorized);
        }

        let token = self.sessions.issue(&user.id).await?;
        Ok((user, token))
    }

    /// Sign out of one device.
    pub async fn logout(&self, token: &str) -> AppResult<()> {
        self.sessions.revoke(token).await
    }

    /// Sign out of every device.
    pub async fn logout_all(&self, user_id: &str) -> AppResult<u64> {
        self.sessions.revoke_all(user_id).await
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// List every account, newest first (admin).
    pub async fn list_all(&self) -> AppResult<Vec<user::Model>> {
        self.user_repo.find_all().await
    }

    /// Start a password reset: store a single-use token on the account and
    /// mail it to the owner.
    pub async fn forgot_password(&self, email: &str) -> AppResult<()> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("No account with this email".to_string()))?;

        let token = self.id_gen.generate_token();
        let expires = chrono::Utc::now() + chrono::Duration::minutes(RESET_TOKEN_TTL_MINUTES);

        let recipient = user.email.clone();
        let firstname = user.firstname.clone();

        let mut active: user::ActiveModel = user.into();
        active.password_reset_token = Set(Some(token.clone()));
        active.password_reset_expires = Set(Some(expires.into()));
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        self.user_repo.update(active).await?;

        // Reset mail is best-effort; failures are logged, not surfaced
        self.email
            .send_fire_and_forget(EmailMessage::password_reset(&recipient, &firstname, &token));

        Ok(())
    }

    /// Redeem a reset token: set the new password, clear the token and revoke
    /// every live session.
    pub async fn reset_password(&self, token: &str, password: &str) -> AppResult<user::Model> {
        validate_password_strength(password)?;

        let user = self
            .user_repo
            .find_by_reset_token(token)
            .await?
            .ok_or_else(|| AppError::BadRequest("Invalid or expired reset token".to_string()))?;

        let expired = user
            .password_reset_expires
            .is_none_or(|exp| exp < chrono::Utc::now());
        if expired {
            return Err(AppError::BadRequest(
                "Invalid or expired reset token".to_string(),
            ));
        }

        let user_id = user.id.clone();
        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(hash_password(password)?);
        active.password_reset_token = Set(None);
        active.password_reset_expires = Set(None);
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        let updated = self.user_repo.update(active).await?;
        self.sessions.revoke_all(&user_id).await?;

        Ok(updated)
    }

    /// Update an account. Callers may only update themselves.
    pub async fn update(
        &self,
        caller: &user::Model,
        id: &str,
        input: UpdateUserInput,
    ) -> AppResult<user::Model> {
        input.validate()?;

        if caller.id != id {
            return Err(AppError::Forbidden(
                "Cannot update another user's account".to_string(),
            ));
        }

        let user = self.user_repo.get_by_id(id).await?;
        let mut active: user::ActiveModel = user.into();

        if let Some(firstname) = input.firstname {
            active.firstname = Set(firstname);
        }
        if let Some(lastname) = input.lastname {
            active.lastname = Set(lastname);
        }
        if let Some(email) = input.email {
            let email = email.to_lowercase();
            if let Some(existing) = self.user_repo.find_by_email(&email).await? {
                if existing.id != id {
                    return Err(AppError::Conflict(
                        "An account with this email already exists".to_string(),
                    ));
                }
            }
            active.email = Set(email);
        }
        if let Some(mobile) = input.mobile {
            active.mobile = Set(Some(mobile));
        }
        if let Some(password) = input.password {
            validate_password_strength(&password)?;
            active.password_hash = Set(hash_password(&password)?);
        }

        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// Delete an account. Callers may only delete themselves; addresses,
    /// sessions, carts, ratings and orders cascade.
    pub async fn delete(&self, caller: &user::Model, id: &str) -> AppResult<()> {
        if caller.id != id {
            return Err(AppError::Forbidden(
                "Cannot delete another user's account".to_string(),
            ));
        }

        let user = self.user_repo.get_by_id(id).await?;
        self.user_repo.delete(user).await
    }

    /// Block an account (admin). Every live session is revoked.
    pub async fn block(&self, id: &str) -> AppResult<user::Model> {
        let user = self.user_repo.set_blocked(id, true).await?;
        self.sessions.revoke_all(id).await?;
        Ok(user)
    }

    /// Unblock an account (admin).
    pub async fn unblock(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.set_blocked(id, false).await
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Passwords need at least 8 characters with a digit, a lowercase letter and
/// an uppercase letter.
fn validate_password_strength(password: &str) -> AppResult<()> {
    let long_enough = password.chars().count() >= 8;
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_lower = password.chars().any(char::is_lowercase);
    let has_upper = password.chars().any(char::is_uppercase);

    if long_enough && has_digit && has_lower && has_upper {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Password must be at least 8 characters and contain a digit, a lowercase letter and an uppercase letter".to_string(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;
    use tienda_common::AuthConfig;
    use tienda_db::entities::{session_token, user::UserRole};
    use tienda_db::repositories::SessionTokenRepository;

    fn create_test_user(id: &str, email: &str, password_hash: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            firstname: "Ana".to_string(),
            lastname: "Lopez".to_string(),
            email: email.to_string(),
            mobile: None,
            password_hash: password_hash.to_string(),
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
            expires_at: (Utc::now() + chrono::Duration::hours(1)).into(),
            created_at: Utc::now().into(),
        }
    }

    fn create_test_service(db: Arc<sea_orm::DatabaseConnection>) -> UserService {
        let auth = AuthConfig {
            jwt_secret: "test_secret".to_string(),
            token_ttl_minutes: 60,
        };
        let sessions = SessionService::new(
            SessionTokenRepository::new(db.clone()),
            UserRepository::new(db.clone()),
            &auth,
        );
        UserService::new(UserRepository::new(db), sessions, EmailService::disabled())
    }

    // Unit tests for password functions
    #[test]
    fn test_hash_password() {
        let password = "Test_password_123";
        let hash = hash_password(password).unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(hash.len() > 50);
    }

    #[test]
    fn test_verify_password_correct() {
        let password = "Test_password_123";
        let hash = hash_password(password).unwrap();

        let result = verify_password(password, &hash).unwrap();
        assert!(result);
    }

    #[test]
    fn test_verify_password_incorrect() {
        let password = "Test_password_123";
        let hash = hash_password(password).unwrap();

        let result = verify_password("wrong_password", &hash).unwrap();
        assert!(!result);
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        let result = verify_password("test", "invalid_hash");
        assert!(result.is_err());
    }

    #[test]
    fn test_password_strength_rules() {
        assert!(validate_password_strength("Abcdef12").is_ok());
        // Too short
        assert!(validate_password_strength("Ab1").is_err());
        // No digit
        assert!(validate_password_strength("Abcdefgh").is_err());
        // No uppercase
        assert!(validate_password_strength("abcdefg1").is_err());
        // No lowercase
        assert!(validate_password_strength("ABCDEFG1").is_err());
    }

    #[tokio::test]
    async fn test_signup_duplicate_email_conflicts() {
        let existing = create_test_user("user1", "ana@example.com", "hash");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .into_connection(),
        );

        let service = create_test_service(db);
        let result = service
            .signup(SignupInput {
                firstname: "Ana".to_string(),
                lastname: "Lopez".to_string(),
                email: "ana@example.com".to_string(),
                mobile: None,
                password: "Abcdef12".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_signup_weak_password_rejected() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_test_service(db);
        let result = service
            .signup(SignupInput {
                firstname: "Ana".to_string(),
                lastname: "Lopez".to_string(),
                email: "ana@example.com".to_string(),
                mobile: None,
                password: "abcdefgh".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_login_wrong_password_rejected() {
        let hash = hash_password("Correct1pass").unwrap();
        let user = create_test_user("user1", "ana@example.com", &hash);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );

        let service = create_test_service(db);
        let result = service
            .login(LoginInput {
                email: "ana@example.com".to_string(),
                password: "Wrong1password".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_login_blocked_user_rejected() {
        let hash = hash_password("Correct1pass").unwrap();
        let mut user = create_test_user("user1", "ana@example.com", &hash);
        user.is_blocked = true;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );

        let service = create_test_service(db);
        let result = service
            .login(LoginInput {
                email: "ana@example.com".to_string(),
                password: "Correct1pass".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_login_happy_path_issues_token() {
        let hash = hash_password("Correct1pass").unwrap();
        let user = create_test_user("user1", "ana@example.com", &hash);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .append_query_results([[create_test_session("placeholder")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let service = create_test_service(db);
        let (logged_in, token) = service
            .login(LoginInput {
                email: "ana@example.com".to_string(),
                password: "Correct1pass".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(logged_in.id, "user1");
        assert!(!token.is_empty());
    }

    #[tokio::test]
    async fn test_forgot_password_unknown_email_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let service = create_test_service(db);
        let result = service.forgot_password("nadie@example.com").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_forgot_password_stores_token() {
        let user = create_test_user("user1", "ana@example.com", "hash");
        let mut with_token = user.clone();
        with_token.password_reset_token = Some("token".to_string());
        with_token.password_reset_expires =
            Some((Utc::now() + chrono::Duration::minutes(30)).into());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .append_query_results([[with_token]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let service = create_test_service(db);
        let result = service.forgot_password("ana@example.com").await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_reset_password_weak_password_rejected() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_test_service(db);
        let result = service.reset_password("token", "abcdefgh").await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_reset_password_unknown_token_rejected() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let service = create_test_service(db);
        let result = service.reset_password("stale-token", "Abcdef12").await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_reset_password_expired_token_rejected() {
        let mut user = create_test_user("user1", "ana@example.com", "hash");
        user.password_reset_token = Some("old-token".to_string());
        user.password_reset_expires = Some((Utc::now() - chrono::Duration::minutes(5)).into());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );

        let service = create_test_service(db);
        let result = service.reset_password("old-token", "Abcdef12").await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_reset_password_clears_token_and_revokes_sessions() {
        let mut user = create_test_user("user1", "ana@example.com", "hash");
        user.password_reset_token = Some("valid-token".to_string());
        user.password_reset_expires = Some((Utc::now() + chrono::Duration::minutes(10)).into());

        let cleared = create_test_user("user1", "ana@example.com", "newhash");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .append_query_results([[cleared]])
                // Session revocation (delete_many)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .into_connection(),
        );

        let service = create_test_service(db);
        let updated = service
            .reset_password("valid-token", "Abcdef12")
            .await
            .unwrap();

        assert!(updated.password_reset_token.is_none());
        assert!(updated.password_reset_expires.is_none());
    }

    #[tokio::test]
    async fn test_list_all_returns_every_account() {
        let users = vec![
            create_test_user("user2", "beto@example.com", "hash"),
            create_test_user("user1", "ana@example.com", "hash"),
        ];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([users])
                .into_connection(),
        );

        let service = create_test_service(db);
        let result = service.list_all().await.unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_update_other_account_forbidden() {
        let caller = create_test_user("user1", "ana@example.com", "hash");

        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_test_service(db);
        let result = service
            .update(&caller, "user2", UpdateUserInput::default())
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
