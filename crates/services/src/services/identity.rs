//! Accounts, password verification and bearer tokens.
//!
//! Tokens only carry the user uuid. Every request re-reads the user row, so a
//! deleted account or a role change takes effect immediately.

use chrono::Duration;
use db::{
    ConnectionTrait, DbErr, is_unique_violation,
    models::user::{CreateUser, UpdateUser, User},
    types::UserRole,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utils_jwt::{JwtError, decode_token, encode_token};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("{0}")]
    Validation(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("Email already registered")]
    EmailTaken,
    #[error("User not found")]
    UserNotFound,
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
    #[error(transparent)]
    Token(#[from] JwtError),
    #[error(transparent)]
    Database(#[from] DbErr),
}

#[derive(Debug, Clone, Deserialize, Validate, TS)]
#[ts(export)]
pub struct RegisterRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, TS)]
#[ts(export)]
pub struct CreateUserRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub name: String,
    #[serde(default)]
    pub role: UserRole,
}

/// Partial update of an account. A blank password leaves the current one.
#[derive(Debug, Clone, Default, Deserialize, Validate, TS)]
#[ts(export)]
pub struct UpdateUserRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub name: Option<String>,
    pub role: Option<UserRole>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: User,
}

#[derive(Clone)]
pub struct IdentityService {
    jwt_secret: SecretString,
    token_ttl: Duration,
    bcrypt_cost: u32,
}

impl IdentityService {
    pub fn new(jwt_secret: SecretString, token_ttl: Duration) -> Self {
        Self {
            jwt_secret,
            token_ttl,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Overrides the bcrypt work factor. Tests use the minimum.
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    pub fn issue_token(&self, user: &User) -> Result<String, IdentityError> {
        Ok(encode_token(
            user.id,
            self.jwt_secret.expose_secret().as_bytes(),
            self.token_ttl,
        )?)
    }

    fn auth_response(&self, user: User) -> Result<AuthResponse, IdentityError> {
        Ok(AuthResponse {
            access_token: self.issue_token(&user)?,
            token_type: "bearer".to_string(),
            user,
        })
    }

    async fn hash_password(&self, password: &str) -> Result<String, IdentityError> {
        let password = password.to_string();
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|err| IdentityError::PasswordHash(err.to_string()))?
            .map_err(|err| IdentityError::PasswordHash(err.to_string()))
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, IdentityError> {
        let password = password.to_string();
        let hash = hash.to_string();
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|err| IdentityError::PasswordHash(err.to_string()))?;
        // A malformed stored hash can never match.
        Ok(verified.unwrap_or(false))
    }

    async fn insert_user<C: ConnectionTrait>(
        &self,
        db: &C,
        email: &str,
        name: &str,
        password: &str,
        role: UserRole,
    ) -> Result<User, IdentityError> {
        if User::find_by_email(db, email).await?.is_some() {
            return Err(IdentityError::EmailTaken);
        }
        let password_hash = self.hash_password(password).await?;
        User::create(
            db,
            &CreateUser {
                email: email.to_string(),
                name: name.to_string(),
                password_hash,
                role,
            },
        )
        .await
        .map_err(map_unique_email)
    }

    /// Public sign-up. Always creates a `user` account.
    pub async fn register<C: ConnectionTrait>(
        &self,
        db: &C,
        request: &RegisterRequest,
    ) -> Result<AuthResponse, IdentityError> {
        request
            .validate()
            .map_err(|errors| IdentityError::Validation(validation_message(&errors)))?;
        let user = self
            .insert_user(
                db,
                &request.email,
                &request.name,
                &request.password,
                UserRole::User,
            )
            .await?;
        tracing::info!(user_id = %user.id, "Registered user");
        self.auth_response(user)
    }

    pub async fn authenticate<C: ConnectionTrait>(
        &self,
        db: &C,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, IdentityError> {
        let Some((user, hash)) = User::find_credentials_by_email(db, email).await? else {
            return Err(IdentityError::InvalidCredentials);
        };
        if !self.verify_password(password, &hash).await? {
            return Err(IdentityError::InvalidCredentials);
        }
        self.auth_response(user)
    }

    /// Resolves a bearer token to the current state of its user.
    pub async fn resolve_caller<C: ConnectionTrait>(
        &self,
        db: &C,
        token: &str,
    ) -> Result<User, IdentityError> {
        let claims = decode_token(token, self.jwt_secret.expose_secret().as_bytes()).map_err(
            |err| {
                tracing::debug!("Rejected bearer token: {}", err);
                IdentityError::InvalidToken
            },
        )?;
        User::find_by_id(db, claims.sub)
            .await?
            .ok_or(IdentityError::InvalidToken)
    }

    pub async fn list_users<C: ConnectionTrait>(&self, db: &C) -> Result<Vec<User>, IdentityError> {
        Ok(User::find_all(db).await?)
    }

    pub async fn create_user<C: ConnectionTrait>(
        &self,
        db: &C,
        request: &CreateUserRequest,
    ) -> Result<User, IdentityError> {
        request
            .validate()
            .map_err(|errors| IdentityError::Validation(validation_message(&errors)))?;
        self.insert_user(
            db,
            &request.email,
            &request.name,
            &request.password,
            request.role,
        )
        .await
    }

    pub async fn update_user<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: Uuid,
        request: &UpdateUserRequest,
    ) -> Result<User, IdentityError> {
        request
            .validate()
            .map_err(|errors| IdentityError::Validation(validation_message(&errors)))?;

        let existing = User::find_by_id(db, user_id)
            .await?
            .ok_or(IdentityError::UserNotFound)?;

        if let Some(email) = request.email.as_deref() {
            if email != existing.email && User::find_by_email(db, email).await?.is_some() {
                return Err(IdentityError::EmailTaken);
            }
        }

        let password_hash = match request.password.as_deref() {
            Some(password) if !password.is_empty() => Some(self.hash_password(password).await?),
            _ => None,
        };

        User::update(
            db,
            user_id,
            &UpdateUser {
                email: request.email.clone(),
                name: request.name.clone(),
                role: request.role,
                password_hash,
            },
        )
        .await
        .map_err(map_unique_email)
    }

    pub async fn delete_user<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: Uuid,
    ) -> Result<(), IdentityError> {
        if User::delete(db, user_id).await? == 0 {
            return Err(IdentityError::UserNotFound);
        }
        Ok(())
    }
}

fn map_unique_email(err: DbErr) -> IdentityError {
    if is_unique_violation(&err) {
        IdentityError::EmailTaken
    } else if matches!(err, DbErr::RecordNotFound(_)) {
        IdentityError::UserNotFound
    } else {
        IdentityError::Database(err)
    }
}

/// Flattens validator output into one line, e.g. `email: must be a valid email address`.
fn validation_message(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |error| {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("failed {}", error.code));
                format!("{field}: {message}")
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    fn service() -> IdentityService {
        IdentityService::new(SecretString::from("test-secret"), Duration::days(7))
            .with_bcrypt_cost(4)
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "secret1".to_string(),
            name: "Ana".to_string(),
        }
    }

    #[tokio::test]
    async fn register_then_login_and_resolve() {
        let db = setup_db().await;
        let identity = service();

        let registered = identity
            .register(&db, &register_request("ana@example.com"))
            .await
            .unwrap();
        assert_eq!(registered.token_type, "bearer");
        assert_eq!(registered.user.role, UserRole::User);

        let login = identity
            .authenticate(&db, "ana@example.com", "secret1")
            .await
            .unwrap();
        let caller = identity
            .resolve_caller(&db, &login.access_token)
            .await
            .unwrap();
        assert_eq!(caller.id, registered.user.id);
    }

    #[tokio::test]
    async fn bad_credentials_are_indistinguishable() {
        let db = setup_db().await;
        let identity = service();
        identity
            .register(&db, &register_request("ana@example.com"))
            .await
            .unwrap();

        let wrong_password = identity
            .authenticate(&db, "ana@example.com", "nope")
            .await
            .unwrap_err();
        let unknown_email = identity
            .authenticate(&db, "who@example.com", "secret1")
            .await
            .unwrap_err();
        assert_eq!(wrong_password.to_string(), "invalid credentials");
        assert_eq!(unknown_email.to_string(), "invalid credentials");
    }

    #[tokio::test]
    async fn register_validates_and_rejects_duplicates() {
        let db = setup_db().await;
        let identity = service();

        let mut bad = register_request("not-an-email");
        bad.password = "123".to_string();
        let err = identity.register(&db, &bad).await.unwrap_err();
        match err {
            IdentityError::Validation(message) => {
                assert!(message.contains("email"));
                assert!(message.contains("password"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        identity
            .register(&db, &register_request("dup@example.com"))
            .await
            .unwrap();
        assert!(matches!(
            identity
                .register(&db, &register_request("dup@example.com"))
                .await,
            Err(IdentityError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn token_of_deleted_user_is_rejected() {
        let db = setup_db().await;
        let identity = service();
        let registered = identity
            .register(&db, &register_request("gone@example.com"))
            .await
            .unwrap();
        identity
            .delete_user(&db, registered.user.id)
            .await
            .unwrap();

        let err = identity
            .resolve_caller(&db, &registered.access_token)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid or expired token");
        assert!(matches!(
            identity.resolve_caller(&db, "garbage").await,
            Err(IdentityError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn admin_update_ignores_blank_password_and_guards_email() {
        let db = setup_db().await;
        let identity = service();
        let ana = identity
            .create_user(
                &db,
                &CreateUserRequest {
                    email: "ana@example.com".to_string(),
                    password: "secret1".to_string(),
                    name: "Ana".to_string(),
                    role: UserRole::Admin,
                },
            )
            .await
            .unwrap();
        assert_eq!(ana.role, UserRole::Admin);
        identity
            .register(&db, &register_request("bob@example.com"))
            .await
            .unwrap();

        let updated = identity
            .update_user(
                &db,
                ana.id,
                &UpdateUserRequest {
                    name: Some("Ana María".to_string()),
                    password: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Ana María");
        identity
            .authenticate(&db, "ana@example.com", "secret1")
            .await
            .unwrap();

        let err = identity
            .update_user(
                &db,
                ana.id,
                &UpdateUserRequest {
                    email: Some("bob@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::EmailTaken));

        identity
            .update_user(
                &db,
                ana.id,
                &UpdateUserRequest {
                    password: Some("newpass".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        identity
            .authenticate(&db, "ana@example.com", "newpass")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_users_are_not_found() {
        let db = setup_db().await;
        let identity = service();
        assert!(matches!(
            identity.delete_user(&db, Uuid::new_v4()).await,
            Err(IdentityError::UserNotFound)
        ));
        assert!(matches!(
            identity
                .update_user(&db, Uuid::new_v4(), &UpdateUserRequest::default())
                .await,
            Err(IdentityError::UserNotFound)
        ));
    }
}
