use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chrono::Duration;
use db::{
    DBService,
    models::user::User,
    rules::EventTypeRules,
    types::UserRole,
};
use deployment::Deployment;
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use secrecy::SecretString;
use serde_json::Value;
use services::services::{
    config::{Config, CorsOrigins, DEFAULT_HOST, DEFAULT_PORT},
    identity::{CreateUserRequest, IdentityService},
};
use tower::ServiceExt;

use crate::DeploymentImpl;

pub const TEST_PASSWORD: &str = "secret-password";

/// A deployment over a fresh, migrated in-memory database.
pub async fn test_deployment() -> DeploymentImpl {
    let pool = Database::connect("sqlite::memory:").await.unwrap();
    db_migration::Migrator::up(&pool, None).await.unwrap();

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: SecretString::from("test-secret"),
        token_ttl: Duration::days(7),
        cors_origins: CorsOrigins::Any,
        host: DEFAULT_HOST.to_string(),
        port: DEFAULT_PORT,
        rules: EventTypeRules::default(),
        admin: None,
    };
    let identity =
        IdentityService::new(config.jwt_secret.clone(), config.token_ttl).with_bcrypt_cost(4);
    DeploymentImpl::with_identity(config, DBService::from_connection(pool), identity)
}

/// Creates a user and returns it with a bearer token.
pub async fn create_user_with_token(
    deployment: &DeploymentImpl,
    email: &str,
    role: UserRole,
) -> (User, String) {
    let user = deployment
        .identity()
        .create_user(
            &deployment.db().pool,
            &CreateUserRequest {
                email: email.to_string(),
                password: TEST_PASSWORD.to_string(),
                name: email.split('@').next().unwrap_or(email).to_string(),
                role,
            },
        )
        .await
        .unwrap();
    let token = deployment.identity().issue_token(&user).unwrap();
    (user, token)
}

/// Sends one request through the router and decodes the JSON envelope.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
