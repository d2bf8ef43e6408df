use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::user::User;
use deployment::Deployment;
use services::services::identity::{AuthResponse, LoginRequest, RegisterRequest};
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, extract::ApiJson, http::auth::Caller};

pub async fn register(
    State(deployment): State<DeploymentImpl>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<ResponseJson<ApiResponse<AuthResponse>>, ApiError> {
    let response = deployment
        .identity()
        .register(&deployment.db().pool, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(response)))
}

pub async fn login(
    State(deployment): State<DeploymentImpl>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<ResponseJson<ApiResponse<AuthResponse>>, ApiError> {
    let response = deployment
        .identity()
        .authenticate(&deployment.db().pool, &payload.email, &payload.password)
        .await?;
    Ok(ResponseJson(ApiResponse::success(response)))
}

pub async fn me(Caller(user): Caller) -> ResponseJson<ApiResponse<User>> {
    ResponseJson(ApiResponse::success(user))
}

/// Routes reachable without a token.
pub fn public_router() -> Router<DeploymentImpl> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new().route("/auth/me", get(me))
}
