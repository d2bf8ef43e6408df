use axum::{
    Extension, Router,
    extract::State,
    middleware::{from_fn, from_fn_with_state},
    response::Json as ResponseJson,
    routing::{get, put},
};
use db::models::user::User;
use deployment::Deployment;
use services::services::identity::{CreateUserRequest, UpdateUserRequest};
use utils::response::ApiResponse;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::ApiJson,
    http::auth::{AdminCaller, require_admin},
    middleware::load_user_middleware,
};

pub async fn get_users(
    _admin: AdminCaller,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<User>>>, ApiError> {
    let users = deployment
        .identity()
        .list_users(&deployment.db().pool)
        .await?;
    Ok(ResponseJson(ApiResponse::success(users)))
}

pub async fn create_user(
    AdminCaller(admin): AdminCaller,
    State(deployment): State<DeploymentImpl>,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let user = deployment
        .identity()
        .create_user(&deployment.db().pool, &payload)
        .await?;
    tracing::info!(admin_id = %admin.id, user_id = %user.id, role = %user.role, "Created user");
    Ok(ResponseJson(ApiResponse::success(user)))
}

pub async fn update_user(
    Extension(existing): Extension<User>,
    State(deployment): State<DeploymentImpl>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let user = deployment
        .identity()
        .update_user(&deployment.db().pool, existing.id, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(user)))
}

pub async fn delete_user(
    Extension(existing): Extension<User>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    deployment
        .identity()
        .delete_user(&deployment.db().pool, existing.id)
        .await?;
    tracing::info!(user_id = %existing.id, "Deleted user");
    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "User deleted successfully",
    )))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let user_router = Router::new()
        .route("/", put(update_user).delete(delete_user))
        .layer(from_fn_with_state(
            deployment.clone(),
            load_user_middleware::<DeploymentImpl>,
        ))
        .layer(from_fn(require_admin));

    let inner = Router::new()
        .route("/", get(get_users).post(create_user))
        .nest("/{user_id}", user_router);

    Router::new().nest("/users", inner)
}
