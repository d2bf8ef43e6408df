use axum::{
    Extension, Router,
    extract::State,
    middleware::{from_fn, from_fn_with_state},
    response::Json as ResponseJson,
    routing::{get, put},
};
use db::models::task_type::{CreateTaskType, TaskType, UpdateTaskType};
use deployment::Deployment;
use utils::response::ApiResponse;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::ApiJson,
    http::auth::{AdminCaller, require_admin},
    middleware::load_task_type_middleware,
};

pub async fn get_task_types(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<TaskType>>>, ApiError> {
    let task_types = TaskType::find_all(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(task_types)))
}

pub async fn create_task_type(
    AdminCaller(admin): AdminCaller,
    State(deployment): State<DeploymentImpl>,
    ApiJson(payload): ApiJson<CreateTaskType>,
) -> Result<ResponseJson<ApiResponse<TaskType>>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Task type name is required".to_string()));
    }
    let task_type = TaskType::create(&deployment.db().pool, &payload, Some(admin.id)).await?;
    Ok(ResponseJson(ApiResponse::success(task_type)))
}

pub async fn update_task_type(
    Extension(existing): Extension<TaskType>,
    State(deployment): State<DeploymentImpl>,
    ApiJson(payload): ApiJson<UpdateTaskType>,
) -> Result<ResponseJson<ApiResponse<TaskType>>, ApiError> {
    let task_type = TaskType::update(&deployment.db().pool, existing.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(task_type)))
}

pub async fn delete_task_type(
    Extension(existing): Extension<TaskType>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = TaskType::delete(&deployment.db().pool, existing.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("Task type not found".to_string()));
    }
    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Task type deleted successfully",
    )))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let task_type_router = Router::new()
        .route("/", put(update_task_type).delete(delete_task_type))
        .layer(from_fn_with_state(
            deployment.clone(),
            load_task_type_middleware::<DeploymentImpl>,
        ))
        .layer(from_fn(require_admin));

    let inner = Router::new()
        .route("/", get(get_task_types).post(create_task_type))
        .nest("/{task_type_id}", task_type_router);

    Router::new().nest("/task-types", inner)
}
