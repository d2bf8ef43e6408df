use axum::{
    Extension, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::kanban_task::{CreateKanbanTask, KanbanTask, UpdateKanbanTask};
use deployment::Deployment;
use utils::response::ApiResponse;

use crate::{
    DeploymentImpl, error::ApiError, extract::ApiJson, http::auth::Caller,
    middleware::load_kanban_task_middleware,
};

pub async fn get_tasks(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<KanbanTask>>>, ApiError> {
    let tasks = KanbanTask::find_all(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

pub async fn get_task(
    Extension(task): Extension<KanbanTask>,
) -> Result<ResponseJson<ApiResponse<KanbanTask>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn create_task(
    Caller(caller): Caller,
    State(deployment): State<DeploymentImpl>,
    ApiJson(payload): ApiJson<CreateKanbanTask>,
) -> Result<ResponseJson<ApiResponse<KanbanTask>>, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Task title is required".to_string()));
    }
    let task = KanbanTask::create(&deployment.db().pool, &payload, Some(caller.id)).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn update_task(
    Extension(existing): Extension<KanbanTask>,
    State(deployment): State<DeploymentImpl>,
    ApiJson(payload): ApiJson<UpdateKanbanTask>,
) -> Result<ResponseJson<ApiResponse<KanbanTask>>, ApiError> {
    if payload.is_empty() {
        return Err(ApiError::BadRequest("No data to update".to_string()));
    }
    let task = KanbanTask::update(&deployment.db().pool, existing.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn delete_task(
    Extension(existing): Extension<KanbanTask>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = KanbanTask::delete(&deployment.db().pool, existing.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }
    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Task deleted successfully",
    )))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let task_router = Router::new()
        .route("/", get(get_task).put(update_task).delete(delete_task))
        .layer(from_fn_with_state(
            deployment.clone(),
            load_kanban_task_middleware::<DeploymentImpl>,
        ));

    let inner = Router::new()
        .route("/", get(get_tasks).post(create_task))
        .nest("/{task_id}", task_router);

    Router::new().nest("/kanban", inner)
}
