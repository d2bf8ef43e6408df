use axum::{
    Extension, Router,
    extract::State,
    middleware::{from_fn, from_fn_with_state},
    response::Json as ResponseJson,
    routing::{get, put},
};
use db::{
    DbErr, is_foreign_key_violation,
    models::event_type::{CreateEventType, EventType, UpdateEventType},
};
use deployment::Deployment;
use utils::response::ApiResponse;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::ApiJson,
    http::auth::{AdminCaller, require_admin},
    middleware::load_event_type_middleware,
};

fn map_delete_error(err: DbErr) -> ApiError {
    if is_foreign_key_violation(&err) {
        ApiError::Conflict("Event type is still used by calendar events".to_string())
    } else {
        ApiError::Database(err)
    }
}

pub async fn get_event_types(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<EventType>>>, ApiError> {
    let event_types =
        EventType::find_all(&deployment.db().pool, deployment.linkage().rules()).await?;
    Ok(ResponseJson(ApiResponse::success(event_types)))
}

pub async fn create_event_type(
    AdminCaller(admin): AdminCaller,
    State(deployment): State<DeploymentImpl>,
    ApiJson(payload): ApiJson<CreateEventType>,
) -> Result<ResponseJson<ApiResponse<EventType>>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Event type name is required".to_string()));
    }
    let event_type = EventType::create(
        &deployment.db().pool,
        deployment.linkage().rules(),
        &payload,
        Some(admin.id),
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(event_type)))
}

pub async fn update_event_type(
    Extension(existing): Extension<EventType>,
    State(deployment): State<DeploymentImpl>,
    ApiJson(payload): ApiJson<UpdateEventType>,
) -> Result<ResponseJson<ApiResponse<EventType>>, ApiError> {
    if payload.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(ApiError::BadRequest("Event type name is required".to_string()));
    }
    let event_type = EventType::update(
        &deployment.db().pool,
        deployment.linkage().rules(),
        existing.id,
        &payload,
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(event_type)))
}

pub async fn delete_event_type(
    Extension(existing): Extension<EventType>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = EventType::delete(&deployment.db().pool, existing.id)
        .await
        .map_err(map_delete_error)?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("Event type not found".to_string()));
    }
    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Event type deleted successfully",
    )))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let event_type_router = Router::new()
        .route("/", put(update_event_type).delete(delete_event_type))
        .layer(from_fn_with_state(
            deployment.clone(),
            load_event_type_middleware::<DeploymentImpl>,
        ))
        .layer(from_fn(require_admin));

    let inner = Router::new()
        .route("/", get(get_event_types).post(create_event_type))
        .nest("/{event_type_id}", event_type_router);

    Router::new().nest("/event-types", inner)
}
