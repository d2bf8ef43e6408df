use axum::{
    Extension, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::{
    TransactionTrait,
    models::calendar_event::{CalendarEvent, CreateCalendarEvent, UpdateCalendarEvent},
};
use deployment::Deployment;
use utils::response::ApiResponse;

use crate::{
    DeploymentImpl, error::ApiError, extract::ApiJson, http::auth::Caller,
    middleware::load_calendar_event_middleware,
};

pub async fn get_events(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<CalendarEvent>>>, ApiError> {
    let events = deployment
        .calendar()
        .list_events(&deployment.db().pool)
        .await?;
    Ok(ResponseJson(ApiResponse::success(events)))
}

pub async fn get_event(
    Extension(event): Extension<CalendarEvent>,
) -> Result<ResponseJson<ApiResponse<CalendarEvent>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(event)))
}

pub async fn create_event(
    Caller(caller): Caller,
    State(deployment): State<DeploymentImpl>,
    ApiJson(payload): ApiJson<CreateCalendarEvent>,
) -> Result<ResponseJson<ApiResponse<CalendarEvent>>, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Event title is required".to_string()));
    }
    let tx = deployment.db().pool.begin().await?;
    let (event, outcome) = deployment
        .calendar()
        .create_event(&tx, &caller, &payload)
        .await?;
    tx.commit().await?;

    if !outcome.is_empty() {
        tracing::info!(event_id = %event.id, ?outcome, "Calendar event created with order linkage");
    }
    Ok(ResponseJson(ApiResponse::success(event)))
}

pub async fn update_event(
    Extension(existing): Extension<CalendarEvent>,
    State(deployment): State<DeploymentImpl>,
    ApiJson(payload): ApiJson<UpdateCalendarEvent>,
) -> Result<ResponseJson<ApiResponse<CalendarEvent>>, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Event title is required".to_string()));
    }
    let tx = deployment.db().pool.begin().await?;
    let (event, outcome) = deployment
        .calendar()
        .update_event(&tx, existing.id, &payload)
        .await?;
    tx.commit().await?;

    if !outcome.is_empty() {
        tracing::info!(event_id = %event.id, ?outcome, "Calendar event updated with order linkage");
    }
    Ok(ResponseJson(ApiResponse::success(event)))
}

pub async fn delete_event(
    Extension(existing): Extension<CalendarEvent>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let tx = deployment.db().pool.begin().await?;
    deployment.calendar().delete_event(&tx, existing.id).await?;
    tx.commit().await?;

    tracing::info!(event_id = %existing.id, "Deleted calendar event");
    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Event deleted successfully",
    )))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let event_router = Router::new()
        .route("/", get(get_event).put(update_event).delete(delete_event))
        .layer(from_fn_with_state(
            deployment.clone(),
            load_calendar_event_middleware::<DeploymentImpl>,
        ));

    let inner = Router::new()
        .route("/", get(get_events).post(create_event))
        .nest("/{event_id}", event_router);

    Router::new().nest("/calendar", inner)
}
