use std::{fmt::Display, future::Future};

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use db::{
    DBService, DbErr,
    models::{
        calendar_event::CalendarEvent, event_link::EventLink, event_type::EventType,
        kanban_task::KanbanTask, order::Order, task_type::TaskType, user::User,
    },
    rules::EventTypeRules,
};
use deployment::Deployment;
use uuid::Uuid;

pub trait ModelLoaderDeps {
    fn db_service(&self) -> &DBService;

    fn event_type_rules(&self) -> &EventTypeRules;
}

impl<D> ModelLoaderDeps for D
where
    D: Deployment,
{
    fn db_service(&self) -> &DBService {
        self.db()
    }

    fn event_type_rules(&self) -> &EventTypeRules {
        self.linkage().rules()
    }
}

/// Path segments that are not uuids cannot name a row, so they are a 404
/// like any other unknown id.
fn parse_model_id(model_name: &'static str, raw: &str) -> Result<Uuid, StatusCode> {
    Uuid::parse_str(raw).map_err(|_| {
        tracing::warn!("{model_name} id {raw:?} is not a valid uuid");
        StatusCode::NOT_FOUND
    })
}

async fn fetch_model_or_status<M, E, Fut>(
    model_name: &'static str,
    model_id: Uuid,
    load_future: Fut,
) -> Result<M, StatusCode>
where
    E: Display,
    Fut: Future<Output = Result<Option<M>, E>>,
{
    match load_future.await {
        Ok(Some(model)) => Ok(model),
        Ok(None) => {
            tracing::warn!("{model_name} {model_id} not found");
            Err(StatusCode::NOT_FOUND)
        }
        Err(error) => {
            tracing::error!("Failed to fetch {model_name} {model_id}: {error}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn load_request_extension<M, E, Fut>(
    request: Request,
    next: Next,
    model_name: &'static str,
    model_id: Uuid,
    load_future: Fut,
) -> Result<Response, StatusCode>
where
    M: Clone + Send + Sync + 'static,
    E: Display,
    Fut: Future<Output = Result<Option<M>, E>>,
{
    let model = fetch_model_or_status(model_name, model_id, load_future).await?;
    let mut request = request;
    request.extensions_mut().insert(model);
    Ok(next.run(request).await)
}

pub async fn load_user_middleware<S>(
    State(deployment): State<S>,
    Path(user_id): Path<String>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode>
where
    S: ModelLoaderDeps,
{
    let user_id = parse_model_id("User", &user_id)?;
    load_request_extension(
        request,
        next,
        "User",
        user_id,
        User::find_by_id(&deployment.db_service().pool, user_id),
    )
    .await
}

pub async fn load_event_type_middleware<S>(
    State(deployment): State<S>,
    Path(event_type_id): Path<String>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode>
where
    S: ModelLoaderDeps,
{
    let event_type_id = parse_model_id("EventType", &event_type_id)?;
    load_request_extension(
        request,
        next,
        "EventType",
        event_type_id,
        EventType::find_by_id(
            &deployment.db_service().pool,
            deployment.event_type_rules(),
            event_type_id,
        ),
    )
    .await
}

pub async fn load_task_type_middleware<S>(
    State(deployment): State<S>,
    Path(task_type_id): Path<String>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode>
where
    S: ModelLoaderDeps,
{
    let task_type_id = parse_model_id("TaskType", &task_type_id)?;
    load_request_extension(
        request,
        next,
        "TaskType",
        task_type_id,
        TaskType::find_by_id(&deployment.db_service().pool, task_type_id),
    )
    .await
}

pub async fn load_calendar_event_middleware<S>(
    State(deployment): State<S>,
    Path(event_id): Path<String>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode>
where
    S: ModelLoaderDeps,
{
    let event_id = parse_model_id("CalendarEvent", &event_id)?;
    load_request_extension(
        request,
        next,
        "CalendarEvent",
        event_id,
        CalendarEvent::find_by_id(&deployment.db_service().pool, event_id),
    )
    .await
}

pub async fn load_kanban_task_middleware<S>(
    State(deployment): State<S>,
    Path(task_id): Path<String>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode>
where
    S: ModelLoaderDeps,
{
    let task_id = parse_model_id("KanbanTask", &task_id)?;
    load_request_extension(
        request,
        next,
        "KanbanTask",
        task_id,
        KanbanTask::find_by_id(&deployment.db_service().pool, task_id),
    )
    .await
}

pub async fn load_order_middleware<S>(
    State(deployment): State<S>,
    Path(order_id): Path<String>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode>
where
    S: ModelLoaderDeps,
{
    let order_id = parse_model_id("Order", &order_id)?;
    load_request_extension(
        request,
        next,
        "Order",
        order_id,
        Order::find_by_id(&deployment.db_service().pool, order_id),
    )
    .await
}

pub async fn load_event_link_middleware<S>(
    State(deployment): State<S>,
    Path(link_id): Path<String>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode>
where
    S: ModelLoaderDeps,
{
    let link_id = parse_model_id("EventLink", &link_id)?;
    let pool = &deployment.db_service().pool;
    load_request_extension(request, next, "EventLink", link_id, async move {
        match EventLink::find_model_by_id(pool, link_id).await? {
            Some(model) => Ok::<_, DbErr>(Some(EventLink::from_model(pool, model).await?)),
            None => Ok(None),
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::{fetch_model_or_status, parse_model_id};

    #[tokio::test]
    async fn fetch_model_or_status_returns_not_found_on_missing_model() {
        let result = fetch_model_or_status::<String, &'static str, _>(
            "Order",
            uuid::Uuid::new_v4(),
            async { Ok(None) },
        )
        .await;

        assert_eq!(result.unwrap_err(), axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn fetch_model_or_status_returns_internal_error_on_fetch_failure() {
        let result = fetch_model_or_status::<String, &'static str, _>(
            "Order",
            uuid::Uuid::new_v4(),
            async { Err("db unavailable") },
        )
        .await;

        assert_eq!(
            result.unwrap_err(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn malformed_ids_are_not_found() {
        assert_eq!(
            parse_model_id("Order", "not-a-uuid").unwrap_err(),
            axum::http::StatusCode::NOT_FOUND
        );
        assert!(parse_model_id("Order", "7f1c7a55-6c1b-4c5e-8d7e-2f6f0b7f9a10").is_ok());
    }
}
