use axum::{
    Extension, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{delete, post},
};
use db::{
    TransactionTrait,
    models::event_link::{CreateEventLink, EventLink},
};
use deployment::Deployment;
use utils::response::ApiResponse;

use crate::{
    DeploymentImpl, error::ApiError, extract::ApiJson, middleware::load_event_link_middleware,
};

pub async fn create_link(
    State(deployment): State<DeploymentImpl>,
    ApiJson(payload): ApiJson<CreateEventLink>,
) -> Result<ResponseJson<ApiResponse<EventLink>>, ApiError> {
    let tx = deployment.db().pool.begin().await?;
    let (link, outcome) = deployment
        .linkage()
        .create_link(&tx, payload.order_id, payload.event_id)
        .await?;
    tx.commit().await?;

    tracing::info!(link_id = %link.id, ?outcome, "Linked event to order");
    Ok(ResponseJson(ApiResponse::success(link)))
}

pub async fn delete_link(
    Extension(link): Extension<EventLink>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let tx = deployment.db().pool.begin().await?;
    deployment.linkage().delete_link(&tx, link.id).await?;
    tx.commit().await?;

    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Link deleted successfully",
    )))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let link_router = Router::new()
        .route("/", delete(delete_link))
        .layer(from_fn_with_state(
            deployment.clone(),
            load_event_link_middleware::<DeploymentImpl>,
        ));

    let inner = Router::new()
        .route("/", post(create_link))
        .nest("/{link_id}", link_router);

    Router::new().nest("/event-links", inner)
}
