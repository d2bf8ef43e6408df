use axum::{
    Extension, Router,
    extract::{Query, State, rejection::QueryRejection},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::{models::order::Order, types::OrderStatus};
use deployment::Deployment;
use serde::Deserialize;
use services::services::linkage::LinkedEvent;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, middleware::load_order_middleware};

#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

pub async fn get_orders(
    State(deployment): State<DeploymentImpl>,
    query: Result<Query<OrderQuery>, QueryRejection>,
) -> Result<ResponseJson<ApiResponse<Vec<Order>>>, ApiError> {
    let Query(query) = query?;
    let status = query.status.unwrap_or(OrderStatus::Active);
    let orders = Order::find_by_status(&deployment.db().pool, status).await?;
    Ok(ResponseJson(ApiResponse::success(orders)))
}

pub async fn get_order(
    Extension(order): Extension<Order>,
) -> Result<ResponseJson<ApiResponse<Order>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(order)))
}

pub async fn get_linked_events(
    Extension(order): Extension<Order>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<LinkedEvent>>>, ApiError> {
    let events = deployment
        .linkage()
        .list_linked_events(&deployment.db().pool, order.id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(events)))
}

/// Marks the order deleted. The row and its links are kept.
pub async fn delete_order(
    Extension(order): Extension<Order>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    deployment
        .linkage()
        .soft_delete_order(&deployment.db().pool, order.id)
        .await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Order deleted successfully",
    )))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let order_router = Router::new()
        .route("/", get(get_order).delete(delete_order))
        .route("/linked-events", get(get_linked_events))
        .layer(from_fn_with_state(
            deployment.clone(),
            load_order_middleware::<DeploymentImpl>,
        ));

    let inner = Router::new()
        .route("/", get(get_orders))
        .nest("/{order_id}", order_router);

    Router::new().nest("/orders", inner)
}
