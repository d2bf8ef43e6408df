use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    middleware::from_fn_with_state,
    routing::get,
};
use deployment::Deployment;
use services::services::config::CorsOrigins;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{DeploymentImpl, routes};

pub mod auth;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(deployment: DeploymentImpl) -> Router {
    let protected_routes = Router::new()
        .merge(routes::auth::router())
        .merge(routes::users::router(&deployment))
        .merge(routes::event_types::router(&deployment))
        .merge(routes::task_types::router(&deployment))
        .merge(routes::calendar::router(&deployment))
        .merge(routes::kanban::router(&deployment))
        .merge(routes::orders::router(&deployment))
        .merge(routes::event_links::router(&deployment))
        .layer(from_fn_with_state(
            deployment.clone(),
            auth::require_api_auth,
        ));

    let api_routes = Router::new()
        .merge(routes::auth::public_router())
        .merge(protected_routes);

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let cors = cors_layer(&deployment.config().cors_origins);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .with_state(deployment)
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(cors)
}

fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)]);

    match origins {
        CorsOrigins::Any => cors.allow_origin(Any),
        CorsOrigins::List(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::error!(origin = %origin, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            tracing::info!(origins = ?origins, "CORS configured");
            cors.allow_origin(AllowOrigin::list(allowed))
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use db::types::UserRole;
    use serde_json::{Value, json};
    use uuid::Uuid;

    use crate::test_support::{TEST_PASSWORD, create_user_with_token, send, test_deployment};

    fn message(body: &Value) -> &str {
        body["message"].as_str().unwrap_or_default()
    }

    async fn create_event_type(app: &axum::Router, admin: &str, name: &str) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/api/event-types",
            Some(admin),
            Some(json!({"name": name, "color": "#3b82f6"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = super::router(test_deployment().await);
        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn api_requires_a_valid_bearer_token() {
        let app = super::router(test_deployment().await);

        let (status, body) = send(&app, "GET", "/api/calendar", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let (status, body) = send(&app, "GET", "/api/orders", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message(&body), "invalid or expired token");
    }

    #[tokio::test]
    async fn register_login_and_me() {
        let app = super::router(test_deployment().await);

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "email": "ana@example.com",
                "password": TEST_PASSWORD,
                "name": "Ana",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["token_type"], "bearer");
        assert_eq!(body["data"]["user"]["role"], "user");

        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "email": "ana@example.com",
                "password": TEST_PASSWORD,
                "name": "Ana again",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "ana@example.com", "password": "wrong-password"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message(&body), "invalid credentials");

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "ana@example.com", "password": TEST_PASSWORD})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["data"]["access_token"].as_str().unwrap().to_string();

        let (status, body) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["email"], "ana@example.com");
    }

    #[tokio::test]
    async fn register_rejects_malformed_payloads() {
        let app = super::router(test_deployment().await);

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"email": "not-an-email", "password": "123", "name": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"email": "a@example.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_admin_is_forbidden_regardless_of_payload() {
        let deployment = test_deployment().await;
        let (_, token) =
            create_user_with_token(&deployment, "user@example.com", UserRole::User).await;
        let app = super::router(deployment);
        let unknown = Uuid::new_v4();

        let cases = [
            ("GET", "/api/users".to_string(), None),
            ("POST", "/api/users".to_string(), Some(json!({"bogus": true}))),
            ("PUT", format!("/api/users/{unknown}"), Some(json!({}))),
            ("DELETE", "/api/users/not-a-uuid".to_string(), None),
            ("POST", "/api/event-types".to_string(), Some(json!(42))),
            ("PUT", format!("/api/event-types/{unknown}"), Some(json!({"name": "x"}))),
            ("DELETE", format!("/api/event-types/{unknown}"), None),
            ("POST", "/api/task-types".to_string(), Some(json!({"name": "Bug", "color": "#f00"}))),
            ("PUT", format!("/api/task-types/{unknown}"), Some(json!({}))),
            ("DELETE", format!("/api/task-types/{unknown}"), None),
        ];
        for (method, uri, body) in cases {
            let (status, response) = send(&app, method, &uri, Some(&token), body).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
            assert_eq!(message(&response), "Not enough permissions");
        }

        let (status, _) = send(&app, "GET", "/api/event-types", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_and_malformed_ids_are_not_found() {
        let deployment = test_deployment().await;
        let (_, admin) =
            create_user_with_token(&deployment, "admin@example.com", UserRole::Admin).await;
        let app = super::router(deployment);
        let unknown = Uuid::new_v4();

        for uri in [
            format!("/api/calendar/{unknown}"),
            "/api/calendar/123".to_string(),
            format!("/api/kanban/{unknown}"),
            format!("/api/orders/{unknown}"),
            format!("/api/orders/{unknown}/linked-events"),
        ] {
            let (status, _) = send(&app, "GET", &uri, Some(&admin), None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        }

        let (status, _) = send(
            &app,
            "DELETE",
            "/api/event-links/not-a-uuid",
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/users/{unknown}"),
            Some(&admin),
            Some(json!({"name": "Nobody"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn pedido_order_is_completed_by_a_commission_invoice() {
        let deployment = test_deployment().await;
        let (_, admin) =
            create_user_with_token(&deployment, "admin@example.com", UserRole::Admin).await;
        let (_, user) =
            create_user_with_token(&deployment, "user@example.com", UserRole::User).await;
        let app = super::router(deployment);

        let pedido = create_event_type(&app, &admin, "Pedido").await;
        let commission = create_event_type(&app, &admin, "Factura Comisiones IBERFOODS").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/calendar",
            Some(&user),
            Some(json!({
                "title": "Pedido Acme",
                "fecha_inicio": "2025-03-01",
                "fecha_fin": "2025-03-01",
                "event_type_id": pedido,
                "order_number": "PED-1",
                "client": "Acme",
                "supplier": "X",
                "amount": "",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["amount"], Value::Null);

        let (status, body) = send(&app, "GET", "/api/orders", Some(&user), None).await;
        assert_eq!(status, StatusCode::OK);
        let orders = body["data"].as_array().unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0]["order_number"], "PED-1");
        assert_eq!(orders[0]["status"], "active");
        let order_id = orders[0]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            "POST",
            "/api/calendar",
            Some(&user),
            Some(json!({
                "title": "Comisión Acme",
                "fecha_inicio": "2025-04-01",
                "fecha_fin": "2025-04-01",
                "event_type_id": commission,
                "linked_order_id": order_id,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let invoice_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            "GET",
            &format!("/api/orders/{order_id}"),
            Some(&user),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "completed");

        let (_, body) = send(&app, "GET", "/api/orders", Some(&user), None).await;
        assert!(body["data"].as_array().unwrap().is_empty());
        let (_, body) = send(
            &app,
            "GET",
            "/api/orders?status=completed",
            Some(&user),
            None,
        )
        .await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (status, body) = send(
            &app,
            "GET",
            &format!("/api/orders/{order_id}/linked-events"),
            Some(&user),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let linked = body["data"].as_array().unwrap();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0]["id"], invoice_id.as_str());
        assert_eq!(linked[0]["event_type_name"], "Factura Comisiones IBERFOODS");
    }

    #[tokio::test]
    async fn links_can_be_created_and_removed() {
        let deployment = test_deployment().await;
        let (_, admin) =
            create_user_with_token(&deployment, "admin@example.com", UserRole::Admin).await;
        let app = super::router(deployment);

        let pedido = create_event_type(&app, &admin, "Pedido").await;
        let albaran = create_event_type(&app, &admin, "Albarán").await;

        let (_, body) = send(
            &app,
            "POST",
            "/api/calendar",
            Some(&admin),
            Some(json!({
                "title": "Pedido",
                "fecha_inicio": "2025-03-01",
                "fecha_fin": "2025-03-01",
                "event_type_id": pedido,
                "order_number": "PED-7",
            })),
        )
        .await;
        let pedido_event = body["data"]["id"].as_str().unwrap().to_string();
        let (_, body) = send(&app, "GET", "/api/orders", Some(&admin), None).await;
        let order_id = body["data"][0]["id"].as_str().unwrap().to_string();

        let (_, body) = send(
            &app,
            "POST",
            "/api/calendar",
            Some(&admin),
            Some(json!({
                "title": "Albarán",
                "fecha_inicio": "2025-03-05",
                "fecha_fin": "2025-03-05",
                "event_type_id": albaran,
            })),
        )
        .await;
        let albaran_event = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            "POST",
            "/api/event-links",
            Some(&admin),
            Some(json!({"order_id": order_id, "event_id": albaran_event})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let link_id = body["data"]["id"].as_str().unwrap().to_string();

        let (_, body) = send(
            &app,
            "GET",
            &format!("/api/calendar/{albaran_event}"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(body["data"]["linked_order_id"], order_id.as_str());

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/api/event-links/{link_id}"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(
            &app,
            "GET",
            &format!("/api/calendar/{albaran_event}"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(body["data"]["linked_order_id"], Value::Null);

        let (status, _) = send(
            &app,
            "POST",
            "/api/event-links",
            Some(&admin),
            Some(json!({"order_id": Uuid::new_v4(), "event_id": albaran_event})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // Deleting the source event takes its order with it.
        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/api/calendar/{pedido_event}"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(
            &app,
            "GET",
            &format!("/api/orders/{order_id}"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn event_type_in_use_cannot_be_deleted() {
        let deployment = test_deployment().await;
        let (_, admin) =
            create_user_with_token(&deployment, "admin@example.com", UserRole::Admin).await;
        let app = super::router(deployment);

        let reunion = create_event_type(&app, &admin, "Reunión").await;
        let (status, body) = send(&app, "GET", "/api/event-types", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["category"], "event");

        send(
            &app,
            "POST",
            "/api/calendar",
            Some(&admin),
            Some(json!({
                "title": "Kick-off",
                "fecha_inicio": "2025-03-01",
                "fecha_fin": "2025-03-01",
                "event_type_id": reunion,
            })),
        )
        .await;

        let (status, body) = send(
            &app,
            "DELETE",
            &format!("/api/event-types/{reunion}"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(message(&body), "Event type is still used by calendar events");
    }

    #[tokio::test]
    async fn orders_reject_unknown_status_filters() {
        let deployment = test_deployment().await;
        let (_, token) =
            create_user_with_token(&deployment, "user@example.com", UserRole::User).await;
        let app = super::router(deployment);

        let (status, body) = send(
            &app,
            "GET",
            "/api/orders?status=archived",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn kanban_crud_over_http() {
        let deployment = test_deployment().await;
        let (_, token) =
            create_user_with_token(&deployment, "user@example.com", UserRole::User).await;
        let app = super::router(deployment);

        let (status, body) = send(
            &app,
            "POST",
            "/api/kanban",
            Some(&token),
            Some(json!({"title": "Call supplier", "assigned_to": "Ana", "priority": "high"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["status"], "todo");
        let task_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/api/kanban/{task_id}"),
            Some(&token),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message(&body), "No data to update");

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/api/kanban/{task_id}"),
            Some(&token),
            Some(json!({"status": "in_progress", "position": 3})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "in_progress");
        assert_eq!(body["data"]["position"], 3);
        assert_eq!(body["data"]["assigned_to"], "Ana");

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/kanban/{task_id}"),
            Some(&token),
            Some(json!({"status": "blocked"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/api/kanban/{task_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = send(&app, "GET", "/api/kanban", Some(&token), None).await;
        assert!(body["data"].as_array().unwrap().is_empty());
    }
}
