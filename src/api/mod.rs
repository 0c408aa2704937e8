//! HTTP surface of the orchestrator.

mod routes;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::orchestrator::Orchestrator;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

/// Build the Axum router with the public and internal routes.
pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    let state = AppState { orchestrator };

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/v1/calculate", post(routes::calculate))
        .route("/api/v1/expressions", get(routes::list_expressions))
        .route("/api/v1/expressions/{id}", get(routes::get_expression))
        .route(
            "/internal/task",
            get(routes::pull_task).post(routes::submit_result),
        )
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::config::OperationTimes;
    use crate::tasks::ExpressionId;

    fn app() -> (Router, Arc<Orchestrator>) {
        let orchestrator = Arc::new(Orchestrator::new(OperationTimes::uniform(
            Duration::from_millis(5),
        )));
        (router(orchestrator.clone()), orchestrator)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (app, _) = app();
        let (status, body) = send(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn calculate_returns_created_id() {
        let (app, orchestrator) = app();
        let (status, body) = send(
            &app,
            post_json("/api/v1/calculate", json!({"expression": "2+3*4"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let id = body["id"].as_str().unwrap();
        let stored = orchestrator
            .get_expression(&ExpressionId::from(id))
            .await
            .unwrap();
        assert_eq!(stored.source, "2+3*4");
    }

    #[tokio::test]
    async fn invalid_expressions_are_unprocessable() {
        let (app, _) = app();
        for expression in ["2+", "5/0", "(1", "2^3", ""] {
            let (status, body) = send(
                &app,
                post_json("/api/v1/calculate", json!({ "expression": expression })),
            )
            .await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{expression:?}");
            assert!(body["error"].is_string());
        }
    }

    #[tokio::test]
    async fn malformed_body_is_unprocessable() {
        let (app, _) = app();
        let (status, body) = send(&app, post_json("/api/v1/calculate", json!({"expr": 1}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn unknown_expression_is_not_found() {
        let (app, _) = app();
        let (status, body) = send(&app, get("/api/v1/expressions/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("nope"));
    }

    #[tokio::test]
    async fn empty_queue_is_not_found() {
        let (app, _) = app();
        let (status, _) = send(&app, get("/internal/task")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn task_cycle_completes_expression() {
        let (app, _) = app();
        let (_, created) = send(
            &app,
            post_json("/api/v1/calculate", json!({"expression": "(5+3)*2"})),
        )
        .await;
        let id = created["id"].as_str().unwrap().to_string();

        loop {
            let (status, body) = send(&app, get("/internal/task")).await;
            if status == StatusCode::NOT_FOUND {
                break;
            }
            assert_eq!(status, StatusCode::OK);
            let task = &body["task"];
            assert_eq!(task["operation_time"], 5);
            let a = task["arg1"].as_f64().unwrap();
            let b = task["arg2"].as_f64().unwrap();
            let result = match task["operation"].as_str().unwrap() {
                "+" => a + b,
                "*" => a * b,
                other => panic!("unexpected operation {other}"),
            };
            let (status, _) = send(
                &app,
                post_json("/internal/task", json!({"id": task["id"], "result": result})),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = send(&app, get(&format!("/api/v1/expressions/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["expression"]["status"], "completed");
        assert_eq!(body["expression"]["result"], 16.0);

        let (_, listed) = send(&app, get("/api/v1/expressions")).await;
        assert_eq!(listed["expressions"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn result_submission_errors_map_to_status_codes() {
        let (app, _) = app();
        let (status, _) = send(
            &app,
            post_json("/internal/task", json!({"id": "missing", "result": 1.0})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        send(
            &app,
            post_json("/api/v1/calculate", json!({"expression": "1+1"})),
        )
        .await;
        let (_, body) = send(&app, get("/internal/task")).await;
        let task_id = body["task"]["id"].clone();

        let (status, _) = send(
            &app,
            post_json("/internal/task", json!({"id": task_id, "result": 2.0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &app,
            post_json("/internal/task", json!({"id": task_id, "result": 2.0})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            &app,
            post_json("/internal/task", json!({"id": task_id, "result": "two"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
