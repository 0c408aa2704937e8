//! REST handlers for the public expression API and the internal task API.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{debug, info, warn};

use super::AppState;
use crate::error::{Error, StoreError};
use crate::tasks::{ExpressionId, ExpressionStatus};
use crate::wire::{
    CalculateRequest, CalculateResponse, ExpressionResponse, ExpressionsResponse, TaskResponse,
    TaskResult,
};

fn error_response(status: StatusCode, message: impl std::fmt::Display) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": message.to_string() })),
    )
        .into_response()
}

fn store_error_response(err: &StoreError) -> Response {
    let status = if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::CONFLICT
    };
    error_response(status, err)
}

// ── Health ──────────────────────────────────────────────────────────────

pub(super) async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "arithmetic-orchestrator"
    }))
}

// ── Public API ──────────────────────────────────────────────────────────

/// POST /api/v1/calculate
pub(super) async fn calculate(
    State(state): State<AppState>,
    body: Result<Json<CalculateRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            debug!(error = %rejection, "Rejected calculate body");
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text());
        }
    };

    match state.orchestrator.submit_expression(&request.expression).await {
        Ok(id) => {
            info!(expression_id = %id, "Expression accepted");
            (StatusCode::CREATED, Json(CalculateResponse { id })).into_response()
        }
        Err(err) if err.is_invalid_expression() => {
            debug!(expression = %request.expression, error = %err, "Invalid expression");
            error_response(StatusCode::UNPROCESSABLE_ENTITY, err)
        }
        Err(Error::Store(err)) => store_error_response(&err),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err),
    }
}

/// GET /api/v1/expressions
pub(super) async fn list_expressions(State(state): State<AppState>) -> impl IntoResponse {
    let expressions = state.orchestrator.list_expressions().await;
    Json(ExpressionsResponse { expressions })
}

/// GET /api/v1/expressions/{id}
pub(super) async fn get_expression(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.orchestrator.get_expression(&ExpressionId::from(id)).await {
        Ok(expression) => Json(ExpressionResponse { expression }).into_response(),
        Err(err) => store_error_response(&err),
    }
}

// ── Internal task API ───────────────────────────────────────────────────

/// GET /internal/task
///
/// Claims the next ready task, or 404 when nothing is ready.
pub(super) async fn pull_task(State(state): State<AppState>) -> Response {
    match state.orchestrator.pull_task().await {
        Some(task) => {
            debug!(task_id = %task.id, operation = %task.operation, "Task handed to agent");
            Json(TaskResponse { task }).into_response()
        }
        None => error_response(StatusCode::NOT_FOUND, "no task available"),
    }
}

/// POST /internal/task
pub(super) async fn submit_result(
    State(state): State<AppState>,
    body: Result<Json<TaskResult>, JsonRejection>,
) -> Response {
    let Json(TaskResult { id, result }) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text());
        }
    };

    match state.orchestrator.push_result(&id, result).await {
        Ok(status) => {
            if status == ExpressionStatus::Error {
                debug!(task_id = %id, "Result recorded for failed expression");
            }
            Json(serde_json::json!({ "status": "ok" })).into_response()
        }
        Err(err) => {
            warn!(task_id = %id, error = %err, "Task result rejected");
            store_error_response(&err)
        }
    }
}
