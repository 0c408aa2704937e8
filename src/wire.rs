//! JSON bodies shared by the HTTP API and the agent client.

use serde::{Deserialize, Serialize};

use crate::tasks::{Expression, ExpressionId, Operation, Task, TaskId};

/// `POST /api/v1/calculate` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateRequest {
    pub expression: String,
}

/// `POST /api/v1/calculate` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateResponse {
    pub id: ExpressionId,
}

/// `GET /api/v1/expressions` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpressionsResponse {
    pub expressions: Vec<Expression>,
}

/// `GET /api/v1/expressions/{id}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpressionResponse {
    pub expression: Expression,
}

/// A dispatched task as a worker sees it: two numbers and an operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPayload {
    pub id: TaskId,
    pub arg1: f64,
    pub arg2: f64,
    pub operation: Operation,
    /// Simulated compute time in milliseconds.
    pub operation_time: u64,
}

impl TaskPayload {
    /// Wire form of a task, available once both operands are resolved.
    pub fn from_task(task: &Task) -> Option<Self> {
        let (arg1, arg2) = task.arguments()?;
        Some(Self {
            id: task.id.clone(),
            arg1,
            arg2,
            operation: task.operation,
            operation_time: task.estimated_duration.as_millis() as u64,
        })
    }
}

/// `GET /internal/task` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub task: TaskPayload,
}

/// `POST /internal/task` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub id: TaskId,
    pub result: f64,
}
