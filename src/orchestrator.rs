//! Orchestrator — the inbound operations callers use.
//!
//! Wires the decomposer to the task store so the transport layer (and
//! in-process workers) need only one handle.

use std::sync::Arc;

use tracing::error;

use crate::config::OperationTimes;
use crate::error::{Result, StoreError};
use crate::expr::Decomposer;
use crate::ids::IdGenerator;
use crate::tasks::{Expression, ExpressionId, ExpressionStatus, TaskId, TaskStore};
use crate::wire::TaskPayload;

/// One per process; share it behind an `Arc`.
pub struct Orchestrator {
    decomposer: Decomposer,
    store: TaskStore,
}

impl Orchestrator {
    /// Create an orchestrator with an empty store.
    pub fn new(times: OperationTimes) -> Self {
        Self::with_ids(Arc::new(IdGenerator::new()), times)
    }

    /// Create an orchestrator that draws IDs from `ids`.
    pub fn with_ids(ids: Arc<IdGenerator>, times: OperationTimes) -> Self {
        Self {
            decomposer: Decomposer::new(ids, times),
            store: TaskStore::new(),
        }
    }

    /// Decompose and register a new expression. Nothing is registered on failure.
    pub async fn submit_expression(&self, text: &str) -> Result<ExpressionId> {
        let decomposition = self.decomposer.decompose(text)?;
        let expression = self.store.register(decomposition).await?;
        Ok(expression.id)
    }

    pub async fn list_expressions(&self) -> Vec<Expression> {
        self.store.list_expressions().await
    }

    pub async fn get_expression(&self, id: &ExpressionId) -> std::result::Result<Expression, StoreError> {
        self.store.get_expression(id).await
    }

    /// Claim the next ready task in wire form, if any.
    pub async fn pull_task(&self) -> Option<TaskPayload> {
        let task = self.store.dispatch().await?;
        let payload = TaskPayload::from_task(&task);
        if payload.is_none() {
            error!(task_id = %task.id, "Dispatched task has unresolved operands");
        }
        payload
    }

    /// Record a worker's result.
    pub async fn push_result(
        &self,
        task_id: &TaskId,
        value: f64,
    ) -> std::result::Result<ExpressionStatus, StoreError> {
        self.store.submit_result(task_id, value).await
    }
}
