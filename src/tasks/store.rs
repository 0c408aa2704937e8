//! In-memory task store — expressions, their task graphs, and dispatch.
//!
//! A single `RwLock` guards all state. `register`, `dispatch` and
//! `submit_result` each run inside one write-locked critical section, so a
//! reader never observes a partially registered graph or a half-applied
//! result.

use std::collections::{HashMap, VecDeque};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::model::{Expression, ExpressionId, ExpressionStatus, Operand, Operation, Task, TaskId, TaskStatus};
use crate::error::StoreError;
use crate::expr::Decomposition;

#[derive(Default)]
struct StoreState {
    expressions: HashMap<ExpressionId, Expression>,
    tasks: HashMap<TaskId, Task>,
    /// Task ID -> tasks consuming its result.
    dependents: HashMap<TaskId, Vec<TaskId>>,
    /// Ready tasks in the order they became ready.
    ready: VecDeque<TaskId>,
}

/// Concurrency-safe repository of expressions and tasks.
#[derive(Default)]
pub struct TaskStore {
    state: RwLock<StoreState>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an expression and its whole task graph atomically.
    ///
    /// An expression without tasks completes immediately with its literal value.
    pub async fn register(&self, decomposition: Decomposition) -> Result<Expression, StoreError> {
        let Decomposition {
            mut expression,
            tasks,
        } = decomposition;

        let mut state = self.state.write().await;

        if state.expressions.contains_key(&expression.id) {
            return Err(StoreError::DuplicateExpression { id: expression.id });
        }
        if let Some(task) = tasks.iter().find(|t| state.tasks.contains_key(&t.id)) {
            return Err(StoreError::DuplicateTask {
                id: task.id.clone(),
            });
        }

        expression.status = ExpressionStatus::Processing;
        expression.task_ids = tasks.iter().map(|t| t.id.clone()).collect();
        if let Some(Operand::Literal(value)) = expression.root {
            if expression.task_ids.is_empty() {
                expression.complete(value);
            }
        }

        for task in tasks {
            for dependency in task.dependencies() {
                state
                    .dependents
                    .entry(dependency.clone())
                    .or_default()
                    .push(task.id.clone());
            }
            if task.status == TaskStatus::Ready {
                state.ready.push_back(task.id.clone());
            }
            state.tasks.insert(task.id.clone(), task);
        }

        info!(
            expression_id = %expression.id,
            tasks = expression.task_ids.len(),
            status = %expression.status,
            "Expression registered"
        );

        let snapshot = expression.clone();
        state.expressions.insert(expression.id.clone(), expression);
        Ok(snapshot)
    }

    /// Claim the oldest ready task, moving it to `InProgress`.
    ///
    /// Returns `None` when nothing is ready; callers poll again later.
    pub async fn dispatch(&self) -> Option<Task> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        while let Some(task_id) = state.ready.pop_front() {
            let Some(task) = state.tasks.get_mut(&task_id) else {
                continue;
            };
            if task.status != TaskStatus::Ready {
                continue;
            }
            let abandoned = state
                .expressions
                .get(&task.expression_id)
                .is_none_or(|e| e.status == ExpressionStatus::Error);
            if abandoned {
                debug!(task_id = %task_id, "Skipping task of failed expression");
                continue;
            }

            if task.transition_to(TaskStatus::InProgress).is_err() {
                continue;
            }
            debug!(
                task_id = %task.id,
                expression_id = %task.expression_id,
                operation = %task.operation,
                "Task dispatched"
            );
            return Some(task.clone());
        }

        None
    }

    /// Record a worker's result, unblock dependents, and roll up the expression.
    ///
    /// Fails without changing anything when the task is unknown or not in
    /// progress. A non-finite value completes the task but fails the owning
    /// expression. Returns the expression status after roll-up.
    pub async fn submit_result(
        &self,
        task_id: &TaskId,
        value: f64,
    ) -> Result<ExpressionStatus, StoreError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let task = state
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| StoreError::TaskNotFound {
                id: task_id.clone(),
            })?;

        if task.status != TaskStatus::InProgress {
            warn!(task_id = %task_id, status = %task.status, "Rejected result for task not in progress");
            return Err(StoreError::NotInProgress {
                id: task_id.clone(),
                status: task.status,
            });
        }

        let expression_id = task.expression_id.clone();
        let Some(expression) = state.expressions.get_mut(&expression_id) else {
            return Err(StoreError::ExpressionNotFound { id: expression_id });
        };

        task.transition_to(TaskStatus::Completed)
            .map_err(|_| StoreError::NotInProgress {
                id: task_id.clone(),
                status: task.status,
            })?;

        if !value.is_finite() {
            if !expression.status.is_terminal() {
                expression.fail("result out of range");
                warn!(
                    expression_id = %expression_id,
                    task_id = %task_id,
                    result = value,
                    "Expression failed: result out of range"
                );
            }
            return Ok(expression.status);
        }

        task.result = Some(value);
        debug!(task_id = %task_id, result = value, "Task completed");

        let mut zero_divisor = false;
        for dependent_id in state.dependents.get(task_id).into_iter().flatten() {
            let Some(dependent) = state.tasks.get_mut(dependent_id) else {
                continue;
            };
            if !dependent.resolve_operand(task_id, value) {
                continue;
            }
            if dependent.operation == Operation::Divide
                && dependent.operand_b == Operand::Literal(0.0)
            {
                zero_divisor = true;
                continue;
            }
            if dependent.arguments().is_some()
                && dependent.transition_to(TaskStatus::Ready).is_ok()
            {
                state.ready.push_back(dependent.id.clone());
            }
        }

        if !expression.status.is_terminal() {
            if zero_divisor {
                expression.fail("division by zero");
                warn!(expression_id = %expression_id, "Expression failed: division by zero");
            } else {
                roll_up(expression, &state.tasks);
            }
        }

        Ok(expression.status)
    }

    /// Snapshot of one expression.
    pub async fn get_expression(&self, id: &ExpressionId) -> Result<Expression, StoreError> {
        self.state
            .read()
            .await
            .expressions
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::ExpressionNotFound { id: id.clone() })
    }

    /// Snapshot of all expressions, oldest first.
    pub async fn list_expressions(&self) -> Vec<Expression> {
        let mut expressions: Vec<Expression> =
            self.state.read().await.expressions.values().cloned().collect();
        expressions.sort_by_key(|e| e.created_at);
        expressions
    }

    /// Snapshot of one task.
    pub async fn get_task(&self, id: &TaskId) -> Result<Task, StoreError> {
        self.state
            .read()
            .await
            .tasks
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::TaskNotFound { id: id.clone() })
    }

    /// Snapshot of the tasks owned by an expression.
    pub async fn tasks_for(&self, id: &ExpressionId) -> Result<Vec<Task>, StoreError> {
        let state = self.state.read().await;
        let expression = state
            .expressions
            .get(id)
            .ok_or_else(|| StoreError::ExpressionNotFound { id: id.clone() })?;
        Ok(expression
            .task_ids
            .iter()
            .filter_map(|task_id| state.tasks.get(task_id).cloned())
            .collect())
    }

    /// Number of tasks currently eligible for dispatch.
    pub async fn ready_count(&self) -> usize {
        let state = self.state.read().await;
        state
            .ready
            .iter()
            .filter(|id| state.tasks.get(*id).is_some_and(|t| t.status == TaskStatus::Ready))
            .count()
    }
}

/// Complete the expression once every owned task has completed.
fn roll_up(expression: &mut Expression, tasks: &HashMap<TaskId, Task>) {
    let all_completed = expression
        .task_ids
        .iter()
        .all(|id| tasks.get(id).is_some_and(|t| t.status == TaskStatus::Completed));
    if !all_completed {
        return;
    }

    let result = match &expression.root {
        Some(Operand::Literal(value)) => Some(*value),
        Some(Operand::PendingResult(sink)) => tasks.get(sink).and_then(|t| t.result),
        None => None,
    };

    if let Some(result) = result {
        expression.complete(result);
        info!(expression_id = %expression.id, result, "Expression completed");
    }
}
