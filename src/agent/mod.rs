//! Computing agent: pulls ready tasks, evaluates them, reports results.
//!
//! Workers talk to a [`TaskSource`]. Over the network that is
//! [`HttpTaskSource`]; in the same process the [`Orchestrator`] itself
//! can be used directly.

pub mod client;
pub mod worker;

use async_trait::async_trait;

pub use client::HttpTaskSource;
pub use worker::{compute, process_next, spawn_workers};

use crate::error::AgentError;
use crate::orchestrator::Orchestrator;
use crate::tasks::TaskId;
use crate::wire::TaskPayload;

/// Where workers get tasks from and send results to.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Claim the next ready task. `Ok(None)` means nothing is ready yet.
    async fn pull_task(&self) -> Result<Option<TaskPayload>, AgentError>;

    /// Report the result of a previously pulled task.
    async fn push_result(&self, task_id: &TaskId, result: f64) -> Result<(), AgentError>;
}

#[async_trait]
impl TaskSource for Orchestrator {
    async fn pull_task(&self) -> Result<Option<TaskPayload>, AgentError> {
        Ok(Orchestrator::pull_task(self).await)
    }

    async fn push_result(&self, task_id: &TaskId, result: f64) -> Result<(), AgentError> {
        Orchestrator::push_result(self, task_id, result)
            .await
            .map(|_| ())
            .map_err(|e| AgentError::Rejected {
                id: task_id.clone(),
                reason: e.to_string(),
            })
    }
}
