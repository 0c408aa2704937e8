//! Worker pool: `computing_power` concurrent pull/compute/push loops.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::TaskSource;
use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::wire::TaskPayload;

/// Evaluate a task's operation on its two arguments.
pub fn compute(task: &TaskPayload) -> f64 {
    task.operation.apply(task.arg1, task.arg2)
}

/// Run one cycle: pull a task, wait out its operation time, compute, push.
///
/// Returns `Ok(false)` when no task was ready.
pub async fn process_next(source: &dyn TaskSource) -> Result<bool, AgentError> {
    let Some(task) = source.pull_task().await? else {
        return Ok(false);
    };

    tokio::time::sleep(Duration::from_millis(task.operation_time)).await;
    let result = compute(&task);
    debug!(
        task_id = %task.id,
        arg1 = task.arg1,
        arg2 = task.arg2,
        operation = %task.operation,
        result,
        "Task computed"
    );

    source.push_result(&task.id, result).await?;
    Ok(true)
}

/// Spawn `config.computing_power` workers against `source`.
///
/// Returns the worker handles and a shutdown flag. Set the flag to stop;
/// each worker exits after its current cycle.
pub fn spawn_workers(
    source: Arc<dyn TaskSource>,
    config: &AgentConfig,
) -> (Vec<JoinHandle<()>>, Arc<AtomicBool>) {
    let shutdown = Arc::new(AtomicBool::new(false));
    let poll_interval = config.poll_interval;

    let handles = (0..config.computing_power.max(1))
        .map(|worker_id| {
            let source = Arc::clone(&source);
            let shutdown = Arc::clone(&shutdown);
            tokio::spawn(run_worker(worker_id, source, poll_interval, shutdown))
        })
        .collect();

    info!(
        workers = config.computing_power.max(1),
        poll_ms = poll_interval.as_millis() as u64,
        "Agent workers started"
    );
    (handles, shutdown)
}

async fn run_worker(
    worker_id: usize,
    source: Arc<dyn TaskSource>,
    poll_interval: Duration,
    shutdown: Arc<AtomicBool>,
) {
    debug!(worker_id, "Worker started");

    while !shutdown.load(Ordering::Relaxed) {
        match process_next(source.as_ref()).await {
            Ok(true) => {}
            Ok(false) => tokio::time::sleep(poll_interval).await,
            Err(AgentError::Rejected { id, reason }) => {
                warn!(worker_id, task_id = %id, reason = %reason, "Result rejected");
            }
            Err(e) => {
                warn!(worker_id, error = %e, "Orchestrator unavailable, retrying");
                tokio::time::sleep(poll_interval).await;
            }
        }
    }

    debug!(worker_id, "Worker stopped");
}
