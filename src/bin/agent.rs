use std::sync::Arc;
use std::sync::atomic::Ordering;

use arithmetic_service::agent::{HttpTaskSource, TaskSource, spawn_workers};
use arithmetic_service::config::AgentConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AgentConfig::from_env();
    tracing::info!(
        orchestrator = %config.orchestrator_url,
        computing_power = config.computing_power,
        "Agent starting"
    );

    let source: Arc<dyn TaskSource> = Arc::new(HttpTaskSource::new(&config.orchestrator_url));
    let (handles, shutdown) = spawn_workers(source, &config);

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down, waiting for in-flight tasks");
    shutdown.store(true, Ordering::Relaxed);
    futures::future::join_all(handles).await;

    Ok(())
}
