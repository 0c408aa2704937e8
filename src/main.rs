use std::sync::Arc;

use anyhow::Context;
use arithmetic_service::api;
use arithmetic_service::config::OrchestratorConfig;
use arithmetic_service::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = OrchestratorConfig::from_env();
    let times = &config.operation_times;
    tracing::info!(
        addition_ms = times.addition.as_millis() as u64,
        subtraction_ms = times.subtraction.as_millis() as u64,
        multiplication_ms = times.multiplication.as_millis() as u64,
        division_ms = times.division.as_millis() as u64,
        "Operation times loaded"
    );

    let orchestrator = Arc::new(Orchestrator::new(config.operation_times.clone()));
    let app = api::router(orchestrator);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind orchestrator port {}", config.port))?;
    tracing::info!(port = config.port, "Orchestrator listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
        })
        .await
        .context("Orchestrator server failed")?;

    Ok(())
}
