//! Integration tests for the orchestrator HTTP API and HTTP agents.
//!
//! Each test spins up an Axum server on a random port and drives it with
//! reqwest, either directly or through real agent workers.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use arithmetic_service::agent::{HttpTaskSource, TaskSource, process_next, spawn_workers};
use arithmetic_service::api;
use arithmetic_service::config::{AgentConfig, OperationTimes};
use arithmetic_service::error::AgentError;
use arithmetic_service::orchestrator::Orchestrator;
use arithmetic_service::tasks::TaskId;

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Start an Axum server on a random port, return (base url, orchestrator).
async fn start_server() -> (String, Arc<Orchestrator>) {
    let orchestrator = Arc::new(Orchestrator::new(OperationTimes::uniform(
        Duration::from_millis(1),
    )));
    let app = api::router(Arc::clone(&orchestrator));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    (format!("http://127.0.0.1:{port}"), orchestrator)
}

async fn submit(base: &str, expression: &str) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{base}/api/v1/calculate"))
        .json(&json!({ "expression": expression }))
        .send()
        .await
        .unwrap()
}

async fn submit_ok(base: &str, expression: &str) -> String {
    let resp = submit(base, expression).await;
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}

/// Poll an expression until it leaves `processing`.
async fn wait_for_terminal(base: &str, id: &str) -> Value {
    loop {
        let body: Value = reqwest::get(format!("{base}/api/v1/expressions/{id}"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let expression = body["expression"].clone();
        if expression["status"] != "processing" {
            return expression;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn agent_config(base: &str, computing_power: usize) -> AgentConfig {
    AgentConfig {
        orchestrator_url: base.to_string(),
        computing_power,
        poll_interval: Duration::from_millis(10),
    }
}

#[tokio::test]
async fn test_health_endpoint() {
    timeout(TEST_TIMEOUT, async {
        let (base, _) = start_server().await;

        let resp = reqwest::get(format!("{base}/health")).await.unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "arithmetic-orchestrator");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn test_expressions_start_empty() {
    timeout(TEST_TIMEOUT, async {
        let (base, _) = start_server().await;

        let body: Value = reqwest::get(format!("{base}/api/v1/expressions"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["expressions"], json!([]));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn test_invalid_expression_is_rejected() {
    timeout(TEST_TIMEOUT, async {
        let (base, orchestrator) = start_server().await;

        let resp = submit(&base, "2+*3").await;
        assert_eq!(resp.status(), 422);
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].is_string());

        assert_eq!(submit(&base, "7/0").await.status(), 422);
        assert!(orchestrator.list_expressions().await.is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn test_unknown_expression_is_not_found() {
    timeout(TEST_TIMEOUT, async {
        let (base, _) = start_server().await;

        let resp = reqwest::get(format!("{base}/api/v1/expressions/missing"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn test_http_source_pull_and_push() {
    timeout(TEST_TIMEOUT, async {
        let (base, _) = start_server().await;
        let source = HttpTaskSource::new(&base);

        assert!(source.pull_task().await.unwrap().is_none());

        let id = submit_ok(&base, "6*7").await;
        let task = source.pull_task().await.unwrap().expect("task should be ready");
        assert_eq!((task.arg1, task.arg2), (6.0, 7.0));
        assert_eq!(task.operation_time, 1);
        assert!(source.pull_task().await.unwrap().is_none());

        source.push_result(&task.id, 42.0).await.unwrap();

        let expression = wait_for_terminal(&base, &id).await;
        assert_eq!(expression["status"], "completed");
        assert_eq!(expression["result"], 42.0);

        // Second report for the same task conflicts.
        let err = source.push_result(&task.id, 42.0).await.unwrap_err();
        assert!(matches!(err, AgentError::Rejected { .. }));

        let err = source
            .push_result(&TaskId::from("unknown"), 1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Rejected { .. }));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn test_single_cycle_through_http() {
    timeout(TEST_TIMEOUT, async {
        let (base, _) = start_server().await;
        let source = HttpTaskSource::new(&base);

        let id = submit_ok(&base, "(5+3)*2").await;
        assert!(process_next(&source).await.unwrap());
        assert!(process_next(&source).await.unwrap());
        assert!(!process_next(&source).await.unwrap());

        let expression = wait_for_terminal(&base, &id).await;
        assert_eq!(expression["result"], 16.0);
    })
    .await
    .expect("test timed out");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_agents_evaluate_expressions() {
    timeout(TEST_TIMEOUT, async {
        let (base, _) = start_server().await;

        let cases = [
            ("2+3*4", 14.0),
            ("(1+2)*(3+4)", 21.0),
            ("10-4-3", 3.0),
            ("-2*-3", 6.0),
            ("((1.5+2.5)*(10-6))/(2*2)", 4.0),
            ("42", 42.0),
        ];
        let mut ids = Vec::new();
        for (expression, _) in &cases {
            ids.push(submit_ok(&base, expression).await);
        }

        let source: Arc<dyn TaskSource> = Arc::new(HttpTaskSource::new(&base));
        let (handles, shutdown) = spawn_workers(source, &agent_config(&base, 4));

        for (id, (expression, expected)) in ids.iter().zip(cases) {
            let result = wait_for_terminal(&base, id).await;
            assert_eq!(result["status"], "completed", "{expression}");
            assert_eq!(result["result"], expected, "{expression}");
        }

        shutdown.store(true, Ordering::Relaxed);
        futures::future::join_all(handles).await;
    })
    .await
    .expect("test timed out");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_runtime_division_by_zero_marks_error() {
    timeout(TEST_TIMEOUT, async {
        let (base, orchestrator) = start_server().await;

        let id = submit_ok(&base, "8/(2-2)+(1+1)").await;

        let source: Arc<dyn TaskSource> = Arc::new(HttpTaskSource::new(&base));
        let (handles, shutdown) = spawn_workers(source, &agent_config(&base, 2));

        let expression = wait_for_terminal(&base, &id).await;
        assert_eq!(expression["status"], "error");
        assert!(
            expression["error"]
                .as_str()
                .unwrap()
                .contains("division by zero")
        );
        assert!(expression.get("result").is_none());

        shutdown.store(true, Ordering::Relaxed);
        futures::future::join_all(handles).await;

        // The division task never becomes dispatchable.
        assert!(orchestrator.pull_task().await.is_none());
    })
    .await
    .expect("test timed out");
}
