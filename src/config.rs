//! Configuration types.
//!
//! Every config is read once at startup. `from_env()` reads the process
//! environment; `from_lookup()` takes any key lookup so tests can supply
//! values without touching the environment.

use std::time::Duration;

use crate::tasks::Operation;

/// Simulated compute time per operator, copied onto each task as
/// `estimated_duration`. The orchestrator never sleeps on these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationTimes {
    pub addition: Duration,
    pub subtraction: Duration,
    pub multiplication: Duration,
    pub division: Duration,
}

impl OperationTimes {
    /// Same duration for all four operators.
    pub fn uniform(duration: Duration) -> Self {
        Self {
            addition: duration,
            subtraction: duration,
            multiplication: duration,
            division: duration,
        }
    }

    /// Duration configured for an operator.
    pub fn for_operation(&self, operation: Operation) -> Duration {
        match operation {
            Operation::Add => self.addition,
            Operation::Subtract => self.subtraction,
            Operation::Multiply => self.multiplication,
            Operation::Divide => self.division,
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            addition: millis_or(&lookup, "TIME_ADDITION_MS", defaults.addition),
            subtraction: millis_or(&lookup, "TIME_SUBTRACTION_MS", defaults.subtraction),
            multiplication: millis_or(&lookup, "TIME_MULTIPLICATIONS_MS", defaults.multiplication),
            division: millis_or(&lookup, "TIME_DIVISIONS_MS", defaults.division),
        }
    }
}

impl Default for OperationTimes {
    fn default() -> Self {
        Self::uniform(Duration::from_millis(1000))
    }
}

/// Orchestrator process configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// HTTP listen port.
    pub port: u16,
    /// Per-operator simulated durations handed to workers.
    pub operation_times: OperationTimes,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            operation_times: OperationTimes::default(),
        }
    }
}

impl OrchestratorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: parsed_or(&lookup, "PORT", defaults.port),
            operation_times: OperationTimes::from_lookup(&lookup),
        }
    }
}

/// Agent (worker process) configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Base URL of the orchestrator, without trailing slash.
    pub orchestrator_url: String,
    /// Number of concurrent workers.
    pub computing_power: usize,
    /// Back-off between polls when no task is ready or the orchestrator is unreachable.
    pub poll_interval: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            orchestrator_url: "http://localhost:8080".to_string(),
            computing_power: 1,
            poll_interval: Duration::from_secs(2),
        }
    }
}

impl AgentConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let orchestrator_url = lookup("ORCHESTRATOR_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.orchestrator_url);

        let mut computing_power = parsed_or(&lookup, "COMPUTING_POWER", defaults.computing_power);
        if computing_power == 0 {
            tracing::warn!("COMPUTING_POWER must be at least 1, using 1");
            computing_power = 1;
        }

        Self {
            orchestrator_url,
            computing_power,
            poll_interval: millis_or(&lookup, "AGENT_POLL_INTERVAL_MS", defaults.poll_interval),
        }
    }
}

fn parsed_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Debug,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, default = ?default, "Invalid configuration value, using default");
                default
            }
        },
    }
}

fn millis_or(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> Duration {
    Duration::from_millis(parsed_or(lookup, key, default.as_millis() as u64))
}
