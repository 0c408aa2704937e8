//! Expression and task data model.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a submitted expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpressionId(String);

/// Identifier of a single binary task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

macro_rules! string_id {
    ($name:ident) => {
        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(ExpressionId);
string_id!(TaskId);

/// One of the four binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Divide,
}

impl Operation {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Self::Add),
            '-' => Some(Self::Subtract),
            '*' => Some(Self::Multiply),
            '/' => Some(Self::Divide),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Self::Add => '+',
            Self::Subtract => '-',
            Self::Multiply => '*',
            Self::Divide => '/',
        }
    }

    /// Binding strength; higher binds tighter. All operators are left-associative.
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Add | Self::Subtract => 1,
            Self::Multiply | Self::Divide => 2,
        }
    }

    /// Evaluate `a op b`. Division by zero follows IEEE 754.
    pub fn apply(&self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Subtract => a - b,
            Self::Multiply => a * b,
            Self::Divide => a / b,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A task operand: either a known number or the future result of another task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Operand {
    Literal(f64),
    PendingResult(TaskId),
}

impl Operand {
    /// The number, if resolved.
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Literal(v) => Some(*v),
            Self::PendingResult(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    /// Replace a pending reference to `task_id` with `value`.
    /// Returns whether the operand changed.
    fn resolve(&mut self, task_id: &TaskId, value: f64) -> bool {
        match self {
            Self::PendingResult(id) if id == task_id => {
                *self = Self::Literal(value);
                true
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(v) => write!(f, "{v}"),
            Self::PendingResult(id) => write!(f, "<{id}>"),
        }
    }
}

/// Lifecycle of a task. Moves strictly forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// At least one operand is still a pending result.
    Blocked,
    /// Both operands are numbers; eligible for dispatch.
    Ready,
    /// Claimed by a worker.
    InProgress,
    /// Result recorded.
    Completed,
}

impl TaskStatus {
    pub fn can_transition_to(&self, target: TaskStatus) -> bool {
        use TaskStatus::*;

        matches!(
            (self, target),
            (Blocked, Ready) | (Ready, InProgress) | (InProgress, Completed)
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Blocked => "blocked",
            Self::Ready => "ready",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

/// Aggregate status of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionStatus {
    /// Decomposed but not yet registered.
    Pending,
    /// Registered; some tasks are not yet completed.
    Processing,
    /// Every task completed; `result` is set.
    Completed,
    /// Evaluation cannot finish (zero divisor or out-of-range result).
    Error,
}

impl ExpressionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl std::fmt::Display for ExpressionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// One atomic binary operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub expression_id: ExpressionId,
    pub operation: Operation,
    pub operand_a: Operand,
    pub operand_b: Operand,
    pub status: TaskStatus,
    pub result: Option<f64>,
    /// Simulated compute time for this operator. Informational only.
    pub estimated_duration: Duration,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a task; it starts `Ready` when both operands are numbers,
    /// otherwise `Blocked`.
    pub fn new(
        id: TaskId,
        expression_id: ExpressionId,
        operation: Operation,
        operand_a: Operand,
        operand_b: Operand,
        estimated_duration: Duration,
    ) -> Self {
        let status = if operand_a.is_resolved() && operand_b.is_resolved() {
            TaskStatus::Ready
        } else {
            TaskStatus::Blocked
        };

        Self {
            id,
            expression_id,
            operation,
            operand_a,
            operand_b,
            status,
            result: None,
            estimated_duration,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Both operand values, once resolved.
    pub fn arguments(&self) -> Option<(f64, f64)> {
        Some((self.operand_a.value()?, self.operand_b.value()?))
    }

    /// Tasks whose results this task consumes.
    pub fn dependencies(&self) -> impl Iterator<Item = &TaskId> {
        [&self.operand_a, &self.operand_b]
            .into_iter()
            .filter_map(|operand| match operand {
                Operand::PendingResult(id) => Some(id),
                Operand::Literal(_) => None,
            })
    }

    /// Substitute `value` for every pending reference to `dependency`.
    /// Returns whether anything changed.
    pub fn resolve_operand(&mut self, dependency: &TaskId, value: f64) -> bool {
        let a = self.operand_a.resolve(dependency, value);
        let b = self.operand_b.resolve(dependency, value);
        a || b
    }

    /// Move to `target`, stamping timestamps. Rejects backwards or skipping moves.
    pub fn transition_to(&mut self, target: TaskStatus) -> Result<(), String> {
        if !self.status.can_transition_to(target) {
            return Err(format!(
                "Cannot transition task {} from {} to {}",
                self.id, self.status, target
            ));
        }

        self.status = target;
        match target {
            TaskStatus::InProgress => self.started_at = Some(Utc::now()),
            TaskStatus::Completed => self.completed_at = Some(Utc::now()),
            _ => {}
        }
        Ok(())
    }
}

/// A user-submitted formula and its aggregate lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expression {
    pub id: ExpressionId,
    /// Expression text as submitted.
    pub source: String,
    pub status: ExpressionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Tasks owned by this expression.
    #[serde(skip)]
    pub task_ids: HashSet<TaskId>,
    /// Final value: a literal for operator-free expressions, otherwise the sink task.
    #[serde(skip)]
    pub root: Option<Operand>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Expression {
    pub fn new(id: ExpressionId, source: impl Into<String>, root: Operand) -> Self {
        Self {
            id,
            source: source.into(),
            status: ExpressionStatus::Pending,
            result: None,
            error: None,
            task_ids: HashSet::new(),
            root: Some(root),
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// The sink task, if the expression has any tasks.
    pub fn sink(&self) -> Option<&TaskId> {
        match self.root.as_ref()? {
            Operand::PendingResult(id) => Some(id),
            Operand::Literal(_) => None,
        }
    }

    pub(crate) fn complete(&mut self, result: f64) {
        self.status = ExpressionStatus::Completed;
        self.result = Some(result);
        self.completed_at = Some(Utc::now());
    }

    pub(crate) fn fail(&mut self, reason: impl Into<String>) {
        self.status = ExpressionStatus::Error;
        self.error = Some(reason.into());
        self.completed_at = Some(Utc::now());
    }
}
