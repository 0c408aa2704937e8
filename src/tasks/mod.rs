//! Expressions, tasks, and the store that schedules them.
//!
//! - `model` — Expression/Task types and the task state machine
//!   (Blocked → Ready → InProgress → Completed)
//! - `store` — concurrency-safe registry with dispatch and result roll-up

pub mod model;
pub mod store;

pub use model::{
    Expression, ExpressionId, ExpressionStatus, Operand, Operation, Task, TaskId, TaskStatus,
};
pub use store::TaskStore;
