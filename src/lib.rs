//! Arithmetic service — distributed evaluation of arithmetic expressions.
//!
//! An orchestrator decomposes each submitted expression into binary tasks
//! and hands out ready ones; agents compute them and report back.

pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod expr;
pub mod ids;
pub mod orchestrator;
pub mod tasks;
pub mod wire;

pub use error::{Error, Result};
pub use orchestrator::Orchestrator;
