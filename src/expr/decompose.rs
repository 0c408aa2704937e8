//! Turns postfix tokens into a dependency graph of binary tasks.

use std::sync::Arc;

use super::postfix::to_postfix;
use super::tokenizer::{Token, tokenize};
use crate::config::OperationTimes;
use crate::error::{DecompositionError, Result};
use crate::ids::IdGenerator;
use crate::tasks::{Expression, ExpressionId, Operand, Operation, Task, TaskId};

/// An expression and its full task graph, ready to be registered as one unit.
#[derive(Debug, Clone)]
pub struct Decomposition {
    pub expression: Expression,
    /// Tasks in creation order; every task appears after the tasks it depends on.
    pub tasks: Vec<Task>,
}

/// Builds task graphs from expression text.
///
/// Never evaluates anything: operands that depend on other tasks stay
/// `PendingResult` references until a worker reports the value.
pub struct Decomposer {
    ids: Arc<IdGenerator>,
    times: OperationTimes,
}

impl Decomposer {
    pub fn new(ids: Arc<IdGenerator>, times: OperationTimes) -> Self {
        Self { ids, times }
    }

    /// Parse and decompose `source`.
    pub fn decompose(&self, source: &str) -> Result<Decomposition> {
        let tokens = tokenize(source)?;
        let postfix = to_postfix(&tokens)?;

        let expression_id = ExpressionId::from(self.ids.generate());
        let (tasks, root) = self.build_tasks(&expression_id, &postfix)?;

        let mut expression = Expression::new(expression_id, source.trim(), root);
        expression.task_ids = tasks.iter().map(|t| t.id.clone()).collect();

        Ok(Decomposition { expression, tasks })
    }

    fn build_tasks(
        &self,
        expression_id: &ExpressionId,
        postfix: &[Token],
    ) -> std::result::Result<(Vec<Task>, Operand), DecompositionError> {
        let mut operands: Vec<Operand> = Vec::new();
        let mut tasks = Vec::new();

        for token in postfix {
            match *token {
                Token::Number(value) => operands.push(Operand::Literal(value)),
                Token::Operator(operation) => {
                    let b = operands.pop().ok_or(DecompositionError::InsufficientOperands)?;
                    let a = operands.pop().ok_or(DecompositionError::InsufficientOperands)?;

                    if operation == Operation::Divide && b == Operand::Literal(0.0) {
                        return Err(DecompositionError::DivisionByZero);
                    }

                    let task = Task::new(
                        TaskId::from(self.ids.generate()),
                        expression_id.clone(),
                        operation,
                        a,
                        b,
                        self.times.for_operation(operation),
                    );
                    operands.push(Operand::PendingResult(task.id.clone()));
                    tasks.push(task);
                }
                Token::LeftParen | Token::RightParen => {
                    return Err(DecompositionError::MalformedExpression);
                }
            }
        }

        let root = operands.pop().ok_or(DecompositionError::MalformedExpression)?;
        if !operands.is_empty() {
            return Err(DecompositionError::MalformedExpression);
        }

        Ok((tasks, root))
    }
}
