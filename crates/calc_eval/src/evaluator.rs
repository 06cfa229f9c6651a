//! The shared evaluator and its variable table.
//!
//! All connections share one [`Evaluator`]. Plain expressions take a read
//! guard on the table while they resolve operands; assignments take the write
//! guard and keep it across the whole evaluate-then-store sequence, so two
//! assignments never interleave and readers never see half of one.

use crate::error::EvalError;
use crate::token::{is_identifier, tokenize, Operand, Operator};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Mapping from identifier to its current value.
pub type VariableTable = HashMap<String, i32>;

const ASSIGN: &str = "=";

/// Thread-safe calculator over a server-wide variable table.
///
/// The table starts empty and only grows: there is no way to unbind a name.
#[derive(Debug, Default)]
pub struct Evaluator {
    variables: RwLock<VariableTable>,
}

impl Evaluator {
    /// Creates an evaluator with an empty variable table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates one input line, possibly binding a variable.
    ///
    /// Any `=` token routes the line to the assignment path, even when it sits
    /// where an operator would be. On error the table is untouched.
    pub fn evaluate(&self, line: &str) -> Result<i32, EvalError> {
        let tokens = tokenize(line);

        let result = if tokens.contains(&ASSIGN) {
            self.assign(&tokens)
        } else {
            let variables = self.variables.read();
            eval_expression(&variables, &tokens)
        };

        trace!(line = line.trim_end(), ?result, "evaluated");
        result
    }

    /// Handles `identifier = operand [op operand]`.
    fn assign(&self, tokens: &[&str]) -> Result<i32, EvalError> {
        if tokens.len() < 3 {
            return Err(EvalError::ArityMismatch(tokens.len()));
        }

        let target = tokens[0];
        if !is_identifier(target) {
            return Err(EvalError::InvalidIdentifier(target.to_string()));
        }
        if tokens[1] != ASSIGN {
            return Err(EvalError::ArityMismatch(tokens.len()));
        }

        let mut variables = self.variables.write();
        let value = eval_expression(&variables, &tokens[2..])?;
        variables.insert(target.to_string(), value);
        debug!(variable = target, value, "bound variable");

        Ok(value)
    }

    /// Current value bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<i32> {
        self.variables.read().get(name).copied()
    }

    /// Number of bound variables.
    pub fn len(&self) -> usize {
        self.variables.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.read().is_empty()
    }

    /// Copy of every binding, sorted by name.
    pub fn snapshot(&self) -> Vec<(String, i32)> {
        let mut bindings: Vec<(String, i32)> = self
            .variables
            .read()
            .iter()
            .map(|(name, value)| (name.clone(), *value))
            .collect();
        bindings.sort();
        bindings
    }
}

/// Evaluates `operand` or `operand op operand` against `variables`.
fn eval_expression(variables: &VariableTable, tokens: &[&str]) -> Result<i32, EvalError> {
    match tokens {
        [operand] => resolve(variables, operand),
        [lhs, op, rhs] => {
            let lhs = resolve(variables, lhs)?;
            let op = Operator::parse(op)?;
            let rhs = resolve(variables, rhs)?;
            op.apply(lhs, rhs)
        }
        _ => Err(EvalError::ArityMismatch(tokens.len())),
    }
}

fn resolve(variables: &VariableTable, token: &str) -> Result<i32, EvalError> {
    match Operand::parse(token)? {
        Operand::Literal(value) => Ok(value),
        Operand::Variable(name) => variables
            .get(name)
            .copied()
            .ok_or_else(|| EvalError::UndefinedVariable(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    #[test]
    fn test_binary_arithmetic() {
        let calc = Evaluator::new();
        let cases = [
            (17, 5),
            (-17, 5),
            (17, -5),
            (-17, -5),
            (0, 3),
            (i32::MAX, 2),
        ];

        for (a, b) in cases {
            assert_eq!(calc.evaluate(&format!("{a} + {b}")), Ok(a.wrapping_add(b)));
            assert_eq!(calc.evaluate(&format!("{a} - {b}")), Ok(a.wrapping_sub(b)));
            assert_eq!(calc.evaluate(&format!("{a} * {b}")), Ok(a.wrapping_mul(b)));
            assert_eq!(calc.evaluate(&format!("{a} / {b}")), Ok(a / b));
        }
    }

    #[test]
    fn test_division_by_zero() {
        let calc = Evaluator::new();
        for a in [0, 1, -1, i32::MAX, i32::MIN] {
            assert_eq!(
                calc.evaluate(&format!("{a} / 0")),
                Err(EvalError::DivisionByZero)
            );
        }

        calc.evaluate("zero = 0").unwrap();
        assert_eq!(calc.evaluate("10 / zero"), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_assignment_is_visible() {
        let calc = Evaluator::new();
        assert_eq!(calc.evaluate("x = 5"), Ok(5));
        assert_eq!(calc.evaluate("x"), Ok(5));
        assert_eq!(calc.evaluate("total = 10 * 2"), Ok(20));
        assert_eq!(calc.evaluate("total"), Ok(20));
        assert_eq!(calc.evaluate("y = total - x"), Ok(15));
        assert_eq!(calc.get("y"), Some(15));
        assert_eq!(calc.len(), 3);
    }

    #[test]
    fn test_identifiers_are_case_sensitive() {
        let calc = Evaluator::new();
        calc.evaluate("Foo = 1").unwrap();
        assert_eq!(
            calc.evaluate("foo"),
            Err(EvalError::UndefinedVariable("foo".to_string()))
        );
        assert_eq!(calc.evaluate("Foo"), Ok(1));
    }

    #[test]
    fn test_failed_assignment_leaves_table_unchanged() {
        let calc = Evaluator::new();
        assert_eq!(
            calc.evaluate("x = y"),
            Err(EvalError::UndefinedVariable("y".to_string()))
        );
        assert_eq!(
            calc.evaluate("x"),
            Err(EvalError::UndefinedVariable("x".to_string()))
        );

        calc.evaluate("x = 3").unwrap();
        assert_eq!(calc.evaluate("x = x / 0"), Err(EvalError::DivisionByZero));
        assert_eq!(calc.evaluate("x"), Ok(3));
        assert_eq!(calc.snapshot(), vec![("x".to_string(), 3)]);
    }

    #[test]
    fn test_malformed_lines() {
        let calc = Evaluator::new();
        assert_eq!(calc.evaluate(""), Err(EvalError::ArityMismatch(0)));
        assert_eq!(calc.evaluate("1 2"), Err(EvalError::ArityMismatch(2)));
        assert_eq!(calc.evaluate("a b c d"), Err(EvalError::ArityMismatch(4)));
        assert_eq!(
            calc.evaluate("3 % 4"),
            Err(EvalError::UnknownOperator("%".to_string()))
        );
        assert_eq!(
            calc.evaluate("4x + 1"),
            Err(EvalError::MalformedToken("4x".to_string()))
        );
        assert_eq!(
            calc.evaluate("foo"),
            Err(EvalError::UndefinedVariable("foo".to_string()))
        );
    }

    #[test]
    fn test_malformed_assignments() {
        let calc = Evaluator::new();
        assert_eq!(calc.evaluate("x ="), Err(EvalError::ArityMismatch(2)));
        assert_eq!(
            calc.evaluate("x1 = 4"),
            Err(EvalError::InvalidIdentifier("x1".to_string()))
        );
        assert_eq!(
            calc.evaluate("5 = 4"),
            Err(EvalError::InvalidIdentifier("5".to_string()))
        );
        assert_eq!(calc.evaluate("x y = 4"), Err(EvalError::ArityMismatch(4)));
        assert_eq!(calc.evaluate("x = 1 + 2 + 3"), Err(EvalError::ArityMismatch(5)));
        assert!(calc.is_empty());
    }

    #[test]
    fn test_equals_takes_priority_over_arithmetic() {
        let calc = Evaluator::new();
        // Three tokens with `=` in operator position is an assignment attempt
        // with a non-alphabetic target, not arithmetic.
        assert_eq!(
            calc.evaluate("3 = 4"),
            Err(EvalError::InvalidIdentifier("3".to_string()))
        );
        assert_eq!(calc.evaluate("a b ="), Err(EvalError::ArityMismatch(3)));
        assert!(calc.is_empty());
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 500;

        let calc = Evaluator::new();
        calc.evaluate("x = 0").unwrap();

        thread::scope(|scope| {
            for _ in 0..THREADS {
                scope.spawn(|| {
                    for _ in 0..PER_THREAD {
                        calc.evaluate("x = x + 1").unwrap();
                    }
                });
            }
        });

        assert_eq!(calc.get("x"), Some((THREADS * PER_THREAD) as i32));
    }

    #[test]
    fn test_readers_observe_monotonic_values() {
        let calc = Evaluator::new();
        calc.evaluate("n = 0").unwrap();
        let done = AtomicBool::new(false);

        thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    let mut last = 0;
                    while !done.load(Ordering::Acquire) {
                        let seen = calc.evaluate("n + 0").unwrap();
                        assert!(seen >= last, "read went backwards: {seen} < {last}");
                        last = seen;
                    }
                });
            }

            scope.spawn(|| {
                for _ in 0..2000 {
                    calc.evaluate("n = n + 1").unwrap();
                }
                done.store(true, Ordering::Release);
            });
        });

        assert_eq!(calc.evaluate("n"), Ok(2000));
    }
}
