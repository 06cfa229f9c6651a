//! # Calc Eval - Shared Expression Evaluator
//!
//! The evaluation core of the calculator server. It owns the server-wide
//! variable table and the small grammar clients speak, and knows nothing about
//! sockets or sessions.
//!
//! ## Grammar
//!
//! A line is split on whitespace and must take exactly one of these shapes:
//!
//! * `operand` - an integer literal (`-?[0-9]+`) or a bound identifier
//! * `operand op operand` - with `op` one of `+ - * /`
//! * `identifier = operand [op operand]` - binds `identifier` to the result
//!
//! Identifiers are case-sensitive runs of ASCII letters. Arithmetic is 32-bit
//! signed and division truncates toward zero.
//!
//! ## Thread Safety
//!
//! [`Evaluator`] is `Send + Sync` and meant to be shared behind an `Arc`.
//! Assignments are serialized against each other and against readers, so
//! concurrent `x = x + 1` lines never lose an update.
//!
//! ```rust
//! use calc_eval::{EvalError, Evaluator};
//!
//! let calc = Evaluator::new();
//! assert_eq!(calc.evaluate("total = 10 * 2"), Ok(20));
//! assert_eq!(calc.evaluate("total / 3"), Ok(6));
//! assert_eq!(calc.evaluate("1 / 0"), Err(EvalError::DivisionByZero));
//! ```

pub mod error;
pub mod evaluator;
pub mod token;

pub use error::EvalError;
pub use evaluator::{Evaluator, VariableTable};
pub use token::{tokenize, Operand, Operator};
