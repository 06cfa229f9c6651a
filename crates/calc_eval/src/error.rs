//! Error types for expression evaluation.
//!
//! Every variant is recoverable: the caller reports it to the client and the
//! variable table is left exactly as it was before the failed call.

use thiserror::Error;

/// Reasons an input line could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// An identifier was referenced before any value was bound to it.
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),

    /// A token is neither an integer literal nor a purely alphabetic name
    /// (mixed digits and letters, a lone `-`, or a literal outside `i32`).
    #[error("malformed token: {0:?}")]
    MalformedToken(String),

    /// The operator position holds something other than `+ - * /`.
    #[error("unknown operator: {0:?}")]
    UnknownOperator(String),

    #[error("division by zero")]
    DivisionByZero,

    /// Wrong number of tokens for any recognised shape, or an assignment
    /// without `=` as its second token.
    #[error("unexpected token count: {0}")]
    ArityMismatch(usize),

    /// The assignment target is not purely alphabetic.
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),
}
