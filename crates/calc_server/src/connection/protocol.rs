//! Line protocol spoken on each connection.
//!
//! One line in, at most one line out. `quit` and `shutdown` are session
//! commands and never reach the evaluator.

use calc_eval::EvalError;
use std::fmt;

/// Classified client request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request<'a> {
    /// End this session without a reply.
    Quit,
    /// End this session without a reply and stop the server admitting others.
    Shutdown,
    /// Anything else, handed to the evaluator as-is.
    Evaluate(&'a str),
}

impl<'a> Request<'a> {
    /// Classifies a line, tolerating a trailing `\n` or `\r\n`.
    pub fn parse(line: &'a str) -> Self {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let line = line.strip_suffix('\r').unwrap_or(line);

        match line {
            "quit" => Request::Quit,
            "shutdown" => Request::Shutdown,
            expr => Request::Evaluate(expr),
        }
    }
}

/// Reply line sent back after an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Value(i32),
    Error,
}

impl Response {
    /// Wire form including the line terminator.
    pub fn to_line(self) -> String {
        format!("{self}\n")
    }
}

impl From<Result<i32, EvalError>> for Response {
    fn from(result: Result<i32, EvalError>) -> Self {
        match result {
            Ok(value) => Response::Value(value),
            Err(_) => Response::Error,
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Value(value) => write!(f, "{value}"),
            Response::Error => f.write_str("Error"),
        }
    }
}
