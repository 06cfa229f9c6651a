//! Tokenization and the lexical pieces of the grammar.
//!
//! Lines are split on runs of whitespace. Each token is then classified as an
//! [`Operand`] or an [`Operator`] depending on its position in the line.

use crate::error::EvalError;

/// Splits a line on runs of whitespace. Empty or blank input yields no tokens.
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// Returns true when `token` is a non-empty run of ASCII letters.
pub fn is_identifier(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_alphabetic())
}

/// Returns true when `token` matches `-?[0-9]+`.
fn is_integer_literal(token: &str) -> bool {
    let digits = token.strip_prefix('-').unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// A single operand position in an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand<'a> {
    /// A base-10 literal that fits in `i32`.
    Literal(i32),
    /// A reference to a variable, resolved against the table at evaluation time.
    Variable(&'a str),
}

impl<'a> Operand<'a> {
    pub fn parse(token: &'a str) -> Result<Self, EvalError> {
        if is_integer_literal(token) {
            return token
                .parse::<i32>()
                .map(Operand::Literal)
                .map_err(|_| EvalError::MalformedToken(token.to_string()));
        }
        if is_identifier(token) {
            return Ok(Operand::Variable(token));
        }
        Err(EvalError::MalformedToken(token.to_string()))
    }
}

/// Binary operators accepted between two operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    pub fn parse(token: &str) -> Result<Self, EvalError> {
        match token {
            "+" => Ok(Operator::Add),
            "-" => Ok(Operator::Sub),
            "*" => Ok(Operator::Mul),
            "/" => Ok(Operator::Div),
            other => Err(EvalError::UnknownOperator(other.to_string())),
        }
    }

    /// Applies the operator with 32-bit two's complement semantics.
    ///
    /// Overflow wraps instead of panicking and division truncates toward zero,
    /// so `i32::MIN / -1` yields `i32::MIN`.
    pub fn apply(self, lhs: i32, rhs: i32) -> Result<i32, EvalError> {
        match self {
            Operator::Add => Ok(lhs.wrapping_add(rhs)),
            Operator::Sub => Ok(lhs.wrapping_sub(rhs)),
            Operator::Mul => Ok(lhs.wrapping_mul(rhs)),
            Operator::Div if rhs == 0 => Err(EvalError::DivisionByZero),
            Operator::Div => Ok(lhs.wrapping_div(rhs)),
        }
    }
}
