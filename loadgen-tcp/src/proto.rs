//! The arithmetic request/response protocol spoken by the TCP test target.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
)]
pub enum Operator {
    #[serde(rename = "+")]
    #[strum(serialize = "+")]
    Add,
    #[serde(rename = "-")]
    #[strum(serialize = "-")]
    Sub,
    #[serde(rename = "*")]
    #[strum(serialize = "*")]
    Mul,
    #[serde(rename = "/")]
    #[strum(serialize = "/")]
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("no operands")]
    NoOperands,
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow")]
    Overflow,
}

impl Operator {
    pub const ALL: [Self; 4] = [Self::Add, Self::Sub, Self::Mul, Self::Div];

    /// Folds `operands` left to right: `a op b op c ...`.
    pub fn apply(self, operands: &[i64]) -> Result<i64, EvalError> {
        let (&first, rest) = operands.split_first().ok_or(EvalError::NoOperands)?;

        rest.iter().try_fold(first, |acc, &v| match self {
            Self::Add => acc.checked_add(v).ok_or(EvalError::Overflow),
            Self::Sub => acc.checked_sub(v).ok_or(EvalError::Overflow),
            Self::Mul => acc.checked_mul(v).ok_or(EvalError::Overflow),
            Self::Div if v == 0 => Err(EvalError::DivisionByZero),
            Self::Div => acc.checked_div(v).ok_or(EvalError::Overflow),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerReq {
    pub id: i64,
    pub operands: Vec<i64>,
    pub operator: Operator,
}

impl ServerReq {
    pub fn eval(&self) -> Result<i64, EvalError> {
        self.operator.apply(&self.operands)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerResp {
    pub id: i64,
    #[serde(default)]
    pub formula: String,
    #[serde(default)]
    pub result: i64,
    /// Set when the server could not answer the request.
    #[serde(default)]
    pub err: Option<String>,
}

impl ServerResp {
    /// The server's answer to a well-formed request.
    #[must_use]
    pub fn answer(req: &ServerReq) -> Self {
        match req.eval() {
            Ok(result) => Self {
                id: req.id,
                formula: formula(&req.operands, req.operator, result, true),
                result,
                err: None,
            },
            Err(err) => Self {
                id: req.id,
                err: Some(format!("cannot evaluate request: {err}")),
                ..Self::default()
            },
        }
    }

    #[must_use]
    pub fn failure(err: impl Into<String>) -> Self {
        Self {
            err: Some(err.into()),
            ..Self::default()
        }
    }
}

/// Renders `a op b op c = result`, or `!=` when `equal` is false.
#[must_use]
pub fn formula(operands: &[i64], operator: Operator, result: i64, equal: bool) -> String {
    let mut out = String::new();
    for (i, v) in operands.iter().enumerate() {
        if i > 0 {
            let _ = write!(out, " {operator} ");
        }
        let _ = write!(out, "{v}");
    }

    let eq = if equal { "=" } else { "!=" };
    let _ = write!(out, " {eq} {result}");
    out
}
