//! Tunable candidate parameters.
//!
//! A candidate exposes its tunable settings by path (e.g. `"kernel.gamma"`).
//! The search resolves the [`ParameterKind`] of both tuned paths once, then
//! coerces every mapped axis value into a typed [`ParameterValue`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{GsResult, ParameterError};

/// Declared type of a tunable parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterKind {
    Float,
    Integer,
    Boolean,
}

impl ParameterKind {
    /// Coerce a mapped axis value into this kind.
    ///
    /// Integers truncate toward zero (saturating, NaN becomes 0); booleans
    /// are `true` for any nonzero value.
    pub fn coerce(self, value: f64) -> ParameterValue {
        match self {
            Self::Float => ParameterValue::Float(value),
            Self::Integer => ParameterValue::Integer(value as i64),
            Self::Boolean => ParameterValue::Boolean(value != 0.0),
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float => write!(f, "float"),
            Self::Integer => write!(f, "integer"),
            Self::Boolean => write!(f, "boolean"),
        }
    }
}

/// A concrete, typed parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Float(f64),
    Integer(i64),
    Boolean(bool),
}

impl ParameterValue {
    pub fn kind(&self) -> ParameterKind {
        match self {
            Self::Float(_) => ParameterKind::Float,
            Self::Integer(_) => ParameterKind::Integer,
            Self::Boolean(_) => ParameterKind::Boolean,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Float(v) => *v,
            Self::Integer(v) => *v as f64,
            Self::Boolean(v) => f64::from(u8::from(*v)),
        }
    }

    /// Build the error a [`Candidate`] returns when handed the wrong kind.
    pub fn mismatch(&self, path: &str, expected: ParameterKind) -> ParameterError {
        ParameterError::KindMismatch {
            path: path.to_string(),
            expected: expected.to_string(),
            actual: self.kind().to_string(),
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Boolean(v) => write!(f, "{v}"),
        }
    }
}

/// A model configuration whose tunable parameters can be set by path.
///
/// Implementations are cloned once per evaluated point; the search never
/// mutates the template it was given.
pub trait Candidate: Clone + Send + Sync + 'static {
    /// Kind of the parameter at `path`, or `None` if there is no such parameter.
    fn parameter_kind(&self, path: &str) -> Option<ParameterKind>;

    /// Set the parameter at `path`.
    fn set_parameter(&mut self, path: &str, value: ParameterValue) -> GsResult<()>;

    /// Short human-readable description, used in logs and summaries.
    fn describe(&self) -> String;
}
