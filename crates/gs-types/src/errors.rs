use thiserror::Error;

use crate::grid::AxisKind;
use crate::point::GridPoint;

/// Main error type for the grid search system
#[derive(Error, Debug)]
pub enum GsError {
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    #[error("Expression error: {0}")]
    Expression(#[from] ExpressionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Evaluation failed at {point}: {source}")]
    Evaluation {
        point: GridPoint,
        #[source]
        source: Box<GsError>,
    },

    #[error("Model error: {0}")]
    Model(String),

    #[error("Degenerate search state: {0}")]
    DegenerateState(String),

    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    #[error("Worker panicked while running {task}: {message}")]
    WorkerPanicked { task: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl GsError {
    /// Wrap an error raised while scoring `point`.
    pub fn evaluation(point: GridPoint, source: GsError) -> Self {
        GsError::Evaluation {
            point,
            source: Box::new(source),
        }
    }

    /// True for errors that are detected before any evaluation runs.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            GsError::Config(_) | GsError::Parameter(_) | GsError::Validation(_)
        ) || matches!(
            self,
            GsError::Grid(
                GridError::InvalidBounds { .. }
                    | GridError::InvalidStep { .. }
                    | GridError::AxisMismatch { .. }
                    | GridError::TooManyPoints { .. }
            )
        )
    }
}

/// Grid geometry errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("{axis}Min must be smaller than {axis}Max (min {min}, max {max})")]
    InvalidBounds { axis: AxisKind, min: f64, max: f64 },

    #[error("{axis}Step must be a positive number above the coordinate tolerance (got {step})")]
    InvalidStep { axis: AxisKind, step: f64 },

    #[error("{axis} axis would have {points} points")]
    TooManyPoints { axis: AxisKind, points: f64 },

    #[error(
        "{axis} axis doesn't match! Provided max: {provided}, calculated max via min and step size: {computed}"
    )]
    AxisMismatch {
        axis: AxisKind,
        provided: f64,
        computed: f64,
    },

    #[error("Index out of scope on {axis} axis ({index} >= {size})")]
    IndexOutOfRange {
        axis: AxisKind,
        index: usize,
        size: usize,
    },

    #[error("Invalid subgrid: top {top} < bottom {bottom} or right {right} < left {left}")]
    InvalidSubgrid {
        top: usize,
        left: usize,
        bottom: usize,
        right: usize,
    },

    #[error("Grid extension failed: {point} does not lie on or beyond any border")]
    ExtensionFailed { point: GridPoint },
}

/// Errors raised while configuring a candidate's tunable parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Unknown parameter path: {path}")]
    UnknownPath { path: String },

    #[error("Parameter {path} expects a {expected} value, got {actual}")]
    KindMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("Parameter path must not be empty")]
    EmptyPath,
}

/// Errors raised while compiling or evaluating an axis expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Unexpected character '{ch}' at position {position}")]
    UnexpectedChar { ch: char, position: usize },

    #[error("Unexpected end of expression")]
    UnexpectedEnd,

    #[error("Unexpected token '{token}' at position {position}")]
    UnexpectedToken { token: String, position: usize },

    #[error("Invalid number literal '{literal}'")]
    InvalidNumber { literal: String },

    #[error("Unknown variable: {name}")]
    UnknownVariable { name: String },

    #[error("Unknown function: {name}")]
    UnknownFunction { name: String },

    #[error("Function {name} expects {expected} argument(s), got {actual}")]
    Arity {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Expression '{source_text}' was not compiled: {reason}")]
    NotCompiled { source_text: String, reason: String },

    #[error("Expression '{source_text}' produced a non-numeric result for I={input}")]
    NotANumber { source_text: String, input: f64 },
}

/// Result type alias for grid search operations
pub type GsResult<T> = Result<T, GsError>;

/// Helper trait for converting string errors
pub trait IntoGsError {
    fn into_gs_error(self) -> GsError;
}

impl IntoGsError for String {
    fn into_gs_error(self) -> GsError {
        GsError::Internal(self)
    }
}

impl IntoGsError for &str {
    fn into_gs_error(self) -> GsError {
        GsError::Internal(self.to_string())
    }
}

/// Macro for creating validation errors
#[macro_export]
macro_rules! validation_error {
    ($($arg:tt)*) => {
        $crate::GsError::Validation(format!($($arg)*))
    };
}

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::GsError::Internal(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::GsError::Config(format!($($arg)*))
    };
}
