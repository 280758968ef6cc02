//! Maps grid coordinates to actual parameter values.

use tracing::warn;

use gs_types::{AxisKind, ExpressionError};

use crate::config::AxisConfig;
use crate::expression::{Bindings, Expression};

/// Compiled formula and constants of one axis.
#[derive(Debug, Clone)]
struct AxisMapping {
    property: String,
    bindings: Bindings,
    source: String,
    compiled: Result<Expression, ExpressionError>,
}

impl AxisMapping {
    fn new(axis: &AxisConfig) -> Self {
        let compiled = Expression::compile(&axis.expression);
        if let Err(e) = &compiled {
            warn!(property = %axis.property, expression = %axis.expression, "Failed to compile axis expression: {}", e);
        }
        Self {
            property: axis.property.clone(),
            bindings: Bindings {
                base: axis.base,
                from: axis.min,
                to: axis.max,
                step: axis.step,
                i: 0.0,
            },
            source: axis.expression.clone(),
            compiled,
        }
    }

    fn evaluate(&self, value: f64) -> Result<f64, ExpressionError> {
        let expr = self.compiled.as_ref().map_err(|e| ExpressionError::NotCompiled {
            source_text: self.source.clone(),
            reason: e.to_string(),
        })?;
        let result = expr.eval(&Bindings { i: value, ..self.bindings });
        if result.is_nan() {
            return Err(ExpressionError::NotANumber {
                source_text: self.source.clone(),
                input: value,
            });
        }
        Ok(result)
    }
}

/// Pure mapping from grid coordinates to parameter values, one formula per
/// axis. Both formulas are compiled once, when the mapper is built.
///
/// `FROM` and `TO` are bound to the configured axis bounds, not to the bounds
/// of an extended grid.
#[derive(Debug, Clone)]
pub struct ValueMapper {
    x: AxisMapping,
    y: AxisMapping,
}

impl ValueMapper {
    pub fn new(x: &AxisConfig, y: &AxisConfig) -> Self {
        Self {
            x: AxisMapping::new(x),
            y: AxisMapping::new(y),
        }
    }

    fn mapping(&self, axis: AxisKind) -> &AxisMapping {
        match axis {
            AxisKind::X => &self.x,
            AxisKind::Y => &self.y,
        }
    }

    /// Map `value` along `axis`. Failures yield NaN and are logged.
    pub fn evaluate(&self, value: f64, axis: AxisKind) -> f64 {
        let mapping = self.mapping(axis);
        match mapping.evaluate(value) {
            Ok(v) => v,
            Err(e) => {
                warn!(axis = %axis, property = %mapping.property, "Value mapping failed: {}", e);
                f64::NAN
            }
        }
    }

    /// Like [`evaluate`](Self::evaluate) but reports the failure instead of
    /// returning NaN.
    pub fn try_evaluate(&self, value: f64, axis: AxisKind) -> Result<f64, ExpressionError> {
        self.mapping(axis).evaluate(value)
    }

    pub fn property(&self, axis: AxisKind) -> &str {
        &self.mapping(axis).property
    }
}
