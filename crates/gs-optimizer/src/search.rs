//! Entry point: search the grid, then train the winning candidate.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::info;

use gs_types::{validation_error, AxisKind, Candidate, GridPoint, GsResult};

use crate::candidate::CandidateBuilder;
use crate::config::{SearchConfig, SearchId};
use crate::controller::{SearchController, SearchOutcome};
use crate::evaluator::{Dataset, Evaluator};
use crate::mapper::ValueMapper;
use crate::task::EvaluationContext;

/// Names accepted by [`FittedSearch::measure`].
pub const MEASURE_NAMES: [&str; 3] = ["measureX", "measureY", "measureGridExtensionsPerformed"];

/// Two-parameter grid search over a candidate template.
#[derive(Debug)]
pub struct GridSearch<C, E> {
    config: SearchConfig,
    template: C,
    evaluator: Arc<E>,
}

impl<C: Candidate, E> GridSearch<C, E> {
    pub fn new(config: SearchConfig, template: C, evaluator: E) -> Self {
        Self {
            config,
            template,
            evaluator: Arc::new(evaluator),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Search for the best point, then train a candidate configured with
    /// its mapped values on the full `data`.
    ///
    /// Configuration problems (bad grid, unknown parameter path) are reported
    /// before anything is evaluated.
    pub fn fit<D>(&self, data: D) -> GsResult<FittedSearch<C>>
    where
        D: Dataset,
        E: Evaluator<C, D>,
    {
        let started_at = Utc::now();
        self.config.validate()?;

        let builder = CandidateBuilder::new(self.template.clone(), &self.config.x.property, &self.config.y.property)?;
        let mapper = ValueMapper::new(&self.config.x, &self.config.y);
        let context = EvaluationContext::new(builder.clone(), mapper.clone(), Arc::clone(&self.evaluator));

        let data = Arc::new(data);
        let outcome = SearchController::new(self.config.clone(), context).run(Arc::clone(&data))?;

        let point = outcome.point();
        let x_value = mapper.evaluate(point.x, AxisKind::X);
        let y_value = mapper.evaluate(point.y, AxisKind::Y);
        let mut candidate = builder.build(x_value, y_value)?;
        self.evaluator.train(&mut candidate, &data)?;
        info!(x = x_value, y = y_value, "Trained final candidate: {}", candidate.describe());

        Ok(FittedSearch {
            id: self.config.id,
            config: self.config.clone(),
            outcome,
            x_value,
            y_value,
            candidate,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

/// A finished search and its trained candidate.
#[derive(Debug, Clone, Serialize)]
pub struct FittedSearch<C> {
    pub id: SearchId,
    pub config: SearchConfig,
    pub outcome: SearchOutcome,
    /// Mapped value of the X parameter.
    pub x_value: f64,
    /// Mapped value of the Y parameter.
    pub y_value: f64,
    pub candidate: C,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl<C> FittedSearch<C> {
    pub fn point(&self) -> GridPoint {
        self.outcome.point()
    }

    pub fn extensions(&self) -> usize {
        self.outcome.extensions
    }

    pub fn measure_names() -> &'static [&'static str] {
        &MEASURE_NAMES
    }

    /// Value of a named measure; names are matched case-insensitively.
    pub fn measure(&self, name: &str) -> GsResult<f64> {
        if name.eq_ignore_ascii_case("measureX") {
            Ok(self.x_value)
        } else if name.eq_ignore_ascii_case("measureY") {
            Ok(self.y_value)
        } else if name.eq_ignore_ascii_case("measureGridExtensionsPerformed") {
            Ok(self.outcome.extensions as f64)
        } else {
            Err(validation_error!("Measure '{}' not supported", name))
        }
    }
}

impl<C: Candidate> fmt::Display for FittedSearch<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Grid search '{}':", self.config.name)?;
        writeln!(f, "Candidate: {}", self.candidate.describe())?;
        writeln!(f)?;
        writeln!(f, "X property: {}", self.config.x.property)?;
        writeln!(f, "Y property: {}", self.config.y.property)?;
        writeln!(f)?;
        writeln!(f, "Evaluation: {}", self.config.metric.description())?;
        writeln!(f, "Coordinates: {}", self.point())?;
        if self.config.grid_extendable {
            writeln!(f, "Grid-Extensions: {}", self.outcome.extensions)?;
        }
        write!(
            f,
            "Values: {} (X coordinate), {} (Y coordinate)",
            self.x_value, self.y_value
        )
    }
}
