//! Evaluation of a single grid point.

use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

use gs_types::{AxisKind, Candidate, GridPoint, GsError, GsResult, PerformanceRecord};

use crate::candidate::CandidateBuilder;
use crate::evaluator::Evaluator;
use crate::mapper::ValueMapper;
use crate::pool::PoolTask;

/// Read-only state shared by every task of a search.
pub struct EvaluationContext<C, D, E> {
    pub builder: Arc<CandidateBuilder<C>>,
    pub mapper: Arc<ValueMapper>,
    pub evaluator: Arc<E>,
    _data: PhantomData<fn() -> D>,
}

impl<C, D, E> EvaluationContext<C, D, E> {
    pub fn new(builder: CandidateBuilder<C>, mapper: ValueMapper, evaluator: Arc<E>) -> Self {
        Self {
            builder: Arc::new(builder),
            mapper: Arc::new(mapper),
            evaluator,
            _data: PhantomData,
        }
    }
}

impl<C, D, E> Clone for EvaluationContext<C, D, E> {
    fn clone(&self) -> Self {
        Self {
            builder: Arc::clone(&self.builder),
            mapper: Arc::clone(&self.mapper),
            evaluator: Arc::clone(&self.evaluator),
            _data: PhantomData,
        }
    }
}

/// Scores one point at one fidelity.
pub struct EvaluationTask<C, D, E> {
    context: EvaluationContext<C, D, E>,
    data: Arc<D>,
    point: GridPoint,
    folds: usize,
    seed: u64,
}

impl<C, D, E> EvaluationTask<C, D, E>
where
    C: Candidate,
    D: Send + Sync + 'static,
    E: Evaluator<C, D>,
{
    pub fn new(context: EvaluationContext<C, D, E>, data: Arc<D>, point: GridPoint, folds: usize, seed: u64) -> Self {
        Self {
            context,
            data,
            point,
            folds,
            seed,
        }
    }

    pub fn point(&self) -> GridPoint {
        self.point
    }

    fn evaluate(&self) -> GsResult<PerformanceRecord> {
        let x = self.context.mapper.evaluate(self.point.x, AxisKind::X);
        let y = self.context.mapper.evaluate(self.point.y, AxisKind::Y);
        let candidate = self.context.builder.build(x, y)?;

        debug!(point = %self.point, x, y, folds = self.folds, "Evaluating {}", candidate.describe());
        let scores = self
            .context
            .evaluator
            .evaluate(&candidate, &self.data, self.folds, self.seed)?;
        Ok(PerformanceRecord::new(self.point, scores))
    }
}

impl<C, D, E> PoolTask for EvaluationTask<C, D, E>
where
    C: Candidate,
    D: Send + Sync + 'static,
    E: Evaluator<C, D>,
{
    type Output = PerformanceRecord;

    fn label(&self) -> String {
        format!("evaluation of {} ({}-fold)", self.point, self.folds)
    }

    fn run(self) -> GsResult<PerformanceRecord> {
        self.evaluate().map_err(|e| GsError::evaluation(self.point, e))
    }
}
