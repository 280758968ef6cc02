//! Hill-climbing search over the grid.
//!
//! A search runs one low-fidelity pass over the whole initial grid, then
//! repeatedly evaluates the 3×3 neighborhood of the current best point at
//! high fidelity until the best point stops moving, the neighborhood scores
//! uniformly, or the best point sits on a border that may not (or can no
//! longer) be extended.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn, Level};

use gs_types::{
    internal_error, is_uniform, Candidate, Grid, GridPoint, GsError, GsResult, Metric, PerformanceComparator,
    PerformanceRecord, PerformanceTable,
};

use crate::cache::{CacheStats, PerformanceCache};
use crate::config::SearchConfig;
use crate::evaluator::{Dataset, Evaluator};
use crate::pool::WorkerPool;
use crate::task::{EvaluationContext, EvaluationTask};

/// Controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    InitialPass,
    Refine { iteration: usize },
    ExtendGrid { iteration: usize },
    Done,
}

/// What happened in one evaluation pass.
#[derive(Debug, Clone, Serialize)]
pub struct PassSummary {
    /// 0 for the initial pass, then the refinement iteration.
    pub iteration: usize,
    pub folds: usize,
    pub grid: Grid,
    pub evaluated: usize,
    pub cached: usize,
    pub failed: usize,
    pub best: PerformanceRecord,
    pub uniform: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Result of a completed search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub best: PerformanceRecord,
    pub grid: Grid,
    pub extensions: usize,
    pub iterations: usize,
    pub uniform: bool,
    pub passes: Vec<PassSummary>,
    pub cache: CacheStats,
}

impl SearchOutcome {
    pub fn point(&self) -> GridPoint {
        self.best.point
    }
}

pub struct SearchController<C, D, E> {
    config: SearchConfig,
    context: EvaluationContext<C, D, E>,
    cache: PerformanceCache,
    comparator: PerformanceComparator,
    extensions: usize,
    passes: Vec<PassSummary>,
}

impl<C, D, E> SearchController<C, D, E>
where
    C: Candidate,
    D: Dataset,
    E: Evaluator<C, D>,
{
    pub fn new(config: SearchConfig, context: EvaluationContext<C, D, E>) -> Self {
        let comparator = PerformanceComparator::new(config.metric);
        Self {
            config,
            context,
            cache: PerformanceCache::new(),
            comparator,
            extensions: 0,
            passes: Vec::new(),
        }
    }

    pub fn metric(&self) -> Metric {
        self.config.metric
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Run the search on `data` and return the winning point.
    pub fn run(mut self, data: Arc<D>) -> GsResult<SearchOutcome> {
        let mut grid = self.config.initial_grid()?;
        let sample = if self.config.sample_size_percent < 100.0 {
            info!(percent = self.config.sample_size_percent, "Generating sample");
            Arc::new(data.resample(self.config.sample_size_percent, self.config.seed)?)
        } else {
            Arc::clone(&data)
        };

        info!(
            metric = %self.config.metric,
            slots = self.config.num_execution_slots,
            "Starting grid search '{}'", self.config.name
        );

        let mut state = SearchState::InitialPass;
        let mut best: Option<PerformanceRecord> = None;
        let mut uniform = false;
        let mut iterations = 0;

        loop {
            state = match state {
                SearchState::InitialPass => {
                    let pass = self.determine_best_in_grid(0, &grid, &sample, self.config.initial_folds)?;
                    info!("Result of initial pass: {}", pass.best.describe(self.metric()));
                    uniform = pass.uniform;
                    best = Some(pass.best);
                    if uniform {
                        SearchState::Done
                    } else {
                        SearchState::Refine { iteration: 1 }
                    }
                }
                SearchState::Refine { iteration } => {
                    let current = current_best(&best)?;
                    let center = grid.nearest_index(&current.point);

                    if grid.is_on_border(&center) {
                        info!(point = %current.point, "Center is on border of grid");
                        if !self.config.grid_extendable {
                            SearchState::Done
                        } else if self.extensions >= self.config.max_grid_extensions {
                            info!(max = self.config.max_grid_extensions, "Maximum number of extensions reached");
                            SearchState::Done
                        } else {
                            SearchState::ExtendGrid { iteration }
                        }
                    } else {
                        iterations = iteration;
                        let neighbors = grid.neighborhood(&center)?;
                        let pass = self.determine_best_in_grid(iteration, &neighbors, &data, self.config.refine_folds)?;
                        info!(iteration, "Result of refinement: {}", pass.best.describe(self.metric()));

                        uniform = pass.uniform;
                        let unchanged = pass.best.point == current.point;
                        best = Some(pass.best);
                        if unchanged {
                            info!("No better point found");
                        }
                        if uniform || unchanged {
                            SearchState::Done
                        } else {
                            SearchState::Refine { iteration: iteration + 1 }
                        }
                    }
                }
                SearchState::ExtendGrid { iteration } => {
                    let current = current_best(&best)?;
                    grid = grid
                        .extend(&current.point)
                        .map_err(|e| GsError::DegenerateState(e.to_string()))?;
                    self.extensions += 1;
                    info!(
                        extensions = self.extensions,
                        max = self.config.max_grid_extensions,
                        "Extending grid:\n{}", grid
                    );
                    SearchState::Refine { iteration }
                }
                SearchState::Done => break,
            };
        }

        let best = best.ok_or_else(|| internal_error!("search finished without a result"))?;
        info!(
            extensions = self.extensions,
            iterations,
            uniform,
            "Final result: {}", best.describe(self.metric())
        );

        Ok(SearchOutcome {
            best,
            grid,
            extensions: self.extensions,
            iterations,
            uniform,
            passes: self.passes,
            cache: self.cache.stats(),
        })
    }

    /// Evaluate every point of `grid` at `folds` folds and return the pass
    /// summary. Cached points are not evaluated again; a pass in which every
    /// point is cached is an error.
    pub fn determine_best_in_grid(
        &mut self,
        iteration: usize,
        grid: &Grid,
        data: &Arc<D>,
        folds: usize,
    ) -> GsResult<PassSummary> {
        let started_at = Utc::now();
        info!(folds, points = grid.len(), "Determining best pair with {}-fold CV in grid:\n{}", folds, grid);

        let mut records = Vec::with_capacity(grid.len());
        let mut tasks = Vec::new();
        for point in grid.points(self.config.traversal) {
            match self.cache.lookup(folds, &point) {
                Some(record) => {
                    debug!("{}: cached=true", record.describe(self.metric()));
                    records.push(record);
                }
                None => tasks.push(EvaluationTask::new(
                    self.context.clone(),
                    Arc::clone(data),
                    point,
                    folds,
                    self.config.seed,
                )),
            }
        }

        if tasks.is_empty() {
            warn!(folds, "All points were already cached");
            return Err(GsError::DegenerateState(
                "all points were already cached".to_string(),
            ));
        }
        let cached = records.len();

        let pool = WorkerPool::start(self.config.num_execution_slots)?;
        let batch = pool.run_all(tasks);
        pool.stop();

        let (evaluated, failed) = (batch.completed, batch.failed);
        if failed > 0 {
            warn!(evaluated, failed, "Evaluation pass failed");
        }
        for record in batch.into_outputs()? {
            debug!("{}: cached=false", record.describe(self.metric()));
            self.cache.store(folds, record.clone());
            records.push(record);
        }

        self.comparator.sort(&mut records);
        let uniform = is_uniform(&records, self.metric());
        if uniform {
            info!("All performances are the same");
        }
        if tracing::enabled!(Level::DEBUG) {
            for metric in Metric::ALL {
                debug!("{}", PerformanceTable::new(grid, &records, metric));
            }
        }

        let best = records
            .last()
            .cloned()
            .ok_or_else(|| internal_error!("pass produced no records"))?;
        debug!("Best performance: {}", best);

        let summary = PassSummary {
            iteration,
            folds,
            grid: grid.clone(),
            evaluated,
            cached,
            failed,
            best,
            uniform,
            started_at,
            finished_at: Utc::now(),
        };
        self.passes.push(summary.clone());
        Ok(summary)
    }
}

fn current_best(best: &Option<PerformanceRecord>) -> GsResult<&PerformanceRecord> {
    best.as_ref()
        .ok_or_else(|| internal_error!("refinement started before the initial pass"))
}
