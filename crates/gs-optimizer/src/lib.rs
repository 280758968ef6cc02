//! # gs-optimizer
//!
//! Adaptive two-parameter grid search.
//!
//! A search scores every point of a coarse grid at low fidelity, then
//! hill-climbs through 3×3 neighborhoods at high fidelity, growing the grid
//! when the best point sits on its border. Evaluations are memoized per
//! fidelity and run concurrently on a per-pass worker pool. The modeling
//! library plugs in through the [`Candidate`](gs_types::Candidate),
//! [`Evaluator`] and [`Dataset`] traits.

mod cache;
mod candidate;
mod config;
mod controller;
mod evaluator;
mod expression;
mod mapper;
mod pool;
mod search;
pub mod synthetic;
mod task;

pub use cache::{CacheStats, PerformanceCache};
pub use candidate::{CandidateBuilder, ResolvedParameter};
pub use config::{AxisConfig, SearchConfig, SearchId};
pub use controller::{PassSummary, SearchController, SearchOutcome, SearchState};
pub use evaluator::{stratified_resample, Dataset, Evaluator};
pub use expression::{Bindings, Expression};
pub use mapper::ValueMapper;
pub use pool::{BatchResult, PoolTask, TaskHandle, WorkerPool};
pub use search::{FittedSearch, GridSearch, MEASURE_NAMES};
pub use task::{EvaluationContext, EvaluationTask};
