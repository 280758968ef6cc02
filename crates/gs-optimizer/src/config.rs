//! Search configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use gs_types::{config_error, AxisKind, AxisSpec, Grid, GsResult, Metric, Traversal};

/// Unique search run identifier.
pub type SearchId = Uuid;

/// One tuned axis: the parameter path it drives, its grid range and the
/// formula mapping grid coordinates to parameter values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisConfig {
    /// Parameter path on the candidate, e.g. `"kernel.gamma"`.
    pub property: String,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    /// Value bound to `BASE` in the expression.
    pub base: f64,
    /// Formula over `BASE`, `FROM`, `TO`, `STEP` and `I`.
    pub expression: String,
}

impl AxisConfig {
    pub fn new(property: &str) -> Self {
        Self {
            property: property.to_string(),
            ..Self::default()
        }
    }

    pub fn with_range(mut self, min: f64, max: f64, step: f64) -> Self {
        self.min = min;
        self.max = max;
        self.step = step;
        self
    }

    pub fn with_base(mut self, base: f64) -> Self {
        self.base = base;
        self
    }

    pub fn with_expression(mut self, expression: &str) -> Self {
        self.expression = expression.to_string();
        self
    }

    /// Axis label shown in grid and table output.
    pub fn label(&self) -> String {
        format!(
            "property {}, expr. {}, base {}",
            self.property, self.expression, self.base
        )
    }

    fn spec(&self) -> AxisSpec {
        AxisSpec::new(self.min, self.max, self.step).with_label(self.label())
    }
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            property: String::new(),
            min: -3.0,
            max: 3.0,
            step: 1.0,
            base: 10.0,
            expression: "pow(BASE,I)".to_string(),
        }
    }
}

/// Top-level configuration for one search run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub id: SearchId,
    pub name: String,

    pub x: AxisConfig,
    pub y: AxisConfig,

    /// Metric the search optimizes.
    pub metric: Metric,

    /// Order in which a pass walks the grid. Only affects log order.
    pub traversal: Traversal,

    /// Whether the grid may grow when the best point sits on its border.
    pub grid_extendable: bool,

    /// Maximum number of grid extensions.
    pub max_grid_extensions: usize,

    /// Share of the data used for the initial pass, in percent.
    pub sample_size_percent: f64,

    /// Number of concurrent evaluations per pass.
    pub num_execution_slots: usize,

    /// Seed handed to the evaluator and to subsampling.
    pub seed: u64,

    /// Cross-validation folds for the initial pass.
    pub initial_folds: usize,

    /// Cross-validation folds for refinement passes.
    pub refine_folds: usize,

    pub created_at: DateTime<Utc>,
}

impl SearchConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_x(mut self, axis: AxisConfig) -> Self {
        self.x = axis;
        self
    }

    pub fn with_y(mut self, axis: AxisConfig) -> Self {
        self.y = axis;
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_traversal(mut self, traversal: Traversal) -> Self {
        self.traversal = traversal;
        self
    }

    pub fn with_extension(mut self, enabled: bool, max_extensions: usize) -> Self {
        self.grid_extendable = enabled;
        self.max_grid_extensions = max_extensions;
        self
    }

    pub fn with_sample_size(mut self, percent: f64) -> Self {
        self.sample_size_percent = percent;
        self
    }

    pub fn with_execution_slots(mut self, slots: usize) -> Self {
        self.num_execution_slots = slots;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_folds(mut self, initial: usize, refine: usize) -> Self {
        self.initial_folds = initial;
        self.refine_folds = refine;
        self
    }

    pub fn axis(&self, kind: AxisKind) -> &AxisConfig {
        match kind {
            AxisKind::X => &self.x,
            AxisKind::Y => &self.y,
        }
    }

    /// Build the grid of the first pass.
    pub fn initial_grid(&self) -> GsResult<Grid> {
        Ok(Grid::new(self.x.spec(), self.y.spec())?)
    }

    /// Check everything that can be checked before any evaluation runs.
    pub fn validate(&self) -> GsResult<()> {
        if self.num_execution_slots == 0 {
            return Err(config_error!("num_execution_slots must be at least 1"));
        }
        if self.initial_folds < 2 || self.refine_folds < 2 {
            return Err(config_error!(
                "fold counts must be at least 2 (initial {}, refine {})",
                self.initial_folds,
                self.refine_folds
            ));
        }
        if !(self.sample_size_percent > 0.0 && self.sample_size_percent <= 100.0) {
            return Err(config_error!(
                "sample_size_percent must be in (0, 100], got {}",
                self.sample_size_percent
            ));
        }
        for kind in [AxisKind::X, AxisKind::Y] {
            if self.axis(kind).property.trim().is_empty() {
                return Err(config_error!("{kind} property must not be empty"));
            }
        }
        self.initial_grid()?;
        Ok(())
    }

    pub fn from_json_str(json: &str) -> GsResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> GsResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: "grid-search".to_string(),
            x: AxisConfig::new("C"),
            y: AxisConfig::new("kernel.gamma"),
            metric: Metric::default(),
            traversal: Traversal::default(),
            grid_extendable: false,
            max_grid_extensions: 3,
            sample_size_percent: 100.0,
            num_execution_slots: 1,
            seed: 1,
            initial_folds: 2,
            refine_folds: 10,
            created_at: Utc::now(),
        }
    }
}
