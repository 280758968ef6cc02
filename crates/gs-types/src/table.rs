//! Matrix view of one pass's results for a single metric.

use std::fmt;

use crate::grid::Grid;
use crate::performance::{Metric, PerformanceRecord};

/// Metric values laid out on the grid, highest Y row first.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceTable {
    metric: Metric,
    x_label: String,
    y_label: String,
    rows: Vec<Vec<f64>>,
    min: f64,
    max: f64,
}

impl PerformanceTable {
    /// Cells without a record stay NaN.
    pub fn new(grid: &Grid, records: &[PerformanceRecord], metric: Metric) -> Self {
        let mut rows = vec![vec![f64::NAN; grid.width()]; grid.height()];
        let mut min = f64::NAN;
        let mut max = f64::NAN;

        for record in records {
            let location = grid.nearest_index(&record.point);
            let value = record.value(metric);
            rows[grid.height() - location.y - 1][location.x] = value;

            // f64::min/max ignore NaN operands
            min = min.min(value);
            max = max.max(value);
        }

        Self {
            metric,
            x_label: grid.x_axis().label().to_string(),
            y_label: grid.y_axis().label().to_string(),
            rows,
            min,
            max,
        }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

impl fmt::Display for PerformanceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Table ({}) - X: {}, Y: {}:",
            self.metric.description(),
            self.x_label,
            self.y_label
        )?;
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            write!(f, "{}", cells.join(","))?;
        }
        Ok(())
    }
}
