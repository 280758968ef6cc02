//! Grid coordinates and tolerance-aware float comparison.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Absolute tolerance used for every coordinate comparison.
pub const TOLERANCE: f64 = 1e-6;

/// `a == b` within [`TOLERANCE`].
pub fn approx_eq(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() < TOLERANCE
}

/// `a < b` by more than [`TOLERANCE`].
pub fn definitely_less(a: f64, b: f64) -> bool {
    b - a > TOLERANCE
}

/// `a <= b` within [`TOLERANCE`].
pub fn less_or_approx(a: f64, b: f64) -> bool {
    a < b || approx_eq(a, b)
}

/// `a >= b` within [`TOLERANCE`].
pub fn greater_or_approx(a: f64, b: f64) -> bool {
    a > b || approx_eq(a, b)
}

/// A candidate setting in grid-coordinate space, before value mapping.
///
/// Equality is tolerant: two points are equal when both coordinates agree
/// within [`TOLERANCE`]. The type has no `Hash`
/// impl; see `PerformanceCache` for how points are keyed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: f64,
    pub y: f64,
}

impl GridPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl PartialEq for GridPoint {
    fn eq(&self, other: &Self) -> bool {
        approx_eq(self.x, other.x) && approx_eq(self.y, other.y)
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

/// Integer location of a point inside a grid (column `x`, row `y`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridIndex {
    pub x: usize,
    pub y: usize,
}

impl GridIndex {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for GridIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_compare_with_tolerance() {
        let a = GridPoint::new(0.1 + 0.2, -3.0);
        let b = GridPoint::new(0.3, -3.0 + 1e-9);
        assert_eq!(a, b);
        assert_ne!(a, GridPoint::new(0.3, -2.99));
    }

    #[test]
    fn comparison_helpers() {
        assert!(definitely_less(1.0, 1.1));
        assert!(!definitely_less(1.0, 1.0 + 1e-9));
        assert!(less_or_approx(1.0 + 1e-9, 1.0));
        assert!(greater_or_approx(1.0 - 1e-9, 1.0));
        assert!(!greater_or_approx(0.9, 1.0));
    }

    #[test]
    fn display_formats() {
        assert_eq!(GridPoint::new(1.0, -0.5).to_string(), "[1, -0.5]");
        assert_eq!(GridIndex::new(2, 0).to_string(), "[2, 0]");
    }
}
