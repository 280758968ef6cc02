//! Discretized two-axis search grid.
//!
//! A [`Grid`] is immutable: narrowing ([`Grid::subgrid`]) and growing
//! ([`Grid::extend`]) always return a new instance. Every comparison between
//! coordinates goes through the tolerance helpers in [`crate::point`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::GridError;
use crate::point::{approx_eq, definitely_less, greater_or_approx, less_or_approx, GridIndex, GridPoint, TOLERANCE};

/// Upper bound on the number of points along one axis.
pub const MAX_AXIS_POINTS: usize = u32::MAX as usize;

/// Which of the two search axes a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisKind {
    X,
    Y,
}

impl fmt::Display for AxisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => write!(f, "X"),
            Self::Y => write!(f, "Y"),
        }
    }
}

/// Order in which the points of a pass are enumerated.
///
/// Only affects task submission and log order, never the selected point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Traversal {
    #[serde(rename = "row-wise")]
    ByRow,
    #[default]
    #[serde(rename = "column-wise")]
    ByColumn,
}

/// Raw bounds of one axis, as configured or serialized.
///
/// `step` must exceed [`TOLERANCE`], otherwise neighbouring points would
/// compare equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisSpec {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    #[serde(default)]
    pub label: String,
}

impl AxisSpec {
    pub fn new(min: f64, max: f64, step: f64) -> Self {
        Self {
            min,
            max,
            step,
            label: String::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// A validated axis: bounds that divide evenly into `count` points.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    spec: AxisSpec,
    count: usize,
}

impl Axis {
    fn new(kind: AxisKind, spec: AxisSpec) -> Result<Self, GridError> {
        let AxisSpec { min, max, step, .. } = spec;

        // `!(a < b)` also rejects NaN bounds
        if !(min < max) {
            return Err(GridError::InvalidBounds { axis: kind, min, max });
        }
        if !(step > TOLERANCE) || !step.is_finite() {
            return Err(GridError::InvalidStep { axis: kind, step });
        }

        let steps = ((max - min) / step).round();
        if !steps.is_finite() || steps >= MAX_AXIS_POINTS as f64 {
            return Err(GridError::TooManyPoints { axis: kind, points: steps + 1.0 });
        }
        let count = (steps as usize)
            .checked_add(1)
            .ok_or(GridError::TooManyPoints { axis: kind, points: steps + 1.0 })?;
        let computed = min + steps * step;
        if !approx_eq(computed, max) {
            return Err(GridError::AxisMismatch {
                axis: kind,
                provided: max,
                computed,
            });
        }

        Ok(Self { spec, count })
    }

    pub fn min(&self) -> f64 {
        self.spec.min
    }

    pub fn max(&self) -> f64 {
        self.spec.max
    }

    pub fn step(&self) -> f64 {
        self.spec.step
    }

    pub fn label(&self) -> &str {
        &self.spec.label
    }

    /// Number of grid points along this axis.
    pub fn count(&self) -> usize {
        self.count
    }

    fn value(&self, index: usize) -> f64 {
        self.spec.min + self.spec.step * index as f64
    }

    /// Closest index to `value`; exact ties (within tolerance) keep the lower index.
    fn nearest(&self, value: f64) -> usize {
        let mut best = 0;
        let mut best_distance = (value - self.value(0)).abs();
        for i in 1..self.count {
            let distance = (value - self.value(i)).abs();
            if definitely_less(distance, best_distance) {
                best = i;
                best_distance = distance;
            }
        }
        best
    }

    fn check_index(&self, kind: AxisKind, index: usize) -> Result<(), GridError> {
        if index >= self.count {
            return Err(GridError::IndexOutOfRange {
                axis: kind,
                index,
                size: self.count,
            });
        }
        Ok(())
    }

    /// New lower bound so that `value` ends up strictly inside.
    fn grown_min(&self, value: f64) -> f64 {
        if less_or_approx(value, self.min()) {
            let steps = ((self.min() - value) / self.step()).round() + 1.0;
            self.min() - self.step() * steps
        } else {
            self.min()
        }
    }

    /// New upper bound so that `value` ends up strictly inside.
    fn grown_max(&self, value: f64) -> f64 {
        if greater_or_approx(value, self.max()) {
            let steps = ((value - self.max()) / self.step()).round() + 1.0;
            self.max() + self.step() * steps
        } else {
            self.max()
        }
    }
}

/// Two-axis grid of candidate coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridSpec", into = "GridSpec")]
pub struct Grid {
    x: Axis,
    y: Axis,
}

/// Serialized form of a [`Grid`]; validated on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub x: AxisSpec,
    pub y: AxisSpec,
}

impl TryFrom<GridSpec> for Grid {
    type Error = GridError;

    fn try_from(spec: GridSpec) -> Result<Self, Self::Error> {
        Grid::new(spec.x, spec.y)
    }
}

impl From<Grid> for GridSpec {
    fn from(grid: Grid) -> Self {
        GridSpec {
            x: grid.x.spec,
            y: grid.y.spec,
        }
    }
}

impl Grid {
    /// Build a grid, validating both axes.
    pub fn new(x: AxisSpec, y: AxisSpec) -> Result<Self, GridError> {
        Ok(Self {
            x: Axis::new(AxisKind::X, x)?,
            y: Axis::new(AxisKind::Y, y)?,
        })
    }

    pub fn x_axis(&self) -> &Axis {
        &self.x
    }

    pub fn y_axis(&self) -> &Axis {
        &self.y
    }

    pub fn axis(&self, kind: AxisKind) -> &Axis {
        match kind {
            AxisKind::X => &self.x,
            AxisKind::Y => &self.y,
        }
    }

    /// Number of points along X.
    pub fn width(&self) -> usize {
        self.x.count
    }

    /// Number of points along Y.
    pub fn height(&self) -> usize {
        self.y.count
    }

    pub fn len(&self) -> usize {
        self.width() * self.height()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Coordinates of the point at column `x`, row `y`.
    pub fn value_at(&self, x: usize, y: usize) -> Result<GridPoint, GridError> {
        self.x.check_index(AxisKind::X, x)?;
        self.y.check_index(AxisKind::Y, y)?;
        Ok(GridPoint::new(self.x.value(x), self.y.value(y)))
    }

    /// Closest grid location to `point`, resolved independently per axis.
    pub fn nearest_index(&self, point: &GridPoint) -> GridIndex {
        GridIndex::new(self.x.nearest(point.x), self.y.nearest(point.y))
    }

    pub fn is_on_border(&self, index: &GridIndex) -> bool {
        index.x == 0 || index.x + 1 == self.width() || index.y == 0 || index.y + 1 == self.height()
    }

    pub fn is_point_on_border(&self, point: &GridPoint) -> bool {
        self.is_on_border(&self.nearest_index(point))
    }

    /// Narrowed grid between the given indices (inclusive), keeping the steps.
    ///
    /// `top` and `bottom` are Y indices with `top >= bottom`; `left` and
    /// `right` are X indices with `right >= left`.
    pub fn subgrid(&self, top: usize, left: usize, bottom: usize, right: usize) -> Result<Self, GridError> {
        if top < bottom || right < left {
            return Err(GridError::InvalidSubgrid {
                top,
                left,
                bottom,
                right,
            });
        }

        let upper_left = self.value_at(left, top)?;
        let upper_right = self.value_at(right, top)?;
        let lower_left = self.value_at(left, bottom)?;

        Grid::new(
            AxisSpec::new(upper_left.x, upper_right.x, self.x.step()).with_label(self.x.label()),
            AxisSpec::new(lower_left.y, upper_left.y, self.y.step()).with_label(self.y.label()),
        )
    }

    /// The 3×3 grid centred on `center`. Fails when `center` is on the border.
    pub fn neighborhood(&self, center: &GridIndex) -> Result<Self, GridError> {
        let left = center.x.checked_sub(1).ok_or(GridError::IndexOutOfRange {
            axis: AxisKind::X,
            index: center.x,
            size: self.width(),
        })?;
        let bottom = center.y.checked_sub(1).ok_or(GridError::IndexOutOfRange {
            axis: AxisKind::Y,
            index: center.y,
            size: self.height(),
        })?;
        self.subgrid(center.y + 1, left, bottom, center.x + 1)
    }

    /// Grow the bounds so that `point` becomes an interior point.
    ///
    /// Every side on or beyond which `point` lies moves outward by whole
    /// steps; sides where the point is strictly inside stay put.
    pub fn extend(&self, point: &GridPoint) -> Result<Self, GridError> {
        let result = Grid::new(
            AxisSpec::new(self.x.grown_min(point.x), self.x.grown_max(point.x), self.x.step())
                .with_label(self.x.label()),
            AxisSpec::new(self.y.grown_min(point.y), self.y.grown_max(point.y), self.y.step())
                .with_label(self.y.label()),
        )?;

        if result == *self {
            return Err(GridError::ExtensionFailed { point: *point });
        }

        Ok(result)
    }

    /// Points of row `y`, left to right.
    pub fn row(&self, y: usize) -> impl Iterator<Item = GridPoint> + '_ {
        let y_value = self.y.value(y);
        (0..self.width()).map(move |x| GridPoint::new(self.x.value(x), y_value))
    }

    /// Points of column `x`, bottom to top.
    pub fn column(&self, x: usize) -> impl Iterator<Item = GridPoint> + '_ {
        let x_value = self.x.value(x);
        (0..self.height()).map(move |y| GridPoint::new(x_value, self.y.value(y)))
    }

    /// Every point of the grid, enumerated in `traversal` order.
    pub fn points(&self, traversal: Traversal) -> Vec<GridPoint> {
        let mut points = Vec::with_capacity(self.len());
        match traversal {
            Traversal::ByRow => {
                for y in 0..self.height() {
                    points.extend(self.row(y));
                }
            }
            Traversal::ByColumn => {
                for x in 0..self.width() {
                    points.extend(self.column(x));
                }
            }
        }
        points
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (kind, axis) in [(AxisKind::X, &self.x), (AxisKind::Y, &self.y)] {
            write!(f, "{kind}: {} - {}, Step {}", axis.min(), axis.max(), axis.step())?;
            if !axis.label().is_empty() {
                write!(f, " ({})", axis.label())?;
            }
            writeln!(f)?;
        }
        write!(f, "Dimensions (Rows x Columns): {} x {}", self.height(), self.width())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(x: (f64, f64, f64), y: (f64, f64, f64)) -> Grid {
        Grid::new(AxisSpec::new(x.0, x.1, x.2), AxisSpec::new(y.0, y.1, y.2)).unwrap()
    }

    #[test]
    fn construction_derives_dimensions() {
        let g = grid((-3.0, 3.0, 1.0), (0.0, 1.0, 0.25));
        assert_eq!(g.width(), 7);
        assert_eq!(g.height(), 5);
        assert_eq!(g.len(), 35);
    }

    #[test]
    fn construction_accepts_steps_with_rounding_noise() {
        let g = grid((0.0, 1.0, 0.1), (0.0, 0.3, 0.1));
        assert_eq!(g.width(), 11);
        assert_eq!(g.height(), 4);
    }

    #[test]
    fn construction_rejects_invalid_axes() {
        let bounds = Grid::new(AxisSpec::new(3.0, 3.0, 1.0), AxisSpec::new(0.0, 1.0, 1.0));
        assert!(matches!(bounds, Err(GridError::InvalidBounds { axis: AxisKind::X, .. })));

        let step = Grid::new(AxisSpec::new(0.0, 1.0, 1.0), AxisSpec::new(0.0, 1.0, -0.5));
        assert!(matches!(step, Err(GridError::InvalidStep { axis: AxisKind::Y, .. })));

        let mismatch = Grid::new(AxisSpec::new(0.0, 1.0, 0.3), AxisSpec::new(0.0, 1.0, 0.5));
        match mismatch {
            Err(GridError::AxisMismatch { axis, provided, computed }) => {
                assert_eq!(axis, AxisKind::X);
                assert_eq!(provided, 1.0);
                assert!((computed - 0.9).abs() < 1e-9);
            }
            other => panic!("expected axis mismatch, got {other:?}"),
        }

        let nan = Grid::new(AxisSpec::new(f64::NAN, 1.0, 0.5), AxisSpec::new(0.0, 1.0, 0.5));
        assert!(nan.is_err());
    }

    #[test]
    fn construction_rejects_steps_within_tolerance() {
        let tiny = Grid::new(AxisSpec::new(0.0, 1e-5, 1e-7), AxisSpec::new(0.0, 1.0, 1.0));
        assert!(matches!(tiny, Err(GridError::InvalidStep { axis: AxisKind::X, .. })));

        let at_tolerance = Grid::new(AxisSpec::new(0.0, 1.0, 1.0), AxisSpec::new(0.0, 1e-5, TOLERANCE));
        assert!(matches!(at_tolerance, Err(GridError::InvalidStep { axis: AxisKind::Y, .. })));

        let g = grid((0.0, 2e-5, 1e-5), (0.0, 1.0, 1.0));
        assert_eq!(g.width(), 3);
        assert_eq!(g.nearest_index(&GridPoint::new(2e-5, 0.0)), GridIndex::new(2, 0));
    }

    #[test]
    fn construction_rejects_oversized_axes() {
        let huge = Grid::new(AxisSpec::new(0.0, 1e20, 1.0), AxisSpec::new(0.0, 1.0, 1.0));
        assert!(matches!(huge, Err(GridError::TooManyPoints { axis: AxisKind::X, .. })));

        let infinite = Grid::new(AxisSpec::new(0.0, 1.0, 1.0), AxisSpec::new(-f64::MAX, f64::MAX, 1.0));
        assert!(matches!(infinite, Err(GridError::TooManyPoints { axis: AxisKind::Y, .. })));

        let wide = grid((0.0, 1e6, 1.0), (0.0, 1.0, 1.0));
        assert_eq!(wide.width(), 1_000_001);
    }

    #[test]
    fn value_at_is_exact_and_bounds_checked() {
        let g = grid((-3.0, 3.0, 1.0), (-2.0, 2.0, 2.0));
        assert_eq!(g.value_at(0, 0).unwrap(), GridPoint::new(-3.0, -2.0));
        assert_eq!(g.value_at(6, 2).unwrap(), GridPoint::new(3.0, 2.0));
        assert!(matches!(
            g.value_at(7, 0),
            Err(GridError::IndexOutOfRange { axis: AxisKind::X, index: 7, size: 7 })
        ));
        assert!(matches!(
            g.value_at(0, 3),
            Err(GridError::IndexOutOfRange { axis: AxisKind::Y, .. })
        ));
    }

    #[test]
    fn nearest_index_picks_closest_per_axis() {
        let g = grid((0.0, 4.0, 1.0), (0.0, 10.0, 2.0));
        assert_eq!(g.nearest_index(&GridPoint::new(2.2, 7.1)), GridIndex::new(2, 4));
        assert_eq!(g.nearest_index(&GridPoint::new(-5.0, 50.0)), GridIndex::new(0, 5));
        assert_eq!(g.nearest_index(&GridPoint::new(9.0, -1.0)), GridIndex::new(4, 0));

        let p = GridPoint::new(3.0000001, 8.0);
        let idx = g.nearest_index(&p);
        assert_eq!(g.value_at(idx.x, idx.y).unwrap(), GridPoint::new(3.0, 8.0));
    }

    #[test]
    fn nearest_index_ties_go_to_lower_index() {
        let g = grid((0.0, 4.0, 1.0), (0.0, 4.0, 1.0));
        assert_eq!(g.nearest_index(&GridPoint::new(1.5, 2.5)), GridIndex::new(1, 2));
    }

    #[test]
    fn border_detection() {
        let g = grid((0.0, 4.0, 1.0), (0.0, 4.0, 1.0));
        assert!(g.is_on_border(&GridIndex::new(0, 2)));
        assert!(g.is_on_border(&GridIndex::new(4, 2)));
        assert!(g.is_on_border(&GridIndex::new(2, 0)));
        assert!(g.is_on_border(&GridIndex::new(2, 4)));
        assert!(!g.is_on_border(&GridIndex::new(1, 3)));
        assert!(g.is_point_on_border(&GridPoint::new(3.9, 4.2)));
        assert!(!g.is_point_on_border(&GridPoint::new(2.0, 2.0)));
    }

    #[test]
    fn subgrid_narrows_bounds_and_keeps_steps() {
        let g = grid((-3.0, 3.0, 1.0), (-3.0, 3.0, 0.5));
        let sub = g.subgrid(4, 1, 2, 3).unwrap();
        assert_eq!(sub.x_axis().min(), -2.0);
        assert_eq!(sub.x_axis().max(), 0.0);
        assert_eq!(sub.y_axis().min(), -2.0);
        assert_eq!(sub.y_axis().max(), -1.0);
        assert_eq!(sub.x_axis().step(), 1.0);
        assert_eq!(sub.y_axis().step(), 0.5);
        assert_eq!((sub.width(), sub.height()), (3, 3));

        assert!(matches!(g.subgrid(1, 0, 2, 1), Err(GridError::InvalidSubgrid { .. })));
    }

    #[test]
    fn neighborhood_is_three_by_three() {
        let g = grid((0.0, 4.0, 1.0), (0.0, 4.0, 1.0));
        let n = g.neighborhood(&GridIndex::new(1, 3)).unwrap();
        assert_eq!((n.width(), n.height()), (3, 3));
        assert_eq!(n.value_at(0, 0).unwrap(), GridPoint::new(0.0, 2.0));
        assert_eq!(n.value_at(2, 2).unwrap(), GridPoint::new(2.0, 4.0));
        assert!(g.neighborhood(&GridIndex::new(0, 2)).is_err());
        assert!(g.neighborhood(&GridIndex::new(2, 4)).is_err());
    }

    #[test]
    fn extend_grows_the_touched_sides_only() {
        let g = grid((0.0, 4.0, 1.0), (0.0, 4.0, 1.0));

        let corner = GridPoint::new(4.0, 4.0);
        let grown = g.extend(&corner).unwrap();
        assert_eq!(grown.x_axis().min(), 0.0);
        assert_eq!(grown.x_axis().max(), 5.0);
        assert_eq!(grown.y_axis().min(), 0.0);
        assert_eq!(grown.y_axis().max(), 5.0);
        assert!(!grown.is_point_on_border(&corner));

        let left = GridPoint::new(0.0, 2.0);
        let grown = g.extend(&left).unwrap();
        assert_eq!(grown.x_axis().min(), -1.0);
        assert_eq!(grown.x_axis().max(), 4.0);
        assert_eq!(grown.y_axis().min(), 0.0);
        assert_eq!(grown.y_axis().max(), 4.0);
        assert!(!grown.is_point_on_border(&left));
    }

    #[test]
    fn extend_beyond_bound_makes_point_interior() {
        let g = grid((0.0, 4.0, 1.0), (0.0, 4.0, 1.0));
        let far = GridPoint::new(-2.2, 6.0);
        let grown = g.extend(&far).unwrap();
        assert_eq!(grown.x_axis().min(), -3.0);
        assert_eq!(grown.y_axis().max(), 7.0);
        assert!(grown.x_axis().min() < g.x_axis().min());
        assert!(grown.y_axis().max() > g.y_axis().max());
        assert!(!grown.is_point_on_border(&far));
    }

    #[test]
    fn extend_fails_for_interior_point() {
        let g = grid((0.0, 4.0, 1.0), (0.0, 4.0, 1.0));
        assert!(matches!(
            g.extend(&GridPoint::new(2.0, 2.0)),
            Err(GridError::ExtensionFailed { .. })
        ));
    }

    #[test]
    fn traversal_orders_differ_but_cover_the_same_points() {
        let g = grid((0.0, 2.0, 1.0), (0.0, 1.0, 1.0));
        let by_row = g.points(Traversal::ByRow);
        let by_column = g.points(Traversal::ByColumn);
        assert_eq!(by_row.len(), 6);
        assert_eq!(by_row[1], GridPoint::new(1.0, 0.0));
        assert_eq!(by_column[1], GridPoint::new(0.0, 1.0));
        for p in &by_row {
            assert!(by_column.contains(p));
        }
    }

    #[test]
    fn display_and_serde_round_trip() {
        let g = Grid::new(
            AxisSpec::new(-3.0, 3.0, 1.0).with_label("C"),
            AxisSpec::new(-3.0, 3.0, 1.0),
        )
        .unwrap();
        let text = g.to_string();
        assert!(text.contains("X: -3 - 3, Step 1 (C)"));
        assert!(text.contains("Dimensions (Rows x Columns): 7 x 7"));

        let json = serde_json::to_string(&g).unwrap();
        let back: Grid = serde_json::from_str(&json).unwrap();
        assert_eq!(g, back);

        let invalid = r#"{"x":{"min":0,"max":1,"step":0.3},"y":{"min":0,"max":1,"step":1}}"#;
        assert!(serde_json::from_str::<Grid>(invalid).is_err());
    }
}
