//! Scoring metrics, per-point performance records and their ordering.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::errors::GsError;
use crate::point::GridPoint;

/// Whether larger or smaller metric values are better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveDirection {
    Maximize,
    Minimize,
}

/// The metric used to rank evaluated points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Metric {
    /// Correlation coefficient
    #[default]
    #[serde(rename = "CC")]
    CorrelationCoefficient,
    Rmse,
    Rrse,
    Mae,
    Rae,
    /// (1 - |CC|) + RRSE + RAE
    #[serde(rename = "COMB")]
    Combined,
    #[serde(rename = "ACC")]
    Accuracy,
    #[serde(rename = "KAP")]
    Kappa,
    #[serde(rename = "WAUC")]
    WeightedAuc,
}

impl Metric {
    pub const ALL: [Metric; 9] = [
        Metric::CorrelationCoefficient,
        Metric::Rmse,
        Metric::Rrse,
        Metric::Mae,
        Metric::Rae,
        Metric::Combined,
        Metric::Accuracy,
        Metric::WeightedAuc,
        Metric::Kappa,
    ];

    pub fn direction(self) -> ObjectiveDirection {
        match self {
            Metric::CorrelationCoefficient | Metric::Accuracy | Metric::Kappa | Metric::WeightedAuc => {
                ObjectiveDirection::Maximize
            }
            Metric::Rmse | Metric::Rrse | Metric::Mae | Metric::Rae | Metric::Combined => {
                ObjectiveDirection::Minimize
            }
        }
    }

    /// Short tag, e.g. `"RMSE"`.
    pub fn tag(self) -> &'static str {
        match self {
            Metric::CorrelationCoefficient => "CC",
            Metric::Rmse => "RMSE",
            Metric::Rrse => "RRSE",
            Metric::Mae => "MAE",
            Metric::Rae => "RAE",
            Metric::Combined => "COMB",
            Metric::Accuracy => "ACC",
            Metric::Kappa => "KAP",
            Metric::WeightedAuc => "WAUC",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Metric::CorrelationCoefficient => "Correlation coefficient",
            Metric::Rmse => "Root mean squared error",
            Metric::Rrse => "Root relative squared error",
            Metric::Mae => "Mean absolute error",
            Metric::Rae => "Relative absolute error",
            Metric::Combined => "Combined = (1-abs(CC)) + RRSE + RAE",
            Metric::Accuracy => "Accuracy",
            Metric::Kappa => "Kappa",
            Metric::WeightedAuc => "Weighted AUC",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Metric {
    type Err = GsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.tag().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GsError::Config(format!("unknown metric '{s}'")))
    }
}

/// Raw metrics returned by an evaluator for one candidate.
///
/// Any metric the evaluator cannot compute stays NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub correlation_coefficient: f64,
    pub rmse: f64,
    pub rrse: f64,
    pub mae: f64,
    pub rae: f64,
    pub accuracy: f64,
    pub weighted_auc: f64,
    pub kappa: f64,
}

impl Default for Scores {
    fn default() -> Self {
        Self {
            correlation_coefficient: f64::NAN,
            rmse: f64::NAN,
            rrse: f64::NAN,
            mae: f64::NAN,
            rae: f64::NAN,
            accuracy: f64::NAN,
            weighted_auc: f64::NAN,
            kappa: f64::NAN,
        }
    }
}

impl Scores {
    /// Regression-style scores; classification metrics stay NaN.
    pub fn regression(cc: f64, rmse: f64, rrse: f64, mae: f64, rae: f64) -> Self {
        Self {
            correlation_coefficient: cc,
            rmse,
            rrse,
            mae,
            rae,
            ..Self::default()
        }
    }

    pub fn with_classification(mut self, accuracy: f64, weighted_auc: f64, kappa: f64) -> Self {
        self.accuracy = accuracy;
        self.weighted_auc = weighted_auc;
        self.kappa = kappa;
        self
    }

    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::CorrelationCoefficient => self.correlation_coefficient,
            Metric::Rmse => self.rmse,
            Metric::Rrse => self.rrse,
            Metric::Mae => self.mae,
            Metric::Rae => self.rae,
            Metric::Combined => (1.0 - self.correlation_coefficient.abs()) + self.rrse + self.rae,
            Metric::Accuracy => self.accuracy,
            Metric::Kappa => self.kappa,
            Metric::WeightedAuc => self.weighted_auc,
        }
    }
}

/// Performance of one evaluated grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub point: GridPoint,
    pub scores: Scores,
}

impl PerformanceRecord {
    pub fn new(point: GridPoint, scores: Scores) -> Self {
        Self { point, scores }
    }

    pub fn value(&self, metric: Metric) -> f64 {
        self.scores.value(metric)
    }

    /// One-metric rendering, e.g. `Performance ([1, 2]): 0.93 (CC)`.
    pub fn describe(&self, metric: Metric) -> String {
        format!("Performance ({}): {} ({})", self.point, self.value(metric), metric)
    }
}

impl fmt::Display for PerformanceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Performance ({}): ", self.point)?;
        for (i, metric) in Metric::ALL.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} ({})", self.value(*metric), metric)?;
        }
        Ok(())
    }
}

/// Total order over records for one metric: "better" compares greater.
///
/// NaN scores rank below every number. Equal scores fall back to the X and
/// then the Y coordinate; for lower-is-better metrics the whole comparison,
/// tie-break included, is inverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerformanceComparator {
    metric: Metric,
}

impl PerformanceComparator {
    pub fn new(metric: Metric) -> Self {
        Self { metric }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn compare(&self, a: &PerformanceRecord, b: &PerformanceRecord) -> Ordering {
        let (va, vb) = (a.value(self.metric), b.value(self.metric));

        match (va.is_nan(), vb.is_nan()) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }

        let natural = va
            .partial_cmp(&vb)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.point.x.total_cmp(&b.point.x))
            .then_with(|| a.point.y.total_cmp(&b.point.y));

        match self.metric.direction() {
            ObjectiveDirection::Maximize => natural,
            ObjectiveDirection::Minimize => natural.reverse(),
        }
    }

    /// Sort ascending, so the best record ends up last.
    pub fn sort(&self, records: &mut [PerformanceRecord]) {
        records.sort_by(|a, b| self.compare(a, b));
    }

    /// The best record, if any.
    pub fn best<'a>(&self, records: &'a [PerformanceRecord]) -> Option<&'a PerformanceRecord> {
        records.iter().max_by(|a, b| self.compare(a, b))
    }
}

/// True when every record scores the same under `metric` (NaN counts as equal to NaN).
pub fn is_uniform(records: &[PerformanceRecord], metric: Metric) -> bool {
    let mut values = records.iter().map(|r| r.value(metric));
    let Some(first) = values.next() else {
        return true;
    };
    values.all(|v| v == first || (v.is_nan() && first.is_nan()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cc_record(x: f64, y: f64, cc: f64) -> PerformanceRecord {
        PerformanceRecord::new(
            GridPoint::new(x, y),
            Scores::regression(cc, f64::NAN, f64::NAN, f64::NAN, f64::NAN),
        )
    }

    fn rmse_record(x: f64, y: f64, rmse: f64) -> PerformanceRecord {
        PerformanceRecord::new(
            GridPoint::new(x, y),
            Scores::regression(f64::NAN, rmse, f64::NAN, f64::NAN, f64::NAN),
        )
    }

    #[test]
    fn correlation_ranks_highest_last() {
        let mut records = vec![
            cc_record(0.0, 0.0, 0.1),
            cc_record(1.0, 0.0, 0.9),
            cc_record(2.0, 0.0, 0.5),
        ];
        let cmp = PerformanceComparator::new(Metric::CorrelationCoefficient);
        cmp.sort(&mut records);
        assert_eq!(records.last().unwrap().value(Metric::CorrelationCoefficient), 0.9);
        assert_eq!(records[0].value(Metric::CorrelationCoefficient), 0.1);
        assert_eq!(cmp.best(&records).unwrap().point, GridPoint::new(1.0, 0.0));
    }

    #[test]
    fn rmse_ranks_lowest_last() {
        let mut records = vec![
            rmse_record(0.0, 0.0, 0.2),
            rmse_record(1.0, 0.0, 0.05),
            rmse_record(2.0, 0.0, 0.3),
        ];
        let cmp = PerformanceComparator::new(Metric::Rmse);
        cmp.sort(&mut records);
        assert_eq!(records.last().unwrap().value(Metric::Rmse), 0.05);
        assert_eq!(records[0].value(Metric::Rmse), 0.3);
    }

    #[test]
    fn ties_are_broken_by_coordinates() {
        let a = cc_record(1.0, 5.0, 0.5);
        let b = cc_record(2.0, 0.0, 0.5);
        let c = cc_record(2.0, 1.0, 0.5);
        let cmp = PerformanceComparator::new(Metric::CorrelationCoefficient);
        assert_eq!(cmp.compare(&a, &b), Ordering::Less);
        assert_eq!(cmp.compare(&b, &c), Ordering::Less);
        assert_eq!(cmp.compare(&c, &c), Ordering::Equal);

        let mut forward = vec![a.clone(), b.clone(), c.clone()];
        let mut backward = vec![c, b, a];
        cmp.sort(&mut forward);
        cmp.sort(&mut backward);
        assert_eq!(forward, backward);
    }

    #[test]
    fn nan_scores_never_win() {
        let cmp = PerformanceComparator::new(Metric::Rmse);
        let nan = rmse_record(0.0, 0.0, f64::NAN);
        let bad = rmse_record(1.0, 0.0, 100.0);
        assert_eq!(cmp.compare(&nan, &bad), Ordering::Less);
        assert_eq!(cmp.best(&[nan, bad.clone()]).unwrap(), &bad);
    }

    #[test]
    fn combined_metric_is_derived() {
        let scores = Scores::regression(-0.8, 1.0, 0.5, 1.0, 0.25);
        let combined = scores.value(Metric::Combined);
        assert!((combined - (0.2 + 0.5 + 0.25)).abs() < 1e-12);
        assert_eq!(Metric::Combined.direction(), ObjectiveDirection::Minimize);
        assert!(scores.value(Metric::Accuracy).is_nan());
    }

    #[test]
    fn uniform_detection() {
        let same = vec![cc_record(0.0, 0.0, 0.5), cc_record(1.0, 0.0, 0.5)];
        assert!(is_uniform(&same, Metric::CorrelationCoefficient));
        let differ = vec![cc_record(0.0, 0.0, 0.5), cc_record(1.0, 0.0, 0.6)];
        assert!(!is_uniform(&differ, Metric::CorrelationCoefficient));
        assert!(is_uniform(&differ, Metric::Rmse));
    }

    #[test]
    fn metric_tags_parse_and_serialize() {
        assert_eq!("rmse".parse::<Metric>().unwrap(), Metric::Rmse);
        assert_eq!("KAP".parse::<Metric>().unwrap(), Metric::Kappa);
        assert!("F1".parse::<Metric>().is_err());
        assert_eq!(serde_json::to_string(&Metric::WeightedAuc).unwrap(), "\"WAUC\"");
        assert_eq!(serde_json::from_str::<Metric>("\"RRSE\"").unwrap(), Metric::Rrse);
        assert_eq!(serde_json::to_string(&Metric::CorrelationCoefficient).unwrap(), "\"CC\"");
    }

    #[test]
    fn record_rendering_lists_every_metric() {
        let record = cc_record(1.0, 2.0, 0.75);
        assert_eq!(
            record.describe(Metric::CorrelationCoefficient),
            "Performance ([1, 2]): 0.75 (CC)"
        );
        let full = record.to_string();
        for metric in Metric::ALL {
            assert!(full.contains(&format!("({metric})")));
        }
    }
}
