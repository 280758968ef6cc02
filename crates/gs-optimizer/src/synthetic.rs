//! Synthetic modeling backend.
//!
//! [`SurfaceCandidate`] stands in for a kernel model with float, integer and
//! boolean settings; [`QuadraticSurface`] scores it with a smooth peak in
//! log10 space plus optional seeded noise that shrinks with the fold count.
//! Used by the demo binary and by the end-to-end tests.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use gs_types::{Candidate, GsError, GsResult, ParameterError, ParameterKind, ParameterValue, Scores};

use crate::evaluator::{Dataset, Evaluator};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceCandidate {
    pub c: f64,
    pub gamma: f64,
    pub degree: i64,
    pub normalize: bool,
    /// Number of instances the candidate was last trained on.
    pub trained_on: Option<usize>,
}

impl Default for SurfaceCandidate {
    fn default() -> Self {
        Self {
            c: 1.0,
            gamma: 0.01,
            degree: 1,
            normalize: true,
            trained_on: None,
        }
    }
}

impl Candidate for SurfaceCandidate {
    fn parameter_kind(&self, path: &str) -> Option<ParameterKind> {
        match path {
            "C" | "kernel.gamma" => Some(ParameterKind::Float),
            "kernel.degree" => Some(ParameterKind::Integer),
            "normalize" => Some(ParameterKind::Boolean),
            _ => None,
        }
    }

    fn set_parameter(&mut self, path: &str, value: ParameterValue) -> GsResult<()> {
        match (path, value) {
            ("C", ParameterValue::Float(v)) => self.c = v,
            ("kernel.gamma", ParameterValue::Float(v)) => self.gamma = v,
            ("kernel.degree", ParameterValue::Integer(v)) => self.degree = v,
            ("normalize", ParameterValue::Boolean(v)) => self.normalize = v,
            (path, value) => {
                let expected = self
                    .parameter_kind(path)
                    .ok_or_else(|| ParameterError::UnknownPath { path: path.to_string() })?;
                return Err(value.mismatch(path, expected).into());
            }
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!(
            "SurfaceCandidate -C {} -G {} -D {}{}",
            self.c,
            self.gamma,
            self.degree,
            if self.normalize { " -N" } else { "" }
        )
    }
}

/// One recorded `evaluate` call.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationCall {
    pub c: f64,
    pub gamma: f64,
    pub degree: i64,
    pub normalize: bool,
    pub folds: usize,
    pub seed: u64,
}

/// Scores candidates by their distance to an optimum `(log10 C, log10 gamma)`.
#[derive(Debug)]
pub struct QuadraticSurface {
    optimum_x: f64,
    optimum_y: f64,
    noise: f64,
    calls: Mutex<Vec<EvaluationCall>>,
}

impl QuadraticSurface {
    pub fn new(optimum_x: f64, optimum_y: f64) -> Self {
        Self {
            optimum_x,
            optimum_y,
            noise: 0.0,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Peak-to-peak noise at 1 fold; divided by sqrt(folds).
    pub fn with_noise(mut self, amplitude: f64) -> Self {
        self.noise = amplitude;
        self
    }

    pub fn calls(&self) -> Vec<EvaluationCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn noise_term(&self, candidate: &SurfaceCandidate, folds: usize, seed: u64) -> f64 {
        if self.noise == 0.0 {
            return 0.0;
        }
        let mixed = seed
            ^ candidate.c.to_bits().rotate_left(17)
            ^ candidate.gamma.to_bits().rotate_left(41)
            ^ (folds as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        let mut rng = StdRng::seed_from_u64(mixed);
        self.noise * rng.random_range(-0.5..0.5) / (folds as f64).sqrt()
    }
}

impl<D: Dataset> Evaluator<SurfaceCandidate, D> for QuadraticSurface {
    fn evaluate(&self, candidate: &SurfaceCandidate, data: &D, folds: usize, seed: u64) -> GsResult<Scores> {
        self.calls.lock().push(EvaluationCall {
            c: candidate.c,
            gamma: candidate.gamma,
            degree: candidate.degree,
            normalize: candidate.normalize,
            folds,
            seed,
        });

        if data.num_instances() < folds {
            return Err(GsError::Model(format!(
                "cannot run {}-fold cross-validation on {} instances",
                folds,
                data.num_instances()
            )));
        }
        if candidate.c <= 0.0 || candidate.gamma <= 0.0 {
            return Err(GsError::Model(format!(
                "C and gamma must be positive (C {}, gamma {})",
                candidate.c, candidate.gamma
            )));
        }

        let dx = candidate.c.log10() - self.optimum_x;
        let dy = candidate.gamma.log10() - self.optimum_y;
        let mut cc = 1.0 / (1.0 + dx * dx + dy * dy);
        cc -= 0.01 * (candidate.degree - 1).abs() as f64;
        if !candidate.normalize {
            cc -= 0.05;
        }
        cc += self.noise_term(candidate, folds, seed);

        let error = (1.0 - cc).max(0.0);
        Ok(Scores::regression(cc, error, 100.0 * error, 0.8 * error, 80.0 * error))
    }

    fn train(&self, candidate: &mut SurfaceCandidate, data: &D) -> GsResult<()> {
        if data.num_instances() == 0 {
            return Err(GsError::Model("cannot train on an empty dataset".to_string()));
        }
        candidate.trained_on = Some(data.num_instances());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gs_types::Metric;

    fn data() -> Vec<u32> {
        (0..100).collect()
    }

    #[test]
    fn candidate_parameters() {
        let mut candidate = SurfaceCandidate::default();
        candidate.set_parameter("C", ParameterValue::Float(8.0)).unwrap();
        candidate.set_parameter("kernel.degree", ParameterValue::Integer(3)).unwrap();
        candidate.set_parameter("normalize", ParameterValue::Boolean(false)).unwrap();
        assert_eq!(candidate.describe(), "SurfaceCandidate -C 8 -G 0.01 -D 3");

        let err = candidate
            .set_parameter("kernel.gamma", ParameterValue::Integer(1))
            .unwrap_err();
        assert!(matches!(err, GsError::Parameter(ParameterError::KindMismatch { .. })));
        let err = candidate.set_parameter("seed", ParameterValue::Integer(1)).unwrap_err();
        assert!(matches!(err, GsError::Parameter(ParameterError::UnknownPath { .. })));
    }

    #[test]
    fn surface_peaks_at_optimum() {
        let surface = QuadraticSurface::new(1.0, -2.0);
        let at = |c: f64, gamma: f64| {
            let candidate = SurfaceCandidate {
                c,
                gamma,
                ..SurfaceCandidate::default()
            };
            surface.evaluate(&candidate, &data(), 10, 1).unwrap()
        };

        let peak = at(10.0, 0.01);
        assert!((peak.value(Metric::CorrelationCoefficient) - 1.0).abs() < 1e-12);
        assert!(peak.value(Metric::Rmse).abs() < 1e-12);
        assert!(at(1.0, 0.01).value(Metric::CorrelationCoefficient) < 1.0);
        assert!(peak.value(Metric::Accuracy).is_nan());
        assert_eq!(surface.call_count(), 2);
    }

    #[test]
    fn noise_is_seeded_and_shrinks_with_folds() {
        let surface = QuadraticSurface::new(0.0, 0.0).with_noise(0.2);
        let candidate = SurfaceCandidate::default();
        let score = |folds, seed| {
            Evaluator::<_, Vec<u32>>::evaluate(&surface, &candidate, &data(), folds, seed)
                .unwrap()
                .value(Metric::CorrelationCoefficient)
        };
        let clean = 1.0 / (1.0 + 4.0);

        assert_eq!(score(2, 7), score(2, 7));
        assert!((score(2, 7) - clean).abs() <= 0.1 / 2f64.sqrt());
        assert!((score(10, 7) - clean).abs() <= 0.1 / 10f64.sqrt());
    }

    #[test]
    fn invalid_settings_fail() {
        let surface = QuadraticSurface::new(0.0, 0.0);
        let candidate = SurfaceCandidate {
            c: 0.0,
            ..SurfaceCandidate::default()
        };
        assert!(matches!(surface.evaluate(&candidate, &data(), 2, 1), Err(GsError::Model(_))));
        assert!(matches!(
            surface.evaluate(&SurfaceCandidate::default(), &vec![1u32], 2, 1),
            Err(GsError::Model(_))
        ));

        let mut candidate = SurfaceCandidate::default();
        surface.train(&mut candidate, &data()).unwrap();
        assert_eq!(candidate.trained_on, Some(100));
    }
}
