//! Builds configured candidates from a read-only template.

use gs_types::{AxisKind, Candidate, GsResult, ParameterError, ParameterKind};

/// A parameter path whose kind has been resolved against the template.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParameter {
    pub path: String,
    pub kind: ParameterKind,
}

impl ResolvedParameter {
    fn resolve<C: Candidate>(template: &C, path: &str) -> Result<Self, ParameterError> {
        if path.trim().is_empty() {
            return Err(ParameterError::EmptyPath);
        }
        let kind = template
            .parameter_kind(path)
            .ok_or_else(|| ParameterError::UnknownPath { path: path.to_string() })?;
        Ok(Self {
            path: path.to_string(),
            kind,
        })
    }
}

/// Clones the template and sets the two tuned parameters on the copy.
///
/// Both paths are resolved once, at construction, so an unknown path fails
/// before any evaluation runs.
#[derive(Debug, Clone)]
pub struct CandidateBuilder<C> {
    template: C,
    x: ResolvedParameter,
    y: ResolvedParameter,
}

impl<C: Candidate> CandidateBuilder<C> {
    pub fn new(template: C, x_path: &str, y_path: &str) -> GsResult<Self> {
        let x = ResolvedParameter::resolve(&template, x_path)?;
        let y = ResolvedParameter::resolve(&template, y_path)?;
        Ok(Self { template, x, y })
    }

    pub fn template(&self) -> &C {
        &self.template
    }

    pub fn parameter(&self, axis: AxisKind) -> &ResolvedParameter {
        match axis {
            AxisKind::X => &self.x,
            AxisKind::Y => &self.y,
        }
    }

    /// A fresh candidate with the mapped `x` and `y` values applied.
    pub fn build(&self, x: f64, y: f64) -> GsResult<C> {
        let mut candidate = self.template.clone();
        candidate.set_parameter(&self.x.path, self.x.kind.coerce(x))?;
        candidate.set_parameter(&self.y.path, self.y.kind.coerce(y))?;
        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::SurfaceCandidate;
    use gs_types::GsError;

    #[test]
    fn resolves_kinds_once() {
        let builder = CandidateBuilder::new(SurfaceCandidate::default(), "C", "kernel.degree").unwrap();
        assert_eq!(builder.parameter(AxisKind::X).kind, ParameterKind::Float);
        assert_eq!(builder.parameter(AxisKind::Y).kind, ParameterKind::Integer);
    }

    #[test]
    fn build_coerces_and_leaves_template_untouched() {
        let builder = CandidateBuilder::new(SurfaceCandidate::default(), "kernel.degree", "normalize").unwrap();
        let candidate = builder.build(3.7, 0.0).unwrap();
        assert_eq!(candidate.degree, 3);
        assert!(!candidate.normalize);

        let candidate = builder.build(-2.2, 0.25).unwrap();
        assert_eq!(candidate.degree, -2);
        assert!(candidate.normalize);

        assert_eq!(builder.template().degree, SurfaceCandidate::default().degree);
        assert_eq!(builder.template().normalize, SurfaceCandidate::default().normalize);
    }

    #[test]
    fn invalid_paths_fail_fast() {
        let err = CandidateBuilder::new(SurfaceCandidate::default(), "C", "kernel.sigma").unwrap_err();
        assert!(matches!(err, GsError::Parameter(ParameterError::UnknownPath { .. })));
        assert!(err.is_configuration());

        let err = CandidateBuilder::new(SurfaceCandidate::default(), "", "C").unwrap_err();
        assert!(matches!(err, GsError::Parameter(ParameterError::EmptyPath)));
    }
}
