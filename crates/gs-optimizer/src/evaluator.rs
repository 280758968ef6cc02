//! Seams to the modeling library: scoring a candidate and providing data.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;

use gs_types::{validation_error, GsResult, Scores};

/// Scores and trains candidates of type `C` on datasets of type `D`.
///
/// `evaluate` must be deterministic for a given seed and fold count; it is
/// called concurrently from worker threads.
pub trait Evaluator<C, D>: Send + Sync + 'static {
    /// Cross-validate `candidate` on `data` with `folds` folds.
    fn evaluate(&self, candidate: &C, data: &D, folds: usize, seed: u64) -> GsResult<Scores>;

    /// Train the final candidate on the full dataset.
    fn train(&self, candidate: &mut C, data: &D) -> GsResult<()>;
}

/// Training data that can be subsampled for the low-fidelity pass.
pub trait Dataset: Send + Sync + Sized + 'static {
    fn num_instances(&self) -> usize;

    /// Draw `percent` of the instances without replacement.
    ///
    /// The subsample should be representative of the whole dataset.
    /// Implementations over labelled data are responsible for keeping the
    /// class distribution, for example through [`stratified_resample`]; the
    /// plain `Vec<T>` impl has no labels and samples uniformly.
    fn resample(&self, percent: f64, seed: u64) -> GsResult<Self>;
}

fn check_percent(percent: f64) -> GsResult<()> {
    if !(percent > 0.0 && percent <= 100.0) {
        return Err(validation_error!("sample size must be in (0, 100], got {}", percent));
    }
    Ok(())
}

/// `round(len * percent / 100)` indices below `len`, at least one.
fn draw_indices(rng: &mut StdRng, len: usize, percent: f64) -> Vec<usize> {
    let amount = ((len as f64 * percent / 100.0).round() as usize).clamp(1, len);
    rand::seq::index::sample(rng, len, amount).into_vec()
}

/// Draw `percent` of every stratum of `data`, the strata being the distinct
/// values of `key`.
///
/// Every non-empty stratum keeps at least one instance, and the original
/// instance order is kept.
pub fn stratified_resample<T, K, F>(data: &[T], percent: f64, seed: u64, key: F) -> GsResult<Vec<T>>
where
    T: Clone,
    K: Ord,
    F: Fn(&T) -> K,
{
    check_percent(percent)?;

    let mut strata: BTreeMap<K, Vec<usize>> = BTreeMap::new();
    for (i, item) in data.iter().enumerate() {
        strata.entry(key(item)).or_default().push(i);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut indices = Vec::new();
    for members in strata.values() {
        indices.extend(draw_indices(&mut rng, members.len(), percent).into_iter().map(|i| members[i]));
    }
    indices.sort_unstable();

    Ok(indices.into_iter().map(|i| data[i].clone()).collect())
}

impl<T> Dataset for Vec<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn num_instances(&self) -> usize {
        self.len()
    }

    /// Keeps the original instance order. At least one instance is kept when
    /// the input is not empty.
    fn resample(&self, percent: f64, seed: u64) -> GsResult<Self> {
        check_percent(percent)?;
        if self.is_empty() {
            return Ok(Vec::new());
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut indices = draw_indices(&mut rng, self.len(), percent);
        indices.sort_unstable();

        Ok(indices.into_iter().map(|i| self[i].clone()).collect())
    }
}
