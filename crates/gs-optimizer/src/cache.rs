//! Memoization of evaluated points across the passes of one search.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use gs_types::{GridPoint, PerformanceRecord, TOLERANCE};

/// Points are bucketed on a lattice of width [`TOLERANCE`]; two points that
/// are equal within tolerance always land in the same or an adjacent bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    folds: usize,
    x: i64,
    y: i64,
}

impl CacheKey {
    fn new(folds: usize, point: &GridPoint) -> Self {
        Self {
            folds,
            x: bucket(point.x),
            y: bucket(point.y),
        }
    }

    fn neighbours(self) -> impl Iterator<Item = CacheKey> {
        (-1..=1).flat_map(move |dx| {
            (-1..=1).map(move |dy| CacheKey {
                folds: self.folds,
                x: self.x + dx,
                y: self.y + dy,
            })
        })
    }
}

fn bucket(v: f64) -> i64 {
    (v / TOLERANCE).round() as i64
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// (fold count, point) → record. Append-only, never evicted.
#[derive(Debug, Default)]
pub struct PerformanceCache {
    entries: HashMap<CacheKey, Vec<PerformanceRecord>>,
    stats: CacheStats,
}

impl PerformanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&mut self, folds: usize, point: &GridPoint) -> Option<PerformanceRecord> {
        let found = self.find(folds, point).cloned();
        if found.is_some() {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        found
    }

    pub fn contains(&self, folds: usize, point: &GridPoint) -> bool {
        self.find(folds, point).is_some()
    }

    /// Store `record` unless an equal point is already cached for `folds`.
    pub fn store(&mut self, folds: usize, record: PerformanceRecord) {
        if self.contains(folds, &record.point) {
            return;
        }
        self.entries
            .entry(CacheKey::new(folds, &record.point))
            .or_default()
            .push(record);
        self.stats.stores += 1;
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn find(&self, folds: usize, point: &GridPoint) -> Option<&PerformanceRecord> {
        CacheKey::new(folds, point)
            .neighbours()
            .filter_map(|key| self.entries.get(&key))
            .flatten()
            .find(|record| record.point == *point)
    }
}
