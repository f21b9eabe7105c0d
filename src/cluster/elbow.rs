//! Elbow-method selection of the cluster count.
//!
//! Sweep k over a range, record k-means inertia for each k, then pick the k
//! where the curve bends hardest:
//!
//! ```text
//! slope[i]  = (D[i+1] - D[i]) / (D[i] + 1e-10)     relative drop
//! accel[i]  = slope[i+1] - slope[i]                how fast the drop flattens
//! k*        = k[argmax(accel) + 1]
//! ```
//!
//! This is a heuristic, not a guarantee. Short curves fall back in a fixed
//! order:
//!
//! | Curve length | Selected k |
//! |--------------|------------|
//! | 1 | the only k |
//! | 2 | the second k (no acceleration is computable) |
//! | ≥ 3, non-finite acceleration | the second k |
//!
//! k = 1 never enters the sweep: a single cluster gives the curve no elbow to
//! find, so the lower bound is raised to 2.

use core::ops::{Bound, RangeBounds};

use rand::prelude::*;

use super::kmeans::{Init, Kmeans};
use crate::dataset::Dataset;
use crate::error::{Error, Result};

/// Ceiling the interactive layer applies to the sweep.
pub const MAX_K_CAP: usize = 10;

/// Smallest k the sweep evaluates.
pub const MIN_K: usize = 2;

const SLOPE_EPSILON: f64 = 1e-10;

/// One `(k, distortion)` record.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ElbowPoint {
    /// Cluster count.
    pub k: usize,
    /// Inertia at that k.
    pub distortion: f64,
}

/// Distortion per k, with k strictly consecutive.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DistortionCurve {
    points: Vec<ElbowPoint>,
}

impl DistortionCurve {
    /// Build from `(k, distortion)` pairs.
    ///
    /// The sequence must be non-empty and its k values must increase by
    /// exactly one per record.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (usize, f64)>) -> Result<Self> {
        let points: Vec<ElbowPoint> = pairs
            .into_iter()
            .map(|(k, distortion)| ElbowPoint { k, distortion })
            .collect();
        if points.is_empty() {
            return Err(Error::EmptyInput);
        }
        if points.windows(2).any(|w| w[1].k != w[0].k + 1) {
            return Err(Error::InvalidParameter {
                name: "curve",
                message: "k values must be consecutive and increasing",
            });
        }
        Ok(Self { points })
    }

    /// Records in k order.
    pub fn points(&self) -> &[ElbowPoint] {
        &self.points
    }

    /// k values in order.
    pub fn k_values(&self) -> Vec<usize> {
        self.points.iter().map(|p| p.k).collect()
    }

    /// Distortions in k order.
    pub fn distortions(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.distortion).collect()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Distortion recorded for `k`.
    pub fn distortion_at(&self, k: usize) -> Option<f64> {
        let first = self.lowest_k();
        k.checked_sub(first)
            .and_then(|i| self.points.get(i))
            .map(|p| p.distortion)
    }

    fn lowest_k(&self) -> usize {
        // Non-empty by construction.
        self.points[0].k
    }

    /// Elbow-selected k. See [`select_optimal_k`].
    pub fn optimal_k(&self) -> usize {
        select_optimal_k(self)
    }
}

/// Pick k from a distortion curve with the relative-slope acceleration rule.
pub fn select_optimal_k(curve: &DistortionCurve) -> usize {
    let points = curve.points();
    let lowest = curve.lowest_k();
    if points.len() < 2 {
        return lowest;
    }
    let fallback = points[1].k;

    let slopes: Vec<f64> = points
        .windows(2)
        .map(|w| (w[1].distortion - w[0].distortion) / (w[0].distortion + SLOPE_EPSILON))
        .collect();
    let accel: Vec<f64> = slopes.windows(2).map(|w| w[1] - w[0]).collect();

    if accel.is_empty() || accel.iter().any(|a| !a.is_finite()) {
        return fallback;
    }

    // First maximum wins.
    let mut best = 0;
    for (i, &a) in accel.iter().enumerate() {
        if a > accel[best] {
            best = i;
        }
    }

    points.get(best + 1).map_or(lowest, |p| p.k)
}

/// Curve plus the k chosen from it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ElbowReport {
    /// Distortion per k.
    pub curve: DistortionCurve,
    /// Selected k.
    pub optimal_k: usize,
}

/// Sweeps k-means over a range of k.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElbowSelector {
    /// Lowest k, already floored to [`MIN_K`].
    k_min: usize,
    /// Highest k, inclusive. `None` means up to the number of points.
    k_max: Option<usize>,
    /// Restarts per k; the lowest inertia wins.
    n_init: usize,
    /// Iteration cap per restart.
    max_iter: usize,
    /// Seed for every k's restarts.
    seed: u64,
}

impl ElbowSelector {
    /// Sweep over `range`, e.g. `2..11` or `2..=10`. Lower bounds below 2 are raised to 2.
    pub fn new(range: impl RangeBounds<usize>) -> Self {
        let k_min = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => MIN_K,
        }
        .max(MIN_K);
        // An end of `..0` or `..1` still yields an empty range after flooring.
        let k_max = match range.end_bound() {
            Bound::Included(&e) => Some(e),
            Bound::Excluded(&e) => Some(e.saturating_sub(1)),
            Bound::Unbounded => None,
        };
        Self {
            k_min,
            k_max,
            n_init: 10,
            max_iter: 300,
            seed: 42,
        }
    }

    /// `2..=min(max_k, 10)`, the sweep offered to interactive callers.
    pub fn up_to(max_k: usize) -> Self {
        Self::new(MIN_K..=max_k.min(MAX_K_CAP))
    }

    /// Set restarts per k.
    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    /// Set the iteration cap per restart.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// The k values this selector sweeps for `data`.
    pub fn k_range(&self, data: &Dataset) -> Result<core::ops::RangeInclusive<usize>> {
        let k_max = self.k_max.unwrap_or(data.n_points());
        if k_max < self.k_min {
            return Err(Error::InvalidParameter {
                name: "k_range",
                message: "range contains no k >= 2",
            });
        }
        Ok(self.k_min..=k_max)
    }

    /// Inertia for every k in range.
    pub fn evaluate(&self, data: &Dataset) -> Result<DistortionCurve> {
        if self.n_init == 0 {
            return Err(Error::InvalidParameter {
                name: "n_init",
                message: "must be at least 1",
            });
        }
        let ks = self.k_range(data)?;

        // The upper bound may far exceed the point count; the sweep stops at the
        // first k that k-means rejects.
        let mut pairs = Vec::new();
        for k in ks {
            let distortion = self.best_inertia(data, k)?;
            tracing::debug!(k, distortion, "elbow sweep");
            pairs.push((k, distortion));
        }
        DistortionCurve::from_pairs(pairs)
    }

    /// Evaluate, then select.
    pub fn run(&self, data: &Dataset) -> Result<ElbowReport> {
        let curve = self.evaluate(data)?;
        let optimal_k = select_optimal_k(&curve);
        tracing::debug!(optimal_k, n_k = curve.len(), "elbow selection");
        Ok(ElbowReport { curve, optimal_k })
    }

    fn best_inertia(&self, data: &Dataset, k: usize) -> Result<f64> {
        let kmeans = Kmeans::new(k)
            .with_init(Init::PlusPlus)
            .with_max_iter(self.max_iter);
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut best = f64::INFINITY;
        for _ in 0..self.n_init {
            let fit = kmeans.fit_with_rng(data, &mut rng)?;
            best = best.min(fit.inertia);
        }
        Ok(best)
    }
}
