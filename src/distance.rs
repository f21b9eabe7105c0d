//! Point-to-set distance metrics used by k-means assignment.
//!
//! | Metric | Formula | Notes |
//! |--------|---------|-------|
//! | Euclidean | sqrt(Σ (aᵢ - bᵢ)²) | Default |
//! | Manhattan | Σ \|aᵢ - bᵢ\| | Robust to single-axis outliers |
//! | Cosine | 1 - a·b / ((‖a‖ + ε)(‖b‖ + ε)) | Angle only; ε = 1e-10 |
//!
//! Cosine distance adds ε to both norms, so a zero vector is at distance 1
//! from everything instead of producing NaN.

use core::fmt;
use core::str::FromStr;

use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::error::Error;

/// Added to vector norms in cosine distance.
pub const COSINE_EPSILON: f64 = 1e-10;

/// Distance metric for k-means assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DistanceMetric {
    /// Straight-line distance.
    #[default]
    Euclidean,
    /// Sum of absolute per-dimension differences.
    Manhattan,
    /// One minus cosine similarity.
    Cosine,
}

impl DistanceMetric {
    /// All metrics, in declaration order.
    pub const ALL: [DistanceMetric; 3] = [
        DistanceMetric::Euclidean,
        DistanceMetric::Manhattan,
        DistanceMetric::Cosine,
    ];

    /// Canonical name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            DistanceMetric::Euclidean => "Euclidean",
            DistanceMetric::Manhattan => "Manhattan",
            DistanceMetric::Cosine => "Cosine",
        }
    }

    /// Distance between two points of equal length.
    #[inline]
    pub fn distance(self, a: &ArrayView1<'_, f64>, b: &ArrayView1<'_, f64>) -> f64 {
        match self {
            DistanceMetric::Euclidean => euclidean(a, b),
            DistanceMetric::Manhattan => manhattan(a, b),
            DistanceMetric::Cosine => cosine(a, b),
        }
    }

    /// Distance from `point` to every row of `set`.
    pub fn point_to_set(self, point: &ArrayView1<'_, f64>, set: &ArrayView2<'_, f64>) -> Array1<f64> {
        set.rows()
            .into_iter()
            .map(|row| self.distance(point, &row))
            .collect()
    }

    /// Index of the nearest row of `set`, ties going to the lowest index.
    ///
    /// Returns `None` only when `set` has no rows.
    pub fn nearest(self, point: &ArrayView1<'_, f64>, set: &ArrayView2<'_, f64>) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, row) in set.rows().into_iter().enumerate() {
            let d = self.distance(point, &row);
            match best {
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((i, d)),
            }
        }
        best.map(|(i, _)| i)
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DistanceMetric {
    type Err = Error;

    /// Parse a metric name, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DistanceMetric::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownMetric(s.to_string()))
    }
}

fn euclidean(a: &ArrayView1<'_, f64>, b: &ArrayView1<'_, f64>) -> f64 {
    squared_euclidean(a, b).sqrt()
}

/// Squared Euclidean distance; the k-means objective is measured in this.
#[inline]
pub fn squared_euclidean(a: &ArrayView1<'_, f64>, b: &ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

fn manhattan(a: &ArrayView1<'_, f64>, b: &ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum()
}

fn cosine(a: &ArrayView1<'_, f64>, b: &ArrayView1<'_, f64>) -> f64 {
    let norm_a = a.dot(a).sqrt() + COSINE_EPSILON;
    let norm_b = b.dot(b).sqrt() + COSINE_EPSILON;
    1.0 - a.dot(b) / (norm_a * norm_b)
}
