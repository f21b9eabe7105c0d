//! Validated numeric datasets.
//!
//! A [`Dataset`] is what the ingestion side hands to the engine: a
//! rectangular, finite `f64` matrix with at least one row and one column,
//! optionally carrying one name per column.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::prelude::*;
use rand_distr::StandardNormal;

use crate::error::{Error, Result};

/// Rectangular matrix of points, one row per point.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    points: Array2<f64>,
    feature_names: Option<Vec<String>>,
}

impl Dataset {
    /// Build from row vectors.
    ///
    /// Fails on zero rows, zero columns, ragged rows, or non-finite values.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(Error::EmptyInput);
        };
        let d = first.len();

        let mut flat: Vec<f64> = Vec::with_capacity(rows.len() * d);
        for row in rows {
            if row.len() != d {
                return Err(Error::DimensionMismatch {
                    expected: d,
                    found: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }

        let points = Array2::from_shape_vec((rows.len(), d), flat).map_err(|_| {
            Error::InvalidParameter {
                name: "rows",
                message: "rows do not form a matrix",
            }
        })?;
        Self::from_array(points)
    }

    /// Build from an existing matrix.
    pub fn from_array(points: Array2<f64>) -> Result<Self> {
        if points.nrows() == 0 {
            return Err(Error::EmptyInput);
        }
        if points.ncols() == 0 {
            return Err(Error::InvalidParameter {
                name: "dataset",
                message: "points must have at least one dimension",
            });
        }
        if let Some(((row, col), _)) = points.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(Error::NonFinite { row, col });
        }
        Ok(Self {
            points,
            feature_names: None,
        })
    }

    /// Attach column names. Their count must match the dimensionality.
    pub fn with_feature_names<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.len() != self.dim() {
            return Err(Error::DimensionMismatch {
                expected: self.dim(),
                found: names.len(),
            });
        }
        self.feature_names = Some(names);
        Ok(self)
    }

    /// Keep only the named columns, in the order given.
    pub fn select_features(&self, features: &[&str]) -> Result<Self> {
        if features.is_empty() {
            return Err(Error::InvalidParameter {
                name: "features",
                message: "at least one feature must be selected",
            });
        }
        let names = self.feature_names.as_deref().unwrap_or(&[]);
        let mut columns = Vec::with_capacity(features.len());
        for &feature in features {
            let col = names
                .iter()
                .position(|n| n == feature)
                .ok_or_else(|| Error::UnknownFeature(feature.to_string()))?;
            columns.push(col);
        }

        Ok(Self {
            points: self.points.select(Axis(1), &columns),
            feature_names: Some(features.iter().map(|f| f.to_string()).collect()),
        })
    }

    /// Number of points.
    pub fn n_points(&self) -> usize {
        self.points.nrows()
    }

    /// Dimensionality of every point.
    pub fn dim(&self) -> usize {
        self.points.ncols()
    }

    /// Column names, if attached.
    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    /// The underlying matrix.
    pub fn points(&self) -> ArrayView2<'_, f64> {
        self.points.view()
    }

    /// Row `i`.
    pub fn point(&self, i: usize) -> ArrayView1<'_, f64> {
        self.points.row(i)
    }

    /// Per-dimension minimum and maximum.
    pub fn bounds(&self) -> (Array1<f64>, Array1<f64>) {
        let lo = self
            .points
            .fold_axis(Axis(0), f64::INFINITY, |acc, &v| acc.min(v));
        let hi = self
            .points
            .fold_axis(Axis(0), f64::NEG_INFINITY, |acc, &v| acc.max(v));
        (lo, hi)
    }

    /// Copy out as row vectors.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.points.rows().into_iter().map(|r| r.to_vec()).collect()
    }
}

/// Parameters for [`synthetic_blobs`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlobConfig {
    /// Total points requested; each blob gets `n_samples / n_centers`.
    pub n_samples: usize,
    /// Number of blobs.
    pub n_centers: usize,
    /// Dimensionality.
    pub dim: usize,
    /// Centres are drawn uniformly from `[lo, hi]` in every dimension.
    pub center_box: (f64, f64),
    /// Standard deviation of the per-point Gaussian noise.
    pub std_dev: f64,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            n_samples: 150,
            n_centers: 4,
            dim: 2,
            center_box: (-10.0, 10.0),
            std_dev: 1.0,
        }
    }
}

/// Generate Gaussian blobs around uniformly placed centres.
///
/// Points are emitted blob by blob, so the true label of row `i` is
/// `i / (n_samples / n_centers)`. Column names are `"Feature 1"`, `"Feature 2"`, ...
pub fn synthetic_blobs(config: &BlobConfig, rng: &mut impl Rng) -> Result<Dataset> {
    if config.n_centers == 0 {
        return Err(Error::InvalidParameter {
            name: "n_centers",
            message: "must be at least 1",
        });
    }
    let per_blob = config.n_samples / config.n_centers;
    if per_blob == 0 {
        return Err(Error::InvalidClusterCount {
            requested: config.n_centers,
            n_items: config.n_samples,
        });
    }
    let (lo, hi) = config.center_box;
    if !(lo < hi) || !lo.is_finite() || !hi.is_finite() || !(config.std_dev >= 0.0) {
        return Err(Error::InvalidParameter {
            name: "blob_config",
            message: "center_box must be finite with lo < hi and std_dev must be >= 0",
        });
    }

    let centers: Vec<Vec<f64>> = (0..config.n_centers)
        .map(|_| (0..config.dim).map(|_| uniform_between(rng, lo, hi)).collect())
        .collect();

    let mut rows: Vec<Vec<f64>> = Vec::with_capacity(per_blob * config.n_centers);
    for center in &centers {
        for _ in 0..per_blob {
            rows.push(
                center
                    .iter()
                    .map(|c| c + config.std_dev * rng.sample::<f64, _>(StandardNormal))
                    .collect(),
            );
        }
    }

    Dataset::from_rows(&rows)?.with_feature_names((1..=config.dim).map(|i| format!("Feature {i}")))
}

/// Uniform draw from `[lo, hi]` for finite bounds.
///
/// Interpolates as `lo + u*hi - u*lo`, so a span `hi - lo` that overflows
/// `f64` still yields a finite value.
pub(crate) fn uniform_between<R: Rng>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    let u: f64 = rng.random();
    (lo + u * hi - u * lo).clamp(lo, hi)
}
