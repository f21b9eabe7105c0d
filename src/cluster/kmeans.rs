//! K-means clustering.
//!
//! Partitions data into k clusters by minimizing **within-cluster sum of squares**
//! (WCSS), using a configurable [`DistanceMetric`] for the assignment step.
//!
//! # The Objective
//!
//! ```text
//! WCSS = Σₖ Σᵢ∈Cₖ ||xᵢ - μₖ||²
//! ```
//!
//! [`KmeansFit::inertia`] always reports WCSS in squared Euclidean terms, even
//! when points were assigned under Manhattan or cosine distance.
//!
//! # Lloyd's Algorithm
//!
//! 1. Initialize k centroids
//! 2. **Assign**: each point → nearest centroid (ties → lowest index)
//! 3. **Update**: each centroid → mean of assigned points
//! 4. Repeat until every centroid moves less than `tol`, or `max_iter`
//!
//! An empty cluster keeps its previous centroid. It is neither reseeded nor
//! dropped, so the result always has exactly k centroids.
//!
//! # Initialization
//!
//! - [`Init::BoundingBox`] (default): every centroid coordinate drawn
//!   uniformly from that dimension's `[min, max]`. Cheap, but a centroid can
//!   land in empty space inside the box and stay empty.
//! - [`Init::PlusPlus`]: k-means++ (first centroid a random point, each next
//!   one sampled proportional to D(x)²). Used by the elbow sweep.
//! - [`Kmeans::fit_from`]: caller-supplied centroids.
//!
//! Randomness only ever comes from the seed or generator handed in, so a fixed
//! seed reproduces labels and centroids exactly.

use super::traits::Clustering;
use crate::dataset::{uniform_between, Dataset};
use crate::distance::{squared_euclidean, DistanceMetric};
use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView2, Axis};
use rand::prelude::*;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Centroid initialization strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Init {
    /// Uniform draws inside the per-dimension bounding box of the data.
    #[default]
    BoundingBox,
    /// k-means++ seeding.
    PlusPlus,
}

/// K-means clustering algorithm.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Kmeans {
    /// Number of clusters.
    k: usize,
    /// Assignment metric.
    metric: DistanceMetric,
    /// Maximum iterations.
    max_iter: usize,
    /// Convergence tolerance on per-centroid displacement.
    tol: f64,
    /// Initialization strategy.
    init: Init,
    /// Random seed.
    seed: Option<u64>,
}

impl Default for Kmeans {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Kmeans {
    /// Create a new K-means clusterer.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            metric: DistanceMetric::Euclidean,
            max_iter: 100,
            tol: 1e-4,
            init: Init::BoundingBox,
            seed: None,
        }
    }

    /// Set the assignment metric.
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set initialization strategy.
    pub fn with_init(mut self, init: Init) -> Self {
        self.init = init;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Assignment metric.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Run k-means, seeding from the configured seed or the thread RNG.
    pub fn fit(&self, data: &Dataset) -> Result<KmeansFit> {
        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };
        self.fit_with_rng(data, &mut rng)
    }

    /// Run k-means drawing initial centroids from `rng`. The configured seed is ignored.
    pub fn fit_with_rng<R: Rng>(&self, data: &Dataset, rng: &mut R) -> Result<KmeansFit> {
        self.validate(data)?;
        let centroids = match self.init {
            Init::BoundingBox => init_bounding_box(data, self.k, rng),
            Init::PlusPlus => init_plus_plus(data, self.k, rng),
        };
        Ok(self.run(data, centroids))
    }

    /// Run k-means from caller-supplied initial centroids (`k × dim`).
    pub fn fit_from(&self, data: &Dataset, initial: Array2<f64>) -> Result<KmeansFit> {
        self.validate(data)?;
        if initial.nrows() != self.k {
            return Err(Error::DimensionMismatch {
                expected: self.k,
                found: initial.nrows(),
            });
        }
        if initial.ncols() != data.dim() {
            return Err(Error::DimensionMismatch {
                expected: data.dim(),
                found: initial.ncols(),
            });
        }
        Ok(self.run(data, initial))
    }

    fn validate(&self, data: &Dataset) -> Result<()> {
        let n = data.n_points();
        if self.k == 0 || self.k > n {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: n,
            });
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "must be at least 1",
            });
        }
        if !(self.tol >= 0.0) || !self.tol.is_finite() {
            return Err(Error::InvalidParameter {
                name: "tol",
                message: "must be finite and non-negative",
            });
        }
        Ok(())
    }

    /// Lloyd iterations from `centroids`.
    ///
    /// When the tolerance test fires, the returned centroids are the ones the
    /// final update produced, not the ones that step started from. They differ
    /// by less than `tol`. The labels are from that final assignment, so they
    /// were computed against the starting centroids of the step.
    fn run(&self, data: &Dataset, centroids: Array2<f64>) -> KmeansFit {
        let mut state = KmeansState::new(centroids);
        let mut shifts = Vec::new();
        let mut converged = false;

        for iter in 0..self.max_iter {
            let (next, shift) = state.step(data, self.metric);
            state = next;
            shifts.push(shift);
            tracing::trace!(iteration = iter, max_shift = shift, "k-means step");

            if shift < self.tol {
                converged = true;
                break;
            }
        }

        let inertia = inertia(data, &state.labels, &state.centroids.view());
        if converged {
            tracing::debug!(
                k = self.k,
                metric = %self.metric,
                iterations = shifts.len(),
                inertia,
                "k-means converged"
            );
        } else {
            tracing::warn!(
                k = self.k,
                metric = %self.metric,
                max_iter = self.max_iter,
                last_shift = shifts.last().copied().unwrap_or(f64::NAN),
                "k-means hit max_iter before converging"
            );
        }

        KmeansFit {
            iterations: shifts.len(),
            labels: state.labels,
            centroids: state.centroids,
            converged,
            inertia,
            shifts,
        }
    }
}

impl Clustering for Kmeans {
    fn fit_predict(&self, data: &Dataset) -> Result<Vec<usize>> {
        Ok(self.fit(data)?.labels)
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}

/// Output of one k-means run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct KmeansFit {
    /// Cluster index per point, in dataset order.
    pub labels: Vec<usize>,
    /// Final centroids, one row per cluster.
    pub centroids: Array2<f64>,
    /// Iterations executed.
    pub iterations: usize,
    /// Whether the tolerance test fired (as opposed to hitting `max_iter`).
    pub converged: bool,
    /// Sum of squared Euclidean distances from points to their centroid.
    pub inertia: f64,
    /// Maximum centroid displacement of every iteration.
    pub shifts: Vec<f64>,
}

impl KmeansFit {
    /// Points per cluster, indexed by label. Empty clusters report 0.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        crate::metrics::cluster_sizes(&self.labels, self.centroids.nrows())
    }
}

/// Centroids and labels carried between iterations.
#[derive(Debug, Clone, PartialEq)]
pub struct KmeansState {
    /// Current centroids.
    pub centroids: Array2<f64>,
    /// Labels from the most recent assignment (empty before the first step).
    pub labels: Vec<usize>,
}

impl KmeansState {
    /// Starting state from initial centroids.
    pub fn new(centroids: Array2<f64>) -> Self {
        Self {
            centroids,
            labels: Vec::new(),
        }
    }

    /// One assign + update pass.
    ///
    /// Returns the next state and the largest Euclidean displacement of any
    /// centroid.
    pub fn step(&self, data: &Dataset, metric: DistanceMetric) -> (KmeansState, f64) {
        let labels = assign(data, &self.centroids.view(), metric);
        let centroids = update(data, &labels, &self.centroids.view());
        let shift = max_displacement(&self.centroids.view(), &centroids.view());
        (KmeansState { centroids, labels }, shift)
    }
}

/// Nearest-centroid label for every point.
pub fn assign(data: &Dataset, centroids: &ArrayView2<'_, f64>, metric: DistanceMetric) -> Vec<usize> {
    let points = data.points();

    #[cfg(feature = "parallel")]
    let labels = (0..points.nrows())
        .into_par_iter()
        .map(|i| metric.nearest(&points.row(i), centroids).unwrap_or(0))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let labels = points
        .rows()
        .into_iter()
        .map(|p| metric.nearest(&p, centroids).unwrap_or(0))
        .collect();

    labels
}

/// Mean of each cluster's points; empty clusters keep `previous`.
pub fn update(data: &Dataset, labels: &[usize], previous: &ArrayView2<'_, f64>) -> Array2<f64> {
    let k = previous.nrows();
    let mut sums = Array2::<f64>::zeros(previous.raw_dim());
    let mut counts = vec![0usize; k];

    for (point, &label) in data.points().rows().into_iter().zip(labels) {
        let mut row = sums.row_mut(label);
        row += &point;
        counts[label] += 1;
    }

    for (c, mut row) in sums.axis_iter_mut(Axis(0)).enumerate() {
        if counts[c] > 0 {
            row /= counts[c] as f64;
        } else {
            tracing::trace!(cluster = c, "empty cluster keeps previous centroid");
            row.assign(&previous.row(c));
        }
    }
    sums
}

/// Largest Euclidean distance between matching rows.
fn max_displacement(old: &ArrayView2<'_, f64>, new: &ArrayView2<'_, f64>) -> f64 {
    old.rows()
        .into_iter()
        .zip(new.rows())
        .map(|(a, b)| squared_euclidean(&a, &b).sqrt())
        .fold(0.0, f64::max)
}

/// Sum of squared Euclidean distances from each point to its centroid.
pub fn inertia(data: &Dataset, labels: &[usize], centroids: &ArrayView2<'_, f64>) -> f64 {
    data.points()
        .rows()
        .into_iter()
        .zip(labels)
        .map(|(p, &l)| squared_euclidean(&p, &centroids.row(l)))
        .sum()
}

/// k centroids drawn uniformly inside the data's bounding box.
pub fn init_bounding_box<R: Rng>(data: &Dataset, k: usize, rng: &mut R) -> Array2<f64> {
    let (lo, hi) = data.bounds();
    Array2::from_shape_fn((k, data.dim()), |(_, j)| uniform_between(rng, lo[j], hi[j]))
}

/// k-means++ seeding.
pub fn init_plus_plus<R: Rng>(data: &Dataset, k: usize, rng: &mut R) -> Array2<f64> {
    let n = data.n_points();
    let mut centroids = Array2::zeros((k, data.dim()));
    if k == 0 {
        return centroids;
    }

    // First centroid: random point
    let first = rng.random_range(0..n);
    centroids.row_mut(0).assign(&data.point(first));

    // Squared distance to the nearest chosen centroid, refreshed incrementally.
    let mut distances: Vec<f64> = data
        .points()
        .rows()
        .into_iter()
        .map(|p| squared_euclidean(&p, &centroids.row(0)))
        .collect();

    for i in 1..k {
        let total: f64 = distances.iter().sum();
        let selected = if total == 0.0 {
            rng.random_range(0..n)
        } else {
            let threshold = rng.random::<f64>() * total;
            let mut cumsum = 0.0;
            let mut selected = n - 1;
            for (j, &d) in distances.iter().enumerate() {
                cumsum += d;
                if cumsum >= threshold {
                    selected = j;
                    break;
                }
            }
            selected
        };

        centroids.row_mut(i).assign(&data.point(selected));
        for (d, p) in distances.iter_mut().zip(data.points().rows()) {
            *d = d.min(squared_euclidean(&p, &centroids.row(i)));
        }
    }

    centroids
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn two_blobs() -> Dataset {
        Dataset::from_rows(&[
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![10.0, 10.0],
            vec![10.0, 11.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_kmeans_basic() {
        let data = Dataset::from_rows(&[
            vec![0.0, 0.0],
            vec![0.1, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 10.1],
        ])
        .unwrap();

        let kmeans = Kmeans::new(2).with_init(Init::PlusPlus).with_seed(42);
        let labels = kmeans.fit_predict(&data).unwrap();

        // Points 0,1 should be in same cluster, points 2,3 in another
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
    }

    #[test]
    fn test_kmeans_explicit_init_converges_on_blobs() {
        let fit = Kmeans::new(2)
            .fit_from(&two_blobs(), array![[0.0, 0.5], [10.0, 10.5]])
            .unwrap();

        assert_eq!(fit.labels, vec![0, 0, 1, 1]);
        assert!(fit.converged);
        assert_eq!(fit.iterations, 1);
        assert!((fit.centroids[[0, 1]] - 0.5).abs() < 1e-12);
        assert!((fit.centroids[[1, 0]] - 10.0).abs() < 1e-12);
        assert!((fit.centroids[[1, 1]] - 10.5).abs() < 1e-12);
        assert!((fit.inertia - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_kmeans_displacement_history() {
        let fit = Kmeans::new(2)
            .fit_from(&two_blobs(), array![[1.0, 1.0], [9.0, 9.0]])
            .unwrap();

        assert_eq!(fit.labels, vec![0, 0, 1, 1]);
        assert_eq!(fit.shifts.len(), 2);
        assert!((fit.shifts[0] - 3.25f64.sqrt()).abs() < 1e-12);
        assert_eq!(fit.shifts[1], 0.0);
        assert!(fit.shifts.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn test_kmeans_empty_cluster_keeps_centroid() {
        let data = Dataset::from_rows(&[vec![0.0], vec![1.0], vec![2.0]]).unwrap();
        let fit = Kmeans::new(2)
            .fit_from(&data, array![[1.0], [100.0]])
            .unwrap();

        assert_eq!(fit.labels, vec![0, 0, 0]);
        assert_eq!(fit.centroids, array![[1.0], [100.0]]);
        assert_eq!(fit.cluster_sizes(), vec![3, 0]);
    }

    #[test]
    fn test_single_step_in_isolation() {
        let state = KmeansState::new(array![[1.0, 1.0], [9.0, 9.0]]);
        let (next, shift) = state.step(&two_blobs(), DistanceMetric::Manhattan);

        assert_eq!(next.labels, vec![0, 0, 1, 1]);
        assert_eq!(next.centroids, array![[0.0, 0.5], [10.0, 10.5]]);
        assert!((shift - 3.25f64.sqrt()).abs() < 1e-12);
        assert!(state.labels.is_empty());
    }

    #[test]
    fn test_assign_ties_go_to_lowest_index() {
        let data = Dataset::from_rows(&[vec![5.0]]).unwrap();
        let labels = assign(&data, &array![[4.0], [6.0]].view(), DistanceMetric::Euclidean);
        assert_eq!(labels, vec![0]);
    }

    #[test]
    fn test_cosine_groups_by_direction() {
        let data = Dataset::from_rows(&[
            vec![1.0, 0.1],
            vec![10.0, 0.5],
            vec![0.1, 1.0],
            vec![0.5, 10.0],
        ])
        .unwrap();
        let fit = Kmeans::new(2)
            .with_metric(DistanceMetric::Cosine)
            .fit_from(&data, array![[1.0, 0.0], [0.0, 1.0]])
            .unwrap();
        assert_eq!(fit.labels, vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_bounding_box_init_stays_in_bounds() {
        let data = Dataset::from_rows(&[vec![-1.0, 2.0], vec![3.0, 2.0], vec![0.0, 5.0]]).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let c = init_bounding_box(&data, 10, &mut rng);
        assert_eq!(c.dim(), (10, 2));
        for row in c.rows() {
            assert!((-1.0..=3.0).contains(&row[0]));
            assert!((2.0..=5.0).contains(&row[1]));
        }
    }

    #[test]
    fn test_bounding_box_init_with_overflowing_span() {
        let data = Dataset::from_rows(&[vec![-1e308], vec![1e308]]).unwrap();
        let fit = Kmeans::new(2).with_seed(1).fit(&data).unwrap();
        assert_eq!(fit.labels.len(), 2);
        assert!(fit
            .centroids
            .iter()
            .all(|c| c.is_finite() && (-1e308..=1e308).contains(c)));
    }

    #[test]
    fn test_converged_centroids_are_post_update() {
        let data = two_blobs();
        let start = array![[1.0, 1.0], [9.0, 9.0]];
        let tol = 0.5;
        let fit = Kmeans::new(2).with_tol(tol).fit_from(&data, start.clone()).unwrap();

        // First step moves by sqrt(3.25) > tol, the second by 0.
        let (first, _) = KmeansState::new(start).step(&data, DistanceMetric::Euclidean);
        assert!(fit.converged);
        assert_eq!(fit.iterations, 2);
        assert_eq!(fit.centroids, first.centroids);

        let (again, shift) =
            KmeansState::new(fit.centroids.clone()).step(&data, DistanceMetric::Euclidean);
        assert!(shift < tol);
        assert_eq!(again.labels, fit.labels);
    }

    #[test]
    fn test_plus_plus_picks_data_points() {
        let data = two_blobs();
        let mut rng = StdRng::seed_from_u64(1);
        let c = init_plus_plus(&data, 4, &mut rng);
        let rows = data.to_rows();
        for row in c.rows() {
            assert!(rows.contains(&row.to_vec()));
        }
    }

    #[test]
    fn test_kmeans_k_equals_n() {
        let data = Dataset::from_rows(&[vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();

        let kmeans = Kmeans::new(3).with_init(Init::PlusPlus).with_seed(42);
        let labels = kmeans.fit_predict(&data).unwrap();

        let unique: HashSet<_> = labels.iter().collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_kmeans_deterministic_with_seed() {
        let data = two_blobs();
        for metric in DistanceMetric::ALL {
            let a = Kmeans::new(2).with_metric(metric).with_seed(42).fit(&data).unwrap();
            let b = Kmeans::new(2).with_metric(metric).with_seed(42).fit(&data).unwrap();
            assert_eq!(a, b, "same seed should give same result for {metric}");
        }
    }

    #[test]
    fn test_max_iter_bounds_iterations() {
        let data = two_blobs();
        let fit = Kmeans::new(2)
            .with_max_iter(1)
            .with_tol(0.0)
            .fit_from(&data, array![[1.0, 1.0], [9.0, 9.0]])
            .unwrap();
        assert_eq!(fit.iterations, 1);
        assert!(!fit.converged);
        assert_eq!(fit.labels, vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_invalid_parameters() {
        let data = two_blobs();
        assert!(matches!(
            Kmeans::new(0).fit(&data),
            Err(Error::InvalidClusterCount { requested: 0, .. })
        ));
        assert!(matches!(
            Kmeans::new(5).fit(&data),
            Err(Error::InvalidClusterCount {
                requested: 5,
                n_items: 4
            })
        ));
        assert!(Kmeans::new(2).with_max_iter(0).fit(&data).is_err());
        assert!(Kmeans::new(2).with_tol(-1.0).fit(&data).is_err());
        assert!(Kmeans::new(2).with_tol(f64::NAN).fit(&data).is_err());
        assert!(Kmeans::new(2)
            .fit_from(&data, array![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]])
            .is_err());
        assert!(Kmeans::new(2).fit_from(&data, array![[0.0, 0.0]]).is_err());
    }

    fn dataset_strategy() -> impl Strategy<Value = Vec<Vec<f64>>> {
        (1usize..4).prop_flat_map(|d| {
            proptest::collection::vec(proptest::collection::vec(-100.0f64..100.0, d), 1..30)
        })
    }

    proptest! {
        #[test]
        fn fit_output_contract(
            rows in dataset_strategy(),
            k_frac in 0.0f64..1.0,
            metric_idx in 0usize..3,
            seed in any::<u64>(),
        ) {
            let data = Dataset::from_rows(&rows).unwrap();
            let n = data.n_points();
            let k = 1 + ((n - 1) as f64 * k_frac) as usize;
            let metric = DistanceMetric::ALL[metric_idx];

            let fit = Kmeans::new(k).with_metric(metric).with_seed(seed).fit(&data).unwrap();

            prop_assert_eq!(fit.labels.len(), n);
            prop_assert_eq!(fit.centroids.dim(), (k, data.dim()));
            prop_assert!(fit.labels.iter().all(|&l| l < k));
            prop_assert!(fit.inertia.is_finite() && fit.inertia >= 0.0);
            prop_assert!(fit.iterations >= 1 && fit.iterations <= 100);

            let again = Kmeans::new(k).with_metric(metric).with_seed(seed).fit(&data).unwrap();
            prop_assert_eq!(fit, again);
        }
    }
}
