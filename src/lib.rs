//! # clusterlab
//!
//! Clustering engine for interactive exploration of numeric datasets:
//! K-means with pluggable distance metrics, elbow-based selection of k, and
//! flat cuts of agglomerative linkage trees.
//!
//! Everything is synchronous and stateless across calls. Randomness enters
//! only through an explicit seed or generator, so a fixed seed reproduces a
//! run exactly.
//!
//! ```rust
//! use clusterlab::{Dataset, DistanceMetric, ElbowSelector, Kmeans};
//!
//! let data = Dataset::from_rows(&[
//!     vec![0.0, 0.0],
//!     vec![0.0, 1.0],
//!     vec![10.0, 10.0],
//!     vec![10.0, 11.0],
//! ])?;
//!
//! let metric: DistanceMetric = "Euclidean".parse()?;
//! let fit = Kmeans::new(2).with_metric(metric).with_seed(7).fit(&data)?;
//! assert_eq!(fit.labels.len(), 4);
//! assert_eq!(fit.centroids.nrows(), 2);
//!
//! let report = ElbowSelector::up_to(3).run(&data)?;
//! assert_eq!(report.curve.k_values(), vec![2, 3]);
//! # Ok::<(), clusterlab::Error>(())
//! ```
//!
//! ## Features
//!
//! - `std` (default): `std::error::Error` for [`Error`].
//! - `parallel`: rayon-parallel k-means assignment step.
//! - `serde`: `Serialize`/`Deserialize` on configuration types, `Serialize` on
//!   result types (enables ndarray's `serde` feature for centroid matrices).

pub mod cluster;
pub mod dataset;
pub mod distance;
/// Error types used across `clusterlab`.
pub mod error;
pub mod hierarchy;
pub mod metrics;


pub use cluster::{
    select_optimal_k, Clustering, DistortionCurve, ElbowReport, ElbowSelector,
    HierarchicalClustering, Init, Kmeans, KmeansFit, Linkage,
};
pub use dataset::{synthetic_blobs, BlobConfig, Dataset};
pub use distance::DistanceMetric;
pub use error::{Error, ErrorKind, Result};
pub use hierarchy::{cut_at, Dendrogram, LinkageCut};
