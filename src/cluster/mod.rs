//! Clustering algorithms.
//!
//! ## K-means
//!
//! Assign each point to the nearest centroid under a [`DistanceMetric`],
//! move each centroid to the mean of its points, repeat.
//!
//! **Objective**: minimize within-cluster sum of squares:
//!
//! ```text
//! J = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! **Assumptions**: roughly spherical clusters of similar size, and a known k.
//! When k is not known, sweep it with [`ElbowSelector`].
//!
//! ## Hierarchical (Agglomerative) Clustering
//!
//! Bottom-up: start with each point as its own cluster, repeatedly merge
//! the two closest clusters until one remains. The merge history forms a
//! **dendrogram** you can cut at any height to get k clusters.
//!
//! ## Usage
//!
//! ```rust
//! use clusterlab::cluster::{ElbowSelector, Init, Kmeans};
//! use clusterlab::{Dataset, DistanceMetric};
//!
//! let data = Dataset::from_rows(&[
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//! ])
//! .unwrap();
//!
//! let fit = Kmeans::new(2)
//!     .with_metric(DistanceMetric::Manhattan)
//!     .with_init(Init::PlusPlus)
//!     .with_seed(42)
//!     .fit(&data)
//!     .unwrap();
//! assert_eq!(fit.labels[0], fit.labels[1]);
//! assert_ne!(fit.labels[0], fit.labels[2]);
//!
//! let k = ElbowSelector::new(2..4).run(&data).unwrap().optimal_k;
//! assert!((2..4).contains(&k));
//! ```
//!
//! [`DistanceMetric`]: crate::distance::DistanceMetric

pub mod elbow;
mod hierarchical;
pub mod kmeans;
mod traits;

pub use elbow::{select_optimal_k, DistortionCurve, ElbowPoint, ElbowReport, ElbowSelector};
pub use hierarchical::{HierarchicalClustering, Linkage};
pub use kmeans::{Init, Kmeans, KmeansFit, KmeansState};
pub use traits::Clustering;
