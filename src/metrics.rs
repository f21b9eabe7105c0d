//! Per-run clustering statistics.
//!
//! What the request layer reports next to labels: how many points landed in
//! each cluster, and the k-means objective.
//!
//! ```rust
//! use clusterlab::metrics::{cluster_sizes, label_counts};
//!
//! let labels = [0, 0, 2, 2, 2];
//! assert_eq!(cluster_sizes(&labels, 3), vec![2, 0, 3]);
//! assert_eq!(label_counts(&labels).get(&2), Some(&3));
//! ```

use std::collections::BTreeMap;

pub use crate::cluster::kmeans::inertia;

/// Points per cluster for labels in `0..k`. Labels `>= k` are ignored.
pub fn cluster_sizes(labels: &[usize], k: usize) -> Vec<usize> {
    let mut sizes = vec![0usize; k];
    for &l in labels {
        if let Some(s) = sizes.get_mut(l) {
            *s += 1;
        }
    }
    sizes
}

/// Count of every label that occurs, in label order.
///
/// Unlike [`cluster_sizes`], labels that never occur are absent.
pub fn label_counts(labels: &[usize]) -> BTreeMap<usize, usize> {
    let mut counts = BTreeMap::new();
    for &l in labels {
        *counts.entry(l).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use ndarray::array;

    #[test]
    fn test_cluster_sizes_ignores_out_of_range() {
        assert_eq!(cluster_sizes(&[0, 1, 1, 7], 2), vec![1, 2]);
        assert_eq!(cluster_sizes(&[], 3), vec![0, 0, 0]);
    }

    #[test]
    fn test_label_counts() {
        let counts = label_counts(&[3, 1, 3, 3]);
        assert_eq!(counts.into_iter().collect::<Vec<_>>(), vec![(1, 1), (3, 3)]);
    }

    #[test]
    fn test_inertia() {
        let data = Dataset::from_rows(&[vec![0.0, 0.0], vec![2.0, 0.0], vec![5.0, 5.0]]).unwrap();
        let centroids = array![[1.0, 0.0], [5.0, 5.0]];
        assert!((inertia(&data, &[0, 0, 1], &centroids.view()) - 2.0).abs() < 1e-12);
    }
}
