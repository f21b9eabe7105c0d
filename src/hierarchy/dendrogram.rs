//! Dendrogram: the merge history of agglomerative clustering.
//!
//! Leaves are ids `0..n_items`; merge `i` creates cluster id `n_items + i`.
//! This is the SciPy/MATLAB linkage convention, which is also what `kodama`
//! emits, so producer output can be copied in record by record.

use crate::error::{Error, Result};

/// A dendrogram representing hierarchical cluster merges.
///
/// Each merge combines two clusters into one, recording:
/// - Which clusters were merged
/// - The distance at which they merged
/// - The size of the resulting cluster
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dendrogram {
    /// Merge history, in merge order.
    merges: Vec<Merge>,
    /// Number of original items.
    n_items: usize,
}

/// A single merge operation in the dendrogram.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Merge {
    /// First cluster being merged (id).
    pub cluster_a: usize,
    /// Second cluster being merged (id).
    pub cluster_b: usize,
    /// Distance/dissimilarity at which merge occurred.
    pub distance: f64,
    /// Size of resulting cluster.
    pub size: usize,
}

impl Dendrogram {
    /// Create an empty dendrogram for n items.
    pub fn new(n_items: usize) -> Self {
        Self {
            merges: Vec::with_capacity(n_items.saturating_sub(1)),
            n_items,
        }
    }

    /// Create from a SciPy-style linkage matrix: rows of
    /// `[cluster_a, cluster_b, distance, size]`.
    pub fn from_linkage_rows(n_items: usize, rows: &[[f64; 4]]) -> Result<Self> {
        let mut dendro = Self::new(n_items);
        for row in rows {
            if row.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(Error::MalformedLinkage {
                    reason: format!("linkage row {row:?} has a negative or non-finite entry"),
                });
            }
            if [row[0], row[1], row[3]].iter().any(|v| v.fract() != 0.0) {
                return Err(Error::MalformedLinkage {
                    reason: format!("linkage row {row:?} has a non-integral id or size"),
                });
            }
            dendro.add_merge(row[0] as usize, row[1] as usize, row[2], row[3] as usize);
        }
        Ok(dendro)
    }

    /// Record a merge operation.
    pub fn add_merge(&mut self, cluster_a: usize, cluster_b: usize, distance: f64, size: usize) {
        self.merges.push(Merge {
            cluster_a,
            cluster_b,
            distance,
            size,
        });
    }

    /// Number of original items.
    pub fn n_items(&self) -> usize {
        self.n_items
    }

    /// Number of merges recorded.
    pub fn n_merges(&self) -> usize {
        self.merges.len()
    }

    /// Iterate over merges.
    pub fn merges(&self) -> impl Iterator<Item = &Merge> {
        self.merges.iter()
    }

    /// Merge record at `index`.
    pub fn merge(&self, index: usize) -> Option<&Merge> {
        self.merges.get(index)
    }

    /// Get the merge distances (for visualization).
    pub fn distances(&self) -> Vec<f64> {
        self.merges.iter().map(|m| m.distance).collect()
    }

    /// Whether merge heights never decrease.
    ///
    /// Producers guarantee this for ward, single, complete and average
    /// linkage; centroid and median linkage can violate it.
    pub fn is_monotone(&self) -> bool {
        self.merges.windows(2).all(|w| w[0].distance <= w[1].distance)
    }

    /// Labels for `k` flat clusters. See [`cut_at`](super::cut_at).
    pub fn cut_to_k(&self, k: usize) -> Result<Vec<usize>> {
        Ok(super::cut_at(self, k, self.n_items)?.labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dendrogram_creation() {
        let dendro = Dendrogram::new(5);
        assert_eq!(dendro.n_items(), 5);
        assert_eq!(dendro.n_merges(), 0);
    }

    #[test]
    fn test_dendrogram_merge() {
        let mut dendro = Dendrogram::new(4);
        dendro.add_merge(0, 1, 0.5, 2);
        dendro.add_merge(2, 3, 0.7, 2);
        dendro.add_merge(4, 5, 1.0, 4); // clusters from previous merges

        assert_eq!(dendro.n_merges(), 3);
        assert_eq!(dendro.distances(), vec![0.5, 0.7, 1.0]);
        assert!(dendro.is_monotone());
        assert_eq!(dendro.merge(2).map(|m| m.size), Some(4));
    }

    #[test]
    fn test_from_linkage_rows() {
        let dendro = Dendrogram::from_linkage_rows(
            3,
            &[[0.0, 1.0, 0.25, 2.0], [2.0, 3.0, 4.0, 3.0]],
        )
        .unwrap();
        let first = dendro.merge(0).copied().unwrap();
        assert_eq!((first.cluster_a, first.cluster_b, first.size), (0, 1, 2));
        assert_eq!(dendro.merge(1).map(|m| m.cluster_b), Some(3));

        assert!(Dendrogram::from_linkage_rows(3, &[[0.0, 1.0, f64::NAN, 2.0]]).is_err());
        assert!(Dendrogram::from_linkage_rows(3, &[[-1.0, 1.0, 0.5, 2.0]]).is_err());
    }

    #[test]
    fn test_from_linkage_rows_rejects_fractional_ids() {
        for row in [[0.5, 1.0, 0.25, 2.0], [0.0, 1.5, 0.25, 2.0], [0.0, 1.0, 0.25, 2.5]] {
            assert!(matches!(
                Dendrogram::from_linkage_rows(3, &[row]),
                Err(Error::MalformedLinkage { .. })
            ));
        }
        // Fractional distances are fine.
        assert!(Dendrogram::from_linkage_rows(3, &[[0.0, 1.0, 0.25, 2.0]]).is_ok());
    }

    #[test]
    fn test_non_monotone_detected() {
        let mut dendro = Dendrogram::new(3);
        dendro.add_merge(0, 1, 2.0, 2);
        dendro.add_merge(2, 3, 1.0, 3);
        assert!(!dendro.is_monotone());
    }
}
