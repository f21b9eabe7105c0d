//! Flat clusters and cut thresholds from a linkage.
//!
//! Leaving `n_clusters` groups out of `point_count` leaves means applying the
//! first `point_count - n_clusters` merges and undoing the rest. The reported
//! threshold is the height of the earliest undone merge, which is where a
//! dendrogram plot draws its cut line.
//!
//! ```text
//!   height
//!    3.0 ┤        ┌────┴────┐         merge 3   n_clusters = 2
//!    1.0 ┤   ┌────┴───┐     │         merge 2   n_clusters = 3
//!    0.7 ┤   │      ┌─┴─┐   │         merge 1   n_clusters = 4
//!    0.5 ┤ ┌─┴─┐    │   │   │         merge 0   n_clusters = 5
//!          0   1    2   3   4
//! ```
//!
//! With `n_clusters == 1` nothing is undone and there is no threshold.

use super::Dendrogram;
use crate::error::{Error, Result};

/// Labels and threshold for one cut.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LinkageCut {
    /// Group per leaf, in leaf order. Groups are numbered by first appearance.
    pub labels: Vec<usize>,
    /// Height of the earliest undone merge; `None` for a single cluster.
    pub threshold: Option<f64>,
}

impl LinkageCut {
    /// Number of distinct groups.
    pub fn n_clusters(&self) -> usize {
        self.labels.iter().max().map_or(0, |&m| m + 1)
    }
}

/// Cut `linkage` into `n_clusters` flat clusters over `point_count` leaves.
pub fn cut_at(linkage: &Dendrogram, n_clusters: usize, point_count: usize) -> Result<LinkageCut> {
    if n_clusters == 0 || n_clusters > point_count {
        return Err(Error::InvalidClusterCount {
            requested: n_clusters,
            n_items: point_count,
        });
    }
    if linkage.n_items() != point_count {
        return Err(Error::MalformedLinkage {
            reason: format!(
                "linkage covers {} leaves, expected {point_count}",
                linkage.n_items()
            ),
        });
    }
    let needed = point_count - 1;
    if linkage.n_merges() < needed {
        return Err(Error::MalformedLinkage {
            reason: format!(
                "{} merge records, need {needed} for {point_count} points",
                linkage.n_merges()
            ),
        });
    }

    let n_apply = point_count - n_clusters;
    let threshold = if n_clusters > 1 {
        linkage.merge(n_apply).map(|m| m.distance)
    } else {
        None
    };

    // parent[id] == id marks a root; merge i owns id point_count + i.
    let mut parent: Vec<usize> = (0..point_count + n_apply).collect();
    for (i, merge) in linkage.merges().take(n_apply).enumerate() {
        let new_id = point_count + i;
        for id in [merge.cluster_a, merge.cluster_b] {
            if id >= new_id {
                return Err(Error::MalformedLinkage {
                    reason: format!("merge {i} references cluster {id} before it exists"),
                });
            }
        }
        let root_a = find_root(&parent, merge.cluster_a);
        let root_b = find_root(&parent, merge.cluster_b);
        if root_a == root_b {
            return Err(Error::MalformedLinkage {
                reason: format!("merge {i} joins cluster {root_a} with itself"),
            });
        }
        parent[root_a] = new_id;
        parent[root_b] = new_id;
    }

    // Renumber roots by first appearance in leaf order.
    let mut group_of_root: Vec<Option<usize>> = vec![None; parent.len()];
    let mut next = 0;
    let labels = (0..point_count)
        .map(|leaf| {
            let root = find_root(&parent, leaf);
            *group_of_root[root].get_or_insert_with(|| {
                next += 1;
                next - 1
            })
        })
        .collect();

    tracing::trace!(n_clusters, point_count, ?threshold, "linkage cut");
    Ok(LinkageCut { labels, threshold })
}

fn find_root(parent: &[usize], mut id: usize) -> usize {
    while parent[id] != id {
        id = parent[id];
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::{Rng as _, SeedableRng};
    use std::collections::HashSet;

    /// The five-leaf tree drawn in the module docs.
    fn five_leaves() -> Dendrogram {
        let mut d = Dendrogram::new(5);
        d.add_merge(0, 1, 0.5, 2); // -> 5
        d.add_merge(2, 3, 0.7, 2); // -> 6
        d.add_merge(5, 6, 1.0, 4); // -> 7
        d.add_merge(4, 7, 3.0, 5); // -> 8
        d
    }

    #[test]
    fn test_single_cluster_has_no_threshold() {
        let cut = cut_at(&five_leaves(), 1, 5).unwrap();
        assert_eq!(cut.threshold, None);
        assert_eq!(cut.labels, vec![0; 5]);
    }

    #[test]
    fn test_all_singletons() {
        let cut = cut_at(&five_leaves(), 5, 5).unwrap();
        assert_eq!(cut.threshold, Some(0.5));
        assert_eq!(cut.labels, vec![0, 1, 2, 3, 4]);
        assert_eq!(cut.n_clusters(), 5);
    }

    #[test]
    fn test_intermediate_cuts() {
        let d = five_leaves();

        let two = cut_at(&d, 2, 5).unwrap();
        assert_eq!(two.threshold, Some(3.0));
        assert_eq!(two.labels, vec![0, 0, 0, 0, 1]);

        let three = cut_at(&d, 3, 5).unwrap();
        assert_eq!(three.threshold, Some(1.0));
        assert_eq!(three.labels, vec![0, 0, 1, 1, 2]);

        let four = cut_at(&d, 4, 5).unwrap();
        assert_eq!(four.threshold, Some(0.7));
        assert_eq!(four.labels, vec![0, 0, 1, 2, 3]);
    }

    #[test]
    fn test_single_point() {
        let d = Dendrogram::new(1);
        let cut = cut_at(&d, 1, 1).unwrap();
        assert_eq!(cut.labels, vec![0]);
        assert_eq!(cut.threshold, None);
    }

    #[test]
    fn test_invalid_requests() {
        let d = five_leaves();
        assert!(matches!(
            cut_at(&d, 0, 5),
            Err(Error::InvalidClusterCount { requested: 0, .. })
        ));
        assert!(matches!(
            cut_at(&d, 6, 5),
            Err(Error::InvalidClusterCount { requested: 6, .. })
        ));

        let mut short = Dendrogram::new(5);
        short.add_merge(0, 1, 0.5, 2);
        assert!(matches!(
            cut_at(&short, 2, 5),
            Err(Error::MalformedLinkage { .. })
        ));
        assert!(cut_at(&d, 2, 4).is_err());
    }

    #[test]
    fn test_forward_reference_rejected() {
        let mut d = Dendrogram::new(3);
        d.add_merge(0, 3, 0.5, 2);
        d.add_merge(1, 2, 0.7, 3);
        assert!(matches!(cut_at(&d, 1, 3), Err(Error::MalformedLinkage { .. })));
    }

    #[test]
    fn test_repeated_merge_rejected() {
        let mut d = Dendrogram::new(3);
        d.add_merge(0, 1, 0.5, 2);
        d.add_merge(0, 3, 0.7, 3);
        assert!(matches!(cut_at(&d, 1, 3), Err(Error::MalformedLinkage { .. })));
    }

    /// Random valid linkage over `n` leaves with non-decreasing heights.
    fn random_linkage(n: usize, seed: u64) -> Dendrogram {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut active: Vec<(usize, usize)> = (0..n).map(|i| (i, 1)).collect();
        let mut d = Dendrogram::new(n);
        let mut height = 0.0;
        for i in 0..n.saturating_sub(1) {
            let a = active.swap_remove(rng.random_range(0..active.len()));
            let b = active.swap_remove(rng.random_range(0..active.len()));
            height += rng.random::<f64>();
            d.add_merge(a.0, b.0, height, a.1 + b.1);
            active.push((n + i, a.1 + b.1));
        }
        d
    }

    proptest! {
        #[test]
        fn cut_yields_exactly_n_clusters(n in 1usize..25, seed in any::<u64>(), frac in 0.0f64..1.0) {
            let d = random_linkage(n, seed);
            let n_clusters = 1 + ((n - 1) as f64 * frac) as usize;
            let cut = cut_at(&d, n_clusters, n).unwrap();

            prop_assert_eq!(cut.labels.len(), n);
            let distinct: HashSet<_> = cut.labels.iter().copied().collect();
            prop_assert_eq!(distinct.len(), n_clusters);
            prop_assert!(cut.labels.iter().all(|&l| l < n_clusters));
            prop_assert_eq!(cut.labels[0], 0);
            prop_assert_eq!(cut.threshold.is_none(), n_clusters == 1);
        }
    }
}
