//! Hierarchical (agglomerative) clustering.
//!
//! Bottom-up clustering that builds a **dendrogram** by iteratively
//! merging the closest clusters. The merging itself is done by `kodama`;
//! this module turns a [`Dataset`] into its condensed distance matrix,
//! hands it over, and copies the merge steps into a [`Dendrogram`] that
//! [`cut_at`] can slice.
//!
//! # Linkage Methods
//!
//! | Linkage | Formula | Effect |
//! |---------|---------|--------|
//! | Single | min(d(a,b)) for a∈A, b∈B | Chaining; elongated clusters |
//! | Complete | max(d(a,b)) | Compact, spherical clusters |
//! | Average | mean(d(a,b)) | Balanced compromise |
//! | Ward | Δ variance | Minimizes within-cluster variance |
//!
//! Ward's increase in within-cluster variance when merging A and B:
//!
//! ```text
//! Δ(A,B) = (nₐ × nᵦ)/(nₐ + nᵦ) × ||μₐ - μᵦ||²
//! ```

use core::fmt;
use core::str::FromStr;

use super::traits::Clustering;
use crate::dataset::Dataset;
use crate::distance::squared_euclidean;
use crate::error::{Error, Result};
use crate::hierarchy::{cut_at, Dendrogram, LinkageCut};
use kodama::{linkage as kodama_linkage, Method as KodamaMethod};

/// Linkage method for hierarchical clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Linkage {
    /// Single linkage: minimum distance between clusters.
    Single,
    /// Complete linkage: maximum distance between clusters.
    Complete,
    /// Average linkage: mean distance between clusters.
    Average,
    /// Ward's method: minimize within-cluster variance.
    #[default]
    Ward,
}

impl Linkage {
    /// All methods, in declaration order.
    pub const ALL: [Linkage; 4] = [
        Linkage::Single,
        Linkage::Complete,
        Linkage::Average,
        Linkage::Ward,
    ];

    /// Lower-case name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Linkage::Single => "single",
            Linkage::Complete => "complete",
            Linkage::Average => "average",
            Linkage::Ward => "ward",
        }
    }

    fn kodama_method(self) -> KodamaMethod {
        match self {
            Linkage::Single => KodamaMethod::Single,
            Linkage::Complete => KodamaMethod::Complete,
            Linkage::Average => KodamaMethod::Average,
            Linkage::Ward => KodamaMethod::Ward,
        }
    }
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Linkage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Linkage::ALL
            .into_iter()
            .find(|l| l.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownLinkage(s.to_string()))
    }
}

/// Hierarchical (agglomerative) clustering.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HierarchicalClustering {
    /// Number of clusters to produce.
    n_clusters: usize,
    /// Linkage method.
    linkage: Linkage,
}

impl HierarchicalClustering {
    /// Create a new hierarchical clusterer using Ward linkage.
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            linkage: Linkage::Ward,
        }
    }

    /// Set linkage method.
    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    /// Fit and return the full dendrogram.
    pub fn fit_dendrogram(&self, data: &Dataset) -> Result<Dendrogram> {
        let n = data.n_points();
        if n == 1 {
            return Ok(Dendrogram::new(1));
        }

        // Condensed dissimilarity matrix (upper triangle, row-major), N-choose-2 long.
        let mut condensed = Vec::with_capacity((n * (n - 1)) / 2);
        for row in 0..(n - 1) {
            for col in (row + 1)..n {
                condensed.push(squared_euclidean(&data.point(row), &data.point(col)).sqrt());
            }
        }

        // kodama labels leaves 0..n-1 and gives merge i the id n+i.
        let dend = kodama_linkage(&mut condensed, n, self.linkage.kodama_method());

        let mut dendro = Dendrogram::new(n);
        for step in dend.steps() {
            dendro.add_merge(step.cluster1, step.cluster2, step.dissimilarity, step.size);
        }
        tracing::debug!(
            n_points = n,
            linkage = %self.linkage,
            top_height = dendro.distances().last().copied().unwrap_or(0.0),
            "agglomerative linkage built"
        );

        Ok(dendro)
    }

    /// Fit and cut into the configured number of clusters.
    pub fn fit_cut(&self, data: &Dataset) -> Result<LinkageCut> {
        let dendro = self.fit_dendrogram(data)?;
        cut_at(&dendro, self.n_clusters, data.n_points())
    }
}

impl Clustering for HierarchicalClustering {
    fn fit_predict(&self, data: &Dataset) -> Result<Vec<usize>> {
        Ok(self.fit_cut(data)?.labels)
    }

    fn n_clusters(&self) -> usize {
        self.n_clusters
    }
}
