//! Linkage structures and flat cuts.
//!
//! [`Dendrogram`] records complete merge history from hierarchical clustering:
//!
//! ```text
//!         6 (height=1.0)
//!        / \
//!       4   5 (height=0.7)
//!      / \ / \
//!     0  1 2  3 (leaves)
//! ```
//!
//! [`cut_at`] slices it into a requested number of flat clusters and reports
//! the height at which the slice was made.

mod cut;
mod dendrogram;

pub use cut::{cut_at, LinkageCut};
pub use dendrogram::{Dendrogram, Merge};
