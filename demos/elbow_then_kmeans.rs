use clusterlab::{cut_at, synthetic_blobs, BlobConfig, ElbowSelector, HierarchicalClustering, Kmeans, Linkage};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // The "generate sample" dataset: 4 blobs in [-10, 10]^2.
    let data = synthetic_blobs(&BlobConfig::default(), &mut StdRng::seed_from_u64(42))?;

    let report = ElbowSelector::up_to(10).run(&data)?;
    for p in report.curve.points() {
        println!("k={} distortion={:.3}", p.k, p.distortion);
    }
    println!("elbow suggests k={}", report.optimal_k);

    let fit = Kmeans::new(report.optimal_k)
        .with_metric("Euclidean".parse()?)
        .with_seed(0)
        .fit(&data)?;
    println!(
        "k-means: {} iterations, converged={}, inertia={:.3}, sizes={:?}",
        fit.iterations,
        fit.converged,
        fit.inertia,
        fit.cluster_sizes()
    );

    let dendro = HierarchicalClustering::new(report.optimal_k)
        .with_linkage(Linkage::Ward)
        .fit_dendrogram(&data)?;
    let cut = cut_at(&dendro, report.optimal_k, data.n_points())?;
    println!("ward cut threshold: {:?}", cut.threshold);

    Ok(())
}
