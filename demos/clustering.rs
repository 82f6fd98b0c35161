//! Agglomerative, DBSCAN and k-means on a small 2D dataset, then a decision tree
//! trained on the k-means labels.

use sift::cluster::{k_distance, sse_sweep, Agglomerative, Dbscan, DensityFilter, Kmeans};
use sift::tree::DecisionTree;

fn main() {
    // Three well-separated clusters in 2D, plus one outlier.
    let data: Vec<Vec<f64>> = vec![
        // Cluster A (near origin)
        vec![0.0, 0.0],
        vec![0.1, 0.2],
        vec![0.2, 0.1],
        vec![-0.1, 0.1],
        // Cluster B (near (5, 5))
        vec![5.0, 5.0],
        vec![5.1, 4.9],
        vec![4.9, 5.1],
        vec![5.2, 5.2],
        // Cluster C (near (10, 0))
        vec![10.0, 0.0],
        vec![10.1, 0.1],
        vec![9.9, -0.1],
        vec![10.2, 0.2],
        // Outlier
        vec![20.0, 20.0],
    ];

    // --- Agglomerative (stop at 3 clusters) ---
    let fit = Agglomerative::new().with_n_clusters(3).fit(&data).unwrap();
    println!("=== Agglomerative (3 clusters) ===");
    for m in &fit.merges {
        println!(
            "  merge {:2} <- {:2}  distance {:6.3}  size {}",
            m.kept, m.absorbed, m.distance, m.size
        );
    }
    for c in &fit.clusters {
        println!("  cluster {:2}: {:?}", c.id, c.members);
    }

    // --- DBSCAN: pick eps from the k-distance curve ---
    let curve = k_distance(&data, 2).unwrap();
    println!("\n=== k-distance (k=2) ===\n  {:?}", curve);

    let fit = Dbscan::new(1.0, 3).fit(&data).unwrap();
    println!("\n=== DBSCAN (eps=1.0, min_pts=3) ===");
    for s in fit.summary(&data).unwrap() {
        println!(
            "  cluster {} size {} centroid {:?}",
            s.cluster, s.size, s.centroid
        );
    }
    println!("  noise: {:?}", fit.noise);

    // --- K-means elbow, then k=3 ---
    println!("\n=== K-means SSE sweep ===");
    for (k, sse) in sse_sweep(&data, 1..=6, Some(42)).unwrap() {
        println!("  k = {k}  SSE = {sse:.3}");
    }

    // With the outlier present, the lowest-SSE 3-way split gives it a cluster
    // of its own and merges two real groups. Drop it first, then keep the best
    // of 50 seeded restarts so one bad initial sample cannot win.
    let dense = DensityFilter::new(1.0, 2).apply(&data).unwrap();
    let fit = (0..50)
        .map(|seed| Kmeans::new(3).with_seed(seed).fit(&dense).unwrap())
        .min_by(|a, b| a.sse.total_cmp(&b.sse))
        .unwrap();
    let labels = fit.labels();
    println!("\n=== K-means (k=3, outlier removed, best of 50 seeds) ===");
    for (i, label) in labels.iter().enumerate() {
        let (x, y) = (dense[i][0], dense[i][1]);
        println!("  point {i:2} ({x:5.1}, {y:5.1}) => cluster {label}");
    }
    println!("  SSE = {:.3}", fit.sse);

    // --- Decision tree reproducing the k-means labels ---
    let tree = DecisionTree::fit(&dense, &labels).unwrap();
    println!("\n=== Decision tree on k-means labels ===");
    print!("{}", tree.rules());
}
