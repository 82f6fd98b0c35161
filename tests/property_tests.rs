use proptest::prelude::*;
use sift::cluster::{Agglomerative, Clustering, Dbscan, Kmeans};
use sift::tree::DecisionTree;

fn points(max_len: usize) -> impl Strategy<Value = Vec<Vec<f64>>> {
    prop::collection::vec(prop::collection::vec(-10.0f64..10.0, 2), 1..max_len)
}

// Small integer grid: plenty of duplicates and overlapping neighborhoods.
fn grid_points(max_len: usize) -> impl Strategy<Value = Vec<Vec<f64>>> {
    prop::collection::vec(
        prop::collection::vec((0i32..6).prop_map(f64::from), 2),
        1..max_len,
    )
}

proptest! {
    #[test]
    fn prop_dbscan_partitions_points(
        data in grid_points(30),
        eps in 0.5f64..3.0,
        min_pts in 1usize..6
    ) {
        let fit = Dbscan::new(eps, min_pts).fit(&data).unwrap();

        let mut seen = vec![0usize; data.len()];
        for cluster in &fit.clusters {
            prop_assert!(!cluster.is_empty());
            for &i in cluster {
                seen[i] += 1;
            }
        }
        for &i in &fit.noise {
            seen[i] += 1;
        }
        prop_assert!(seen.iter().all(|&c| c == 1), "{:?}", seen);
    }

    #[test]
    fn prop_agglomerative_conserves_records(data in points(15)) {
        let fit = Agglomerative::new().fit(&data).unwrap();

        prop_assert_eq!(fit.merges.len(), data.len() - 1);
        prop_assert_eq!(fit.clusters.len(), 1);
        let members = &fit.clusters[0].members;
        prop_assert_eq!(members, &(0..data.len()).collect::<Vec<_>>());
        if let Some(last) = fit.merges.last() {
            prop_assert_eq!(last.size, data.len());
        }
    }

    #[test]
    fn prop_kmeans_all_assigned(data in points(20), k in 1usize..5) {
        if k <= data.len() {
            let model = Kmeans::new(k).with_seed(42);
            let labels = model.fit_predict(&data).unwrap();

            prop_assert_eq!(labels.len(), data.len());
            for &l in &labels {
                prop_assert!(l < k);
            }
        }
    }

    #[test]
    fn prop_kmeans_seed_is_deterministic(data in points(20), k in 1usize..4, seed in any::<u64>()) {
        if k <= data.len() {
            let a = Kmeans::new(k).with_seed(seed).fit(&data).unwrap();
            let b = Kmeans::new(k).with_seed(seed).fit(&data).unwrap();
            prop_assert_eq!(a.sse, b.sse);
            prop_assert_eq!(a.labels(), b.labels());
        }
    }

    #[test]
    fn prop_kmeans_k_equals_n_has_zero_sse(data in grid_points(10)) {
        let fit = Kmeans::new(data.len()).with_seed(1).fit(&data).unwrap();
        prop_assert!(fit.sse < 1e-9, "sse = {}", fit.sse);
    }

    #[test]
    fn prop_tree_has_zero_training_error(data in grid_points(40)) {
        let labels: Vec<u8> = data
            .iter()
            .map(|r| ((r[0] + 2.0 * r[1]) as u8) % 3)
            .collect();
        let tree = DecisionTree::fit(&data, &labels).unwrap();

        for (row, label) in data.iter().zip(&labels) {
            prop_assert_eq!(tree.classify(row).unwrap(), label);
        }
    }
}
