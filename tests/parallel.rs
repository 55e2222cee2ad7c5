#![cfg(feature = "parallel")]
use anomaly_zone::anomaly::Aggregate;
use anomaly_zone::io::newick;
use anomaly_zone::phylogeny::Tree;
use anomaly_zone::split::EncodedTree;
use anomaly_zone::taxa::TaxonNamespace;

fn replicates() -> Vec<Tree> {
    (0..50)
        .map(|i| {
            let text = if i % 3 == 0 {
                format!("((((A:1,C:1):0.{:02},B:1):0.1,D:1):0.2,E:1);", i + 1)
            } else {
                format!("((((A:1,B:1):0.{:02},C:1):0.1,D:1):0.2,E:1);", i + 1)
            };
            newick::parse(&text).unwrap()
        })
        .collect()
}

#[test]
fn parallel_fold_matches_sequential() {
    let trees = replicates();
    let taxa = TaxonNamespace::from_tree(&trees[0]).unwrap();
    let encoded: Vec<EncodedTree> = trees
        .iter()
        .map(|t| EncodedTree::encode(t, &taxa).unwrap())
        .collect();

    let sequential = Aggregate::fold_trees(&encoded);
    let parallel = Aggregate::par_fold_trees(&encoded);

    assert_eq!(parallel.tree_count(), sequential.tree_count());
    assert_eq!(parallel.pairs.len(), sequential.pairs.len());
    for ((p, pv), (s, sv)) in parallel.pairs.iter().zip(sequential.pairs.iter()) {
        assert_eq!(p, s);
        assert_eq!(pv.len(), sv.len());
        assert_eq!(pv.anomalous(), sv.anomalous());
    }
    for (split, count) in sequential.splits.iter() {
        assert_eq!(parallel.splits.count(split), count);
    }
}
