//! Parent/child pairs of internal edges and their anomaly verdicts.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::anomaly::threshold::is_anomalous;
use crate::split::{EncodedTree, Split};

/// Outcome of the anomaly test for one edge pair in one tree.
pub type Verdict = bool;

/// An ancestral edge and the internal edge directly below it, identified by their splits.
///
/// Pairs from different trees over the same taxon namespace are the same pair iff
/// both splits are equal.
#[derive(new, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EdgePair {
    pub parent: Split,
    pub child: Split,
}

/// Test every internal edge pair of a tree, in postorder.
///
/// A pair is formed for each internal node whose parent is not the root and whose
/// own edge length is known: the root has no edge, and leaves have nothing below
/// their edge to test. The tree is only read.
///
/// ```
/// use anomaly_zone::anomaly::edge_pairs;
/// use anomaly_zone::io::newick;
/// use anomaly_zone::split::EncodedTree;
/// use anomaly_zone::taxa::TaxonNamespace;
///
/// let tree = newick::parse("((((A:1,B:1):0.05,C:1):0.1,D:1):2.0,E:1);").unwrap();
/// let taxa = TaxonNamespace::from_tree(&tree).unwrap();
/// let pairs = edge_pairs(&EncodedTree::encode(&tree, &taxa).unwrap());
/// assert_eq!(pairs.len(), 2);
/// assert_eq!(pairs.iter().filter(|(_, anomalous)| *anomalous).count(), 1);
/// ```
pub fn edge_pairs(encoded: &EncodedTree) -> Vec<(EdgePair, Verdict)> {
    let tree = encoded.tree();
    let mut pairs = Vec::new();
    for node in tree.postorder() {
        if tree.is_root(node) || tree.is_leaf(node) {
            continue;
        }
        let parent = match tree.parent(node) {
            Some(parent) if !tree.is_root(parent) => parent,
            _ => continue,
        };
        let child_length = match tree.edge_length(node) {
            Some(length) => length,
            None => {
                debug!(
                    "skipping edge {} without a length",
                    encoded.split(node)
                );
                continue;
            }
        };
        let verdict = is_anomalous(tree.edge_length(parent), child_length);
        pairs.push((
            EdgePair::new(encoded.split(parent).clone(), encoded.split(node).clone()),
            verdict,
        ));
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::newick;
    use crate::taxa::TaxonNamespace;

    fn pairs_of(text: &str) -> Vec<(EdgePair, Verdict)> {
        let tree = newick::parse(text).unwrap();
        let taxa = TaxonNamespace::from_tree(&tree).unwrap();
        let encoded = EncodedTree::encode(&tree, &taxa).unwrap();
        edge_pairs(&encoded)
    }

    #[test]
    fn single_anomalous_pair() {
        let pairs = pairs_of("((((A:1,B:1):0.05,C:1):0.1,D:1):2.0,E:1);");
        // A=0 B=1 C=2 D=3 E=4
        let anomalous: Vec<_> = pairs.iter().filter(|(_, v)| *v).collect();
        assert_eq!(anomalous.len(), 1);
        assert_eq!(anomalous[0].0.parent.to_string(), "00111");
        assert_eq!(anomalous[0].0.child.to_string(), "00011");

        let benign: Vec<_> = pairs.iter().filter(|(_, v)| !*v).collect();
        assert_eq!(benign.len(), 1);
        assert_eq!(benign[0].0.parent.to_string(), "01111");
        assert_eq!(benign[0].0.child.to_string(), "00111");
    }

    #[test]
    fn parent_is_always_the_direct_ancestor() {
        for (pair, _) in pairs_of("(((A:1,B:1):0.2,(C:1,D:1):0.3):0.4,((E:1,F:1):0.1,G:1):0.2);") {
            let mut union = pair.child.clone();
            union.union_with(&pair.parent);
            assert_eq!(union, pair.parent);
            assert!(pair.child.count() < pair.parent.count());
        }
    }

    #[test]
    fn root_children_and_missing_lengths_are_skipped() {
        // the only internal edges hang from the root
        assert!(pairs_of("((A:1,B:1):0.1,(C:1,D:1):0.1);").is_empty());
        // unknown child length
        assert!(pairs_of("(((A:1,B:1),C:1):0.1,D:1);").is_empty());
        // unknown parent length: pair exists but is never anomalous
        let pairs = pairs_of("(((A:1,B:1):0.01,C:1),D:1);");
        assert_eq!(pairs.len(), 1);
        assert!(!pairs[0].1);
    }
}
