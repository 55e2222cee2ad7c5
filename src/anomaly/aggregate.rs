//! Accumulation of verdicts and split occurrences over many trees.
//!
//! Folding is a pure accumulation: every tree appends one verdict per edge pair it
//! contains and increments the count of every split it contains. Partial results
//! can be merged key-wise, so trees may be folded in any order or in parallel.

use std::collections::HashMap;

use indexmap::IndexMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::anomaly::pairs::{edge_pairs, EdgePair, Verdict};
use crate::split::{EncodedTree, Split};

/// Verdicts observed for one edge pair, one per tree in which the pair occurred.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verdicts(Vec<Verdict>);

impl Verdicts {
    pub fn push(&mut self, verdict: Verdict) {
        self.0.push(verdict);
    }

    /// Number of trees in which the pair was observed.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of trees in which the pair was anomalous.
    pub fn anomalous(&self) -> usize {
        self.0.iter().filter(|&&v| v).count()
    }

    /// True if the pair was anomalous in at least one tree.
    pub fn any(&self) -> bool {
        self.0.iter().any(|&v| v)
    }

    /// Fraction of observations that were anomalous.
    ///
    /// Without any observation the fraction is undefined and `None` is returned.
    ///
    /// ```
    /// use anomaly_zone::anomaly::Verdicts;
    /// let mut v = Verdicts::default();
    /// assert_eq!(v.proportion(), None);
    /// v.push(true);
    /// v.push(false);
    /// assert_eq!(v.proportion(), Some(0.5));
    /// ```
    pub fn proportion(&self) -> Option<f64> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.anomalous() as f64 / self.0.len() as f64)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Verdict> + '_ {
        self.0.iter().copied()
    }
}

/// Edge pair to verdicts, iterated in the order pairs were first observed.
#[derive(Debug, Clone, Default)]
pub struct AggregateMap(IndexMap<EdgePair, Verdicts>);

impl AggregateMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a verdict for `pair`, creating its entry if needed.
    pub fn record(&mut self, pair: EdgePair, verdict: Verdict) {
        self.0.entry(pair).or_default().push(verdict);
    }

    pub fn get(&self, pair: &EdgePair) -> Option<&Verdicts> {
        self.0.get(pair)
    }

    pub fn contains(&self, pair: &EdgePair) -> bool {
        self.0.contains_key(pair)
    }

    /// Entries in first-observation order.
    pub fn iter(&self) -> impl Iterator<Item = (&EdgePair, &Verdicts)> + '_ {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append all verdicts of `other`. Pairs new to `self` are placed after the
    /// existing ones, in `other`'s order.
    pub fn merge(&mut self, other: AggregateMap) {
        for (pair, theirs) in other.0 {
            self.0.entry(pair).or_default().0.extend(theirs.0);
        }
    }
}

/// Number of trees in which each split occurred.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitOccurrence(HashMap<Split, usize>);

impl SplitOccurrence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, split: &Split) {
        if let Some(count) = self.0.get_mut(split) {
            *count += 1;
        } else {
            self.0.insert(split.clone(), 1);
        }
    }

    /// Occurrences of `split`, zero if it was never seen.
    pub fn count(&self, split: &Split) -> usize {
        self.0.get(split).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Split, usize)> + '_ {
        self.0.iter().map(|(split, &count)| (split, count))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn merge(&mut self, other: SplitOccurrence) {
        for (split, count) in other.0 {
            *self.0.entry(split).or_insert(0) += count;
        }
    }
}

/// Running state of a fold over trees.
///
/// ```
/// use anomaly_zone::anomaly::Aggregate;
/// use anomaly_zone::io::newick;
/// use anomaly_zone::split::EncodedTree;
/// use anomaly_zone::taxa::TaxonNamespace;
///
/// let tree = newick::parse("((((A:1,B:1):0.05,C:1):0.1,D:1):2.0,E:1);").unwrap();
/// let taxa = TaxonNamespace::from_tree(&tree).unwrap();
/// let encoded = EncodedTree::encode(&tree, &taxa).unwrap();
///
/// let mut aggregate = Aggregate::new();
/// aggregate.fold_tree(&encoded);
/// aggregate.fold_tree(&encoded);
/// assert_eq!(aggregate.tree_count(), 2);
/// assert!(aggregate.pairs.iter().all(|(_, v)| v.len() == 2));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Aggregate {
    pub pairs: AggregateMap,
    pub splits: SplitOccurrence,
    trees: usize,
}

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the edge pairs and splits of one tree.
    pub fn fold_tree(&mut self, tree: &EncodedTree) {
        let pairs = edge_pairs(tree);
        debug!("folding tree with {} edge pairs", pairs.len());
        for (pair, verdict) in pairs {
            self.pairs.record(pair, verdict);
        }
        for split in tree.edge_splits() {
            self.splits.increment(split);
        }
        self.trees += 1;
    }

    /// Fold a collection of trees in order.
    pub fn fold_trees<'a, 't: 'a, I>(trees: I) -> Self
    where
        I: IntoIterator<Item = &'a EncodedTree<'t>>,
    {
        let mut aggregate = Self::new();
        for tree in trees {
            aggregate.fold_tree(tree);
        }
        aggregate
    }

    /// Fold trees concurrently. The result holds the same verdicts and counts as
    /// [`fold_trees`](#method.fold_trees), with pairs ordered by the first tree they occur in.
    #[cfg(feature = "parallel")]
    pub fn par_fold_trees(trees: &[EncodedTree]) -> Self {
        trees
            .par_iter()
            .map(|tree| {
                let mut aggregate = Self::new();
                aggregate.fold_tree(tree);
                aggregate
            })
            .reduce(Self::new, |mut left, right| {
                left.merge(right);
                left
            })
    }

    /// Combine with the aggregate of another set of trees.
    pub fn merge(&mut self, other: Aggregate) {
        self.pairs.merge(other.pairs);
        self.splits.merge(other.splits);
        self.trees += other.trees;
    }

    /// Number of trees folded so far.
    pub fn tree_count(&self) -> usize {
        self.trees
    }

    /// Fraction of folded trees containing `split`, `None` before any tree was folded.
    pub fn split_support(&self, split: &Split) -> Option<f64> {
        if self.trees == 0 {
            None
        } else {
            Some(self.splits.count(split) as f64 / self.trees as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::newick;
    use crate::phylogeny::Tree;
    use crate::taxa::TaxonNamespace;

    const REFERENCE: &str = "((((A:1,B:1):0.05,C:1):0.1,D:1):2.0,E:1);";

    fn trees(texts: &[&str]) -> (Vec<Tree>, TaxonNamespace) {
        let trees: Vec<Tree> = texts.iter().map(|t| newick::parse(t).unwrap()).collect();
        let taxa = TaxonNamespace::from_tree(&trees[0]).unwrap();
        (trees, taxa)
    }

    #[test]
    fn folding_twice_keeps_proportions() {
        let (trees, taxa) = trees(&[REFERENCE]);
        let encoded = EncodedTree::encode(&trees[0], &taxa).unwrap();

        let mut once = Aggregate::new();
        once.fold_tree(&encoded);
        let mut twice = once.clone();
        twice.fold_tree(&encoded);

        assert_eq!(once.pairs.len(), twice.pairs.len());
        for ((p1, v1), (p2, v2)) in once.pairs.iter().zip(twice.pairs.iter()) {
            assert_eq!(p1, p2);
            assert_eq!(v2.len(), 2 * v1.len());
            assert_eq!(v1.proportion(), v2.proportion());
        }
        for (split, count) in once.splits.iter() {
            assert_eq!(twice.splits.count(split), 2 * count);
        }
    }

    #[test]
    fn counts_every_non_root_edge() {
        let (trees, taxa) = trees(&[REFERENCE, "((((A:1,C:1):0.05,B:1):0.1,D:1):2.0,E:1);"]);
        let encoded: Vec<_> = trees
            .iter()
            .map(|t| EncodedTree::encode(t, &taxa).unwrap())
            .collect();
        let aggregate = Aggregate::fold_trees(&encoded);

        assert_eq!(aggregate.tree_count(), 2);
        // 5 leaf edges + 3 internal edges shared, plus {A,B} and {A,C}
        assert_eq!(aggregate.splits.len(), 9);
        let mut ab = Split::singleton(5, 0);
        ab.insert(1);
        assert_eq!(ab.to_string(), "00011");
        assert_eq!(aggregate.split_support(&ab), Some(0.5));
        let a = Split::singleton(5, 0);
        assert_eq!(aggregate.splits.count(&a), 2);
        assert_eq!(aggregate.split_support(&a), Some(1.0));
        // 2 pairs in the first tree, one shared with the second, one new
        assert_eq!(aggregate.pairs.len(), 3);
    }

    #[test]
    fn insertion_order_is_first_observation() {
        let mut map = AggregateMap::new();
        let pair = |p: usize, c: usize| EdgePair::new(Split::singleton(4, p), Split::singleton(4, c));
        map.record(pair(3, 2), false);
        map.record(pair(0, 1), true);
        map.record(pair(3, 2), true);
        let order: Vec<_> = map.iter().map(|(p, _)| p.clone()).collect();
        assert_eq!(order, vec![pair(3, 2), pair(0, 1)]);
        assert_eq!(map.get(&pair(3, 2)).unwrap().anomalous(), 1);
        assert_eq!(map.get(&pair(2, 2)), None);
    }

    #[test]
    fn merge_keeps_first_observation_order() {
        let pair = |p: usize, c: usize| EdgePair::new(Split::singleton(4, p), Split::singleton(4, c));
        let mut left = AggregateMap::new();
        left.record(pair(3, 2), true);
        left.record(pair(0, 1), false);
        let mut right = AggregateMap::new();
        right.record(pair(1, 0), true);
        right.record(pair(0, 1), true);
        right.record(pair(2, 3), false);
        left.merge(right);

        let order: Vec<_> = left.iter().map(|(p, _)| p.clone()).collect();
        assert_eq!(order, vec![pair(3, 2), pair(0, 1), pair(1, 0), pair(2, 3)]);
        let shared = left.get(&pair(0, 1)).unwrap();
        assert_eq!(shared.iter().collect::<Vec<_>>(), vec![false, true]);
        assert!(left.contains(&pair(2, 3)));
        assert_eq!(left.len(), 4);
    }

    #[test]
    fn merge_concatenates_and_sums() {
        let (trees, taxa) = trees(&[REFERENCE, "((((A:1,B:1):1.0,C:1):0.1,D:1):2.0,E:1);"]);
        let encoded: Vec<_> = trees
            .iter()
            .map(|t| EncodedTree::encode(t, &taxa).unwrap())
            .collect();
        let sequential = Aggregate::fold_trees(&encoded);

        let mut left = Aggregate::new();
        left.fold_tree(&encoded[0]);
        let mut right = Aggregate::new();
        right.fold_tree(&encoded[1]);
        left.merge(right);

        assert_eq!(left.tree_count(), sequential.tree_count());
        assert_eq!(left.splits, sequential.splits);
        for ((p1, v1), (p2, v2)) in left.pairs.iter().zip(sequential.pairs.iter()) {
            assert_eq!(p1, p2);
            assert_eq!(v1, v2);
        }
    }

    #[test]
    fn empty_aggregate_has_no_support() {
        let aggregate = Aggregate::new();
        assert_eq!(aggregate.split_support(&Split::singleton(3, 0)), None);
        assert!(aggregate.pairs.is_empty());
        assert_eq!(Verdicts::default().proportion(), None);
    }
}
