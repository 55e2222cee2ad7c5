//! Splits (bipartitions) identify an edge by the set of taxa descending from it.
//!
//! A [`Split`] is a fixed-width bitmask over a [`TaxonNamespace`]: bit `i` is set
//! iff taxon `i` lies below the edge. Because it only depends on the leaf set,
//! the same edge in two different trees over one namespace yields the same split,
//! which is what lets results from bootstrap replicates be joined with the
//! reference tree.
//!
//! # Example
//!
//! ```rust
//! use anomaly_zone::phylogeny::{Clade, Tree};
//! use anomaly_zone::split::EncodedTree;
//! use anomaly_zone::taxa::TaxonNamespace;
//!
//! let mut tree = Tree::new();
//! let root = tree.root();
//! let ab = tree.add_child(root, Clade::default(), Some(0.5));
//! tree.add_child(ab, Clade::with_taxon("A"), Some(1.0));
//! tree.add_child(ab, Clade::with_taxon("B"), Some(1.0));
//! tree.add_child(root, Clade::with_taxon("C"), Some(1.5));
//!
//! let taxa = TaxonNamespace::from_tree(&tree).unwrap();
//! let encoded = EncodedTree::encode(&tree, &taxa).unwrap();
//! assert_eq!(encoded.split(ab).to_string(), "011");
//! assert_eq!(encoded.split(root).to_string(), "111");
//! ```

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

use petgraph::graph::NodeIndex;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::phylogeny::Tree;
use crate::taxa::{TaxonError, TaxonNamespace};

const BLOCK_BITS: usize = 64;

/// Set of taxon indices below an edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Split {
    width: usize,
    blocks: Vec<u64>,
}

impl Split {
    /// A split with no taxa set, over a namespace of `width` taxa.
    pub fn empty(width: usize) -> Self {
        Split {
            width,
            blocks: vec![0; (width + BLOCK_BITS - 1) / BLOCK_BITS],
        }
    }

    /// A split holding the single taxon `index`.
    pub fn singleton(width: usize, index: usize) -> Self {
        let mut split = Self::empty(width);
        split.insert(index);
        split
    }

    /// Number of taxa in the namespace this split is defined over.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Add taxon `index` to the split.
    ///
    /// # Panics
    ///
    /// Panics if `index >= width`.
    pub fn insert(&mut self, index: usize) {
        assert!(index < self.width, "taxon index out of bounds");
        self.blocks[index / BLOCK_BITS] |= 1 << (index % BLOCK_BITS);
    }

    pub fn contains(&self, index: usize) -> bool {
        index < self.width && (self.blocks[index / BLOCK_BITS] >> (index % BLOCK_BITS)) & 1 == 1
    }

    /// Add all taxa of `other` to this split. Both must share a width.
    pub fn union_with(&mut self, other: &Split) {
        assert_eq!(self.width, other.width, "splits over different namespaces");
        for (a, b) in self.blocks.iter_mut().zip(&other.blocks) {
            *a |= *b;
        }
    }

    /// True if this split and `other` have a taxon in common.
    pub fn intersects(&self, other: &Split) -> bool {
        self.blocks
            .iter()
            .zip(&other.blocks)
            .any(|(a, b)| a & b != 0)
    }

    /// Number of taxa in the split.
    pub fn count(&self) -> usize {
        self.blocks.iter().map(|b| b.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|&b| b == 0)
    }

    /// Indices of the taxa in the split, ascending.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.width).filter(move |&i| self.contains(i))
    }

    /// Names of the taxa in the split, in namespace order.
    pub fn taxa<'a>(&self, namespace: &'a TaxonNamespace) -> Vec<&'a str> {
        self.indices()
            .filter_map(|i| namespace.label(i))
            .collect()
    }
}

/// Bit string of `width` characters, highest taxon index first.
impl Display for Split {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for i in (0..self.width).rev() {
            f.write_str(if self.contains(i) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// A tree together with the split of every node's parent edge (the root maps
/// to the full taxon set).
#[derive(Debug, Clone)]
pub struct EncodedTree<'a> {
    tree: &'a Tree,
    splits: HashMap<NodeIndex, Split>,
}

impl<'a> EncodedTree<'a> {
    /// Compute the splits of `tree` over `namespace`.
    ///
    /// The leaves must carry exactly the taxa of the namespace: an unknown or repeated
    /// taxon, an unnamed leaf or a missing taxon is rejected, as the splits would not
    /// be comparable with those of other trees. An internal node with a single child
    /// is rejected too: its edge would share the split of the edge below it.
    pub fn encode(tree: &'a Tree, namespace: &TaxonNamespace) -> Result<Self, TaxonError> {
        let width = namespace.len();
        let mut splits: HashMap<NodeIndex, Split> = HashMap::with_capacity(tree.node_count());
        let mut seen = Split::empty(width);

        for node in tree.postorder() {
            let split = if tree.is_leaf(node) && !tree.is_root(node) {
                let taxon = tree
                    .clade(node)
                    .taxon
                    .as_ref()
                    .ok_or(TaxonError::UnlabeledLeaf)?;
                let index = namespace
                    .index_of(taxon)
                    .ok_or_else(|| TaxonError::UnknownTaxon(taxon.clone()))?;
                if seen.contains(index) {
                    return Err(TaxonError::DuplicateTaxon(taxon.clone()));
                }
                seen.insert(index);
                Split::singleton(width, index)
            } else {
                let children = tree.children(node);
                let mut split = Split::empty(width);
                for child in &children {
                    split.union_with(&splits[child]);
                }
                if children.len() == 1 && !tree.is_root(node) {
                    return Err(TaxonError::UnaryNode(split.taxa(namespace).join(",")));
                }
                split
            };
            splits.insert(node, split);
        }

        let found = seen.count();
        if found != width {
            return Err(TaxonError::MissingTaxa {
                expected: width,
                found,
            });
        }
        Ok(EncodedTree { tree, splits })
    }

    pub fn tree(&self) -> &'a Tree {
        self.tree
    }

    /// Split of the edge above `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not part of the encoded tree.
    pub fn split(&self, node: NodeIndex) -> &Split {
        &self.splits[&node]
    }

    /// Split of every non-root edge, in postorder.
    pub fn edge_splits(&self) -> impl Iterator<Item = &Split> + '_ {
        self.tree
            .postorder()
            .into_iter()
            .filter(move |&node| !self.tree.is_root(node))
            .map(move |node| &self.splits[&node])
    }
}
