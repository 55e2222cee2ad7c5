//! Intern taxon names into a namespace shared by a set of trees.
use std::collections::HashMap;

use thiserror::Error;

use crate::phylogeny::{Taxon, Tree};

/// Problems with the taxa found on the leaves of a tree, or with a tree shape that
/// keeps its splits from identifying single edges.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaxonError {
    #[error("leaf without a taxon name")]
    UnlabeledLeaf,
    #[error("taxon {0:?} occurs more than once")]
    DuplicateTaxon(Taxon),
    #[error("taxon {0:?} is not part of the reference taxon set")]
    UnknownTaxon(Taxon),
    #[error("tree covers {found} of {expected} reference taxa")]
    MissingTaxa { expected: usize, found: usize },
    #[error("internal node above {{{0}}} has a single child")]
    UnaryNode(String),
}

/// Ordered set of taxon names. Every tree compared against a namespace must
/// carry exactly these taxa on its leaves.
///
/// Indices are handed out in interning order and never change, which makes
/// them usable as bit positions of a [`Split`](../split/struct.Split.html).
///
/// ```
/// use anomaly_zone::taxa::TaxonNamespace;
/// let mut taxa = TaxonNamespace::new();
/// assert_eq!(taxa.intern("Scincus"), 0);
/// assert_eq!(taxa.intern("Eumeces"), 1);
/// assert_eq!(taxa.intern("Scincus"), 0);
/// assert_eq!(taxa.len(), 2);
/// assert_eq!(taxa.label(1), Some("Eumeces"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxonNamespace {
    labels: Vec<Taxon>,
    index: HashMap<Taxon, usize>,
}

impl TaxonNamespace {
    /// Create a new, empty namespace
    pub fn new() -> Self {
        TaxonNamespace {
            labels: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build the namespace from the leaves of a tree, left to right.
    ///
    /// Fails if a leaf has no taxon or a taxon is used twice.
    pub fn from_tree(tree: &Tree) -> Result<Self, TaxonError> {
        let mut taxa = Self::new();
        for leaf in tree.leaves() {
            let taxon = tree
                .clade(leaf)
                .taxon
                .as_ref()
                .ok_or(TaxonError::UnlabeledLeaf)?;
            if taxa.index_of(taxon).is_some() {
                return Err(TaxonError::DuplicateTaxon(taxon.clone()));
            }
            taxa.intern(taxon);
        }
        Ok(taxa)
    }

    /// Intern a taxon name, returning its index.
    ///
    /// The name is cloned into an owned `String` only when it is new to the namespace.
    pub fn intern(&mut self, taxon: &str) -> usize {
        if let Some(&i) = self.index.get(taxon) {
            i
        } else {
            let i = self.labels.len();
            self.labels.push(taxon.to_owned());
            self.index.insert(taxon.to_owned(), i);
            i
        }
    }

    pub fn index_of(&self, taxon: &str) -> Option<usize> {
        self.index.get(taxon).copied()
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(|s| s.as_str())
    }

    pub fn labels(&self) -> &[Taxon] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phylogeny::Clade;

    fn tree_with(taxa: &[Option<&str>]) -> Tree {
        let mut tree = Tree::new();
        let root = tree.root();
        for taxon in taxa {
            let clade = match taxon {
                Some(t) => Clade::with_taxon(*t),
                None => Clade::default(),
            };
            tree.add_child(root, clade, Some(1.0));
        }
        tree
    }

    #[test]
    fn from_tree_keeps_leaf_order() {
        let taxa = TaxonNamespace::from_tree(&tree_with(&[Some("C"), Some("A"), Some("B")])).unwrap();
        assert_eq!(taxa.labels(), &["C", "A", "B"]);
        assert_eq!(taxa.index_of("A"), Some(1));
        assert_eq!(taxa.index_of("D"), None);
    }

    #[test]
    fn duplicate_taxon() {
        let res = TaxonNamespace::from_tree(&tree_with(&[Some("A"), Some("A")]));
        assert_eq!(res, Err(TaxonError::DuplicateTaxon("A".to_owned())));
    }

    #[test]
    fn unlabeled_leaf() {
        let res = TaxonNamespace::from_tree(&tree_with(&[Some("A"), None]));
        assert_eq!(res, Err(TaxonError::UnlabeledLeaf));
    }
}
