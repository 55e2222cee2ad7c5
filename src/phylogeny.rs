// Copyright 2020 Franklin Delehelle
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! A phylogenetic tree is represented as a rooted, directed graph.
//! Edges point from parent to child. Leaves carry a taxon, internal nodes may carry
//! a free-form label (e.g. a support value read from Newick).
//! Each edge is weighted by the phylogenetic distance if it was defined, or `None` otherwise.
//!
//! # Example
//!
//! ```rust
//! use anomaly_zone::phylogeny::{Clade, Tree};
//!
//! // ((A:1,B:1):0.5,C:1.5);
//! let mut tree = Tree::new();
//! let root = tree.root();
//! let ab = tree.add_child(root, Clade::default(), Some(0.5));
//! tree.add_child(ab, Clade::with_taxon("A"), Some(1.0));
//! tree.add_child(ab, Clade::with_taxon("B"), Some(1.0));
//! tree.add_child(root, Clade::with_taxon("C"), Some(1.5));
//!
//! assert_eq!(tree.leaves().len(), 3);
//! assert_eq!(tree.edge_length(ab), Some(0.5));
//! assert_eq!(tree.parent(ab), Some(root));
//! ```

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, DfsPostOrder, EdgeRef};
use petgraph::Direction;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub type Taxon = String;
pub type Proximity = f64;

/// Node payload.
#[derive(new, Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Clade {
    /// Taxon name, set on leaves only.
    pub taxon: Option<Taxon>,
    /// Internal node label as found in the input (e.g. a support value).
    pub label: Option<String>,
    /// Annotation describing the edge above this node, written as a comment on output.
    pub annotation: Option<String>,
}

impl Clade {
    /// A leaf payload for the given taxon.
    pub fn with_taxon<T: Into<Taxon>>(taxon: T) -> Self {
        Clade {
            taxon: Some(taxon.into()),
            ..Default::default()
        }
    }
}

/// Edge payload: the length of the branch leading to the child node.
#[derive(new, Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Branch {
    pub length: Option<Proximity>,
}

/// A rooted, ordered phylogenetic tree.
#[derive(Debug, Clone)]
pub struct Tree {
    graph: DiGraph<Clade, Branch>,
    root: NodeIndex,
    root_length: Option<Proximity>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create a tree consisting of an unlabeled root.
    pub fn new() -> Self {
        let mut graph = DiGraph::new();
        let root = graph.add_node(Clade::default());
        Tree {
            graph,
            root,
            root_length: None,
        }
    }

    /// Attach a new child below `parent`, returning its index.
    /// Children keep the order in which they were added.
    pub fn add_child(
        &mut self,
        parent: NodeIndex,
        clade: Clade,
        length: Option<Proximity>,
    ) -> NodeIndex {
        let child = self.graph.add_node(clade);
        self.graph.add_edge(parent, child, Branch::new(length));
        child
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// Length given to the root in the input. It never takes part in any pair,
    /// the root has no edge, but it is kept for writing the tree back out.
    pub fn root_length(&self) -> Option<Proximity> {
        self.root_length
    }

    pub fn set_root_length(&mut self, length: Option<Proximity>) {
        self.root_length = length;
    }

    /// Parent of `node`, or `None` for the root.
    pub fn parent(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(node, Direction::Incoming)
            .next()
    }

    /// Children of `node` in insertion order.
    pub fn children(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|edge| (edge.id(), edge.target()))
            .collect();
        edges.sort_by_key(|&(id, _)| id);
        edges.into_iter().map(|(_, target)| target).collect()
    }

    /// Length of the edge leading into `node`. The root has no edge and always yields `None`.
    pub fn edge_length(&self, node: NodeIndex) -> Option<Proximity> {
        self.graph
            .edges_directed(node, Direction::Incoming)
            .next()
            .and_then(|edge| edge.weight().length)
    }

    /// Set the length of the edge leading into `node`. For the root this sets the root length.
    pub fn set_edge_length(&mut self, node: NodeIndex, length: Option<Proximity>) {
        let edge = self
            .graph
            .edges_directed(node, Direction::Incoming)
            .next()
            .map(|edge| edge.id());
        match edge {
            Some(edge) => self.graph[edge].length = length,
            None => self.root_length = length,
        }
    }

    pub fn clade(&self, node: NodeIndex) -> &Clade {
        &self.graph[node]
    }

    pub fn clade_mut(&mut self, node: NodeIndex) -> &mut Clade {
        &mut self.graph[node]
    }

    pub fn is_root(&self, node: NodeIndex) -> bool {
        node == self.root
    }

    pub fn is_leaf(&self, node: NodeIndex) -> bool {
        self.graph
            .neighbors_directed(node, Direction::Outgoing)
            .next()
            .is_none()
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// All leaves, in the order they were added to the tree. For parsed trees this is the
    /// left-to-right order of the input.
    pub fn leaves(&self) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&node| self.is_leaf(node) && !self.is_root(node))
            .collect()
    }

    /// All nodes, every child before its parent. The root comes last.
    pub fn postorder(&self) -> Vec<NodeIndex> {
        let mut dfs = DfsPostOrder::new(&self.graph, self.root);
        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(node) = dfs.next(&self.graph) {
            order.push(node);
        }
        order
    }

    /// All nodes, level by level starting at the root.
    pub fn levelorder(&self) -> Vec<NodeIndex> {
        let mut bfs = Bfs::new(&self.graph, self.root);
        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(node) = bfs.next(&self.graph) {
            order.push(node);
        }
        order
    }
}
