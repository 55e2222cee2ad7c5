//! Mapping aggregated verdicts back onto the reference tree.
//!
//! Every edge pair that was anomalous in at least one tree is an anomaly *event*.
//! Events are numbered from 1 in the order their pairs were first observed while
//! folding trees; the numbers are display labels and carry no further meaning.
//! Both edges of an event are labelled with its number. An edge taking part in
//! several events lists all of them, separated by [`SEPARATOR`], e.g. `1/3`.
//! With bootstrap replicates each event also contributes its support fraction,
//! and the label reads `events:supports`, e.g. `1/3:0.3/1`. Supports are rounded to
//! three decimals with trailing zeros dropped (see [`format_fraction`]), so a third
//! reads `0.333`.
//! Edges outside any event get [`PLACEHOLDER`] or [`PLACEHOLDER_WITH_SUPPORT`].

use std::collections::{HashMap, HashSet};
use std::fmt::{self, Display, Formatter};

use crate::anomaly::aggregate::AggregateMap;
use crate::anomaly::pairs::{edge_pairs, EdgePair};
use crate::phylogeny::Tree;
use crate::split::{EncodedTree, Split};

pub const SEPARATOR: &str = "/";
pub const PLACEHOLDER: &str = "0";
pub const PLACEHOLDER_WITH_SUPPORT: &str = "0:0";

/// Render a fraction with at most three decimals, `0.25`, `0.333`, `1`.
///
/// ```
/// use anomaly_zone::anomaly::format_fraction;
/// assert_eq!(format_fraction(1.0 / 3.0), "0.333");
/// assert_eq!(format_fraction(0.3), "0.3");
/// assert_eq!(format_fraction(1.0), "1");
/// assert_eq!(format_fraction(0.0), "0");
/// ```
pub fn format_fraction(fraction: f64) -> String {
    let text = format!("{:.3}", fraction);
    text.trim_end_matches('0').trim_end_matches('.').to_owned()
}

/// The events an edge takes part in, with their support when replicates were used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeLabel {
    pub events: Vec<usize>,
    pub supports: Vec<f64>,
}

impl Display for EdgeLabel {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let events: Vec<String> = self.events.iter().map(|e| e.to_string()).collect();
        f.write_str(&events.join(SEPARATOR))?;
        if !self.supports.is_empty() {
            let supports: Vec<String> = self.supports.iter().map(|&s| format_fraction(s)).collect();
            write!(f, ":{}", supports.join(SEPARATOR))?;
        }
        Ok(())
    }
}

/// Labels of the edges involved in anomaly events, keyed by split.
#[derive(Debug, Clone, Default)]
pub struct LabelMap {
    labels: HashMap<Split, EdgeLabel>,
    events: HashMap<EdgePair, usize>,
    include_support: bool,
}

impl LabelMap {
    /// Label of an edge involved in at least one event.
    pub fn get(&self, split: &Split) -> Option<&EdgeLabel> {
        self.labels.get(split)
    }

    /// Label text for any edge, falling back to the placeholder.
    pub fn label(&self, split: &Split) -> String {
        match self.labels.get(split) {
            Some(label) => label.to_string(),
            None => self.placeholder().to_owned(),
        }
    }

    pub fn placeholder(&self) -> &'static str {
        if self.include_support {
            PLACEHOLDER_WITH_SUPPORT
        } else {
            PLACEHOLDER
        }
    }

    /// Event number assigned to `pair`, if it was anomalous.
    pub fn event(&self, pair: &EdgePair) -> Option<usize> {
        self.events.get(pair).copied()
    }

    /// Number of anomaly events.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Number of labelled edges.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn includes_support(&self) -> bool {
        self.include_support
    }

    fn push(&mut self, split: &Split, event: usize, support: Option<f64>) {
        let label = self.labels.entry(split.clone()).or_default();
        label.events.push(event);
        if let Some(support) = support {
            label.supports.push(support);
        }
    }
}

/// Number the anomaly events of `aggregate` that can be placed on `reference`.
///
/// Pairs that do not occur in the reference tree are ignored. When `include_support`
/// is set the anomalous fraction of each pair's verdicts is recorded as well.
pub fn annotate(reference: &EncodedTree, aggregate: &AggregateMap, include_support: bool) -> LabelMap {
    let present: HashSet<EdgePair> = edge_pairs(reference)
        .into_iter()
        .map(|(pair, _)| pair)
        .collect();

    let mut labels = LabelMap {
        include_support,
        ..Default::default()
    };
    let mut event = 0;
    for (pair, verdicts) in aggregate.iter() {
        if !verdicts.any() || !present.contains(pair) {
            continue;
        }
        event += 1;
        let support = if include_support {
            verdicts.proportion()
        } else {
            None
        };
        labels.push(&pair.parent, event, support);
        labels.push(&pair.child, event, support);
        labels.events.insert(pair.clone(), event);
    }
    labels
}

/// Copy of the reference tree with every node's annotation set to the label of the
/// edge above it. The root, which has no edge, gets the placeholder.
pub fn apply_labels(reference: &EncodedTree, labels: &LabelMap) -> Tree {
    let mut labeled = reference.tree().clone();
    for node in reference.tree().levelorder() {
        let annotation = if labeled.is_root(node) {
            labels.placeholder().to_owned()
        } else {
            labels.label(reference.split(node))
        };
        labeled.clade_mut(node).annotation = Some(annotation);
    }
    labeled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::aggregate::Aggregate;
    use crate::io::newick;
    use crate::taxa::TaxonNamespace;

    const REFERENCE: &str = "((((A:1,B:1):0.05,C:1):0.1,D:1):2.0,E:1);";

    fn annotations(tree: &Tree) -> Vec<String> {
        tree.levelorder()
            .into_iter()
            .map(|n| tree.clade(n).annotation.clone().unwrap())
            .collect()
    }

    #[test]
    fn single_tree_single_event() {
        let tree = newick::parse(REFERENCE).unwrap();
        let taxa = TaxonNamespace::from_tree(&tree).unwrap();
        let encoded = EncodedTree::encode(&tree, &taxa).unwrap();
        let mut aggregate = Aggregate::new();
        aggregate.fold_tree(&encoded);

        let labels = annotate(&encoded, &aggregate.pairs, false);
        assert_eq!(labels.event_count(), 1);
        assert_eq!(labels.len(), 2);

        let labeled = apply_labels(&encoded, &labels);
        let found = annotations(&labeled);
        assert_eq!(found.len(), tree.node_count());
        assert_eq!(found.iter().filter(|a| *a == "1").count(), 2);
        assert_eq!(found.iter().filter(|a| *a == "0").count(), tree.node_count() - 2);
        assert_eq!(labeled.clade(labeled.root()).annotation.as_deref(), Some("0"));

        // labelled edges are {A,B,C} and {A,B}
        for node in labeled.levelorder() {
            let expected = match encoded.split(node).to_string().as_str() {
                "00111" | "00011" => "1",
                _ => "0",
            };
            assert_eq!(labeled.clade(node).annotation.as_deref(), Some(expected));
        }
        // the reference itself is untouched
        assert!(tree.levelorder().into_iter().all(|n| tree.clade(n).annotation.is_none()));
    }

    #[test]
    fn shared_edge_lists_both_events() {
        // {A,B,C,D} -> {A,B,C} -> {A,B}, both pairs anomalous
        let tree = newick::parse("((((A:1,B:1):0.05,C:1):0.05,D:1):0.05,E:1);").unwrap();
        let taxa = TaxonNamespace::from_tree(&tree).unwrap();
        let encoded = EncodedTree::encode(&tree, &taxa).unwrap();
        let mut aggregate = Aggregate::new();
        aggregate.fold_tree(&encoded);

        let labels = annotate(&encoded, &aggregate.pairs, false);
        assert_eq!(labels.event_count(), 2);
        let mut abc = Split::empty(5);
        for i in 0..3 {
            abc.insert(i);
        }
        let shared = labels.get(&abc).unwrap();
        assert_eq!(shared.events.len(), 2);
        assert_eq!(labels.label(&abc), "1/2");
    }

    #[test]
    fn support_labels() {
        let reference = newick::parse(REFERENCE).unwrap();
        let taxa = TaxonNamespace::from_tree(&reference).unwrap();
        let encoded = EncodedTree::encode(&reference, &taxa).unwrap();

        let replicates: Vec<Tree> = (0..10)
            .map(|i| {
                let length = if i < 3 { 0.05 } else { 1.0 };
                newick::parse(&format!("((((A:1,B:1):{},C:1):0.1,D:1):2.0,E:1);", length)).unwrap()
            })
            .collect();
        let encoded_replicates: Vec<_> = replicates
            .iter()
            .map(|t| EncodedTree::encode(t, &taxa).unwrap())
            .collect();
        let aggregate = Aggregate::fold_trees(&encoded_replicates);

        let labels = annotate(&encoded, &aggregate.pairs, true);
        assert_eq!(labels.event_count(), 1);
        let mut ab = Split::singleton(5, 0);
        ab.insert(1);
        assert_eq!(labels.label(&ab), "1:0.3");
        assert_eq!(labels.label(&Split::singleton(5, 4)), "0:0");

        let labeled = apply_labels(&encoded, &labels);
        assert_eq!(labeled.clade(labeled.root()).annotation.as_deref(), Some("0:0"));
    }

    #[test]
    fn support_is_rounded() {
        let label = EdgeLabel {
            events: vec![1, 3],
            supports: vec![1.0 / 3.0, 2.0 / 3.0],
        };
        assert_eq!(label.to_string(), "1/3:0.333/0.667");
        let whole = EdgeLabel {
            events: vec![2],
            supports: vec![1.0],
        };
        assert_eq!(whole.to_string(), "2:1");
    }

    #[test]
    fn pairs_missing_from_reference_are_not_labelled() {
        let reference = newick::parse(REFERENCE).unwrap();
        let taxa = TaxonNamespace::from_tree(&reference).unwrap();
        let encoded = EncodedTree::encode(&reference, &taxa).unwrap();

        let replicate = newick::parse("((((A:1,C:1):0.05,B:1):0.1,D:1):2.0,E:1);").unwrap();
        let mut aggregate = Aggregate::new();
        aggregate.fold_tree(&EncodedTree::encode(&replicate, &taxa).unwrap());

        let labels = annotate(&encoded, &aggregate.pairs, true);
        assert_eq!(labels.event_count(), 0);
        assert!(labels.is_empty());
        let labeled = apply_labels(&encoded, &labels);
        assert!(annotations(&labeled).iter().all(|a| a == "0:0"));
    }
}
