//! End-to-end analysis of a reference tree and optional bootstrap replicates.

use std::fmt::{self, Display, Formatter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::anomaly::aggregate::Aggregate;
use crate::anomaly::annotate::{annotate, apply_labels, format_fraction, LabelMap};
use crate::phylogeny::{Taxon, Tree};
use crate::split::EncodedTree;
use crate::taxa::{TaxonError, TaxonNamespace};

/// How strongly a pair is supported as anomalous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PairSupport {
    /// Verdict on the reference tree alone.
    Reference(bool),
    /// Verdicts over the replicates in which the pair occurred.
    Replicates { observed: usize, anomalous: usize },
}

impl PairSupport {
    /// Anomalous fraction. `None` for a reference verdict, and for a pair that never
    /// occurred in any replicate (0/0).
    pub fn proportion(&self) -> Option<f64> {
        match *self {
            PairSupport::Reference(_) => None,
            PairSupport::Replicates { observed: 0, .. } => None,
            PairSupport::Replicates {
                observed,
                anomalous,
            } => Some(anomalous as f64 / observed as f64),
        }
    }

    pub fn is_anomalous(&self) -> bool {
        match *self {
            PairSupport::Reference(verdict) => verdict,
            PairSupport::Replicates { anomalous, .. } => anomalous > 0,
        }
    }
}

impl Display for PairSupport {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            PairSupport::Reference(verdict) => write!(f, "{}", verdict),
            PairSupport::Replicates {
                observed,
                anomalous,
            } => match self.proportion() {
                Some(p) => write!(f, "{}/{}\t{}", anomalous, observed, format_fraction(p)),
                None => write!(f, "{}/{}\tNA", anomalous, observed),
            },
        }
    }
}

/// One edge pair of the reference tree.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PairSummary {
    /// Bit string of the ancestral edge's split.
    pub parent_split: String,
    /// Bit string of the descendant edge's split.
    pub child_split: String,
    pub parent_taxa: Vec<Taxon>,
    pub child_taxa: Vec<Taxon>,
    /// Event number, if the pair is anomalous.
    pub event: Option<usize>,
    /// Fraction of replicates containing the descendant edge.
    pub child_split_support: Option<f64>,
    pub support: PairSupport,
}

impl PairSummary {
    /// Column names matching the `Display` output.
    pub fn header(replicates: bool) -> &'static str {
        if replicates {
            "event\tparent_split\tchild_split\tchild_split_support\tanomalous/observed\tsupport\tparent_taxa\tchild_taxa"
        } else {
            "event\tparent_split\tchild_split\tanomalous\tparent_taxa\tchild_taxa"
        }
    }
}

/// Tab separated line, see [`PairSummary::header`](#method.header).
impl Display for PairSummary {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.event {
            Some(event) => write!(f, "{}", event)?,
            None => f.write_str("-")?,
        }
        write!(f, "\t{}\t{}", self.parent_split, self.child_split)?;
        if let PairSupport::Replicates { .. } = self.support {
            match self.child_split_support {
                Some(s) => write!(f, "\t{}", format_fraction(s))?,
                None => f.write_str("\tNA")?,
            }
        }
        write!(
            f,
            "\t{}\t{}\t{}",
            self.support,
            self.parent_taxa.join(","),
            self.child_taxa.join(",")
        )
    }
}

/// Everything found for a reference tree.
#[derive(Debug, Clone)]
pub struct AnomalyReport {
    /// Copy of the reference tree with every edge annotated.
    pub tree: Tree,
    pub labels: LabelMap,
    /// Edge pairs of the reference tree, in the order they were found.
    pub pairs: Vec<PairSummary>,
    /// Number of bootstrap replicates analysed.
    pub replicates: usize,
}

impl AnomalyReport {
    /// Summaries of the anomalous pairs only.
    pub fn events(&self) -> impl Iterator<Item = &PairSummary> + '_ {
        self.pairs.iter().filter(|p| p.event.is_some())
    }
}

/// Header line followed by one line per edge pair of the reference tree,
/// anomalous or not.
impl Display for AnomalyReport {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        writeln!(f, "{}", PairSummary::header(self.replicates > 0))?;
        for summary in &self.pairs {
            writeln!(f, "{}", summary)?;
        }
        Ok(())
    }
}

/// Search a reference tree for anomaly zone events.
///
/// Without replicates, events are the pairs that are anomalous on the reference tree.
/// With replicates, events are the reference pairs that are anomalous in at least one
/// replicate, supported by the fraction of replicates containing the pair in which it
/// is anomalous. Every replicate must carry exactly the reference taxa.
///
/// ```
/// use anomaly_zone::anomaly::find_anomalies;
/// use anomaly_zone::io::newick;
///
/// let reference = newick::parse("((((A:1,B:1):0.05,C:1):0.1,D:1):2.0,E:1);").unwrap();
/// let report = find_anomalies(&reference, &[]).unwrap();
/// assert_eq!(report.events().count(), 1);
/// assert_eq!(
///     newick::write(&report.tree),
///     "((((A[&anomaly=\"0\"]:1,B[&anomaly=\"0\"]:1)[&anomaly=\"1\"]:0.05,C[&anomaly=\"0\"]:1)[&anomaly=\"1\"]:0.1,\
///      D[&anomaly=\"0\"]:1)[&anomaly=\"0\"]:2,E[&anomaly=\"0\"]:1)[&anomaly=\"0\"];"
/// );
/// ```
pub fn find_anomalies(reference: &Tree, replicates: &[Tree]) -> Result<AnomalyReport, TaxonError> {
    let taxa = TaxonNamespace::from_tree(reference)?;
    let encoded = EncodedTree::encode(reference, &taxa)?;
    let mut own = Aggregate::new();
    own.fold_tree(&encoded);

    let replicate_aggregate = if replicates.is_empty() {
        None
    } else {
        let encoded_replicates = replicates
            .iter()
            .enumerate()
            .map(|(i, tree)| {
                EncodedTree::encode(tree, &taxa).map_err(|e| {
                    warn!("replicate {} does not match the reference taxa: {}", i + 1, e);
                    e
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Some(fold(&encoded_replicates))
    };

    let labels = match replicate_aggregate {
        Some(ref aggregate) => annotate(&encoded, &aggregate.pairs, true),
        None => annotate(&encoded, &own.pairs, false),
    };
    let tree = apply_labels(&encoded, &labels);

    let pairs = own
        .pairs
        .iter()
        .map(|(pair, verdicts)| {
            let (support, child_split_support) = match replicate_aggregate {
                Some(ref aggregate) => {
                    let (observed, anomalous) = aggregate
                        .pairs
                        .get(pair)
                        .map_or((0, 0), |v| (v.len(), v.anomalous()));
                    (
                        PairSupport::Replicates {
                            observed,
                            anomalous,
                        },
                        aggregate.split_support(&pair.child),
                    )
                }
                None => (PairSupport::Reference(verdicts.any()), None),
            };
            PairSummary {
                parent_split: pair.parent.to_string(),
                child_split: pair.child.to_string(),
                parent_taxa: to_owned(pair.parent.taxa(&taxa)),
                child_taxa: to_owned(pair.child.taxa(&taxa)),
                event: labels.event(pair),
                child_split_support,
                support,
            }
        })
        .collect();

    info!(
        "{} edge pairs, {} anomaly events, {} replicates",
        own.pairs.len(),
        labels.event_count(),
        replicates.len()
    );
    Ok(AnomalyReport {
        tree,
        labels,
        pairs,
        replicates: replicates.len(),
    })
}

#[cfg(feature = "parallel")]
fn fold(trees: &[EncodedTree]) -> Aggregate {
    Aggregate::par_fold_trees(trees)
}

#[cfg(not(feature = "parallel"))]
fn fold(trees: &[EncodedTree]) -> Aggregate {
    Aggregate::fold_trees(trees)
}

fn to_owned(taxa: Vec<&str>) -> Vec<Taxon> {
    taxa.into_iter().map(|t| t.to_owned()).collect()
}
