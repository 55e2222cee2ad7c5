// Copyright 2021 Johannes Köster.
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Detection of anomaly zone events in species trees.
//!
//! Branch lengths must be given in coalescent units. For every internal edge whose
//! parent edge is internal as well, the pair of lengths is tested against the
//! boundary of Degnan & Rosenberg (2006) ([`is_anomalous`](fn.is_anomalous.html)).
//! Verdicts are collected per edge pair over one or many trees
//! ([`Aggregate`](struct.Aggregate.html)), and anomalous pairs are written back onto
//! the reference tree as numbered events ([`annotate`](fn.annotate.html)).
//!
//! The whole procedure is bundled in [`find_anomalies`](fn.find_anomalies.html):
//!
//! ```
//! use anomaly_zone::anomaly::find_anomalies;
//! use anomaly_zone::io::newick;
//!
//! let reference = newick::parse("((((A:1,B:1):0.05,C:1):0.1,D:1):2.0,E:1);").unwrap();
//! let replicates = newick::parse_all(
//!     "((((A:1,B:1):0.05,C:1):0.1,D:1):2.0,E:1);
//!      ((((A:1,B:1):0.50,C:1):0.1,D:1):2.0,E:1);",
//! )
//! .unwrap();
//!
//! let report = find_anomalies(&reference, &replicates).unwrap();
//! let event = report.events().next().unwrap();
//! assert_eq!(event.child_taxa, vec!["A", "B"]);
//! assert_eq!(event.support.proportion(), Some(0.5));
//! ```
//!
//! References:
//!
//! * Degnan, J. H., & Rosenberg, N. A. (2006). Discordance of species trees with their
//!   most likely gene trees. PLoS Genetics, 2(5), e68.
//! * Linkem, C. W., Minin, V. N., & Leaché, A. D. (2016). Detecting the anomaly zone in
//!   species trees and evidence for a misleading signal in higher-level skink phylogeny
//!   (Squamata: Scincidae). Systematic Biology, 65(3), 465-477.

pub mod aggregate;
pub mod annotate;
pub mod pairs;
pub mod report;
pub mod threshold;

pub use self::aggregate::{Aggregate, AggregateMap, SplitOccurrence, Verdicts};
pub use self::annotate::{annotate, apply_labels, format_fraction, EdgeLabel, LabelMap};
pub use self::pairs::{edge_pairs, EdgePair, Verdict};
pub use self::report::{find_anomalies, AnomalyReport, PairSummary, PairSupport};
pub use self::threshold::{anomaly_boundary, is_anomalous};
