//! Detection of anomaly zone events in species trees.
//!
//! An anomaly zone event is a pair of consecutive internal branches, given in
//! coalescent units, short enough that the most probable gene tree topology disagrees
//! with the species tree. This crate reads species trees in Newick or NEXUS format,
//! finds such pairs on a reference tree, measures how often they recur in bootstrap
//! replicates, and writes the reference tree back with every edge annotated.
//!
//! * [`phylogeny`](phylogeny/index.html): rooted trees on top of petgraph.
//! * [`taxa`](taxa/index.html) and [`split`](split/index.html): leaf sets encoded as
//!   bit masks, used to recognise the same edge across trees.
//! * [`anomaly`](anomaly/index.html): the boundary test, edge pairs, aggregation over
//!   replicates and annotation.
//! * [`io`](io/index.html): Newick and NEXUS readers and writers.

#[macro_use]
extern crate derive_new;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate tracing;

pub mod anomaly;
pub mod io;
pub mod phylogeny;
pub mod split;
pub mod taxa;
