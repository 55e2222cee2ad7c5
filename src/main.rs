//! `anomaly-finder`: report anomaly zone events of a species tree.
//!
//! ```text
//! anomaly-finder -t species.tre -f newick -b bootstraps.tre -o anomaly_zones.tre
//! ```

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use anomaly_zone::anomaly::{find_anomalies, PairSummary};
use anomaly_zone::io::{self, TreeFormat};

const CITATION: &str = "\
Please cite:
  Linkem, C. W., Minin, V. N., & Leache, A. D. (2016). Detecting the anomaly zone in
  species trees and evidence for a misleading signal in higher-level skink phylogeny
  (Squamata: Scincidae). Systematic Biology, 65(3), 465-477.

The anomaly zone boundary is from:
  Degnan, J. H., & Rosenberg, N. A. (2006). Discordance of species trees with their
  most likely gene trees. PLoS Genetics, 2(5), e68.";

#[derive(Parser, Debug)]
#[command(name = "anomaly-finder")]
#[command(about = "Find pairs of internal branches of a species tree that lie in the anomaly zone")]
#[command(version)]
struct Cli {
    /// Species tree, branch lengths in coalescent units
    #[arg(short = 't', long = "tree", value_name = "FILE")]
    tree: Option<PathBuf>,

    /// Format of the tree files
    #[arg(short = 'f', long = "format", value_enum, default_value_t = TreeFormat::Newick)]
    format: TreeFormat,

    /// Bootstrap replicates of the species tree, same taxa and format
    #[arg(short = 'b', long = "bootstraps", value_name = "FILE")]
    bootstraps: Option<PathBuf>,

    /// Where to write the annotated species tree
    #[arg(short = 'o', long = "output", value_name = "FILE", default_value = "anomaly_zones.tre")]
    output: PathBuf,

    /// Only list edge pairs that are anomaly events
    #[arg(long)]
    events_only: bool,

    /// Print the references to cite and exit
    #[arg(long)]
    citation: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.citation {
        println!("{}", CITATION);
        return Ok(());
    }
    let tree_path = match cli.tree {
        Some(ref path) => path,
        None => Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "the species tree is required: -t/--tree <FILE>",
            )
            .exit(),
    };

    let mut trees = io::read_trees(tree_path, cli.format)
        .with_context(|| format!("failed to read species tree {}", tree_path.display()))?;
    if trees.len() > 1 {
        warn!(
            "{} contains {} trees, only the first is analysed",
            tree_path.display(),
            trees.len()
        );
    }
    let reference = trees.swap_remove(0);

    let replicates = match cli.bootstraps {
        Some(ref path) => {
            let replicates = io::read_trees(path, cli.format)
                .with_context(|| format!("failed to read bootstrap trees {}", path.display()))?;
            info!("read {} bootstrap replicates", replicates.len());
            replicates
        }
        None => Vec::new(),
    };

    let report = find_anomalies(&reference, &replicates)
        .context("taxa of the input trees are inconsistent")?;

    if cli.events_only {
        println!("{}", PairSummary::header(report.replicates > 0));
        for summary in report.events() {
            println!("{}", summary);
        }
    } else {
        print!("{}", report);
    }
    if report.events().next().is_none() {
        info!("no anomaly zone events found");
    }

    fs::write(&cli.output, io::write_tree(&report.tree, cli.format))
        .with_context(|| format!("failed to write {}", cli.output.display()))?;
    info!("annotated tree written to {}", cli.output.display());
    Ok(())
}
