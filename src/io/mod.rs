//! Reading and writing trees in Newick and NEXUS format.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use strum_macros::{AsRefStr, Display};
use thiserror::Error;

use crate::phylogeny::Tree;

pub mod newick;
pub mod nexus;

pub use self::newick::ParseTreeError;
pub use self::nexus::NexusError;

/// Supported tree file formats.
///
/// ```rust
/// use anomaly_zone::io::TreeFormat;
///
/// assert_eq!("NEXUS".parse::<TreeFormat>().unwrap(), TreeFormat::Nexus);
/// assert_eq!(TreeFormat::Newick.to_string(), "newick");
/// assert!("phylip".parse::<TreeFormat>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum TreeFormat {
    #[strum(serialize = "newick")]
    Newick,
    #[strum(serialize = "nexus")]
    Nexus,
}

impl Default for TreeFormat {
    fn default() -> Self {
        TreeFormat::Newick
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported tree format {0:?}, expected \"newick\" or \"nexus\"")]
pub struct UnknownFormat(pub String);

impl FromStr for TreeFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "newick" => Ok(TreeFormat::Newick),
            "nexus" => Ok(TreeFormat::Nexus),
            _ => Err(UnknownFormat(s.to_owned())),
        }
    }
}

#[derive(Error, Debug)]
pub enum ReadTreeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Newick parse error: {0}")]
    Newick(#[from] ParseTreeError),
    #[error("NEXUS parse error: {0}")]
    Nexus(#[from] NexusError),
    #[error("no trees found")]
    Empty,
}

/// Parse every tree of a document.
pub fn parse_trees(text: &str, format: TreeFormat) -> Result<Vec<Tree>, ReadTreeError> {
    let trees = match format {
        TreeFormat::Newick => newick::parse_all(text)?,
        TreeFormat::Nexus => nexus::parse(text)?,
    };
    if trees.is_empty() {
        Err(ReadTreeError::Empty)
    } else {
        Ok(trees)
    }
}

/// Read every tree of a file. A file without any tree is an error.
pub fn read_trees<P: AsRef<Path>>(path: P, format: TreeFormat) -> Result<Vec<Tree>, ReadTreeError> {
    let text = fs::read_to_string(path)?;
    parse_trees(&text, format)
}

/// Render a single tree as a complete document in the given format.
pub fn write_tree(tree: &Tree, format: TreeFormat) -> String {
    match format {
        TreeFormat::Newick => {
            let mut text = newick::write(tree);
            text.push('\n');
            text
        }
        TreeFormat::Nexus => nexus::write(std::slice::from_ref(tree)),
    }
}
