//! Reading trees from and writing trees to the TREES block of a NEXUS file.
//!
//! Only what is needed to exchange trees is understood: the `#NEXUS` header,
//! `BEGIN TREES; ... END;`, an optional `TRANSLATE` table and `TREE` statements.
//! All other blocks are skipped.
//!
//! ```
//! use anomaly_zone::io::nexus;
//! let trees = nexus::parse(
//!     "#NEXUS
//!      begin trees;
//!          translate 1 Scincus, 2 Eumeces, 3 Plestiodon;
//!          tree rep1 = [&R] ((1:0.1,2:0.1):0.2,3:0.3);
//!      end;",
//! )
//! .unwrap();
//! assert_eq!(trees.len(), 1);
//! let tree = &trees[0];
//! let first = tree.leaves()[0];
//! assert_eq!(tree.clade(first).taxon.as_deref(), Some("Scincus"));
//! ```

use std::collections::HashMap;

use regex::Regex;
use thiserror::Error;

use crate::io::newick::{self, ParseTreeError};
use crate::phylogeny::Tree;

const HEADER: &str = "#NEXUS";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NexusError {
    #[error("missing #NEXUS header")]
    MissingHeader,
    #[error("no TREES block found")]
    NoTreesBlock,
    #[error("invalid TRANSLATE entry {0:?}")]
    Translate(String),
    #[error("invalid TREE statement {0:?}")]
    Statement(String),
    #[error("unterminated comment")]
    UnterminatedComment,
    #[error("tree {name}: {source}")]
    Tree {
        name: String,
        #[source]
        source: ParseTreeError,
    },
}

/// Parse all trees in the TREES blocks of a NEXUS document.
pub fn parse(text: &str) -> Result<Vec<Tree>, NexusError> {
    lazy_static! {
        static ref TREE_RE: Regex =
            Regex::new(r"(?is)^u?tree\s+(?:\*\s*)?(.+?)\s*=\s*(.+)$").unwrap();
    }

    let text = text.trim_start();
    let has_header = text
        .get(..HEADER.len())
        .map_or(false, |h| h.eq_ignore_ascii_case(HEADER));
    if !has_header {
        return Err(NexusError::MissingHeader);
    }
    let text = strip_comments(&text[HEADER.len()..])?;

    let mut in_trees = false;
    let mut seen_trees_block = false;
    let mut translation: HashMap<String, String> = HashMap::new();
    let mut trees = Vec::new();

    for statement in statements(&text).into_iter().map(str::trim) {
        let mut words = statement.split_whitespace();
        let command = words
            .next()
            .map(|w| w.to_ascii_lowercase())
            .unwrap_or_default();
        match command.as_str() {
            "begin" => {
                in_trees = words
                    .next()
                    .map_or(false, |block| block.eq_ignore_ascii_case("trees"));
                seen_trees_block |= in_trees;
                translation.clear();
            }
            "end" | "endblock" => in_trees = false,
            "translate" if in_trees => {
                let body = statement["translate".len()..].trim();
                for entry in body.split(',').map(str::trim).filter(|e| !e.is_empty()) {
                    let mut parts = entry.splitn(2, char::is_whitespace);
                    match (parts.next(), parts.next()) {
                        (Some(key), Some(taxon)) => {
                            translation.insert(unquote(key), unquote(taxon.trim()));
                        }
                        _ => return Err(NexusError::Translate(entry.to_owned())),
                    }
                }
            }
            "tree" | "utree" if in_trees => {
                let caps = TREE_RE
                    .captures(statement)
                    .ok_or_else(|| NexusError::Statement(statement.to_owned()))?;
                let name = unquote(&caps[1]);
                let mut tree = newick::parse(&format!("{};", &caps[2])).map_err(|source| {
                    NexusError::Tree {
                        name: name.clone(),
                        source,
                    }
                })?;
                translate(&mut tree, &translation);
                debug!("read tree {}", name);
                trees.push(tree);
            }
            _ => (),
        }
    }

    if !seen_trees_block {
        return Err(NexusError::NoTreesBlock);
    }
    Ok(trees)
}

/// Write trees as a NEXUS document with a single TREES block.
pub fn write(trees: &[Tree]) -> String {
    let mut buf = format!("{}\n\nbegin trees;\n", HEADER);
    for (i, tree) in trees.iter().enumerate() {
        buf.push_str(&format!("\ttree tree_{} = [&R] {}\n", i + 1, newick::write(tree)));
    }
    buf.push_str("end;\n");
    buf
}

fn translate(tree: &mut Tree, translation: &HashMap<String, String>) {
    if translation.is_empty() {
        return;
    }
    for leaf in tree.leaves() {
        let clade = tree.clade_mut(leaf);
        if let Some(taxon) = clade.taxon.as_ref().and_then(|t| translation.get(t)) {
            clade.taxon = Some(taxon.clone());
        }
    }
}

fn unquote(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') {
        s[1..s.len() - 1].replace("''", "'")
    } else {
        s.to_owned()
    }
}

// Remove bracketed comments outside of quotes.
fn strip_comments(text: &str) -> Result<String, NexusError> {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    let mut quoted = false;
    for c in text.chars() {
        match c {
            '[' if !quoted => depth += 1,
            ']' if !quoted && depth > 0 => depth -= 1,
            _ if depth > 0 => (),
            '\'' => {
                quoted = !quoted;
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    if depth > 0 {
        return Err(NexusError::UnterminatedComment);
    }
    Ok(out)
}

// Split on ';' outside of quotes.
fn statements(text: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut quoted = false;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '\'' => quoted = !quoted,
            ';' if !quoted => {
                statements.push(&text[start..i]);
                start = i + 1;
            }
            _ => (),
        }
    }
    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOTSTRAPS: &str = "#NEXUS
[written by hand]
begin taxa;
    dimensions ntax=4;
    taxlabels A B C D;
end;

begin trees;
    translate
        1 A,
        2 B,
        3 'C c',
        4 D
    ;
    tree STATE_0 = [&lnP=-10.5] (((1:1,2:1):0.1,3:1):0.2,4:1);
    TREE * STATE_1 = [&R] (((1:1,3:1):0.1,2:1):0.2,4:1);
end;
";

    fn taxa(tree: &Tree) -> Vec<String> {
        tree.leaves()
            .into_iter()
            .map(|n| tree.clade(n).taxon.clone().unwrap())
            .collect()
    }

    #[test]
    fn trees_with_translation() {
        let trees = parse(BOOTSTRAPS).unwrap();
        assert_eq!(trees.len(), 2);
        assert_eq!(taxa(&trees[0]), vec!["A", "B", "C c", "D"]);
        assert_eq!(taxa(&trees[1]), vec!["A", "C c", "B", "D"]);
        let inner = trees[0].children(trees[0].root())[0];
        assert_eq!(trees[0].edge_length(inner), Some(0.2));
    }

    #[test]
    fn without_translation() {
        let trees = parse("#nexus\nBEGIN TREES;\nTREE t1 = ((A,B),C);\nEND;").unwrap();
        assert_eq!(taxa(&trees[0]), vec!["A", "B", "C"]);
    }

    #[test]
    fn errors() {
        assert_eq!(parse("(A,B);").unwrap_err(), NexusError::MissingHeader);
        assert_eq!(
            parse("#NEXUS\nbegin taxa;\nend;").unwrap_err(),
            NexusError::NoTreesBlock
        );
        assert_eq!(
            parse("#NEXUS\nbegin trees;\ntranslate 1;\nend;").unwrap_err(),
            NexusError::Translate("1".to_owned())
        );
        match parse("#NEXUS\nbegin trees;\ntree t1 = ((A,B),C;\nend;") {
            Err(NexusError::Tree { name, .. }) => assert_eq!(name, "t1"),
            other => panic!("unexpected {:?}", other.map(|t| t.len())),
        }
        assert_eq!(
            parse("#NEXUS\nbegin trees; [oops\nend;").unwrap_err(),
            NexusError::UnterminatedComment
        );
    }

    #[test]
    fn write_then_read() {
        let trees = parse(BOOTSTRAPS).unwrap();
        let text = write(&trees);
        assert!(text.starts_with("#NEXUS"));
        let again = parse(&text).unwrap();
        assert_eq!(again.len(), 2);
        assert_eq!(newick::write(&again[1]), newick::write(&trees[1]));
    }
}
