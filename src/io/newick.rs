//! Newick format reader and writer.
//!
//! Supports the usual grammar:
//! ```text
//! tree     = subtree ';'
//! subtree  = '(' subtree (',' subtree)* ')' name? (':' length)? | name (':' length)?
//! ```
//! Names may be single-quoted (`'Scincus scincus'`, with `''` for a literal quote).
//! Bracketed comments such as `[&R]` are skipped. Names of leaves become taxa,
//! names of internal nodes become labels.
//!
//! ```
//! use anomaly_zone::io::newick;
//! let tree: anomaly_zone::phylogeny::Tree = "((A:0.2,'B b':0.2)90:0.1,C:0.3);".parse().unwrap();
//! assert_eq!(tree.leaves().len(), 3);
//! assert_eq!(newick::write(&tree), "((A:0.2,'B b':0.2)90:0.1,C:0.3);");
//! ```

use std::str::FromStr;

use thiserror::Error;

use petgraph::graph::NodeIndex;

use crate::phylogeny::{Clade, Proximity, Tree};

/// Annotation key used when writing edge labels as comments.
pub const ANNOTATION_KEY: &str = "anomaly";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseTreeError {
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("expected '{expected}' at byte {pos}, found '{found}'")]
    Expected {
        expected: char,
        found: char,
        pos: usize,
    },
    #[error("invalid branch length {0:?}")]
    BranchLength(String),
    #[error("unterminated quoted name")]
    UnterminatedQuote,
    #[error("unterminated comment")]
    UnterminatedComment,
    #[error("no tree found")]
    Empty,
}

/// Parse a single tree.
pub fn parse(text: &str) -> Result<Tree, ParseTreeError> {
    let mut parser = Parser::new(text);
    parser.skip_filler()?;
    if parser.at_end() {
        return Err(ParseTreeError::Empty);
    }
    parser.tree()
}

/// Parse all trees of a text, each terminated by `;`.
pub fn parse_all(text: &str) -> Result<Vec<Tree>, ParseTreeError> {
    let mut parser = Parser::new(text);
    let mut trees = Vec::new();
    loop {
        parser.skip_filler()?;
        if parser.at_end() {
            break;
        }
        trees.push(parser.tree()?);
    }
    Ok(trees)
}

impl FromStr for Tree {
    type Err = ParseTreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Write a tree in Newick format. Node annotations are written as
/// `[&anomaly="..."]` comments after the node name.
pub fn write(tree: &Tree) -> String {
    enum Step {
        Enter(NodeIndex),
        Close(NodeIndex),
        Comma,
    }

    let mut buf = String::new();
    let mut steps = vec![Step::Enter(tree.root())];
    while let Some(step) = steps.pop() {
        match step {
            Step::Enter(node) => {
                let children = tree.children(node);
                if children.is_empty() {
                    write_label(tree, node, &mut buf);
                } else {
                    buf.push('(');
                    steps.push(Step::Close(node));
                    for (i, &child) in children.iter().enumerate().rev() {
                        steps.push(Step::Enter(child));
                        if i > 0 {
                            steps.push(Step::Comma);
                        }
                    }
                }
            }
            Step::Close(node) => {
                buf.push(')');
                write_label(tree, node, &mut buf);
            }
            Step::Comma => buf.push(','),
        }
    }
    buf.push(';');
    buf
}

// Name, annotation and length of `node`.
fn write_label(tree: &Tree, node: NodeIndex, buf: &mut String) {
    let clade = tree.clade(node);
    if let Some(name) = clade.taxon.as_ref().or_else(|| clade.label.as_ref()) {
        buf.push_str(&quote(name));
    }
    if let Some(annotation) = clade.annotation.as_ref() {
        buf.push_str(&format!("[&{}=\"{}\"]", ANNOTATION_KEY, annotation));
    }
    let length = if tree.is_root(node) {
        tree.root_length()
    } else {
        tree.edge_length(node)
    };
    if let Some(length) = length {
        buf.push_str(&format!(":{}", length));
    }
}

/// Quote a name if it contains characters with a meaning in Newick.
pub fn quote(name: &str) -> String {
    let special = |c: char| c.is_whitespace() || "()[]':;,".contains(c);
    if name.is_empty() || name.chars().any(special) {
        format!("'{}'", name.replace('\'', "''"))
    } else {
        name.to_owned()
    }
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Parser {
            input: text.as_bytes(),
            pos: 0,
        }
    }

    // Nodes still waiting for their closing parenthesis are kept on `open`
    // rather than on the call stack, so nesting depth is only bounded by memory.
    fn tree(&mut self) -> Result<Tree, ParseTreeError> {
        let mut tree = Tree::new();
        let mut open: Vec<NodeIndex> = Vec::new();
        let mut node = tree.root();
        loop {
            self.skip_filler()?;
            while self.peek() == Some(b'(') {
                self.pos += 1;
                open.push(node);
                node = tree.add_child(node, Clade::default(), None);
                self.skip_filler()?;
            }
            self.label(&mut tree, node)?;

            // Close finished subtrees until a sibling follows or the root is done.
            loop {
                self.skip_filler()?;
                let parent = match open.last() {
                    Some(&parent) => parent,
                    None => {
                        self.expect(b';')?;
                        return Ok(tree);
                    }
                };
                if self.peek() == Some(b',') {
                    self.pos += 1;
                    node = tree.add_child(parent, Clade::default(), None);
                    break;
                }
                self.expect(b')')?;
                open.pop();
                node = parent;
                self.label(&mut tree, node)?;
            }
        }
    }

    // Name and branch length following a leaf or a closing parenthesis.
    fn label(&mut self, tree: &mut Tree, node: NodeIndex) -> Result<(), ParseTreeError> {
        self.skip_filler()?;
        if let Some(name) = self.name()? {
            let internal = !tree.is_leaf(node);
            let clade = tree.clade_mut(node);
            if internal {
                clade.label = Some(name);
            } else {
                clade.taxon = Some(name);
            }
        }

        self.skip_filler()?;
        if self.peek() == Some(b':') {
            self.pos += 1;
            self.skip_filler()?;
            let length = self.length()?;
            tree.set_edge_length(node, Some(length));
        }
        Ok(())
    }

    fn name(&mut self) -> Result<Option<String>, ParseTreeError> {
        if self.peek() == Some(b'\'') {
            self.pos += 1;
            let mut name = Vec::new();
            loop {
                match self.peek() {
                    None => return Err(ParseTreeError::UnterminatedQuote),
                    Some(b'\'') if self.input.get(self.pos + 1) == Some(&b'\'') => {
                        name.push(b'\'');
                        self.pos += 2;
                    }
                    Some(b'\'') => {
                        self.pos += 1;
                        break;
                    }
                    Some(c) => {
                        name.push(c);
                        self.pos += 1;
                    }
                }
            }
            return Ok(Some(String::from_utf8_lossy(&name).into_owned()));
        }

        let start = self.pos;
        while let Some(c) = self.peek() {
            match c {
                b':' | b',' | b')' | b'(' | b';' | b'[' => break,
                c if c.is_ascii_whitespace() => break,
                _ => self.pos += 1,
            }
        }
        if self.pos == start {
            Ok(None)
        } else {
            Ok(Some(
                String::from_utf8_lossy(&self.input[start..self.pos]).into_owned(),
            ))
        }
    }

    fn length(&mut self) -> Result<Proximity, ParseTreeError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            match c {
                b'0'..=b'9' | b'.' | b'-' | b'+' | b'e' | b'E' => self.pos += 1,
                _ => break,
            }
        }
        let text = String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();
        text.parse()
            .map_err(|_| ParseTreeError::BranchLength(text))
    }

    fn expect(&mut self, expected: u8) -> Result<(), ParseTreeError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(ParseTreeError::Expected {
                expected: expected as char,
                found: c as char,
                pos: self.pos,
            }),
            None => Err(ParseTreeError::UnexpectedEnd),
        }
    }

    // Skip whitespace and bracketed comments.
    fn skip_filler(&mut self) -> Result<(), ParseTreeError> {
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_whitespace() => self.pos += 1,
                Some(b'[') => {
                    let mut depth = 0;
                    loop {
                        match self.peek() {
                            None => return Err(ParseTreeError::UnterminatedComment),
                            Some(b'[') => depth += 1,
                            Some(b']') => {
                                depth -= 1;
                                if depth == 0 {
                                    self.pos += 1;
                                    break;
                                }
                            }
                            _ => (),
                        }
                        self.pos += 1;
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }
}
