//! Amber-style atom masks.
//!
//! A mask selects atoms from a [`Topology`]. Supported syntax:
//!
//! - `:1-3,7` / `:ALA,GLY` residues by 1-based position or by name
//! - `@1-10` / `@CA,CB` atoms by 1-based position or by name
//! - `:1-3@CA` atoms named `CA` inside residues 1 to 3
//! - `*` every atom
//! - `!`, `&`, `|` and parentheses, with `!` binding tightest and `|` loosest
//!
//! Names may use `*` (any run of characters) and `?` (one character).

use std::fmt;
use std::str::FromStr;

use crate::error::TrajError;
use crate::topology::Topology;

#[derive(Debug, Clone, PartialEq)]
enum Item {
    /// Inclusive, 1-based range
    Number(usize, usize),
    Name(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    All,
    Residues(Vec<Item>),
    Atoms(Vec<Item>),
    Not(Box<Node>),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
}

/// A parsed atom selection
#[derive(Debug, Clone, PartialEq)]
pub struct AtomMask {
    source: String,
    root: Node,
}

impl AtomMask {
    pub fn parse(mask: &str) -> Result<Self, TrajError> {
        let mut parser = MaskParser::new(mask);
        let root = parser.parse_or()?;
        parser.skip_whitespace();
        if let Some(c) = parser.peek() {
            return Err(parser.error(format!("unexpected '{c}' at position {}", parser.pos)));
        }
        Ok(AtomMask {
            source: mask.to_string(),
            root,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Indices of the selected atoms, in increasing order
    pub fn select(&self, topology: &Topology) -> Vec<usize> {
        evaluate(&self.root, topology)
            .into_iter()
            .enumerate()
            .filter_map(|(i, selected)| selected.then_some(i))
            .collect()
    }
}

impl FromStr for AtomMask {
    type Err = TrajError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AtomMask::parse(s)
    }
}

impl fmt::Display for AtomMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn evaluate(node: &Node, topology: &Topology) -> Vec<bool> {
    let n_atoms = topology.size();
    match node {
        Node::All => vec![true; n_atoms],
        Node::Residues(items) => (0..n_atoms)
            .map(|i| {
                topology.residue_index_for_atom(i).is_some_and(|r| {
                    let name = &topology.residues[r].name;
                    items.iter().any(|item| item.matches(r + 1, name))
                })
            })
            .collect(),
        Node::Atoms(items) => (0..n_atoms)
            .map(|i| {
                items
                    .iter()
                    .any(|item| item.matches(i + 1, &topology[i].name))
            })
            .collect(),
        Node::Not(inner) => evaluate(inner, topology).into_iter().map(|s| !s).collect(),
        Node::And(lhs, rhs) => evaluate(lhs, topology)
            .into_iter()
            .zip(evaluate(rhs, topology))
            .map(|(a, b)| a && b)
            .collect(),
        Node::Or(lhs, rhs) => evaluate(lhs, topology)
            .into_iter()
            .zip(evaluate(rhs, topology))
            .map(|(a, b)| a || b)
            .collect(),
    }
}

impl Item {
    fn matches(&self, number: usize, name: &str) -> bool {
        match self {
            Item::Number(first, last) => (*first..=*last).contains(&number),
            Item::Name(pattern) => {
                let pattern: Vec<char> = pattern.chars().collect();
                let name: Vec<char> = name.chars().collect();
                wildcard_match(&pattern, &name)
            }
        }
    }
}

fn wildcard_match(pattern: &[char], text: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('*', rest)) => (0..=text.len()).any(|skip| wildcard_match(rest, &text[skip..])),
        Some(('?', rest)) => !text.is_empty() && wildcard_match(rest, &text[1..]),
        Some((c, rest)) => text.first() == Some(c) && wildcard_match(rest, &text[1..]),
    }
}

struct MaskParser<'a> {
    mask: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> MaskParser<'a> {
    fn new(mask: &'a str) -> Self {
        MaskParser {
            mask,
            chars: mask.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: String) -> TrajError {
        TrajError::InvalidMask {
            mask: self.mask.to_string(),
            reason,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Result<Node, TrajError> {
        let mut node = self.parse_and()?;
        while self.eat('|') {
            node = Node::Or(Box::new(node), Box::new(self.parse_and()?));
        }
        Ok(node)
    }

    fn parse_and(&mut self) -> Result<Node, TrajError> {
        let mut node = self.parse_unary()?;
        while self.eat('&') {
            node = Node::And(Box::new(node), Box::new(self.parse_unary()?));
        }
        Ok(node)
    }

    fn parse_unary(&mut self) -> Result<Node, TrajError> {
        if self.eat('!') {
            return Ok(Node::Not(Box::new(self.parse_unary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Node, TrajError> {
        self.skip_whitespace();
        match self.peek() {
            Some('(') => {
                self.pos += 1;
                let node = self.parse_or()?;
                if !self.eat(')') {
                    return Err(self.error("unbalanced parenthesis".to_string()));
                }
                Ok(node)
            }
            Some('*') => {
                self.pos += 1;
                Ok(Node::All)
            }
            Some(':') => {
                self.pos += 1;
                let residues = Node::Residues(self.parse_items()?);
                if self.peek() == Some('@') {
                    self.pos += 1;
                    let atoms = Node::Atoms(self.parse_items()?);
                    return Ok(Node::And(Box::new(residues), Box::new(atoms)));
                }
                Ok(residues)
            }
            Some('@') => {
                self.pos += 1;
                Ok(Node::Atoms(self.parse_items()?))
            }
            Some(c) => Err(self.error(format!("unexpected '{c}' at position {}", self.pos))),
            None => Err(self.error("expected a selection".to_string())),
        }
    }

    fn parse_items(&mut self) -> Result<Vec<Item>, TrajError> {
        let mut items = vec![self.parse_item()?];
        while self.peek() == Some(',') {
            self.pos += 1;
            items.push(self.parse_item()?);
        }
        Ok(items)
    }

    fn parse_item(&mut self) -> Result<Item, TrajError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| !c.is_whitespace() && !",&|!()@:".contains(c))
        {
            self.pos += 1;
        }
        let token: String = self.chars[start..self.pos].iter().collect();
        if token.is_empty() {
            return Err(self.error(format!("empty selection at position {start}")));
        }

        if !token.starts_with(|c: char| c.is_ascii_digit()) {
            return Ok(Item::Name(token));
        }

        let (first, last) = match token.split_once('-') {
            Some((first, last)) => (first, last),
            None => (token.as_str(), token.as_str()),
        };
        let parse_number = |s: &str| {
            s.parse::<usize>()
                .map_err(|_| self.error(format!("'{token}' is not a number or range")))
        };
        let (first, last) = (parse_number(first)?, parse_number(last)?);
        if first == 0 || first > last {
            return Err(self.error(format!("'{token}' is not a valid 1-based range")));
        }
        Ok(Item::Number(first, last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{atom::Atom, residue::Residue};

    /// ALA(N CA C O) GLY(N CA C O) HOH(O H1 H2)
    fn peptide() -> Topology {
        let mut topology = Topology::default();
        let layout = [
            ("ALA", &["N", "CA", "C", "O"][..]),
            ("GLY", &["N", "CA", "C", "O"][..]),
            ("HOH", &["O", "H1", "H2"][..]),
        ];
        for (resid, (resname, names)) in layout.iter().enumerate() {
            let mut residue = Residue::new(resname.to_string(), Some(resid as i64 + 1));
            for name in names.iter() {
                residue.add_atom(topology.size());
                topology.add_atom(Atom::new(name.to_string()));
            }
            topology.add_residue(residue).unwrap();
        }
        topology
    }

    fn select(mask: &str) -> Vec<usize> {
        AtomMask::parse(mask).unwrap().select(&peptide())
    }

    #[test]
    fn atom_names() {
        assert_eq!(select("@CA"), vec![1, 5]);
        assert_eq!(select("@CA,O"), vec![1, 3, 5, 7, 8]);
        assert_eq!(select("@H*"), vec![9, 10]);
        assert_eq!(select("@H?"), vec![9, 10]);
    }

    #[test]
    fn atom_numbers() {
        assert_eq!(select("@1"), vec![0]);
        assert_eq!(select("@2-4,11"), vec![1, 2, 3, 10]);
    }

    #[test]
    fn residues() {
        assert_eq!(select(":2"), vec![4, 5, 6, 7]);
        assert_eq!(select(":HOH"), vec![8, 9, 10]);
        assert_eq!(select(":1-2@CA"), vec![1, 5]);
        assert_eq!(select(":A*@N"), vec![0]);
    }

    #[test]
    fn operators() {
        assert_eq!(select("*").len(), 11);
        assert_eq!(select("!:HOH"), (0..8).collect::<Vec<_>>());
        assert_eq!(select(":1 | :3"), vec![0, 1, 2, 3, 8, 9, 10]);
        assert_eq!(select("@O & !:HOH"), vec![3, 7]);
        assert_eq!(select("!(@CA | :HOH) & :1"), vec![0, 2, 3]);
        assert!(select("@CB").is_empty());
    }

    #[test]
    fn display_keeps_source() {
        let mask: AtomMask = ":1-2@CA".parse().unwrap();
        assert_eq!(mask.to_string(), ":1-2@CA");
        assert_eq!(mask.as_str(), ":1-2@CA");
    }

    #[test]
    fn invalid_masks() {
        for mask in ["", "@", ":1,", "(@CA", "@CA)", ":0", ":3-1", "@1-x", "CA", "@CA &"] {
            let err = AtomMask::parse(mask).unwrap_err();
            assert!(
                matches!(err, TrajError::InvalidMask { .. }),
                "{mask:?} gave {err:?}"
            );
        }
    }
}
