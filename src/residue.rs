use std::collections::{btree_set::Iter, BTreeSet};

/// Unique key of a residue inside a single PDB model
#[derive(Default, Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FullResidueId {
    /// Chain identifier
    pub chain: char,
    /// Residue id
    pub resid: i64,
    /// Residue name
    pub resname: String,
    /// Insertion code of the residue
    pub insertion_code: char,
}

#[derive(Default, Debug, Clone, PartialEq)]
pub struct Residue {
    pub name: String,
    pub id: Option<i64>,
    pub atoms: BTreeSet<usize>,
}

impl Residue {
    pub fn new(name: String, id: Option<i64>) -> Self {
        Residue {
            name,
            id,
            atoms: BTreeSet::new(),
        }
    }

    pub fn add_atom(&mut self, index: usize) {
        self.atoms.insert(index);
    }

    pub fn contains(&self, index: usize) -> bool {
        self.atoms.contains(&index)
    }

    pub fn size(&self) -> usize {
        self.atoms.len()
    }
}

impl<'a> IntoIterator for &'a Residue {
    type Item = &'a usize;
    type IntoIter = Iter<'a, usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.atoms.iter()
    }
}
