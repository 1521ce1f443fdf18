use std::{collections::HashMap, ops::Index};

use crate::{atom::Atom, error::TrajError, residue::Residue};

/// Atoms and residues shared by every frame of a trajectory
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Topology {
    /// Atoms in the system
    pub atoms: Vec<Atom>,

    /// List of residues in the system
    pub residues: Vec<Residue>,

    /// Association between atom indices and residues indices
    residue_mapping: HashMap<usize, usize>,
}

impl Index<usize> for Topology {
    type Output = Atom;

    fn index(&self, index: usize) -> &Self::Output {
        &self.atoms[index]
    }
}

impl Topology {
    pub fn size(&self) -> usize {
        self.atoms.len()
    }

    pub fn add_atom(&mut self, atom: Atom) {
        self.atoms.push(atom)
    }

    pub fn add_residue(&mut self, residue: Residue) -> Result<(), TrajError> {
        for &atom_id in &residue {
            if self.residue_mapping.contains_key(&atom_id) {
                return Err(TrajError::GenericError(format!(
                    "cannot add this residue: atom {atom_id} is already in another residue"
                )));
            }
        }

        let res_index = self.residues.len();
        self.residues.push(residue);

        // Update the mapping
        for &atom_id in &self.residues[res_index] {
            self.residue_mapping.insert(atom_id, res_index);
        }

        Ok(())
    }

    /// Position of the residue containing atom `index` in [`Topology::residues`]
    pub fn residue_index_for_atom(&self, index: usize) -> Option<usize> {
        self.residue_mapping.get(&index).copied()
    }

    pub fn residue_for_atom(&self, index: usize) -> Option<&Residue> {
        self.residue_index_for_atom(index)
            .map(|residue_index| &self.residues[residue_index])
    }

    /// Build the topology of the atoms at `indices`, in that order.
    ///
    /// Residues keep their name and id, and only those with at least one
    /// selected atom survive. Atom indices are renumbered to match the new
    /// atom order.
    pub fn subset(&self, indices: &[usize]) -> Topology {
        let mut topology = Topology::default();
        let mut new_residues: Vec<Option<usize>> = vec![None; self.residues.len()];

        for (new_index, &old_index) in indices.iter().enumerate() {
            topology.atoms.push(self.atoms[old_index].clone());

            let Some(old_residue) = self.residue_index_for_atom(old_index) else {
                continue;
            };
            let residue_index = *new_residues[old_residue].get_or_insert_with(|| {
                let residue = &self.residues[old_residue];
                topology
                    .residues
                    .push(Residue::new(residue.name.clone(), residue.id));
                topology.residues.len() - 1
            });
            topology.residues[residue_index].add_atom(new_index);
            topology.residue_mapping.insert(new_index, residue_index);
        }

        topology
    }
}
