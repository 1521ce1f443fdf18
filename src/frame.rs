use crate::unit_cell::UnitCell;
use std::borrow::Cow;
use std::ops::{Index, IndexMut};

/// A single snapshot of atomic positions.
///
/// The atom names and residues live in the [`Topology`](crate::topology::Topology)
/// of the owning trajectory, so a frame only stores what changes from one
/// step to the next.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Frame {
    pub unit_cell: UnitCell,
    positions: Vec<[f64; 3]>,
}

impl Frame {
    pub fn new() -> Self {
        Frame {
            unit_cell: UnitCell::new(),
            positions: Vec::new(),
        }
    }

    pub fn with_positions(positions: Vec<[f64; 3]>) -> Self {
        Frame {
            unit_cell: UnitCell::new(),
            positions,
        }
    }

    /// Number of atoms in this frame
    pub fn size(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[[f64; 3]] {
        &self.positions
    }

    pub fn positions_mut(&mut self) -> &mut [[f64; 3]] {
        &mut self.positions
    }

    pub fn add_atom(&mut self, position: [f64; 3]) {
        self.positions.push(position)
    }

    /// Shift every atom by `shift`
    pub fn translate(&mut self, shift: [f64; 3]) {
        for position in &mut self.positions {
            position[0] += shift[0];
            position[1] += shift[1];
            position[2] += shift[2];
        }
    }

    /// Copy of this frame restricted to the atoms at `indices`, in that order.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    pub fn subset(&self, indices: &[usize]) -> Frame {
        Frame {
            unit_cell: self.unit_cell.clone(),
            positions: indices.iter().map(|&i| self.positions[i]).collect(),
        }
    }
}

impl From<Cow<'_, Frame>> for Frame {
    fn from(frame: Cow<'_, Frame>) -> Self {
        frame.into_owned()
    }
}

impl Index<usize> for Frame {
    type Output = [f64; 3];

    fn index(&self, index: usize) -> &Self::Output {
        &self.positions[index]
    }
}

impl IndexMut<usize> for Frame {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.positions[index]
    }
}
