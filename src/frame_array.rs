use std::collections::BTreeSet;
use std::ops::{Bound, Index, RangeBounds};
use std::rc::Rc;
use std::slice;

use crate::error::TrajError;
use crate::frame::Frame;
use crate::frame_iter::{ArrayFrameIter, FrameIterOptions};
use crate::topology::Topology;

/// Frames held in memory, all sharing one topology.
///
/// Slicing or cloning a `FrameArray` copies the frames, so two arrays never
/// alias each other. Frames are modified in place through
/// [`FrameArray::iter_frames_mut`], which hands out one exclusive borrow per
/// selected frame.
#[derive(Debug, Clone, Default)]
pub struct FrameArray {
    top: Rc<Topology>,
    frames: Vec<Frame>,
}

impl FrameArray {
    pub fn new(top: Rc<Topology>) -> Self {
        FrameArray {
            top,
            frames: Vec::new(),
        }
    }

    /// Collect frames from any frame source, checking that every frame
    /// matches the atom count of `top`
    pub fn from_iterable<I, F>(iter: I, top: Rc<Topology>) -> Result<Self, TrajError>
    where
        I: IntoIterator<Item = Result<F, TrajError>>,
        F: Into<Frame>,
    {
        let mut array = FrameArray::new(top);
        for frame in iter {
            array.push(frame?.into())?;
        }
        Ok(array)
    }

    pub fn top(&self) -> &Topology {
        &self.top
    }

    pub fn shared_top(&self) -> &Rc<Topology> {
        &self.top
    }

    pub fn n_atoms(&self) -> usize {
        self.top.size()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    pub fn push(&mut self, frame: Frame) -> Result<(), TrajError> {
        if frame.size() != self.n_atoms() {
            return Err(TrajError::AtomCountMismatch {
                frame: self.frames.len(),
                expected: self.n_atoms(),
                got: frame.size(),
            });
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Move all frames of `other` to the end of this array
    pub fn append(&mut self, other: FrameArray) -> Result<(), TrajError> {
        for frame in other.frames {
            self.push(frame)?;
        }
        Ok(())
    }

    pub fn iter(&self) -> slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    pub fn frame_iter(&self, options: &FrameIterOptions) -> Result<ArrayFrameIter<'_>, TrajError> {
        ArrayFrameIter::new(self, options)
    }

    /// Exclusive access to the frames at `indices`, in increasing frame
    /// order. Duplicated indices are visited once.
    pub fn iter_frames_mut(
        &mut self,
        indices: &[usize],
    ) -> Result<impl Iterator<Item = &mut Frame> + '_, TrajError> {
        let n_frames = self.len();
        if let Some(&index) = indices.iter().find(|&&i| i >= n_frames) {
            return Err(TrajError::FrameIndexOutOfRange { index, n_frames });
        }

        let wanted: BTreeSet<usize> = indices.iter().copied().collect();
        Ok(self
            .frames
            .iter_mut()
            .enumerate()
            .filter(move |(i, _)| wanted.contains(i))
            .map(|(_, frame)| frame))
    }

    /// Copy of the frames in `range`, clamped to the array length
    pub fn slice(&self, range: impl RangeBounds<usize>) -> FrameArray {
        let start = match range.start_bound() {
            Bound::Included(&start) => start,
            Bound::Excluded(&start) => start.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let stop = match range.end_bound() {
            Bound::Included(&stop) => stop.saturating_add(1),
            Bound::Excluded(&stop) => stop,
            Bound::Unbounded => self.len(),
        };
        let stop = stop.min(self.len());
        let start = start.min(stop);

        FrameArray {
            top: Rc::clone(&self.top),
            frames: self.frames[start..stop].to_vec(),
        }
    }

    /// Positions of every atom of every frame, frame after frame
    pub fn xyz(&self) -> Vec<[f64; 3]> {
        self.frames
            .iter()
            .flat_map(|frame| frame.positions().iter().copied())
            .collect()
    }
}

impl Index<usize> for FrameArray {
    type Output = Frame;

    fn index(&self, index: usize) -> &Self::Output {
        &self.frames[index]
    }
}

impl<'a> IntoIterator for &'a FrameArray {
    type Item = &'a Frame;
    type IntoIter = slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
