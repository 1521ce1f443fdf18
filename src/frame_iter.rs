//! Iterators over the frames of a [`TrajectoryIterator`] or a [`FrameArray`].

use std::borrow::Cow;
use std::fs::File;
use std::io::BufReader;
use std::rc::Rc;
use std::vec;

use log::debug;

use crate::error::TrajError;
use crate::frame::Frame;
use crate::frame_array::FrameArray;
use crate::mask::AtomMask;
use crate::topology::Topology;
use crate::trajectory::TrajectoryIterator;

/// Which frames to visit, and which atoms to keep in each of them.
///
/// ```
/// use molseq::frame_iter::FrameIterOptions;
///
/// let options = FrameIterOptions::default().start(2).stride(3).mask("@CA");
/// assert_eq!(options.resolve_indices(12).unwrap(), vec![2, 5, 8, 11]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameIterOptions {
    pub start: usize,
    pub stop: Option<usize>,
    pub stride: usize,
    /// Explicit frame indices, replacing `start`/`stop`/`stride` when set
    pub frame_indices: Option<Vec<usize>>,
    pub mask: Option<String>,
}

impl Default for FrameIterOptions {
    fn default() -> Self {
        FrameIterOptions {
            start: 0,
            stop: None,
            stride: 1,
            frame_indices: None,
            mask: None,
        }
    }
}

impl FrameIterOptions {
    pub fn start(mut self, start: usize) -> Self {
        self.start = start;
        self
    }

    pub fn stop(mut self, stop: usize) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn stride(mut self, stride: usize) -> Self {
        self.stride = stride;
        self
    }

    pub fn frame_indices(mut self, indices: Vec<usize>) -> Self {
        self.frame_indices = Some(indices);
        self
    }

    pub fn mask(mut self, mask: &str) -> Self {
        self.mask = Some(mask.to_string());
        self
    }

    /// The frame indices to visit in a trajectory of `n_frames` frames.
    ///
    /// `stop` is clamped to `n_frames`, while explicit indices must all be
    /// in range.
    pub fn resolve_indices(&self, n_frames: usize) -> Result<Vec<usize>, TrajError> {
        if let Some(indices) = &self.frame_indices {
            if let Some(&index) = indices.iter().find(|&&i| i >= n_frames) {
                return Err(TrajError::FrameIndexOutOfRange { index, n_frames });
            }
            return Ok(indices.clone());
        }

        if self.stride == 0 {
            return Err(TrajError::InvalidStride);
        }
        let stop = self.stop.map_or(n_frames, |stop| stop.min(n_frames));
        Ok((self.start..stop).step_by(self.stride).collect())
    }

    /// Atom indices kept by the mask, and the matching topology. `None`
    /// when every atom is kept.
    fn resolve_selection(
        &self,
        top: &Rc<Topology>,
    ) -> Result<(Option<Vec<usize>>, Rc<Topology>), TrajError> {
        match &self.mask {
            None => Ok((None, Rc::clone(top))),
            Some(mask) => {
                let selection = AtomMask::parse(mask)?.select(top);
                debug!("mask '{mask}' selects {} of {} atoms", selection.len(), top.size());
                let subset = Rc::new(top.subset(&selection));
                Ok((Some(selection), subset))
            }
        }
    }
}

/// Lazy iterator reading frames from a trajectory file.
///
/// Each `FrameReader` owns its own file handle, so several readers over the
/// same [`TrajectoryIterator`] never interfere. Iteration stops after the
/// first error.
pub struct FrameReader<'a> {
    traj: &'a TrajectoryIterator,
    reader: Option<BufReader<File>>,
    indices: vec::IntoIter<usize>,
    selection: Option<Vec<usize>>,
    top: Rc<Topology>,
    done: bool,
}

impl<'a> FrameReader<'a> {
    pub(crate) fn new(
        traj: &'a TrajectoryIterator,
        options: &FrameIterOptions,
    ) -> Result<Self, TrajError> {
        let indices = options.resolve_indices(traj.n_frames())?;
        let (selection, top) = options.resolve_selection(traj.shared_top())?;

        // the file is opened on the first read, so an unreadable file
        // surfaces as the first item
        Ok(FrameReader {
            traj,
            reader: None,
            indices: indices.into_iter(),
            selection,
            top,
            done: false,
        })
    }

    /// Reader over every frame, with every atom
    pub(crate) fn all(traj: &'a TrajectoryIterator) -> Self {
        let indices: Vec<usize> = (0..traj.n_frames()).collect();
        FrameReader {
            traj,
            reader: None,
            indices: indices.into_iter(),
            selection: None,
            top: Rc::clone(traj.shared_top()),
            done: false,
        }
    }

    /// Topology of the frames produced by this reader, after masking
    pub fn topology(&self) -> &Rc<Topology> {
        &self.top
    }

    fn read(&mut self, index: usize) -> Result<Frame, TrajError> {
        let mut reader = match self.reader.take() {
            Some(reader) => reader,
            None => self.traj.open_reader()?,
        };
        let frame = self.traj.read_frame(&mut reader, index);
        self.reader = Some(reader);

        let frame = frame?;
        Ok(match &self.selection {
            Some(selection) => frame.subset(selection),
            None => frame,
        })
    }
}

impl Iterator for FrameReader<'_> {
    type Item = Result<Frame, TrajError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let index = self.indices.next()?;
        let result = self.read(index);
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            (0, Some(0))
        } else {
            (0, Some(self.indices.len()))
        }
    }
}

/// Iterator over the frames of a [`FrameArray`].
///
/// Frames are borrowed when no mask is applied and copied otherwise.
pub struct ArrayFrameIter<'a> {
    frames: &'a [Frame],
    indices: vec::IntoIter<usize>,
    selection: Option<Vec<usize>>,
    top: Rc<Topology>,
}

impl<'a> ArrayFrameIter<'a> {
    pub(crate) fn new(array: &'a FrameArray, options: &FrameIterOptions) -> Result<Self, TrajError> {
        let indices = options.resolve_indices(array.len())?;
        let (selection, top) = options.resolve_selection(array.shared_top())?;
        Ok(ArrayFrameIter {
            frames: array.frames(),
            indices: indices.into_iter(),
            selection,
            top,
        })
    }

    /// Topology of the frames produced by this iterator, after masking
    pub fn topology(&self) -> &Rc<Topology> {
        &self.top
    }
}

impl<'a> Iterator for ArrayFrameIter<'a> {
    type Item = Cow<'a, Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = &self.frames[self.indices.next()?];
        Some(match &self.selection {
            Some(selection) => Cow::Owned(frame.subset(selection)),
            None => Cow::Borrowed(frame),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.indices.size_hint()
    }
}

impl ExactSizeIterator for ArrayFrameIter<'_> {}

/// Reads a trajectory as a sequence of [`FrameArray`] chunks holding at most
/// `chunk_size` frames each.
///
/// A frame that fails to read ends the current chunk early: the frames read
/// before it are yielded first, then the error.
pub struct ChunkIter<'a> {
    frames: FrameReader<'a>,
    chunk_size: usize,
    chunks_read: usize,
    pending: Option<TrajError>,
}

impl<'a> ChunkIter<'a> {
    pub(crate) fn new(frames: FrameReader<'a>, chunk_size: usize) -> Result<Self, TrajError> {
        if chunk_size == 0 {
            return Err(TrajError::InvalidChunkSize);
        }
        Ok(ChunkIter {
            frames,
            chunk_size,
            chunks_read: 0,
            pending: None,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Flatten the chunks back into single frames
    pub fn frames(self) -> impl Iterator<Item = Result<Frame, TrajError>> + 'a {
        self.flat_map(|chunk| -> Box<dyn Iterator<Item = Result<Frame, TrajError>>> {
            match chunk {
                Ok(chunk) => Box::new(chunk.into_frames().into_iter().map(Ok)),
                Err(error) => Box::new(std::iter::once(Err(error))),
            }
        })
    }
}

impl Iterator for ChunkIter<'_> {
    type Item = Result<FrameArray, TrajError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(error) = self.pending.take() {
            return Some(Err(error));
        }

        let mut chunk = FrameArray::new(Rc::clone(self.frames.topology()));
        for frame in self.frames.by_ref().take(self.chunk_size) {
            if let Err(error) = frame.and_then(|frame| chunk.push(frame)) {
                if chunk.is_empty() {
                    return Some(Err(error));
                }
                self.pending = Some(error);
                break;
            }
        }

        if chunk.is_empty() {
            return None;
        }
        debug!("read chunk {} with {} frames", self.chunks_read, chunk.len());
        self.chunks_read += 1;
        Some(Ok(chunk))
    }
}
