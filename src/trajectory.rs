use crate::error::TrajError;
use crate::format::{FileFormat, Format, FrameRecord, TextFormat};
use crate::frame::Frame;
use crate::frame_array::FrameArray;
use crate::frame_iter::{ChunkIter, FrameIterOptions, FrameReader};
use crate::topology::Topology;
use crate::unit_cell::UnitCell;
use log::debug;
use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::ops::{Bound, RangeBounds};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Open `traj_path` lazily, taking the topology from the first frame of
/// `top_path` when given, or else from the first frame of the trajectory.
pub fn iterload(
    traj_path: impl AsRef<Path>,
    top_path: Option<&Path>,
) -> Result<TrajectoryIterator, TrajError> {
    TrajectoryIterator::new(traj_path, top_path)
}

/// Read the first record of a file, for use as a topology
pub fn load_topology(path: &Path) -> Result<Topology, TrajError> {
    let format = Format::new(path)?;
    let mut reader = BufReader::new(File::open(path)?);
    Ok(format.read_next(&mut reader)?.topology)
}

/// A file-backed trajectory read on demand.
///
/// Opening the trajectory scans it once to record where every frame starts;
/// frames are then parsed only when requested. Every iteration opens its own
/// file handle, so a `TrajectoryIterator` can be iterated any number of
/// times.
#[derive(Debug)]
pub struct TrajectoryIterator {
    path: PathBuf,
    format: Format,
    top: Rc<Topology>,
    frame_positions: Vec<u64>,
    /// Cell given once in the file header, for frames without their own
    header_cell: Option<UnitCell>,
}

impl TrajectoryIterator {
    /// Constructs a `TrajectoryIterator` that will guess the format.
    pub fn new(path: impl AsRef<Path>, top_path: Option<&Path>) -> Result<Self, TrajError> {
        Self::with_format(path, top_path, TextFormat::Guess)
    }

    /// Constructs a `TrajectoryIterator` with an explicitly provided format.
    pub fn with_format(
        path: impl AsRef<Path>,
        top_path: Option<&Path>,
        fmt: TextFormat,
    ) -> Result<Self, TrajError> {
        let path = path.as_ref().to_path_buf();
        let format = Format::new_from_format(fmt, &path)?;

        let mut reader = BufReader::new(File::open(&path)?);
        let frame_positions = TrajectoryIterator::scan_all(&mut reader, &format)?;
        let header_cell = format.header_cell(&mut reader)?;
        reader.rewind()?;

        let top = match top_path {
            Some(top_path) => load_topology(top_path)?,
            None if frame_positions.len() > 1 => format.read_next(&mut reader)?.topology,
            None => Topology::default(),
        };
        debug!(
            "opened {} with {} frames of {} atoms",
            path.display(),
            frame_positions.len() - 1,
            top.size()
        );

        Ok(TrajectoryIterator {
            path,
            format,
            top: Rc::new(top),
            frame_positions,
            header_cell,
        })
    }

    fn scan_all(reader: &mut BufReader<File>, format: &Format) -> Result<Vec<u64>, TrajError> {
        let mut frame_positions = vec![0];
        while let Some(pos) = format.forward(reader)? {
            frame_positions.push(pos)
        }
        reader.rewind()?;
        Ok(frame_positions)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn n_frames(&self) -> usize {
        self.frame_positions.len() - 1
    }

    pub fn n_atoms(&self) -> usize {
        self.top.size()
    }

    pub fn top(&self) -> &Topology {
        &self.top
    }

    pub fn shared_top(&self) -> &Rc<Topology> {
        &self.top
    }

    pub(crate) fn open_reader(&self) -> Result<BufReader<File>, TrajError> {
        Ok(BufReader::new(File::open(&self.path)?))
    }

    /// Parse frame `index` with `reader`, checking it against the topology
    pub(crate) fn read_frame(
        &self,
        reader: &mut BufReader<File>,
        index: usize,
    ) -> Result<Frame, TrajError> {
        if index >= self.n_frames() {
            return Err(TrajError::FrameIndexOutOfRange {
                index,
                n_frames: self.n_frames(),
            });
        }

        let position = self.frame_positions[index];
        if reader.stream_position()? != position {
            reader.seek(SeekFrom::Start(position))?;
        }

        let FrameRecord { mut frame, .. } = self.format.read_next(reader)?;
        if frame.size() != self.n_atoms() {
            return Err(TrajError::AtomCountMismatch {
                frame: index,
                expected: self.n_atoms(),
                got: frame.size(),
            });
        }
        if frame.unit_cell.is_infinite() {
            if let Some(cell) = &self.header_cell {
                frame.unit_cell = cell.clone();
            }
        }
        Ok(frame)
    }

    pub fn read_at(&self, index: usize) -> Result<Frame, TrajError> {
        let mut reader = self.open_reader()?;
        self.read_frame(&mut reader, index)
    }

    /// Iterate over every frame
    pub fn iter(&self) -> FrameReader<'_> {
        FrameReader::all(self)
    }

    /// Iterate over the frames and atoms selected by `options`
    pub fn frame_iter(&self, options: &FrameIterOptions) -> Result<FrameReader<'_>, TrajError> {
        FrameReader::new(self, options)
    }

    /// Iterate over the whole trajectory in chunks of `chunk_size` frames
    pub fn iter_chunks(&self, chunk_size: usize) -> Result<ChunkIter<'_>, TrajError> {
        ChunkIter::new(self.iter(), chunk_size)
    }

    /// Iterate over the frames selected by `options` in chunks of
    /// `chunk_size` frames
    pub fn iter_chunks_with(
        &self,
        chunk_size: usize,
        options: &FrameIterOptions,
    ) -> Result<ChunkIter<'_>, TrajError> {
        ChunkIter::new(self.frame_iter(options)?, chunk_size)
    }

    /// Load the frames in `range` into memory. The range is clamped to the
    /// trajectory length.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Result<FrameArray, TrajError> {
        let start = match range.start_bound() {
            Bound::Included(&start) => start,
            Bound::Excluded(&start) => start.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let stop = match range.end_bound() {
            Bound::Included(&stop) => stop.saturating_add(1),
            Bound::Excluded(&stop) => stop,
            Bound::Unbounded => self.n_frames(),
        };
        let options = FrameIterOptions::default().start(start).stop(stop);
        FrameArray::from_iterable(self.frame_iter(&options)?, Rc::clone(&self.top))
    }

    /// Load every frame into memory
    pub fn load(&self) -> Result<FrameArray, TrajError> {
        FrameArray::from_iterable(self.iter(), Rc::clone(&self.top))
    }
}

impl<'a> IntoIterator for &'a TrajectoryIterator {
    type Item = Result<Frame, TrajError>;
    type IntoIter = FrameReader<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
