//! Textual descriptions of trajectory inputs, as given on the command line.
//!
//! - `PATH` the whole trajectory, read lazily
//! - `PATH@N` frame `N` (0-based), kept as a single frame
//! - `PATH[A:B]` frames `A` to `B` (exclusive) loaded in memory; either
//!   bound may be omitted

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;

use crate::error::TrajError;
use crate::frame::Frame;
use crate::frame_array::FrameArray;
use crate::frame_iter::FrameIterOptions;
use crate::iterframe::TrajInput;
use crate::mask::AtomMask;
use crate::topology::Topology;
use crate::trajectory::TrajectoryIterator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSpec {
    Trajectory(PathBuf),
    Frame(PathBuf, usize),
    Slice(PathBuf, Option<usize>, Option<usize>),
}

fn unsupported(input: &str, reason: &str) -> TrajError {
    TrajError::UnsupportedInputKind(format!("'{input}': {reason}"))
}

impl InputSpec {
    pub fn parse(input: &str) -> Result<Self, TrajError> {
        if input.trim().is_empty() {
            return Err(unsupported(input, "empty input"));
        }

        if let Some(rest) = input.strip_suffix(']') {
            let (path, range) = rest
                .rsplit_once('[')
                .ok_or_else(|| unsupported(input, "unmatched ']'"))?;
            let (start, stop) = range
                .split_once(':')
                .ok_or_else(|| unsupported(input, "expected a [START:STOP] slice"))?;
            let bound = |s: &str| -> Result<Option<usize>, TrajError> {
                match s.trim() {
                    "" => Ok(None),
                    s => s
                        .parse()
                        .map(Some)
                        .map_err(|_| unsupported(input, "slice bounds must be frame numbers")),
                }
            };
            return Ok(InputSpec::Slice(
                Self::non_empty_path(input, path)?,
                bound(start)?,
                bound(stop)?,
            ));
        }
        if input.contains('[') {
            return Err(unsupported(input, "unmatched '['"));
        }

        if let Some((path, frame)) = input.rsplit_once('@') {
            if let Ok(frame) = frame.parse::<usize>() {
                return Ok(InputSpec::Frame(Self::non_empty_path(input, path)?, frame));
            }
            if !frame.contains(std::path::is_separator) {
                return Err(unsupported(input, "expected a frame number after '@'"));
            }
        }

        Ok(InputSpec::Trajectory(PathBuf::from(input)))
    }

    fn non_empty_path(input: &str, path: &str) -> Result<PathBuf, TrajError> {
        if path.is_empty() {
            return Err(unsupported(input, "missing path"));
        }
        Ok(PathBuf::from(path))
    }

    pub fn path(&self) -> &Path {
        match self {
            InputSpec::Trajectory(path) | InputSpec::Frame(path, _) | InputSpec::Slice(path, ..) => {
                path
            }
        }
    }

    /// Open the described input, with the topology of `top` when given
    pub fn open(&self, top: Option<&Path>) -> Result<Source, TrajError> {
        let traj = TrajectoryIterator::new(self.path(), top)?;
        Ok(match *self {
            InputSpec::Trajectory(_) => Source::Lazy(traj),
            InputSpec::Frame(_, index) => {
                Source::Frame(traj.read_at(index)?, Rc::clone(traj.shared_top()))
            }
            InputSpec::Slice(_, start, stop) => {
                let start = start.unwrap_or(0);
                let stop = stop.unwrap_or(traj.n_frames());
                Source::Array(traj.slice(start..stop)?)
            }
        })
    }
}

impl FromStr for InputSpec {
    type Err = TrajError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InputSpec::parse(s)
    }
}

/// An opened [`InputSpec`]
#[derive(Debug)]
pub enum Source {
    Lazy(TrajectoryIterator),
    Array(FrameArray),
    Frame(Frame, Rc<Topology>),
}

impl Source {
    pub fn top(&self) -> &Topology {
        match self {
            Source::Lazy(traj) => traj.top(),
            Source::Array(array) => array.top(),
            Source::Frame(_, top) => top,
        }
    }

    /// Frames of this source restricted by `options`. Lazy sources are
    /// read in chunks of `chunk_size` frames when given.
    pub fn frames(
        &self,
        options: &FrameIterOptions,
        chunk_size: Option<usize>,
    ) -> Result<TrajInput<'_>, TrajError> {
        Ok(match self {
            Source::Lazy(traj) => match chunk_size {
                Some(chunk_size) => traj.iter_chunks_with(chunk_size, options)?.into(),
                None => traj.frame_iter(options)?.into(),
            },
            Source::Array(array) => array.frame_iter(options)?.into(),
            Source::Frame(frame, top) => match &options.mask {
                Some(mask) => {
                    let selection = AtomMask::parse(mask)?.select(top);
                    TrajInput::Single(Cow::Owned(frame.subset(&selection)))
                }
                None => frame.into(),
            },
        })
    }
}

impl<'a> From<&'a Source> for TrajInput<'a> {
    fn from(source: &'a Source) -> Self {
        match source {
            Source::Lazy(traj) => traj.into(),
            Source::Array(array) => array.into(),
            Source::Frame(frame, _) => frame.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_inputs() {
        assert_eq!(
            InputSpec::parse("md.xyz").unwrap(),
            InputSpec::Trajectory(PathBuf::from("md.xyz"))
        );
        assert_eq!(
            InputSpec::parse("md.xyz@3").unwrap(),
            InputSpec::Frame(PathBuf::from("md.xyz"), 3)
        );
        assert_eq!(
            InputSpec::parse("md.xyz[:1]").unwrap(),
            InputSpec::Slice(PathBuf::from("md.xyz"), None, Some(1))
        );
        assert_eq!(
            InputSpec::parse("md.xyz[2:]").unwrap(),
            InputSpec::Slice(PathBuf::from("md.xyz"), Some(2), None)
        );
        assert_eq!(
            "runs@2/md.xyz".parse::<InputSpec>().unwrap(),
            InputSpec::Trajectory(PathBuf::from("runs@2/md.xyz"))
        );
    }

    #[test]
    fn reject_unknown_shapes() {
        for input in ["", "md.xyz@", "md.xyz@last", "md.xyz[1]", "md.xyz[a:b]", "md.xyz]", "md.xyz[1:", "@1", "[:2]"] {
            assert!(
                matches!(InputSpec::parse(input), Err(TrajError::UnsupportedInputKind(_))),
                "{input:?} should be rejected"
            );
        }
    }
}
