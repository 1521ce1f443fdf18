//! One lazy, ordered stream of frames out of any trajectory-like input.
//!
//! [`iterframe_master`] accepts a single frame, anything that produces
//! frames when iterated (frame arrays, lazy trajectories, masked frame
//! iterators, chunk iterators), or nested collections of these, and yields
//! every frame in source order:
//!
//! ```no_run
//! use molseq::iterframe::iterframe_master;
//! use molseq::trajectory::iterload;
//! use std::path::Path;
//!
//! let traj = iterload("md.xyz", Some(Path::new("top.pdb")))?;
//! let first = traj.slice(..1)?;
//!
//! let mut n_frames = 0;
//! for frame in iterframe_master((&traj, vec![&first])) {
//!     assert_eq!(frame?.size(), traj.n_atoms());
//!     n_frames += 1;
//! }
//! assert_eq!(n_frames, traj.n_frames() + 1);
//! # Ok::<(), molseq::error::TrajError>(())
//! ```

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::iter;
use std::vec;

use log::trace;

use crate::error::TrajError;
use crate::frame::Frame;
use crate::frame_array::FrameArray;
use crate::frame_iter::{ArrayFrameIter, ChunkIter, FrameReader};
use crate::trajectory::TrajectoryIterator;

/// Boxed source of frames, borrowed or owned
pub type FrameStream<'a> = Box<dyn Iterator<Item = Result<Cow<'a, Frame>, TrajError>> + 'a>;

/// Every input shape understood by [`iterframe_master`].
pub enum TrajInput<'a> {
    /// One frame, yielded once
    Single(Cow<'a, Frame>),
    /// Anything producing frames when iterated. Items are frames, never
    /// further collections.
    Frames(FrameStream<'a>),
    /// Ordered collection, flattened recursively
    Nested(Vec<TrajInput<'a>>),
}

impl<'a> TrajInput<'a> {
    /// Wrap any iterator of frame results
    pub fn stream<I>(frames: I) -> Self
    where
        I: IntoIterator<Item = Result<Cow<'a, Frame>, TrajError>>,
        I::IntoIter: 'a,
    {
        TrajInput::Frames(Box::new(frames.into_iter()))
    }

    /// Resolve a dynamically typed value.
    ///
    /// Recognizes [`Frame`], [`FrameArray`], [`TrajectoryIterator`] and
    /// `Vec<Box<dyn Any>>` holding any of these, at any depth.
    ///
    /// # Errors
    ///
    /// [`TrajError::UnsupportedInputKind`] for any other type.
    pub fn from_any(value: &'a dyn Any) -> Result<Self, TrajError> {
        if let Some(frame) = value.downcast_ref::<Frame>() {
            return Ok(frame.into());
        }
        if let Some(array) = value.downcast_ref::<FrameArray>() {
            return Ok(array.into());
        }
        if let Some(traj) = value.downcast_ref::<TrajectoryIterator>() {
            return Ok(traj.into());
        }
        if let Some(items) = value.downcast_ref::<Vec<Box<dyn Any>>>() {
            return items
                .iter()
                .map(|item| TrajInput::from_any(item.as_ref()))
                .collect::<Result<Vec<_>, _>>()
                .map(TrajInput::Nested);
        }

        Err(TrajError::UnsupportedInputKind(format!(
            "{:?} is not a frame, frame array, trajectory or list of them",
            value.type_id()
        )))
    }
}

impl fmt::Debug for TrajInput<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrajInput::Single(frame) => f.debug_tuple("Single").field(&frame.size()).finish(),
            TrajInput::Frames(_) => f.write_str("Frames(..)"),
            TrajInput::Nested(inputs) => f.debug_tuple("Nested").field(inputs).finish(),
        }
    }
}

impl<'a> From<&'a Frame> for TrajInput<'a> {
    fn from(frame: &'a Frame) -> Self {
        TrajInput::Single(Cow::Borrowed(frame))
    }
}

impl From<Frame> for TrajInput<'_> {
    fn from(frame: Frame) -> Self {
        TrajInput::Single(Cow::Owned(frame))
    }
}

impl<'a> From<&'a FrameArray> for TrajInput<'a> {
    fn from(array: &'a FrameArray) -> Self {
        TrajInput::stream(array.iter().map(|frame| Ok(Cow::Borrowed(frame))))
    }
}

impl From<FrameArray> for TrajInput<'_> {
    fn from(array: FrameArray) -> Self {
        TrajInput::stream(
            array
                .into_frames()
                .into_iter()
                .map(|frame| Ok(Cow::Owned(frame))),
        )
    }
}

impl<'a> From<ArrayFrameIter<'a>> for TrajInput<'a> {
    fn from(frames: ArrayFrameIter<'a>) -> Self {
        TrajInput::stream(frames.map(Ok))
    }
}

impl<'a> From<&'a TrajectoryIterator> for TrajInput<'a> {
    fn from(traj: &'a TrajectoryIterator) -> Self {
        traj.iter().into()
    }
}

impl<'a> From<FrameReader<'a>> for TrajInput<'a> {
    fn from(frames: FrameReader<'a>) -> Self {
        TrajInput::stream(frames.map(|frame| frame.map(Cow::Owned)))
    }
}

impl<'a> From<ChunkIter<'a>> for TrajInput<'a> {
    fn from(chunks: ChunkIter<'a>) -> Self {
        TrajInput::stream(chunks.frames().map(|frame| frame.map(Cow::Owned)))
    }
}

impl<'a> From<FrameStream<'a>> for TrajInput<'a> {
    fn from(frames: FrameStream<'a>) -> Self {
        TrajInput::Frames(frames)
    }
}

impl<'a, T: Into<TrajInput<'a>>> From<Vec<T>> for TrajInput<'a> {
    fn from(inputs: Vec<T>) -> Self {
        TrajInput::Nested(inputs.into_iter().map(Into::into).collect())
    }
}

impl<'a, T: Into<TrajInput<'a>>, const N: usize> From<[T; N]> for TrajInput<'a> {
    fn from(inputs: [T; N]) -> Self {
        TrajInput::Nested(inputs.into_iter().map(Into::into).collect())
    }
}

macro_rules! impl_from_tuple {
    ($($name:ident),+) => {
        impl<'a, $($name: Into<TrajInput<'a>>),+> From<($($name,)+)> for TrajInput<'a> {
            #[allow(non_snake_case)]
            fn from(($($name,)+): ($($name,)+)) -> Self {
                TrajInput::Nested(vec![$($name.into()),+])
            }
        }
    };
}

impl_from_tuple!(A);
impl_from_tuple!(A, B);
impl_from_tuple!(A, B, C);
impl_from_tuple!(A, B, C, D);

/// Normalize `input` into a single lazy stream of frames.
///
/// Frames come out in source order: each element of a collection is
/// exhausted before the next one starts, at any nesting depth. Errors
/// produced by a source are yielded unchanged, and iteration may continue
/// with the following sources afterwards.
pub fn iterframe_master<'a>(input: impl Into<TrajInput<'a>>) -> MasterIter<'a> {
    MasterIter {
        stack: vec![Cursor::from(input.into())],
    }
}

enum Cursor<'a> {
    Single(Option<Cow<'a, Frame>>),
    Frames(FrameStream<'a>),
    Nested(vec::IntoIter<TrajInput<'a>>),
}

impl<'a> From<TrajInput<'a>> for Cursor<'a> {
    fn from(input: TrajInput<'a>) -> Self {
        match input {
            TrajInput::Single(frame) => Cursor::Single(Some(frame)),
            TrajInput::Frames(frames) => Cursor::Frames(frames),
            TrajInput::Nested(inputs) => Cursor::Nested(inputs.into_iter()),
        }
    }
}

/// Iterator returned by [`iterframe_master`].
///
/// Nested inputs are walked depth-first with an explicit stack, so arbitrary
/// nesting never grows the call stack.
pub struct MasterIter<'a> {
    stack: Vec<Cursor<'a>>,
}

impl<'a> Iterator for MasterIter<'a> {
    type Item = Result<Cow<'a, Frame>, TrajError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.stack.last_mut()? {
                Cursor::Single(frame) => {
                    let frame = frame.take();
                    self.stack.pop();
                    if let Some(frame) = frame {
                        return Some(Ok(frame));
                    }
                }
                Cursor::Frames(frames) => match frames.next() {
                    Some(frame) => return Some(frame),
                    None => {
                        self.stack.pop();
                    }
                },
                Cursor::Nested(inputs) => match inputs.next() {
                    Some(input) => {
                        trace!("entering {input:?} at depth {}", self.stack.len());
                        self.stack.push(Cursor::from(input));
                    }
                    None => {
                        self.stack.pop();
                    }
                },
            }
        }
    }
}

impl iter::FusedIterator for MasterIter<'_> {}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::atom::Atom;
    use crate::frame_iter::FrameIterOptions;
    use crate::topology::Topology;

    /// `n_frames` frames of two atoms, tagged by `tag` in x and frame number in y
    fn array(tag: f64, n_frames: usize) -> FrameArray {
        let mut top = Topology::default();
        top.add_atom(Atom::new("CA".to_string()));
        top.add_atom(Atom::new("CB".to_string()));
        let frames = (0..n_frames)
            .map(|k| Ok::<_, TrajError>(Frame::with_positions(vec![[tag, k as f64, 0.0]; 2])));
        FrameArray::from_iterable(frames, Rc::new(top)).unwrap()
    }

    /// (tag, frame number) of every yielded frame
    fn tags<'a>(input: impl Into<TrajInput<'a>>) -> Vec<(f64, f64)> {
        iterframe_master(input)
            .map(|frame| {
                let frame = frame.unwrap();
                (frame[0][0], frame[0][1])
            })
            .collect()
    }

    #[test]
    fn single_frame_is_yielded_by_reference() {
        let a = array(1.0, 3);
        let frames: Vec<_> = iterframe_master(&a[1]).collect();
        assert_eq!(frames.len(), 1);
        match &frames[0] {
            Ok(Cow::Borrowed(frame)) => assert!(std::ptr::eq(*frame, &a[1])),
            other => panic!("expected a borrowed frame, got {other:?}"),
        }
    }

    #[test]
    fn owned_single_frame() {
        let frames: Vec<_> = iterframe_master(Frame::with_positions(vec![[0.0; 3]; 4]))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].size(), 4);
    }

    #[test]
    fn frame_array_keeps_order() {
        let a = array(1.0, 4);
        assert_eq!(tags(&a), vec![(1.0, 0.0), (1.0, 1.0), (1.0, 2.0), (1.0, 3.0)]);
    }

    #[test]
    fn collections_are_concatenated_in_order() {
        let a = array(1.0, 2);
        let b = array(2.0, 3);

        let expected = vec![(1.0, 0.0), (1.0, 1.0), (2.0, 0.0), (2.0, 1.0), (2.0, 2.0)];
        assert_eq!(tags(vec![&a, &b]), expected);
        assert_eq!(tags([&a, &b]), expected);
        assert_eq!(tags((&a, &b)), expected);
    }

    #[test]
    fn nested_tuple_ends_with_single_frame() {
        let a = array(1.0, 3);
        let b = array(2.0, 2);
        let result = tags((&a, (&b[1],)));
        assert_eq!(result.len(), 4);
        assert_eq!(result.last(), Some(&(2.0, 1.0)));
    }

    #[test]
    fn arbitrary_depth() {
        let a = array(1.0, 1);
        let b = array(2.0, 2);
        let c = array(3.0, 1);
        let input = TrajInput::Nested(vec![
            (&a,).into(),
            vec![TrajInput::Nested(vec![(&b, vec![&c[0]]).into()])].into(),
            TrajInput::Nested(vec![]),
            (&a[0],).into(),
        ]);
        assert_eq!(
            tags(input),
            vec![(1.0, 0.0), (2.0, 0.0), (2.0, 1.0), (3.0, 0.0), (1.0, 0.0)]
        );
    }

    #[test]
    fn empty_inputs() {
        let empty: Vec<TrajInput> = Vec::new();
        assert_eq!(iterframe_master(empty).count(), 0);
        assert_eq!(iterframe_master(array(1.0, 0)).count(), 0);
    }

    #[test]
    fn masked_iterator_keeps_frame_count() {
        let a = array(1.0, 5);
        let masked = a
            .frame_iter(&FrameIterOptions::default().mask("@CA"))
            .unwrap();
        let frames: Vec<_> = iterframe_master(masked).collect::<Result<_, _>>().unwrap();
        assert_eq!(frames.len(), 5);
        assert!(frames.iter().all(|frame| frame.size() == 1));
    }

    #[test]
    fn source_errors_pass_through() {
        let a = array(1.0, 1);
        let failing = TrajInput::stream(vec![
            Ok(Cow::Owned(Frame::new())),
            Err(TrajError::MissingToken),
        ]);
        let items: Vec<_> = iterframe_master((failing, &a)).collect();
        assert_eq!(items.len(), 3);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(TrajError::MissingToken)));
        assert!(items[2].is_ok());
    }

    #[test]
    fn dynamic_inputs() {
        let a = array(1.0, 2);
        let frame = array(2.0, 1)[0].clone();
        let items: Vec<Box<dyn Any>> = vec![
            Box::new(a.clone()),
            Box::new(vec![Box::new(frame) as Box<dyn Any>]),
        ];
        let input = TrajInput::from_any(&items).unwrap();
        assert_eq!(tags(input), vec![(1.0, 0.0), (1.0, 1.0), (2.0, 0.0)]);

        let err = TrajInput::from_any(&42_u32).unwrap_err();
        assert!(matches!(err, TrajError::UnsupportedInputKind(_)));

        let mixed: Vec<Box<dyn Any>> = vec![Box::new(a), Box::new("traj.xyz")];
        assert!(matches!(
            TrajInput::from_any(&mixed),
            Err(TrajError::UnsupportedInputKind(_))
        ));
    }
}
