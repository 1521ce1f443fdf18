pub mod atom;
pub mod error;
pub mod format;
pub mod formats;
pub mod frame;
pub mod frame_array;
pub mod frame_iter;
pub mod input_spec;
pub mod iterframe;
pub mod mask;
pub mod residue;
pub mod topology;
pub mod trajectory;
pub mod unit_cell;

pub use error::TrajError;
pub use frame::Frame;
pub use frame_array::FrameArray;
pub use iterframe::{iterframe_master, TrajInput};
pub use trajectory::{iterload, TrajectoryIterator};
