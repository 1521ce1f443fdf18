use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrajError {
    #[error("unsupported input kind: {0}")]
    UnsupportedInputKind(String),
    #[error("Unsupported file format: `{0}`")]
    UnsupportedFileFormat(String),
    #[error("{0}")]
    IoError(#[from] std::io::Error),
    #[error("generic error: {0}")]
    GenericError(String),
    #[error("{format} format: not enough lines at step {step} (expected {expected}, got {got})")]
    UnexpectedEof {
        format: String,
        step: usize,
        expected: usize,
        got: usize,
    },
    #[error("invalid {expected_record_type} record '{actual_record_type}': {reason}")]
    InvalidRecord {
        expected_record_type: String,
        actual_record_type: String,
        reason: String,
    },
    #[error("Failed to parse float: {0}")]
    ParseFloatError(#[from] std::num::ParseFloatError),
    #[error("Missing token")]
    MissingToken,
    #[error("frame {frame} has {got} atoms, but the topology has {expected}")]
    AtomCountMismatch {
        frame: usize,
        expected: usize,
        got: usize,
    },
    #[error("frame index {index} is out of range for {n_frames} frames")]
    FrameIndexOutOfRange { index: usize, n_frames: usize },
    #[error("stride must be at least 1")]
    InvalidStride,
    #[error("chunk size must be at least 1")]
    InvalidChunkSize,
    #[error("invalid atom mask '{mask}': {reason}")]
    InvalidMask { mask: String, reason: String },
}
