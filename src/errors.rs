use thiserror::Error;

/// Errors that abort a whole tiling run.
#[derive(Error, Debug)]
pub enum TileError {
    #[error("Invalid specification: {0}")]
    InvalidSpec(String),
    #[error("Unable to decode source image: {0}")]
    DecodeFailure(String),
    #[error("Tiling run was cancelled")]
    Cancelled,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid job configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("Unable to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl TileError {
    pub fn invalid_spec<S: Into<String>>(msg: S) -> Self {
        TileError::InvalidSpec(msg.into())
    }

    pub fn decode<S: Into<String>>(msg: S) -> Self {
        TileError::DecodeFailure(msg.into())
    }
}

/// A single tile that could not be serialized. The run still completes, and the failure is
/// reported alongside the tiles that did encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeFailure {
    pub column_index: u32,
    pub row_index: u32,
    pub reason: String,
}

impl EncodeFailure {
    pub fn id(&self) -> String {
        crate::grid::tile_id(self.column_index, self.row_index)
    }
}

impl std::fmt::Display for EncodeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed to encode: {}", self.id(), self.reason)
    }
}
