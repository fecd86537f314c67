use thiserror::Error;

/// Errors that can occur while loading or saving a PLY point cloud.
#[derive(Error, Debug)]
pub enum PlyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or unsupported header, or a body token that is not a number.
    #[error("Invalid PLY format: {0}")]
    Format(String),

    /// The body holds fewer lines, tokens or bytes than the header promises.
    #[error("Truncated PLY file: {0}")]
    Truncated(String),
}

impl PlyError {
    pub fn is_format(&self) -> bool {
        matches!(self, PlyError::Format(_))
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, PlyError::Truncated(_))
    }
}

/// A specialized `Result` type for PLY operations.
pub type PlyResult<T> = Result<T, PlyError>;
