//! Tool errors.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`ToolError`].
pub type Result<T> = std::result::Result<T, ToolError>;

/// Everything a tool run can fail with.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A file could not be read.
    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        /// The file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A RON document did not parse.
    #[error("Failed to parse '{}': {source}", path.display())]
    Parse {
        /// The file.
        path: PathBuf,
        /// Underlying error, with position.
        source: ron::error::SpannedError,
    },

    /// The content loaded with configuration errors.
    #[error("{count} content error(s) in '{}'", path.display())]
    InvalidContent {
        /// The file.
        path: PathBuf,
        /// Number of errors.
        count: usize,
    },

    /// The world rejected the scenario.
    #[error(transparent)]
    Game(#[from] stratagem_core::error::GameError),

    /// A report could not be encoded.
    #[error("Failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read a file to a string.
///
/// # Errors
///
/// Returns [`ToolError::Io`] naming the path.
pub fn read_file(path: &std::path::Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| ToolError::Io {
        path: path.to_path_buf(),
        source,
    })
}
